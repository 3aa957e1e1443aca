use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Canonical upstream identifiers used for throttling state, result tagging,
/// and error attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    FootballData,
    ApiFootball,
    Wikipedia,
    Transfermarkt,
}

impl SourceId {
    pub const ALL: [Self; 4] = [
        Self::FootballData,
        Self::ApiFootball,
        Self::Wikipedia,
        Self::Transfermarkt,
    ];

    /// Stable machine identifier, also used as the rate-limiter key.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FootballData => "football_data",
            Self::ApiFootball => "api_football",
            Self::Wikipedia => "wikipedia",
            Self::Transfermarkt => "transfermarkt",
        }
    }

    /// Human-facing upstream name.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::FootballData => "football-data.org",
            Self::ApiFootball => "api-football.com",
            Self::Wikipedia => "Wikipedia",
            Self::Transfermarkt => "Transfermarkt",
        }
    }
}

impl Display for SourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for SourceId {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "football_data" | "football-data" | "football-data.org" => Ok(Self::FootballData),
            "api_football" | "api-football" | "api-football.com" => Ok(Self::ApiFootball),
            "wikipedia" => Ok(Self::Wikipedia),
            "transfermarkt" => Ok(Self::Transfermarkt),
            other => Err(format!("unknown source '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_machine_and_display_names() {
        for source in SourceId::ALL {
            assert_eq!(source.as_str().parse::<SourceId>(), Ok(source));
            assert_eq!(source.display_name().parse::<SourceId>(), Ok(source));
        }
    }
}
