use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_LEAGUE_CODE_LEN: usize = 8;

/// Normalized short competition code (`PL`, `BL1`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LeagueCode(String);

impl LeagueCode {
    /// Parse and normalize a league code to uppercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyLeagueCode);
        }

        let normalized = trimmed.to_ascii_uppercase();
        let valid = normalized.len() <= MAX_LEAGUE_CODE_LEN
            && normalized.chars().all(|ch| ch.is_ascii_alphanumeric());
        if !valid {
            return Err(ValidationError::InvalidLeagueCode {
                value: input.to_owned(),
            });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for LeagueCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for LeagueCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for LeagueCode {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<LeagueCode> for String {
    fn from(value: LeagueCode) -> Self {
        value.0
    }
}

/// Upstream identifiers for one competition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct League {
    pub code: LeagueCode,
    /// Competition code on football-data.org.
    pub football_data: String,
    /// Numeric league id on api-football.
    pub api_football: u32,
    pub name: String,
}

impl League {
    fn builtin(code: &str, football_data: &str, api_football: u32, name: &str) -> Self {
        Self {
            code: LeagueCode(code.to_owned()),
            football_data: football_data.to_owned(),
            api_football,
            name: name.to_owned(),
        }
    }
}

/// Lookup table from short codes to upstream competition identifiers.
///
/// Serialized as a plain list so config files can use `[[leagues]]` tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<League>", into = "Vec<League>")]
pub struct LeagueTable {
    leagues: BTreeMap<LeagueCode, League>,
}

impl LeagueTable {
    pub fn new(leagues: impl IntoIterator<Item = League>) -> Self {
        Self {
            leagues: leagues
                .into_iter()
                .map(|league| (league.code.clone(), league))
                .collect(),
        }
    }

    pub fn get(&self, code: &LeagueCode) -> Option<&League> {
        self.leagues.get(code)
    }

    /// Validates `raw` and resolves it to a mapped competition.
    pub fn resolve(&self, raw: &str) -> Result<&League, ValidationError> {
        let code = LeagueCode::parse(raw)?;
        self.leagues
            .get(&code)
            .ok_or_else(|| ValidationError::UnknownLeague {
                code: code.to_string(),
            })
    }

    pub fn insert(&mut self, league: League) {
        self.leagues.insert(league.code.clone(), league);
    }

    pub fn iter(&self) -> impl Iterator<Item = &League> {
        self.leagues.values()
    }

    pub fn len(&self) -> usize {
        self.leagues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leagues.is_empty()
    }
}

impl Default for LeagueTable {
    fn default() -> Self {
        Self::new([
            League::builtin("PL", "PL", 39, "Premier League"),
            League::builtin("BL1", "BL1", 78, "Bundesliga"),
            League::builtin("SA", "SA", 135, "Serie A"),
            League::builtin("PD", "PD", 140, "La Liga"),
            League::builtin("FL1", "FL1", 61, "Ligue 1"),
            League::builtin("CL", "CL", 2, "Champions League"),
            League::builtin("EL", "EL", 3, "Europa League"),
            League::builtin("WC", "WC", 1, "World Cup"),
        ])
    }
}

impl From<Vec<League>> for LeagueTable {
    fn from(value: Vec<League>) -> Self {
        Self::new(value)
    }
}

impl From<LeagueTable> for Vec<League> {
    fn from(value: LeagueTable) -> Self {
        value.leagues.into_values().collect()
    }
}
