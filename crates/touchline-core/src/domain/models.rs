use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{MatchDate, ValidationError};

/// Canonical fixture lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    Live,
    Finished,
    Other,
}

impl MatchStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Live => "live",
            Self::Finished => "finished",
            Self::Other => "other",
        }
    }
}

impl Display for MatchStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status filter accepted by match queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    Finished,
    Scheduled,
    Live,
    #[default]
    All,
}

impl StatusFilter {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Finished => "finished",
            Self::Scheduled => "scheduled",
            Self::Live => "live",
            Self::All => "all",
        }
    }

    pub const fn matches(self, status: MatchStatus) -> bool {
        match self {
            Self::All => true,
            Self::Finished => matches!(status, MatchStatus::Finished),
            Self::Scheduled => matches!(status, MatchStatus::Scheduled),
            Self::Live => matches!(status, MatchStatus::Live),
        }
    }
}

impl Display for StatusFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "finished" => Ok(Self::Finished),
            "scheduled" => Ok(Self::Scheduled),
            "live" => Ok(Self::Live),
            "all" | "" => Ok(Self::All),
            _ => Err(ValidationError::InvalidStatus {
                value: value.to_owned(),
            }),
        }
    }
}

/// Canonical fixture record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: u64,
    pub date: MatchDate,
    /// `HH:MM`, UTC.
    pub kickoff: Option<String>,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub status: MatchStatus,
    pub competition: String,
    pub matchday: Option<String>,
}

impl MatchRecord {
    /// Builds a record; a half-present score pair is dropped entirely.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        date: MatchDate,
        kickoff: Option<String>,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        home_score: Option<u32>,
        away_score: Option<u32>,
        status: MatchStatus,
        competition: impl Into<String>,
        matchday: Option<String>,
    ) -> Self {
        let (home_score, away_score) = match (home_score, away_score) {
            (Some(home), Some(away)) => (Some(home), Some(away)),
            _ => (None, None),
        };

        Self {
            id,
            date,
            kickoff,
            home_team: home_team.into(),
            away_team: away_team.into(),
            home_score,
            away_score,
            status,
            competition: competition.into(),
            matchday,
        }
    }

    pub fn score(&self) -> Option<(u32, u32)> {
        self.home_score.zip(self.away_score)
    }
}

/// One validated row of a league table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsRow {
    pub position: u32,
    pub team: String,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i32,
    pub points: i32,
}

impl StandingsRow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        position: u32,
        team: impl Into<String>,
        played: u32,
        won: u32,
        drawn: u32,
        lost: u32,
        goals_for: u32,
        goals_against: u32,
        goal_difference: i32,
        points: i32,
    ) -> Result<Self, ValidationError> {
        if position == 0 {
            return Err(ValidationError::InvalidPosition);
        }

        let sum = won.saturating_add(drawn).saturating_add(lost);
        if sum != played {
            return Err(ValidationError::InconsistentRecord { sum, played });
        }

        let expected = i64::from(goals_for) - i64::from(goals_against);
        if expected != i64::from(goal_difference) {
            return Err(ValidationError::GoalDifferenceMismatch {
                expected,
                actual: i64::from(goal_difference),
            });
        }

        Ok(Self {
            position,
            team: team.into(),
            played,
            won,
            drawn,
            lost,
            goals_for,
            goals_against,
            goal_difference,
            points,
        })
    }
}

/// League table ordered by position, one row per position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsTable {
    pub competition: String,
    pub season: Option<String>,
    pub rows: Vec<StandingsRow>,
}

impl StandingsTable {
    pub fn new(
        competition: impl Into<String>,
        season: Option<String>,
        mut rows: Vec<StandingsRow>,
    ) -> Self {
        rows.sort_by_key(|row| row.position);
        rows.dedup_by_key(|row| row.position);

        Self {
            competition: competition.into(),
            season,
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Biography block scraped from an encyclopedia article. Every field but the
/// article title is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Biography {
    pub title: String,
    pub birth_date: Option<String>,
    pub nationality: Option<String>,
    pub position: Option<String>,
    pub current_team: Option<String>,
    pub height: Option<String>,
    pub summary: Option<String>,
}

/// Market-value block scraped from a transfer-market profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketValuation {
    pub market_value: Option<String>,
    pub age: Option<String>,
    pub position: Option<String>,
    pub current_club: Option<String>,
    pub profile_url: Option<String>,
}

/// Sparse union of everything known about a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub name: String,
    pub biography: Option<Biography>,
    pub market_value: Option<MarketValuation>,
}

impl PlayerProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            biography: None,
            market_value: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.biography.is_none() && self.market_value.is_none()
    }
}
