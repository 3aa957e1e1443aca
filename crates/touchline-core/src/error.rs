use thiserror::Error;

/// Validation and contract errors exposed by `touchline-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("league code cannot be empty")]
    EmptyLeagueCode,
    #[error("league code '{value}' must be 1-8 ASCII letters or digits")]
    InvalidLeagueCode { value: String },
    #[error("league code '{code}' is not mapped to any upstream competition")]
    UnknownLeague { code: String },

    #[error("date must be formatted as YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },
    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("invalid status filter '{value}', expected one of finished, scheduled, live, all")]
    InvalidStatus { value: String },

    #[error("player name cannot be empty")]
    EmptyPlayerName,
    #[error("search query cannot be empty")]
    EmptyQuery,

    #[error("standings position must be 1-based")]
    InvalidPosition,
    #[error("won + drawn + lost ({sum}) must equal played ({played})")]
    InconsistentRecord { sum: u32, played: u32 },
    #[error("goal difference {actual} does not match goals_for - goals_against ({expected})")]
    GoalDifferenceMismatch { expected: i64, actual: i64 },
}

/// Top-level error type for core operations that can genuinely fail
/// (configuration loading, serialization).
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config file error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
