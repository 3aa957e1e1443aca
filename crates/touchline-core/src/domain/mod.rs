//! # Domain Models
//!
//! Canonical football records produced by every source adapter.
//!
//! ## Models
//!
//! | Type | Description |
//! |------|-------------|
//! | [`MatchRecord`] | One fixture with optional score and kickoff |
//! | [`StandingsRow`] | Validated league-table row |
//! | [`StandingsTable`] | Rows sorted by position, no duplicate positions |
//! | [`PlayerProfile`] | Sparse biography + market-value union |
//! | [`LeagueCode`] | Validated short competition code |
//! | [`LeagueTable`] | Code to upstream-id mapping |
//! | [`MatchDate`] | `YYYY-MM-DD` calendar date |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! ## Validation
//!
//! Records with arithmetic invariants are built through validating
//! constructors; adapters drop rows that fail them.
//!
//! ```rust
//! use touchline_core::{StandingsRow, ValidationError};
//!
//! let row = StandingsRow::new(1, "Team X", 3, 2, 1, 0, 7, 2, 5, 7);
//! assert!(row.is_ok());
//!
//! // won + drawn + lost != played
//! let invalid = StandingsRow::new(1, "Team X", 3, 2, 2, 0, 7, 2, 5, 8);
//! assert!(matches!(invalid, Err(ValidationError::InconsistentRecord { .. })));
//! ```

mod date;
mod league;
mod models;
mod timestamp;

pub use date::{split_timestamp, MatchDate};
pub use league::{League, LeagueCode, LeagueTable};
pub use models::{
    Biography, MarketValuation, MatchRecord, MatchStatus, PlayerProfile, StandingsRow,
    StandingsTable, StatusFilter,
};
pub use timestamp::UtcDateTime;
