//! Data source trait and request/response types.
//!
//! This module defines the adapter contract (`DataSource`) that every
//! upstream implementation follows, along with the request and response
//! types for each endpoint.
//!
//! # Endpoints
//!
//! | Endpoint | Request | Response | Description |
//! |----------|---------|----------|-------------|
//! | Matches | [`FixturesRequest`] | [`FixtureBatch`] | Fixtures and results |
//! | Standings | [`TableRequest`] | [`StandingsTable`] | League table |
//! | Biography | [`PlayerRequest`] | [`Biography`] | Encyclopedia infobox + summary |
//! | MarketValue | [`PlayerRequest`] | [`MarketValuation`] | Transfer-market profile |
//! | Search | [`SearchRequest`] | [`SearchBatch`] | Free-text lookup |
//!
//! # Example
//!
//! ```rust,ignore
//! use touchline_core::{DataSource, FixturesRequest, SourceError, StatusFilter};
//!
//! async fn finished(adapter: &dyn DataSource, league: League) -> Result<(), SourceError> {
//!     let request = FixturesRequest::new(Some(league), None, StatusFilter::Finished);
//!     let batch = adapter.fixtures(request).await?;
//!
//!     for record in &batch.matches {
//!         println!("{} vs {}", record.home_team, record.away_team);
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::fetcher::FetchError;
use crate::{
    Biography, League, MarketValuation, MatchDate, MatchRecord, SourceId, StandingsTable,
    StatusFilter,
};

/// Data endpoint type used for routing and capability checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Matches,
    Standings,
    Biography,
    MarketValue,
    Search,
}

impl Endpoint {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Matches => "matches",
            Self::Standings => "standings",
            Self::Biography => "biography",
            Self::MarketValue => "market_value",
            Self::Search => "search",
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported endpoint matrix for a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    pub matches: bool,
    pub standings: bool,
    pub biography: bool,
    pub market_value: bool,
    pub search: bool,
}

impl CapabilitySet {
    pub const fn none() -> Self {
        Self {
            matches: false,
            standings: false,
            biography: false,
            market_value: false,
            search: false,
        }
    }

    /// Fixtures and standings.
    pub const fn competitions() -> Self {
        Self {
            matches: true,
            standings: true,
            ..Self::none()
        }
    }

    pub const fn supports(self, endpoint: Endpoint) -> bool {
        match endpoint {
            Endpoint::Matches => self.matches,
            Endpoint::Standings => self.standings,
            Endpoint::Biography => self.biography,
            Endpoint::MarketValue => self.market_value,
            Endpoint::Search => self.search,
        }
    }

    pub fn supported_endpoints(self) -> Vec<&'static str> {
        [
            Endpoint::Matches,
            Endpoint::Standings,
            Endpoint::Biography,
            Endpoint::MarketValue,
            Endpoint::Search,
        ]
        .into_iter()
        .filter(|endpoint| self.supports(*endpoint))
        .map(Endpoint::as_str)
        .collect()
    }
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    UnsupportedEndpoint,
    Unavailable,
    RateLimited,
    InvalidRequest,
    NotConfigured,
}

/// Structured source error used by manager fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn unsupported_endpoint(endpoint: Endpoint) -> Self {
        Self {
            kind: SourceErrorKind::UnsupportedEndpoint,
            message: format!("endpoint '{endpoint}' is not supported by this source"),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
        }
    }

    pub fn not_configured(source: SourceId, setting: &str) -> Self {
        Self {
            kind: SourceErrorKind::NotConfigured,
            message: format!("{source} requires '{setting}' to be configured"),
        }
    }

    /// Maps a failed fetch to the adapter contract.
    pub fn from_fetch(source: SourceId, error: FetchError) -> Self {
        match error {
            FetchError::RateLimited { .. } => {
                Self::rate_limited(format!("{} {error}", source.as_str()))
            }
            other => Self::unavailable(format!("{} {other}", source.as_str())),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// False for sources that were skipped without asking the upstream.
    pub const fn is_upstream_failure(&self) -> bool {
        !matches!(
            self.kind,
            SourceErrorKind::NotConfigured | SourceErrorKind::UnsupportedEndpoint
        )
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::UnsupportedEndpoint => "source.unsupported_endpoint",
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::NotConfigured => "source.not_configured",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Request payload for fixture endpoints. The league is already resolved
/// to upstream identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixturesRequest {
    pub league: Option<League>,
    pub date: Option<MatchDate>,
    pub status: StatusFilter,
}

impl FixturesRequest {
    pub fn new(league: Option<League>, date: Option<MatchDate>, status: StatusFilter) -> Self {
        Self {
            league,
            date,
            status,
        }
    }
}

/// Request payload for standings endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRequest {
    pub league: League,
    pub season: Option<String>,
}

impl TableRequest {
    pub fn new(league: League, season: Option<String>) -> Self {
        Self { league, season }
    }
}

/// Request payload for player endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRequest {
    pub name: String,
}

impl PlayerRequest {
    pub fn new(name: impl Into<String>) -> Result<Self, SourceError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(SourceError::invalid_request(
                "player request must include a name",
            ));
        }
        Ok(Self {
            name: trimmed.to_owned(),
        })
    }
}

/// Request payload for search endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Result<Self, SourceError> {
        let query = query.into();
        if query.trim().is_empty() {
            return Err(SourceError::invalid_request(
                "search query must not be empty",
            ));
        }
        Ok(Self { query })
    }
}

/// Normalized fixture batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureBatch {
    pub matches: Vec<MatchRecord>,
}

impl FixtureBatch {
    pub fn new(matches: Vec<MatchRecord>) -> Self {
        Self { matches }
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Normalized search batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBatch {
    pub query: String,
    pub result: Biography,
}

/// Boxed future returned by every adapter endpoint.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Source adapter contract.
///
/// Adapters return `Err` when the upstream is unreachable or misconfigured,
/// never an empty batch, so the manager can tell "no data" from "source
/// failed".
///
/// # Required Methods
///
/// | Method | Description |
/// |--------|-------------|
/// | [`id`](DataSource::id) | Upstream identifier |
/// | [`capabilities`](DataSource::capabilities) | Supported endpoints |
/// | [`fixtures`](DataSource::fixtures) | Fetch fixtures and results |
/// | [`standings`](DataSource::standings) | Fetch a league table |
/// | [`biography`](DataSource::biography) | Fetch a player biography |
/// | [`market_value`](DataSource::market_value) | Fetch a player valuation |
/// | [`search`](DataSource::search) | Free-text lookup |
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` as they may be shared across tasks.
pub trait DataSource: Send + Sync {
    /// Returns the upstream identifier.
    fn id(&self) -> SourceId;

    /// Returns the set of supported endpoints.
    fn capabilities(&self) -> CapabilitySet;

    /// Fetches fixtures, filtered by the request's status.
    fn fixtures<'a>(&'a self, req: FixturesRequest) -> SourceFuture<'a, FixtureBatch>;

    /// Fetches the overall league table.
    fn standings<'a>(&'a self, req: TableRequest) -> SourceFuture<'a, StandingsTable>;

    fn biography<'a>(&'a self, req: PlayerRequest) -> SourceFuture<'a, Biography>;

    fn market_value<'a>(&'a self, req: PlayerRequest) -> SourceFuture<'a, MarketValuation>;

    fn search<'a>(&'a self, req: SearchRequest) -> SourceFuture<'a, SearchBatch>;
}
