//! # Touchline Core
//!
//! Rate-limited, cached access to football data spread across several
//! unreliable upstreams.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Canonical domain models** for fixtures, standings and player profiles
//! - **Source adapters** for football-data.org, api-football, Wikipedia and Transfermarkt
//! - **Per-source throttling** and an HTTP fetcher with retry and backoff
//! - **Source manager** with ordered fallback and status-dependent TTLs
//! - **Two-tier cache** (memory + disk) keyed by hashed query descriptors
//! - **Batch aggregation** of related lookups into one cached composite
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Upstream adapters (REST and HTML scraping) |
//! | [`batch`] | League snapshot, latest results and player comparison composites |
//! | [`cache`] | Two-tier cache store |
//! | [`clock`] | Time source abstraction |
//! | [`config`] | Typed configuration, TOML loading, env overrides |
//! | [`data_source`] | Data source trait and request/response types |
//! | [`domain`] | Domain models (MatchRecord, StandingsRow, PlayerProfile) |
//! | [`error`] | Core error types |
//! | [`fetcher`] | Rate-limited HTTP fetcher with retry |
//! | [`http_client`] | HTTP client abstraction |
//! | [`query`] | Query descriptors and cache keys |
//! | [`retry`] | Backoff policy |
//! | [`routing`] | Source manager and builder |
//! | [`source`] | Source identifiers |
//! | [`throttling`] | Per-source rate limiting |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use touchline_core::{CacheMode, LeagueCode, MatchesRequest, SourceManagerBuilder, StatusFilter, TouchlineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = SourceManagerBuilder::new(TouchlineConfig::load(None)?).build();
//!
//!     let request = MatchesRequest::new(Some(LeagueCode::parse("PL")?), None, StatusFilter::Finished);
//!     let result = manager.get_matches(request, CacheMode::Use).await;
//!
//!     for record in &result.matches {
//!         println!("{} {} - {}", record.date, record.home_team, record.away_team);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / Caller   │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Batch Aggregator│────▶│   Cache Store    │
//! └────────┬────────┘     │ (memory + disk)  │
//!          │              └──────────────────┘
//!          ▼                       ▲
//! ┌─────────────────┐              │
//! │ Source Manager  │──────────────┘
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Data Source     │────▶│ HTTP Fetcher     │
//! │ (Adapter Trait) │     │ + Rate Limiter   │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Adapters return structured errors; the manager folds them into result
//! objects instead of propagating them:
//!
//! ```rust
//! use touchline_core::{SourceError, SourceErrorKind};
//!
//! fn describe(error: &SourceError) -> &'static str {
//!     match error.kind() {
//!         SourceErrorKind::NotConfigured => "missing credential",
//!         SourceErrorKind::RateLimited => "slow down",
//!         SourceErrorKind::Unavailable => "try the next source",
//!         _ => "other",
//!     }
//! }
//!
//! assert_eq!(describe(&SourceError::unavailable("down")), "try the next source");
//! ```

pub mod adapters;
pub mod batch;
pub mod cache;
pub mod clock;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod http_client;
pub mod query;
pub mod retry;
pub mod routing;
pub mod source;
pub mod throttling;

// Adapter implementations
pub use adapters::{ApiFootballAdapter, FootballDataAdapter, TransfermarktAdapter, WikipediaAdapter};

// Batch aggregation
pub use batch::{BatchAggregator, LatestMatches, LeagueSnapshot, PlayerComparison};

// Caching
pub use cache::{CacheEntry, CacheMode, CachePayload, CacheStats, CacheStore};

// Time
pub use clock::{Clock, ManualClock, SystemClock};

// Configuration
pub use config::{CacheSettings, Credentials, TouchlineConfig, TtlPolicy};

// Data source trait and types
pub use data_source::{
    CapabilitySet, DataSource, Endpoint, FixtureBatch, FixturesRequest, PlayerRequest,
    SearchBatch, SearchRequest, SourceError, SourceErrorKind, TableRequest,
};

// Domain models
pub use domain::{
    split_timestamp, Biography, League, LeagueCode, LeagueTable, MarketValuation, MatchDate,
    MatchRecord, MatchStatus, PlayerProfile, StandingsRow, StandingsTable, StatusFilter,
    UtcDateTime,
};

// Error types
pub use error::{CoreError, ValidationError};

// Fetching
pub use fetcher::{FetchError, HttpFetcher};

// HTTP client types
pub use http_client::{HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};

// Query descriptors
pub use query::{
    CacheKey, CacheQuery, FootballSearchQuery, LatestMatchesQuery, LeagueSnapshotQuery,
    MatchesRequest, PlayerComparisonQuery, PlayerInfoQuery, StandingsRequest,
};

// Retry logic
pub use retry::{Backoff, RetryConfig, RetrySettings};

// Routing types
pub use routing::{
    FetchKind, MatchesResult, PlayerLookup, PlayerResult, SearchResult, SourceManager,
    SourceManagerBuilder, StandingsResult,
};

// Source identifiers
pub use source::SourceId;

// Throttling
pub use throttling::{RateLimitConfig, RateLimiter};
