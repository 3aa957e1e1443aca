//! Source manager: fallback across adapters, error normalization and
//! status-dependent cache lifetimes.
//!
//! | Operation | Sources tried | Cache kind | Default TTL |
//! |-----------|---------------|------------|-------------|
//! | [`SourceManager::get_matches`] | every `matches` source, in order | `matches` | 30s live, 30min finished, 3min otherwise |
//! | [`SourceManager::get_standings`] | every `standings` source, in order | `standings` | 30min |
//! | [`SourceManager::get_player_profile`] | first `biography` + first `market_value` source | `player_info` | 6h |
//! | [`SourceManager::search`] | first `search` source | `football_search` | 24h |
//!
//! Operations never return `Err`: failures are reported in the result's
//! `error` field (which also keeps the result out of the cache) and the
//! per-source messages in `detailed_errors`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::adapters::{ApiFootballAdapter, FootballDataAdapter, TransfermarktAdapter, WikipediaAdapter};
use crate::cache::{CacheMode, CachePayload, CacheStore};
use crate::config::{TouchlineConfig, TtlPolicy};
use crate::data_source::{
    DataSource, Endpoint, FixturesRequest, PlayerRequest, SearchRequest, SourceError, TableRequest,
};
use crate::fetcher::HttpFetcher;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::query::{FootballSearchQuery, MatchesRequest, PlayerInfoQuery, StandingsRequest};
use crate::retry::RetryConfig;
use crate::throttling::RateLimiter;
use crate::{
    Biography, Clock, League, LeagueCode, LeagueTable, MatchRecord, MatchStatus, PlayerProfile, SourceId,
    StandingsRow, StatusFilter, SystemClock, ValidationError,
};

/// How a result was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchKind {
    /// Served from the cache.
    Cached,
    /// Fetched from upstream and at least one source answered.
    #[default]
    LiveFetch,
    /// Fetched from upstream and every source failed.
    LiveFetchFailed,
}

fn attributed(source: SourceId, error: impl std::fmt::Display) -> String {
    format!("{source}: {error}")
}

/// Per-source error messages, noting whether any came from an upstream that
/// was actually asked.
#[derive(Debug, Default)]
struct SourceFailures {
    messages: Vec<String>,
    upstream: bool,
}

impl SourceFailures {
    fn record(&mut self, message: String, error: &SourceError) {
        self.upstream |= error.is_upstream_failure();
        self.messages.push(message);
    }
}

/// Result of [`SourceManager::get_matches`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchesResult {
    pub matches: Vec<MatchRecord>,
    pub total: usize,
    pub source: Option<SourceId>,
    /// Set when the records came from a broadened query filtered locally.
    #[serde(default)]
    pub filtered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detailed_errors: Vec<String>,
    #[serde(default)]
    pub fetch_type: FetchKind,
    /// Unset when every error was a missing credential or capability.
    #[serde(skip)]
    upstream_failed: bool,
}

impl MatchesResult {
    pub fn found(matches: Vec<MatchRecord>, source: SourceId, filtered: bool) -> Self {
        Self {
            total: matches.len(),
            matches,
            source: Some(source),
            filtered,
            error: None,
            detailed_errors: Vec::new(),
            fetch_type: FetchKind::LiveFetch,
            upstream_failed: false,
        }
    }

    pub fn failed(error: impl Into<String>, detailed_errors: Vec<String>) -> Self {
        Self {
            matches: Vec::new(),
            total: 0,
            source: None,
            filtered: false,
            error: Some(error.into()),
            upstream_failed: !detailed_errors.is_empty(),
            detailed_errors,
            fetch_type: FetchKind::LiveFetchFailed,
        }
    }

    fn from_failures(error: impl Into<String>, failures: SourceFailures) -> Self {
        Self {
            upstream_failed: failures.upstream,
            ..Self::failed(error, failures.messages)
        }
    }

    /// True when no records came back because an upstream source errored,
    /// as opposed to answering empty or being skipped.
    pub fn sources_failed(&self) -> bool {
        self.error.is_some() && self.upstream_failed
    }
}

impl CachePayload for MatchesResult {
    fn error_marker(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn mark_cached(&mut self) {
        self.fetch_type = FetchKind::Cached;
    }
}

/// Result of [`SourceManager::get_standings`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsResult {
    pub standings: Vec<StandingsRow>,
    pub competition: Option<String>,
    pub season: Option<String>,
    pub source: Option<SourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detailed_errors: Vec<String>,
    #[serde(default)]
    pub fetch_type: FetchKind,
    #[serde(skip)]
    upstream_failed: bool,
}

impl StandingsResult {
    pub fn failed(error: impl Into<String>, detailed_errors: Vec<String>) -> Self {
        Self {
            standings: Vec::new(),
            competition: None,
            season: None,
            source: None,
            error: Some(error.into()),
            upstream_failed: !detailed_errors.is_empty(),
            detailed_errors,
            fetch_type: FetchKind::LiveFetchFailed,
        }
    }

    fn from_failures(error: impl Into<String>, failures: SourceFailures) -> Self {
        Self {
            upstream_failed: failures.upstream,
            ..Self::failed(error, failures.messages)
        }
    }

    /// See [`MatchesResult::sources_failed`].
    pub fn sources_failed(&self) -> bool {
        self.error.is_some() && self.upstream_failed
    }
}

impl CachePayload for StandingsResult {
    fn error_marker(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn mark_cached(&mut self) {
        self.fetch_type = FetchKind::Cached;
    }
}

/// Uncached player lookup outcome, shared by the profile and comparison paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLookup {
    pub profile: PlayerProfile,
    /// Sources that contributed a block.
    pub sources: Vec<SourceId>,
    pub errors: Vec<String>,
}

impl PlayerLookup {
    pub fn is_empty(&self) -> bool {
        self.profile.is_empty()
    }
}

/// Result of [`SourceManager::get_player_profile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerResult {
    pub player: PlayerProfile,
    pub sources: Vec<SourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detailed_errors: Vec<String>,
    #[serde(default)]
    pub fetch_type: FetchKind,
}

impl From<PlayerLookup> for PlayerResult {
    fn from(lookup: PlayerLookup) -> Self {
        let empty = lookup.is_empty();
        Self {
            error: empty.then(|| format!("no information found for player '{}'", lookup.profile.name)),
            fetch_type: if empty {
                FetchKind::LiveFetchFailed
            } else {
                FetchKind::LiveFetch
            },
            player: lookup.profile,
            sources: lookup.sources,
            detailed_errors: lookup.errors,
        }
    }
}

impl CachePayload for PlayerResult {
    fn error_marker(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn mark_cached(&mut self) {
        self.fetch_type = FetchKind::Cached;
    }
}

/// Result of [`SourceManager::search`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub query: String,
    pub result: Option<Biography>,
    pub source: Option<SourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detailed_errors: Vec<String>,
    #[serde(default)]
    pub fetch_type: FetchKind,
}

impl SearchResult {
    fn failed(query: &str, error: impl Into<String>, detailed_errors: Vec<String>) -> Self {
        Self {
            query: query.to_owned(),
            result: None,
            source: None,
            error: Some(error.into()),
            detailed_errors,
            fetch_type: FetchKind::LiveFetchFailed,
        }
    }
}

impl CachePayload for SearchResult {
    fn error_marker(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn mark_cached(&mut self) {
        self.fetch_type = FetchKind::Cached;
    }
}

/// Adapter registry with ordered fallback and read-through caching.
pub struct SourceManager {
    sources: Vec<Arc<dyn DataSource>>,
    cache: CacheStore,
    leagues: LeagueTable,
    ttl: TtlPolicy,
    clock: Arc<dyn Clock>,
}

impl SourceManager {
    /// `sources` are tried in the given order for every endpoint they support.
    pub fn new(sources: Vec<Arc<dyn DataSource>>, cache: CacheStore) -> Self {
        Self {
            sources,
            cache,
            leagues: LeagueTable::default(),
            ttl: TtlPolicy::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_leagues(mut self, leagues: LeagueTable) -> Self {
        self.leagues = leagues;
        self
    }

    pub fn with_ttl_policy(mut self, ttl: TtlPolicy) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn leagues(&self) -> &LeagueTable {
        &self.leagues
    }

    pub fn ttl_policy(&self) -> &TtlPolicy {
        &self.ttl
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn sources_for(&self, endpoint: Endpoint) -> impl Iterator<Item = &Arc<dyn DataSource>> {
        self.sources
            .iter()
            .filter(move |source| source.capabilities().supports(endpoint))
    }

    fn resolve_league(&self, code: &LeagueCode) -> Result<League, ValidationError> {
        self.leagues
            .get(code)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownLeague {
                code: code.to_string(),
            })
    }

    fn match_ttl(&self, status: StatusFilter) -> Duration {
        let status = match status {
            StatusFilter::Finished => Some(MatchStatus::Finished),
            StatusFilter::Scheduled => Some(MatchStatus::Scheduled),
            StatusFilter::Live => Some(MatchStatus::Live),
            StatusFilter::All => None,
        };
        self.ttl.for_matches(status)
    }

    /// Fixtures for an optional league/date with a status filter.
    pub async fn get_matches(&self, request: MatchesRequest, mode: CacheMode) -> MatchesResult {
        let league = match request.league.as_ref().map(|code| self.resolve_league(code)) {
            Some(Ok(league)) => Some(league),
            Some(Err(error)) => return MatchesResult::failed(error.to_string(), Vec::new()),
            None => None,
        };

        let ttl = self.match_ttl(request.status);
        self.cache
            .get_or_fetch(request, Some(ttl), mode, |query| {
                self.fetch_matches(query, league)
            })
            .await
    }

    async fn fetch_matches(&self, query: MatchesRequest, league: Option<League>) -> MatchesResult {
        let mut failures = SourceFailures::default();
        let request = FixturesRequest::new(league, query.date, query.status);

        for source in self.sources_for(Endpoint::Matches) {
            match source.fixtures(request.clone()).await {
                Ok(batch) if !batch.is_empty() => {
                    debug!(source = source.id().as_str(), count = batch.matches.len(), "matches found");
                    return MatchesResult::found(batch.matches, source.id(), false);
                }
                Ok(_) => debug!(source = source.id().as_str(), "source returned no matches"),
                Err(error) => {
                    warn!(source = source.id().as_str(), %error, "matches lookup failed");
                    failures.record(attributed(source.id(), &error), &error);
                }
            }
        }

        // Only a league-less dated query is broadened; a league query already
        // asked the upstream for that exact day.
        if request.league.is_none() {
            if let (Some(date), Some(primary)) = (query.date, self.sources_for(Endpoint::Matches).next()) {
                let broadened = FixturesRequest::new(None, None, query.status);
                match primary.fixtures(broadened).await {
                    Ok(batch) => {
                        let matches = batch
                            .matches
                            .into_iter()
                            .filter(|record| record.date == date)
                            .collect::<Vec<_>>();
                        if !matches.is_empty() {
                            debug!(source = primary.id().as_str(), %date, "broadened query matched after local date filter");
                            return MatchesResult::found(matches, primary.id(), true);
                        }
                    }
                    Err(error) => failures.record(format!("fallback search: {error}"), &error),
                }
            }
        }

        MatchesResult::from_failures("no data available from any source", failures)
    }

    /// League table. An absent season is keyed as the current year but left
    /// for each upstream to default.
    pub async fn get_standings(&self, request: StandingsRequest, mode: CacheMode) -> StandingsResult {
        let league = match self.resolve_league(&request.league) {
            Ok(league) => league,
            Err(error) => return StandingsResult::failed(error.to_string(), Vec::new()),
        };

        let requested_season = request.season.clone();
        let keyed = StandingsRequest::new(
            request.league,
            Some(
                requested_season
                    .clone()
                    .unwrap_or_else(|| self.clock.now().year().to_string()),
            ),
        );

        self.cache
            .get_or_fetch(keyed, Some(self.ttl.standings()), mode, |_query| {
                self.fetch_standings(TableRequest::new(league, requested_season))
            })
            .await
    }

    async fn fetch_standings(&self, request: TableRequest) -> StandingsResult {
        let mut failures = SourceFailures::default();

        for source in self.sources_for(Endpoint::Standings) {
            match source.standings(request.clone()).await {
                Ok(table) if !table.is_empty() => {
                    return StandingsResult {
                        standings: table.rows,
                        competition: Some(table.competition),
                        season: table.season,
                        source: Some(source.id()),
                        error: None,
                        detailed_errors: Vec::new(),
                        fetch_type: FetchKind::LiveFetch,
                        upstream_failed: false,
                    };
                }
                Ok(_) => debug!(source = source.id().as_str(), "source returned an empty table"),
                Err(error) => {
                    warn!(source = source.id().as_str(), %error, "standings lookup failed");
                    failures.record(attributed(source.id(), &error), &error);
                }
            }
        }

        StandingsResult::from_failures("no standings data available", failures)
    }

    /// Biography and, optionally, market value for one player.
    pub async fn get_player_profile(
        &self,
        name: &str,
        include_market_value: bool,
        mode: CacheMode,
    ) -> PlayerResult {
        let query = PlayerInfoQuery::new(name, include_market_value, self.clock.today());
        self.cache
            .get_or_fetch(query, Some(self.ttl.player()), mode, |_query| async move {
                PlayerResult::from(self.lookup_player(name, include_market_value).await)
            })
            .await
    }

    /// Uncached player lookup. A failure of one block leaves it `None` and
    /// records the error.
    pub async fn lookup_player(&self, name: &str, include_market_value: bool) -> PlayerLookup {
        let request = match PlayerRequest::new(name) {
            Ok(request) => request,
            Err(error) => {
                return PlayerLookup {
                    profile: PlayerProfile::new(name.trim()),
                    sources: Vec::new(),
                    errors: vec![error.to_string()],
                }
            }
        };

        let mut lookup = PlayerLookup {
            profile: PlayerProfile::new(request.name.clone()),
            sources: Vec::new(),
            errors: Vec::new(),
        };

        match self.sources_for(Endpoint::Biography).next() {
            Some(source) => match source.biography(request.clone()).await {
                Ok(biography) => {
                    lookup.profile.biography = Some(biography);
                    lookup.sources.push(source.id());
                }
                Err(error) => {
                    warn!(source = source.id().as_str(), %error, "biography lookup failed");
                    lookup.errors.push(attributed(source.id(), error));
                }
            },
            None => lookup.errors.push(String::from("no biography source configured")),
        }

        if include_market_value {
            match self.sources_for(Endpoint::MarketValue).next() {
                Some(source) => match source.market_value(request).await {
                    Ok(valuation) => {
                        lookup.profile.market_value = Some(valuation);
                        lookup.sources.push(source.id());
                    }
                    Err(error) => {
                        warn!(source = source.id().as_str(), %error, "market value lookup failed");
                        lookup.errors.push(attributed(source.id(), error));
                    }
                },
                None => lookup.errors.push(String::from("no market value source configured")),
            }
        }

        lookup
    }

    /// Free-text lookup returning the best-ranked article.
    pub async fn search(&self, query: &str, mode: CacheMode) -> SearchResult {
        let request = match SearchRequest::new(query) {
            Ok(request) => request,
            Err(error) => return SearchResult::failed(query, error.to_string(), Vec::new()),
        };

        let descriptor = FootballSearchQuery::new(query, self.clock.today());
        self.cache
            .get_or_fetch(descriptor, Some(self.ttl.search()), mode, |_query| {
                self.fetch_search(request)
            })
            .await
    }

    async fn fetch_search(&self, request: SearchRequest) -> SearchResult {
        let Some(source) = self.sources_for(Endpoint::Search).next() else {
            return SearchResult::failed(&request.query, "no search source configured", Vec::new());
        };

        match source.search(request.clone()).await {
            Ok(batch) => SearchResult {
                query: batch.query,
                result: Some(batch.result),
                source: Some(source.id()),
                error: None,
                detailed_errors: Vec::new(),
                fetch_type: FetchKind::LiveFetch,
            },
            Err(error) => {
                warn!(source = source.id().as_str(), %error, "search failed");
                SearchResult::failed(
                    &request.query,
                    format!("no information found for '{}'", request.query),
                    vec![attributed(source.id(), error)],
                )
            }
        }
    }
}

/// Wires the production source graph from a [`TouchlineConfig`].
///
/// All adapters share one [`HttpFetcher`], and therefore one rate limiter
/// and one clock.
///
/// ```rust,ignore
/// use touchline_core::{SourceManagerBuilder, TouchlineConfig};
///
/// let config = TouchlineConfig::load(None)?;
/// let manager = SourceManagerBuilder::new(config).build();
/// ```
pub struct SourceManagerBuilder {
    config: TouchlineConfig,
    http_client: Option<Arc<dyn HttpClient>>,
    clock: Option<Arc<dyn Clock>>,
    cache: Option<CacheStore>,
    cache_dir: Option<PathBuf>,
}

impl SourceManagerBuilder {
    pub fn new(config: TouchlineConfig) -> Self {
        Self {
            config,
            http_client: None,
            clock: None,
            cache: None,
            cache_dir: None,
        }
    }

    /// Replaces the reqwest transport, mainly for tests.
    pub fn with_http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Uses `cache` as-is instead of a persistent store.
    pub fn with_cache(mut self, cache: CacheStore) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Overrides the configured cache directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> SourceManager {
        let config = self.config;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let client = self
            .http_client
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));

        let limiter = Arc::new(RateLimiter::new(config.rate_limit, Arc::clone(&clock)));
        let fetcher = HttpFetcher::new(client, limiter, Arc::clone(&clock))
            .with_retry(RetryConfig::from_settings(&config.retry))
            .with_timeout(config.request_timeout());

        let credentials = &config.credentials;
        let sources: Vec<Arc<dyn DataSource>> = vec![
            Arc::new(FootballDataAdapter::new(
                fetcher.clone(),
                credentials.football_data_api_key.clone(),
            )),
            Arc::new(ApiFootballAdapter::new(
                fetcher.clone(),
                credentials.api_football_key.clone(),
            )),
            Arc::new(WikipediaAdapter::new(fetcher.clone())),
            Arc::new(TransfermarktAdapter::new(fetcher)),
        ];

        let cache = self.cache.unwrap_or_else(|| {
            let dir = self.cache_dir.unwrap_or_else(|| config.cache.dir.clone());
            CacheStore::persistent(dir, config.cache.default_ttl()).with_clock(Arc::clone(&clock))
        });

        SourceManager::new(sources, cache)
            .with_leagues(config.leagues)
            .with_ttl_policy(config.cache.ttl)
            .with_clock(clock)
    }
}
