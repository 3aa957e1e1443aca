//! Composite queries cached as one unit.
//!
//! A league snapshot runs 18 match/standings queries (each cached on its own
//! through the [`SourceManager`]) and stores the merged view under a single
//! `comprehensive_league` key. A player comparison runs four uncached
//! lookups and stores them under one `player_comparison` key. The latest
//! results feed scans a week of league-less finished queries and stores the
//! newest under one `latest_all_leagues` key.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::{CacheMode, CachePayload};
use crate::query::{
    LatestMatchesQuery, LeagueSnapshotQuery, MatchesRequest, PlayerComparisonQuery, StandingsRequest,
};
use crate::routing::{FetchKind, PlayerLookup, SourceManager};
use crate::{
    LeagueCode, MatchDate, MatchRecord, StandingsRow, StatusFilter, UtcDateTime, ValidationError,
};

/// Days scanned for recent results, today included.
pub const RECENT_SCAN_DAYS: i64 = 15;
pub const RECENT_LIMIT: usize = 20;
pub const UPCOMING_LIMIT: usize = 10;
/// Days scanned for the cross-league feed, today included.
pub const LATEST_SCAN_DAYS: i64 = 7;

/// Recent, upcoming and live fixtures plus the table for one league.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueSnapshot {
    pub league: LeagueCode,
    pub season: Option<String>,
    pub fetched_at: UtcDateTime,
    pub recent_matches: Vec<MatchRecord>,
    pub upcoming_matches: Vec<MatchRecord>,
    pub standings: Vec<StandingsRow>,
    pub live_matches: Vec<MatchRecord>,
    /// False only when every part failed.
    pub success: bool,
    /// Names the failed parts, also on partial failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub fetch_type: FetchKind,
}

impl CachePayload for LeagueSnapshot {
    fn error_marker(&self) -> Option<&str> {
        if self.success {
            None
        } else {
            self.error.as_deref().or(Some("league snapshot failed"))
        }
    }

    fn mark_cached(&mut self) {
        self.fetch_type = FetchKind::Cached;
    }
}

/// Biography and market value for two players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerComparison {
    pub player1: PlayerLookup,
    pub player2: PlayerLookup,
    pub fetched_at: UtcDateTime,
    /// False only when all four lookups failed.
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub fetch_type: FetchKind,
}

impl CachePayload for PlayerComparison {
    fn error_marker(&self) -> Option<&str> {
        if self.success {
            None
        } else {
            self.error.as_deref().or(Some("player comparison failed"))
        }
    }

    fn mark_cached(&mut self) {
        self.fetch_type = FetchKind::Cached;
    }
}

/// Newest finished fixtures across all leagues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestMatches {
    pub matches: Vec<MatchRecord>,
    pub fetched_at: UtcDateTime,
    /// False only when every scanned day failed.
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detailed_errors: Vec<String>,
    #[serde(default)]
    pub fetch_type: FetchKind,
}

impl CachePayload for LatestMatches {
    fn error_marker(&self) -> Option<&str> {
        if self.success {
            None
        } else {
            self.error.as_deref().or(Some("latest matches failed"))
        }
    }

    fn mark_cached(&mut self) {
        self.fetch_type = FetchKind::Cached;
    }
}

type FixtureKey = (u64, MatchDate, String, String);

fn fixture_key(record: &MatchRecord) -> FixtureKey {
    (
        record.id,
        record.date,
        record.home_team.clone(),
        record.away_team.clone(),
    )
}

fn newest_first(matches: &mut [MatchRecord]) {
    matches.sort_by(|a, b| (b.date, &b.kickoff).cmp(&(a.date, &a.kickoff)));
}

fn failure_summary(parts: &[&str]) -> Option<String> {
    (!parts.is_empty()).then(|| format!("failed parts: {}", parts.join(", ")))
}

/// Amortizes related lookups into one cached composite.
#[derive(Clone)]
pub struct BatchAggregator {
    manager: Arc<SourceManager>,
}

impl BatchAggregator {
    pub fn new(manager: Arc<SourceManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &SourceManager {
        &self.manager
    }

    fn fetched_at(&self) -> UtcDateTime {
        UtcDateTime::from_any_offset(self.manager.clock().now())
    }

    /// League snapshot, keyed per league, season and day.
    pub async fn get_comprehensive_league_data(
        &self,
        league: LeagueCode,
        season: Option<String>,
        mode: CacheMode,
    ) -> LeagueSnapshot {
        if self.manager.leagues().get(&league).is_none() {
            let error = ValidationError::UnknownLeague {
                code: league.to_string(),
            };
            return LeagueSnapshot {
                league,
                season,
                fetched_at: self.fetched_at(),
                recent_matches: Vec::new(),
                upcoming_matches: Vec::new(),
                standings: Vec::new(),
                live_matches: Vec::new(),
                success: false,
                error: Some(error.to_string()),
                fetch_type: FetchKind::LiveFetchFailed,
            };
        }

        let query = LeagueSnapshotQuery::new(league, season, self.manager.clock().today());
        let ttl = self.manager.ttl_policy().league_snapshot();
        self.manager
            .cache()
            .get_or_fetch(query, Some(ttl), mode, |query| self.fetch_snapshot(query, mode))
            .await
    }

    async fn fetch_snapshot(&self, query: LeagueSnapshotQuery, mode: CacheMode) -> LeagueSnapshot {
        info!(league = query.league.as_str(), "fetching league snapshot");
        let mut failed = Vec::new();

        let (recent_matches, recent_ok) = self.recent_matches(&query, mode).await;
        if !recent_ok {
            failed.push("recent matches");
        }

        let upcoming = self
            .manager
            .get_matches(
                MatchesRequest::new(Some(query.league.clone()), None, StatusFilter::Scheduled),
                mode,
            )
            .await;
        if upcoming.sources_failed() {
            failed.push("upcoming matches");
        }

        let standings = self
            .manager
            .get_standings(
                StandingsRequest::new(query.league.clone(), query.season.clone()),
                mode,
            )
            .await;
        if standings.sources_failed() {
            failed.push("standings");
        }

        let live = self
            .manager
            .get_matches(
                MatchesRequest::new(Some(query.league.clone()), None, StatusFilter::Live),
                mode,
            )
            .await;
        if live.sources_failed() {
            failed.push("live matches");
        }

        let success = failed.len() < 4;
        LeagueSnapshot {
            league: query.league,
            season: query.season,
            fetched_at: self.fetched_at(),
            recent_matches,
            upcoming_matches: upcoming.matches.into_iter().take(UPCOMING_LIMIT).collect(),
            standings: standings.standings,
            live_matches: live.matches,
            success,
            error: failure_summary(&failed),
            fetch_type: if success {
                FetchKind::LiveFetch
            } else {
                FetchKind::LiveFetchFailed
            },
        }
    }

    /// Finished fixtures over the scan window, newest first. The flag is
    /// false when every day failed.
    async fn recent_matches(&self, query: &LeagueSnapshotQuery, mode: CacheMode) -> (Vec<MatchRecord>, bool) {
        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        let mut failed_days = 0;

        for days_back in 0..RECENT_SCAN_DAYS {
            let date = query.date.days_before(days_back);
            let result = self
                .manager
                .get_matches(
                    MatchesRequest::new(Some(query.league.clone()), Some(date), StatusFilter::Finished),
                    mode,
                )
                .await;
            if result.sources_failed() {
                failed_days += 1;
            }
            merged.extend(
                result
                    .matches
                    .into_iter()
                    .filter(|record| seen.insert(fixture_key(record))),
            );
        }

        newest_first(&mut merged);
        merged.truncate(RECENT_LIMIT);
        debug!(count = merged.len(), failed_days, "merged recent matches");
        (merged, failed_days < RECENT_SCAN_DAYS)
    }

    /// Newest finished fixtures across every league over the last week,
    /// keyed per day and limit.
    pub async fn get_latest_matches(&self, limit: usize, mode: CacheMode) -> LatestMatches {
        let query = LatestMatchesQuery::new(limit, self.manager.clock().today());
        let ttl = self.manager.ttl_policy().latest_matches();
        self.manager
            .cache()
            .get_or_fetch(query, Some(ttl), mode, |query| self.fetch_latest(query, mode))
            .await
    }

    async fn fetch_latest(&self, query: LatestMatchesQuery, mode: CacheMode) -> LatestMatches {
        info!(limit = query.limit, "fetching latest matches across leagues");
        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        let mut errors = Vec::new();
        let mut failed_days = 0;

        for days_back in 0..LATEST_SCAN_DAYS {
            let date = query.date.days_before(days_back);
            let result = self
                .manager
                .get_matches(MatchesRequest::new(None, Some(date), StatusFilter::Finished), mode)
                .await;
            if result.sources_failed() {
                failed_days += 1;
                errors.extend(
                    result
                        .detailed_errors
                        .iter()
                        .map(|error| format!("{date}: {error}")),
                );
            }
            merged.extend(
                result
                    .matches
                    .into_iter()
                    .filter(|record| seen.insert(fixture_key(record))),
            );
        }

        newest_first(&mut merged);
        merged.truncate(query.limit);
        debug!(count = merged.len(), failed_days, "merged latest matches");

        let success = failed_days < LATEST_SCAN_DAYS;
        LatestMatches {
            matches: merged,
            fetched_at: self.fetched_at(),
            success,
            error: (!success).then(|| String::from("no finished matches available from any source")),
            detailed_errors: errors,
            fetch_type: if success {
                FetchKind::LiveFetch
            } else {
                FetchKind::LiveFetchFailed
            },
        }
    }

    /// Side-by-side profiles, keyed per lower-cased name pair and day.
    pub async fn get_player_comparison_data(
        &self,
        player1: &str,
        player2: &str,
        mode: CacheMode,
    ) -> PlayerComparison {
        let query = PlayerComparisonQuery::new(player1, player2, self.manager.clock().today());
        let ttl = self.manager.ttl_policy().player_comparison();
        self.manager
            .cache()
            .get_or_fetch(query, Some(ttl), mode, |query| self.fetch_comparison(query))
            .await
    }

    async fn fetch_comparison(&self, query: PlayerComparisonQuery) -> PlayerComparison {
        info!(player1 = %query.player1, player2 = %query.player2, "fetching player comparison");
        let first = self.manager.lookup_player(&query.player1, true).await;
        let second = self.manager.lookup_player(&query.player2, true).await;

        let mut failed = Vec::new();
        for (label, lookup) in [("player1", &first), ("player2", &second)] {
            if lookup.profile.biography.is_none() {
                failed.push(format!("{label} biography"));
            }
            if lookup.profile.market_value.is_none() {
                failed.push(format!("{label} market value"));
            }
        }
        let failed = failed.iter().map(String::as_str).collect::<Vec<_>>();

        let success = failed.len() < 4;
        PlayerComparison {
            player1: first,
            player2: second,
            fetched_at: self.fetched_at(),
            success,
            error: failure_summary(&failed),
            fetch_type: if success {
                FetchKind::LiveFetch
            } else {
                FetchKind::LiveFetchFailed
            },
        }
    }
}
