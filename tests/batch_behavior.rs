//! Behavior tests for league snapshots and player comparisons.

mod support;

use std::collections::HashSet;
use std::sync::Arc;

use touchline_core::{
    BatchAggregator, Biography, CacheMode, CapabilitySet, DataSource, FetchKind, FixtureBatch,
    FixturesRequest, LeagueCode, MarketValuation, MatchDate, MatchRecord, MatchStatus,
    SourceError, SourceId, StatusFilter,
};

use support::{clock, date, finished, manager, scheduled, table, StubSource};

fn pl() -> LeagueCode {
    LeagueCode::parse("PL").expect("valid code")
}

fn finished_on(id: u64, day: MatchDate, kickoff: &str) -> MatchRecord {
    MatchRecord::new(
        id,
        day,
        Some(kickoff.to_owned()),
        "Home",
        "Away",
        Some(1),
        Some(0),
        MatchStatus::Finished,
        "Premier League",
        None,
    )
}

/// Two results per scanned day plus one fixture every day repeats.
fn busy_league(req: &FixturesRequest) -> Result<FixtureBatch, SourceError> {
    match (req.status, req.date) {
        (StatusFilter::Finished, Some(day)) => {
            let base = u64::from(day.into_inner().ordinal()) * 10;
            Ok(FixtureBatch::new(vec![
                finished_on(base + 1, day, "12:00"),
                finished_on(base + 2, day, "18:00"),
                finished_on(999, date("2024-10-01"), "20:00"),
            ]))
        }
        (StatusFilter::Scheduled, None) => Ok(FixtureBatch::new(
            (0..12)
                .map(|n| scheduled(5000 + n, "2024-10-05", "Team A", "Team B"))
                .collect(),
        )),
        _ => Ok(FixtureBatch::new(Vec::new())),
    }
}

fn aggregator(sources: Vec<Arc<dyn DataSource>>) -> BatchAggregator {
    BatchAggregator::new(Arc::new(manager(sources, &clock())))
}

// ============================================================================
// League snapshot
// ============================================================================

#[tokio::test]
async fn snapshot_merges_recent_results_newest_first() {
    // Given: a league with results on each of the last fifteen days
    let source = Arc::new(
        StubSource::competitions(SourceId::FootballData)
            .with_fixtures(busy_league)
            .with_standings(|_req| Ok(table(&[(1, "Team A", 19), (2, "Team B", 16)]))),
    );
    let aggregator = aggregator(vec![Arc::clone(&source) as Arc<dyn DataSource>]);

    // When
    let snapshot = aggregator
        .get_comprehensive_league_data(pl(), None, CacheMode::Use)
        .await;

    // Then: recent matches are deduplicated, capped and sorted descending
    assert!(snapshot.success);
    assert_eq!(snapshot.error, None);
    assert_eq!(snapshot.recent_matches.len(), 20);
    assert_eq!(snapshot.recent_matches[0].id, 999);
    let ids = snapshot.recent_matches.iter().map(|m| m.id).collect::<HashSet<_>>();
    assert_eq!(ids.len(), 20);
    for pair in snapshot.recent_matches.windows(2) {
        assert!((pair[0].date, &pair[0].kickoff) >= (pair[1].date, &pair[1].kickoff));
    }
    assert!(snapshot.recent_matches.iter().all(|m| m.status == MatchStatus::Finished));

    // And: upcoming fixtures are capped at ten
    assert_eq!(snapshot.upcoming_matches.len(), 10);
    assert_eq!(snapshot.standings.len(), 2);
    assert!(snapshot.live_matches.is_empty());
    assert_eq!(snapshot.fetch_type, FetchKind::LiveFetch);
}

#[tokio::test]
async fn snapshot_is_cached_as_one_unit() {
    let source = Arc::new(
        StubSource::competitions(SourceId::FootballData)
            .with_fixtures(busy_league)
            .with_standings(|_req| Ok(table(&[(1, "Team A", 19)]))),
    );
    let aggregator = aggregator(vec![Arc::clone(&source) as Arc<dyn DataSource>]);

    let first = aggregator
        .get_comprehensive_league_data(pl(), None, CacheMode::Use)
        .await;
    let calls_after_first = source.calls();
    let second = aggregator
        .get_comprehensive_league_data(pl(), None, CacheMode::Use)
        .await;

    assert_eq!(second.fetch_type, FetchKind::Cached);
    assert_eq!(second.recent_matches, first.recent_matches);
    assert_eq!(source.calls(), calls_after_first);
}

#[tokio::test]
async fn one_failed_part_still_yields_a_successful_snapshot() {
    // Given: fixtures work but the table source is down
    let source = Arc::new(
        StubSource::competitions(SourceId::FootballData)
            .with_fixtures(busy_league)
            .with_standings(|_req| Err(SourceError::unavailable("table offline"))),
    );
    let aggregator = aggregator(vec![source as Arc<dyn DataSource>]);

    // When
    let snapshot = aggregator
        .get_comprehensive_league_data(pl(), None, CacheMode::Use)
        .await;

    // Then: the snapshot succeeds and names the failed part
    assert!(snapshot.success);
    assert_eq!(snapshot.error.as_deref(), Some("failed parts: standings"));
    assert!(snapshot.standings.is_empty());
    assert!(!snapshot.recent_matches.is_empty());
}

#[tokio::test]
async fn unconfigured_secondary_does_not_flag_quiet_parts() {
    // Given: a healthy primary with no live fixtures and a secondary without a key
    let primary = StubSource::competitions(SourceId::FootballData)
        .with_fixtures(busy_league)
        .with_standings(|_req| Ok(table(&[(1, "Team A", 19)])));
    let secondary = StubSource::competitions(SourceId::ApiFootball)
        .with_fixtures(|_req| Err(SourceError::not_configured(SourceId::ApiFootball, "api_football_key")))
        .with_standings(|_req| Err(SourceError::not_configured(SourceId::ApiFootball, "api_football_key")));
    let aggregator = aggregator(vec![
        Arc::new(primary) as Arc<dyn DataSource>,
        Arc::new(secondary) as Arc<dyn DataSource>,
    ]);

    // When
    let snapshot = aggregator
        .get_comprehensive_league_data(pl(), None, CacheMode::Use)
        .await;

    // Then: an empty live part is not reported as a failure
    assert!(snapshot.success);
    assert!(snapshot.live_matches.is_empty());
    assert_eq!(snapshot.error, None);
}

#[tokio::test]
async fn quiet_days_in_the_recent_scan_are_not_requeried_undated() {
    // Given: a source that answers every fixture query with nothing
    let source = Arc::new(
        StubSource::competitions(SourceId::FootballData)
            .with_fixtures(|_req| Ok(FixtureBatch::new(Vec::new())))
            .with_standings(|_req| Ok(table(&[(1, "Team A", 19)]))),
    );
    let aggregator = aggregator(vec![Arc::clone(&source) as Arc<dyn DataSource>]);

    // When
    aggregator
        .get_comprehensive_league_data(pl(), None, CacheMode::Use)
        .await;

    // Then: each scanned day is asked once, always with its date
    let finished_requests = source
        .fixture_requests()
        .into_iter()
        .filter(|req| req.status == StatusFilter::Finished)
        .collect::<Vec<_>>();
    assert_eq!(finished_requests.len(), 15);
    assert!(finished_requests.iter().all(|req| req.date.is_some()));
}

#[tokio::test]
async fn recent_scan_keeps_distinct_fixtures_sharing_an_id() {
    // Given: an upstream that reports two different fixtures with id 0
    let source = Arc::new(
        StubSource::competitions(SourceId::FootballData)
            .with_fixtures(|req| match (req.status, req.date) {
                (StatusFilter::Finished, Some(day)) if day == date("2024-10-01") => {
                    Ok(FixtureBatch::new(vec![
                        finished(0, "2024-10-01", "12:30", "Team A", "Team B", (1, 0)),
                        finished(0, "2024-10-01", "17:30", "Team C", "Team D", (2, 2)),
                    ]))
                }
                _ => Ok(FixtureBatch::new(Vec::new())),
            })
            .with_standings(|_req| Ok(table(&[(1, "Team A", 19)]))),
    );
    let aggregator = aggregator(vec![source as Arc<dyn DataSource>]);

    // When
    let snapshot = aggregator
        .get_comprehensive_league_data(pl(), None, CacheMode::Use)
        .await;

    // Then
    assert_eq!(snapshot.recent_matches.len(), 2);
    assert_eq!(snapshot.recent_matches[0].home_team, "Team C");
    assert_eq!(snapshot.recent_matches[1].home_team, "Team A");
}

#[tokio::test]
async fn snapshot_fails_only_when_every_part_fails_and_is_not_cached() {
    let source = Arc::new(
        StubSource::competitions(SourceId::FootballData)
            .with_fixtures(|_req| Err(SourceError::unavailable("down")))
            .with_standings(|_req| Err(SourceError::unavailable("down"))),
    );
    let aggregator = aggregator(vec![Arc::clone(&source) as Arc<dyn DataSource>]);

    let snapshot = aggregator
        .get_comprehensive_league_data(pl(), None, CacheMode::Use)
        .await;
    assert!(!snapshot.success);
    assert_eq!(
        snapshot.error.as_deref(),
        Some("failed parts: recent matches, upcoming matches, standings, live matches")
    );
    assert_eq!(snapshot.fetch_type, FetchKind::LiveFetchFailed);

    let calls_after_first = source.calls();
    aggregator
        .get_comprehensive_league_data(pl(), None, CacheMode::Use)
        .await;
    assert!(source.calls() > calls_after_first);
}

#[tokio::test]
async fn unknown_league_snapshot_fails_without_fetching() {
    let source = Arc::new(StubSource::competitions(SourceId::FootballData).with_fixtures(busy_league));
    let aggregator = aggregator(vec![Arc::clone(&source) as Arc<dyn DataSource>]);

    let snapshot = aggregator
        .get_comprehensive_league_data(
            LeagueCode::parse("ZZZ").expect("well-formed code"),
            None,
            CacheMode::Use,
        )
        .await;

    assert!(!snapshot.success);
    assert!(snapshot.error.is_some());
    assert_eq!(source.calls(), 0);
}

// ============================================================================
// Latest results across leagues
// ============================================================================

fn across_leagues(req: &FixturesRequest) -> Result<FixtureBatch, SourceError> {
    let Some(day) = req.date else {
        return Ok(FixtureBatch::new(Vec::new()));
    };
    let records = if day == date("2024-10-01") {
        vec![
            finished(11, "2024-10-01", "12:00", "Team A", "Team B", (1, 0)),
            finished(12, "2024-10-01", "18:00", "Team C", "Team D", (0, 0)),
        ]
    } else if day == date("2024-09-28") {
        vec![finished(13, "2024-09-28", "15:00", "Team E", "Team F", (2, 3))]
    } else {
        Vec::new()
    };
    Ok(FixtureBatch::new(records))
}

#[tokio::test]
async fn latest_matches_scan_a_week_without_a_league() {
    // Given: finished fixtures on two of the last seven days
    let source = Arc::new(StubSource::competitions(SourceId::FootballData).with_fixtures(across_leagues));
    let aggregator = aggregator(vec![Arc::clone(&source) as Arc<dyn DataSource>]);

    // When
    let latest = aggregator.get_latest_matches(2, CacheMode::Use).await;

    // Then: the newest two survive, and every day was asked without a league
    assert!(latest.success);
    assert_eq!(latest.error, None);
    assert_eq!(latest.matches.iter().map(|m| m.id).collect::<Vec<_>>(), vec![12, 11]);
    let dated = source
        .fixture_requests()
        .into_iter()
        .filter(|req| req.date.is_some())
        .collect::<Vec<_>>();
    assert_eq!(dated.len(), 7);
    assert!(dated.iter().all(|req| req.league.is_none()));
}

#[tokio::test]
async fn latest_matches_are_cached_per_limit() {
    let source = Arc::new(StubSource::competitions(SourceId::FootballData).with_fixtures(across_leagues));
    let aggregator = aggregator(vec![Arc::clone(&source) as Arc<dyn DataSource>]);

    aggregator.get_latest_matches(10, CacheMode::Use).await;
    let calls_after_first = source.calls();
    let again = aggregator.get_latest_matches(10, CacheMode::Use).await;

    assert_eq!(again.fetch_type, FetchKind::Cached);
    assert_eq!(again.matches.len(), 3);
    assert_eq!(source.calls(), calls_after_first);
}

#[tokio::test]
async fn latest_matches_fail_only_when_every_day_fails() {
    let source = Arc::new(
        StubSource::competitions(SourceId::FootballData)
            .with_fixtures(|_req| Err(SourceError::unavailable("down"))),
    );
    let aggregator = aggregator(vec![Arc::clone(&source) as Arc<dyn DataSource>]);

    let latest = aggregator.get_latest_matches(10, CacheMode::Use).await;

    assert!(!latest.success);
    assert!(latest.matches.is_empty());
    assert_eq!(latest.fetch_type, FetchKind::LiveFetchFailed);
    assert!(latest.detailed_errors[0].starts_with("2024-10-01: football-data.org: down"));

    let calls_after_first = source.calls();
    aggregator.get_latest_matches(10, CacheMode::Use).await;
    assert!(source.calls() > calls_after_first);
}

// ============================================================================
// Player comparison
// ============================================================================

fn player_sources(market_fails_for: &'static str) -> Vec<Arc<dyn DataSource>> {
    let wiki = StubSource::new(
        SourceId::Wikipedia,
        CapabilitySet {
            biography: true,
            ..CapabilitySet::none()
        },
    )
    .with_biography(|req| {
        Ok(Biography {
            title: req.name.clone(),
            ..Biography::default()
        })
    });
    let market = StubSource::new(
        SourceId::Transfermarkt,
        CapabilitySet {
            market_value: true,
            ..CapabilitySet::none()
        },
    )
    .with_market_value(move |req| {
        if req.name == market_fails_for {
            return Err(SourceError::unavailable("profile not found"));
        }
        Ok(MarketValuation {
            market_value: Some(String::from("€100.00m")),
            ..MarketValuation::default()
        })
    });
    vec![
        Arc::new(wiki) as Arc<dyn DataSource>,
        Arc::new(market) as Arc<dyn DataSource>,
    ]
}

#[tokio::test]
async fn comparison_reports_the_missing_block() {
    // Given: the market-value source cannot find the second player
    let aggregator = aggregator(player_sources("phil foden"));

    // When
    let comparison = aggregator
        .get_player_comparison_data("Bukayo Saka", "Phil Foden", CacheMode::Use)
        .await;

    // Then: the comparison succeeds with three of four blocks
    assert!(comparison.success);
    assert_eq!(
        comparison.error.as_deref(),
        Some("failed parts: player2 market value")
    );
    assert_eq!(comparison.player1.profile.name, "bukayo saka");
    assert!(comparison.player1.profile.market_value.is_some());
    assert!(comparison.player2.profile.biography.is_some());
    assert!(comparison.player2.profile.market_value.is_none());
    assert_eq!(
        comparison.player2.errors,
        vec![String::from("Transfermarkt: profile not found (source.unavailable)")]
    );
}

#[tokio::test]
async fn comparison_is_cached_per_name_pair() {
    let aggregator = aggregator(player_sources("nobody"));

    aggregator
        .get_player_comparison_data("Bukayo Saka", "Phil Foden", CacheMode::Use)
        .await;
    let again = aggregator
        .get_player_comparison_data("BUKAYO SAKA", "phil foden", CacheMode::Use)
        .await;

    assert_eq!(again.fetch_type, FetchKind::Cached);
    assert!(again.success);
}
