//! Adapter contract tests against a scripted transport.
//!
//! Every adapter must: refuse to touch the network without its credential,
//! send the upstream's auth header and query shape, normalize payloads into
//! canonical records, and report failures as structured source errors.

#[path = "../support/mod.rs"]
mod support;

use std::time::Duration;

use serde_json::json;
use touchline_core::http_client::BROWSER_USER_AGENT;
use touchline_core::{
    ApiFootballAdapter, DataSource, FixturesRequest, FootballDataAdapter, HttpError, HttpResponse,
    League, LeagueCode, LeagueTable, MatchStatus, PlayerRequest, RetryConfig, SearchRequest,
    SourceErrorKind, StatusFilter, TableRequest, TransfermarktAdapter, WikipediaAdapter,
};

use support::{date, scripted_fetcher};

const BASE: &str = "http://upstream.test";

fn premier_league() -> League {
    LeagueTable::default()
        .get(&LeagueCode::parse("PL").expect("valid code"))
        .cloned()
        .expect("built-in league")
}

fn json_body(value: serde_json::Value) -> Result<HttpResponse, HttpError> {
    Ok(HttpResponse::ok(value.to_string()))
}

fn html_body(html: &str) -> Result<HttpResponse, HttpError> {
    Ok(HttpResponse::ok(html))
}

// ============================================================================
// football-data.org
// ============================================================================

#[tokio::test]
async fn football_data_without_key_is_not_configured_and_sends_nothing() {
    // Given: an adapter with no API key
    let (fetcher, client, _clock) = scripted_fetcher(Vec::new());
    let adapter = FootballDataAdapter::new(fetcher, None).with_base_url(BASE);

    // When
    let error = adapter
        .fixtures(FixturesRequest::new(Some(premier_league()), None, StatusFilter::All))
        .await
        .expect_err("missing key");

    // Then: the error names the setting and no request was made
    assert_eq!(error.kind(), SourceErrorKind::NotConfigured);
    assert!(error.message().contains("football_data_api_key"));
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn football_data_fixtures_send_token_and_date_window() {
    // Given: one finished and one scheduled match upstream
    let (fetcher, client, _clock) = scripted_fetcher(vec![json_body(json!({
        "matches": [
            {
                "id": 1001,
                "utcDate": "2024-10-01T19:00:00Z",
                "status": "FINISHED",
                "matchday": 7,
                "homeTeam": {"name": "Team X"},
                "awayTeam": {"name": "Team Y"},
                "score": {"fullTime": {"home": 2, "away": 1}},
                "competition": {"name": "Premier League"}
            },
            {
                "id": 1002,
                "utcDate": "2024-10-01T21:00:00Z",
                "status": "TIMED",
                "homeTeam": {"name": "Team Z"},
                "awayTeam": {"name": "Team W"},
                "score": {"fullTime": {"home": null, "away": null}}
            }
        ]
    }))]);
    let adapter = FootballDataAdapter::new(fetcher, Some(String::from("secret"))).with_base_url(BASE);

    // When: finished matches for one day are requested
    let batch = adapter
        .fixtures(FixturesRequest::new(
            Some(premier_league()),
            Some(date("2024-10-01")),
            StatusFilter::Finished,
        ))
        .await
        .expect("fixtures");

    // Then: the request carries the token and the date window
    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "http://upstream.test/competitions/PL/matches");
    assert_eq!(requests[0].headers.get("x-auth-token").map(String::as_str), Some("secret"));
    assert_eq!(requests[0].query_param("dateFrom"), Some("2024-10-01"));
    assert_eq!(requests[0].query_param("dateTo"), Some("2024-10-01"));

    // And: only the finished record survives, normalized
    assert_eq!(batch.matches.len(), 1);
    let record = &batch.matches[0];
    assert_eq!(record.id, 1001);
    assert_eq!(record.date, date("2024-10-01"));
    assert_eq!(record.kickoff.as_deref(), Some("19:00"));
    assert_eq!(record.score(), Some((2, 1)));
    assert_eq!(record.status, MatchStatus::Finished);
    assert_eq!(record.matchday.as_deref(), Some("7"));
}

#[tokio::test]
async fn football_data_standings_use_the_total_table() {
    let row = |position: u32, team: &str, points: i32| {
        json!({
            "position": position,
            "team": {"name": team},
            "playedGames": 7, "won": 6, "draw": 1, "lost": 0,
            "goalsFor": 15, "goalsAgainst": 5, "goalDifference": 10,
            "points": points
        })
    };
    let (fetcher, client, _clock) = scripted_fetcher(vec![json_body(json!({
        "season": {"startDate": "2024-08-16"},
        "standings": [
            {"type": "HOME", "table": [row(1, "Home Only", 12)]},
            {"type": "TOTAL", "table": [row(2, "Team B", 19), row(1, "Team A", 19)]}
        ]
    }))]);
    let adapter = FootballDataAdapter::new(fetcher, Some(String::from("secret"))).with_base_url(BASE);

    let table = adapter
        .standings(TableRequest::new(premier_league(), None))
        .await
        .expect("standings");

    let requests = client.requests();
    assert_eq!(requests[0].url, "http://upstream.test/competitions/PL/standings");
    assert_eq!(requests[0].query_param("season"), None);
    assert_eq!(table.season.as_deref(), Some("2024"));
    let teams = table.rows.iter().map(|row| row.team.as_str()).collect::<Vec<_>>();
    assert_eq!(teams, vec!["Team A", "Team B"]);
}

// ============================================================================
// api-football
// ============================================================================

#[tokio::test]
async fn api_football_fixtures_map_league_status_and_date() {
    let (fetcher, client, _clock) = scripted_fetcher(vec![json_body(json!({
        "response": [{
            "fixture": {"id": 555, "date": "2024-10-01T14:00:00+00:00", "status": {"short": "FT"}},
            "league": {"name": "Premier League", "round": "Regular Season - 7"},
            "teams": {"home": {"name": "Team X"}, "away": {"name": "Team Y"}},
            "goals": {"home": 2, "away": 1}
        }]
    }))]);
    let adapter = ApiFootballAdapter::new(fetcher, Some(String::from("rapid"))).with_base_url(BASE);

    let batch = adapter
        .fixtures(FixturesRequest::new(
            Some(premier_league()),
            Some(date("2024-10-01")),
            StatusFilter::Finished,
        ))
        .await
        .expect("fixtures");

    let requests = client.requests();
    assert_eq!(requests[0].url, "http://upstream.test/fixtures");
    assert_eq!(requests[0].headers.get("x-rapidapi-key").map(String::as_str), Some("rapid"));
    assert_eq!(requests[0].query_param("league"), Some("39"));
    assert_eq!(requests[0].query_param("date"), Some("2024-10-01"));
    assert_eq!(requests[0].query_param("status"), Some("FT"));

    let record = &batch.matches[0];
    assert_eq!(record.id, 555);
    assert_eq!(record.kickoff.as_deref(), Some("14:00"));
    assert_eq!(record.matchday.as_deref(), Some("Regular Season - 7"));
    assert_eq!(record.status, MatchStatus::Finished);
}

#[tokio::test]
async fn api_football_live_query_includes_extra_time() {
    // Given: one fixture in extra time and one at half time
    let (fetcher, client, _clock) = scripted_fetcher(vec![json_body(json!({
        "response": [
            {
                "fixture": {"id": 701, "date": "2024-10-01T18:00:00+00:00", "status": {"short": "ET"}},
                "league": {"name": "Premier League"},
                "teams": {"home": {"name": "Team X"}, "away": {"name": "Team Y"}},
                "goals": {"home": 1, "away": 1}
            },
            {
                "fixture": {"id": 702, "date": "2024-10-01T19:00:00+00:00", "status": {"short": "HT"}},
                "league": {"name": "Premier League"},
                "teams": {"home": {"name": "Team C"}, "away": {"name": "Team D"}},
                "goals": {"home": 0, "away": 0}
            }
        ]
    }))]);
    let adapter = ApiFootballAdapter::new(fetcher, Some(String::from("rapid"))).with_base_url(BASE);

    // When
    let batch = adapter
        .fixtures(FixturesRequest::new(Some(premier_league()), None, StatusFilter::Live))
        .await
        .expect("fixtures");

    // Then: every in-play state is requested and kept
    let requests = client.requests();
    assert_eq!(requests[0].query_param("live"), Some("all"));
    assert_eq!(requests[0].query_param("status"), None);
    assert_eq!(batch.matches.len(), 2);
    assert!(batch.matches.iter().all(|record| record.status == MatchStatus::Live));
}

#[tokio::test]
async fn api_football_standings_default_to_the_current_season() {
    let (fetcher, client, _clock) = scripted_fetcher(vec![json_body(json!({
        "response": [{
            "league": {
                "standings": [[{
                    "rank": 1,
                    "team": {"name": "Team A"},
                    "points": 19,
                    "goalsDiff": 10,
                    "all": {"played": 7, "win": 6, "draw": 1, "lose": 0,
                            "goals": {"for": 15, "against": 5}}
                }]]
            }
        }]
    }))]);
    let adapter = ApiFootballAdapter::new(fetcher, Some(String::from("rapid"))).with_base_url(BASE);

    let table = adapter
        .standings(TableRequest::new(premier_league(), None))
        .await
        .expect("standings");

    assert_eq!(client.requests()[0].query_param("season"), Some("2024"));
    assert_eq!(table.season.as_deref(), Some("2024"));
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.rows[0].points, 19);
}

#[tokio::test]
async fn api_football_without_key_is_not_configured() {
    let (fetcher, client, _clock) = scripted_fetcher(Vec::new());
    let adapter = ApiFootballAdapter::new(fetcher, Some(String::from("   "))).with_base_url(BASE);

    let error = adapter
        .standings(TableRequest::new(premier_league(), None))
        .await
        .expect_err("blank key");

    assert_eq!(error.kind(), SourceErrorKind::NotConfigured);
    assert!(client.requests().is_empty());
}

// ============================================================================
// Transport failures
// ============================================================================

#[tokio::test]
async fn repeated_rate_limiting_surfaces_as_rate_limited() {
    // Given: three 429 responses in a row
    let (fetcher, client, clock) = scripted_fetcher(vec![
        Ok(HttpResponse::new(429, "")),
        Ok(HttpResponse::new(429, "")),
        Ok(HttpResponse::new(429, "")),
    ]);
    let adapter = ApiFootballAdapter::new(fetcher, Some(String::from("rapid"))).with_base_url(BASE);

    // When
    let error = adapter
        .fixtures(FixturesRequest::new(None, None, StatusFilter::All))
        .await
        .expect_err("rate limited");

    // Then: linear waits between attempts and none after the last
    assert_eq!(error.kind(), SourceErrorKind::RateLimited);
    assert_eq!(client.requests().len(), 3);
    assert_eq!(
        clock.sleeps(),
        vec![Duration::from_secs(60), Duration::from_secs(120)]
    );
}

#[tokio::test]
async fn not_found_fails_fast_as_unavailable() {
    let (fetcher, client, clock) = scripted_fetcher(vec![Ok(HttpResponse::new(404, "missing"))]);
    let adapter = FootballDataAdapter::new(fetcher, Some(String::from("secret"))).with_base_url(BASE);

    let error = adapter
        .fixtures(FixturesRequest::new(None, None, StatusFilter::All))
        .await
        .expect_err("not found");

    assert_eq!(error.kind(), SourceErrorKind::Unavailable);
    assert_eq!(client.requests().len(), 1);
    assert_eq!(client.requests()[0].url, "http://upstream.test/matches");
    assert!(clock.sleeps().is_empty());
}

#[tokio::test]
async fn server_error_then_success_is_retried() {
    let (fetcher, client, clock) = scripted_fetcher(vec![
        Ok(HttpResponse::new(503, "busy")),
        Err(HttpError::timeout("timed out")),
        json_body(json!({"matches": []})),
    ]);
    let adapter = FootballDataAdapter::new(fetcher, Some(String::from("secret"))).with_base_url(BASE);

    let batch = adapter
        .fixtures(FixturesRequest::new(None, None, StatusFilter::All))
        .await
        .expect("third attempt succeeds");

    assert!(batch.is_empty());
    assert_eq!(client.requests().len(), 3);
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(2), Duration::from_secs(4)]);
}

#[tokio::test]
async fn malformed_payload_is_unavailable() {
    let (fetcher, _client, _clock) = scripted_fetcher(vec![Ok(HttpResponse::ok("<html>oops</html>"))]);
    let adapter = FootballDataAdapter::new(fetcher.with_retry(RetryConfig::no_retry()), Some(String::from("secret")))
        .with_base_url(BASE);

    let error = adapter
        .fixtures(FixturesRequest::new(None, None, StatusFilter::All))
        .await
        .expect_err("malformed");

    assert_eq!(error.kind(), SourceErrorKind::Unavailable);
}

// ============================================================================
// Wikipedia
// ============================================================================

const ARTICLE: &str = r#"
    <html><body>
      <table class="infobox vcard">
        <tr><th>Date of birth</th><td>5 September 2001</td></tr>
        <tr><th>Position(s)</th><td>Right winger</td></tr>
        <tr><th>Current team</th><td>Arsenal</td></tr>
      </table>
      <p><b>Bukayo Saka</b> is an English professional footballer.</p>
    </body></html>"#;

#[tokio::test]
async fn wikipedia_biography_searches_then_scrapes_the_top_hit() {
    // Given: a search hit followed by its article page
    let (fetcher, client, _clock) = scripted_fetcher(vec![
        json_body(json!({"query": {"search": [{"title": "Bukayo Saka"}, {"title": "Saka"}]}})),
        html_body(ARTICLE),
    ]);
    let adapter = WikipediaAdapter::new(fetcher).with_base_url(BASE);

    // When
    let biography = adapter
        .biography(PlayerRequest::new("Bukayo Saka").expect("name"))
        .await
        .expect("biography");

    // Then: the search is qualified and the article is fetched by title
    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].url, "http://upstream.test/w/api.php");
    assert_eq!(requests[0].query_param("srsearch"), Some("Bukayo Saka footballer"));
    assert_eq!(requests[0].query_param("list"), Some("search"));
    assert_eq!(requests[1].url, "http://upstream.test/wiki/Bukayo_Saka");
    assert_eq!(
        requests[1].headers.get("user-agent").map(String::as_str),
        Some(BROWSER_USER_AGENT)
    );

    assert_eq!(biography.title, "Bukayo Saka");
    assert_eq!(biography.birth_date.as_deref(), Some("5 September 2001"));
    assert_eq!(biography.position.as_deref(), Some("Right winger"));
    assert_eq!(biography.current_team.as_deref(), Some("Arsenal"));
}

#[tokio::test]
async fn wikipedia_search_without_hits_is_unavailable() {
    let (fetcher, client, _clock) = scripted_fetcher(vec![json_body(json!({"query": {"search": []}}))]);
    let adapter = WikipediaAdapter::new(fetcher).with_base_url(BASE);

    let error = adapter
        .search(SearchRequest::new("2018 World Cup").expect("query"))
        .await
        .expect_err("no hits");

    assert_eq!(error.kind(), SourceErrorKind::Unavailable);
    assert_eq!(client.requests().len(), 1);
    assert_eq!(client.requests()[0].query_param("srsearch"), Some("2018 World Cup"));
}

#[tokio::test]
async fn wikipedia_does_not_serve_fixtures() {
    let (fetcher, client, _clock) = scripted_fetcher(Vec::new());
    let adapter = WikipediaAdapter::new(fetcher).with_base_url(BASE);

    let error = adapter
        .fixtures(FixturesRequest::new(None, None, StatusFilter::All))
        .await
        .expect_err("unsupported");

    assert_eq!(error.kind(), SourceErrorKind::UnsupportedEndpoint);
    assert!(client.requests().is_empty());
}

// ============================================================================
// Transfermarkt
// ============================================================================

#[tokio::test]
async fn transfermarkt_follows_the_first_profile_link() {
    let (fetcher, client, _clock) = scripted_fetcher(vec![
        html_body(r#"<a href="/bukayo-saka/profil/spieler/433177">Bukayo Saka</a>"#),
        html_body(
            r#"<a class="data-header__market-value-wrapper">€140.00m Last update: May 27, 2024</a>
               <table class="auflistung">
                 <tr><th>Current club:</th><td>Arsenal FC</td></tr>
               </table>"#,
        ),
    ]);
    let adapter = TransfermarktAdapter::new(fetcher).with_base_url(BASE);

    let valuation = adapter
        .market_value(PlayerRequest::new("Bukayo Saka").expect("name"))
        .await
        .expect("valuation");

    let requests = client.requests();
    assert_eq!(requests[0].url, "http://upstream.test/schnellsuche/ergebnis/schnellsuche");
    assert_eq!(requests[0].query_param("query"), Some("Bukayo Saka"));
    assert_eq!(requests[1].url, "http://upstream.test/bukayo-saka/profil/spieler/433177");

    assert_eq!(valuation.market_value.as_deref(), Some("€140.00m"));
    assert_eq!(valuation.current_club.as_deref(), Some("Arsenal FC"));
    assert_eq!(
        valuation.profile_url.as_deref(),
        Some("http://upstream.test/bukayo-saka/profil/spieler/433177")
    );
}

#[tokio::test]
async fn transfermarkt_without_profile_link_is_unavailable() {
    let (fetcher, client, _clock) = scripted_fetcher(vec![html_body("<p>No results</p>")]);
    let adapter = TransfermarktAdapter::new(fetcher).with_base_url(BASE);

    let error = adapter
        .market_value(PlayerRequest::new("Nobody Known").expect("name"))
        .await
        .expect_err("no profile");

    assert_eq!(error.kind(), SourceErrorKind::Unavailable);
    assert_eq!(client.requests().len(), 1);
}
