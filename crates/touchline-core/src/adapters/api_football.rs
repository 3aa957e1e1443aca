use serde::Deserialize;
use tracing::warn;

use crate::adapters::decode;
use crate::data_source::{
    CapabilitySet, DataSource, Endpoint, FixtureBatch, FixturesRequest, PlayerRequest,
    SearchBatch, SearchRequest, SourceError, SourceFuture, TableRequest,
};
use crate::fetcher::HttpFetcher;
use crate::http_client::{HttpAuth, HttpRequest};
use crate::{
    split_timestamp, Biography, MarketValuation, MatchRecord, MatchStatus, SourceId,
    StandingsRow, StandingsTable, StatusFilter,
};

pub const API_FOOTBALL_BASE_URL: &str = "https://v3.football.api-sports.io";

/// api-football v3 adapter (secondary competition source).
#[derive(Clone)]
pub struct ApiFootballAdapter {
    fetcher: HttpFetcher,
    api_key: Option<String>,
    base_url: String,
}

impl ApiFootballAdapter {
    pub fn new(fetcher: HttpFetcher, api_key: Option<String>) -> Self {
        Self {
            fetcher,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: String::from(API_FOOTBALL_BASE_URL),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    fn auth(&self) -> Result<HttpAuth, SourceError> {
        self.api_key
            .as_deref()
            .map(|key| HttpAuth::header("X-RapidAPI-Key", key))
            .ok_or_else(|| SourceError::not_configured(SourceId::ApiFootball, "api_football_key"))
    }

    async fn fetch_fixtures(&self, req: &FixturesRequest) -> Result<FixtureBatch, SourceError> {
        let auth = self.auth()?;
        let mut request = HttpRequest::get(format!("{}/fixtures", self.base_url)).with_auth(&auth);

        if let Some(league) = &req.league {
            request = request.with_query("league", league.api_football.to_string());
        }
        if let Some(date) = req.date {
            request = request.with_query("date", date.to_string());
        }
        if let Some((name, value)) = status_param(req.status) {
            request = request.with_query(name, value);
        }

        let value = self
            .fetcher
            .fetch_json(SourceId::ApiFootball, request)
            .await
            .map_err(|error| SourceError::from_fetch(SourceId::ApiFootball, error))?;

        let response: FixturesResponse = decode(SourceId::ApiFootball, value)?;
        Ok(FixtureBatch::new(
            response
                .response
                .into_iter()
                .filter_map(to_match_record)
                .filter(|record| req.status.matches(record.status))
                .collect(),
        ))
    }

    async fn fetch_standings(&self, req: &TableRequest) -> Result<StandingsTable, SourceError> {
        let auth = self.auth()?;
        let season = req
            .season
            .clone()
            .unwrap_or_else(|| self.fetcher.clock().now().year().to_string());

        let request = HttpRequest::get(format!("{}/standings", self.base_url))
            .with_auth(&auth)
            .with_query("league", req.league.api_football.to_string())
            .with_query("season", season.clone());

        let value = self
            .fetcher
            .fetch_json(SourceId::ApiFootball, request)
            .await
            .map_err(|error| SourceError::from_fetch(SourceId::ApiFootball, error))?;

        let response: StandingsResponse = decode(SourceId::ApiFootball, value)?;
        let rows = response
            .response
            .into_iter()
            .next()
            .and_then(|entry| entry.league.standings.into_iter().next())
            .unwrap_or_default()
            .into_iter()
            .filter_map(to_standings_row)
            .collect();

        Ok(StandingsTable::new(req.league.name.clone(), Some(season), rows))
    }
}

impl DataSource for ApiFootballAdapter {
    fn id(&self) -> SourceId {
        SourceId::ApiFootball
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::competitions()
    }

    fn fixtures<'a>(&'a self, req: FixturesRequest) -> SourceFuture<'a, FixtureBatch> {
        Box::pin(async move { self.fetch_fixtures(&req).await })
    }

    fn standings<'a>(&'a self, req: TableRequest) -> SourceFuture<'a, StandingsTable> {
        Box::pin(async move { self.fetch_standings(&req).await })
    }

    fn biography<'a>(&'a self, _req: PlayerRequest) -> SourceFuture<'a, Biography> {
        Box::pin(async move { Err(SourceError::unsupported_endpoint(Endpoint::Biography)) })
    }

    fn market_value<'a>(&'a self, _req: PlayerRequest) -> SourceFuture<'a, MarketValuation> {
        Box::pin(async move { Err(SourceError::unsupported_endpoint(Endpoint::MarketValue)) })
    }

    fn search<'a>(&'a self, _req: SearchRequest) -> SourceFuture<'a, SearchBatch> {
        Box::pin(async move { Err(SourceError::unsupported_endpoint(Endpoint::Search)) })
    }
}

/// Upstream query parameter for a filter. Live uses `live=all` so extra
/// time, breaks and shoot-outs are included.
fn status_param(filter: StatusFilter) -> Option<(&'static str, &'static str)> {
    match filter {
        StatusFilter::Finished => Some(("status", "FT")),
        StatusFilter::Scheduled => Some(("status", "NS")),
        StatusFilter::Live => Some(("live", "all")),
        StatusFilter::All => None,
    }
}

/// Maps api-football short status codes.
pub fn map_status(short: &str) -> MatchStatus {
    match short {
        "FT" | "AET" | "PEN" | "AWD" | "WO" => MatchStatus::Finished,
        "NS" | "TBD" => MatchStatus::Scheduled,
        "1H" | "HT" | "2H" | "ET" | "BT" | "P" | "LIVE" | "INT" | "SUSP" => MatchStatus::Live,
        _ => MatchStatus::Other,
    }
}

fn to_match_record(raw: RawFixtureEntry) -> Option<MatchRecord> {
    let Some((date, kickoff)) = split_timestamp(&raw.fixture.date) else {
        warn!(id = raw.fixture.id, date = %raw.fixture.date, "skipping api-football fixture without a usable date");
        return None;
    };

    Some(MatchRecord::new(
        raw.fixture.id,
        date,
        kickoff,
        raw.teams.home.name.unwrap_or_default(),
        raw.teams.away.name.unwrap_or_default(),
        raw.goals.home,
        raw.goals.away,
        map_status(&raw.fixture.status.short),
        raw.league.name.unwrap_or_default(),
        raw.league.round.filter(|round| !round.is_empty()),
    ))
}

fn to_standings_row(raw: RawStanding) -> Option<StandingsRow> {
    let team = raw.team.name.unwrap_or_default();
    StandingsRow::new(
        raw.rank,
        team.clone(),
        raw.all.played,
        raw.all.win,
        raw.all.draw,
        raw.all.lose,
        raw.all.goals.goals_for,
        raw.all.goals.against,
        raw.goals_diff,
        raw.points,
    )
    .map_err(|error| warn!(%team, %error, "dropping inconsistent api-football standings row"))
    .ok()
}

#[derive(Debug, Deserialize)]
struct FixturesResponse {
    #[serde(default)]
    response: Vec<RawFixtureEntry>,
}

#[derive(Debug, Deserialize)]
struct RawFixtureEntry {
    fixture: RawFixture,
    #[serde(default)]
    league: RawFixtureLeague,
    #[serde(default)]
    teams: RawTeams,
    #[serde(default)]
    goals: RawGoals,
}

#[derive(Debug, Deserialize)]
struct RawFixture {
    #[serde(default)]
    id: u64,
    #[serde(default)]
    date: String,
    #[serde(default)]
    status: RawFixtureStatus,
}

#[derive(Debug, Default, Deserialize)]
struct RawFixtureStatus {
    #[serde(default)]
    short: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawFixtureLeague {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    round: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTeams {
    #[serde(default)]
    home: RawTeam,
    #[serde(default)]
    away: RawTeam,
}

#[derive(Debug, Default, Deserialize)]
struct RawTeam {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawGoals {
    #[serde(default)]
    home: Option<u32>,
    #[serde(default)]
    away: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct StandingsResponse {
    #[serde(default)]
    response: Vec<RawStandingsEntry>,
}

#[derive(Debug, Deserialize)]
struct RawStandingsEntry {
    league: RawStandingsLeague,
}

#[derive(Debug, Deserialize)]
struct RawStandingsLeague {
    #[serde(default)]
    standings: Vec<Vec<RawStanding>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStanding {
    rank: u32,
    #[serde(default)]
    team: RawTeam,
    points: i32,
    goals_diff: i32,
    all: RawRecord,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    played: u32,
    win: u32,
    draw: u32,
    lose: u32,
    goals: RawGoalTotals,
}

#[derive(Debug, Deserialize)]
struct RawGoalTotals {
    #[serde(rename = "for")]
    goals_for: u32,
    against: u32,
}
