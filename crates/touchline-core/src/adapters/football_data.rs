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
    StandingsRow, StandingsTable,
};

pub const FOOTBALL_DATA_BASE_URL: &str = "https://api.football-data.org/v4";

/// football-data.org v4 adapter (primary competition source).
#[derive(Clone)]
pub struct FootballDataAdapter {
    fetcher: HttpFetcher,
    api_key: Option<String>,
    base_url: String,
}

impl FootballDataAdapter {
    pub fn new(fetcher: HttpFetcher, api_key: Option<String>) -> Self {
        Self {
            fetcher,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: String::from(FOOTBALL_DATA_BASE_URL),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    fn auth(&self) -> Result<HttpAuth, SourceError> {
        self.api_key
            .as_deref()
            .map(|key| HttpAuth::header("X-Auth-Token", key))
            .ok_or_else(|| SourceError::not_configured(SourceId::FootballData, "football_data_api_key"))
    }

    async fn fetch_fixtures(&self, req: &FixturesRequest) -> Result<FixtureBatch, SourceError> {
        let auth = self.auth()?;
        let url = match &req.league {
            Some(league) => format!(
                "{}/competitions/{}/matches",
                self.base_url,
                urlencoding::encode(&league.football_data)
            ),
            None => format!("{}/matches", self.base_url),
        };

        let mut request = HttpRequest::get(url).with_auth(&auth);
        if let Some(date) = req.date {
            request = request
                .with_query("dateFrom", date.to_string())
                .with_query("dateTo", date.to_string());
        }

        let value = self
            .fetcher
            .fetch_json(SourceId::FootballData, request)
            .await
            .map_err(|error| SourceError::from_fetch(SourceId::FootballData, error))?;

        let fallback_competition = req.league.as_ref().map(|league| league.name.as_str());
        let response: MatchesResponse = decode(SourceId::FootballData, value)?;
        Ok(FixtureBatch::new(
            response
                .matches
                .into_iter()
                .filter_map(|raw| to_match_record(raw, fallback_competition))
                .filter(|record| req.status.matches(record.status))
                .collect(),
        ))
    }

    async fn fetch_standings(&self, req: &TableRequest) -> Result<StandingsTable, SourceError> {
        let auth = self.auth()?;
        let url = format!(
            "{}/competitions/{}/standings",
            self.base_url,
            urlencoding::encode(&req.league.football_data)
        );

        let mut request = HttpRequest::get(url).with_auth(&auth);
        if let Some(season) = &req.season {
            request = request.with_query("season", season.clone());
        }

        let value = self
            .fetcher
            .fetch_json(SourceId::FootballData, request)
            .await
            .map_err(|error| SourceError::from_fetch(SourceId::FootballData, error))?;

        let response: StandingsResponse = decode(SourceId::FootballData, value)?;
        let season = response
            .season
            .and_then(|season| season.start_date)
            .and_then(|start| start.get(..4).map(str::to_owned))
            .or_else(|| req.season.clone());

        let rows = response
            .standings
            .into_iter()
            .filter(|group| group.kind == "TOTAL")
            .flat_map(|group| group.table)
            .filter_map(to_standings_row)
            .collect();

        Ok(StandingsTable::new(req.league.name.clone(), season, rows))
    }
}

impl DataSource for FootballDataAdapter {
    fn id(&self) -> SourceId {
        SourceId::FootballData
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

/// Maps football-data.org status strings.
pub fn map_status(raw: &str) -> MatchStatus {
    match raw {
        "FINISHED" | "AWARDED" => MatchStatus::Finished,
        "SCHEDULED" | "TIMED" => MatchStatus::Scheduled,
        "IN_PLAY" | "PAUSED" | "LIVE" => MatchStatus::Live,
        _ => MatchStatus::Other,
    }
}

fn to_match_record(raw: RawMatch, fallback_competition: Option<&str>) -> Option<MatchRecord> {
    let Some((date, kickoff)) = split_timestamp(&raw.utc_date) else {
        warn!(id = raw.id, utc_date = %raw.utc_date, "skipping football-data match without a usable date");
        return None;
    };

    let competition = raw
        .competition
        .and_then(|competition| competition.name)
        .or_else(|| fallback_competition.map(str::to_owned))
        .unwrap_or_default();

    Some(MatchRecord::new(
        raw.id,
        date,
        kickoff,
        raw.home_team.name.unwrap_or_default(),
        raw.away_team.name.unwrap_or_default(),
        raw.score.full_time.home,
        raw.score.full_time.away,
        map_status(&raw.status),
        competition,
        raw.matchday.map(|day| day.to_string()),
    ))
}

fn to_standings_row(raw: RawTableRow) -> Option<StandingsRow> {
    let team = raw.team.name.unwrap_or_default();
    StandingsRow::new(
        raw.position,
        team.clone(),
        raw.played_games,
        raw.won,
        raw.draw,
        raw.lost,
        raw.goals_for,
        raw.goals_against,
        raw.goal_difference,
        raw.points,
    )
    .map_err(|error| warn!(%team, %error, "dropping inconsistent football-data standings row"))
    .ok()
}

#[derive(Debug, Deserialize)]
struct MatchesResponse {
    #[serde(default)]
    matches: Vec<RawMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMatch {
    #[serde(default)]
    id: u64,
    #[serde(default)]
    utc_date: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    matchday: Option<u32>,
    #[serde(default)]
    home_team: RawTeam,
    #[serde(default)]
    away_team: RawTeam,
    #[serde(default)]
    score: RawScore,
    #[serde(default)]
    competition: Option<RawCompetition>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTeam {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawScore {
    #[serde(default)]
    full_time: RawScoreLine,
}

#[derive(Debug, Default, Deserialize)]
struct RawScoreLine {
    #[serde(default)]
    home: Option<u32>,
    #[serde(default)]
    away: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawCompetition {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StandingsResponse {
    #[serde(default)]
    season: Option<RawSeason>,
    #[serde(default)]
    standings: Vec<RawStandingsGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSeason {
    #[serde(default)]
    start_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawStandingsGroup {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    table: Vec<RawTableRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTableRow {
    position: u32,
    #[serde(default)]
    team: RawTeam,
    played_games: u32,
    won: u32,
    draw: u32,
    lost: u32,
    goals_for: u32,
    goals_against: u32,
    goal_difference: i32,
    points: i32,
}
