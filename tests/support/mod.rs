//! Shared doubles for behavior tests: a programmable `DataSource`, a
//! scripted `HttpClient` and fixed-instant clocks.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use touchline_core::{
    Biography, CacheStore, CapabilitySet, Clock, DataSource, FixtureBatch, FixturesRequest,
    HttpClient, HttpError, HttpFetcher, HttpRequest, HttpResponse, ManualClock, MarketValuation,
    MatchDate, MatchRecord, MatchStatus, PlayerRequest, RateLimitConfig, RateLimiter, SearchBatch,
    SearchRequest, SourceError, SourceId, SourceManager, StandingsRow, StandingsTable,
    TableRequest,
};
use touchline_core::data_source::SourceFuture;

/// 2024-10-01T12:00:00Z
pub const OCT_1_2024_NOON: i64 = 1_727_784_000;

pub fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::at_unix(OCT_1_2024_NOON))
}

pub fn date(raw: &str) -> MatchDate {
    MatchDate::parse(raw).expect("valid test date")
}

pub fn finished(id: u64, day: &str, kickoff: &str, home: &str, away: &str, score: (u32, u32)) -> MatchRecord {
    MatchRecord::new(
        id,
        date(day),
        Some(kickoff.to_owned()),
        home,
        away,
        Some(score.0),
        Some(score.1),
        MatchStatus::Finished,
        "Premier League",
        None,
    )
}

pub fn scheduled(id: u64, day: &str, home: &str, away: &str) -> MatchRecord {
    MatchRecord::new(
        id,
        date(day),
        Some(String::from("15:00")),
        home,
        away,
        None,
        None,
        MatchStatus::Scheduled,
        "Premier League",
        None,
    )
}

pub fn table(rows: &[(u32, &str, u32)]) -> StandingsTable {
    let rows = rows
        .iter()
        .map(|(position, team, points)| {
            let won = points / 3;
            let drawn = points % 3;
            StandingsRow::new(
                *position,
                *team,
                won + drawn,
                won,
                drawn,
                0,
                won * 2,
                0,
                (won * 2) as i32,
                *points as i32,
            )
            .expect("consistent row")
        })
        .collect();
    StandingsTable::new("Premier League", Some(String::from("2024")), rows)
}

type Handler<Req, Res> = Box<dyn Fn(&Req) -> Result<Res, SourceError> + Send + Sync>;

fn not_stubbed<Req, Res>() -> Handler<Req, Res> {
    Box::new(|_: &Req| Err(SourceError::unavailable("not stubbed")))
}

/// Programmable source. Unconfigured endpoints fail as unavailable.
pub struct StubSource {
    id: SourceId,
    capabilities: CapabilitySet,
    fixtures: Handler<FixturesRequest, FixtureBatch>,
    standings: Handler<TableRequest, StandingsTable>,
    biography: Handler<PlayerRequest, Biography>,
    market_value: Handler<PlayerRequest, MarketValuation>,
    search: Handler<SearchRequest, SearchBatch>,
    calls: AtomicUsize,
    fixture_requests: Mutex<Vec<FixturesRequest>>,
}

impl StubSource {
    pub fn new(id: SourceId, capabilities: CapabilitySet) -> Self {
        Self {
            id,
            capabilities,
            fixtures: not_stubbed(),
            standings: not_stubbed(),
            biography: not_stubbed(),
            market_value: not_stubbed(),
            search: not_stubbed(),
            calls: AtomicUsize::new(0),
            fixture_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn competitions(id: SourceId) -> Self {
        Self::new(id, CapabilitySet::competitions())
    }

    pub fn with_fixtures(
        mut self,
        handler: impl Fn(&FixturesRequest) -> Result<FixtureBatch, SourceError> + Send + Sync + 'static,
    ) -> Self {
        self.fixtures = Box::new(handler);
        self
    }

    pub fn with_standings(
        mut self,
        handler: impl Fn(&TableRequest) -> Result<StandingsTable, SourceError> + Send + Sync + 'static,
    ) -> Self {
        self.standings = Box::new(handler);
        self
    }

    pub fn with_biography(
        mut self,
        handler: impl Fn(&PlayerRequest) -> Result<Biography, SourceError> + Send + Sync + 'static,
    ) -> Self {
        self.biography = Box::new(handler);
        self
    }

    pub fn with_market_value(
        mut self,
        handler: impl Fn(&PlayerRequest) -> Result<MarketValuation, SourceError> + Send + Sync + 'static,
    ) -> Self {
        self.market_value = Box::new(handler);
        self
    }

    pub fn with_search(
        mut self,
        handler: impl Fn(&SearchRequest) -> Result<SearchBatch, SourceError> + Send + Sync + 'static,
    ) -> Self {
        self.search = Box::new(handler);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fixture_requests(&self) -> Vec<FixturesRequest> {
        self.fixture_requests.lock().expect("requests lock").clone()
    }

    fn answer<Req, Res>(&self, handler: &Handler<Req, Res>, req: &Req) -> Result<Res, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        handler(req)
    }
}

impl DataSource for StubSource {
    fn id(&self) -> SourceId {
        self.id
    }

    fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    fn fixtures<'a>(&'a self, req: FixturesRequest) -> SourceFuture<'a, FixtureBatch> {
        self.fixture_requests.lock().expect("requests lock").push(req.clone());
        let result = self.answer(&self.fixtures, &req);
        Box::pin(async move { result })
    }

    fn standings<'a>(&'a self, req: TableRequest) -> SourceFuture<'a, StandingsTable> {
        let result = self.answer(&self.standings, &req);
        Box::pin(async move { result })
    }

    fn biography<'a>(&'a self, req: PlayerRequest) -> SourceFuture<'a, Biography> {
        let result = self.answer(&self.biography, &req);
        Box::pin(async move { result })
    }

    fn market_value<'a>(&'a self, req: PlayerRequest) -> SourceFuture<'a, MarketValuation> {
        let result = self.answer(&self.market_value, &req);
        Box::pin(async move { result })
    }

    fn search<'a>(&'a self, req: SearchRequest) -> SourceFuture<'a, SearchBatch> {
        let result = self.answer(&self.search, &req);
        Box::pin(async move { result })
    }
}

/// Manager over `sources` with an in-memory cache and a manual clock.
pub fn manager(sources: Vec<Arc<dyn DataSource>>, clock: &Arc<ManualClock>) -> SourceManager {
    let clock = Arc::clone(clock) as Arc<dyn Clock>;
    SourceManager::new(
        sources,
        CacheStore::in_memory(Duration::from_secs(1800)).with_clock(Arc::clone(&clock)),
    )
    .with_clock(clock)
}

/// Replays canned responses in order and records every request.
pub struct ScriptedHttpClient {
    responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.requests.lock().expect("requests lock").push(request);
        let response = self
            .responses
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| Err(HttpError::other("script exhausted")));
        Box::pin(async move { response })
    }
}

/// Fetcher over a scripted client with no request spacing.
pub fn scripted_fetcher(
    script: Vec<Result<HttpResponse, HttpError>>,
) -> (HttpFetcher, Arc<ScriptedHttpClient>, Arc<ManualClock>) {
    let clock = clock();
    let client = Arc::new(ScriptedHttpClient::new(script));
    let limiter = Arc::new(RateLimiter::new(
        RateLimitConfig {
            min_interval_secs: 0.0,
            max_requests_per_minute: 50,
        },
        Arc::clone(&clock) as Arc<dyn Clock>,
    ));
    let fetcher = HttpFetcher::new(
        Arc::clone(&client) as Arc<dyn HttpClient>,
        limiter,
        Arc::clone(&clock) as Arc<dyn Clock>,
    );
    (fetcher, client, clock)
}
