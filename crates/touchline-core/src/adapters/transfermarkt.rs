use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::adapters::{first_text, labelled_rows, non_empty};
use crate::data_source::{
    CapabilitySet, DataSource, Endpoint, FixtureBatch, FixturesRequest, PlayerRequest,
    SearchBatch, SearchRequest, SourceError, SourceFuture, TableRequest,
};
use crate::fetcher::HttpFetcher;
use crate::http_client::{HttpRequest, BROWSER_USER_AGENT};
use crate::{Biography, MarketValuation, SourceId, StandingsTable};

pub const TRANSFERMARKT_BASE_URL: &str = "https://www.transfermarkt.com";

/// Transfermarkt market-value scraper.
#[derive(Clone)]
pub struct TransfermarktAdapter {
    fetcher: HttpFetcher,
    base_url: String,
}

impl TransfermarktAdapter {
    pub fn new(fetcher: HttpFetcher) -> Self {
        Self {
            fetcher,
            base_url: String::from(TRANSFERMARKT_BASE_URL),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    async fn lookup(&self, name: &str) -> Result<MarketValuation, SourceError> {
        let search = HttpRequest::get(format!(
            "{}/schnellsuche/ergebnis/schnellsuche",
            self.base_url
        ))
        .with_header("User-Agent", BROWSER_USER_AGENT)
        .with_query("query", name);

        let results = self
            .fetcher
            .fetch_text(SourceId::Transfermarkt, search)
            .await
            .map_err(|error| SourceError::from_fetch(SourceId::Transfermarkt, error))?;

        let path = first_profile_link(&results).ok_or_else(|| {
            SourceError::unavailable(format!("no transfermarkt profile matches '{name}'"))
        })?;
        let profile_url = format!("{}{}", self.base_url, path);

        let profile = self
            .fetcher
            .fetch_text(
                SourceId::Transfermarkt,
                HttpRequest::get(profile_url.clone()).with_header("User-Agent", BROWSER_USER_AGENT),
            )
            .await
            .map_err(|error| SourceError::from_fetch(SourceId::Transfermarkt, error))?;

        Ok(parse_profile(&profile, profile_url))
    }
}

impl DataSource for TransfermarktAdapter {
    fn id(&self) -> SourceId {
        SourceId::Transfermarkt
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet {
            market_value: true,
            ..CapabilitySet::none()
        }
    }

    fn fixtures<'a>(&'a self, _req: FixturesRequest) -> SourceFuture<'a, FixtureBatch> {
        Box::pin(async move { Err(SourceError::unsupported_endpoint(Endpoint::Matches)) })
    }

    fn standings<'a>(&'a self, _req: TableRequest) -> SourceFuture<'a, StandingsTable> {
        Box::pin(async move { Err(SourceError::unsupported_endpoint(Endpoint::Standings)) })
    }

    fn biography<'a>(&'a self, _req: PlayerRequest) -> SourceFuture<'a, Biography> {
        Box::pin(async move { Err(SourceError::unsupported_endpoint(Endpoint::Biography)) })
    }

    fn market_value<'a>(&'a self, req: PlayerRequest) -> SourceFuture<'a, MarketValuation> {
        Box::pin(async move { self.lookup(&req.name).await })
    }

    fn search<'a>(&'a self, _req: SearchRequest) -> SourceFuture<'a, SearchBatch> {
        Box::pin(async move { Err(SourceError::unsupported_endpoint(Endpoint::Search)) })
    }
}

fn profile_path_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^/[^/]+/profil/spieler/\d+").ok())
        .as_ref()
}

/// First `/<slug>/profil/spieler/<id>` link on a quick-search result page.
pub fn first_profile_link(html: &str) -> Option<String> {
    let pattern = profile_path_pattern()?;
    let anchors = Selector::parse("a[href]").ok()?;
    let document = Html::parse_document(html);

    let path = document
        .select(&anchors)
        .filter_map(|anchor| anchor.value().attr("href"))
        .find_map(|href| pattern.find(href).map(|found| found.as_str().to_owned()));
    path
}

/// Extracts valuation fields from a profile page.
pub fn parse_profile(html: &str, profile_url: String) -> MarketValuation {
    let document = Html::parse_document(html);
    let mut valuation = MarketValuation {
        market_value: first_text(&document, "a.data-header__market-value-wrapper")
            .map(|text| strip_last_update(&text)),
        profile_url: Some(profile_url),
        ..MarketValuation::default()
    };

    for (label, value) in labelled_rows(&document, "table.auflistung") {
        let Some(value) = non_empty(value) else {
            continue;
        };
        let slot = if label.contains("age") {
            &mut valuation.age
        } else if label.contains("position") {
            &mut valuation.position
        } else if label.contains("current club") {
            &mut valuation.current_club
        } else {
            continue;
        };
        slot.get_or_insert(value);
    }

    valuation
}

/// The value badge carries a trailing "Last update: ..." caption.
fn strip_last_update(text: &str) -> String {
    match text.find("Last update") {
        Some(index) => text[..index].trim_end().to_owned(),
        None => text.to_owned(),
    }
}
