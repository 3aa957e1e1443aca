use scraper::{Html, Selector};
use serde::Deserialize;

use crate::adapters::{decode, element_text, labelled_rows, non_empty, truncate_chars};
use crate::data_source::{
    CapabilitySet, DataSource, Endpoint, FixtureBatch, FixturesRequest, PlayerRequest,
    SearchBatch, SearchRequest, SourceError, SourceFuture, TableRequest,
};
use crate::fetcher::HttpFetcher;
use crate::http_client::{HttpRequest, BROWSER_USER_AGENT};
use crate::{Biography, MarketValuation, SourceId, StandingsTable};

pub const WIKIPEDIA_BASE_URL: &str = "https://en.wikipedia.org";

const SEARCH_LIMIT: &str = "3";
const SUMMARY_MAX_CHARS: usize = 500;

/// Wikipedia biography scraper.
#[derive(Clone)]
pub struct WikipediaAdapter {
    fetcher: HttpFetcher,
    base_url: String,
}

impl WikipediaAdapter {
    pub fn new(fetcher: HttpFetcher) -> Self {
        Self {
            fetcher,
            base_url: String::from(WIKIPEDIA_BASE_URL),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Runs a full-text search and scrapes the best-ranked article.
    async fn lookup(&self, search_terms: String) -> Result<Biography, SourceError> {
        let request = HttpRequest::get(format!("{}/w/api.php", self.base_url))
            .with_header("User-Agent", BROWSER_USER_AGENT)
            .with_query("action", "query")
            .with_query("format", "json")
            .with_query("list", "search")
            .with_query("srsearch", search_terms.clone())
            .with_query("srlimit", SEARCH_LIMIT);

        let value = self
            .fetcher
            .fetch_json(SourceId::Wikipedia, request)
            .await
            .map_err(|error| SourceError::from_fetch(SourceId::Wikipedia, error))?;

        let response: SearchResponse = decode(SourceId::Wikipedia, value)?;
        let title = response
            .query
            .search
            .into_iter()
            .map(|hit| hit.title)
            .find(|title| !title.trim().is_empty())
            .ok_or_else(|| {
                SourceError::unavailable(format!("no wikipedia article matches '{search_terms}'"))
            })?;

        let html = self
            .fetcher
            .fetch_text(
                SourceId::Wikipedia,
                HttpRequest::get(self.article_url(&title))
                    .with_header("User-Agent", BROWSER_USER_AGENT),
            )
            .await
            .map_err(|error| SourceError::from_fetch(SourceId::Wikipedia, error))?;

        Ok(parse_article(&title, &html))
    }

    fn article_url(&self, title: &str) -> String {
        format!(
            "{}/wiki/{}",
            self.base_url,
            urlencoding::encode(&title.replace(' ', "_"))
        )
    }
}

impl DataSource for WikipediaAdapter {
    fn id(&self) -> SourceId {
        SourceId::Wikipedia
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet {
            biography: true,
            search: true,
            ..CapabilitySet::none()
        }
    }

    fn fixtures<'a>(&'a self, _req: FixturesRequest) -> SourceFuture<'a, FixtureBatch> {
        Box::pin(async move { Err(SourceError::unsupported_endpoint(Endpoint::Matches)) })
    }

    fn standings<'a>(&'a self, _req: TableRequest) -> SourceFuture<'a, StandingsTable> {
        Box::pin(async move { Err(SourceError::unsupported_endpoint(Endpoint::Standings)) })
    }

    fn biography<'a>(&'a self, req: PlayerRequest) -> SourceFuture<'a, Biography> {
        Box::pin(async move { self.lookup(format!("{} footballer", req.name)).await })
    }

    fn market_value<'a>(&'a self, _req: PlayerRequest) -> SourceFuture<'a, MarketValuation> {
        Box::pin(async move { Err(SourceError::unsupported_endpoint(Endpoint::MarketValue)) })
    }

    fn search<'a>(&'a self, req: SearchRequest) -> SourceFuture<'a, SearchBatch> {
        Box::pin(async move {
            let result = self.lookup(req.query.clone()).await?;
            Ok(SearchBatch {
                query: req.query,
                result,
            })
        })
    }
}

/// Extracts infobox fields and the lead paragraph from an article page.
pub fn parse_article(title: &str, html: &str) -> Biography {
    let document = Html::parse_document(html);
    let mut biography = Biography {
        title: title.to_owned(),
        ..Biography::default()
    };

    for (label, value) in labelled_rows(&document, "table.infobox") {
        let Some(value) = non_empty(value) else {
            continue;
        };
        let slot = if label.contains("born") || label.contains("birth") {
            &mut biography.birth_date
        } else if label.contains("position") {
            &mut biography.position
        } else if label.contains("current team") || label.contains("club") {
            &mut biography.current_team
        } else if label.contains("height") {
            &mut biography.height
        } else if label.contains("nationality") || label.contains("national") {
            &mut biography.nationality
        } else {
            continue;
        };
        slot.get_or_insert(value);
    }

    biography.summary = Selector::parse("p").ok().and_then(|paragraph| {
        document
            .select(&paragraph)
            .map(element_text)
            .find(|text| !text.is_empty())
            .map(|text| truncate_chars(&text, SUMMARY_MAX_CHARS))
    });

    biography
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: SearchQueryBlock,
}

#[derive(Debug, Default, Deserialize)]
struct SearchQueryBlock {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    title: String,
}
