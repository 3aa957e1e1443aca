//! Upstream adapters.
//!
//! | Adapter | Upstream | Endpoints |
//! |---------|----------|-----------|
//! | [`FootballDataAdapter`] | football-data.org v4 (REST) | matches, standings |
//! | [`ApiFootballAdapter`] | api-football v3 (REST) | matches, standings |
//! | [`WikipediaAdapter`] | en.wikipedia.org (HTML) | biography, search |
//! | [`TransfermarktAdapter`] | transfermarkt.com (HTML) | market value |
//!
//! HTML extraction never fails a record: each field is looked up on its own
//! and a missing marker leaves that field `None`.

pub mod api_football;
pub mod football_data;
pub mod transfermarkt;
pub mod wikipedia;

pub use api_football::ApiFootballAdapter;
pub use football_data::FootballDataAdapter;
pub use transfermarkt::TransfermarktAdapter;
pub use wikipedia::WikipediaAdapter;

use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{SourceError, SourceId};

/// Decodes a fetched JSON value into an upstream response shape.
pub(crate) fn decode<T: DeserializeOwned>(source: SourceId, value: Value) -> Result<T, SourceError> {
    serde_json::from_value(value).map_err(|error| {
        SourceError::unavailable(format!(
            "{} returned an unexpected payload: {error}",
            source.as_str()
        ))
    })
}

/// Joins text nodes, drops footnote markers like `[1]` and collapses whitespace.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    static FOOTNOTE: OnceLock<Option<Regex>> = OnceLock::new();

    let raw = element.text().collect::<Vec<_>>().join(" ");
    let stripped = match FOOTNOTE.get_or_init(|| Regex::new(r"\[\s*(\d+|[a-z]|citation needed)\s*\]").ok()) {
        Some(pattern) => pattern.replace_all(&raw, " ").into_owned(),
        None => raw,
    };
    collapse_whitespace(&stripped)
}

pub(crate) fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Text of the first element matching `css`, if any.
pub(crate) fn first_text(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document
        .select(&selector)
        .next()
        .map(element_text)
        .and_then(non_empty)
}

/// `(label, value)` pairs from the `th`/`td` rows of the first table matching
/// `table_css`. Labels are lower-cased.
pub(crate) fn labelled_rows(document: &Html, table_css: &str) -> Vec<(String, String)> {
    let (Ok(table), Ok(row), Ok(header), Ok(cell)) = (
        Selector::parse(table_css),
        Selector::parse("tr"),
        Selector::parse("th"),
        Selector::parse("td"),
    ) else {
        return Vec::new();
    };

    let Some(table) = document.select(&table).next() else {
        return Vec::new();
    };

    table
        .select(&row)
        .filter_map(|tr| {
            let label = tr.select(&header).next().map(element_text)?;
            let value = tr.select(&cell).next().map(element_text)?;
            Some((label.to_lowercase(), value))
        })
        .collect()
}

/// Truncates to at most `max_chars` characters, on a char boundary.
pub(crate) fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((index, _)) => format!("{}...", value[..index].trim_end()),
        None => value.to_owned(),
    }
}
