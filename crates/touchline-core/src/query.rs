//! Tagged query descriptors and cache-key derivation.
//!
//! Every cacheable operation is described by a struct implementing
//! [`CacheQuery`]. The descriptor's parameter map, plus its `type` tag, is
//! serialized as canonical JSON (keys sorted) and hashed with SHA-256, so
//! parameter order never changes the key.
//!
//! | Kind tag | Descriptor |
//! |----------|------------|
//! | `matches` | [`MatchesRequest`] |
//! | `standings` | [`StandingsRequest`] |
//! | `player_info` | [`PlayerInfoQuery`] |
//! | `football_search` | [`FootballSearchQuery`] |
//! | `comprehensive_league` | [`LeagueSnapshotQuery`] |
//! | `player_comparison` | [`PlayerComparisonQuery`] |
//! | `latest_all_leagues` | [`LatestMatchesQuery`] |

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::{LeagueCode, MatchDate, StatusFilter};

/// A query descriptor that can be turned into a cache key.
pub trait CacheQuery {
    /// Value of the `type` tag.
    const KIND: &'static str;

    /// Parameters, without the `type` tag.
    fn parameters(&self) -> BTreeMap<String, Value>;

    /// Full canonical parameter map including `type`.
    fn descriptor(&self) -> BTreeMap<String, Value> {
        let mut params = self.parameters();
        params.insert(String::from("type"), Value::from(Self::KIND));
        params
    }

    fn cache_key(&self) -> CacheKey {
        CacheKey::from_params(self.descriptor())
    }
}

/// Lower-case hex SHA-256 of a canonical parameter map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Hashes any parameter set; insertion order is irrelevant.
    pub fn from_params(params: impl IntoIterator<Item = (String, Value)>) -> Self {
        let sorted = params.into_iter().collect::<BTreeMap<_, _>>();
        let canonical = Value::Object(sorted.into_iter().collect()).to_string();
        Self(format!("{:x}", Sha256::digest(canonical.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Accepts a previously derived key (64 lower-case hex chars).
    pub fn parse(value: &str) -> Option<Self> {
        let valid = value.len() == 64
            && value
                .chars()
                .all(|ch| ch.is_ascii_digit() || ('a'..='f').contains(&ch));
        valid.then(|| Self(value.to_owned()))
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn optional<T: ToString>(value: Option<&T>) -> Value {
    value.map_or(Value::Null, |value| Value::from(value.to_string()))
}

fn normalized_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Fixture lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchesRequest {
    pub league: Option<LeagueCode>,
    pub date: Option<MatchDate>,
    #[serde(default)]
    pub status: StatusFilter,
}

impl MatchesRequest {
    pub fn new(league: Option<LeagueCode>, date: Option<MatchDate>, status: StatusFilter) -> Self {
        Self {
            league,
            date,
            status,
        }
    }
}

impl CacheQuery for MatchesRequest {
    const KIND: &'static str = "matches";

    fn parameters(&self) -> BTreeMap<String, Value> {
        BTreeMap::from([
            (String::from("league"), optional(self.league.as_ref())),
            (String::from("date"), optional(self.date.as_ref())),
            (String::from("status"), Value::from(self.status.as_str())),
        ])
    }
}

/// League-table lookup. The manager fills `season` with the current year
/// before deriving a key when the caller leaves it empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsRequest {
    pub league: LeagueCode,
    pub season: Option<String>,
}

impl StandingsRequest {
    pub fn new(league: LeagueCode, season: Option<String>) -> Self {
        Self { league, season }
    }
}

impl CacheQuery for StandingsRequest {
    const KIND: &'static str = "standings";

    fn parameters(&self) -> BTreeMap<String, Value> {
        BTreeMap::from([
            (String::from("league"), Value::from(self.league.as_str())),
            (String::from("season"), optional(self.season.as_ref())),
        ])
    }
}

/// Player profile lookup, keyed per day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInfoQuery {
    pub player: String,
    pub include_market_value: bool,
    pub date: MatchDate,
}

impl PlayerInfoQuery {
    pub fn new(player: &str, include_market_value: bool, date: MatchDate) -> Self {
        Self {
            player: normalized_name(player),
            include_market_value,
            date,
        }
    }
}

impl CacheQuery for PlayerInfoQuery {
    const KIND: &'static str = "player_info";

    fn parameters(&self) -> BTreeMap<String, Value> {
        BTreeMap::from([
            (String::from("player"), Value::from(self.player.as_str())),
            (
                String::from("include_market_value"),
                Value::from(self.include_market_value),
            ),
            (String::from("date"), Value::from(self.date.to_string())),
        ])
    }
}

/// Free-text lookup, keyed per day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FootballSearchQuery {
    pub query: String,
    pub date: MatchDate,
}

impl FootballSearchQuery {
    pub fn new(query: &str, date: MatchDate) -> Self {
        Self {
            query: normalized_name(query),
            date,
        }
    }
}

impl CacheQuery for FootballSearchQuery {
    const KIND: &'static str = "football_search";

    fn parameters(&self) -> BTreeMap<String, Value> {
        BTreeMap::from([
            (String::from("query"), Value::from(self.query.as_str())),
            (String::from("date"), Value::from(self.date.to_string())),
        ])
    }
}

/// Composite league snapshot, keyed per day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeagueSnapshotQuery {
    pub league: LeagueCode,
    pub season: Option<String>,
    pub date: MatchDate,
}

impl LeagueSnapshotQuery {
    pub fn new(league: LeagueCode, season: Option<String>, date: MatchDate) -> Self {
        Self {
            league,
            season,
            date,
        }
    }
}

impl CacheQuery for LeagueSnapshotQuery {
    const KIND: &'static str = "comprehensive_league";

    fn parameters(&self) -> BTreeMap<String, Value> {
        BTreeMap::from([
            (String::from("league"), Value::from(self.league.as_str())),
            (String::from("season"), optional(self.season.as_ref())),
            (String::from("date"), Value::from(self.date.to_string())),
        ])
    }
}

/// Two-player comparison, keyed per day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerComparisonQuery {
    pub player1: String,
    pub player2: String,
    pub date: MatchDate,
}

impl PlayerComparisonQuery {
    pub fn new(player1: &str, player2: &str, date: MatchDate) -> Self {
        Self {
            player1: normalized_name(player1),
            player2: normalized_name(player2),
            date,
        }
    }
}

impl CacheQuery for PlayerComparisonQuery {
    const KIND: &'static str = "player_comparison";

    fn parameters(&self) -> BTreeMap<String, Value> {
        BTreeMap::from([
            (String::from("player1"), Value::from(self.player1.as_str())),
            (String::from("player2"), Value::from(self.player2.as_str())),
            (String::from("date"), Value::from(self.date.to_string())),
        ])
    }
}

/// Newest finished fixtures across every league, keyed per day and limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestMatchesQuery {
    pub limit: usize,
    pub date: MatchDate,
}

impl LatestMatchesQuery {
    pub fn new(limit: usize, date: MatchDate) -> Self {
        Self { limit, date }
    }
}

impl CacheQuery for LatestMatchesQuery {
    const KIND: &'static str = "latest_all_leagues";

    fn parameters(&self) -> BTreeMap<String, Value> {
        BTreeMap::from([
            (String::from("limit"), Value::from(self.limit)),
            (String::from("date"), Value::from(self.date.to_string())),
        ])
    }
}
