//! Typed configuration with defaults, TOML loading and environment overrides.
//!
//! Every field is defaulted, so an empty file (or no file) yields a working
//! configuration. Credentials are normally supplied through the environment:
//!
//! | Setting | Primary Env Var | Fallback Env Var |
//! |---------|-----------------|------------------|
//! | football-data.org key | `TOUCHLINE_FOOTBALL_DATA_API_KEY` | `FOOTBALL_DATA_API_KEY` |
//! | api-football key | `TOUCHLINE_API_FOOTBALL_KEY` | `API_FOOTBALL_KEY` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetrySettings;
use crate::throttling::RateLimitConfig;
use crate::{CoreError, LeagueTable, MatchStatus};

const FOOTBALL_DATA_KEY_VARS: [&str; 2] = ["TOUCHLINE_FOOTBALL_DATA_API_KEY", "FOOTBALL_DATA_API_KEY"];
const API_FOOTBALL_KEY_VARS: [&str; 2] = ["TOUCHLINE_API_FOOTBALL_KEY", "API_FOOTBALL_KEY"];

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchlineConfig {
    pub rate_limit: RateLimitConfig,
    pub retry: RetrySettings,
    pub request_timeout_secs: u64,
    pub credentials: Credentials,
    pub leagues: LeagueTable,
    pub cache: CacheSettings,
}

impl Default for TouchlineConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            retry: RetrySettings::default(),
            request_timeout_secs: 15,
            credentials: Credentials::default(),
            leagues: LeagueTable::default(),
            cache: CacheSettings::default(),
        }
    }
}

impl TouchlineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, CoreError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads a TOML file. Environment overrides are not applied here.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Defaults, optionally overlaid by a file, then by the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, CoreError> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Applies credential overrides using `lookup` in place of the process
    /// environment. Blank values are ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let first = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| lookup(name))
                .find(|value| !value.trim().is_empty())
        };

        if let Some(key) = first(&FOOTBALL_DATA_KEY_VARS) {
            self.credentials.football_data_api_key = Some(key);
        }
        if let Some(key) = first(&API_FOOTBALL_KEY_VARS) {
            self.credentials.api_football_key = Some(key);
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Upstream API credentials. Never serialized back out.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub football_data_api_key: Option<String>,
    pub api_football_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("football_data_api_key", &mask(&self.football_data_api_key))
            .field("api_football_key", &mask(&self.api_football_key))
            .finish()
    }
}

impl Serialize for Credentials {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Credentials", 2)?;
        state.serialize_field("football_data_api_key", &self.football_data_api_key.is_some())?;
        state.serialize_field("api_football_key", &self.api_football_key.is_some())?;
        state.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub dir: PathBuf,
    pub default_ttl_secs: u64,
    pub ttl: TtlPolicy,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("cache"),
            default_ttl_secs: 1800,
            ttl: TtlPolicy::default(),
        }
    }
}

impl CacheSettings {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }
}

/// Per-query-kind lifetimes, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtlPolicy {
    pub live_matches: u64,
    pub finished_matches: u64,
    pub other_matches: u64,
    pub standings: u64,
    pub player: u64,
    pub search: u64,
    pub league_snapshot: u64,
    pub player_comparison: u64,
    pub latest_matches: u64,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            live_matches: 30,
            finished_matches: 30 * 60,
            other_matches: 3 * 60,
            standings: 30 * 60,
            player: 6 * 60 * 60,
            search: 24 * 60 * 60,
            league_snapshot: 30 * 60,
            player_comparison: 6 * 60 * 60,
            latest_matches: 10 * 60,
        }
    }
}

impl TtlPolicy {
    /// Lifetime of a match query filtered to `status`; `None` means unfiltered.
    pub fn for_matches(&self, status: Option<MatchStatus>) -> Duration {
        let secs = match status {
            Some(MatchStatus::Live) => self.live_matches,
            Some(MatchStatus::Finished) => self.finished_matches,
            _ => self.other_matches,
        };
        Duration::from_secs(secs)
    }

    pub fn standings(&self) -> Duration {
        Duration::from_secs(self.standings)
    }

    pub fn player(&self) -> Duration {
        Duration::from_secs(self.player)
    }

    pub fn search(&self) -> Duration {
        Duration::from_secs(self.search)
    }

    pub fn league_snapshot(&self) -> Duration {
        Duration::from_secs(self.league_snapshot)
    }

    pub fn player_comparison(&self) -> Duration {
        Duration::from_secs(self.player_comparison)
    }

    pub fn latest_matches(&self) -> Duration {
        Duration::from_secs(self.latest_matches)
    }
}
