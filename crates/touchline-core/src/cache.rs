//! Two-tier (memory + disk) cache for query results.
//!
//! Entries are keyed by [`CacheKey`] and carry their own TTL. The memory tier
//! is checked first; on a miss the disk tier (`<dir>/<key>.json`) is read and
//! valid hits are promoted into memory. Stale or unreadable entries are
//! deleted when discovered. Disk failures are logged, never returned.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::query::{CacheKey, CacheQuery};
use crate::{Clock, SystemClock};

pub const DEFAULT_TTL: Duration = Duration::from_secs(1800);

/// Defines how a lookup interacts with the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    /// Read from the cache if a fresh entry is present;
    /// otherwise, fetch and write a successful result to the cache. (Default)
    #[default]
    Use,
    /// Always fetch, skipping any cached entry,
    /// and write a successful result to the cache.
    Refresh,
    /// Always fetch and do not read from or write to the cache.
    Bypass,
}

/// A result type that can be stored. Results carrying an error marker are
/// never written.
pub trait CachePayload: Serialize + DeserializeOwned {
    fn error_marker(&self) -> Option<&str>;

    /// Called on values served from the cache.
    fn mark_cached(&mut self) {}
}

/// One stored result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub payload: Value,
    /// Unix seconds, fractional.
    pub created_at: f64,
    pub ttl_secs: u64,
}

impl CacheEntry {
    fn is_fresh(&self, now: f64, ttl_override: Option<Duration>) -> bool {
        let ttl = ttl_override.unwrap_or(Duration::from_secs(self.ttl_secs));
        now - self.created_at < ttl.as_secs_f64()
    }
}

/// Cache occupancy snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub memory_entries: usize,
    pub file_entries: usize,
    pub cache_dir: Option<PathBuf>,
}

type FlightGates = HashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>;

/// Thread-safe two-tier cache store.
#[derive(Debug, Clone)]
pub struct CacheStore {
    memory: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,
    in_flight: Arc<Mutex<FlightGates>>,
    dir: Option<PathBuf>,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    /// Memory-only store.
    pub fn in_memory(default_ttl: Duration) -> Self {
        Self {
            memory: Arc::new(RwLock::new(HashMap::new())),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            dir: None,
            default_ttl,
            clock: Arc::new(SystemClock),
        }
    }

    /// Memory + disk store. `dir` is created on first write.
    pub fn persistent(dir: impl Into<PathBuf>, default_ttl: Duration) -> Self {
        Self {
            dir: Some(dir.into()),
            ..Self::in_memory(default_ttl)
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub const fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn cache_dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Derives the key for a query descriptor.
    pub fn key_for<Q: CacheQuery>(query: &Q) -> CacheKey {
        query.cache_key()
    }

    /// Fresh payload for `key`, if any. `ttl_override` replaces the entry's
    /// own TTL for this check.
    pub async fn get(&self, key: &CacheKey, ttl_override: Option<Duration>) -> Option<Value> {
        let now = self.clock.unix_seconds();

        let stale = {
            let memory = self.memory.read().await;
            match memory.get(key) {
                Some(entry) if entry.is_fresh(now, ttl_override) => {
                    debug!(key = %key, "memory cache hit");
                    return Some(entry.payload.clone());
                }
                Some(_) => true,
                None => false,
            }
        };

        if stale {
            let mut memory = self.memory.write().await;
            if memory
                .get(key)
                .is_some_and(|entry| !entry.is_fresh(now, ttl_override))
            {
                memory.remove(key);
                debug!(key = %key, "evicted stale memory entry");
            }
        }

        let path = self.entry_path(key)?;
        let entry = self.read_entry(&path).await?;
        if !entry.is_fresh(now, ttl_override) {
            debug!(key = %key, "removing stale cache file");
            remove_file_logged(&path).await;
            return None;
        }

        debug!(key = %key, "disk cache hit, promoting to memory");
        let payload = entry.payload.clone();
        self.memory.write().await.insert(key.clone(), entry);
        Some(payload)
    }

    /// Stores `payload` in both tiers.
    pub async fn set(&self, key: &CacheKey, payload: Value, ttl_override: Option<Duration>) {
        let entry = CacheEntry {
            key: key.to_string(),
            payload,
            created_at: self.clock.unix_seconds(),
            ttl_secs: ttl_override.unwrap_or(self.default_ttl).as_secs(),
        };

        if let Some(path) = self.entry_path(key) {
            self.write_entry(&path, &entry).await;
        }
        self.memory.write().await.insert(key.clone(), entry);
    }

    /// Read-through lookup. On a miss, `fetch` receives the query descriptor
    /// and its result is stored unless it carries an error marker.
    ///
    /// Concurrent misses on one key are serialized: followers wait for the
    /// leader and then re-check the cache. If the leader's result was not
    /// stored (error marker), each follower fetches in turn.
    pub async fn get_or_fetch<Q, T, F, Fut>(
        &self,
        query: Q,
        ttl_override: Option<Duration>,
        mode: CacheMode,
        fetch: F,
    ) -> T
    where
        Q: CacheQuery,
        T: CachePayload,
        F: FnOnce(Q) -> Fut,
        Fut: Future<Output = T>,
    {
        if mode == CacheMode::Bypass {
            return fetch(query).await;
        }

        let key = Self::key_for(&query);
        if mode == CacheMode::Use {
            if let Some(hit) = self.typed_get::<T>(&key, ttl_override).await {
                return hit;
            }
        }

        let gate = self.flight_gate(&key);
        let result = {
            let _leader = gate.lock().await;

            let cached = match mode {
                CacheMode::Use => self.typed_get::<T>(&key, ttl_override).await,
                _ => None,
            };

            match cached {
                Some(hit) => hit,
                None => {
                    let fresh = fetch(query).await;
                    self.store_result(&key, &fresh, ttl_override).await;
                    fresh
                }
            }
        };
        self.release_gate(&key, &gate);
        result
    }

    /// Removes stale entries from both tiers; returns how many keys were dropped.
    pub async fn clear_expired(&self) -> usize {
        let now = self.clock.unix_seconds();
        let mut removed = HashSet::new();

        {
            let mut memory = self.memory.write().await;
            memory.retain(|key, entry| {
                let fresh = entry.is_fresh(now, None);
                if !fresh {
                    removed.insert(key.to_string());
                }
                fresh
            });
        }

        for path in self.entry_files().await {
            let stale = match self.read_entry(&path).await {
                Some(entry) if !entry.is_fresh(now, None) => {
                    remove_file_logged(&path).await;
                    Some(entry.key)
                }
                Some(_) => None,
                // Unreadable files are deleted by `read_entry`.
                None => file_key(&path),
            };
            if let Some(key) = stale {
                removed.insert(key);
            }
        }

        debug!(removed = removed.len(), "cleared expired cache entries");
        removed.len()
    }

    /// Drops every entry in both tiers; returns how many keys were dropped.
    pub async fn clear_all(&self) -> usize {
        let mut removed = {
            let mut memory = self.memory.write().await;
            memory.drain().map(|(key, _)| key.to_string()).collect::<HashSet<_>>()
        };

        for path in self.entry_files().await {
            remove_file_logged(&path).await;
            if let Some(key) = file_key(&path) {
                removed.insert(key);
            }
        }

        removed.len()
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            memory_entries: self.memory.read().await.len(),
            file_entries: self.entry_files().await.len(),
            cache_dir: self.dir.clone(),
        }
    }

    async fn typed_get<T: CachePayload>(&self, key: &CacheKey, ttl_override: Option<Duration>) -> Option<T> {
        let payload = self.get(key, ttl_override).await?;
        match serde_json::from_value::<T>(payload) {
            Ok(mut value) => {
                value.mark_cached();
                Some(value)
            }
            Err(error) => {
                warn!(key = %key, %error, "cached payload does not match the expected shape, treating as miss");
                None
            }
        }
    }

    async fn store_result<T: CachePayload>(&self, key: &CacheKey, value: &T, ttl_override: Option<Duration>) {
        if let Some(marker) = value.error_marker() {
            debug!(key = %key, error = marker, "not caching failed result");
            return;
        }

        match serde_json::to_value(value) {
            Ok(payload) => self.set(key, payload, ttl_override).await,
            Err(error) => warn!(key = %key, %error, "result could not be serialized for caching"),
        }
    }

    fn flight_gate(&self, key: &CacheKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut gates = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(gates.entry(key.clone()).or_default())
    }

    fn release_gate(&self, key: &CacheKey, gate: &Arc<tokio::sync::Mutex<()>>) {
        let mut gates = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the map and this caller hold the gate: nobody is waiting.
        if Arc::strong_count(gate) <= 2 {
            gates.remove(key);
        }
    }

    fn entry_path(&self, key: &CacheKey) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.json", key.as_str())))
    }

    /// Reads and parses one cache file. Corrupt files are deleted.
    async fn read_entry(&self, path: &Path) -> Option<CacheEntry> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => return None,
            Err(error) => {
                warn!(path = %path.display(), %error, "failed to read cache file");
                return None;
            }
        };

        match serde_json::from_slice::<CacheEntry>(&bytes) {
            Ok(entry) => Some(entry),
            Err(error) => {
                warn!(path = %path.display(), %error, "corrupt cache file, deleting");
                remove_file_logged(path).await;
                None
            }
        }
    }

    /// Writes to a uniquely named temp file, then renames it into place.
    async fn write_entry(&self, path: &Path, entry: &CacheEntry) {
        let Some(dir) = path.parent() else {
            return;
        };
        if let Err(error) = tokio::fs::create_dir_all(dir).await {
            warn!(dir = %dir.display(), %error, "failed to create cache directory");
            return;
        }

        let body = match serde_json::to_vec(entry) {
            Ok(body) => body,
            Err(error) => {
                warn!(key = %entry.key, %error, "failed to encode cache entry");
                return;
            }
        };

        let temp = dir.join(format!("{}.json.{}.tmp", entry.key, uuid::Uuid::new_v4()));
        if let Err(error) = tokio::fs::write(&temp, &body).await {
            warn!(path = %temp.display(), %error, "failed to write cache file");
            remove_file_logged(&temp).await;
            return;
        }
        if let Err(error) = tokio::fs::rename(&temp, path).await {
            warn!(path = %path.display(), %error, "failed to move cache file into place");
            remove_file_logged(&temp).await;
        }
    }

    async fn entry_files(&self) -> Vec<PathBuf> {
        let Some(dir) = &self.dir else {
            return Vec::new();
        };

        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(error) if error.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(error) => {
                warn!(dir = %dir.display(), %error, "failed to list cache directory");
                return Vec::new();
            }
        };

        let mut files = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let path = entry.path();
                    if path.extension().is_some_and(|ext| ext == "json") {
                        files.push(path);
                    }
                }
                Ok(None) => break,
                Err(error) => {
                    warn!(dir = %dir.display(), %error, "failed to read cache directory entry");
                    break;
                }
            }
        }
        files
    }
}

fn file_key(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_owned)
}

async fn remove_file_logged(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(error) if error.kind() == ErrorKind::NotFound => {}
        Err(error) => warn!(path = %path.display(), %error, "failed to remove cache file"),
    }
}
