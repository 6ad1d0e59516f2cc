//! Content-addressed memo of extracted text.
//!
//! Keyed by the SHA-256 of the file bytes, so identical content under
//! different names shares one entry. Entries older than the TTL are never
//! returned; they are dropped lazily on the next `store`. After every
//! `store` the map holds at most `max_entries` entries.
//!
//! One mutex guards the whole map. Hashing and extraction run outside it.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Serialize;

use super::hash::{compute_content_hash, content_hash};
use super::TextExtractor;
use crate::config::ClassifierConfig;

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_MAX_ENTRIES: usize = 100;

#[derive(Debug, Clone)]
struct CacheEntry {
    text: String,
    created_at: Instant,
    /// Insertion order, breaks timestamp ties during eviction.
    seq: u64,
}

/// Counters exposed for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

pub struct ExtractionCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
    next_seq: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for ExtractionCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_MAX_ENTRIES)
    }
}

impl ExtractionCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_entries,
            next_seq: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(config.cache_ttl(), config.cache_max_entries)
    }

    /// Cached text for the file's content, if present and fresh.
    /// An unreadable file is a miss.
    pub fn lookup(&self, path: &Path) -> Option<String> {
        let key = compute_content_hash(path).ok()?;
        self.lookup_key(&key)
    }

    /// Cache text under the file's content hash.
    pub fn store(&self, path: &Path, text: &str) {
        match compute_content_hash(path) {
            Ok(key) => self.store_key(key, text),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot hash file, not caching");
            }
        }
    }

    /// Cached text for raw bytes already in memory.
    pub fn lookup_bytes(&self, bytes: &[u8]) -> Option<String> {
        self.lookup_key(&content_hash(bytes))
    }

    pub fn store_bytes(&self, bytes: &[u8], text: &str) {
        self.store_key(content_hash(bytes), text);
    }

    /// Cached text or a fresh extraction. Extraction failures degrade to
    /// empty text and are not cached.
    pub fn lookup_or_extract(&self, path: &Path, extractor: &dyn TextExtractor) -> String {
        let key = match compute_content_hash(path) {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot hash file, extracting uncached");
                None
            }
        };

        if let Some(text) = key.as_deref().and_then(|k| self.lookup_key(k)) {
            tracing::debug!(path = %path.display(), "Extraction cache hit");
            return text;
        }

        match extractor.extract(path) {
            Ok(text) => {
                if let Some(key) = key {
                    self.store_key(key, &text);
                }
                text
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Extraction failed, using empty text");
                String::new()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn lookup_key(&self, key: &str) -> Option<String> {
        let found = self.lock().and_then(|map| {
            map.get(key)
                .filter(|entry| entry.created_at.elapsed() <= self.ttl)
                .map(|entry| entry.text.clone())
        });
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    fn store_key(&self, key: String, text: &str) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let Some(mut map) = self.lock() else {
            return;
        };
        map.insert(
            key,
            CacheEntry {
                text: text.to_string(),
                created_at: Instant::now(),
                seq,
            },
        );
        self.evict(&mut map);
    }

    /// Drop expired entries, then the oldest until within capacity.
    fn evict(&self, map: &mut HashMap<String, CacheEntry>) {
        let before = map.len();
        map.retain(|_, entry| entry.created_at.elapsed() <= self.ttl);

        if map.len() > self.max_entries {
            let excess = map.len() - self.max_entries;
            let mut by_age: Vec<(Instant, u64, String)> = map
                .iter()
                .map(|(k, e)| (e.created_at, e.seq, k.clone()))
                .collect();
            by_age.sort();
            for (_, _, key) in by_age.into_iter().take(excess) {
                map.remove(&key);
            }
        }

        let evicted = before - map.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = map.len(), "Extraction cache evicted entries");
        }
    }

    fn lock(&self) -> Option<MutexGuard<'_, HashMap<String, CacheEntry>>> {
        match self.entries.lock() {
            Ok(guard) => Some(guard),
            Err(_) => {
                tracing::warn!("Extraction cache lock poisoned, bypassing cache");
                None
            }
        }
    }
}
