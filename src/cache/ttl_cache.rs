// =============================================================================
// TTL Cache — lazy-expiry key/value store with hit/miss accounting
// =============================================================================
//
// Entries are only checked for expiry when they are read. There is no
// background sweeper: an expired entry that is never read again stays
// resident until it is overwritten, reclaimed by the optional capacity bound,
// or the cache is cleared.
//
// Thread safety:
//   - One parking_lot::Mutex around the key -> entry map.
//   - Atomic hit/miss counters so that `status()` never contends with readers
//     for longer than the map length lookup.
// =============================================================================

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

/// A cached value plus the instant it was inserted.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
}

/// Serialisable snapshot of cache health for the status endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub enabled: bool,
    /// Wall-clock time of this snapshot, ms since the UNIX epoch.
    pub last_update: i64,
    /// `hits / (hits + misses) * 100`, or 0 before the first read.
    pub cache_hit_rate: f64,
    /// Whole seconds since the cache was constructed.
    pub uptime: u64,
    pub entries: usize,
}

/// Time-boxed in-memory cache keyed by `String`.
///
/// `V` should be cheap to clone (the engine stores `Arc` handles) because
/// `get` hands back a clone of the stored value.
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    enabled: bool,
    /// When set, inserting a new key beyond this many entries reclaims the
    /// least-recently-created entry first.
    max_entries: Option<usize>,
    hits: AtomicU64,
    misses: AtomicU64,
    started_at: Instant,
}

impl<V: Clone> TtlCache<V> {
    /// Create an unbounded cache.
    pub fn new(ttl: Duration, enabled: bool) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            enabled,
            max_entries: None,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Bound the number of resident entries. `0` is treated as unbounded.
    pub fn with_max_entries(mut self, max_entries: Option<usize>) -> Self {
        self.max_entries = max_entries.filter(|m| *m > 0);
        self
    }

    // ── Writes ──────────────────────────────────────────────────────────

    /// Insert or wholesale replace `key`. No-op when the cache is disabled.
    pub fn set(&self, key: impl Into<String>, value: V) {
        if !self.enabled {
            return;
        }

        let key = key.into();
        let mut map = self.entries.lock();

        if let Some(max) = self.max_entries {
            if !map.contains_key(&key) && map.len() >= max {
                let oldest = map
                    .iter()
                    .min_by_key(|(_, e)| e.created_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    debug!(evicted = %oldest, max_entries = max, "cache at capacity, reclaiming oldest entry");
                    map.remove(&oldest);
                }
            }
        }

        map.insert(
            key,
            CacheEntry {
                value,
                created_at: Instant::now(),
            },
        );
    }

    /// Drop every entry. Hit/miss counters and uptime are kept.
    pub fn clear(&self) -> usize {
        let mut map = self.entries.lock();
        let removed = map.len();
        map.clear();
        removed
    }

    // ── Reads ───────────────────────────────────────────────────────────

    /// Look up `key`, evicting it if it has outlived the TTL.
    ///
    /// Every call counts as exactly one hit or one miss, including calls on
    /// a disabled cache (always a miss).
    pub fn get(&self, key: &str) -> Option<V> {
        if !self.enabled {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let mut map = self.entries.lock();

        let expired = match map.get(key) {
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key, "cache miss");
                return None;
            }
            Some(entry) => entry.created_at.elapsed() > self.ttl,
        };

        if expired {
            map.remove(key);
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(key, "cache entry expired");
            return None;
        }

        self.hits.fetch_add(1, Ordering::Relaxed);
        debug!(key, "cache hit");
        map.get(key).map(|e| e.value.clone())
    }

    /// Number of resident entries, expired-but-unread ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    // ── Status ──────────────────────────────────────────────────────────

    pub fn status(&self) -> CacheStatus {
        let hits = self.hits();
        let misses = self.misses();
        let total = hits + misses;
        let cache_hit_rate = if total > 0 {
            hits as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        CacheStatus {
            enabled: self.enabled,
            last_update: Utc::now().timestamp_millis(),
            cache_hit_rate,
            uptime: self.started_at.elapsed().as_secs(),
            entries: self.len(),
        }
    }
}

impl<V> std::fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &self.ttl)
            .field("enabled", &self.enabled)
            .field("max_entries", &self.max_entries)
            .field("entries", &self.entries.lock().len())
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}
