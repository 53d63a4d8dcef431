//! Conflict result cache.
//!
//! Conflict detection is O(n²) in the number of rules. Re-analysing an
//! unchanged rule set returns the cached list, so ids, order and confidences
//! are identical to the first run. `detected_at` is re-stamped on every hit.

use crate::core::Conflict;
use crate::rule::RuleSet;

use chrono::Utc;
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// A cache of conflict lists keyed by rule-set fingerprint.
pub struct ConflictCache {
    entries: Mutex<LruCache<String, CachedConflicts>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

struct CachedConflicts {
    conflicts: Vec<Conflict>,
    expires_at: Instant,
}

impl ConflictCache {
    /// Create a new conflict cache.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Fingerprint a rule set as seen by a given similarity backend.
    pub fn fingerprint(rules: &RuleSet, backend: &str) -> String {
        let json = serde_json::to_string(rules.rules()).unwrap_or_default();
        let mut hasher = blake3::Hasher::new();
        hasher.update(backend.as_bytes());
        hasher.update(&[0]);
        hasher.update(json.as_bytes());
        hasher.finalize().to_hex().to_string()
    }

    /// Get cached conflicts for a fingerprint.
    pub fn get(&self, key: &str) -> Option<Vec<Conflict>> {
        let mut entries = self.entries.lock();

        if let Some(cached) = entries.get(key) {
            if cached.expires_at > Instant::now() {
                self.hits.fetch_add(1, Ordering::Relaxed);
                let now = Utc::now();
                let conflicts = cached
                    .conflicts
                    .iter()
                    .cloned()
                    .map(|mut conflict| {
                        conflict.detected_at = now;
                        conflict
                    })
                    .collect();
                return Some(conflicts);
            }
            entries.pop(key);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Cache conflicts under a fingerprint.
    pub fn put(&self, key: String, conflicts: &[Conflict]) {
        let cached = CachedConflicts {
            conflicts: conflicts.to_vec(),
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.lock().put(key, cached);
    }

    /// Clear all cached entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            hits,
            misses,
            size: self.entries.lock().len(),
            hit_rate,
        }
    }
}

impl std::fmt::Debug for ConflictCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConflictCache")
            .field("ttl", &self.ttl)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Current cache size
    pub size: usize,
    /// Hit rate percentage
    pub hit_rate: f64,
}
