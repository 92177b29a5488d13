use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

struct CacheEntry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

/// Two-tier cache: a fast ephemeral tier in front of a slower durable tier.
///
/// Reads check the fast tier first; a durable hit is promoted back into the
/// fast tier with the fast tier's own TTL. Writes land in both tiers
/// synchronously, so a cold fast tier still sees previously cached data.
/// Expiry is evaluated lazily at read time.
pub struct TieredCache<V> {
    fast: DashMap<String, CacheEntry<V>>,
    durable: DashMap<String, CacheEntry<V>>,
    fast_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> TieredCache<V> {
    pub fn new(fast_ttl: Duration) -> Self {
        Self {
            fast: DashMap::new(),
            durable: DashMap::new(),
            fast_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = Utc::now();

        // Entry guards must be dropped before removing, so snapshot first.
        let fast_state = self.fast.get(key).map(|e| (e.expires_at, e.value.clone()));
        match fast_state {
            Some((expires_at, value)) if expires_at > now => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(value);
            }
            Some(_) => {
                self.fast.remove(key);
            }
            None => {}
        }

        let durable_state = self
            .durable
            .get(key)
            .map(|e| (e.expires_at, e.value.clone()));
        match durable_state {
            Some((expires_at, value)) if expires_at > now => {
                tracing::debug!(key, "promoting durable cache entry into fast tier");
                self.fast.insert(
                    key.to_string(),
                    CacheEntry {
                        value: value.clone(),
                        expires_at: now + self.fast_ttl,
                    },
                );
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            Some(_) => {
                self.durable.remove(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Write to both tiers. `ttl` governs the durable entry; the fast entry
    /// always uses the configured fast-tier TTL.
    pub fn set(&self, key: &str, value: V, ttl: Duration) {
        let now = Utc::now();
        self.fast.insert(
            key.to_string(),
            CacheEntry {
                value: value.clone(),
                expires_at: now + self.fast_ttl,
            },
        );
        self.durable.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    /// Remove an entry from both tiers.
    pub fn invalidate(&self, key: &str) {
        self.fast.remove(key);
        self.durable.remove(key);
    }

    pub fn hit_count(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn miss_count(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn hit_ratio(&self) -> f64 {
        let hits = self.hit_count();
        let total = hits + self.miss_count();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}
