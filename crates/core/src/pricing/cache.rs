//! TTL-bound price cache.
//!
//! The cache is purely an optimization layer keyed by the exact query
//! `(token, network, timestamp)` - it carries no durability guarantee.
//! The backfill worker invalidates entries by exact key when it rewrites
//! the corresponding day's price.

use std::fmt;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use chainprice_providers::Network;

/// Cache key for one resolved query.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CacheKey {
    pub token: String,
    pub network: Network,
    pub timestamp: i64,
}

impl CacheKey {
    pub fn new(token: impl Into<String>, network: Network, timestamp: i64) -> Self {
        let token: String = token.into();
        Self {
            token: token.to_ascii_lowercase(),
            network,
            timestamp,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "price:{}:{}:{}", self.token, self.network, self.timestamp)
    }
}

/// Cache interface for resolved prices.
///
/// Implementations must tolerate concurrent readers and writers; a racy
/// double-set is benign since both writers hold the same freshly
/// resolved value.
pub trait PriceCache: Send + Sync {
    /// Returns the cached price, or `None` on a miss or an expired entry.
    fn get(&self, key: &CacheKey) -> Option<f64>;

    /// Stores a price under the key for at most `ttl`.
    fn set(&self, key: CacheKey, price: f64, ttl: Duration);

    /// Drops the entry for the exact key, if present.
    fn invalidate(&self, key: &CacheKey);
}

#[derive(Clone, Copy)]
struct CacheSlot {
    price: f64,
    expires_at: Instant,
}

/// In-process cache on a concurrent map.
///
/// Expiry is checked lazily on read; an expired entry is removed the
/// first time it is seen.
#[derive(Default)]
pub struct MemoryPriceCache {
    entries: DashMap<CacheKey, CacheSlot>,
}

impl MemoryPriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

impl PriceCache for MemoryPriceCache {
    fn get(&self, key: &CacheKey) -> Option<f64> {
        let expired = match self.entries.get(key) {
            Some(slot) if slot.expires_at > Instant::now() => return Some(slot.price),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    fn set(&self, key: CacheKey, price: f64, ttl: Duration) {
        self.entries.insert(
            key,
            CacheSlot {
                price,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    fn invalidate(&self, key: &CacheKey) {
        self.entries.remove(key);
    }
}
