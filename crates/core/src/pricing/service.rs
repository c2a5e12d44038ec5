//! The tiered price resolver.
//!
//! Answers one [`PriceQuery`] while spending as little as possible:
//! cache first, then an exact persisted match, then interpolation
//! between bracketing points, and only then the external provider
//! chain. Whatever a lower tier learns is written back upward (store,
//! then cache) so the next identical query stops earlier.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use super::buckets::start_of_utc_day;
use super::cache::{CacheKey, PriceCache};
use super::fetch::DayPriceFetcher;
use super::interpolate::{confidence, interpolate};
use super::model::{PricePoint, PriceQuery, PriceResult, PriceSource};
use super::store::PricePointStore;
use crate::constants::{MAX_INTERPOLATION_GAP_DAYS, PRICE_CACHE_TTL};
use crate::errors::{Error, Result, ValidationError};
use chainprice_providers::Network;

#[async_trait]
pub trait PriceResolverTrait: Send + Sync {
    /// Resolve one point-in-time price query. `now` is injected for the
    /// provider chain's recency-window decision.
    async fn resolve(&self, query: &PriceQuery, now: i64) -> Result<PriceResult>;

    /// All persisted points for the pair, ascending by date.
    fn history(&self, token: &str, network: Network) -> Result<Vec<PricePoint>>;
}

/// Stateless resolver over injected collaborators. Safe under unlimited
/// concurrent invocation: a benign race (two queries both missing the
/// cache and both fetching) only produces redundant work, since
/// persistence is an idempotent upsert.
pub struct PriceResolver {
    cache: Arc<dyn PriceCache>,
    store: Arc<dyn PricePointStore>,
    fetcher: Arc<dyn DayPriceFetcher>,
    cache_ttl: Duration,
}

impl PriceResolver {
    pub fn new(
        cache: Arc<dyn PriceCache>,
        store: Arc<dyn PricePointStore>,
        fetcher: Arc<dyn DayPriceFetcher>,
    ) -> Self {
        Self {
            cache,
            store,
            fetcher,
            cache_ttl: PRICE_CACHE_TTL,
        }
    }

    /// Override the cache TTL (used by tests).
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    fn cache_and_answer(&self, key: CacheKey, price: f64, source: PriceSource) -> PriceResult {
        self.cache.set(key, price, self.cache_ttl);
        PriceResult { price, source }
    }
}

#[async_trait]
impl PriceResolverTrait for PriceResolver {
    async fn resolve(&self, query: &PriceQuery, now: i64) -> Result<PriceResult> {
        let token = query.token.trim().to_ascii_lowercase();
        if token.is_empty() {
            return Err(ValidationError::MissingField("token".to_string()).into());
        }

        let key = CacheKey::new(token.clone(), query.network, query.timestamp);

        // 1. Cache
        if let Some(price) = self.cache.get(&key) {
            return Ok(PriceResult {
                price,
                source: PriceSource::Cache,
            });
        }

        // 2. Exact persisted match on the day bucket
        let bucket = start_of_utc_day(query.timestamp);
        if let Some(point) = self.store.find_exact(&token, query.network, bucket)? {
            return Ok(self.cache_and_answer(key, point.price, PriceSource::Exact));
        }

        // 3. Interpolation between bracketing points
        let before = self
            .store
            .nearest_before(&token, query.network, query.timestamp)?;
        let after = self
            .store
            .nearest_after(&token, query.network, query.timestamp)?;
        if let (Some(before), Some(after)) = (before, after) {
            let price = interpolate(
                query.timestamp,
                before.date,
                before.price,
                after.date,
                after.price,
            );
            debug!(
                "Interpolated {} on {} at {} (confidence {:.2})",
                token,
                query.network,
                query.timestamp,
                confidence(
                    query.timestamp,
                    before.date,
                    after.date,
                    MAX_INTERPOLATION_GAP_DAYS
                )
            );
            return Ok(self.cache_and_answer(key, price, PriceSource::Interpolated));
        }

        // 4. External fetch for the day bucket; quota errors propagate
        match self
            .fetcher
            .fetch_day_price(&token, query.network, bucket, now)
            .await?
        {
            Some(price) => {
                let point = PricePoint::new(token, query.network, bucket, price);
                self.store.upsert(&point).await?;
                Ok(self.cache_and_answer(key, price, PriceSource::External))
            }
            None => Err(Error::PriceNotFound {
                token,
                network: query.network,
                timestamp: query.timestamp,
            }),
        }
    }

    fn history(&self, token: &str, network: Network) -> Result<Vec<PricePoint>> {
        self.store.history(&token.trim().to_ascii_lowercase(), network)
    }
}
