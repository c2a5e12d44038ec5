//! Tests for the tiered resolver contract.
//!
//! These verify the lookup order (cache → exact → interpolation →
//! external), the write-back behavior of each tier, and the error
//! contract for quota exhaustion and unresolvable queries.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::errors::{Error, Result};
    use crate::pricing::{
        buckets::start_of_utc_day, CacheKey, DayPriceFetcher, MemoryPriceCache, PriceCache,
        PricePoint, PricePointStore, PriceQuery, PriceResolver, PriceResolverTrait, PriceSource,
    };
    use chainprice_providers::Network;

    const NOW: i64 = 1_700_000_000;

    // =========================================================================
    // Mock PricePointStore
    // =========================================================================

    #[derive(Default)]
    struct MockPriceStore {
        points: Mutex<HashMap<String, PricePoint>>,
    }

    impl MockPriceStore {
        fn with_points(points: Vec<PricePoint>) -> Self {
            let store = Self::default();
            {
                let mut map = store.points.lock().unwrap();
                for point in points {
                    map.insert(point.id.clone(), point);
                }
            }
            store
        }

        fn all(&self) -> Vec<PricePoint> {
            self.points.lock().unwrap().values().cloned().collect()
        }
    }

    #[async_trait]
    impl PricePointStore for MockPriceStore {
        async fn upsert(&self, point: &PricePoint) -> Result<PricePoint> {
            self.points
                .lock()
                .unwrap()
                .insert(point.id.clone(), point.clone());
            Ok(point.clone())
        }

        fn find_exact(
            &self,
            token: &str,
            network: Network,
            date: i64,
        ) -> Result<Option<PricePoint>> {
            Ok(self
                .points
                .lock()
                .unwrap()
                .values()
                .find(|p| p.token == token && p.network == network && p.date == date)
                .cloned())
        }

        fn nearest_before(
            &self,
            token: &str,
            network: Network,
            timestamp: i64,
        ) -> Result<Option<PricePoint>> {
            Ok(self
                .points
                .lock()
                .unwrap()
                .values()
                .filter(|p| p.token == token && p.network == network && p.date < timestamp)
                .max_by_key(|p| p.date)
                .cloned())
        }

        fn nearest_after(
            &self,
            token: &str,
            network: Network,
            timestamp: i64,
        ) -> Result<Option<PricePoint>> {
            Ok(self
                .points
                .lock()
                .unwrap()
                .values()
                .filter(|p| p.token == token && p.network == network && p.date > timestamp)
                .min_by_key(|p| p.date)
                .cloned())
        }

        fn history(&self, token: &str, network: Network) -> Result<Vec<PricePoint>> {
            let mut points: Vec<_> = self
                .points
                .lock()
                .unwrap()
                .values()
                .filter(|p| p.token == token && p.network == network)
                .cloned()
                .collect();
            points.sort_by_key(|p| p.date);
            Ok(points)
        }
    }

    // =========================================================================
    // Mock DayPriceFetcher
    // =========================================================================

    struct MockFetcher {
        answer: Option<f64>,
        quota_exhausted: bool,
        calls: AtomicUsize,
    }

    impl MockFetcher {
        fn returning(answer: Option<f64>) -> Self {
            Self {
                answer,
                quota_exhausted: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn quota() -> Self {
            Self {
                answer: None,
                quota_exhausted: true,
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DayPriceFetcher for MockFetcher {
        async fn fetch_day_price(
            &self,
            _token: &str,
            _network: Network,
            _day: i64,
            _now: i64,
        ) -> Result<Option<f64>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.quota_exhausted {
                return Err(Error::QuotaExceeded {
                    provider: "ALCHEMY".to_string(),
                });
            }
            Ok(self.answer)
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn query(timestamp: i64) -> PriceQuery {
        PriceQuery {
            token: "0xabc".to_string(),
            network: Network::Ethereum,
            timestamp,
        }
    }

    fn resolver(
        store: Arc<MockPriceStore>,
        fetcher: Arc<MockFetcher>,
    ) -> (PriceResolver, Arc<MemoryPriceCache>) {
        let cache = Arc::new(MemoryPriceCache::new());
        let resolver = PriceResolver::new(cache.clone(), store, fetcher);
        (resolver, cache)
    }

    fn day(n: i64) -> i64 {
        n * 86_400
    }

    // =========================================================================
    // Tests
    // =========================================================================

    #[tokio::test]
    async fn test_cache_hit_short_circuits() {
        let store = Arc::new(MockPriceStore::default());
        let fetcher = Arc::new(MockFetcher::returning(Some(99.0)));
        let (resolver, cache) = resolver(store, fetcher.clone());

        cache.set(
            CacheKey::new("0xabc", Network::Ethereum, NOW),
            5.5,
            Duration::from_secs(60),
        );

        let result = resolver.resolve(&query(NOW), NOW).await.unwrap();
        assert_eq!(result.price, 5.5);
        assert_eq!(result.source, PriceSource::Cache);
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_exact_match_populates_cache() {
        let bucket = start_of_utc_day(NOW);
        let store = Arc::new(MockPriceStore::with_points(vec![PricePoint::new(
            "0xabc",
            Network::Ethereum,
            bucket,
            12.0,
        )]));
        let fetcher = Arc::new(MockFetcher::returning(None));
        let (resolver, cache) = resolver(store, fetcher.clone());

        let result = resolver.resolve(&query(NOW), NOW).await.unwrap();
        assert_eq!(result.price, 12.0);
        assert_eq!(result.source, PriceSource::Exact);
        assert_eq!(fetcher.call_count(), 0);

        // Cache now holds the exact-timestamp key
        assert_eq!(
            cache.get(&CacheKey::new("0xabc", Network::Ethereum, NOW)),
            Some(12.0)
        );
    }

    #[tokio::test]
    async fn test_interpolates_between_brackets_without_fetching() {
        let store = Arc::new(MockPriceStore::with_points(vec![
            PricePoint::new("0xabc", Network::Ethereum, day(10), 10.0),
            PricePoint::new("0xabc", Network::Ethereum, day(12), 20.0),
        ]));
        let fetcher = Arc::new(MockFetcher::returning(Some(999.0)));
        let (resolver, _) = resolver(store, fetcher.clone());

        // Query at the midpoint between the two stored days; the day(11)
        // bucket has no stored point, so there is no exact match
        let midpoint = day(11);
        let result = resolver.resolve(&query(midpoint), NOW).await.unwrap();

        assert_eq!(result.price, 15.0);
        assert_eq!(result.source, PriceSource::Interpolated);
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_single_sided_history_falls_through_to_external() {
        // Only a "before" point exists, so no interpolation is possible
        let store = Arc::new(MockPriceStore::with_points(vec![PricePoint::new(
            "0xabc",
            Network::Ethereum,
            day(10),
            10.0,
        )]));
        let fetcher = Arc::new(MockFetcher::returning(Some(42.0)));
        let (resolver, _) = resolver(store.clone(), fetcher.clone());

        let result = resolver.resolve(&query(day(12) + 5), NOW).await.unwrap();
        assert_eq!(result.source, PriceSource::External);
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_external_fetch_persists_and_second_query_hits_cache() {
        let store = Arc::new(MockPriceStore::default());
        let fetcher = Arc::new(MockFetcher::returning(Some(1.23)));
        let (resolver, _) = resolver(store.clone(), fetcher.clone());

        let first = resolver.resolve(&query(NOW), NOW).await.unwrap();
        assert_eq!(first.price, 1.23);
        assert_eq!(first.source, PriceSource::External);
        assert_eq!(fetcher.call_count(), 1);

        // The fetched value was persisted at the day bucket
        let persisted = store.all();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].date, start_of_utc_day(NOW));
        assert_eq!(persisted[0].price, 1.23);

        // Identical query within the TTL: cache answers, no second fetch
        let second = resolver.resolve(&query(NOW), NOW).await.unwrap();
        assert_eq!(second.source, PriceSource::Cache);
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unresolvable_query_is_not_found() {
        let store = Arc::new(MockPriceStore::default());
        let fetcher = Arc::new(MockFetcher::returning(None));
        let (resolver, _) = resolver(store, fetcher);

        let err = resolver.resolve(&query(NOW), NOW).await.unwrap_err();
        assert!(matches!(err, Error::PriceNotFound { .. }));
    }

    #[tokio::test]
    async fn test_quota_exhaustion_propagates() {
        let store = Arc::new(MockPriceStore::default());
        let fetcher = Arc::new(MockFetcher::quota());
        let (resolver, _) = resolver(store.clone(), fetcher);

        let err = resolver.resolve(&query(NOW), NOW).await.unwrap_err();
        assert!(matches!(err, Error::QuotaExceeded { .. }));

        // Nothing was persisted for the failed query
        assert!(store.all().is_empty());
    }

    #[tokio::test]
    async fn test_empty_token_is_rejected_without_side_effects() {
        let store = Arc::new(MockPriceStore::default());
        let fetcher = Arc::new(MockFetcher::returning(Some(1.0)));
        let (resolver, _) = resolver(store, fetcher.clone());

        let bad = PriceQuery {
            token: "   ".to_string(),
            network: Network::Ethereum,
            timestamp: NOW,
        };
        let err = resolver.resolve(&bad, NOW).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_expired_cache_entry_falls_through_to_store() {
        let bucket = start_of_utc_day(NOW);
        let store = Arc::new(MockPriceStore::with_points(vec![PricePoint::new(
            "0xabc",
            Network::Ethereum,
            bucket,
            7.0,
        )]));
        let fetcher = Arc::new(MockFetcher::returning(None));

        let cache = Arc::new(MemoryPriceCache::new());
        let resolver = PriceResolver::new(cache.clone(), store, fetcher)
            .with_cache_ttl(Duration::from_millis(5));

        let first = resolver.resolve(&query(NOW), NOW).await.unwrap();
        assert_eq!(first.source, PriceSource::Exact);

        std::thread::sleep(Duration::from_millis(20));

        // Entry expired: the resolver must not serve it
        let second = resolver.resolve(&query(NOW), NOW).await.unwrap();
        assert_eq!(second.source, PriceSource::Exact);
        assert_eq!(second.price, 7.0);
    }

    #[tokio::test]
    async fn test_history_is_ascending() {
        let store = Arc::new(MockPriceStore::with_points(vec![
            PricePoint::new("0xabc", Network::Ethereum, day(12), 20.0),
            PricePoint::new("0xabc", Network::Ethereum, day(10), 10.0),
        ]));
        let fetcher = Arc::new(MockFetcher::returning(None));
        let (resolver, _) = resolver(store, fetcher);

        let history = resolver.history("0xABC", Network::Ethereum).unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].date < history[1].date);
    }
}
