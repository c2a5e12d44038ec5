//! Application state construction.
//!
//! Every collaborator is explicitly constructed here and injected - no
//! process-wide singletons. The same cache, store, and fetch chain
//! instances are shared between the resolver and the backfill worker so
//! the worker's invalidations are visible to queries.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use chainprice_core::backfill::{BackfillQueue, BackfillWorker, JobStore};
use chainprice_core::pricing::{
    CreationTimeSource, DayPriceFetcher, MemoryPriceCache, PriceCache, PricePointStore,
    PriceResolver, PriceResolverTrait,
};
use chainprice_providers::{AlchemyProvider, CoinGeckoProvider, PriceFetchChain};
use chainprice_storage_sqlite::db;
use chainprice_storage_sqlite::jobs::JobRepository;
use chainprice_storage_sqlite::prices::PriceRepository;

use crate::config::Config;

/// Shared handles the HTTP layer needs.
pub struct AppState {
    pub resolver: Arc<dyn PriceResolverTrait>,
    pub job_store: Arc<dyn JobStore>,
    pub queue: BackfillQueue,
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Builds the full dependency graph: storage, cache, providers, resolver
/// and worker. Returns the state for the router plus the worker and its
/// queue receiver for the background consumer.
pub fn build_state(
    config: &Config,
) -> anyhow::Result<(Arc<AppState>, BackfillWorker, mpsc::UnboundedReceiver<String>)> {
    let (pool, writer) = db::init(&config.database_url)?;
    let pool = Arc::new(pool);

    let price_store: Arc<dyn PricePointStore> =
        Arc::new(PriceRepository::new(pool.clone(), writer.clone()));
    let job_store: Arc<dyn JobStore> = Arc::new(JobRepository::new(pool, writer));

    let cache: Arc<dyn PriceCache> = Arc::new(MemoryPriceCache::new());

    let alchemy = Arc::new(AlchemyProvider::new(
        config.alchemy_prices_api_key.clone(),
        config.alchemy_api_key_ethereum.clone(),
        config.alchemy_api_key_polygon.clone(),
    ));
    let coingecko = Arc::new(CoinGeckoProvider::new());
    let fetcher: Arc<dyn DayPriceFetcher> =
        Arc::new(PriceFetchChain::new(alchemy.clone(), coingecko));
    let creation_source: Arc<dyn CreationTimeSource> = alchemy;

    let resolver: Arc<dyn PriceResolverTrait> = Arc::new(PriceResolver::new(
        cache.clone(),
        price_store.clone(),
        fetcher.clone(),
    ));

    let (queue, queue_rx) = BackfillQueue::new();
    let worker = BackfillWorker::new(
        price_store,
        cache,
        fetcher,
        creation_source,
        job_store.clone(),
    );

    let state = Arc::new(AppState {
        resolver,
        job_store,
        queue,
    });

    Ok((state, worker, queue_rx))
}
