//! Seam between the core crate and the providers crate.
//!
//! The resolver and the backfill worker depend on these two narrow
//! traits instead of the concrete fetch chain, so tests can substitute
//! counting fakes. The production implementations simply delegate to the
//! providers crate and translate its error type.

use async_trait::async_trait;

use crate::errors::Result;
use chainprice_providers::{AlchemyProvider, Network, PriceFetchChain};

/// Resolves the USD price for one `(token, network, day)` via the
/// external provider chain.
#[async_trait]
pub trait DayPriceFetcher: Send + Sync {
    /// `Ok(None)` means no provider had data - a normal outcome. Quota
    /// exhaustion surfaces as [`crate::Error::QuotaExceeded`].
    async fn fetch_day_price(
        &self,
        token: &str,
        network: Network,
        day: i64,
        now: i64,
    ) -> Result<Option<f64>>;
}

/// Discovers a token's on-chain creation time.
#[async_trait]
pub trait CreationTimeSource: Send + Sync {
    /// Timestamp of the token's earliest transfer's block. Failure is
    /// fatal for a backfill job.
    async fn token_creation_time(&self, token: &str, network: Network) -> Result<i64>;
}

#[async_trait]
impl DayPriceFetcher for PriceFetchChain {
    async fn fetch_day_price(
        &self,
        token: &str,
        network: Network,
        day: i64,
        now: i64,
    ) -> Result<Option<f64>> {
        PriceFetchChain::fetch_day_price(self, token, network, day, now)
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl CreationTimeSource for AlchemyProvider {
    async fn token_creation_time(&self, token: &str, network: Network) -> Result<i64> {
        AlchemyProvider::token_creation_time(self, token, network)
            .await
            .map_err(Into::into)
    }
}
