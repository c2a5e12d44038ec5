//! Price provider trait definition.

use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::models::Network;

/// Trait for upstream token price providers.
///
/// Implement this trait to add support for a new price source. The fetch
/// chain uses the provider's answers to drive its fallback order.
///
/// All prices are quoted in USD. `Ok(None)` means the provider genuinely
/// has no data for the request (an expected outcome for illiquid or
/// unlisted tokens); errors are reserved for failed attempts.
#[async_trait]
pub trait DayPriceProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "ALCHEMY" or "COINGECKO".
    /// Used for logging and for attributing quota errors.
    fn id(&self) -> &'static str;

    /// Whether this provider can answer anything at all for the token.
    ///
    /// Providers that rely on a fixed address mapping override this so
    /// the chain can skip them without spending a request. Default is
    /// `true`.
    fn supports(&self, token: &str) -> bool {
        let _ = token;
        true
    }

    /// Fetch the USD price of a token for one UTC day bucket.
    ///
    /// # Arguments
    ///
    /// * `token` - The token contract address
    /// * `network` - The network the token lives on
    /// * `day` - UTC day-start timestamp (seconds since epoch)
    ///
    /// # Returns
    ///
    /// `Ok(Some(price))` on success, `Ok(None)` when the provider has no
    /// data for that day, or a `ProviderError` when the attempt failed.
    async fn historical_day_price(
        &self,
        token: &str,
        network: Network,
        day: i64,
    ) -> Result<Option<f64>, ProviderError>;

    /// Fetch the current USD price of a token.
    ///
    /// Used as a last resort when historical data is unavailable and the
    /// requested day is recent enough for "now" to be an acceptable proxy.
    async fn current_price(
        &self,
        token: &str,
        network: Network,
    ) -> Result<Option<f64>, ProviderError>;
}
