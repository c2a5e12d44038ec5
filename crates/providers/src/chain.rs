//! Ordered provider fallback chain.
//!
//! The chain answers one `(token, network, day)` question by walking a
//! fixed priority order:
//!
//! 1. Primary provider, historical endpoint
//! 2. Secondary provider, historical endpoint (skipped when the token is
//!    outside its coverage), then the secondary's current price as a last
//!    resort within that provider
//! 3. Primary provider, current price — only when the requested day is
//!    within a short recency window of "now"
//! 4. `Ok(None)` — an expected outcome for illiquid or unlisted tokens
//!
//! Quota exhaustion aborts the chain immediately and surfaces to the
//! caller; every other provider failure is logged and treated as a miss.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::errors::{FetchClass, ProviderError};
use crate::models::Network;
use crate::provider::DayPriceProvider;

/// Days recent enough for a current price to stand in for a missing
/// historical one, in seconds.
pub const RECENT_PRICE_WINDOW_SECS: i64 = 7 * 86_400;

/// Ordered fallback chain over the configured providers.
pub struct PriceFetchChain {
    primary: Arc<dyn DayPriceProvider>,
    secondary: Arc<dyn DayPriceProvider>,
}

impl PriceFetchChain {
    pub fn new(primary: Arc<dyn DayPriceProvider>, secondary: Arc<dyn DayPriceProvider>) -> Self {
        Self { primary, secondary }
    }

    /// Resolve the USD price of a token for one UTC day bucket.
    ///
    /// `now` is injected by the caller so the recency-window decision is
    /// deterministic under test.
    pub async fn fetch_day_price(
        &self,
        token: &str,
        network: Network,
        day: i64,
        now: i64,
    ) -> Result<Option<f64>, ProviderError> {
        // 1. Primary historical
        if let Some(price) = self
            .attempt(self.primary.historical_day_price(token, network, day).await)?
        {
            info!(
                "Resolved {} on {} at {} from {} (historical)",
                token,
                network,
                day,
                self.primary.id()
            );
            return Ok(Some(price));
        }

        // 2. Secondary historical, then its current price as a last
        //    resort within this provider only
        if self.secondary.supports(token) {
            if let Some(price) = self
                .attempt(self.secondary.historical_day_price(token, network, day).await)?
            {
                info!(
                    "Resolved {} on {} at {} from {} (historical)",
                    token,
                    network,
                    day,
                    self.secondary.id()
                );
                return Ok(Some(price));
            }

            if let Some(price) = self.attempt(self.secondary.current_price(token, network).await)? {
                info!(
                    "Resolved {} on {} from {} (current)",
                    token,
                    network,
                    self.secondary.id()
                );
                return Ok(Some(price));
            }
        } else {
            debug!("{} does not cover token {}", self.secondary.id(), token);
        }

        // 3. Primary current price, acceptable proxy for recent days only
        if now - day <= RECENT_PRICE_WINDOW_SECS {
            if let Some(price) = self.attempt(self.primary.current_price(token, network).await)? {
                info!(
                    "Resolved {} on {} from {} (current, recent-day proxy)",
                    token,
                    network,
                    self.primary.id()
                );
                return Ok(Some(price));
            }
        }

        debug!("No provider could price {} on {} at {}", token, network, day);
        Ok(None)
    }

    /// Collapse one provider attempt into the chain's fall-through rule:
    /// fatal errors propagate, everything else becomes a miss.
    fn attempt(
        &self,
        result: Result<Option<f64>, ProviderError>,
    ) -> Result<Option<f64>, ProviderError> {
        match result {
            Ok(price) => Ok(price),
            Err(e) => match e.class() {
                FetchClass::Fatal => Err(e),
                FetchClass::NextAttempt => {
                    warn!("Provider attempt failed, falling through: {}", e);
                    Ok(None)
                }
            },
        }
    }
}
