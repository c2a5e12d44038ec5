//! CoinGecko price provider implementation.
//!
//! Secondary source for tokens Alchemy cannot price. CoinGecko keys its
//! API on coin identifiers rather than contract addresses, so coverage is
//! limited to a fixed address-to-identifier mapping; unmapped tokens are
//! reported as unsupported without spending a request.
//!
//! API documentation: https://docs.coingecko.com/reference/introduction

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use crate::errors::ProviderError;
use crate::models::Network;
use crate::provider::DayPriceProvider;

const BASE_URL: &str = "https://api.coingecko.com/api/v3";
const PROVIDER_ID: &str = "COINGECKO";

/// Maps well-known token contract addresses to CoinGecko coin ids.
fn coin_id(token: &str) -> Option<&'static str> {
    match token.to_ascii_lowercase().as_str() {
        "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48" => Some("usd-coin"),
        "0x1f9840a85d5af5bf1d1762f925bdaddc4201f984" => Some("uniswap"),
        "0xdac17f958d2ee523a2206206994597c13d831ec7" => Some("tether"),
        "0x2260fac5e5542a773aa44fbcfedf7c193bc2c599" => Some("wrapped-bitcoin"),
        // WETH on Polygon and Ethereum
        "0x7ceb23fd6bc0add59e62ac25578270cff1b9f619" => Some("weth"),
        "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2" => Some("weth"),
        _ => None,
    }
}

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from `/coins/{id}/history`
#[derive(Debug, Deserialize)]
struct HistoryResponse {
    market_data: Option<HistoryMarketData>,
}

#[derive(Debug, Deserialize)]
struct HistoryMarketData {
    current_price: Option<HashMap<String, f64>>,
}

/// Response from `/simple/price` is a map of coin id to currency prices.
type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

// ============================================================================
// CoinGeckoProvider
// ============================================================================

/// CoinGecko price provider.
///
/// Free-tier API, no key required. Rate limits are coarse; HTTP 429 is
/// treated as quota exhaustion like any other provider.
pub struct CoinGeckoProvider {
    client: Client,
}

impl CoinGeckoProvider {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    /// Make a GET request and return the raw body.
    async fn fetch(&self, path: &str, params: &[(&str, &str)]) -> Result<String, ProviderError> {
        let url = format!("{}{}", BASE_URL, path);

        debug!("CoinGecko request: {}", path);

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout {
                        provider: PROVIDER_ID.to_string(),
                    }
                } else {
                    ProviderError::Provider {
                        provider: PROVIDER_ID.to_string(),
                        message: format!("Request failed: {}", e),
                    }
                }
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::QuotaExhausted {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Provider {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {} - {}", status, body),
            });
        }

        response
            .text()
            .await
            .map_err(|e| ProviderError::Provider {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to read response: {}", e),
            })
    }
}

impl Default for CoinGeckoProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a unix timestamp as the `DD-MM-YYYY` string the history
/// endpoint expects.
fn history_date(timestamp: i64) -> Result<String, ProviderError> {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%d-%m-%Y").to_string())
        .ok_or_else(|| ProviderError::Malformed {
            provider: PROVIDER_ID.to_string(),
            message: format!("Timestamp out of range: {}", timestamp),
        })
}

#[async_trait]
impl DayPriceProvider for CoinGeckoProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn supports(&self, token: &str) -> bool {
        coin_id(token).is_some()
    }

    async fn historical_day_price(
        &self,
        token: &str,
        _network: Network,
        day: i64,
    ) -> Result<Option<f64>, ProviderError> {
        let Some(id) = coin_id(token) else {
            return Ok(None);
        };

        let date = history_date(day)?;
        let path = format!("/coins/{}/history", id);
        let text = self
            .fetch(&path, &[("date", date.as_str()), ("localization", "false")])
            .await?;

        let parsed: HistoryResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::Malformed {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse history response: {}", e),
            })?;

        let usd = parsed
            .market_data
            .and_then(|m| m.current_price)
            .and_then(|prices| prices.get("usd").copied());

        if usd.is_none() {
            debug!("CoinGecko has no USD history for {} on {}", id, date);
        }

        Ok(usd)
    }

    async fn current_price(
        &self,
        token: &str,
        _network: Network,
    ) -> Result<Option<f64>, ProviderError> {
        let Some(id) = coin_id(token) else {
            return Ok(None);
        };

        let text = self
            .fetch("/simple/price", &[("ids", id), ("vs_currencies", "usd")])
            .await?;

        let parsed: SimplePriceResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::Malformed {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse simple price response: {}", e),
            })?;

        Ok(parsed.get(id).and_then(|prices| prices.get("usd")).copied())
    }
}
