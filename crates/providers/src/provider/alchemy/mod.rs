//! Alchemy price provider implementation.
//!
//! This module provides token prices from the Alchemy Prices API:
//! - Historical prices via the `tokens/historical` endpoint
//! - Current prices via the `tokens/by-address` endpoint
//!
//! It also wraps the per-network Alchemy JSON-RPC endpoints used to
//! discover a token's creation time from its earliest ERC-20 transfer.
//!
//! API documentation: https://docs.alchemy.com/reference/prices-api-quickstart

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat};
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::errors::ProviderError;
use crate::models::Network;
use crate::provider::DayPriceProvider;

const PRICES_BASE_URL: &str = "https://api.g.alchemy.com/prices/v1";
const PROVIDER_ID: &str = "ALCHEMY";

/// Window requested around the target day start. The first sample within
/// the hour is taken as the day's price.
const HISTORICAL_WINDOW_SECS: i64 = 3_600;

/// Sampling interval requested from the historical endpoint.
const HISTORICAL_INTERVAL: &str = "5m";

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from the `tokens/historical` endpoint
#[derive(Debug, Deserialize)]
struct HistoricalResponse {
    /// Price samples within the requested window, oldest first
    #[serde(default)]
    data: Vec<HistoricalSample>,
}

/// Individual historical price sample
#[derive(Debug, Deserialize)]
struct HistoricalSample {
    /// USD price as a decimal string
    value: Option<String>,
}

/// Response from the `tokens/by-address` endpoint
#[derive(Debug, Deserialize)]
struct CurrentPriceResponse {
    #[serde(default)]
    data: Vec<TokenPriceEntry>,
}

/// Per-token entry in a current price response
#[derive(Debug, Deserialize)]
struct TokenPriceEntry {
    /// Set when the token could not be priced
    error: Option<TokenPriceError>,
    /// Prices in one or more quote currencies
    #[serde(default)]
    prices: Vec<CurrencyPrice>,
}

#[derive(Debug, Deserialize)]
struct TokenPriceError {
    message: Option<String>,
}

/// One quote currency's price
#[derive(Debug, Deserialize)]
struct CurrencyPrice {
    currency: String,
    value: String,
}

/// Envelope for JSON-RPC responses from the core endpoints
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
}

/// Result of `alchemy_getAssetTransfers`
#[derive(Debug, Deserialize)]
struct TransfersResult {
    #[serde(default)]
    transfers: Vec<Transfer>,
}

#[derive(Debug, Deserialize)]
struct Transfer {
    #[serde(rename = "blockNum")]
    block_num: Option<String>,
}

/// Result of `eth_getBlockByNumber`
#[derive(Debug, Deserialize)]
struct BlockResult {
    /// Block timestamp as a hex quantity
    timestamp: Option<String>,
}

// ============================================================================
// AlchemyProvider
// ============================================================================

/// Alchemy price provider.
///
/// Primary source for both historical and current token prices, and the
/// only source for on-chain token creation discovery.
pub struct AlchemyProvider {
    client: Client,
    prices_api_key: String,
    ethereum_rpc_key: String,
    polygon_rpc_key: String,
}

impl AlchemyProvider {
    /// Create a new Alchemy provider.
    ///
    /// `prices_api_key` authenticates the Prices API; the two RPC keys
    /// authenticate the per-network core endpoints used for creation
    /// time discovery.
    pub fn new(prices_api_key: String, ethereum_rpc_key: String, polygon_rpc_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            prices_api_key,
            ethereum_rpc_key,
            polygon_rpc_key,
        }
    }

    fn rpc_url(&self, network: Network) -> String {
        let key = match network {
            Network::Ethereum => &self.ethereum_rpc_key,
            Network::Polygon => &self.polygon_rpc_key,
        };
        format!("https://{}.g.alchemy.com/v2/{}", network.alchemy_slug(), key)
    }

    /// POST a JSON body to a Prices API endpoint and return the raw body.
    async fn post_prices(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/{}/{}", PRICES_BASE_URL, self.prices_api_key, endpoint);

        debug!("Alchemy request: {}", endpoint);

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
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

        let text = response.text().await.map_err(|e| ProviderError::Provider {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to read response: {}", e),
        })?;

        if !status.is_success() {
            // Alchemy reports quota exhaustion in the error body as well
            if text.contains("exceeded its limit") {
                return Err(ProviderError::QuotaExhausted {
                    provider: PROVIDER_ID.to_string(),
                });
            }
            return Err(ProviderError::Provider {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {} - {}", status, text),
            });
        }

        Ok(text)
    }

    /// Issue one JSON-RPC call against the network's core endpoint.
    async fn rpc_call<T: serde::de::DeserializeOwned>(
        &self,
        network: Network,
        method: &str,
        params: serde_json::Value,
    ) -> Result<Option<T>, ProviderError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(self.rpc_url(network))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Provider {
                provider: PROVIDER_ID.to_string(),
                message: format!("RPC request failed: {}", e),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::QuotaExhausted {
                provider: PROVIDER_ID.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ProviderError::Provider {
                provider: PROVIDER_ID.to_string(),
                message: format!("RPC HTTP {}", status),
            });
        }

        let envelope: RpcResponse<T> =
            response.json().await.map_err(|e| ProviderError::Malformed {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse RPC response: {}", e),
            })?;

        Ok(envelope.result)
    }

    /// Discover a token's creation time from its earliest ERC-20 transfer.
    ///
    /// Looks up the first transfer involving the contract, then resolves
    /// that transfer's block to a timestamp. Both lookups must succeed;
    /// a token with no transfer history cannot be backfilled.
    pub async fn token_creation_time(
        &self,
        token: &str,
        network: Network,
    ) -> Result<i64, ProviderError> {
        let params = json!([{
            "contractAddresses": [token],
            "category": ["erc20"],
            "order": "asc",
            "maxCount": "0x1",
        }]);

        let transfers: Option<TransfersResult> = self
            .rpc_call(network, "alchemy_getAssetTransfers", params)
            .await?;

        let block_num = transfers
            .and_then(|t| t.transfers.into_iter().next())
            .and_then(|t| t.block_num)
            .ok_or_else(|| ProviderError::Provider {
                provider: PROVIDER_ID.to_string(),
                message: format!("No transfer history found for token {}", token),
            })?;

        let block: Option<BlockResult> = self
            .rpc_call(network, "eth_getBlockByNumber", json!([block_num.as_str(), false]))
            .await?;

        let timestamp_hex = block
            .and_then(|b| b.timestamp)
            .ok_or_else(|| ProviderError::Provider {
                provider: PROVIDER_ID.to_string(),
                message: format!("No timestamp for block {}", block_num),
            })?;

        parse_hex_quantity(&timestamp_hex).ok_or_else(|| ProviderError::Malformed {
            provider: PROVIDER_ID.to_string(),
            message: format!("Invalid block timestamp: {}", timestamp_hex),
        })
    }
}

/// Parse an Ethereum hex quantity (`0x`-prefixed) into seconds.
fn parse_hex_quantity(value: &str) -> Option<i64> {
    let trimmed = value.trim_start_matches("0x");
    i64::from_str_radix(trimmed, 16).ok()
}

/// Format a unix timestamp as RFC 3339 UTC for the Prices API.
fn to_iso(timestamp: i64) -> Result<String, ProviderError> {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .ok_or_else(|| ProviderError::Malformed {
            provider: PROVIDER_ID.to_string(),
            message: format!("Timestamp out of range: {}", timestamp),
        })
}

#[async_trait]
impl DayPriceProvider for AlchemyProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn historical_day_price(
        &self,
        token: &str,
        network: Network,
        day: i64,
    ) -> Result<Option<f64>, ProviderError> {
        let body = json!({
            "network": network.alchemy_slug(),
            "address": token,
            "startTime": to_iso(day)?,
            "endTime": to_iso(day + HISTORICAL_WINDOW_SECS)?,
            "interval": HISTORICAL_INTERVAL,
        });

        let text = self.post_prices("tokens/historical", body).await?;

        let parsed: HistoricalResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::Malformed {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse historical response: {}", e),
            })?;

        let Some(sample) = parsed.data.into_iter().next() else {
            debug!(
                "Alchemy returned no historical samples for {} on {} at {}",
                token, network, day
            );
            return Ok(None);
        };

        match sample.value.as_deref().map(str::parse::<f64>) {
            Some(Ok(price)) => Ok(Some(price)),
            Some(Err(_)) | None => Err(ProviderError::Malformed {
                provider: PROVIDER_ID.to_string(),
                message: "Historical sample has no numeric value".to_string(),
            }),
        }
    }

    async fn current_price(
        &self,
        token: &str,
        network: Network,
    ) -> Result<Option<f64>, ProviderError> {
        let body = json!({
            "addresses": [{
                "address": token,
                "network": network.alchemy_slug(),
            }],
        });

        let text = self.post_prices("tokens/by-address", body).await?;

        let parsed: CurrentPriceResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::Malformed {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse current price response: {}", e),
            })?;

        let Some(entry) = parsed.data.into_iter().next() else {
            return Ok(None);
        };

        if let Some(err) = entry.error {
            warn!(
                "Alchemy current price error for {}: {}",
                token,
                err.message.unwrap_or_default()
            );
            return Ok(None);
        }

        let usd = entry
            .prices
            .into_iter()
            .find(|p| p.currency.eq_ignore_ascii_case("usd"));

        match usd {
            Some(price) => price
                .value
                .parse::<f64>()
                .map(Some)
                .map_err(|_| ProviderError::Malformed {
                    provider: PROVIDER_ID.to_string(),
                    message: format!("Unparseable USD value: {}", price.value),
                }),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_quantity() {
        assert_eq!(parse_hex_quantity("0x5f5e100"), Some(100_000_000));
        assert_eq!(parse_hex_quantity("0x0"), Some(0));
        assert_eq!(parse_hex_quantity("nonsense"), None);
    }

    #[test]
    fn test_to_iso_formats_utc() {
        assert_eq!(to_iso(0).unwrap(), "1970-01-01T00:00:00Z");
        assert_eq!(to_iso(1_700_000_000).unwrap(), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_historical_response_parses_first_sample() {
        let body = r#"{"data":[{"value":"1.0003"},{"value":"1.0007"}]}"#;
        let parsed: HistoricalResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data.len(), 2);
        assert_eq!(parsed.data[0].value.as_deref(), Some("1.0003"));
    }

    #[test]
    fn test_current_price_response_finds_usd() {
        let body = r#"{"data":[{"error":null,"prices":[{"currency":"USD","value":"42.5","lastUpdatedAt":"2024-01-01T00:00:00Z"}]}]}"#;
        let parsed: CurrentPriceResponse = serde_json::from_str(body).unwrap();
        let entry = &parsed.data[0];
        assert!(entry.error.is_none());
        assert_eq!(entry.prices[0].value, "42.5");
    }
}
