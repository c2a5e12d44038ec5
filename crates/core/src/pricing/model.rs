//! Domain models for price resolution.

use std::fmt;

use serde::{Deserialize, Serialize};

use chainprice_providers::Network;

/// One persisted daily price: the USD price of a token on a network for
/// one UTC calendar day.
///
/// At most one record exists per `(token, network, date)`; a later fetch
/// for the same key overwrites the price rather than adding a row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    /// Deterministic identifier, see [`price_point_id`]
    pub id: String,
    /// Token contract address
    pub token: String,
    /// Network the token lives on
    pub network: Network,
    /// UTC day-start timestamp, seconds since epoch
    pub date: i64,
    /// USD price
    pub price: f64,
}

impl PricePoint {
    pub fn new(token: impl Into<String>, network: Network, date: i64, price: f64) -> Self {
        let token = token.into();
        Self {
            id: price_point_id(&token, network, date),
            token,
            network,
            date,
            price,
        }
    }
}

/// Constructs the deterministic id for a price point.
///
/// Format: `{token}_{network}_{date}`. Upserts keyed on this id can never
/// create a second row for the same day.
pub fn price_point_id(token: &str, network: Network, date: i64) -> String {
    format!("{}_{}_{}", token.to_ascii_lowercase(), network, date)
}

/// A point-in-time price question. The timestamp need not align to a day
/// boundary.
#[derive(Clone, Debug, Deserialize)]
pub struct PriceQuery {
    pub token: String,
    pub network: Network,
    pub timestamp: i64,
}

/// Which tier of the resolver produced a price.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    /// Served from the TTL cache
    Cache,
    /// A persisted point matched the query's day bucket exactly
    Exact,
    /// Derived from two bracketing persisted points, no new fetch
    Interpolated,
    /// Freshly fetched from an upstream provider during this query
    External,
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PriceSource::Cache => "cache",
            PriceSource::Exact => "exact",
            PriceSource::Interpolated => "interpolated",
            PriceSource::External => "external",
        };
        f.write_str(s)
    }
}

/// The answer to a [`PriceQuery`].
#[derive(Clone, Debug, Serialize)]
pub struct PriceResult {
    pub price: f64,
    pub source: PriceSource,
}
