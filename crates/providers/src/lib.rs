//! Chainprice Providers Crate
//!
//! This crate resolves USD prices for on-chain tokens from external
//! market data APIs.
//!
//! # Overview
//!
//! Two upstream sources are supported:
//! - Alchemy (primary): historical and current token prices, plus the
//!   JSON-RPC endpoints used to discover a token's on-chain creation time
//! - CoinGecko (secondary): historical-by-date and current prices for a
//!   small set of well-known token addresses
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |  PriceFetchChain |  (ordered fallback, quota propagation)
//! +------------------+
//!        |       |
//!        v       v
//! +---------+ +-----------+
//! | Alchemy | | CoinGecko |  (DayPriceProvider implementations)
//! +---------+ +-----------+
//! ```
//!
//! The chain tries providers in a fixed priority order and normalizes
//! every response shape into a single `f64`. A provider signalling quota
//! exhaustion aborts the whole chain with [`ProviderError::QuotaExhausted`];
//! any other failure falls through to the next attempt. Exhausting every
//! attempt without a price is a normal outcome (`Ok(None)`), not an error.

pub mod chain;
pub mod errors;
pub mod models;
pub mod provider;

pub use chain::{PriceFetchChain, RECENT_PRICE_WINDOW_SECS};
pub use errors::{FetchClass, ProviderError};
pub use models::Network;
pub use provider::alchemy::AlchemyProvider;
pub use provider::coingecko::CoinGeckoProvider;
pub use provider::DayPriceProvider;
