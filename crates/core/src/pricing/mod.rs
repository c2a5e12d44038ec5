//! Price resolution module.
//!
//! This module provides the core types and logic for answering
//! point-in-time price queries:
//!
//! - [`model`] - Domain models for price points, queries, and results
//! - [`buckets`] - UTC calendar-day bucketing
//! - [`interpolate`] - Pure interpolation and confidence scoring
//! - [`cache`] - TTL-bound price cache trait and in-memory implementation
//! - [`store`] - Storage trait for persisted price points
//! - [`fetch`] - Seam to the providers crate (external fetch chain)
//! - [`service`] - The tiered price resolver
//!
//! # Architecture
//!
//! ```text
//! PriceResolver → PriceCache (TTL)
//!       ↓
//! PricePointStore (DB) → interpolate (bracketing points)
//!       ↓
//! DayPriceFetcher → providers crate (Alchemy, CoinGecko)
//! ```
//!
//! Each tier is cheaper than the next; the resolver walks them in order
//! and stops at the first answer.

pub mod buckets;
pub mod cache;
pub mod fetch;
pub mod interpolate;
pub mod model;
pub mod service;
pub mod store;

#[cfg(test)]
mod service_tests;

// Re-export commonly used types for convenience
pub use cache::{CacheKey, MemoryPriceCache, PriceCache};
pub use fetch::{CreationTimeSource, DayPriceFetcher};
pub use model::{price_point_id, PricePoint, PriceQuery, PriceResult, PriceSource};
pub use service::{PriceResolver, PriceResolverTrait};
pub use store::PricePointStore;
