//! Price point storage trait.
//!
//! Abstracts the persistence layer so the resolver and backfill worker
//! can be tested against in-memory fakes. The SQLite implementation
//! lives in the `storage-sqlite` crate.

use async_trait::async_trait;

use super::model::PricePoint;
use crate::errors::Result;
use chainprice_providers::Network;

/// Storage interface for persisted daily price points.
///
/// # Design Notes
///
/// - Async methods are used for mutations, which go through the single
///   writer; reads are sync pool queries
/// - `upsert` is idempotent on `(token, network, date)`: persisting the
///   same day twice overwrites the price, never duplicates the row
/// - The nearest-point queries compare against the raw query timestamp,
///   strictly, so a point on the query's own bucket is never its own
///   bracket
#[async_trait]
pub trait PricePointStore: Send + Sync {
    /// Inserts or overwrites the price for the point's day.
    async fn upsert(&self, point: &PricePoint) -> Result<PricePoint>;

    /// The point whose date equals `date` exactly, if any.
    fn find_exact(&self, token: &str, network: Network, date: i64) -> Result<Option<PricePoint>>;

    /// The latest point strictly before `timestamp`.
    fn nearest_before(
        &self,
        token: &str,
        network: Network,
        timestamp: i64,
    ) -> Result<Option<PricePoint>>;

    /// The earliest point strictly after `timestamp`.
    fn nearest_after(
        &self,
        token: &str,
        network: Network,
        timestamp: i64,
    ) -> Result<Option<PricePoint>>;

    /// All points for the pair, ascending by date.
    fn history(&self, token: &str, network: Network) -> Result<Vec<PricePoint>>;
}
