//! Chainprice Core - Domain entities, services, and traits.
//!
//! This crate contains the business logic for resolving historical token
//! prices: the tiered price resolver, the interpolation and time
//! bucketing primitives, and the backfill worker with its job model.
//! It is database-agnostic and defines storage traits that are
//! implemented by the `storage-sqlite` crate.

pub mod backfill;
pub mod constants;
pub mod errors;
pub mod pricing;

// Re-export error types
pub use errors::Error;
pub use errors::Result;

// Re-export the network type shared with the providers crate
pub use chainprice_providers::Network;
