//! SQLite storage implementation for chainprice.
//!
//! This crate provides all database-related functionality using Diesel
//! ORM with SQLite. It implements the storage traits defined in
//! `chainprice-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for price points and backfill jobs
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel
//! dependencies exist. The core crate is database-agnostic and works
//! with traits.
//!
//! ```text
//!        core (domain)
//!              │
//!              ▼
//!   storage-sqlite (this crate)
//!              │
//!              ▼
//!          SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;

// Repository implementations
pub mod jobs;
pub mod prices;

// Re-export database utilities
pub use db::{create_pool, get_connection, init, run_migrations, DbPool, WriteHandle};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from chainprice-core for convenience
pub use chainprice_core::errors::{DatabaseError, Error, Result};
