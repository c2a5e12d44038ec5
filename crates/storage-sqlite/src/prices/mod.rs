//! Price point persistence.

pub mod model;
pub mod repository;

pub use repository::PriceRepository;
