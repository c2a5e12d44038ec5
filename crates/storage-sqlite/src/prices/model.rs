//! Database model for price points.

use std::str::FromStr;

use diesel::prelude::*;

use chainprice_core::errors::{DatabaseError, Error, Result};
use chainprice_core::pricing::PricePoint;
use chainprice_providers::Network;

/// Database row for one daily price point.
#[derive(
    Queryable, Identifiable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq,
)]
#[diesel(table_name = crate::schema::price_points)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PricePointDB {
    pub id: String,
    pub token: String,
    pub network: String,
    pub date: i64,
    pub price: f64,
    pub created_at: i64,
}

impl PricePointDB {
    pub fn from_domain(point: &PricePoint, created_at: i64) -> Self {
        Self {
            id: point.id.clone(),
            token: point.token.clone(),
            network: point.network.as_str().to_string(),
            date: point.date,
            price: point.price,
            created_at,
        }
    }

    pub fn into_domain(self) -> Result<PricePoint> {
        let network = Network::from_str(&self.network)
            .map_err(|e| Error::Database(DatabaseError::Internal(e)))?;
        Ok(PricePoint {
            id: self.id,
            token: self.token,
            network,
            date: self.date,
            price: self.price,
        })
    }
}
