//! Diesel repository implementing the core price point store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use super::model::PricePointDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::price_points::dsl as pp_dsl;
use chainprice_core::pricing::{PricePoint, PricePointStore};
use chainprice_core::Result;
use chainprice_providers::Network;

pub struct PriceRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl PriceRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl PricePointStore for PriceRepository {
    async fn upsert(&self, point: &PricePoint) -> Result<PricePoint> {
        let point_cloned = point.clone();
        let db_row = PricePointDB::from_domain(&point_cloned, Utc::now().timestamp());

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                // Replace keyed on the deterministic id; the unique
                // (token, network, date) index backstops it
                diesel::replace_into(pp_dsl::price_points)
                    .values(&db_row)
                    .execute(conn)
                    .map_err(StorageError::QueryFailed)?;
                Ok(())
            })
            .await?;

        Ok(point_cloned)
    }

    fn find_exact(&self, token: &str, network: Network, date: i64) -> Result<Option<PricePoint>> {
        let mut conn = get_connection(&self.pool)?;

        let row = pp_dsl::price_points
            .filter(pp_dsl::token.eq(token))
            .filter(pp_dsl::network.eq(network.as_str()))
            .filter(pp_dsl::date.eq(date))
            .first::<PricePointDB>(&mut conn)
            .optional()
            .into_core()?;

        row.map(PricePointDB::into_domain).transpose()
    }

    fn nearest_before(
        &self,
        token: &str,
        network: Network,
        timestamp: i64,
    ) -> Result<Option<PricePoint>> {
        let mut conn = get_connection(&self.pool)?;

        let row = pp_dsl::price_points
            .filter(pp_dsl::token.eq(token))
            .filter(pp_dsl::network.eq(network.as_str()))
            .filter(pp_dsl::date.lt(timestamp))
            .order(pp_dsl::date.desc())
            .first::<PricePointDB>(&mut conn)
            .optional()
            .into_core()?;

        row.map(PricePointDB::into_domain).transpose()
    }

    fn nearest_after(
        &self,
        token: &str,
        network: Network,
        timestamp: i64,
    ) -> Result<Option<PricePoint>> {
        let mut conn = get_connection(&self.pool)?;

        let row = pp_dsl::price_points
            .filter(pp_dsl::token.eq(token))
            .filter(pp_dsl::network.eq(network.as_str()))
            .filter(pp_dsl::date.gt(timestamp))
            .order(pp_dsl::date.asc())
            .first::<PricePointDB>(&mut conn)
            .optional()
            .into_core()?;

        row.map(PricePointDB::into_domain).transpose()
    }

    fn history(&self, token: &str, network: Network) -> Result<Vec<PricePoint>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = pp_dsl::price_points
            .filter(pp_dsl::token.eq(token))
            .filter(pp_dsl::network.eq(network.as_str()))
            .order(pp_dsl::date.asc())
            .load::<PricePointDB>(&mut conn)
            .into_core()?;

        rows.into_iter().map(PricePointDB::into_domain).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use tempfile::NamedTempFile;

    const DAY: i64 = 86_400;

    async fn repository() -> (PriceRepository, NamedTempFile) {
        let file = NamedTempFile::new().unwrap();
        let (pool, writer) = db::init(file.path().to_str().unwrap()).unwrap();
        (PriceRepository::new(Arc::new(pool), writer), file)
    }

    fn point(date: i64, price: f64) -> PricePoint {
        PricePoint::new("0xabc", Network::Ethereum, date, price)
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_per_day() {
        let (repo, _file) = repository().await;

        repo.upsert(&point(DAY, 10.0)).await.unwrap();
        repo.upsert(&point(DAY, 20.0)).await.unwrap();

        // Exactly one stored record, reflecting the latest price
        let history = repo.history("0xabc", Network::Ethereum).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].price, 20.0);
        assert_eq!(history[0].date, DAY);
    }

    #[tokio::test]
    async fn test_find_exact() {
        let (repo, _file) = repository().await;
        repo.upsert(&point(DAY, 10.0)).await.unwrap();

        let hit = repo.find_exact("0xabc", Network::Ethereum, DAY).unwrap();
        assert_eq!(hit.map(|p| p.price), Some(10.0));

        let miss = repo.find_exact("0xabc", Network::Ethereum, 2 * DAY).unwrap();
        assert!(miss.is_none());

        // Same day, other network
        let other = repo.find_exact("0xabc", Network::Polygon, DAY).unwrap();
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn test_nearest_lookups_are_strict() {
        let (repo, _file) = repository().await;
        for (date, price) in [(DAY, 1.0), (3 * DAY, 3.0), (5 * DAY, 5.0)] {
            repo.upsert(&point(date, price)).await.unwrap();
        }

        // Between points
        let before = repo
            .nearest_before("0xabc", Network::Ethereum, 4 * DAY)
            .unwrap();
        assert_eq!(before.map(|p| p.date), Some(3 * DAY));

        let after = repo
            .nearest_after("0xabc", Network::Ethereum, 4 * DAY)
            .unwrap();
        assert_eq!(after.map(|p| p.date), Some(5 * DAY));

        // Strictly before/after: a point on the query timestamp is not
        // its own bracket
        let before = repo
            .nearest_before("0xabc", Network::Ethereum, 3 * DAY)
            .unwrap();
        assert_eq!(before.map(|p| p.date), Some(DAY));

        let after = repo
            .nearest_after("0xabc", Network::Ethereum, 3 * DAY)
            .unwrap();
        assert_eq!(after.map(|p| p.date), Some(5 * DAY));

        // Outside the known range
        let none = repo.nearest_before("0xabc", Network::Ethereum, DAY).unwrap();
        assert!(none.is_none());
        let none = repo
            .nearest_after("0xabc", Network::Ethereum, 5 * DAY)
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_history_is_ascending_and_scoped() {
        let (repo, _file) = repository().await;
        repo.upsert(&point(3 * DAY, 3.0)).await.unwrap();
        repo.upsert(&point(DAY, 1.0)).await.unwrap();
        repo.upsert(&PricePoint::new("0xabc", Network::Polygon, 2 * DAY, 9.0))
            .await
            .unwrap();

        let history = repo.history("0xabc", Network::Ethereum).unwrap();
        assert_eq!(
            history.iter().map(|p| p.date).collect::<Vec<_>>(),
            vec![DAY, 3 * DAY]
        );
    }
}
