//! Diesel repository implementing the core backfill job store.

use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use super::model::BackfillJobDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::backfill_jobs::dsl as jobs_dsl;
use chainprice_core::backfill::{BackfillJob, JobState, JobStore};
use chainprice_core::Result;
use chainprice_providers::Network;

pub struct JobRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl JobRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl JobStore for JobRepository {
    async fn insert(&self, job: &BackfillJob) -> Result<BackfillJob> {
        let job_cloned = job.clone();
        let db_row = BackfillJobDB::from(&job_cloned);

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::insert_into(jobs_dsl::backfill_jobs)
                    .values(&db_row)
                    .execute(conn)
                    .map_err(StorageError::QueryFailed)?;
                Ok(())
            })
            .await?;

        Ok(job_cloned)
    }

    fn get(&self, id: &str) -> Result<Option<BackfillJob>> {
        let mut conn = get_connection(&self.pool)?;

        let row = jobs_dsl::backfill_jobs
            .filter(jobs_dsl::id.eq(id))
            .first::<BackfillJobDB>(&mut conn)
            .optional()
            .into_core()?;

        row.map(BackfillJobDB::into_domain).transpose()
    }

    fn list(&self, page: u32, limit: u32) -> Result<Vec<BackfillJob>> {
        let mut conn = get_connection(&self.pool)?;

        let page = page.max(1);
        let offset = i64::from(page - 1) * i64::from(limit);

        let rows = jobs_dsl::backfill_jobs
            .order(jobs_dsl::created_at.desc())
            .offset(offset)
            .limit(i64::from(limit))
            .load::<BackfillJobDB>(&mut conn)
            .into_core()?;

        rows.into_iter().map(BackfillJobDB::into_domain).collect()
    }

    fn find_open_for_pair(&self, token: &str, network: Network) -> Result<Option<BackfillJob>> {
        let mut conn = get_connection(&self.pool)?;

        let open_states = [JobState::Waiting.as_str(), JobState::Active.as_str()];

        let row = jobs_dsl::backfill_jobs
            .filter(jobs_dsl::token.eq(token))
            .filter(jobs_dsl::network.eq(network.as_str()))
            .filter(jobs_dsl::state.eq_any(open_states))
            .order(jobs_dsl::created_at.desc())
            .first::<BackfillJobDB>(&mut conn)
            .optional()
            .into_core()?;

        row.map(BackfillJobDB::into_domain).transpose()
    }

    async fn mark_active(&self, id: &str) -> Result<()> {
        let id_owned = id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::update(jobs_dsl::backfill_jobs.filter(jobs_dsl::id.eq(id_owned)))
                    .set(jobs_dsl::state.eq(JobState::Active.as_str()))
                    .execute(conn)
                    .map_err(StorageError::QueryFailed)?;
                Ok(())
            })
            .await
    }

    async fn update_progress(&self, id: &str, progress: i32) -> Result<()> {
        let id_owned = id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::update(jobs_dsl::backfill_jobs.filter(jobs_dsl::id.eq(id_owned)))
                    .set(jobs_dsl::progress.eq(progress))
                    .execute(conn)
                    .map_err(StorageError::QueryFailed)?;
                Ok(())
            })
            .await
    }

    async fn finish(
        &self,
        id: &str,
        state: JobState,
        failure_reason: Option<String>,
        finished_on: i64,
    ) -> Result<()> {
        let id_owned = id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::update(jobs_dsl::backfill_jobs.filter(jobs_dsl::id.eq(id_owned)))
                    .set((
                        jobs_dsl::state.eq(state.as_str()),
                        jobs_dsl::failure_reason.eq(failure_reason),
                        jobs_dsl::finished_on.eq(Some(finished_on)),
                    ))
                    .execute(conn)
                    .map_err(StorageError::QueryFailed)?;
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use tempfile::NamedTempFile;

    const NOW: i64 = 1_700_000_000;

    async fn repository() -> (JobRepository, NamedTempFile) {
        let file = NamedTempFile::new().unwrap();
        let (pool, writer) = db::init(file.path().to_str().unwrap()).unwrap();
        (JobRepository::new(Arc::new(pool), writer), file)
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let (repo, _file) = repository().await;
        let job = BackfillJob::new("0xabc", Network::Ethereum, NOW);

        repo.insert(&job).await.unwrap();

        let loaded = repo.get(&job.id).unwrap().unwrap();
        assert_eq!(loaded.id, job.id);
        assert_eq!(loaded.state, JobState::Waiting);
        assert_eq!(loaded.progress, 0);
        assert_eq!(loaded.network, Network::Ethereum);

        assert!(repo.get("missing").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_state_transitions_persist() {
        let (repo, _file) = repository().await;
        let job = BackfillJob::new("0xabc", Network::Ethereum, NOW);
        repo.insert(&job).await.unwrap();

        repo.mark_active(&job.id).await.unwrap();
        assert_eq!(repo.get(&job.id).unwrap().unwrap().state, JobState::Active);

        repo.update_progress(&job.id, 40).await.unwrap();
        assert_eq!(repo.get(&job.id).unwrap().unwrap().progress, 40);

        repo.finish(
            &job.id,
            JobState::Failed,
            Some("provider quota exhausted (ALCHEMY)".to_string()),
            NOW + 60,
        )
        .await
        .unwrap();

        let finished = repo.get(&job.id).unwrap().unwrap();
        assert_eq!(finished.state, JobState::Failed);
        assert_eq!(finished.finished_on, Some(NOW + 60));
        assert!(finished
            .failure_reason
            .unwrap()
            .contains("quota exhausted"));
    }

    #[tokio::test]
    async fn test_find_open_ignores_terminal_jobs() {
        let (repo, _file) = repository().await;

        let done = BackfillJob::new("0xabc", Network::Ethereum, NOW - 100);
        repo.insert(&done).await.unwrap();
        repo.finish(&done.id, JobState::Completed, None, NOW - 50)
            .await
            .unwrap();

        assert!(repo
            .find_open_for_pair("0xabc", Network::Ethereum)
            .unwrap()
            .is_none());

        let open = BackfillJob::new("0xabc", Network::Ethereum, NOW);
        repo.insert(&open).await.unwrap();

        let found = repo
            .find_open_for_pair("0xabc", Network::Ethereum)
            .unwrap()
            .unwrap();
        assert_eq!(found.id, open.id);

        // Scoped to the pair
        assert!(repo
            .find_open_for_pair("0xabc", Network::Polygon)
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_paginated() {
        let (repo, _file) = repository().await;
        for i in 0..3 {
            let job = BackfillJob::new(format!("0xaa{}", i), Network::Ethereum, NOW + i);
            repo.insert(&job).await.unwrap();
        }

        let first_page = repo.list(1, 2).unwrap();
        assert_eq!(first_page.len(), 2);
        assert_eq!(first_page[0].created_at, NOW + 2);
        assert_eq!(first_page[1].created_at, NOW + 1);

        let second_page = repo.list(2, 2).unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].created_at, NOW);
    }
}
