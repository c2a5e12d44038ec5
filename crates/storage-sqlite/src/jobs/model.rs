//! Database model for backfill jobs.

use std::str::FromStr;

use diesel::prelude::*;

use chainprice_core::backfill::{BackfillJob, JobState};
use chainprice_core::errors::{DatabaseError, Error, Result};
use chainprice_providers::Network;

/// Database row for one backfill job.
#[derive(
    Queryable, Identifiable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq,
)]
#[diesel(table_name = crate::schema::backfill_jobs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BackfillJobDB {
    pub id: String,
    pub token: String,
    pub network: String,
    pub state: String,
    pub progress: i32,
    pub failure_reason: Option<String>,
    pub created_at: i64,
    pub finished_on: Option<i64>,
}

impl From<&BackfillJob> for BackfillJobDB {
    fn from(job: &BackfillJob) -> Self {
        Self {
            id: job.id.clone(),
            token: job.token.clone(),
            network: job.network.as_str().to_string(),
            state: job.state.as_str().to_string(),
            progress: job.progress,
            failure_reason: job.failure_reason.clone(),
            created_at: job.created_at,
            finished_on: job.finished_on,
        }
    }
}

impl BackfillJobDB {
    pub fn into_domain(self) -> Result<BackfillJob> {
        let network = Network::from_str(&self.network)
            .map_err(|e| Error::Database(DatabaseError::Internal(e)))?;
        let state = JobState::from_str(&self.state)
            .map_err(|e| Error::Database(DatabaseError::Internal(e)))?;
        Ok(BackfillJob {
            id: self.id,
            token: self.token,
            network,
            state,
            progress: self.progress,
            failure_reason: self.failure_reason,
            created_at: self.created_at,
            finished_on: self.finished_on,
        })
    }
}
