//! Backfill job storage trait.

use async_trait::async_trait;

use super::model::{BackfillJob, JobState};
use crate::errors::Result;
use chainprice_providers::Network;

/// Storage interface for backfill jobs.
///
/// The worker owns all state transitions; the HTTP layer only reads and
/// requests cancellation. Mutations go through the single writer, reads
/// are sync pool queries.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persists a freshly created `waiting` job.
    async fn insert(&self, job: &BackfillJob) -> Result<BackfillJob>;

    /// The job with the given id, if any.
    fn get(&self, id: &str) -> Result<Option<BackfillJob>>;

    /// Jobs ordered newest first, paginated. `page` is 1-based.
    fn list(&self, page: u32, limit: u32) -> Result<Vec<BackfillJob>>;

    /// The most recent non-terminal (waiting or active) job for the
    /// pair, if any. Used to avoid enqueueing duplicate work.
    fn find_open_for_pair(&self, token: &str, network: Network) -> Result<Option<BackfillJob>>;

    /// Transitions a job to `active`.
    async fn mark_active(&self, id: &str) -> Result<()>;

    /// Updates the job's progress percentage.
    async fn update_progress(&self, id: &str, progress: i32) -> Result<()>;

    /// Transitions a job to a terminal state.
    async fn finish(
        &self,
        id: &str,
        state: JobState,
        failure_reason: Option<String>,
        finished_on: i64,
    ) -> Result<()>;
}
