//! The backfill worker state machine.
//!
//! Runs one job from `active` to a terminal state: discovers the token's
//! creation time on-chain, enumerates its day buckets, and fetches them
//! newest-to-oldest in fixed-size concurrent batches. Batches are
//! separated by a delay to respect upstream rate limits; cancellation is
//! polled before each batch and at one-second granularity inside the
//! delay. Quota exhaustion aborts the job with a distinguishing reason
//! so operators can tell "rate limited" apart from "unexpected bug".
//!
//! Upserts are idempotent, so a re-scheduled job only re-writes the
//! buckets a previous attempt already persisted.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::{debug, error, info, warn};
use tokio::time::sleep;

use super::model::{BackfillJob, JobState};
use super::queue::CancelFlag;
use super::store::JobStore;
use crate::constants::{BACKFILL_BATCH_DELAY, BACKFILL_BATCH_SIZE, CANCEL_POLL_INTERVAL};
use crate::errors::{Error, Result};
use crate::pricing::buckets::daily_buckets;
use crate::pricing::cache::{CacheKey, PriceCache};
use crate::pricing::fetch::{CreationTimeSource, DayPriceFetcher};
use crate::pricing::model::PricePoint;
use crate::pricing::store::PricePointStore;

/// What one job run amounted to.
#[derive(Debug)]
pub struct BackfillOutcome {
    pub state: JobState,
    /// Buckets the worker looked at
    pub processed: usize,
    /// Buckets that yielded a price and were persisted
    pub stored: usize,
}

#[derive(Default)]
struct Tally {
    total: usize,
    processed: usize,
    stored: usize,
}

/// Drives backfill jobs against injected collaborators.
pub struct BackfillWorker {
    prices: Arc<dyn PricePointStore>,
    cache: Arc<dyn PriceCache>,
    fetcher: Arc<dyn DayPriceFetcher>,
    creation_source: Arc<dyn CreationTimeSource>,
    jobs: Arc<dyn JobStore>,
    batch_size: usize,
    batch_delay: Duration,
}

impl BackfillWorker {
    pub fn new(
        prices: Arc<dyn PricePointStore>,
        cache: Arc<dyn PriceCache>,
        fetcher: Arc<dyn DayPriceFetcher>,
        creation_source: Arc<dyn CreationTimeSource>,
        jobs: Arc<dyn JobStore>,
    ) -> Self {
        Self {
            prices,
            cache,
            fetcher,
            creation_source,
            jobs,
            batch_size: BACKFILL_BATCH_SIZE,
            batch_delay: BACKFILL_BATCH_DELAY,
        }
    }

    /// Override batch size and inter-batch delay (used by tests).
    pub fn with_pacing(mut self, batch_size: usize, batch_delay: Duration) -> Self {
        self.batch_size = batch_size.max(1);
        self.batch_delay = batch_delay;
        self
    }

    /// Runs one job to a terminal state.
    ///
    /// Never returns an error: every failure path is resolved into a
    /// persisted terminal state. `now` is injected so bucket math and
    /// `finished_on` stamps are deterministic under test.
    pub async fn run_job(&self, job: &BackfillJob, cancel: CancelFlag, now: i64) -> BackfillOutcome {
        info!(
            "Starting backfill job {} for {} on {}",
            job.id, job.token, job.network
        );

        if let Err(e) = self.jobs.mark_active(&job.id).await {
            warn!("Failed to mark job {} active: {}", job.id, e);
        }

        let mut tally = Tally::default();
        let state = match self.process(job, &cancel, now, &mut tally).await {
            Ok(state) => {
                self.finish(job, state, None, now).await;
                state
            }
            Err(e) => {
                let reason = match &e {
                    Error::QuotaExceeded { provider } => {
                        format!("provider quota exhausted ({})", provider)
                    }
                    other => other.to_string(),
                };
                error!("Backfill job {} failed: {}", job.id, e);
                self.finish(job, JobState::Failed, Some(reason), now).await;
                JobState::Failed
            }
        };

        info!(
            "Backfill job {} finished as {}: {} of {} buckets stored",
            job.id, state, tally.stored, tally.total
        );

        BackfillOutcome {
            state,
            processed: tally.processed,
            stored: tally.stored,
        }
    }

    async fn process(
        &self,
        job: &BackfillJob,
        cancel: &CancelFlag,
        now: i64,
        tally: &mut Tally,
    ) -> Result<JobState> {
        let creation = self
            .creation_source
            .token_creation_time(&job.token, job.network)
            .await?;
        info!(
            "Token {} on {} first seen at {}",
            job.token, job.network, creation
        );

        // Newest first: recent data is the most likely to be queried soon
        let mut buckets = daily_buckets(creation, now, now);
        buckets.reverse();

        let total = buckets.len();
        tally.total = total;
        info!("Backfill job {} spans {} day bucket(s)", job.id, total);

        let mut batches = buckets.chunks(self.batch_size).peekable();
        while let Some(batch) = batches.next() {
            if cancel.is_cancelled() {
                info!("Backfill job {} cancelled before next batch", job.id);
                return Ok(JobState::Cancelled);
            }

            let fetches = batch
                .iter()
                .map(|&day| self.fetcher.fetch_day_price(&job.token, job.network, day, now));
            let results = join_all(fetches).await;

            let mut batch_stored = 0usize;
            for (&day, result) in batch.iter().zip(results) {
                tally.processed += 1;
                match result {
                    Ok(Some(price)) => {
                        let point = PricePoint::new(job.token.clone(), job.network, day, price);
                        self.prices.upsert(&point).await?;
                        // The cache only ever held exact-timestamp keys
                        // for this bucket, so an exact invalidation is
                        // sufficient
                        self.cache
                            .invalidate(&CacheKey::new(job.token.clone(), job.network, day));
                        batch_stored += 1;
                        tally.stored += 1;
                    }
                    Ok(None) => {
                        debug!("No price for {} bucket {}", job.token, day);
                    }
                    Err(e) => return Err(e),
                }
            }

            let progress = (tally.processed * 100 / total) as i32;
            self.jobs.update_progress(&job.id, progress).await?;
            debug!(
                "Backfill job {}: batch stored {}/{}, progress {}%",
                job.id,
                batch_stored,
                batch.len(),
                progress
            );

            if batches.peek().is_some() && self.pause_between_batches(cancel).await {
                info!("Backfill job {} cancelled during inter-batch delay", job.id);
                return Ok(JobState::Cancelled);
            }
        }

        Ok(JobState::Completed)
    }

    /// Sleeps out the inter-batch delay in cancellation-poll steps.
    /// Returns `true` when a cancellation was observed.
    async fn pause_between_batches(&self, cancel: &CancelFlag) -> bool {
        let mut remaining = self.batch_delay;
        while !remaining.is_zero() {
            if cancel.is_cancelled() {
                return true;
            }
            let step = remaining.min(CANCEL_POLL_INTERVAL);
            sleep(step).await;
            remaining = remaining.saturating_sub(step);
        }
        cancel.is_cancelled()
    }

    async fn finish(
        &self,
        job: &BackfillJob,
        state: JobState,
        failure_reason: Option<String>,
        finished_on: i64,
    ) {
        if let Err(e) = self
            .jobs
            .finish(&job.id, state, failure_reason, finished_on)
            .await
        {
            warn!(
                "Failed to persist terminal state {} for job {}: {}",
                state, job.id, e
            );
        }
    }
}
