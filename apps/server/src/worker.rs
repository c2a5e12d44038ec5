//! Background backfill consumer.
//!
//! Drains the job queue one job at a time: jobs inside a batch fetch
//! concurrently, but jobs themselves run strictly sequentially, which
//! keeps total upstream pressure bounded.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use chainprice_core::backfill::{BackfillWorker, JobState};

use crate::main_lib::AppState;

/// Starts the consumer task for the backfill queue.
pub fn spawn_backfill_consumer(
    state: Arc<AppState>,
    worker: BackfillWorker,
    mut rx: mpsc::UnboundedReceiver<String>,
) {
    tokio::spawn(async move {
        info!("Backfill consumer started");

        while let Some(job_id) = rx.recv().await {
            let job = match state.job_store.get(&job_id) {
                Ok(Some(job)) => job,
                Ok(None) => {
                    warn!("Dequeued unknown job {}", job_id);
                    continue;
                }
                Err(e) => {
                    error!("Failed to load job {}: {}", job_id, e);
                    continue;
                }
            };

            // A job cancelled while still waiting is already terminal
            if job.state != JobState::Waiting {
                debug!("Skipping job {} in state {}", job_id, job.state);
                state.queue.release(&job_id);
                continue;
            }

            let cancel = state.queue.flag(&job_id).unwrap_or_default();
            let outcome = worker.run_job(&job, cancel, Utc::now().timestamp()).await;
            state.queue.release(&job_id);

            info!(
                "Backfill job {} for {} on {} ended as {}: {}/{} buckets stored",
                job_id, job.token, job.network, outcome.state, outcome.stored, outcome.processed
            );
        }

        info!("Backfill consumer shutting down");
    });
}
