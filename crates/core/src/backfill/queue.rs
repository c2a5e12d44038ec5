//! In-process backfill queue.
//!
//! A thin transport: job ids travel over an unbounded channel to the
//! single consumer, and a shared registry of cancellation flags carries
//! the cancel signal back to running jobs. All real job state lives in
//! the [`JobStore`](super::store::JobStore).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::errors::{Error, Result};

/// Cooperative cancellation signal for one job.
///
/// The worker polls it between batches and during the inter-batch delay;
/// cancellation is never preemptive mid-fetch.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Producer half of the queue plus the cancellation registry.
///
/// Cloneable; every clone shares the same channel and registry.
#[derive(Clone)]
pub struct BackfillQueue {
    tx: mpsc::UnboundedSender<String>,
    flags: Arc<DashMap<String, CancelFlag>>,
}

impl BackfillQueue {
    /// Creates the queue and the consumer's receiving end.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                flags: Arc::new(DashMap::new()),
            },
            rx,
        )
    }

    /// Hands a job id to the consumer and registers its cancel flag.
    pub fn enqueue(&self, job_id: &str) -> Result<()> {
        self.flags
            .insert(job_id.to_string(), CancelFlag::new());
        self.tx
            .send(job_id.to_string())
            .map_err(|_| Error::Unexpected("backfill queue consumer is gone".to_string()))
    }

    /// Raises the cancel flag for a job. Returns `false` when the job is
    /// unknown to the queue (already drained and released, or never
    /// enqueued in this process).
    pub fn request_cancel(&self, job_id: &str) -> bool {
        match self.flags.get(job_id) {
            Some(flag) => {
                flag.cancel();
                true
            }
            None => false,
        }
    }

    /// The cancel flag registered for a job.
    pub fn flag(&self, job_id: &str) -> Option<CancelFlag> {
        self.flags.get(job_id).map(|f| f.clone())
    }

    /// Drops the registry entry once a job is terminal.
    pub fn release(&self, job_id: &str) {
        self.flags.remove(job_id);
    }
}
