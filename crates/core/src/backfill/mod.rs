//! Backfill module.
//!
//! Populates a token's complete daily price history from its on-chain
//! creation date to the present, as a background job:
//!
//! - [`model`] - The job model with its explicit tagged state
//! - [`store`] - Storage trait for persisted jobs
//! - [`queue`] - In-process transport (enqueue / consume / cancel)
//! - [`worker`] - The per-job state machine
//!
//! Job state is owned by this module's model; the queue is strictly a
//! transport. A job runs to a single terminal state and is never resumed
//! automatically.

pub mod model;
pub mod queue;
pub mod store;
pub mod worker;


pub use model::{BackfillJob, JobState};
pub use queue::{BackfillQueue, CancelFlag};
pub use store::JobStore;
pub use worker::{BackfillOutcome, BackfillWorker};
