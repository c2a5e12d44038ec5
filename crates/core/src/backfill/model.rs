//! Backfill job model.
//!
//! The job's lifecycle is an explicit tagged state owned here, not
//! inferred from queue internals:
//!
//! ```text
//! waiting → active → completed
//!                  → failed
//!                  → cancelled
//! ```
//!
//! Terminal states are final; a terminal job is never picked up again.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use chainprice_providers::Network;

/// Lifecycle state of a backfill job.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Enqueued, not yet picked up by the worker
    Waiting,
    /// Currently being processed
    Active,
    /// Every bucket was processed without fatal error
    Completed,
    /// Aborted by an unrecoverable error (including quota exhaustion)
    Failed,
    /// A cancellation signal was observed between batches
    Cancelled,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Waiting => "waiting",
            JobState::Active => "active",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        }
    }

    /// Terminal states are final - no transition leaves them.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(JobState::Waiting),
            "active" => Ok(JobState::Active),
            "completed" => Ok(JobState::Completed),
            "failed" => Ok(JobState::Failed),
            "cancelled" => Ok(JobState::Cancelled),
            other => Err(format!("unknown job state: {}", other)),
        }
    }
}

/// One backfill request and its progress.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillJob {
    pub id: String,
    pub token: String,
    pub network: Network,
    pub state: JobState,
    /// Percentage of buckets processed, 0-100. Monotonically
    /// non-decreasing; reaches exactly 100 only on full completion.
    pub progress: i32,
    /// Set when the job failed, distinguishing quota exhaustion from
    /// unexpected errors.
    pub failure_reason: Option<String>,
    /// Unix seconds when the job was created
    pub created_at: i64,
    /// Unix seconds when the job reached a terminal state
    pub finished_on: Option<i64>,
}

impl BackfillJob {
    /// Create a fresh `waiting` job for a token/network pair.
    pub fn new(token: impl Into<String>, network: Network, created_at: i64) -> Self {
        let token: String = token.into();
        Self {
            id: Uuid::new_v4().to_string(),
            token: token.to_ascii_lowercase(),
            network,
            state: JobState::Waiting,
            progress: 0,
            failure_reason: None,
            created_at,
            finished_on: None,
        }
    }
}
