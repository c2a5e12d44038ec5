//! Backfill job endpoints: schedule, cancel, status, listing.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::prices::parse_network;
use crate::error::{ApiError, ApiResult};
use crate::main_lib::AppState;
use chainprice_core::backfill::{BackfillJob, JobState};
use chainprice_core::Network;

#[derive(Deserialize)]
pub struct ScheduleRequest {
    token: String,
    network: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    status: &'static str,
    job_id: String,
}

pub async fn schedule_backfill(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScheduleRequest>,
) -> ApiResult<Json<ScheduleResponse>> {
    let token = req.token.trim().to_ascii_lowercase();
    if token.is_empty() {
        return Err(ApiError::Validation("token is required".to_string()));
    }
    let network = parse_network(&req.network)?;

    // One open job per pair: scheduling while one is waiting or active
    // returns the existing job instead of duplicating the work
    if let Some(existing) = state.job_store.find_open_for_pair(&token, network)? {
        tracing::info!(
            "Backfill for {} on {} already open as job {}",
            token,
            network,
            existing.id
        );
        return Ok(Json(ScheduleResponse {
            status: "scheduled",
            job_id: existing.id,
        }));
    }

    let job = BackfillJob::new(token, network, Utc::now().timestamp());
    state.job_store.insert(&job).await?;
    state
        .queue
        .enqueue(&job.id)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    tracing::info!("Scheduled backfill job {} for {}", job.id, job.token);
    Ok(Json(ScheduleResponse {
        status: "scheduled",
        job_id: job.id,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopResponse {
    status: &'static str,
    job_id: String,
    action: &'static str,
    previous_state: JobState,
}

pub async fn stop_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<StopResponse>> {
    let job = state
        .job_store
        .get(&job_id)?
        .ok_or_else(|| ApiError::NotFound(format!("Job {} not found", job_id)))?;

    let action = match job.state {
        JobState::Waiting => {
            // Not yet picked up: flag it and finalize directly; the
            // consumer skips any job that is no longer waiting
            state.queue.request_cancel(&job_id);
            state
                .job_store
                .finish(&job_id, JobState::Cancelled, None, Utc::now().timestamp())
                .await?;
            "cancelled"
        }
        JobState::Active => {
            // Cooperative: the worker observes the flag between batches
            state.queue.request_cancel(&job_id);
            "cancelling"
        }
        terminal => {
            return Err(ApiError::Validation(format!(
                "Cannot stop job in {} state",
                terminal
            )));
        }
    };

    tracing::info!("Stop requested for job {} ({})", job_id, action);
    Ok(Json(StopResponse {
        status: "stopped",
        job_id,
        action,
        previous_state: job.state,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobData {
    token: String,
    network: Network,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    job_id: String,
    state: JobState,
    progress: i32,
    data: JobData,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure_reason: Option<String>,
    created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    finished_on: Option<i64>,
}

impl From<BackfillJob> for JobStatusResponse {
    fn from(job: BackfillJob) -> Self {
        Self {
            job_id: job.id,
            state: job.state,
            progress: job.progress,
            data: JobData {
                token: job.token,
                network: job.network,
            },
            failure_reason: job.failure_reason,
            created_at: job.created_at,
            finished_on: job.finished_on,
        }
    }
}

pub async fn job_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatusResponse>> {
    let job = state
        .job_store
        .get(&job_id)?
        .ok_or_else(|| ApiError::NotFound(format!("Job {} not found", job_id)))?;
    Ok(Json(job.into()))
}

#[derive(Deserialize)]
pub struct ListParams {
    page: Option<u32>,
    limit: Option<u32>,
}

#[derive(Serialize)]
pub struct ListResponse {
    jobs: Vec<JobStatusResponse>,
    page: u32,
    limit: u32,
}

pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ListResponse>> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).clamp(1, 100);

    let jobs = state
        .job_store
        .list(page, limit)?
        .into_iter()
        .map(JobStatusResponse::from)
        .collect();

    Ok(Json(ListResponse { jobs, page, limit }))
}
