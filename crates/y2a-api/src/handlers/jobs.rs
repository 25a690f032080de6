//! Owner-facing job handlers: submit, status, history, delete.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use y2a_models::{JobId, JobStatus};

use crate::auth::AuthOwner;
use crate::error::{ApiError, ApiResult};
use crate::handlers::users::StatusResponse;
use crate::middleware::RequestId;
use crate::services::HistoryEntry;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitQuery {
    pub link: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    #[serde(rename = "jobID")]
    pub job_id: JobId,
    pub status: JobStatus,
}

/// Job status response.
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    #[serde(rename = "jobID")]
    pub job_id: JobId,
    pub status: JobStatus,
    pub title: String,
    pub link: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub items: Vec<HistoryEntry>,
}

/// Accept a link for conversion.
///
/// Answers `202` once the job is recorded; the outcome is read later through
/// the status endpoint.
pub async fn submit_link(
    State(state): State<AppState>,
    owner: AuthOwner,
    request_id: Option<Extension<RequestId>>,
    Query(query): Query<SubmitQuery>,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    if !state
        .rate_limiter
        .check(owner.login(), owner.0.req_per_hour)
        .await
    {
        warn!(owner = owner.login(), "Rate limit exceeded");
        return Err(ApiError::RateLimited);
    }

    // Job ids come from a server-side nonce, never from the request id
    let nonce = Uuid::new_v4().to_string();

    let accepted = state
        .coordinator
        .submit(owner.login(), &query.link, &nonce)
        .await?;

    info!(
        owner = owner.login(),
        job_id = %accepted.job_id,
        request_id = %request_id.map(|Extension(id)| id.0).unwrap_or_default(),
        "Link submitted"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            job_id: accepted.job_id,
            status: JobStatus::Pending,
        }),
    ))
}

/// Current status of a job.
pub async fn job_status(
    State(state): State<AppState>,
    _owner: AuthOwner,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatusResponse>> {
    let job = state.coordinator.status(&job_id)?;

    Ok(Json(JobStatusResponse {
        job_id: job.id,
        status: job.status,
        title: job.title,
        link: job.link,
        created_at: job.created_at,
    }))
}

/// The caller's history.
pub async fn list_history(
    State(state): State<AppState>,
    owner: AuthOwner,
) -> ApiResult<Json<HistoryResponse>> {
    let items = state.coordinator.history(owner.login())?;
    Ok(Json(HistoryResponse { items }))
}

/// Delete one of the caller's history items, remotely and locally.
pub async fn delete_history_item(
    State(state): State<AppState>,
    owner: AuthOwner,
    Path(item_id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    state
        .coordinator
        .delete_history_item(owner.login(), &item_id)
        .await?;

    info!(owner = owner.login(), item = %item_id, "History item deleted");
    Ok(Json(StatusResponse::ok()))
}
