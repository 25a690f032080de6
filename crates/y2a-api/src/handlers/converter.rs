//! Converter-facing handlers on the private router.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use y2a_models::JobStatus;

use crate::auth::AuthWorker;
use crate::error::ApiResult;
use crate::handlers::users::{StatusResponse, TokenResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct JobReport {
    pub job_id: String,
    pub status: JobStatus,
}

/// Exchange a fleet address for a converter token.
pub async fn register_converter(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let registration = state.coordinator.register_converter(request.address.trim())?;
    let token = state.tokens.issue_worker(&registration.address)?;

    info!(
        node = %registration.name,
        address = %registration.address,
        "Issued converter token"
    );
    Ok(Json(TokenResponse { token }))
}

/// A converter reporting the outcome of a job it was handed.
pub async fn report_job_status(
    State(state): State<AppState>,
    worker: AuthWorker,
    Json(report): Json<JobReport>,
) -> ApiResult<Json<StatusResponse>> {
    state
        .coordinator
        .report_status(&report.job_id, report.status)?;

    info!(address = %worker.address, job_id = %report.job_id, "Job status reported");
    Ok(Json(StatusResponse::ok()))
}
