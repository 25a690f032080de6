//! Owner account handlers.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiResult;
use crate::state::AppState;

/// Login or account creation request.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub login: String,
    #[serde(alias = "password")]
    pub pass: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Create an owner account.
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> ApiResult<Json<StatusResponse>> {
    state
        .accounts
        .create_user(&request.login, &request.pass)
        .await?;
    Ok(Json(StatusResponse::ok()))
}

/// Exchange credentials for an owner token.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let user = state.accounts.authenticate(&request.login, &request.pass)?;
    let token = state.tokens.issue_owner(&user)?;

    info!(owner = %user.login, "Issued owner token");
    Ok(Json(TokenResponse { token }))
}
