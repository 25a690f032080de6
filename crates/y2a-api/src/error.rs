//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::services::CoordinatorError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Coordinator(e) => match e {
                CoordinatorError::UnknownOwner(_)
                | CoordinatorError::UnknownJob(_)
                | CoordinatorError::UnknownItem(_) => StatusCode::NOT_FOUND,
                CoordinatorError::InvalidInput(_)
                | CoordinatorError::InvalidLink(_)
                | CoordinatorError::InvalidJobId(_) => StatusCode::BAD_REQUEST,
                CoordinatorError::OwnerExists(_) => StatusCode::CONFLICT,
                CoordinatorError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                CoordinatorError::NotRegistered(_) => StatusCode::FORBIDDEN,
                CoordinatorError::NotRemoved { .. } => StatusCode::BAD_GATEWAY,
                CoordinatorError::Store(_)
                | CoordinatorError::Fleet(_)
                | CoordinatorError::Client(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn is_internal(&self) -> bool {
        match self {
            ApiError::Internal(_) => true,
            ApiError::Coordinator(e) => e.is_internal(),
            _ => false,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let detail = if self.is_internal()
            && std::env::var("ENVIRONMENT").unwrap_or_default() == "production"
        {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}
