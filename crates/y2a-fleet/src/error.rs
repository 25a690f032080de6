//! Fleet error types.

use thiserror::Error;

use y2a_models::Role;

pub type FleetResult<T> = Result<T, FleetError>;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("Cannot reach coordination service: {0}")]
    Connect(String),

    #[error("Coordination service returned {0}: {1}")]
    Status(u16, String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No {0} nodes registered")]
    EmptyRole(Role),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FleetError {
    pub fn connect(msg: impl Into<String>) -> Self {
        Self::Connect(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}
