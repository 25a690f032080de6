//! Client error types.

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Dispatch to {node} failed: {message}")]
    RemoteDispatch { node: String, message: String },

    #[error("{node} returned unexpected status {status}")]
    UnexpectedStatus { node: String, status: u16 },

    #[error("Metadata lookup failed: {0}")]
    Metadata(String),

    #[error("Invalid link: {0}")]
    InvalidLink(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    pub fn remote_dispatch(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteDispatch {
            node: node.into(),
            message: message.into(),
        }
    }

    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::Metadata(msg.into())
    }

    /// True when the remote side answered, but not with success.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ClientError::UnexpectedStatus { .. })
    }
}
