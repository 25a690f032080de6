//! Coordinator error types.

use thiserror::Error;

use y2a_client::ClientError;
use y2a_fleet::FleetError;
use y2a_store::StoreError;

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Unknown owner: {0}")]
    UnknownOwner(String),

    #[error("Owner already exists: {0}")]
    OwnerExists(String),

    #[error("Invalid login or password")]
    InvalidCredentials,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid link: {0}")]
    InvalidLink(String),

    #[error("Invalid job id: {0}")]
    InvalidJobId(String),

    #[error("Unknown job: {0}")]
    UnknownJob(String),

    #[error("History item {0} does not belong to the owner")]
    UnknownItem(String),

    #[error("History item {item} not removed: {reason}")]
    NotRemoved { item: String, reason: String },

    #[error("Address {0} is not a registered converter")]
    NotRegistered(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Fleet error: {0}")]
    Fleet(#[from] FleetError),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),
}

impl CoordinatorError {
    pub fn not_removed(item: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::NotRemoved {
            item: item.into(),
            reason: reason.to_string(),
        }
    }

    /// Errors caused by something outside the caller's request.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            CoordinatorError::Store(_) | CoordinatorError::Fleet(_) | CoordinatorError::Client(_)
        )
    }
}
