//! Job coordinator and Axum HTTP API server.
//!
//! This crate provides:
//! - The job coordinator (submit, dispatch, status, history, delete)
//! - Owner accounts with JWT login and per-owner rate limits
//! - The public router for owners and the private router for converters

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::{create_private_router, create_public_router};
pub use services::{
    AccountService, Accepted, CoordinatorError, CoordinatorResult, HistoryEntry, JobCoordinator,
    OwnerLocks,
};
pub use state::AppState;
