//! API routes.

use axum::middleware;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::Router;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::handlers::{
    create_user, delete_history_item, health, job_status, list_history, login, ready,
    register_converter, report_job_status, submit_link,
};
use crate::middleware::{cors_layer, request_id, request_logging};
use crate::state::AppState;

/// Create the owner-facing router.
pub fn create_public_router(state: AppState) -> Router {
    let account_routes = Router::new()
        .route("/create", post(create_user))
        .route("/login", post(login));

    let job_routes = Router::new()
        .route("/audio", get(submit_link))
        .route("/status/:job_id", get(job_status))
        .route("/history", get(list_history))
        .route("/history/:item_id", delete(delete_history_item));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    Router::new()
        .nest("/api/v1", account_routes.merge(job_routes))
        .merge(health_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.request_timeout,
        ))
        .layer(GlobalConcurrencyLimitLayer::new(state.config.max_in_flight))
        .layer(cors_layer(&state.config.cors_origins))
        .layer(middleware::from_fn(request_logging))
        .layer(middleware::from_fn(request_id))
        .with_state(state)
}

/// Create the converter-facing router.
pub fn create_private_router(state: AppState) -> Router {
    let converter_routes = Router::new()
        .route("/register", post(register_converter))
        .route("/job", post(report_job_status));

    Router::new()
        .nest("/api/v1/converter", converter_routes)
        .route("/health", get(health))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.request_timeout,
        ))
        .layer(GlobalConcurrencyLimitLayer::new(state.config.max_in_flight))
        .layer(middleware::from_fn(request_logging))
        .layer(middleware::from_fn(request_id))
        .with_state(state)
}
