//! API middleware.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{HeaderValue, Request, Response};
use axum::middleware::Next;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

/// Header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Maximum number of owners to track in the rate limiter cache.
const MAX_RATE_LIMITER_ENTRIES: usize = 10_000;

/// Id of the current request, as sent by the caller or generated here.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

type OwnerLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Per-owner hourly request limiter.
///
/// Each owner gets a limiter built from the `reqPerHour` of their token. A
/// different limit in a newer token replaces the owner's limiter.
#[derive(Clone, Default)]
pub struct OwnerRateLimiter {
    limiters: Arc<RwLock<HashMap<String, (u32, Arc<OwnerLimiter>)>>>,
}

impl OwnerRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    async fn get_limiter(&self, login: &str, per_hour: u32) -> Arc<OwnerLimiter> {
        {
            let limiters = self.limiters.read().await;
            if let Some((limit, limiter)) = limiters.get(login) {
                if *limit == per_hour {
                    return Arc::clone(limiter);
                }
            }
        }

        let mut limiters = self.limiters.write().await;
        if let Some((limit, limiter)) = limiters.get(login) {
            if *limit == per_hour {
                return Arc::clone(limiter);
            }
        }

        if limiters.len() >= MAX_RATE_LIMITER_ENTRIES {
            warn!("Rate limiter cache full, resetting {} entries", limiters.len());
            limiters.clear();
        }

        let quota = Quota::per_hour(NonZeroU32::new(per_hour).unwrap_or(NonZeroU32::MIN));
        let limiter = Arc::new(RateLimiter::direct(quota));
        limiters.insert(login.to_string(), (per_hour, Arc::clone(&limiter)));
        limiter
    }

    /// Take one request from `login`'s budget. `false` means over the limit.
    pub async fn check(&self, login: &str, per_hour: u32) -> bool {
        self.get_limiter(login, per_hour).await.check().is_ok()
    }
}

/// Create CORS layer.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    use axum::http::{header, Method};

    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_origin(Any)
            .max_age(std::time::Duration::from_secs(600))
    } else {
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
            .allow_credentials(true)
            .allow_origin(origins)
            .max_age(std::time::Duration::from_secs(600))
    }
}

/// Request ID middleware.
pub async fn request_id(mut request: Request<Body>, next: Next) -> Response<Body> {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(header_value) = request_id.parse() {
        response.headers_mut().insert(REQUEST_ID_HEADER, header_value);
    }

    response
}

/// Request logging middleware.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    let start = Instant::now();

    let response = next.run(request).await;

    // Skip health check logging
    if uri.path() != "/health" && uri.path() != "/ready" {
        info!(
            method = %method,
            uri = %uri,
            status = %response.status(),
            duration_ms = %start.elapsed().as_millis(),
            request_id = %request_id,
            "Request completed"
        );
    }

    response
}
