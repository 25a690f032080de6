//! API configuration.

use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Public (owner-facing) port
    pub port: u16,
    /// Private (converter-facing) port
    pub private_port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Request timeout
    pub request_timeout: Duration,
    /// Requests processed concurrently per router
    pub max_in_flight: usize,
    /// Max request body size
    pub max_body_size: usize,
    /// HS256 secret for owner tokens
    pub jwt_secret: String,
    /// HS256 secret for converter tokens
    pub worker_jwt_secret: String,
    /// Lifetime of issued tokens
    pub token_ttl: Duration,
    /// Environment (development/production)
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            private_port: 8001,
            cors_origins: vec!["*".to_string()],
            request_timeout: Duration::from_secs(30),
            max_in_flight: 10,
            max_body_size: 64 * 1024,
            jwt_secret: "secret".to_string(),
            worker_jwt_secret: "private_secret".to_string(),
            token_ttl: Duration::from_secs(30 * 60),
            environment: "development".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            private_port: std::env::var("PRIVATE_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.private_port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            request_timeout: Duration::from_secs(
                std::env::var("REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_in_flight: std::env::var("MAX_IN_FLIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_in_flight),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            jwt_secret: std::env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            worker_jwt_secret: std::env::var("WORKER_JWT_SECRET")
                .unwrap_or(defaults.worker_jwt_secret),
            token_ttl: Duration::from_secs(
                std::env::var("TOKEN_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30 * 60),
            ),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}
