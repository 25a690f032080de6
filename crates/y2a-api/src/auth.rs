//! HS256 token issuing and the request extractors built on it.
//!
//! Owners and converters get tokens signed with different secrets, so one
//! kind can never pass for the other.

use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use y2a_models::{Role, User};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Claims of an owner token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerClaims {
    /// Owner login
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(rename = "reqPerHour")]
    pub req_per_hour: u32,
    /// Artifact lifetime in seconds
    pub ttl: u64,
}

/// Claims of a converter token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerClaims {
    /// Converter address as registered in the fleet
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies owner and converter tokens.
pub struct TokenIssuer {
    owner_encoding: EncodingKey,
    owner_decoding: DecodingKey,
    worker_encoding: EncodingKey,
    worker_decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(owner_secret: &str, worker_secret: &str, ttl: Duration) -> Self {
        Self {
            owner_encoding: EncodingKey::from_secret(owner_secret.as_bytes()),
            owner_decoding: DecodingKey::from_secret(owner_secret.as_bytes()),
            worker_encoding: EncodingKey::from_secret(worker_secret.as_bytes()),
            worker_decoding: DecodingKey::from_secret(worker_secret.as_bytes()),
            ttl,
        }
    }

    fn window(&self) -> (i64, i64) {
        let now = Utc::now().timestamp();
        (now, now + self.ttl.as_secs() as i64)
    }

    /// Token for a logged-in owner, carrying their limits.
    pub fn issue_owner(&self, user: &User) -> ApiResult<String> {
        let (iat, exp) = self.window();
        let claims = OwnerClaims {
            sub: user.login.clone(),
            iat,
            exp,
            req_per_hour: user.permissions.requests_per_hour,
            ttl: user.permissions.ttl_secs,
        };
        encode(&Header::default(), &claims, &self.owner_encoding)
            .map_err(|e| ApiError::internal(format!("Failed to sign token: {}", e)))
    }

    pub fn verify_owner(&self, token: &str) -> ApiResult<OwnerClaims> {
        decode::<OwnerClaims>(token, &self.owner_decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| ApiError::unauthorized(format!("Token validation failed: {}", e)))
    }

    /// Token for a converter that proved it is in the fleet.
    pub fn issue_worker(&self, address: &str) -> ApiResult<String> {
        let (iat, exp) = self.window();
        let claims = WorkerClaims {
            sub: address.to_string(),
            iat,
            exp,
        };
        encode(&Header::default(), &claims, &self.worker_encoding)
            .map_err(|e| ApiError::internal(format!("Failed to sign token: {}", e)))
    }

    pub fn verify_worker(&self, token: &str) -> ApiResult<WorkerClaims> {
        decode::<WorkerClaims>(token, &self.worker_decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| ApiError::unauthorized(format!("Token validation failed: {}", e)))
    }
}

fn bearer_token(parts: &Parts) -> ApiResult<&str> {
    let auth_header = parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header format"))
}

/// Authenticated owner extracted from request.
#[derive(Debug, Clone)]
pub struct AuthOwner(pub OwnerClaims);

impl AuthOwner {
    pub fn login(&self) -> &str {
        &self.0.sub
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthOwner {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.tokens.verify_owner(token)?;
        Ok(AuthOwner(claims))
    }
}

/// Authenticated converter extracted from request.
///
/// The token alone is not enough: the address must still be in the current
/// fleet snapshot.
#[derive(Debug, Clone)]
pub struct AuthWorker {
    pub address: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthWorker {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.tokens.verify_worker(token)?;

        if !state.selector.contains(Role::Converter, &claims.sub) {
            debug!(address = %claims.sub, "Converter token for address outside the fleet");
            return Err(ApiError::forbidden("Converter is no longer registered"));
        }

        Ok(AuthWorker {
            address: claims.sub,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("owner-secret", "worker-secret", Duration::from_secs(60))
    }

    #[test]
    fn test_owner_token_roundtrip_carries_limits() {
        let tokens = issuer();
        let user = User::new("alice", "pw");
        let claims = tokens
            .verify_owner(&tokens.issue_owner(&user).unwrap())
            .unwrap();

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.req_per_hour, 5);
        assert_eq!(claims.ttl, 600);
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn test_token_kinds_are_not_interchangeable() {
        let tokens = issuer();
        let worker = tokens.issue_worker("10.0.0.1:9000").unwrap();
        let owner = tokens.issue_owner(&User::new("alice", "pw")).unwrap();

        assert!(tokens.verify_owner(&worker).is_err());
        assert!(tokens.verify_worker(&owner).is_err());
        assert_eq!(tokens.verify_worker(&worker).unwrap().sub, "10.0.0.1:9000");
    }

    #[test]
    fn test_owner_claims_wire_names() {
        let claims = OwnerClaims {
            sub: "a".into(),
            iat: 1,
            exp: 2,
            req_per_hour: 5,
            ttl: 600,
        };
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["reqPerHour"], 5);
    }
}
