//! Application state.

use std::sync::Arc;

use y2a_client::{ConverterClient, MetadataSource};
use y2a_fleet::NodeSelector;
use y2a_store::Store;

use crate::auth::TokenIssuer;
use crate::config::ApiConfig;
use crate::middleware::OwnerRateLimiter;
use crate::services::{AccountService, JobCoordinator, OwnerLocks};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Store,
    pub selector: NodeSelector,
    pub coordinator: JobCoordinator,
    pub accounts: AccountService,
    pub tokens: Arc<TokenIssuer>,
    pub rate_limiter: OwnerRateLimiter,
}

impl AppState {
    /// Wire the services over an opened store and a running fleet view.
    pub fn new(
        config: ApiConfig,
        store: Store,
        selector: NodeSelector,
        converter: ConverterClient,
        metadata: Arc<dyn MetadataSource>,
    ) -> Self {
        let owner_locks = OwnerLocks::new();
        let coordinator = JobCoordinator::new(
            store.clone(),
            selector.clone(),
            converter,
            metadata,
            owner_locks.clone(),
        );
        let accounts = AccountService::new(store.clone(), owner_locks);
        let tokens = Arc::new(TokenIssuer::new(
            &config.jwt_secret,
            &config.worker_jwt_secret,
            config.token_ttl,
        ));

        Self {
            config,
            store,
            selector,
            coordinator,
            accounts,
            tokens,
            rate_limiter: OwnerRateLimiter::new(),
        }
    }
}
