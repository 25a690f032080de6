//! Owner accounts.

use tracing::info;

use y2a_models::User;
use y2a_store::{Store, UserRepository};

use crate::services::error::{CoordinatorError, CoordinatorResult};
use crate::services::owner_locks::OwnerLocks;

/// Creates owners and checks their passwords.
#[derive(Clone)]
pub struct AccountService {
    users: UserRepository,
    owner_locks: OwnerLocks,
}

impl AccountService {
    pub fn new(store: Store, owner_locks: OwnerLocks) -> Self {
        Self {
            users: UserRepository::new(store),
            owner_locks,
        }
    }

    /// Create an owner with default permissions.
    pub async fn create_user(&self, login: &str, password: &str) -> CoordinatorResult<User> {
        let login = login.trim();
        if login.is_empty() || password.is_empty() {
            return Err(CoordinatorError::InvalidInput(
                "login and password are required".to_string(),
            ));
        }

        let _guard = self.owner_locks.lock(login).await;
        if self.users.find(login)?.is_some() {
            return Err(CoordinatorError::OwnerExists(login.to_string()));
        }

        let user = User::new(login, password);
        self.users.save(&user)?;
        info!(owner = login, "Created owner");
        Ok(user)
    }

    /// Owner record for valid credentials.
    pub fn authenticate(&self, login: &str, password: &str) -> CoordinatorResult<User> {
        match self.users.find(login.trim())? {
            Some(user) if user.verify_password(password) => Ok(user),
            _ => Err(CoordinatorError::InvalidCredentials),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> (tempfile::TempDir, AccountService) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_with(dir.path().join("a.redb"), y2a_store::DEFAULT_COLLECTIONS)
            .unwrap();
        (dir, AccountService::new(store, OwnerLocks::new()))
    }

    #[tokio::test]
    async fn test_create_then_authenticate() {
        let (_dir, accounts) = service();
        accounts.create_user("alice", "pw").await.unwrap();

        assert_eq!(accounts.authenticate("alice", "pw").unwrap().login, "alice");
        assert!(matches!(
            accounts.authenticate("alice", "nope"),
            Err(CoordinatorError::InvalidCredentials)
        ));
        assert!(matches!(
            accounts.authenticate("nobody", "pw"),
            Err(CoordinatorError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_and_empty_logins_rejected() {
        let (_dir, accounts) = service();
        accounts.create_user("alice", "pw").await.unwrap();

        assert!(matches!(
            accounts.create_user("alice", "other").await,
            Err(CoordinatorError::OwnerExists(_))
        ));
        assert!(matches!(
            accounts.create_user("  ", "pw").await,
            Err(CoordinatorError::InvalidInput(_))
        ));
    }
}
