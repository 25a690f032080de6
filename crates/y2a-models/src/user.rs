//! Owner accounts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::job::JobId;
use crate::utils::hash_hex;

/// Per-owner limits carried into issued tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub requests_per_hour: u32,
    /// Lifetime of converted artifacts, in seconds
    pub ttl_secs: u64,
}

impl Permissions {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            requests_per_hour: 5,
            ttl_secs: 10 * 60,
        }
    }
}

/// Owner record in the `users` collection, keyed by login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    pub password_hash: String,
    #[serde(default)]
    pub permissions: Permissions,
    /// Job ids in submission order
    #[serde(default)]
    pub history_ids: Vec<String>,
}

impl User {
    /// Create an owner with default permissions and no history.
    pub fn new(login: impl Into<String>, password: &str) -> Self {
        Self {
            login: login.into(),
            password_hash: hash_hex(password),
            permissions: Permissions::default(),
            history_ids: Vec::new(),
        }
    }

    pub fn verify_password(&self, password: &str) -> bool {
        self.password_hash == hash_hex(password)
    }

    pub fn owns(&self, item_id: &str) -> bool {
        self.history_ids.iter().any(|id| id == item_id)
    }

    /// Append a job id. Ids already present are not duplicated.
    pub fn push_history(&mut self, id: &JobId) {
        if !self.owns(id.as_str()) {
            self.history_ids.push(id.to_string());
        }
    }

    /// Remove a single history id. Returns whether it was present.
    pub fn remove_history(&mut self, item_id: &str) -> bool {
        match self.history_ids.iter().position(|id| id == item_id) {
            Some(pos) => {
                self.history_ids.remove(pos);
                true
            }
            None => false,
        }
    }
}
