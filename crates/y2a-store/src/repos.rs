//! Typed repositories over the store's collections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use y2a_models::{HistoryItem, Job, JobId, JobStatus, User};

use crate::collections::{CONVERTERS, HISTORY, JOBS, USERS};
use crate::error::StoreResult;
use crate::store::Store;

/// Record written when a converter exchanges its address for a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverterRegistration {
    pub address: String,
    pub name: String,
    pub registered_at: DateTime<Utc>,
}

/// Repository for owner accounts.
#[derive(Clone)]
pub struct UserRepository {
    store: Store,
}

impl UserRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn get(&self, login: &str) -> StoreResult<User> {
        self.store.load(USERS, login)
    }

    pub fn find(&self, login: &str) -> StoreResult<Option<User>> {
        self.store.find(USERS, login)
    }

    pub fn save(&self, user: &User) -> StoreResult<()> {
        self.store.save(USERS, &user.login, user)
    }
}

/// Repository for job records.
#[derive(Clone)]
pub struct JobRepository {
    store: Store,
}

impl JobRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn get(&self, id: &JobId) -> StoreResult<Job> {
        self.store.load(JOBS, id.as_str())
    }

    pub fn save(&self, job: &Job) -> StoreResult<()> {
        self.store.save(JOBS, job.id.as_str(), job)
    }

    pub fn delete(&self, id: &JobId) -> StoreResult<()> {
        self.store.delete(JOBS, id.as_str())
    }

    /// Load, overwrite the status (and title when given), save.
    ///
    /// Two separate store calls: a concurrent writer of the same job can
    /// interleave and the last save wins.
    pub fn update_status(
        &self,
        id: &JobId,
        status: JobStatus,
        title: Option<&str>,
    ) -> StoreResult<Job> {
        let mut job = self.get(id)?;
        job.status = status;
        if let Some(title) = title {
            job.title = title.to_string();
        }
        self.save(&job)?;
        Ok(job)
    }
}

/// Repository for history items.
#[derive(Clone)]
pub struct HistoryRepository {
    store: Store,
}

impl HistoryRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn get(&self, id: &str) -> StoreResult<HistoryItem> {
        self.store.load(HISTORY, id)
    }

    pub fn find(&self, id: &str) -> StoreResult<Option<HistoryItem>> {
        self.store.find(HISTORY, id)
    }

    pub fn save(&self, id: &JobId, item: &HistoryItem) -> StoreResult<()> {
        self.store.save(HISTORY, id.as_str(), item)
    }

    pub fn delete(&self, id: &str) -> StoreResult<()> {
        self.store.delete(HISTORY, id)
    }
}

/// Repository for converter registrations.
#[derive(Clone)]
pub struct ConverterRepository {
    store: Store,
}

impl ConverterRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn register(&self, address: &str, name: &str) -> StoreResult<ConverterRegistration> {
        let registration = ConverterRegistration {
            address: address.to_string(),
            name: name.to_string(),
            registered_at: Utc::now(),
        };
        self.store.save(CONVERTERS, address, &registration)?;
        info!("Registered converter {} at {}", name, address);
        Ok(registration)
    }

    pub fn find(&self, address: &str) -> StoreResult<Option<ConverterRegistration>> {
        self.store.find(CONVERTERS, address)
    }
}
