//! Job records: one dispatch attempt for a submitted link.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::hash_hex;

/// Length of a job id (hex-encoded SHA-256).
pub const JOB_ID_LEN: usize = 64;

/// Unique identifier for a job.
///
/// Derived from a per-request nonce, so two submissions of the same link get
/// different ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Derive the id for the request identified by `nonce`.
    pub fn from_nonce(nonce: &str) -> Self {
        Self(hash_hex(nonce))
    }

    /// Wrap an existing id without validation.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Parse an id received from a caller.
    pub fn parse(s: &str) -> Option<Self> {
        let well_formed = s.len() == JOB_ID_LEN && s.chars().all(|c| c.is_ascii_hexdigit());
        well_formed.then(|| Self(s.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<JobId> for String {
    fn from(id: JobId) -> Self {
        id.0
    }
}

/// Job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted, dispatch not finished yet
    #[default]
    Pending,
    /// Dispatched to a worker (or reported done by the worker)
    Performed,
    /// Metadata lookup, node selection or dispatch failed
    Fail,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Performed => "performed",
            JobStatus::Fail => "fail",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "performed" => Ok(JobStatus::Performed),
            "fail" | "failed" => Ok(JobStatus::Fail),
            other => Err(format!("unknown job status: {}", other)),
        }
    }
}

/// A job record as persisted in the `jobs` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub created_at: DateTime<Utc>,
    pub status: JobStatus,
    /// Filled in once metadata has been fetched
    #[serde(default)]
    pub title: String,
    pub link: String,
}

impl Job {
    /// Create a pending job for `link`.
    pub fn pending(id: JobId, link: impl Into<String>) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            status: JobStatus::Pending,
            title: String::new(),
            link: link.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
