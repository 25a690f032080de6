//! History items: the durable outcome of a job, owned by one user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::job::{Job, JobStatus};

/// A persisted job outcome, keyed by the job id in the `history` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub title: String,
    pub link: String,
    pub status: JobStatus,
}

impl HistoryItem {
    /// Mirror the current state of a job.
    pub fn from_job(job: &Job) -> Self {
        Self {
            time: Utc::now(),
            title: job.title.clone(),
            link: job.link.clone(),
            status: job.status,
        }
    }
}
