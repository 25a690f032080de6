//! Job coordinator.
//!
//! Drives the two multi-step flows of the service:
//!
//! - submit: write a pending job and history row, link it to the owner, then
//!   on a background task fetch metadata, pick a converter, dispatch, and
//!   record `performed` or `fail`.
//! - delete: ask a converter to drop the artifact and only then remove the
//!   history row and unlink it from the owner.
//!
//! A job record has two writers: the dispatch task and the converter
//! reporting its own completion. Whichever saves last wins.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use y2a_client::{ConverterClient, DispatchRequest, MetadataSource};
use y2a_fleet::NodeSelector;
use y2a_models::{HistoryItem, Job, JobId, JobStatus, Role, User};
use y2a_store::{
    ConverterRegistration, ConverterRepository, HistoryRepository, JobRepository, Store,
    UserRepository, HISTORY, JOBS,
};

use crate::logging::JobLogger;
use crate::services::error::{CoordinatorError, CoordinatorResult};
use crate::services::owner_locks::OwnerLocks;

/// An accepted submission.
pub struct Accepted {
    pub job_id: JobId,
    /// Background dispatch task; resolves to the status it recorded
    pub task: JoinHandle<JobStatus>,
}

/// One entry of an owner's history listing.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub id: String,
    /// `None` when the id no longer resolves to a history row
    #[serde(flatten)]
    pub item: Option<HistoryItem>,
    pub expired: bool,
}

/// Coordinates job records, owner history and converter calls.
#[derive(Clone)]
pub struct JobCoordinator {
    users: UserRepository,
    jobs: JobRepository,
    history: HistoryRepository,
    converters: ConverterRepository,
    selector: NodeSelector,
    converter: ConverterClient,
    metadata: Arc<dyn MetadataSource>,
    owner_locks: OwnerLocks,
}

impl JobCoordinator {
    pub fn new(
        store: Store,
        selector: NodeSelector,
        converter: ConverterClient,
        metadata: Arc<dyn MetadataSource>,
        owner_locks: OwnerLocks,
    ) -> Self {
        Self {
            users: UserRepository::new(store.clone()),
            jobs: JobRepository::new(store.clone()),
            history: HistoryRepository::new(store.clone()),
            converters: ConverterRepository::new(store),
            selector,
            converter,
            metadata,
            owner_locks,
        }
    }

    pub fn selector(&self) -> &NodeSelector {
        &self.selector
    }

    /// Accept `link` for `login`.
    ///
    /// Returns as soon as the pending job is stored and linked to the owner.
    /// Metadata lookup and dispatch run on a spawned task; their failures
    /// only show up as the job's `fail` status.
    pub async fn submit(&self, login: &str, link: &str, nonce: &str) -> CoordinatorResult<Accepted> {
        let link = validate_link(link)?;
        if self.users.find(login)?.is_none() {
            return Err(CoordinatorError::UnknownOwner(login.to_string()));
        }

        let job_id = JobId::from_nonce(nonce);
        let job = Job::pending(job_id.clone(), link.clone());

        {
            let _guard = self.owner_locks.lock(login).await;
            let mut user = self.load_owner(login)?;
            if let Err(e) = self.store_linked(&job, &mut user) {
                self.discard_job(&job.id);
                return Err(e);
            }
        }

        info!(job_id = %job_id, owner = login, "Accepted job for {}", link);

        let coordinator = self.clone();
        let task_id = job_id.clone();
        let task = tokio::spawn(async move { coordinator.run_dispatch(task_id, link).await });

        Ok(Accepted { job_id, task })
    }

    /// Write the job, its history row and the owner's link to it.
    fn store_linked(&self, job: &Job, user: &mut User) -> CoordinatorResult<()> {
        self.jobs.save(job)?;
        self.history.save(&job.id, &HistoryItem::from_job(job))?;
        user.push_history(&job.id);
        self.users.save(user)?;
        Ok(())
    }

    /// Best-effort removal of the rows of a job that never got linked to its owner.
    fn discard_job(&self, job_id: &JobId) {
        for (collection, result) in [
            (JOBS, self.jobs.delete(job_id)),
            (HISTORY, self.history.delete(job_id.as_str())),
        ] {
            if let Err(e) = result {
                warn!(job_id = %job_id, collection, "Failed to discard unlinked job: {}", e);
            }
        }
    }

    async fn run_dispatch(&self, job_id: JobId, link: String) -> JobStatus {
        let logger = JobLogger::new(&job_id, "dispatch");
        logger.log_start(&link);

        let mut title = None;
        let status = match self.dispatch(&job_id, &link, &logger, &mut title).await {
            Ok(()) => {
                logger.log_completion("handed to converter");
                JobStatus::Performed
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                JobStatus::Fail
            }
        };

        if let Err(e) = self.record_status(&job_id, status, title.as_deref()) {
            logger.log_error(&format!("failed to record {} status: {}", status, e));
        }
        status
    }

    async fn dispatch(
        &self,
        job_id: &JobId,
        link: &str,
        logger: &JobLogger,
        title: &mut Option<String>,
    ) -> CoordinatorResult<()> {
        let info = self.metadata.video_info(link).await?;
        logger.log_progress(&format!("metadata: {:?} ({:?})", info.title, info.duration));
        if info.formats.is_empty() {
            logger.log_warning("no stream formats listed, dispatching the submitted link");
        }
        *title = Some(info.title.clone());

        let node = self.selector.next(Role::Converter)?;
        logger.log_progress(&format!("sending to {} at {}", node.name, node.address));

        let request = DispatchRequest {
            job_id: job_id.clone(),
            link: info.dispatch_link(link),
        };
        self.converter.dispatch(&node, &request).await?;
        Ok(())
    }

    /// Overwrite a job's status and mirror it onto its history row.
    ///
    /// A history row deleted in the meantime is not recreated.
    fn record_status(
        &self,
        job_id: &JobId,
        status: JobStatus,
        title: Option<&str>,
    ) -> CoordinatorResult<Job> {
        let job = self
            .jobs
            .update_status(job_id, status, title)
            .map_err(|e| not_found_as(e, || CoordinatorError::UnknownJob(job_id.to_string())))?;

        if let Some(mut item) = self.history.find(job_id.as_str())? {
            item.status = status;
            if let Some(title) = title {
                item.title = title.to_string();
            }
            self.history.save(job_id, &item)?;
        }
        Ok(job)
    }

    /// Status reported by a converter for a job it was handed.
    pub fn report_status(&self, job_id: &str, status: JobStatus) -> CoordinatorResult<Job> {
        let job_id = parse_job_id(job_id)?;
        let job = self.record_status(&job_id, status, None)?;
        info!(job_id = %job_id, status = %status, "Converter reported job status");
        Ok(job)
    }

    /// Current record of a job.
    pub fn status(&self, job_id: &str) -> CoordinatorResult<Job> {
        let job_id = parse_job_id(job_id)?;
        self.jobs
            .get(&job_id)
            .map_err(|e| not_found_as(e, || CoordinatorError::UnknownJob(job_id.to_string())))
    }

    /// An owner's history, oldest first. Ids without a row come back expired.
    pub fn history(&self, login: &str) -> CoordinatorResult<Vec<HistoryEntry>> {
        let user = self.load_owner(login)?;
        user.history_ids
            .into_iter()
            .map(|id| -> CoordinatorResult<HistoryEntry> {
                let item = self.history.find(&id)?;
                Ok(HistoryEntry {
                    expired: item.is_none(),
                    id,
                    item,
                })
            })
            .collect()
    }

    /// Remove one history item everywhere.
    ///
    /// The converter is asked first. Local state changes only after it
    /// answers `200 OK`; any other outcome leaves the owner and the history
    /// row untouched and is reported as [`CoordinatorError::NotRemoved`].
    pub async fn delete_history_item(&self, login: &str, item_id: &str) -> CoordinatorResult<()> {
        let user = self.load_owner(login)?;
        if !user.owns(item_id) {
            return Err(CoordinatorError::UnknownItem(item_id.to_string()));
        }

        let node = self
            .selector
            .next(Role::Converter)
            .map_err(|e| CoordinatorError::not_removed(item_id, e))?;

        if let Err(e) = self.converter.delete(&node, item_id).await {
            warn!(item = item_id, owner = login, node = %node.name, "Remote delete failed: {}", e);
            return Err(CoordinatorError::not_removed(item_id, e));
        }

        self.history.delete(item_id)?;
        {
            let _guard = self.owner_locks.lock(login).await;
            let mut user = self.load_owner(login)?;
            user.remove_history(item_id);
            self.users.save(&user)?;
        }

        info!(item = item_id, owner = login, node = %node.name, "Deleted history item");
        Ok(())
    }

    /// Record a converter registration. The address must be in the fleet.
    ///
    /// A converter re-registering under the same name keeps its original
    /// registration; a new name at a known address replaces it.
    pub fn register_converter(&self, address: &str) -> CoordinatorResult<ConverterRegistration> {
        let snapshot = self.selector.snapshot();
        let node = snapshot
            .nodes(Role::Converter)
            .iter()
            .find(|n| n.address == address)
            .ok_or_else(|| CoordinatorError::NotRegistered(address.to_string()))?;

        match self.converters.find(&node.address)? {
            Some(existing) if existing.name == node.name => {
                debug!(node = %node.name, address = %node.address, "Converter already registered");
                Ok(existing)
            }
            _ => Ok(self.converters.register(&node.address, &node.name)?),
        }
    }

    fn load_owner(&self, login: &str) -> CoordinatorResult<User> {
        self.users
            .get(login)
            .map_err(|e| not_found_as(e, || CoordinatorError::UnknownOwner(login.to_string())))
    }
}

fn validate_link(link: &str) -> CoordinatorResult<String> {
    let link = link.trim();
    let url = url::Url::parse(link).map_err(|e| CoordinatorError::InvalidLink(e.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(link.to_string()),
        _ => Err(CoordinatorError::InvalidLink(link.to_string())),
    }
}

fn parse_job_id(raw: &str) -> CoordinatorResult<JobId> {
    JobId::parse(raw).ok_or_else(|| CoordinatorError::InvalidJobId(raw.to_string()))
}

fn not_found_as(
    e: y2a_store::StoreError,
    f: impl FnOnce() -> CoordinatorError,
) -> CoordinatorError {
    if e.is_not_found() {
        f()
    } else {
        CoordinatorError::Store(e)
    }
}
