//! Business logic services.

pub mod accounts;
pub mod coordinator;
pub mod error;
pub mod owner_locks;

pub use accounts::AccountService;
pub use coordinator::{Accepted, HistoryEntry, JobCoordinator};
pub use error::{CoordinatorError, CoordinatorResult};
pub use owner_locks::OwnerLocks;
