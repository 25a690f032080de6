//! Shared data models for the y2a dispatch service.
//!
//! This crate provides Serde-serializable types for:
//! - Worker nodes and their roles
//! - Jobs and their lifecycle status
//! - History items attached to an owner
//! - Owner accounts and permissions
//! - Link parsing helpers

pub mod history;
pub mod job;
pub mod node;
pub mod user;
pub mod utils;

pub use history::HistoryItem;
pub use job::{Job, JobId, JobStatus};
pub use node::{Node, Role};
pub use user::{Permissions, User};
pub use utils::{extract_youtube_id, hash_hex, normalize_http_base, YoutubeIdError, YoutubeIdResult};
