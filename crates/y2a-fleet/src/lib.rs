//! Fleet directory and node selection.
//!
//! This crate provides:
//! - A Consul KV client (recursive listing with blocking queries)
//! - Immutable fleet snapshots published through a watch channel
//! - The directory reader: one blocking fetch at start, then a background poll loop
//! - Round-robin node selection per role

pub mod config;
pub mod consul;
pub mod directory;
pub mod error;
pub mod selector;
pub mod snapshot;

pub use config::{DirectoryConfig, StartupPolicy};
pub use consul::{ConsulClient, KvEntry, KvListing};
pub use directory::{DirectoryHandle, DirectoryReader};
pub use error::{FleetError, FleetResult};
pub use selector::{NodeSelector, RoleCursor};
pub use snapshot::{fleet_channel, FleetPublisher, FleetSnapshot, FleetView};
