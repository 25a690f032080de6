//! Immutable fleet snapshots and their publication channel.
//!
//! The directory reader is the only writer. A new snapshot is built from a
//! full listing and swapped in whole; readers clone the `Arc` and keep using
//! the same instance for as long as they need it.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use y2a_models::{Node, Role};

use crate::consul::KvEntry;

/// Point-in-time view of the registered nodes, grouped by role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FleetSnapshot {
    version: u64,
    nodes: [Vec<Node>; 2],
}

impl FleetSnapshot {
    /// Snapshot with no nodes at version 0.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from a set of nodes, keeping their order within a role.
    pub fn new(version: u64, nodes: impl IntoIterator<Item = Node>) -> Self {
        let mut grouped: [Vec<Node>; 2] = Default::default();
        for node in nodes {
            grouped[node.role.index()].push(node);
        }
        Self {
            version,
            nodes: grouped,
        }
    }

    /// Build a snapshot from raw KV entries listed under `prefix`.
    ///
    /// Keys look like `<prefix>/<dir>/<name>`; the value is the node address.
    /// Entries with an empty name, or whose last directory segment is not a
    /// known role, are dropped.
    pub fn from_entries(prefix: &str, entries: &[KvEntry], version: u64) -> Self {
        let prefix = prefix.trim_matches('/');
        let nodes = entries.iter().filter_map(|entry| {
            let node = parse_entry(prefix, entry);
            if node.is_none() {
                debug!(key = %entry.key, "Skipping KV entry");
            }
            node
        });
        Self::new(version, nodes)
    }

    /// Coordination service index this snapshot was built from.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Nodes of `role`, in listing order.
    pub fn nodes(&self, role: Role) -> &[Node] {
        &self.nodes[role.index()]
    }

    /// Is `address` registered under `role`?
    pub fn contains(&self, role: Role, address: &str) -> bool {
        self.nodes(role).iter().any(|n| n.address == address)
    }

    /// Total node count across roles.
    pub fn len(&self) -> usize {
        self.nodes.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse_entry(prefix: &str, entry: &KvEntry) -> Option<Node> {
    let rest = entry.key.trim_start_matches('/').strip_prefix(prefix)?;
    if !prefix.is_empty() && !rest.starts_with('/') {
        return None;
    }
    let rest = rest.trim_start_matches('/');

    let (dir, name) = rest.rsplit_once('/')?;
    if name.is_empty() {
        return None;
    }

    let segment = dir.trim_end_matches('/').rsplit('/').next()?;
    let role = Role::from_directory(segment)?;

    let address = String::from_utf8_lossy(&entry.value).trim().to_string();
    Some(Node::new(role, name, address))
}

/// Create the publish/read pair, starting from `initial`.
pub fn fleet_channel(initial: FleetSnapshot) -> (FleetPublisher, FleetView) {
    let (tx, rx) = watch::channel(Arc::new(initial));
    (FleetPublisher { tx: Arc::new(tx) }, FleetView { rx })
}

/// Write side: held by the directory reader.
#[derive(Clone)]
pub struct FleetPublisher {
    tx: Arc<watch::Sender<Arc<FleetSnapshot>>>,
}

impl FleetPublisher {
    /// Replace the published snapshot in one swap, returning the previous one.
    ///
    /// Versions are not compared: a coordination service that lost its state
    /// restarts its index, and the fresh listing must still win.
    pub fn publish(&self, snapshot: FleetSnapshot) -> Arc<FleetSnapshot> {
        self.tx.send_replace(Arc::new(snapshot))
    }

    /// Latest published snapshot.
    pub fn current(&self) -> Arc<FleetSnapshot> {
        self.tx.borrow().clone()
    }

    /// A fresh read handle.
    pub fn view(&self) -> FleetView {
        FleetView {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read side: cheap to clone, never blocks on the writer.
#[derive(Clone)]
pub struct FleetView {
    rx: watch::Receiver<Arc<FleetSnapshot>>,
}

impl FleetView {
    /// Latest published snapshot.
    pub fn current(&self) -> Arc<FleetSnapshot> {
        self.rx.borrow().clone()
    }
}
