//! Round-robin node selection.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use y2a_models::{Node, Role};

use crate::error::{FleetError, FleetResult};
use crate::snapshot::{FleetSnapshot, FleetView};

/// Rotation counter for one role.
///
/// The counter only ever grows; the list length is applied at pick time, so
/// the index is always in range for the list actually passed in.
#[derive(Debug, Default)]
pub struct RoleCursor {
    counter: AtomicUsize,
}

impl RoleCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the next node from `nodes`, or `None` when it is empty.
    pub fn pick<'a>(&self, nodes: &'a [Node]) -> Option<&'a Node> {
        if nodes.is_empty() {
            return None;
        }
        let ticket = self.counter.fetch_add(1, Ordering::Relaxed);
        nodes.get(ticket % nodes.len())
    }

    /// Number of picks taken so far.
    pub fn position(&self) -> usize {
        self.counter.load(Ordering::Relaxed)
    }
}

/// Picks worker nodes from the latest fleet snapshot.
///
/// Clones share their cursors, so every handler in the process rotates
/// through the same sequence.
#[derive(Clone)]
pub struct NodeSelector {
    view: FleetView,
    cursors: Arc<[RoleCursor; 2]>,
}

impl NodeSelector {
    pub fn new(view: FleetView) -> Self {
        Self {
            view,
            cursors: Arc::new([RoleCursor::new(), RoleCursor::new()]),
        }
    }

    /// Next node of `role` in rotation.
    pub fn next(&self, role: Role) -> FleetResult<Node> {
        let snapshot = self.view.current();
        self.cursors[role.index()]
            .pick(snapshot.nodes(role))
            .cloned()
            .ok_or(FleetError::EmptyRole(role))
    }

    /// Is `address` a registered node of `role` in the current snapshot?
    pub fn contains(&self, role: Role, address: &str) -> bool {
        self.view.current().contains(role, address)
    }

    /// Snapshot the selector is currently reading.
    pub fn snapshot(&self) -> Arc<FleetSnapshot> {
        self.view.current()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::snapshot::fleet_channel;

    fn converters(names: &[&str]) -> FleetSnapshot {
        FleetSnapshot::new(
            1,
            names
                .iter()
                .enumerate()
                .map(|(i, name)| Node::new(Role::Converter, *name, format!("10.0.0.{}:9000", i + 1))),
        )
    }

    #[test]
    fn test_full_cycle_visits_each_node_once() {
        let (_publisher, view) = fleet_channel(converters(&["n1", "n2", "n3"]));
        let selector = NodeSelector::new(view);

        let first: Vec<_> = (0..3)
            .map(|_| selector.next(Role::Converter).unwrap().name)
            .collect();
        let second: Vec<_> = (0..3)
            .map(|_| selector.next(Role::Converter).unwrap().name)
            .collect();

        assert_eq!(first, vec!["n1", "n2", "n3"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_role_fails_every_time() {
        let (_publisher, view) = fleet_channel(converters(&["n1"]));
        let selector = NodeSelector::new(view);

        for _ in 0..3 {
            assert!(matches!(
                selector.next(Role::Api),
                Err(FleetError::EmptyRole(Role::Api))
            ));
        }
        // Failed picks do not advance the other role's rotation
        assert_eq!(selector.next(Role::Converter).unwrap().name, "n1");
    }

    #[test]
    fn test_cursor_survives_snapshot_swap() {
        let (publisher, view) = fleet_channel(converters(&["n1", "n2"]));
        let selector = NodeSelector::new(view);

        assert_eq!(selector.next(Role::Converter).unwrap().name, "n1");
        publisher.publish(converters(&["n1", "n2", "n3"]));
        assert_eq!(selector.next(Role::Converter).unwrap().name, "n2");
        assert_eq!(selector.next(Role::Converter).unwrap().name, "n3");

        publisher.publish(converters(&["n1"]));
        assert_eq!(selector.next(Role::Converter).unwrap().name, "n1");
    }

    #[test]
    fn test_contains_checks_address() {
        let (_publisher, view) = fleet_channel(converters(&["n1"]));
        let selector = NodeSelector::new(view);
        assert!(selector.contains(Role::Converter, "10.0.0.1:9000"));
        assert!(!selector.contains(Role::Converter, "10.0.0.2:9000"));
    }

    #[test]
    fn test_concurrent_picks_do_not_lose_increments() {
        let (_publisher, view) = fleet_channel(converters(&["n1", "n2", "n3", "n4"]));
        let selector = NodeSelector::new(view);

        let counts = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let selector = selector.clone();
                    scope.spawn(move || {
                        (0..100)
                            .map(|_| selector.next(Role::Converter).unwrap().name)
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            let mut counts: HashMap<String, usize> = HashMap::new();
            for handle in handles {
                for name in handle.join().unwrap() {
                    *counts.entry(name).or_default() += 1;
                }
            }
            counts
        });

        assert_eq!(selector.cursors[Role::Converter.index()].position(), 400);
        assert_eq!(counts.len(), 4);
        assert!(counts.values().all(|&c| c == 100));
    }
}
