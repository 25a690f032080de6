//! Directory reader: keeps the published fleet snapshot in step with Consul.
//!
//! `start` performs one fetch before returning. After that a background task
//! re-lists the prefix on a fixed period, using blocking queries when a wait
//! is configured. A failed poll is logged and the previous snapshot stays
//! published.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::{DirectoryConfig, StartupPolicy};
use crate::consul::ConsulClient;
use crate::error::FleetResult;
use crate::snapshot::{fleet_channel, FleetPublisher, FleetSnapshot, FleetView};

/// Polls the coordination service and publishes fleet snapshots.
pub struct DirectoryReader {
    config: DirectoryConfig,
    client: ConsulClient,
    publisher: FleetPublisher,
    last_index: u64,
}

impl DirectoryReader {
    /// Create a reader with an empty published snapshot. Nothing is fetched yet.
    pub fn new(config: DirectoryConfig) -> FleetResult<Self> {
        let client = ConsulClient::new(&config)?;
        let (publisher, _) = fleet_channel(FleetSnapshot::empty());
        Ok(Self {
            config,
            client,
            publisher,
            last_index: 0,
        })
    }

    /// Connect, fetch once, and start background polling.
    ///
    /// With [`StartupPolicy::Strict`] a failed first fetch is returned as the
    /// error. With [`StartupPolicy::Lenient`] the fleet starts empty and the
    /// poll loop fills it in.
    pub async fn start(config: DirectoryConfig) -> FleetResult<DirectoryHandle> {
        let mut reader = Self::new(config)?;

        info!(
            consul = %reader.config.consul_addr,
            prefix = %reader.config.prefix,
            "Fetching initial fleet"
        );

        match reader.poll_once().await {
            Ok(_) => {
                let snapshot = reader.publisher.current();
                info!(
                    version = snapshot.version(),
                    nodes = snapshot.len(),
                    "Initial fleet loaded"
                );
            }
            Err(e) => match reader.config.startup {
                StartupPolicy::Strict => return Err(e),
                StartupPolicy::Lenient => {
                    warn!("Initial fleet fetch failed, starting with an empty fleet: {}", e);
                }
            },
        }

        Ok(reader.spawn())
    }

    /// A read handle on the published snapshot.
    pub fn view(&self) -> FleetView {
        self.publisher.view()
    }

    /// Fetch the prefix once and publish the result.
    ///
    /// Returns `Ok(false)` when the listing was not newer than the published
    /// snapshot and nothing was swapped in.
    pub async fn poll_once(&mut self) -> FleetResult<bool> {
        let listing = self
            .client
            .list(&self.config.prefix, self.last_index, self.config.wait)
            .await?;

        if listing.index != 0 && listing.index == self.last_index {
            debug!(index = listing.index, "Fleet unchanged");
            return Ok(false);
        }

        let snapshot =
            FleetSnapshot::from_entries(&self.config.prefix, &listing.entries, listing.index);
        let nodes = snapshot.len();
        let previous = self.publisher.publish(snapshot);

        if listing.index < self.last_index {
            // Index went backwards (Consul state reset); restart from scratch
            warn!(
                previous = self.last_index,
                index = listing.index,
                "Consul index moved backwards"
            );
            self.last_index = 0;
        } else {
            self.last_index = listing.index;
        }

        if previous.len() != nodes {
            info!(
                version = listing.index,
                nodes,
                previous = previous.len(),
                "Fleet membership changed"
            );
        } else {
            debug!(version = listing.index, nodes, "Fleet refreshed");
        }

        Ok(true)
    }

    /// Run the poll loop on a background task.
    pub fn spawn(self) -> DirectoryHandle {
        let view = self.view();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(shutdown_rx));
        DirectoryHandle {
            view,
            shutdown,
            task,
        }
    }

    async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            "Starting fleet poller (interval: {:?}, wait: {:?})",
            self.config.poll_interval, self.config.wait
        );

        let mut ticker = interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the initial fetch already ran
        ticker.tick().await;

        loop {
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    // A dropped handle also stops the loop
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Fleet poller stopping");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.poll_once().await {
                        warn!(
                            version = self.publisher.current().version(),
                            "Fleet poll failed, keeping previous snapshot: {}", e
                        );
                    }
                }
            }
        }
    }
}

/// Handle to a running directory reader.
pub struct DirectoryHandle {
    view: FleetView,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl DirectoryHandle {
    /// A read handle on the published snapshot.
    pub fn view(&self) -> FleetView {
        self.view.clone()
    }

    /// Latest published snapshot.
    pub fn current(&self) -> Arc<FleetSnapshot> {
        self.view.current()
    }

    /// Stop the poll loop and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!("Fleet poller task ended abnormally: {}", e);
        }
    }
}
