// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Network controllers.
//!
//! Every controller embeds a [`BaseNetworkController`] that owns its stop signal,
//! task tracker, attachment names, optional zone-local node set and private
//! address-set factory. The logical-network algorithms themselves live behind these
//! types; this module only carries what construction and teardown need.
//!
//! - [`default`] - The default network's controller
//! - [`topology`] - Secondary controllers and the topology dispatcher

pub mod default;
pub mod topology;

pub use default::DefaultNetworkController;
pub use topology::{
    build_controller, Layer2NetworkController, Layer3NetworkController,
    LocalnetNetworkController, SecondaryNetworkController,
};

use crate::address_set::AddressSetFactory;
use crate::constants::{DEFAULT_ZONE, ZONE_ANNOTATION};
use crate::context::CommonControllerInfo;
use crate::watch::{WatchAction, WatchEvent};
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// Stop channel plus cancelable context for one controller.
///
/// Workers select on both tokens. [`StopSignal::close`] cancels them exactly once.
#[derive(Debug, Default)]
pub struct StopSignal {
    stop: CancellationToken,
    context: CancellationToken,
    closed: AtomicBool,
}

impl StopSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the stop channel, then cancel the context.
    ///
    /// Returns `false` if the signal was already closed.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.stop.cancel();
        self.context.cancel();
        true
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    #[must_use]
    pub fn context_token(&self) -> CancellationToken {
        self.context.clone()
    }
}

/// Concurrent set of node names local to this controller's zone.
#[derive(Debug, Default)]
pub struct ZoneNodes {
    nodes: RwLock<BTreeSet<String>>,
}

impl ZoneNodes {
    /// Returns `true` if the node was not already present.
    pub fn insert(&self, node: &str) -> bool {
        self.nodes
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(node.to_string())
    }

    pub fn remove(&self, node: &str) -> bool {
        self.nodes
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(node)
    }

    #[must_use]
    pub fn contains(&self, node: &str) -> bool {
        self.nodes
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains(node)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.nodes
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

/// State shared by every controller type.
pub struct BaseNetworkController {
    controller_name: String,
    network_name: String,
    info: CommonControllerInfo,
    stop: StopSignal,
    tracker: TaskTracker,
    nads: BTreeSet<String>,
    zone_nodes: Option<Arc<ZoneNodes>>,
    address_sets: Arc<AddressSetFactory>,
    events_seen: Arc<AtomicU64>,
}

impl BaseNetworkController {
    /// `zone_aware` controllers get a zone-local node set.
    #[must_use]
    pub fn new(
        controller_name: impl Into<String>,
        network_name: impl Into<String>,
        info: CommonControllerInfo,
        zone_aware: bool,
        address_sets: Arc<AddressSetFactory>,
    ) -> Self {
        Self {
            controller_name: controller_name.into(),
            network_name: network_name.into(),
            info,
            stop: StopSignal::new(),
            tracker: TaskTracker::new(),
            nads: BTreeSet::new(),
            zone_nodes: zone_aware.then(|| Arc::new(ZoneNodes::default())),
            address_sets,
            events_seen: Arc::new(AtomicU64::new(0)),
        }
    }

    #[must_use]
    pub fn controller_name(&self) -> &str {
        &self.controller_name
    }

    #[must_use]
    pub fn network_name(&self) -> &str {
        &self.network_name
    }

    #[must_use]
    pub fn info(&self) -> &CommonControllerInfo {
        &self.info
    }

    #[must_use]
    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    #[must_use]
    pub fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }

    #[must_use]
    pub fn address_sets(&self) -> &Arc<AddressSetFactory> {
        &self.address_sets
    }

    /// Zone-local nodes, for zone-aware controllers.
    #[must_use]
    pub fn zone_nodes(&self) -> Option<&Arc<ZoneNodes>> {
        self.zone_nodes.as_ref()
    }

    /// Record an attachment definition as served by this controller.
    ///
    /// Returns `false` if it was already recorded.
    pub fn add_nad(&mut self, nad_name: &str) -> bool {
        self.nads.insert(nad_name.to_string())
    }

    #[must_use]
    pub fn has_nad(&self, nad_name: &str) -> bool {
        self.nads.contains(nad_name)
    }

    #[must_use]
    pub fn nad_names(&self) -> Vec<String> {
        self.nads.iter().cloned().collect()
    }

    /// Watch events this controller's worker has processed.
    #[must_use]
    pub fn events_seen(&self) -> u64 {
        self.events_seen.load(Ordering::SeqCst)
    }

    /// Spawn a task into this controller's tracker.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(task);
    }

    /// Spawn the watch worker. Must be called from within a Tokio runtime.
    pub fn start_worker(&self) {
        let worker = WatchWorker {
            controller_name: self.controller_name.clone(),
            info: self.info.clone(),
            zone_nodes: self.zone_nodes.clone(),
            events_seen: self.events_seen.clone(),
            stop: self.stop.stop_token(),
            context: self.stop.context_token(),
        };
        let events = self.info.watch_factory.subscribe();
        self.tracker.spawn(worker.run(events));
        debug!(controller = %self.controller_name, "Started watch worker");
    }

    /// Close the stop signal. Returns `false` if already closed.
    pub fn stop(&self) -> bool {
        let closed = self.stop.close();
        if closed {
            info!(controller = %self.controller_name, "Stopping controller");
        }
        closed
    }

    /// Wait for every task of this controller to exit.
    pub async fn wait(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        debug!(controller = %self.controller_name, "Controller tasks drained");
    }
}

struct WatchWorker {
    controller_name: String,
    info: CommonControllerInfo,
    zone_nodes: Option<Arc<ZoneNodes>>,
    events_seen: Arc<AtomicU64>,
    stop: CancellationToken,
    context: CancellationToken,
}

impl WatchWorker {
    async fn run(self, mut events: tokio::sync::broadcast::Receiver<WatchEvent>) {
        loop {
            tokio::select! {
                biased;
                () = self.stop.cancelled() => break,
                () = self.context.cancelled() => break,
                received = events.recv() => match received {
                    Ok(event) => self.handle(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(controller = %self.controller_name, skipped, "Controller lagged behind watch events");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
        debug!(controller = %self.controller_name, "Watch worker exited");
    }

    fn handle(&self, event: &WatchEvent) {
        self.events_seen.fetch_add(1, Ordering::SeqCst);
        if event.kind != "Node" {
            return;
        }
        let Some(zone_nodes) = &self.zone_nodes else {
            return;
        };
        match event.action {
            WatchAction::Deleted => {
                zone_nodes.remove(&event.key);
            }
            WatchAction::Added | WatchAction::Updated => {
                let Some(node) = self.info.kube.core.nodes.get(&event.key, None) else {
                    return;
                };
                let node_zone = node
                    .metadata
                    .annotations
                    .as_ref()
                    .and_then(|a| a.get(ZONE_ANNOTATION))
                    .map_or(DEFAULT_ZONE, String::as_str);
                if node_zone == self.info.zone {
                    zone_nodes.insert(&event.key);
                } else {
                    zone_nodes.remove(&event.key);
                }
            }
        }
    }
}

#[cfg(test)]
mod mod_tests;
