// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Lifecycle manager for the default controller and every secondary controller.
//!
//! [`Orchestrator::start`] seeds the client bundle from an object batch and brings
//! the controller graph up in a fixed order:
//!
//! 1. start the watch factory
//! 2. compose and build the default controller inside a zone bracket
//! 3. apply configured overrides to the default controller
//! 4. open watch delivery
//! 5. register a secondary controller per attachment definition in the batch
//! 6. mark every known node zone-local on each zone-aware controller
//!
//! [`Orchestrator::shutdown`] tears it down in the reverse dependency order and is
//! safe to call more than once.

use crate::address_set::AddressSetFactory;
use crate::clients::ClientBundle;
use crate::config::{FeatureFlags, OrchestratorConfig};
use crate::context::CommonControllerInfo;
use crate::controller::{build_controller, DefaultNetworkController, SecondaryNetworkController};
use crate::crd::{EgressIPStatusItem, NetworkAttachmentDefinition};
use crate::errors::{OrchestratorError, Result};
use crate::metrics::{self, PodRecorder};
use crate::netconf::{parse_nad, NetworkDescriptor};
use crate::objects::ObjectBatch;
use crate::ovsdb::{DbClient, HarnessCleanup, MemoryDb, NbSbHarness, TestSetup};
use crate::recorder::{EventRecorder, FakeRecorder};
use crate::registry::{ControllerRegistry, Registration};
use crate::watch::WatchFactory;
use crate::zone::with_zone;
use kube::runtime::events::EventType;
use kube::Resource;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

/// Auxiliary subsystems whose task groups are drained after the default controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AuxiliaryLoop {
    EgressQos,
    EgressService,
    AdminNetworkPolicy,
}

impl AuxiliaryLoop {
    pub const ALL: [AuxiliaryLoop; 3] = [
        AuxiliaryLoop::EgressQos,
        AuxiliaryLoop::EgressService,
        AuxiliaryLoop::AdminNetworkPolicy,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuxiliaryLoop::EgressQos => "egress-qos",
            AuxiliaryLoop::EgressService => "egress-service",
            AuxiliaryLoop::AdminNetworkPolicy => "admin-network-policy",
        }
    }
}

impl fmt::Display for AuxiliaryLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handles every controller is composed from.
struct SharedHandles {
    clients: Arc<ClientBundle>,
    watch_factory: Arc<WatchFactory>,
    recorder: Arc<dyn EventRecorder>,
    nb_client: Arc<dyn DbClient>,
    sb_client: Arc<dyn DbClient>,
    features: FeatureFlags,
    /// Zone written if the northbound database has none
    zone: String,
}

impl SharedHandles {
    fn compose(&self, network_name: &str) -> Result<CommonControllerInfo> {
        CommonControllerInfo::builder()
            .clients(self.clients.clone())
            .watch_factory(self.watch_factory.clone())
            .recorder(self.recorder.clone())
            .nb_client(self.nb_client.clone())
            .sb_client(self.sb_client.clone())
            .pod_recorder(Arc::new(PodRecorder::new(network_name)))
            .features(self.features)
            .build()
    }

    fn compose_and_build(
        &self,
        descriptor: &NetworkDescriptor,
    ) -> Result<(SecondaryNetworkController, Arc<AddressSetFactory>)> {
        let info = self.compose(&descriptor.network_name)?;
        Ok(build_controller(info, descriptor)?)
    }

    async fn build_default(&self) -> Result<DefaultNetworkController> {
        let info = with_zone(self.nb_client.as_ref(), &self.zone, || async {
            self.compose(crate::constants::DEFAULT_NETWORK_NAME)
        })
        .await?;
        Ok(DefaultNetworkController::new(info))
    }

    async fn build_secondary(
        &self,
        descriptor: &NetworkDescriptor,
    ) -> Result<(SecondaryNetworkController, Arc<AddressSetFactory>)> {
        with_zone(self.nb_client.as_ref(), &self.zone, || async {
            self.compose_and_build(descriptor)
        })
        .await
    }
}

/// Owns the controller graph from startup to shutdown.
pub struct Orchestrator {
    config: OrchestratorConfig,
    shared: SharedHandles,
    recorder: Arc<FakeRecorder>,
    nb: Arc<MemoryDb>,
    sb: Arc<MemoryDb>,
    cleanup: HarnessCleanup,
    default_controller: DefaultNetworkController,
    registry: ControllerRegistry,
    auxiliary: Vec<(AuxiliaryLoop, TaskTracker)>,
    shut_down: bool,
}

impl Orchestrator {
    /// Start over empty databases.
    ///
    /// # Errors
    ///
    /// See [`Orchestrator::start_with_harness`].
    pub async fn start(batch: ObjectBatch, config: OrchestratorConfig) -> Result<Self> {
        Self::start_with_db_setup(TestSetup::default(), batch, config).await
    }

    /// Start over databases seeded with `setup`.
    ///
    /// # Errors
    ///
    /// See [`Orchestrator::start_with_harness`].
    pub async fn start_with_db_setup(
        setup: TestSetup,
        batch: ObjectBatch,
        config: OrchestratorConfig,
    ) -> Result<Self> {
        Self::start_with_harness(NbSbHarness::start(setup), batch, config).await
    }

    /// Classify `batch`, seed the clients and bring up every controller.
    ///
    /// On failure everything already started is shut down before the error is
    /// returned.
    ///
    /// # Errors
    ///
    /// - Database errors from zone resolution
    /// - Configuration errors from an attachment definition in the batch
    pub async fn start_with_harness(
        harness: NbSbHarness,
        batch: ObjectBatch,
        config: OrchestratorConfig,
    ) -> Result<Self> {
        let classified = batch.classify();
        debug!(objects = classified.total(), "Classified object batch");
        let clients = Arc::new(ClientBundle::seed(&classified));
        let watch_factory = Arc::new(WatchFactory::new(&clients));
        let recorder = Arc::new(FakeRecorder::new(config.recorder_capacity));

        let NbSbHarness { nb, sb, cleanup } = harness;
        let shared = SharedHandles {
            clients,
            watch_factory,
            recorder: recorder.clone(),
            nb_client: nb.clone(),
            sb_client: sb.clone(),
            features: config.features,
            zone: config.zone.clone(),
        };

        shared.watch_factory.start();

        let mut default_controller = match shared.build_default().await {
            Ok(controller) => controller,
            Err(e) => {
                error!(error = %e, "Failed to build default network controller");
                shared.watch_factory.shutdown().await;
                cleanup.cleanup();
                return Err(e);
            }
        };
        default_controller.base.start_worker();
        default_controller.apply_overrides(&config.controller_overrides());

        let mut orchestrator = Self {
            config,
            shared,
            recorder,
            nb,
            sb,
            cleanup,
            default_controller,
            registry: ControllerRegistry::new(),
            auxiliary: AuxiliaryLoop::ALL
                .iter()
                .map(|kind| (*kind, TaskTracker::new()))
                .collect(),
            shut_down: false,
        };

        orchestrator.shared.watch_factory.start_delivery();

        for nad in &classified.network_attachment_definitions {
            if let Err(e) = orchestrator.add_network_attachment(nad).await {
                error!(error = %e, "Startup aborted by attachment definition");
                orchestrator.shutdown().await;
                return Err(e);
            }
        }

        orchestrator.snapshot_zone_nodes();
        info!(
            zone = %orchestrator.default_controller.base.info().zone,
            secondaries = orchestrator.registry.len(),
            "Orchestrator started"
        );
        Ok(orchestrator)
    }

    fn snapshot_zone_nodes(&self) {
        let nodes = match self.shared.clients.kube().get_nodes() {
            Ok(nodes) => nodes,
            Err(e) => {
                warn!(error = %e, "Failed to list nodes for zone snapshot");
                return;
            }
        };

        let mut sets = Vec::new();
        sets.extend(self.default_controller.base.zone_nodes());
        sets.extend(self.registry.controllers().filter_map(|c| c.base().zone_nodes()));

        for node in &nodes {
            let Some(name) = node.metadata.name.as_deref() else {
                continue;
            };
            for set in &sets {
                set.insert(name);
            }
        }
        debug!(
            nodes = nodes.len(),
            controllers = sets.len(),
            "Marked nodes zone-local"
        );
    }

    /// Parse an attachment definition and register it.
    ///
    /// The first attachment for a network builds and starts its controller; later
    /// ones are recorded against it. A rejected definition is reported as a warning
    /// event on the object and leaves the registry unchanged.
    ///
    /// # Errors
    ///
    /// - Configuration errors from parsing or topology dispatch
    /// - Database errors from zone resolution
    pub async fn add_network_attachment(
        &mut self,
        nad: &NetworkAttachmentDefinition,
    ) -> Result<Registration> {
        let result = self.register(nad).await;
        if let Err(e) = &result {
            self.shared
                .recorder
                .publish(
                    &nad.object_ref(&()),
                    EventType::Warning,
                    "InvalidNetworkAttachment",
                    &e.to_string(),
                )
                .await;
        }
        result
    }

    async fn register(&mut self, nad: &NetworkAttachmentDefinition) -> Result<Registration> {
        let descriptor = parse_nad(nad)?;
        let shared = &self.shared;
        let outcome = self
            .registry
            .register_or_attach(&descriptor, || shared.build_secondary(&descriptor))
            .await?;

        if outcome == Registration::Created {
            if let Some(controller) = self.registry.get(&descriptor.network_name) {
                controller.base().start_worker();
            }
        }
        Ok(outcome)
    }

    /// Spawn a task into an auxiliary subsystem's group.
    ///
    /// `task` receives the default controller's stop token and must exit once it
    /// is cancelled.
    pub fn spawn_auxiliary<F, Fut>(&self, kind: AuxiliaryLoop, task: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let stop = self.default_controller.base.stop_signal().stop_token();
        if let Some((_, tracker)) = self.auxiliary.iter().find(|(k, _)| *k == kind) {
            tracker.spawn(task(stop));
        }
    }

    /// Tear everything down.
    ///
    /// Every step is safe to repeat, so calling this again after a timed-out attempt
    /// picks up whatever did not drain. Once it has completed, further calls are
    /// no-ops.
    pub async fn shutdown(&mut self) {
        if self.shut_down {
            debug!("Orchestrator already shut down");
            return;
        }
        let started = Instant::now();
        info!("Shutting down orchestrator");

        self.shared.watch_factory.shutdown().await;

        let base = &self.default_controller.base;
        base.stop();
        base.wait().await;

        for (kind, tracker) in &self.auxiliary {
            tracker.close();
            tracker.wait().await;
            debug!(subsystem = %kind, "Auxiliary tasks drained");
        }

        self.cleanup.cleanup();

        // Signal every secondary before waiting on any; a record leaves the
        // registry only once its tasks have drained
        for controller in self.registry.controllers() {
            controller.base().stop();
        }
        for network in self.registry.network_names() {
            if let Some(controller) = self.registry.get(&network) {
                controller.base().wait().await;
            }
            self.registry.remove(&network);
            debug!(network = %network, "Secondary controller drained");
        }

        self.shut_down = true;
        let elapsed = started.elapsed();
        metrics::record_shutdown(elapsed, false);
        info!(elapsed_secs = elapsed.as_secs_f64(), "Orchestrator shut down");
    }

    /// [`Orchestrator::shutdown`] bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::ShutdownTimeout`] if the bound is exceeded. Tasks
    /// still running at that point are left behind.
    pub async fn shutdown_with_timeout(&mut self, timeout: Duration) -> Result<()> {
        let started = Instant::now();
        if tokio::time::timeout(timeout, self.shutdown()).await.is_ok() {
            return Ok(());
        }
        metrics::record_shutdown(started.elapsed(), true);
        warn!(?timeout, "Shutdown timed out");
        Err(OrchestratorError::ShutdownTimeout { timeout })
    }

    /// Replace an egress IP's status with a single node assignment.
    ///
    /// Test seeding only: stands in for the component that normally assigns egress
    /// IPs.
    ///
    /// # Errors
    ///
    /// Returns a client error if the egress IP does not exist.
    pub fn patch_egress_ip_status(
        &self,
        node_name: &str,
        egress_ip_name: &str,
        egress_ip: &str,
        network: &str,
    ) -> Result<()> {
        debug!(
            egress_ip = egress_ip_name,
            node = node_name,
            network,
            "Patching egress IP status"
        );
        self.default_controller.patch_replace_egress_ip_status(
            egress_ip_name,
            vec![EgressIPStatusItem {
                node: node_name.to_string(),
                egress_ip: egress_ip.to_string(),
            }],
        )?;
        Ok(())
    }

    #[must_use]
    pub fn default_controller(&self) -> &DefaultNetworkController {
        &self.default_controller
    }

    /// The secondary controller serving `network_name`.
    #[must_use]
    pub fn secondary_controller(&self, network_name: &str) -> Option<&SecondaryNetworkController> {
        self.registry.get(network_name)
    }

    #[must_use]
    pub fn registry(&self) -> &ControllerRegistry {
        &self.registry
    }

    /// Registered secondary network names, sorted.
    #[must_use]
    pub fn network_names(&self) -> Vec<String> {
        self.registry.network_names()
    }

    #[must_use]
    pub fn clients(&self) -> &Arc<ClientBundle> {
        &self.shared.clients
    }

    #[must_use]
    pub fn watch_factory(&self) -> &Arc<WatchFactory> {
        &self.shared.watch_factory
    }

    #[must_use]
    pub fn nb_client(&self) -> &Arc<MemoryDb> {
        &self.nb
    }

    #[must_use]
    pub fn sb_client(&self) -> &Arc<MemoryDb> {
        &self.sb
    }

    #[must_use]
    pub fn recorder(&self) -> &Arc<FakeRecorder> {
        &self.recorder
    }

    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod orchestrator_tests;
