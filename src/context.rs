// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared handle bundle every network controller is built from.
//!
//! [`CommonControllerInfo`] carries the client bundle, watch factory, event recorder,
//! both database clients, the pod recorder and the feature flags. It is composed once
//! per controller through [`CommonControllerInfoBuilder`]; composition reads the zone
//! from the northbound database and does no other I/O.
//!
//! # Example
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use netplane::context::CommonControllerInfo;
//! # use netplane::clients::ClientBundle;
//! # use netplane::metrics::PodRecorder;
//! # use netplane::objects::ClassifiedObjects;
//! # use netplane::ovsdb::{NbSbHarness, TestSetup};
//! # use netplane::recorder::FakeRecorder;
//! # use netplane::watch::WatchFactory;
//! let clients = Arc::new(ClientBundle::seed(&ClassifiedObjects::default()));
//! let harness = NbSbHarness::start(TestSetup::default());
//! let info = CommonControllerInfo::builder()
//!     .watch_factory(Arc::new(WatchFactory::new(&clients)))
//!     .clients(clients)
//!     .recorder(Arc::new(FakeRecorder::new(10)))
//!     .nb_client(harness.nb.clone())
//!     .sb_client(harness.sb.clone())
//!     .pod_recorder(Arc::new(PodRecorder::new("default")))
//!     .build();
//! // no NB_Global row yet
//! assert!(info.is_err());
//! ```

use crate::clients::{ClientBundle, KubeFacade};
use crate::config::FeatureFlags;
use crate::errors::{ConfigError, Result};
use crate::metrics::PodRecorder;
use crate::ovsdb::DbClient;
use crate::recorder::EventRecorder;
use crate::watch::WatchFactory;
use crate::zone::get_nb_zone;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Handles shared by a controller and, by reference, with every other controller.
#[derive(Clone)]
pub struct CommonControllerInfo {
    /// Seeded API clients
    pub clients: Arc<ClientBundle>,

    /// Combined client view
    pub kube: KubeFacade,

    pub watch_factory: Arc<WatchFactory>,

    pub recorder: Arc<dyn EventRecorder>,

    /// Northbound database client
    pub nb_client: Arc<dyn DbClient>,

    /// Southbound database client
    pub sb_client: Arc<dyn DbClient>,

    pub pod_recorder: Arc<PodRecorder>,

    pub features: FeatureFlags,

    /// Zone read from the northbound database at composition time
    pub zone: String,
}

impl fmt::Debug for CommonControllerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommonControllerInfo")
            .field("zone", &self.zone)
            .field("features", &self.features)
            .field("nb_client", &self.nb_client.name())
            .field("sb_client", &self.sb_client.name())
            .finish_non_exhaustive()
    }
}

impl CommonControllerInfo {
    #[must_use]
    pub fn builder() -> CommonControllerInfoBuilder {
        CommonControllerInfoBuilder::default()
    }
}

/// Builder for [`CommonControllerInfo`]. Every handle is required.
#[derive(Default)]
pub struct CommonControllerInfoBuilder {
    clients: Option<Arc<ClientBundle>>,
    watch_factory: Option<Arc<WatchFactory>>,
    recorder: Option<Arc<dyn EventRecorder>>,
    nb_client: Option<Arc<dyn DbClient>>,
    sb_client: Option<Arc<dyn DbClient>>,
    pod_recorder: Option<Arc<PodRecorder>>,
    features: FeatureFlags,
}

impl CommonControllerInfoBuilder {
    #[must_use]
    pub fn clients(mut self, clients: Arc<ClientBundle>) -> Self {
        self.clients = Some(clients);
        self
    }

    #[must_use]
    pub fn watch_factory(mut self, watch_factory: Arc<WatchFactory>) -> Self {
        self.watch_factory = Some(watch_factory);
        self
    }

    #[must_use]
    pub fn recorder(mut self, recorder: Arc<dyn EventRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    #[must_use]
    pub fn nb_client(mut self, nb_client: Arc<dyn DbClient>) -> Self {
        self.nb_client = Some(nb_client);
        self
    }

    #[must_use]
    pub fn sb_client(mut self, sb_client: Arc<dyn DbClient>) -> Self {
        self.sb_client = Some(sb_client);
        self
    }

    #[must_use]
    pub fn pod_recorder(mut self, pod_recorder: Arc<PodRecorder>) -> Self {
        self.pod_recorder = Some(pod_recorder);
        self
    }

    #[must_use]
    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Compose the bundle.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingHandle`] if a handle was not supplied
    /// - [`crate::errors::DatabaseError::ZoneNotFound`] if the northbound database has
    ///   no zone record
    pub fn build(self) -> Result<CommonControllerInfo> {
        let clients = self.clients.ok_or(ConfigError::MissingHandle {
            handle: "client bundle",
        })?;
        let watch_factory = self.watch_factory.ok_or(ConfigError::MissingHandle {
            handle: "watch factory",
        })?;
        let recorder = self.recorder.ok_or(ConfigError::MissingHandle {
            handle: "event recorder",
        })?;
        let nb_client = self.nb_client.ok_or(ConfigError::MissingHandle {
            handle: "northbound database client",
        })?;
        let sb_client = self.sb_client.ok_or(ConfigError::MissingHandle {
            handle: "southbound database client",
        })?;
        let pod_recorder = self.pod_recorder.ok_or(ConfigError::MissingHandle {
            handle: "pod recorder",
        })?;

        let zone = get_nb_zone(nb_client.as_ref())?;
        debug!(zone = %zone, "Composed common controller info");

        Ok(CommonControllerInfo {
            kube: clients.kube(),
            clients,
            watch_factory,
            recorder,
            nb_client,
            sb_client,
            pod_recorder,
            features: self.features,
            zone,
        })
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
