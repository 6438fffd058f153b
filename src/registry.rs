// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Secondary controller registry: at most one controller per network name.

use crate::address_set::AddressSetFactory;
use crate::controller::SecondaryNetworkController;
use crate::errors::Result;
use crate::metrics;
use crate::netconf::NetworkDescriptor;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

/// A registered controller and its private address-set factory.
pub struct ControllerRecord {
    pub controller: SecondaryNetworkController,
    pub address_sets: Arc<AddressSetFactory>,
}

/// What [`ControllerRegistry::register_or_attach`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registration {
    /// A new controller was built for the network
    Created,
    /// The attachment was recorded against the existing controller
    Attached,
}

/// Controllers keyed by network name.
#[derive(Default)]
pub struct ControllerRegistry {
    records: BTreeMap<String, ControllerRecord>,
}

impl ControllerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `descriptor`'s attachment.
    ///
    /// If no controller serves the network yet, `build` constructs one and it is
    /// stored; otherwise the existing controller is reused untouched and only the
    /// attachment name is recorded. A failed build leaves the registry unchanged.
    ///
    /// # Errors
    ///
    /// Whatever `build` returns.
    pub async fn register_or_attach<F, Fut>(
        &mut self,
        descriptor: &NetworkDescriptor,
        build: F,
    ) -> Result<Registration>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(SecondaryNetworkController, Arc<AddressSetFactory>)>>,
    {
        let outcome = match self.records.get(&descriptor.network_name) {
            Some(record) => {
                let existing = record.controller.topology();
                if existing.as_str() != descriptor.topology {
                    warn!(
                        network = %descriptor.network_name,
                        nad = %descriptor.nad_name,
                        existing = %existing,
                        requested = %descriptor.topology,
                        "Attachment topology differs from the network's controller; keeping existing controller"
                    );
                }
                Registration::Attached
            }
            None => {
                let (controller, address_sets) = build().await?;
                self.records.insert(
                    descriptor.network_name.clone(),
                    ControllerRecord {
                        controller,
                        address_sets,
                    },
                );
                Registration::Created
            }
        };

        if let Some(record) = self.records.get_mut(&descriptor.network_name) {
            record.controller.base_mut().add_nad(&descriptor.nad_name);
            info!(
                nad = %descriptor.nad_name,
                network = %descriptor.network_name,
                topology = %record.controller.topology(),
                ?outcome,
                "Registered attachment definition"
            );
        }
        metrics::record_attachment(outcome == Registration::Created);
        Ok(outcome)
    }

    #[must_use]
    pub fn get(&self, network_name: &str) -> Option<&SecondaryNetworkController> {
        self.records.get(network_name).map(|r| &r.controller)
    }

    #[must_use]
    pub fn address_sets(&self, network_name: &str) -> Option<&Arc<AddressSetFactory>> {
        self.records.get(network_name).map(|r| &r.address_sets)
    }

    /// The controller serving attachment `nad_name`, if any.
    #[must_use]
    pub fn find_by_nad(&self, nad_name: &str) -> Option<&SecondaryNetworkController> {
        self.records
            .values()
            .map(|r| &r.controller)
            .find(|c| c.base().has_nad(nad_name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Registered network names, sorted.
    #[must_use]
    pub fn network_names(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    pub fn controllers(&self) -> impl Iterator<Item = &SecondaryNetworkController> {
        self.records.values().map(|r| &r.controller)
    }

    /// Remove and return the record for `network_name`.
    pub fn remove(&mut self, network_name: &str) -> Option<ControllerRecord> {
        self.records.remove(network_name)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod registry_tests;
