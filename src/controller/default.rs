// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The default network's controller.

use super::BaseNetworkController;
use crate::address_set::AddressSetFactory;
use crate::config::ControllerOverrides;
use crate::constants::{DEFAULT_NETWORK_CONTROLLER_NAME, DEFAULT_NETWORK_NAME};
use crate::context::CommonControllerInfo;
use crate::crd::{EgressIPStatus, EgressIPStatusItem};
use crate::errors::ClientError;
use crate::metrics;
use std::sync::Arc;
use tracing::{debug, info};

/// Controller for the cluster's default network.
pub struct DefaultNetworkController {
    pub base: BaseNetworkController,
    pub multicast_support: bool,
    pub cluster_lb_group_uuid: String,
    pub switch_lb_group_uuid: String,
    pub router_lb_group_uuid: String,
}

impl DefaultNetworkController {
    /// Build the controller. Load-balancer group ids start empty and the multicast
    /// flag mirrors the composed feature flags until overrides are applied.
    #[must_use]
    pub fn new(info: CommonControllerInfo) -> Self {
        let multicast_support = info.features.multicast;
        let address_sets = Arc::new(AddressSetFactory::new(DEFAULT_NETWORK_CONTROLLER_NAME));
        metrics::record_controller_built(DEFAULT_NETWORK_NAME);
        info!(zone = %info.zone, "Built default network controller");
        Self {
            base: BaseNetworkController::new(
                DEFAULT_NETWORK_CONTROLLER_NAME,
                DEFAULT_NETWORK_NAME,
                info,
                true,
                address_sets,
            ),
            multicast_support,
            cluster_lb_group_uuid: String::new(),
            switch_lb_group_uuid: String::new(),
            router_lb_group_uuid: String::new(),
        }
    }

    /// Apply post-construction overrides.
    pub fn apply_overrides(&mut self, overrides: &ControllerOverrides) {
        self.multicast_support = overrides.multicast_support;
        self.cluster_lb_group_uuid
            .clone_from(&overrides.cluster_lb_group_uuid);
        self.switch_lb_group_uuid
            .clone_from(&overrides.switch_lb_group_uuid);
        self.router_lb_group_uuid
            .clone_from(&overrides.router_lb_group_uuid);
        debug!(
            multicast = self.multicast_support,
            cluster_lb_group = %self.cluster_lb_group_uuid,
            "Applied default controller overrides"
        );
    }

    /// Replace an egress IP's status items wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if the egress IP does not exist.
    pub fn patch_replace_egress_ip_status(
        &self,
        name: &str,
        items: Vec<EgressIPStatusItem>,
    ) -> Result<(), ClientError> {
        self.base
            .info()
            .kube
            .update_egress_ip_status(name, EgressIPStatus { items })
    }
}

#[cfg(test)]
#[path = "default_tests.rs"]
mod default_tests;
