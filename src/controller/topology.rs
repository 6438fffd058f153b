// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Secondary network controllers and the topology dispatcher.
//!
//! [`build_controller`] is the only place that knows the set of topologies. Adding one
//! means adding a variant to [`crate::netconf::TopologyType`], a controller type here
//! and one match arm.

use super::BaseNetworkController;
use crate::address_set::AddressSetFactory;
use crate::constants::SECONDARY_CONTROLLER_SUFFIX;
use crate::context::CommonControllerInfo;
use crate::errors::ConfigError;
use crate::metrics;
use crate::netconf::{NetConf, NetworkDescriptor, TopologyType};
use std::sync::Arc;
use tracing::info;

/// Controller name for a secondary network.
#[must_use]
pub fn secondary_controller_name(network_name: &str) -> String {
    format!("{network_name}{SECONDARY_CONTROLLER_SUFFIX}")
}

fn split_subnets(subnets: &str) -> Vec<String> {
    subnets
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Routed secondary network: one switch per node behind a cluster router.
pub struct Layer3NetworkController {
    pub base: BaseNetworkController,
    pub subnets: Vec<String>,
    pub mtu: Option<u32>,
}

impl Layer3NetworkController {
    #[must_use]
    pub fn new(
        info: CommonControllerInfo,
        netconf: &NetConf,
        address_sets: Arc<AddressSetFactory>,
    ) -> Self {
        Self {
            base: BaseNetworkController::new(
                secondary_controller_name(&netconf.name),
                &netconf.name,
                info,
                TopologyType::Layer3.is_zone_aware(),
                address_sets,
            ),
            subnets: split_subnets(&netconf.subnets),
            mtu: netconf.mtu,
        }
    }
}

/// Switched secondary network: one cluster-wide logical switch.
pub struct Layer2NetworkController {
    pub base: BaseNetworkController,
    pub subnets: Vec<String>,
    pub exclude_subnets: Vec<String>,
}

impl Layer2NetworkController {
    #[must_use]
    pub fn new(
        info: CommonControllerInfo,
        netconf: &NetConf,
        address_sets: Arc<AddressSetFactory>,
    ) -> Self {
        Self {
            base: BaseNetworkController::new(
                secondary_controller_name(&netconf.name),
                &netconf.name,
                info,
                TopologyType::Layer2.is_zone_aware(),
                address_sets,
            ),
            subnets: split_subnets(&netconf.subnets),
            exclude_subnets: split_subnets(&netconf.exclude_subnets),
        }
    }
}

/// Passthrough secondary network bridged onto a physical network.
///
/// Localnet controllers do not track zone-local nodes.
pub struct LocalnetNetworkController {
    pub base: BaseNetworkController,
    pub vlan_id: Option<u16>,
}

impl LocalnetNetworkController {
    #[must_use]
    pub fn new(
        info: CommonControllerInfo,
        netconf: &NetConf,
        address_sets: Arc<AddressSetFactory>,
    ) -> Self {
        Self {
            base: BaseNetworkController::new(
                secondary_controller_name(&netconf.name),
                &netconf.name,
                info,
                TopologyType::Localnet.is_zone_aware(),
                address_sets,
            ),
            vlan_id: netconf.vlan_id,
        }
    }
}

/// A controller for one secondary network.
pub enum SecondaryNetworkController {
    Layer3(Layer3NetworkController),
    Layer2(Layer2NetworkController),
    Localnet(LocalnetNetworkController),
}

impl SecondaryNetworkController {
    #[must_use]
    pub fn topology(&self) -> TopologyType {
        match self {
            SecondaryNetworkController::Layer3(_) => TopologyType::Layer3,
            SecondaryNetworkController::Layer2(_) => TopologyType::Layer2,
            SecondaryNetworkController::Localnet(_) => TopologyType::Localnet,
        }
    }

    #[must_use]
    pub fn base(&self) -> &BaseNetworkController {
        match self {
            SecondaryNetworkController::Layer3(c) => &c.base,
            SecondaryNetworkController::Layer2(c) => &c.base,
            SecondaryNetworkController::Localnet(c) => &c.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut BaseNetworkController {
        match self {
            SecondaryNetworkController::Layer3(c) => &mut c.base,
            SecondaryNetworkController::Layer2(c) => &mut c.base,
            SecondaryNetworkController::Localnet(c) => &mut c.base,
        }
    }
}

/// Build the controller for `descriptor`'s topology, with a private address-set
/// factory namespaced by the network's controller name.
///
/// The returned factory is the same one the controller holds.
///
/// # Errors
///
/// Returns [`ConfigError::UnsupportedTopology`] for a topology outside the supported
/// set.
pub fn build_controller(
    info: CommonControllerInfo,
    descriptor: &NetworkDescriptor,
) -> Result<(SecondaryNetworkController, Arc<AddressSetFactory>), ConfigError> {
    let topology = descriptor.topology_type()?;
    let address_sets = Arc::new(AddressSetFactory::new(secondary_controller_name(
        &descriptor.network_name,
    )));
    let netconf = &descriptor.netconf;

    let controller = match topology {
        TopologyType::Layer3 => SecondaryNetworkController::Layer3(Layer3NetworkController::new(
            info,
            netconf,
            address_sets.clone(),
        )),
        TopologyType::Layer2 => SecondaryNetworkController::Layer2(Layer2NetworkController::new(
            info,
            netconf,
            address_sets.clone(),
        )),
        TopologyType::Localnet => SecondaryNetworkController::Localnet(
            LocalnetNetworkController::new(info, netconf, address_sets.clone()),
        ),
    };

    metrics::record_controller_built(topology.as_str());
    info!(
        network = %descriptor.network_name,
        topology = %topology,
        controller = %controller.base().controller_name(),
        "Built secondary network controller"
    );
    Ok((controller, address_sets))
}

#[cfg(test)]
#[path = "topology_tests.rs"]
mod topology_tests;
