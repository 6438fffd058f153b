// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! CNI network configuration carried by attachment definitions.
//!
//! [`parse_nad`] turns a [`NetworkAttachmentDefinition`] into a [`NetworkDescriptor`]:
//! the network name, raw topology string, and the parsed [`NetConf`]. The topology is
//! kept as written so that an unknown value surfaces as a named configuration error
//! from the topology dispatcher, not as a parse failure.

use crate::constants::{
    DEFAULT_NETWORK_NAME, LAYER2_TOPOLOGY, LAYER3_TOPOLOGY, LOCALNET_TOPOLOGY, OVN_CNI_PLUGIN_TYPE,
};
use crate::crd::{NetworkAttachmentDefinition, NetworkAttachmentDefinitionSpec};
use crate::errors::ConfigError;
use kube::ResourceExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fields of the CNI JSON config netplane reads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetConf {
    #[serde(default)]
    pub cni_version: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub plugin_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub topology: String,
    /// Comma-separated CIDRs
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subnets: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    /// `namespace/name` of the owning attachment definition
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub net_attach_def_name: String,
    #[serde(rename = "vlanID", default, skip_serializing_if = "Option::is_none")]
    pub vlan_id: Option<u16>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub exclude_subnets: String,
}

/// Closed set of supported topologies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TopologyType {
    Layer3,
    Layer2,
    Localnet,
}

impl TopologyType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TopologyType::Layer3 => LAYER3_TOPOLOGY,
            TopologyType::Layer2 => LAYER2_TOPOLOGY,
            TopologyType::Localnet => LOCALNET_TOPOLOGY,
        }
    }

    /// Whether controllers of this topology track zone-local nodes.
    #[must_use]
    pub fn is_zone_aware(self) -> bool {
        !matches!(self, TopologyType::Localnet)
    }
}

impl fmt::Display for TopologyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TopologyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            LAYER3_TOPOLOGY => Ok(TopologyType::Layer3),
            LAYER2_TOPOLOGY => Ok(TopologyType::Layer2),
            LOCALNET_TOPOLOGY => Ok(TopologyType::Localnet),
            other => Err(other.to_string()),
        }
    }
}

/// Parsed attachment metadata, consumed by the topology dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkDescriptor {
    pub network_name: String,
    /// `namespace/name` of the attachment definition this was parsed from
    pub nad_name: String,
    /// Topology as written in the config
    pub topology: String,
    pub netconf: NetConf,
}

impl NetworkDescriptor {
    /// Resolve the topology against the supported set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedTopology`] naming the offending value.
    pub fn topology_type(&self) -> Result<TopologyType, ConfigError> {
        self.topology
            .parse()
            .map_err(|topology| ConfigError::UnsupportedTopology {
                topology,
                network: self.network_name.clone(),
            })
    }
}

/// Attachment definition key.
#[must_use]
pub fn nad_name(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}

/// Parse and validate an attachment definition.
///
/// # Errors
///
/// - [`ConfigError::MalformedNetConf`] for invalid JSON, a missing name or topology,
///   a mismatched `netAttachDefName`, or a VLAN on a non-localnet topology
/// - [`ConfigError::ForeignPlugin`] if the config belongs to another CNI plugin
/// - [`ConfigError::ReservedNetworkName`] if it claims the default network's name
pub fn parse_nad(nad: &NetworkAttachmentDefinition) -> Result<NetworkDescriptor, ConfigError> {
    let key = nad_name(&nad.namespace().unwrap_or_default(), &nad.name_any());
    let malformed = |reason: String| ConfigError::MalformedNetConf {
        nad: key.clone(),
        reason,
    };

    let mut netconf: NetConf =
        serde_json::from_str(&nad.spec.config).map_err(|e| malformed(e.to_string()))?;

    if netconf.plugin_type != OVN_CNI_PLUGIN_TYPE {
        return Err(ConfigError::ForeignPlugin {
            nad: key,
            plugin: netconf.plugin_type,
        });
    }
    if netconf.name.is_empty() {
        return Err(malformed("network name is empty".to_string()));
    }
    if netconf.name == DEFAULT_NETWORK_NAME {
        return Err(ConfigError::ReservedNetworkName {
            nad: key,
            name: netconf.name,
        });
    }
    if netconf.topology.is_empty() {
        return Err(malformed("topology is not set".to_string()));
    }
    if netconf.net_attach_def_name.is_empty() {
        netconf.net_attach_def_name.clone_from(&key);
    } else if netconf.net_attach_def_name != key {
        return Err(malformed(format!(
            "netAttachDefName '{}' does not match the object",
            netconf.net_attach_def_name
        )));
    }
    if netconf.vlan_id.is_some() && netconf.topology != LOCALNET_TOPOLOGY {
        return Err(malformed(format!(
            "vlanID is only supported on {LOCALNET_TOPOLOGY} topology, not '{}'",
            netconf.topology
        )));
    }

    Ok(NetworkDescriptor {
        network_name: netconf.name.clone(),
        nad_name: key,
        topology: netconf.topology.clone(),
        netconf,
    })
}

/// Build an attachment definition whose config is `netconf` serialized as JSON.
///
/// # Errors
///
/// Returns [`ConfigError::MalformedNetConf`] if `netconf` cannot be serialized.
pub fn new_network_attachment_definition(
    namespace: &str,
    name: &str,
    netconf: &NetConf,
) -> Result<NetworkAttachmentDefinition, ConfigError> {
    let config = serde_json::to_string(netconf).map_err(|e| ConfigError::MalformedNetConf {
        nad: nad_name(namespace, name),
        reason: e.to_string(),
    })?;
    let mut nad = NetworkAttachmentDefinition::new(name, NetworkAttachmentDefinitionSpec { config });
    nad.metadata.namespace = Some(namespace.to_string());
    Ok(nad)
}

#[cfg(test)]
#[path = "netconf_tests.rs"]
mod netconf_tests;
