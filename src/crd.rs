// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) consumed by the network controllers.
//!
//! Only the fields the orchestration layer (and its tests) touch are modelled; the
//! controllers that interpret these objects live elsewhere.
//!
//! # Resource Types
//!
//! ## Attachments
//!
//! - [`NetworkAttachmentDefinition`] - Describes a secondary network (CNI JSON config)
//! - [`MultiNetworkPolicy`] - Network policy scoped to secondary networks
//!
//! ## Egress
//!
//! - [`EgressIP`] - Egress IP assignment; its status is patched by the cluster manager
//! - [`EgressFirewall`] - Per-namespace egress allow/deny rules
//! - [`EgressQoS`] - DSCP marking of egress traffic
//! - [`EgressService`] - Source IP selection for LoadBalancer services
//!
//! ## Admin Policy
//!
//! - [`AdminPolicyBasedExternalRoute`] - External gateway routing policy
//! - [`AdminNetworkPolicy`] - Cluster-scoped admin network policy
//!
//! # Example: Creating an attachment definition
//!
//! ```rust,no_run
//! use netplane::crd::{NetworkAttachmentDefinition, NetworkAttachmentDefinitionSpec};
//!
//! let mut nad = NetworkAttachmentDefinition::new(
//!     "blue",
//!     NetworkAttachmentDefinitionSpec {
//!         config: r#"{"cniVersion":"1.0.0","name":"net-a","type":"ovn-k8s-cni-overlay","topology":"layer3"}"#.to_string(),
//!     },
//! );
//! nad.metadata.namespace = Some("ns1".to_string());
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `NetworkAttachmentDefinition` describes an additional network a pod can attach to.
///
/// The `config` field carries the CNI network configuration as a JSON string; see
/// [`crate::netconf::NetConf`] for the fields netplane reads from it.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "k8s.cni.cncf.io",
    version = "v1",
    kind = "NetworkAttachmentDefinition",
    shortname = "net-attach-def",
    namespaced,
    doc = "NetworkAttachmentDefinition describes a secondary network and how pods attach to it."
)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAttachmentDefinitionSpec {
    /// CNI network configuration (JSON)
    #[serde(default)]
    pub config: String,
}

/// `EgressIP` assigns a fixed source IP to traffic leaving selected pods.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "k8s.ovn.org",
    version = "v1",
    kind = "EgressIP",
    doc = "EgressIP assigns a fixed source IP to traffic leaving selected pods."
)]
#[kube(status = "EgressIPStatus")]
#[serde(rename_all = "camelCase")]
pub struct EgressIPSpec {
    /// Egress IP addresses to assign
    #[serde(rename = "egressIPs", default)]
    pub egress_ips: Vec<String>,

    /// Labels of namespaces whose pods use these egress IPs
    #[serde(default)]
    pub namespace_selector: BTreeMap<String, String>,

    /// Labels of pods (within selected namespaces) using these egress IPs
    #[serde(default)]
    pub pod_selector: BTreeMap<String, String>,
}

/// `EgressIP` status: which node hosts which egress IP.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EgressIPStatus {
    #[serde(default)]
    pub items: Vec<EgressIPStatusItem>,
}

/// A single egress IP to node assignment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EgressIPStatusItem {
    /// Node the egress IP is assigned to
    pub node: String,
    /// The assigned egress IP
    #[serde(rename = "egressIP")]
    pub egress_ip: String,
}

/// `EgressFirewall` controls which external destinations pods in a namespace may reach.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "k8s.ovn.org",
    version = "v1",
    kind = "EgressFirewall",
    namespaced,
    doc = "EgressFirewall controls which external destinations pods in a namespace may reach."
)]
#[serde(rename_all = "camelCase")]
pub struct EgressFirewallSpec {
    /// Ordered list of rules; first match wins
    #[serde(default)]
    pub egress: Vec<EgressFirewallRule>,
}

/// One allow/deny rule of an [`EgressFirewall`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EgressFirewallRule {
    /// `Allow` or `Deny`
    #[serde(rename = "type")]
    pub rule_type: String,
    /// Destination CIDR
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr_selector: Option<String>,
    /// Destination DNS name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_name: Option<String>,
}

/// `EgressQoS` marks egress traffic of a namespace with DSCP values.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "k8s.ovn.org",
    version = "v1",
    kind = "EgressQoS",
    namespaced,
    doc = "EgressQoS marks egress traffic of a namespace with DSCP values."
)]
#[serde(rename_all = "camelCase")]
pub struct EgressQoSSpec {
    #[serde(default)]
    pub egress: Vec<EgressQoSRule>,
}

/// DSCP marking rule.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EgressQoSRule {
    pub dscp: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst_cidr: Option<String>,
}

/// `MultiNetworkPolicy` is a network policy applied on secondary networks.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "k8s.cni.cncf.io",
    version = "v1beta1",
    kind = "MultiNetworkPolicy",
    namespaced,
    doc = "MultiNetworkPolicy is a network policy applied on secondary networks."
)]
#[serde(rename_all = "camelCase")]
pub struct MultiNetworkPolicySpec {
    #[serde(default)]
    pub pod_selector: BTreeMap<String, String>,
    #[serde(default)]
    pub policy_types: Vec<String>,
}

/// `EgressService` selects the source IP and network for a LoadBalancer service.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "k8s.ovn.org",
    version = "v1",
    kind = "EgressService",
    namespaced,
    doc = "EgressService selects the source IP and network for a LoadBalancer service."
)]
#[serde(rename_all = "camelCase")]
pub struct EgressServiceSpec {
    /// `LoadBalancerIP` or `Network`
    #[serde(rename = "sourceIPBy", skip_serializing_if = "Option::is_none")]
    pub source_ip_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
}

/// `AdminPolicyBasedExternalRoute` routes namespace egress through external gateways.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "k8s.ovn.org",
    version = "v1",
    kind = "AdminPolicyBasedExternalRoute",
    doc = "AdminPolicyBasedExternalRoute routes namespace egress through external gateways."
)]
#[serde(rename_all = "camelCase")]
pub struct AdminPolicyBasedExternalRouteSpec {
    /// Labels of namespaces this policy applies to
    #[serde(default)]
    pub from_namespace_selector: BTreeMap<String, String>,
    /// Static next hop IPs
    #[serde(default)]
    pub next_hops: Vec<String>,
}

/// `AdminNetworkPolicy` is a cluster-scoped policy evaluated before namespace policies.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "policy.networking.k8s.io",
    version = "v1alpha1",
    kind = "AdminNetworkPolicy",
    doc = "AdminNetworkPolicy is a cluster-scoped policy evaluated before namespace policies."
)]
#[serde(rename_all = "camelCase")]
pub struct AdminNetworkPolicySpec {
    pub priority: i32,
    #[serde(default)]
    pub subject_namespaces: BTreeMap<String, String>,
}

/// Items of a list object (e.g. `EgressIPList`) as delivered to the orchestrator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceList<T> {
    #[serde(default)]
    pub items: Vec<T>,
}

impl<T> ResourceList<T> {
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for ResourceList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> FromIterator<T> for ResourceList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
