// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Heterogeneous input objects and their classification into per-API-group buckets.
//!
//! Each API group's client must be seeded with that group's objects only, so the
//! orchestrator first splits its input batch by object type. Classification is a
//! single `match` over [`ApiObject`]: adding an API group means adding one variant,
//! one bucket field, and one match arm. Anything without a dedicated arm lands in
//! the core bucket.
//!
//! # Example
//!
//! ```rust
//! use netplane::objects::{ApiObject, ObjectBatch};
//! use k8s_openapi::api::core::v1::Node;
//!
//! let batch: ObjectBatch = vec![ApiObject::Node(Node::default())].into();
//! let classified = batch.classify();
//! assert_eq!(classified.core.len(), 1);
//! ```

use crate::crd::{
    AdminNetworkPolicy, AdminPolicyBasedExternalRoute, EgressFirewall, EgressIP, EgressQoS,
    EgressService, MultiNetworkPolicy, NetworkAttachmentDefinition, ResourceList,
};
use k8s_openapi::api::core::v1::{Namespace, Node, Pod, Service};
use kube::api::DynamicObject;

/// Any object the orchestrator can be seeded with.
#[derive(Clone, Debug)]
pub enum ApiObject {
    EgressIpList(ResourceList<EgressIP>),
    EgressFirewallList(ResourceList<EgressFirewall>),
    EgressQosList(ResourceList<EgressQoS>),
    MultiNetworkPolicyList(ResourceList<MultiNetworkPolicy>),
    EgressServiceList(ResourceList<EgressService>),
    AdminPolicyBasedRouteList(ResourceList<AdminPolicyBasedExternalRoute>),
    AdminNetworkPolicyList(ResourceList<AdminNetworkPolicy>),
    NetworkAttachmentDefinitionList(ResourceList<NetworkAttachmentDefinition>),
    Node(Node),
    Namespace(Namespace),
    Pod(Pod),
    Service(Service),
    /// Any other kind, carried untyped
    Unstructured(DynamicObject),
}

impl ApiObject {
    /// Kind name, for logging.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            ApiObject::EgressIpList(_) => "EgressIPList",
            ApiObject::EgressFirewallList(_) => "EgressFirewallList",
            ApiObject::EgressQosList(_) => "EgressQoSList",
            ApiObject::MultiNetworkPolicyList(_) => "MultiNetworkPolicyList",
            ApiObject::EgressServiceList(_) => "EgressServiceList",
            ApiObject::AdminPolicyBasedRouteList(_) => "AdminPolicyBasedExternalRouteList",
            ApiObject::AdminNetworkPolicyList(_) => "AdminNetworkPolicyList",
            ApiObject::NetworkAttachmentDefinitionList(_) => "NetworkAttachmentDefinitionList",
            ApiObject::Node(_) => "Node",
            ApiObject::Namespace(_) => "Namespace",
            ApiObject::Pod(_) => "Pod",
            ApiObject::Service(_) => "Service",
            ApiObject::Unstructured(obj) => obj
                .types
                .as_ref()
                .map_or("Unknown", |types| types.kind.as_str()),
        }
    }
}

/// An unordered batch of input objects, consumed once by [`ObjectBatch::classify`].
#[derive(Clone, Debug, Default)]
pub struct ObjectBatch {
    objects: Vec<ApiObject>,
}

impl ObjectBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, object: ApiObject) {
        self.objects.push(object);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Split the batch into per-API-group buckets.
    ///
    /// Attachment definition lists are flattened into individual definitions; every
    /// other list is kept whole because it seeds its group's client as one object.
    #[must_use]
    pub fn classify(self) -> ClassifiedObjects {
        let mut out = ClassifiedObjects::default();
        for object in self.objects {
            match object {
                ApiObject::EgressIpList(list) => out.egress_ips.push(list),
                ApiObject::EgressFirewallList(list) => out.egress_firewalls.push(list),
                ApiObject::EgressQosList(list) => out.egress_qos.push(list),
                ApiObject::MultiNetworkPolicyList(list) => out.multi_network_policies.push(list),
                ApiObject::EgressServiceList(list) => out.egress_services.push(list),
                ApiObject::AdminPolicyBasedRouteList(list) => out.admin_policy_routes.push(list),
                ApiObject::AdminNetworkPolicyList(list) => out.admin_network_policies.push(list),
                ApiObject::NetworkAttachmentDefinitionList(list) => {
                    out.network_attachment_definitions.extend(list.items);
                }
                other => out.core.push(other),
            }
        }
        out
    }
}

impl From<Vec<ApiObject>> for ObjectBatch {
    fn from(objects: Vec<ApiObject>) -> Self {
        Self { objects }
    }
}

impl FromIterator<ApiObject> for ObjectBatch {
    fn from_iter<I: IntoIterator<Item = ApiObject>>(iter: I) -> Self {
        Self {
            objects: iter.into_iter().collect(),
        }
    }
}

/// Output of [`ObjectBatch::classify`]: one bucket per API group plus the core bucket.
#[derive(Clone, Debug, Default)]
pub struct ClassifiedObjects {
    pub egress_ips: Vec<ResourceList<EgressIP>>,
    pub egress_firewalls: Vec<ResourceList<EgressFirewall>>,
    pub egress_qos: Vec<ResourceList<EgressQoS>>,
    pub multi_network_policies: Vec<ResourceList<MultiNetworkPolicy>>,
    pub egress_services: Vec<ResourceList<EgressService>>,
    pub admin_policy_routes: Vec<ResourceList<AdminPolicyBasedExternalRoute>>,
    pub admin_network_policies: Vec<ResourceList<AdminNetworkPolicy>>,
    /// Flattened from every attachment definition list in the batch
    pub network_attachment_definitions: Vec<NetworkAttachmentDefinition>,
    /// Core objects and anything without a dedicated bucket
    pub core: Vec<ApiObject>,
}

impl ClassifiedObjects {
    /// Number of bucketed entries: list objects count once, attachment definitions
    /// count per item, core objects count once each.
    #[must_use]
    pub fn total(&self) -> usize {
        self.egress_ips.len()
            + self.egress_firewalls.len()
            + self.egress_qos.len()
            + self.multi_network_policies.len()
            + self.egress_services.len()
            + self.admin_policy_routes.len()
            + self.admin_network_policies.len()
            + self.network_attachment_definitions.len()
            + self.core.len()
    }
}

#[cfg(test)]
#[path = "objects_tests.rs"]
mod objects_tests;
