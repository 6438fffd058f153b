// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `objects.rs`

use crate::crd::{
    AdminNetworkPolicy, AdminNetworkPolicySpec, EgressFirewall, EgressFirewallSpec, EgressIP,
    EgressIPSpec, EgressQoS, EgressQoSSpec, NetworkAttachmentDefinition,
    NetworkAttachmentDefinitionSpec, ResourceList,
};
use crate::objects::{ApiObject, ObjectBatch};
use k8s_openapi::api::core::v1::{Namespace, Node};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{ApiResource, DynamicObject, GroupVersionKind};
use kube::ResourceExt;

fn node(name: &str) -> ApiObject {
    ApiObject::Node(Node {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        ..Default::default()
    })
}

fn nad(namespace: &str, name: &str) -> NetworkAttachmentDefinition {
    let mut nad = NetworkAttachmentDefinition::new(name, NetworkAttachmentDefinitionSpec::default());
    nad.metadata.namespace = Some(namespace.to_string());
    nad
}

fn mixed_batch() -> Vec<ApiObject> {
    let deployment = ApiResource::from_gvk(&GroupVersionKind::gvk("apps", "v1", "Deployment"));
    vec![
        node("node1"),
        ApiObject::EgressIpList(ResourceList::new(vec![EgressIP::new(
            "eip1",
            EgressIPSpec::default(),
        )])),
        ApiObject::NetworkAttachmentDefinitionList(ResourceList::new(vec![
            nad("ns1", "blue"),
            nad("ns2", "blue"),
        ])),
        ApiObject::EgressFirewallList(ResourceList::new(vec![EgressFirewall::new(
            "default",
            EgressFirewallSpec::default(),
        )])),
        ApiObject::Namespace(Namespace::default()),
        ApiObject::EgressQosList(ResourceList::new(vec![EgressQoS::new(
            "default",
            EgressQoSSpec::default(),
        )])),
        ApiObject::AdminNetworkPolicyList(ResourceList::new(vec![AdminNetworkPolicy::new(
            "anp1",
            AdminNetworkPolicySpec::default(),
        )])),
        ApiObject::Unstructured(DynamicObject::new("web", &deployment)),
        node("node2"),
    ]
}

#[test]
fn test_empty_batch_classifies_to_nothing() {
    let classified = ObjectBatch::new().classify();
    assert_eq!(classified.total(), 0);
    assert!(classified.core.is_empty());
    assert!(classified.network_attachment_definitions.is_empty());
}

#[test]
fn test_each_kind_lands_in_its_bucket() {
    let classified = ObjectBatch::from(mixed_batch()).classify();

    assert_eq!(classified.egress_ips.len(), 1);
    assert_eq!(classified.egress_firewalls.len(), 1);
    assert_eq!(classified.egress_qos.len(), 1);
    assert_eq!(classified.admin_network_policies.len(), 1);
    assert!(classified.multi_network_policies.is_empty());
    assert!(classified.egress_services.is_empty());
    assert!(classified.admin_policy_routes.is_empty());
    // two nodes, one namespace, one unstructured deployment
    assert_eq!(classified.core.len(), 4);
}

#[test]
fn test_nad_lists_are_flattened() {
    let classified = ObjectBatch::from(mixed_batch()).classify();

    let namespaces: Vec<_> = classified
        .network_attachment_definitions
        .iter()
        .map(|nad| nad.namespace().unwrap_or_default())
        .collect();
    assert_eq!(namespaces, vec!["ns1", "ns2"]);
}

#[test]
fn test_nothing_lost_or_duplicated_regardless_of_order() {
    let forward = mixed_batch();
    let mut reversed = mixed_batch();
    reversed.reverse();

    // 8 top-level objects, one of which is a list of two attachment definitions
    let expected = forward.len() - 1 + 2;

    let a = ObjectBatch::from(forward).classify();
    let b = ObjectBatch::from_iter(reversed).classify();

    assert_eq!(a.total(), expected);
    assert_eq!(b.total(), expected);
    assert_eq!(a.core.len(), b.core.len());
    assert_eq!(
        a.network_attachment_definitions.len(),
        b.network_attachment_definitions.len()
    );
}

#[test]
fn test_unstructured_kind_name() {
    let resource = ApiResource::from_gvk(&GroupVersionKind::gvk("apps", "v1", "Deployment"));
    let object = ApiObject::Unstructured(DynamicObject::new("web", &resource));
    assert_eq!(object.kind(), "Deployment");
    assert_eq!(node("n").kind(), "Node");
}
