// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

// Common test utilities for integration tests

#![allow(dead_code)]

use k8s_openapi::api::core::v1::Node;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use netplane::constants::{DEFAULT_CNI_VERSION, OVN_CNI_PLUGIN_TYPE};
use netplane::crd::{NetworkAttachmentDefinition, ResourceList};
use netplane::netconf::{new_network_attachment_definition, NetConf};
use netplane::objects::ApiObject;
use std::time::Duration;

/// Bound applied to every shutdown in these tests
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Build an overlay attachment definition `namespace/name` for `network`
pub fn test_nad(
    namespace: &str,
    name: &str,
    network: &str,
    topology: &str,
) -> NetworkAttachmentDefinition {
    let netconf = NetConf {
        cni_version: DEFAULT_CNI_VERSION.to_string(),
        name: network.to_string(),
        plugin_type: OVN_CNI_PLUGIN_TYPE.to_string(),
        topology: topology.to_string(),
        ..Default::default()
    };
    new_network_attachment_definition(namespace, name, &netconf)
        .expect("test netconf serializes")
}

/// Wrap attachment definitions in a list object, as a batch would carry them
pub fn nad_list(items: Vec<NetworkAttachmentDefinition>) -> ApiObject {
    ApiObject::NetworkAttachmentDefinitionList(ResourceList::new(items))
}

/// A bare node object
pub fn test_node(name: &str) -> ApiObject {
    ApiObject::Node(Node {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        ..Default::default()
    })
}
