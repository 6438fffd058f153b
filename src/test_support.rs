// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Fixtures shared by unit tests.

use crate::clients::ClientBundle;
use crate::constants::{DEFAULT_CNI_VERSION, OVN_CNI_PLUGIN_TYPE};
use crate::context::CommonControllerInfo;
use crate::crd::NetworkAttachmentDefinition;
use crate::metrics::PodRecorder;
use crate::netconf::{new_network_attachment_definition, parse_nad, NetConf, NetworkDescriptor};
use crate::objects::{ApiObject, ObjectBatch};
use crate::ovsdb::{NbGlobal, NbSbHarness, Row, TestSetup};
use crate::recorder::FakeRecorder;
use crate::watch::WatchFactory;
use k8s_openapi::api::core::v1::Node;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::sync::Arc;

pub(crate) fn node(name: &str) -> Node {
    Node {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub(crate) fn harness_with_zone(zone: &str) -> NbSbHarness {
    NbSbHarness::start(TestSetup {
        nb_data: vec![Row::NbGlobal(NbGlobal {
            name: zone.to_string(),
            ..Default::default()
        })],
        ..Default::default()
    })
}

/// Client bundle seeded with the named nodes.
pub(crate) fn clients_with_nodes(nodes: &[&str]) -> Arc<ClientBundle> {
    let batch: ObjectBatch = nodes.iter().map(|n| ApiObject::Node(node(n))).collect();
    Arc::new(ClientBundle::seed(&batch.classify()))
}

/// Info composed over `clients` and `harness`, with a fresh watch factory.
pub(crate) fn info(harness: &NbSbHarness, clients: Arc<ClientBundle>) -> CommonControllerInfo {
    CommonControllerInfo::builder()
        .watch_factory(Arc::new(WatchFactory::new(&clients)))
        .clients(clients)
        .recorder(Arc::new(FakeRecorder::new(10)))
        .nb_client(harness.nb.clone())
        .sb_client(harness.sb.clone())
        .pod_recorder(Arc::new(PodRecorder::new("test")))
        .build()
        .expect("test info composes")
}

pub(crate) fn nad(
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
    new_network_attachment_definition(namespace, name, &netconf).expect("netconf serializes")
}

pub(crate) fn descriptor(network: &str, topology: &str) -> NetworkDescriptor {
    parse_nad(&nad("ns1", network, network, topology)).expect("descriptor parses")
}
