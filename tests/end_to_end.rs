// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! End-to-end tests for the orchestrator
//!
//! These drive the public entry points only: start from an object batch, register
//! attachment definitions, inspect the registry and databases, shut down.
//!
//! Run with: cargo test --test end_to_end

mod common;

use common::{nad_list, test_nad, test_node, SHUTDOWN_TIMEOUT};
use netplane::config::OrchestratorConfig;
use netplane::netconf::TopologyType;
use netplane::objects::ObjectBatch;
use netplane::orchestrator::Orchestrator;
use netplane::ovsdb::{DbClient, Table};
use netplane::registry::Registration;

#[tokio::test]
async fn test_attachment_lifecycle_scenario() {
    // Empty batch, no zone record in the database
    let mut orchestrator = Orchestrator::start(ObjectBatch::new(), OrchestratorConfig::default())
        .await
        .expect("orchestrator starts");

    let default = orchestrator.default_controller();
    assert_eq!(default.base.network_name(), "default");
    assert_eq!(default.base.zone_nodes().map(|n| n.len()), Some(0));
    assert_eq!(
        orchestrator
            .nb_client()
            .list(Table::NbGlobal)
            .expect("list zone rows")
            .len(),
        0
    );

    let outcome = orchestrator
        .add_network_attachment(&test_nad("ns1", "blue", "net-a", "layer3"))
        .await
        .expect("layer3 attachment registers");
    assert_eq!(outcome, Registration::Created);
    assert_eq!(orchestrator.registry().len(), 1);

    let outcome = orchestrator
        .add_network_attachment(&test_nad("ns2", "blue", "net-a", "layer3"))
        .await
        .expect("second attachment registers");
    assert_eq!(outcome, Registration::Attached);
    assert_eq!(orchestrator.registry().len(), 1);
    assert!(orchestrator.registry().find_by_nad("ns1/blue").is_some());
    assert!(orchestrator.registry().find_by_nad("ns2/blue").is_some());

    let err = orchestrator
        .add_network_attachment(&test_nad("ns1", "green", "net-b", "unsupported-type"))
        .await
        .expect_err("unknown topology is rejected");
    let config_err = err.as_config().expect("configuration error");
    assert!(config_err.is_unsupported_topology());
    assert!(err.to_string().contains("unsupported-type"));
    assert_eq!(orchestrator.registry().len(), 1);

    orchestrator
        .shutdown_with_timeout(SHUTDOWN_TIMEOUT)
        .await
        .expect("shutdown completes");
    orchestrator
        .shutdown_with_timeout(SHUTDOWN_TIMEOUT)
        .await
        .expect("second shutdown is a no-op");
    assert!(orchestrator.watch_factory().is_shut_down());
}

#[tokio::test]
async fn test_batch_seeded_networks_share_node_snapshot() {
    let batch: ObjectBatch = vec![
        test_node("node1"),
        nad_list(vec![
            test_nad("ns1", "blue", "net-a", "layer3"),
            test_nad("ns1", "green", "net-b", "layer2"),
        ]),
        nad_list(vec![test_nad("ns2", "blue", "net-a", "layer3")]),
    ]
    .into();

    let mut orchestrator = Orchestrator::start(batch, OrchestratorConfig::default())
        .await
        .expect("orchestrator starts");

    assert_eq!(orchestrator.network_names(), vec!["net-a", "net-b"]);
    for (network, topology) in [("net-a", TopologyType::Layer3), ("net-b", TopologyType::Layer2)] {
        let controller = orchestrator
            .secondary_controller(network)
            .expect("controller registered");
        assert_eq!(controller.topology(), topology);
        assert!(controller
            .base()
            .zone_nodes()
            .is_some_and(|nodes| nodes.contains("node1")));
    }

    let a = orchestrator.registry().address_sets("net-a").expect("net-a factory");
    let b = orchestrator.registry().address_sets("net-b").expect("net-b factory");
    assert_ne!(a.ensure("ns1", &[]).name, b.ensure("ns1", &[]).name);

    orchestrator.shutdown().await;
    assert!(!orchestrator.nb_client().connected());
}
