// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the controller base types.

#[cfg(test)]
mod tests {
    use crate::address_set::AddressSetFactory;
    use crate::constants::ZONE_ANNOTATION;
    use crate::controller::{BaseNetworkController, StopSignal, ZoneNodes};
    use crate::test_support::{clients_with_nodes, harness_with_zone, info, node};
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;

    fn base(zone_aware: bool) -> (BaseNetworkController, Arc<crate::clients::ClientBundle>) {
        let harness = harness_with_zone("global");
        let clients = clients_with_nodes(&["node1"]);
        let base = BaseNetworkController::new(
            "net-a-network-controller",
            "net-a",
            info(&harness, clients.clone()),
            zone_aware,
            Arc::new(AddressSetFactory::new("net-a-network-controller")),
        );
        (base, clients)
    }

    async fn eventually(mut check: impl FnMut() -> bool) -> bool {
        for _ in 0..100 {
            if check() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[test]
    fn test_stop_signal_closes_once() {
        let signal = StopSignal::new();
        let stop = signal.stop_token();
        let ctx = signal.context_token();
        assert!(!signal.is_closed());

        assert!(signal.close());
        assert!(!signal.close());
        assert!(signal.is_closed());
        assert!(stop.is_cancelled());
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn test_zone_nodes_set() {
        let nodes = ZoneNodes::default();
        assert!(nodes.insert("b"));
        assert!(nodes.insert("a"));
        assert!(!nodes.insert("a"));
        assert_eq!(nodes.names(), vec!["a", "b"]);
        assert!(nodes.remove("a"));
        assert!(!nodes.contains("a"));
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_add_nad_records_names() {
        let (mut base, _) = base(true);
        assert!(base.add_nad("ns1/blue"));
        assert!(!base.add_nad("ns1/blue"));
        assert!(base.add_nad("ns2/blue"));
        assert!(base.has_nad("ns2/blue"));
        assert_eq!(base.nad_names(), vec!["ns1/blue", "ns2/blue"]);
    }

    #[tokio::test]
    async fn test_wait_returns_after_stop() {
        let (base, _) = base(true);
        base.start_worker();
        let stop = base.stop_signal().stop_token();
        base.spawn(async move { stop.cancelled().await });

        assert!(base.stop());
        assert!(!base.stop());
        tokio::time::timeout(Duration::from_secs(1), base.wait())
            .await
            .expect("tasks drain after stop");
    }

    #[tokio::test]
    async fn test_worker_tracks_node_membership() {
        let (base, clients) = base(true);
        let factory = base.info().watch_factory.clone();
        factory.start();
        base.start_worker();
        factory.start_delivery();

        let zone_nodes = base.zone_nodes().unwrap().clone();

        clients.core.nodes.apply(node("node2"));
        assert!(eventually(|| zone_nodes.contains("node2")).await);

        let mut remote = node("node3");
        remote.metadata.annotations = Some(BTreeMap::from([(
            ZONE_ANNOTATION.to_string(),
            "zone-b".to_string(),
        )]));
        clients.core.nodes.apply(remote);
        clients.core.nodes.delete("node2", None).unwrap();
        assert!(eventually(|| !zone_nodes.contains("node2")).await);
        assert!(!zone_nodes.contains("node3"));
        assert!(base.events_seen() >= 3);

        base.stop();
        base.wait().await;
        factory.shutdown().await;
    }

    #[tokio::test]
    async fn test_localnet_style_controller_has_no_zone_nodes() {
        let (base, _) = base(false);
        assert!(base.zone_nodes().is_none());
        base.start_worker();
        base.stop();
        base.wait().await;
    }
}
