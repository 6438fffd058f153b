// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `clients.rs`

#[cfg(test)]
mod tests {
    use crate::clients::ClientBundle;
    use crate::crd::{EgressIP, EgressIPSpec, EgressIPStatus, EgressIPStatusItem, ResourceList};
    use crate::errors::ClientError;
    use crate::objects::{ApiObject, ObjectBatch};
    use crate::watch::WatchAction;
    use k8s_openapi::api::core::v1::{Node, Pod};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use kube::api::{ApiResource, DynamicObject, GroupVersionKind};

    fn node(name: &str) -> Node {
        Node {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn bundle() -> ClientBundle {
        let cm = ApiResource::from_gvk(&GroupVersionKind::gvk("", "v1", "ConfigMap"));
        let batch: ObjectBatch = vec![
            ApiObject::Node(node("node1")),
            ApiObject::Node(node("node2")),
            ApiObject::EgressIpList(ResourceList::new(vec![EgressIP::new(
                "eip1",
                EgressIPSpec {
                    egress_ips: vec!["192.168.126.101".to_string()],
                    ..Default::default()
                },
            )])),
            ApiObject::Unstructured(DynamicObject::new("settings", &cm)),
        ]
        .into();
        ClientBundle::seed(&batch.classify())
    }

    #[test]
    fn test_seed_routes_objects_to_group_clients() {
        let bundle = bundle();
        assert_eq!(bundle.core.nodes.len(), 2);
        assert_eq!(bundle.egress_ips.len(), 1);
        assert!(bundle.egress_firewalls.is_empty());
        assert!(bundle.network_attachment_definitions.is_empty());
        assert_eq!(bundle.core.unstructured().len(), 1);
    }

    #[test]
    fn test_facade_get_nodes() {
        let kube = bundle().kube();
        let mut names: Vec<_> = kube
            .get_nodes()
            .unwrap()
            .iter()
            .filter_map(|n| n.metadata.name.clone())
            .collect();
        names.sort();
        assert_eq!(names, vec!["node1", "node2"]);
    }

    #[test]
    fn test_get_missing_egress_ip() {
        let err = bundle().kube().get_egress_ip("nope").unwrap_err();
        assert_eq!(
            err,
            ClientError::NotFound {
                kind: "EgressIP".to_string(),
                name: "nope".to_string()
            }
        );
    }

    #[test]
    fn test_update_egress_ip_status_replaces_items() {
        let kube = bundle().kube();
        let status = EgressIPStatus {
            items: vec![EgressIPStatusItem {
                node: "node1".to_string(),
                egress_ip: "192.168.126.101".to_string(),
            }],
        };
        kube.update_egress_ip_status("eip1", status.clone()).unwrap();

        let eip = kube.get_egress_ip("eip1").unwrap();
        assert_eq!(eip.status.as_ref(), Some(&status));
        // spec untouched
        assert_eq!(eip.spec.egress_ips, vec!["192.168.126.101"]);
    }

    #[test]
    fn test_writes_are_published_to_subscribers() {
        let bundle = bundle();
        let mut rx = bundle.subscribe();

        bundle.core.nodes.apply(node("node3"));
        bundle.core.nodes.apply(node("node3"));
        bundle.core.nodes.delete("node3", None).unwrap();

        let added = rx.try_recv().unwrap();
        assert_eq!(added.kind, "Node");
        assert_eq!(added.key, "node3");
        assert_eq!(added.action, WatchAction::Added);
        assert_eq!(rx.try_recv().unwrap().action, WatchAction::Updated);
        assert_eq!(rx.try_recv().unwrap().action, WatchAction::Deleted);
        assert!(bundle.core.nodes.get("node3", None).is_none());
    }

    #[test]
    fn test_namespaced_lookup_and_delete() {
        let bundle = bundle();
        let pod = Pod {
            metadata: ObjectMeta {
                name: Some("web".to_string()),
                namespace: Some("ns1".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        bundle.core.pods.apply(pod);

        assert!(bundle.core.pods.get("web", Some("ns1")).is_some());
        assert!(bundle.core.pods.get("web", Some("ns2")).is_none());

        let err = bundle.core.pods.delete("web", Some("ns2")).unwrap_err();
        assert_eq!(err.to_string(), "Pod 'ns2/web' not found");
        bundle.core.pods.delete("web", Some("ns1")).unwrap();
        assert!(bundle.core.pods.is_empty());
    }

    #[test]
    fn test_delete_missing_reports_resource_kind() {
        let bundle = bundle();
        let err = bundle
            .egress_firewalls
            .delete("default", Some("ns1"))
            .unwrap_err();
        assert_eq!(
            err,
            ClientError::NotFound {
                kind: "EgressFirewall".to_string(),
                name: "ns1/default".to_string(),
            }
        );
        assert_eq!(err.to_string(), "EgressFirewall 'ns1/default' not found");
    }
}
