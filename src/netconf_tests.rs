// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `netconf.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{NetworkAttachmentDefinition, NetworkAttachmentDefinitionSpec};
    use crate::errors::ConfigError;
    use crate::netconf::*;

    fn netconf(name: &str, topology: &str) -> NetConf {
        NetConf {
            cni_version: "1.0.0".to_string(),
            name: name.to_string(),
            plugin_type: "ovn-k8s-cni-overlay".to_string(),
            topology: topology.to_string(),
            ..Default::default()
        }
    }

    fn raw_nad(config: &str) -> NetworkAttachmentDefinition {
        let mut nad = NetworkAttachmentDefinition::new(
            "blue",
            NetworkAttachmentDefinitionSpec {
                config: config.to_string(),
            },
        );
        nad.metadata.namespace = Some("ns1".to_string());
        nad
    }

    #[test]
    fn test_nad_name() {
        assert_eq!(nad_name("ns1", "blue"), "ns1/blue");
    }

    #[test]
    fn test_parse_round_trip_through_constructor() {
        let nad = new_network_attachment_definition("ns1", "blue", &netconf("net-a", "layer3"))
            .unwrap();
        let desc = parse_nad(&nad).unwrap();

        assert_eq!(desc.network_name, "net-a");
        assert_eq!(desc.nad_name, "ns1/blue");
        assert_eq!(desc.topology, "layer3");
        assert_eq!(desc.topology_type().unwrap(), TopologyType::Layer3);
        // filled in from the object when absent
        assert_eq!(desc.netconf.net_attach_def_name, "ns1/blue");
    }

    #[test]
    fn test_wire_field_names() {
        let mut conf = netconf("net-a", "localnet");
        conf.vlan_id = Some(20);
        conf.net_attach_def_name = "ns1/blue".to_string();
        let value = serde_json::to_value(&conf).unwrap();
        assert_eq!(value["type"], "ovn-k8s-cni-overlay");
        assert_eq!(value["cniVersion"], "1.0.0");
        assert_eq!(value["vlanID"], 20);
        assert_eq!(value["netAttachDefName"], "ns1/blue");
        assert!(value.get("mtu").is_none());
    }

    #[test]
    fn test_unknown_topology_parses_but_does_not_resolve() {
        let nad = new_network_attachment_definition(
            "ns1",
            "blue",
            &netconf("net-b", "unsupported-type"),
        )
        .unwrap();
        let desc = parse_nad(&nad).unwrap();
        let err = desc.topology_type().unwrap_err();

        assert!(err.is_unsupported_topology());
        assert_eq!(
            err.to_string(),
            "topology type 'unsupported-type' not supported for network 'net-b'"
        );
    }

    #[test]
    fn test_invalid_json() {
        let err = parse_nad(&raw_nad("{not json")).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedNetConf { ref nad, .. } if nad == "ns1/blue"));
    }

    #[test]
    fn test_foreign_plugin() {
        let err = parse_nad(&raw_nad(r#"{"name":"net-a","type":"bridge"}"#)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::ForeignPlugin {
                nad: "ns1/blue".to_string(),
                plugin: "bridge".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_and_reserved_names() {
        let empty = new_network_attachment_definition("ns1", "blue", &netconf("", "layer3"))
            .unwrap();
        assert!(matches!(
            parse_nad(&empty).unwrap_err(),
            ConfigError::MalformedNetConf { .. }
        ));

        let reserved =
            new_network_attachment_definition("ns1", "blue", &netconf("default", "layer3"))
                .unwrap();
        assert!(matches!(
            parse_nad(&reserved).unwrap_err(),
            ConfigError::ReservedNetworkName { .. }
        ));
    }

    #[test]
    fn test_missing_topology() {
        let nad = new_network_attachment_definition("ns1", "blue", &netconf("net-a", "")).unwrap();
        let err = parse_nad(&nad).unwrap_err();
        assert!(err.to_string().contains("topology is not set"));
    }

    #[test]
    fn test_mismatched_nad_name() {
        let mut conf = netconf("net-a", "layer2");
        conf.net_attach_def_name = "ns2/blue".to_string();
        let nad = new_network_attachment_definition("ns1", "blue", &conf).unwrap();
        let err = parse_nad(&nad).unwrap_err();
        assert!(err.to_string().contains("ns2/blue"));
    }

    #[test]
    fn test_vlan_only_on_localnet() {
        let mut conf = netconf("net-a", "layer2");
        conf.vlan_id = Some(10);
        let nad = new_network_attachment_definition("ns1", "blue", &conf).unwrap();
        assert!(parse_nad(&nad).is_err());

        conf.topology = "localnet".to_string();
        let nad = new_network_attachment_definition("ns1", "blue", &conf).unwrap();
        let desc = parse_nad(&nad).unwrap();
        assert_eq!(desc.topology_type().unwrap(), TopologyType::Localnet);
        assert_eq!(desc.netconf.vlan_id, Some(10));
    }

    #[test]
    fn test_topology_type_properties() {
        assert!(TopologyType::Layer3.is_zone_aware());
        assert!(TopologyType::Layer2.is_zone_aware());
        assert!(!TopologyType::Localnet.is_zone_aware());
        assert_eq!(TopologyType::Layer2.to_string(), "layer2");
        assert_eq!("localnet".parse::<TopologyType>(), Ok(TopologyType::Localnet));
    }
}
