// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `config.rs`

#[cfg(test)]
mod tests {
    use crate::config::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.zone, "global");
        assert_eq!(config.recorder_capacity, 10);
        assert!(!config.enable_multicast);
        assert_eq!(
            config.features,
            FeatureFlags {
                sctp: false,
                multicast: false,
                templates: true,
            }
        );
    }

    #[test]
    fn test_empty_yaml_yields_defaults() {
        let config = OrchestratorConfig::from_yaml_str("").unwrap();
        assert_eq!(config, OrchestratorConfig::default());
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let yaml = r"
zone: zone-a
enableMulticast: true
features:
  sctp: true
";
        let config = OrchestratorConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.zone, "zone-a");
        assert!(config.enable_multicast);
        assert!(config.features.sctp);
        assert!(config.features.templates);
        assert_eq!(config.shutdown_timeout_secs, 30);
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = OrchestratorConfig::from_yaml_str("zone: [unterminated").unwrap_err();
        assert!(matches!(err, crate::errors::ConfigError::InvalidConfig { .. }));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "recorderCapacity: 3").unwrap();

        let config = OrchestratorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.recorder_capacity, 3);
    }

    #[test]
    fn test_from_missing_file_is_error() {
        let err = OrchestratorConfig::from_file("/nonexistent/netplane.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/netplane.yaml"));
    }

    #[test]
    fn test_default_overrides_use_group_names() {
        let overrides = OrchestratorConfig::default().controller_overrides();
        assert_eq!(overrides.cluster_lb_group_uuid, "clusterLBGroup-UUID");
        assert_eq!(overrides.switch_lb_group_uuid, "clusterSwitchLBGroup-UUID");
        assert_eq!(overrides.router_lb_group_uuid, "clusterRouterLBGroup-UUID");
        assert!(!overrides.multicast_support);
    }

    #[test]
    fn test_explicit_overrides_win() {
        let config = OrchestratorConfig {
            enable_multicast: true,
            load_balancer_groups: LoadBalancerGroups {
                cluster: Some("lbg-1".to_string()),
                switch: None,
                router: None,
            },
            ..Default::default()
        };
        let overrides = config.controller_overrides();
        assert_eq!(overrides.cluster_lb_group_uuid, "lbg-1");
        assert_eq!(overrides.switch_lb_group_uuid, "clusterSwitchLBGroup-UUID");
        assert!(overrides.multicast_support);
    }
}
