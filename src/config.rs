// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Orchestrator configuration.
//!
//! Every field has a default, so an empty YAML document (or no file at all) yields a
//! working configuration.
//!
//! ```yaml
//! zone: global
//! features:
//!   sctp: false
//!   multicast: false
//!   templates: true
//! enableMulticast: true
//! recorderCapacity: 10
//! shutdownTimeoutSecs: 30
//! loadBalancerGroups:
//!   cluster: my-cluster-lb-group
//! ```

use crate::constants::{
    CLUSTER_LB_GROUP_NAME, CLUSTER_ROUTER_LB_GROUP_NAME, CLUSTER_SWITCH_LB_GROUP_NAME,
    CONFIG_PATH_ENV, DEFAULT_RECORDER_CAPACITY, DEFAULT_SHUTDOWN_TIMEOUT_SECS, DEFAULT_ZONE,
    LB_GROUP_UUID_SUFFIX,
};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Feature flags handed to every controller through its common info bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureFlags {
    /// SCTP load balancer support
    pub sctp: bool,
    /// Multicast support
    pub multicast: bool,
    /// Load balancer template support
    pub templates: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            sctp: false,
            multicast: false,
            templates: true,
        }
    }
}

/// Load balancer group identifier overrides.
///
/// Unset entries fall back to `<group name>-UUID`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadBalancerGroups {
    pub cluster: Option<String>,
    pub switch: Option<String>,
    pub router: Option<String>,
}

/// Top-level orchestrator configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrchestratorConfig {
    /// Zone name written into a synthesized `NB_Global` row
    pub zone: String,
    /// Feature flags passed to controller composition
    pub features: FeatureFlags,
    /// Multicast override applied to the default controller after construction
    pub enable_multicast: bool,
    /// Buffer size of the event recorder
    pub recorder_capacity: usize,
    /// Bound used by [`crate::orchestrator::Orchestrator::shutdown_with_timeout`]
    pub shutdown_timeout_secs: u64,
    /// Load balancer group overrides applied to the default controller
    pub load_balancer_groups: LoadBalancerGroups,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            zone: DEFAULT_ZONE.to_string(),
            features: FeatureFlags::default(),
            enable_multicast: false,
            recorder_capacity: DEFAULT_RECORDER_CAPACITY,
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            load_balancer_groups: LoadBalancerGroups::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Parse a configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfig`] if the YAML cannot be parsed.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::InvalidConfig {
            reason: e.to_string(),
        })
    }

    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfig`] if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading orchestrator configuration");
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidConfig {
            reason: format!("{}: {e}", path.display()),
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Load the file named by `NETPLANE_CONFIG`, or the defaults when it is unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfig`] if the named file is unreadable or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.is_empty() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Post-construction overrides for the default controller.
    #[must_use]
    pub fn controller_overrides(&self) -> ControllerOverrides {
        let uuid_for = |name: &str| format!("{name}{LB_GROUP_UUID_SUFFIX}");
        let groups = &self.load_balancer_groups;
        ControllerOverrides {
            multicast_support: self.enable_multicast,
            cluster_lb_group_uuid: groups
                .cluster
                .clone()
                .unwrap_or_else(|| uuid_for(CLUSTER_LB_GROUP_NAME)),
            switch_lb_group_uuid: groups
                .switch
                .clone()
                .unwrap_or_else(|| uuid_for(CLUSTER_SWITCH_LB_GROUP_NAME)),
            router_lb_group_uuid: groups
                .router
                .clone()
                .unwrap_or_else(|| uuid_for(CLUSTER_ROUTER_LB_GROUP_NAME)),
        }
    }
}

/// Values written onto the default controller after it has been constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControllerOverrides {
    pub multicast_support: bool,
    pub cluster_lb_group_uuid: String,
    pub switch_lb_group_uuid: String,
    pub router_lb_group_uuid: String,
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
