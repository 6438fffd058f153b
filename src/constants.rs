// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for netplane.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Network Constants
// ============================================================================

/// Name of the default (cluster) network
pub const DEFAULT_NETWORK_NAME: &str = "default";

/// Name of the controller owning the default network
pub const DEFAULT_NETWORK_CONTROLLER_NAME: &str = "default-network-controller";

/// Suffix appended to a secondary network name to form its controller name
pub const SECONDARY_CONTROLLER_SUFFIX: &str = "-network-controller";

/// CNI plugin type that marks an attachment definition as managed by us
pub const OVN_CNI_PLUGIN_TYPE: &str = "ovn-k8s-cni-overlay";

/// CNI spec version written into generated attachment definitions
pub const DEFAULT_CNI_VERSION: &str = "1.0.0";

/// Topology name for routed secondary networks
pub const LAYER3_TOPOLOGY: &str = "layer3";

/// Topology name for switched secondary networks
pub const LAYER2_TOPOLOGY: &str = "layer2";

/// Topology name for localnet passthrough secondary networks
pub const LOCALNET_TOPOLOGY: &str = "localnet";

// ============================================================================
// Zone Constants
// ============================================================================

/// Zone name used when the `NB_Global` row carries no explicit name
pub const DEFAULT_ZONE: &str = "global";

/// Node annotation naming the zone a node belongs to
pub const ZONE_ANNOTATION: &str = "k8s.ovn.org/zone";

// ============================================================================
// Load Balancer Group Constants
// ============================================================================

/// Cluster-wide load balancer group name
pub const CLUSTER_LB_GROUP_NAME: &str = "clusterLBGroup";

/// Load balancer group attached to node switches
pub const CLUSTER_SWITCH_LB_GROUP_NAME: &str = "clusterSwitchLBGroup";

/// Load balancer group attached to gateway routers
pub const CLUSTER_ROUTER_LB_GROUP_NAME: &str = "clusterRouterLBGroup";

/// Suffix used to synthesize a load balancer group identifier from its name
pub const LB_GROUP_UUID_SUFFIX: &str = "-UUID";

// ============================================================================
// Lifecycle Constants
// ============================================================================

/// Default buffer size of the fake event recorder
pub const DEFAULT_RECORDER_CAPACITY: usize = 10;

/// Default bound on the whole shutdown sequence (seconds)
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Capacity of the watch event broadcast channels
pub const WATCH_CHANNEL_CAPACITY: usize = 256;

/// Poll interval used while waiting for a database client to change state (milliseconds)
pub const DB_STATE_POLL_INTERVAL_MILLIS: u64 = 10;

/// Maximum time to wait for a database client to change state (seconds)
pub const DB_STATE_WAIT_TIMEOUT_SECS: u64 = 5;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "NETPLANE_CONFIG";
