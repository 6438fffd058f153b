// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for netplane.
//!
//! Errors are split by how the orchestrator reacts to them:
//! - [`ConfigError`] - bad attachment configuration or missing handles; fatal to a single
//!   build attempt, never retried, and never leaves a partial registry entry
//! - [`DatabaseError`] - failures of the northbound/southbound database clients; fatal to
//!   the setup step that hit them
//! - [`ClientError`] - lookups against the seeded API clients
//!
//! [`OrchestratorError`] wraps all of them for the public entry points.

use std::time::Duration;
use thiserror::Error;

/// Configuration errors raised while parsing attachment definitions or composing
/// controllers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Topology type outside the supported set (layer3, layer2, localnet)
    #[error("topology type '{topology}' not supported for network '{network}'")]
    UnsupportedTopology {
        /// The offending topology string
        topology: String,
        /// Network whose descriptor carried it
        network: String,
    },

    /// Attachment definition config could not be parsed or failed validation
    #[error("malformed network configuration in attachment definition '{nad}': {reason}")]
    MalformedNetConf {
        /// Attachment definition key (`namespace/name`)
        nad: String,
        /// What is wrong with it
        reason: String,
    },

    /// Attachment definition belongs to a different CNI plugin
    #[error("attachment definition '{nad}' is not managed by netplane (plugin type '{plugin}')")]
    ForeignPlugin {
        /// Attachment definition key (`namespace/name`)
        nad: String,
        /// The CNI plugin type found in the config
        plugin: String,
    },

    /// Secondary network tried to use a reserved network name
    #[error("attachment definition '{nad}' uses reserved network name '{name}'")]
    ReservedNetworkName {
        /// Attachment definition key (`namespace/name`)
        nad: String,
        /// The reserved name
        name: String,
    },

    /// A required handle was not supplied to the controller info composer
    #[error("cannot compose controller info: missing {handle}")]
    MissingHandle {
        /// Which handle was missing
        handle: &'static str,
    },

    /// Configuration file could not be read or parsed
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Parser or I/O error text
        reason: String,
    },
}

impl ConfigError {
    /// Whether this is the "unsupported topology" configuration condition.
    #[must_use]
    pub fn is_unsupported_topology(&self) -> bool {
        matches!(self, ConfigError::UnsupportedTopology { .. })
    }
}

/// Errors raised by the transactional database clients.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    /// Operation attempted on a closed client
    #[error("{db} database client is not connected")]
    NotConnected {
        /// Database name (NB or SB)
        db: String,
    },

    /// No `NB_Global` row exists, so the zone cannot be resolved
    #[error("failed to get NB_Global row from {db}: zone not found")]
    ZoneNotFound {
        /// Database name
        db: String,
    },

    /// An operation referenced a row that does not exist
    #[error("row {uuid} not found in {db}")]
    RowNotFound {
        /// Database name
        db: String,
        /// Row identifier
        uuid: String,
    },

    /// A transaction was rejected; nothing was applied
    #[error("transaction on {db} failed: {reason}")]
    TransactionFailed {
        /// Database name
        db: String,
        /// Why the transaction failed
        reason: String,
    },

    /// Timed out waiting for the client to reach the requested connection state
    #[error("timed out waiting for {db} client to become {state}")]
    StateTimeout {
        /// Database name
        db: String,
        /// Either "connected" or "disconnected"
        state: &'static str,
    },
}

/// Errors from the seeded API clients.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Object lookup failed
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// Object kind
        kind: String,
        /// Object name (or `namespace/name`)
        name: String,
    },
}

/// Umbrella error for the orchestrator entry points.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Database error
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// API client error
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Shutdown did not drain every task group in time
    #[error("shutdown did not complete within {timeout:?}; remaining tasks may leak")]
    ShutdownTimeout {
        /// The bound that was exceeded
        timeout: Duration,
    },
}

impl OrchestratorError {
    /// Returns the inner configuration error, if any.
    #[must_use]
    pub fn as_config(&self) -> Option<&ConfigError> {
        match self {
            OrchestratorError::Config(err) => Some(err),
            _ => None,
        }
    }
}

/// Result alias used by the orchestrator entry points.
pub type Result<T, E = OrchestratorError> = std::result::Result<T, E>;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
