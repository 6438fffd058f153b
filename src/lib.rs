// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # Netplane - network controller bootstrap and lifecycle
//!
//! Netplane brings up one controller per cluster network (the default network plus
//! one per secondary network named by attachment definitions), wires each to a
//! shared set of API clients and northbound/southbound database handles, and tears
//! the whole graph down in a fixed order.
//!
//! ## Overview
//!
//! - Classifying a heterogeneous object batch into typed buckets
//! - Seeding typed API clients and a watch factory from those buckets
//! - Resolving the cluster zone record, synthesizing and releasing it when absent
//! - Dispatching attachment definitions to Layer3, Layer2 or Localnet controllers
//! - Ordered startup and shutdown with task tracking per controller
//!
//! ## Modules
//!
//! - [`objects`] - Object batch classification
//! - [`clients`] - Seeded API clients and the combined facade
//! - [`watch`] - Watch factory relaying client events to controllers
//! - [`ovsdb`] - Database client trait, in-memory database and harness
//! - [`zone`] - Zone record resolution
//! - [`context`] - Shared controller handle bundle
//! - [`controller`] - Default and secondary network controllers
//! - [`registry`] - Secondary controllers keyed by network name
//! - [`orchestrator`] - Startup and shutdown of the whole graph
//!
//! ## Example
//!
//! ```rust,no_run
//! use netplane::config::OrchestratorConfig;
//! use netplane::objects::ObjectBatch;
//! use netplane::orchestrator::Orchestrator;
//!
//! # async fn run() -> Result<(), netplane::errors::OrchestratorError> {
//! let mut orchestrator = Orchestrator::start(ObjectBatch::new(), OrchestratorConfig::default()).await?;
//! assert!(orchestrator.network_names().is_empty());
//! orchestrator.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod address_set;
pub mod clients;
pub mod config;
pub mod constants;
pub mod context;
pub mod controller;
pub mod crd;
pub mod errors;
pub mod metrics;
pub mod netconf;
pub mod objects;
pub mod orchestrator;
pub mod ovsdb;
pub mod recorder;
pub mod registry;
pub mod watch;
pub mod zone;

#[cfg(test)]
pub(crate) mod test_support;
