// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for netplane.
//!
//! All metrics carry the `netplane_` prefix and are registered in
//! [`METRICS_REGISTRY`].
//!
//! # Metrics Categories
//!
//! - **Controller Metrics** - Controllers built per topology, attachments registered
//! - **Zone Metrics** - Zone records synthesized during composition
//! - **Lifecycle Metrics** - Shutdown duration
//! - **Pod Metrics** - Pod add to logical switch port latency, via [`PodRecorder`]
//!
//! # Example
//!
//! ```rust,no_run
//! use netplane::metrics::{record_controller_built, gather_metrics};
//!
//! record_controller_built("layer3");
//! let text = gather_metrics().unwrap();
//! assert!(text.contains("netplane_controllers_built_total"));
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex, PoisonError};
use std::time::{Duration, Instant};

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all netplane metrics
const METRICS_NAMESPACE: &str = "netplane";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Controller Metrics
// ============================================================================

/// Total number of controllers constructed
///
/// Labels:
/// - `topology`: `default`, `layer3`, `layer2` or `localnet`
pub static CONTROLLERS_BUILT_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_controllers_built_total"),
        "Total number of network controllers constructed by topology",
    );
    let counter = CounterVec::new(opts, &["topology"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of attachment definitions registered against a controller
///
/// Labels:
/// - `outcome`: `new_controller` or `existing_controller`
pub static ATTACHMENTS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_attachments_total"),
        "Total number of attachment definitions registered",
    );
    let counter = CounterVec::new(opts, &["outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Zone Metrics
// ============================================================================

/// Total number of zone records created because none existed
pub static ZONE_RECORDS_SYNTHESIZED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_zone_records_synthesized_total"),
        "Total number of NB_Global zone records synthesized during composition",
    );
    let counter = CounterVec::new(opts, &["zone"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Lifecycle Metrics
// ============================================================================

/// Duration of orchestrator shutdown in seconds
///
/// Labels:
/// - `outcome`: `complete` or `timeout`
pub static SHUTDOWN_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_shutdown_duration_seconds"),
        "Duration of orchestrator shutdown in seconds",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0]);
    let histogram = HistogramVec::new(opts, &["outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Pod Metrics
// ============================================================================

/// Latency between a pod being seen and its logical switch port being created
///
/// Labels:
/// - `network`: network the port was created on
pub static POD_LSP_LATENCY_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_pod_lsp_latency_seconds"),
        "Latency from pod add to logical switch port creation in seconds",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]);
    let histogram = HistogramVec::new(opts, &["network"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Record a constructed controller
///
/// # Arguments
/// * `topology` - Topology of the controller (`default` for the default network)
pub fn record_controller_built(topology: &str) {
    CONTROLLERS_BUILT_TOTAL.with_label_values(&[topology]).inc();
}

/// Record an attachment definition registration
///
/// # Arguments
/// * `new_controller` - Whether the registration constructed a new controller
pub fn record_attachment(new_controller: bool) {
    let outcome = if new_controller {
        "new_controller"
    } else {
        "existing_controller"
    };
    ATTACHMENTS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Record a synthesized zone record
pub fn record_zone_synthesized(zone: &str) {
    ZONE_RECORDS_SYNTHESIZED_TOTAL
        .with_label_values(&[zone])
        .inc();
}

/// Record how long shutdown took
///
/// # Arguments
/// * `duration` - Elapsed shutdown time
/// * `timed_out` - Whether the bounded wait expired first
pub fn record_shutdown(duration: Duration, timed_out: bool) {
    let outcome = if timed_out { "timeout" } else { "complete" };
    SHUTDOWN_DURATION_SECONDS
        .with_label_values(&[outcome])
        .observe(duration.as_secs_f64());
}

/// Tracks pod add to logical switch port latency for one network.
#[derive(Debug)]
pub struct PodRecorder {
    network: String,
    pending: Mutex<HashMap<String, Instant>>,
}

impl PodRecorder {
    #[must_use]
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Start timing a pod. Re-adding a pod keeps the original start time.
    pub fn add_pod(&self, uid: &str) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(uid.to_string())
            .or_insert_with(Instant::now);
    }

    /// Stop timing a pod and record the latency, if it was being timed.
    pub fn add_lsp(&self, uid: &str) -> Option<Duration> {
        let started = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(uid)?;
        let latency = started.elapsed();
        POD_LSP_LATENCY_SECONDS
            .with_label_values(&[self.network.as_str()])
            .observe(latency.as_secs_f64());
        Some(latency)
    }

    /// Forget a pod without recording anything.
    pub fn clean_pod(&self, uid: &str) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(uid);
    }

    /// Number of pods still waiting for a port.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_controller_built() {
        record_controller_built("test-topology");
        let counter = CONTROLLERS_BUILT_TOTAL.with_label_values(&["test-topology"]);
        assert!(counter.get() > 0.0);
    }

    #[test]
    fn test_record_shutdown() {
        record_shutdown(Duration::from_millis(5), false);
        let histogram = SHUTDOWN_DURATION_SECONDS.with_label_values(&["complete"]);
        assert!(histogram.get_sample_count() > 0);
    }

    #[test]
    fn test_pod_recorder_latency() {
        let recorder = PodRecorder::new("pod-recorder-test");
        recorder.add_pod("uid-1");
        recorder.add_pod("uid-2");
        assert_eq!(recorder.pending(), 2);

        assert!(recorder.add_lsp("uid-1").is_some());
        assert!(recorder.add_lsp("uid-1").is_none());
        recorder.clean_pod("uid-2");
        assert_eq!(recorder.pending(), 0);

        let histogram = POD_LSP_LATENCY_SECONDS.with_label_values(&["pod-recorder-test"]);
        assert_eq!(histogram.get_sample_count(), 1);
    }

    #[test]
    fn test_gather_metrics() {
        record_attachment(true);
        record_zone_synthesized("gather-test");

        let metrics_text = gather_metrics().unwrap();
        assert!(metrics_text.contains("netplane_attachments_total"));
        assert!(metrics_text.contains("netplane_zone_records_synthesized_total"));
    }
}
