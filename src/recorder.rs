// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Event recording for network controllers.
//!
//! Controllers emit Kubernetes-style events through the [`EventRecorder`] trait.
//! Recording is fire-and-forget: a dropped event is logged, never returned as an
//! error. [`FakeRecorder`] buffers formatted events in a bounded channel so tests can
//! assert on them.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::EventType;
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::warn;

/// Publishes events about cluster objects.
#[async_trait]
pub trait EventRecorder: Send + Sync {
    /// Record an event on `object`.
    ///
    /// # Arguments
    ///
    /// * `object` - The object this event is about
    /// * `type_` - Normal or Warning
    /// * `reason` - Machine-readable reason (e.g. `ErrorReconcilingNode`)
    /// * `note` - Human-readable message
    async fn publish(&self, object: &ObjectReference, type_: EventType, reason: &str, note: &str);
}

/// Bounded in-memory recorder.
///
/// Events are stored as `"<Type> <Reason> <note>"`. Once `capacity` events are
/// buffered, further events are dropped with a warning.
pub struct FakeRecorder {
    tx: mpsc::Sender<String>,
    rx: Mutex<mpsc::Receiver<String>>,
}

impl FakeRecorder {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// Take every buffered event, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<String> {
        let mut rx = self.rx.lock().unwrap_or_else(PoisonError::into_inner);
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }
}

#[async_trait]
impl EventRecorder for FakeRecorder {
    async fn publish(&self, object: &ObjectReference, type_: EventType, reason: &str, note: &str) {
        let type_name = match type_ {
            EventType::Normal => "Normal",
            EventType::Warning => "Warning",
        };
        let event = format!("{type_name} {reason} {note}");
        if self.tx.try_send(event).is_err() {
            warn!(
                object = object.name.as_deref().unwrap_or_default(),
                reason,
                "Event recorder full, dropping event"
            );
        }
    }
}
