// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared watch factory.
//!
//! The factory relays change events from a [`ClientBundle`] to every controller that
//! subscribed. Startup is two-phase: [`WatchFactory::start`] spawns the relay, and
//! [`WatchFactory::start_delivery`] opens the gate so buffered and future events flow
//! to subscribers. Both phases and [`WatchFactory::shutdown`] are idempotent.

use crate::clients::ClientBundle;
use crate::constants::WATCH_CHANNEL_CAPACITY;
use kube::{Resource, ResourceExt};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// What happened to an object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchAction {
    Added,
    Updated,
    Deleted,
}

impl fmt::Display for WatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WatchAction::Added => "added",
            WatchAction::Updated => "updated",
            WatchAction::Deleted => "deleted",
        };
        f.write_str(s)
    }
}

/// A change to one object, keyed by `namespace/name` (or `name` when cluster-scoped).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: String,
    pub key: String,
    pub action: WatchAction,
}

impl WatchEvent {
    pub fn for_object<K: Resource<DynamicType = ()>>(object: &K, action: WatchAction) -> Self {
        let key = match object.namespace() {
            Some(ns) => format!("{ns}/{}", object.name_any()),
            None => object.name_any(),
        };
        Self {
            kind: K::kind(&()).to_string(),
            key,
            action,
        }
    }
}

/// Relays client change events to controllers.
pub struct WatchFactory {
    input: Mutex<Option<broadcast::Receiver<WatchEvent>>>,
    output: broadcast::Sender<WatchEvent>,
    delivery: CancellationToken,
    cancel: CancellationToken,
    tracker: TaskTracker,
    started: AtomicBool,
}

impl WatchFactory {
    /// Build a factory over `bundle`; writes made from now on are captured.
    #[must_use]
    pub fn new(bundle: &ClientBundle) -> Self {
        let (output, _) = broadcast::channel(WATCH_CHANNEL_CAPACITY);
        Self {
            input: Mutex::new(Some(bundle.subscribe())),
            output,
            delivery: CancellationToken::new(),
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
            started: AtomicBool::new(false),
        }
    }

    /// Spawn the relay task.
    ///
    /// Returns `false` if the factory was already started or has been shut down.
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> bool {
        if self.cancel.is_cancelled() || self.started.swap(true, Ordering::SeqCst) {
            return false;
        }
        let input = self
            .input
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(input) = input else {
            return false;
        };
        self.tracker.spawn(relay(
            input,
            self.output.clone(),
            self.delivery.clone(),
            self.cancel.clone(),
        ));
        info!("Watch factory started");
        true
    }

    /// Begin delivering events to subscribers.
    pub fn start_delivery(&self) {
        if !self.delivery.is_cancelled() {
            debug!("Watch delivery started");
            self.delivery.cancel();
        }
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_delivering(&self) -> bool {
        self.delivery.is_cancelled() && !self.cancel.is_cancelled()
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Receive relayed events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<WatchEvent> {
        self.output.subscribe()
    }

    /// Stop relaying and wait for the relay task to exit. Safe to call repeatedly.
    pub async fn shutdown(&self) {
        if !self.cancel.is_cancelled() {
            info!("Shutting down watch factory");
            self.cancel.cancel();
        }
        self.tracker.close();
        self.tracker.wait().await;
    }
}

async fn relay(
    mut input: broadcast::Receiver<WatchEvent>,
    output: broadcast::Sender<WatchEvent>,
    delivery: CancellationToken,
    cancel: CancellationToken,
) {
    tokio::select! {
        biased;
        () = cancel.cancelled() => return,
        () = delivery.cancelled() => {}
    }

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            received = input.recv() => match received {
                Ok(event) => {
                    // Controllers that already stopped have dropped their receivers
                    let _ = output.send(event);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Watch relay lagged behind client writes");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
    debug!("Watch relay exited");
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod watch_tests;
