// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Paired northbound/southbound clients with a shared cleanup handle.

use super::{DbClient, MemoryDb, Row};
use crate::constants::{DB_STATE_POLL_INTERVAL_MILLIS, DB_STATE_WAIT_TIMEOUT_SECS};
use crate::errors::DatabaseError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const NB_DB_NAME: &str = "OVN_Northbound";
pub const SB_DB_NAME: &str = "OVN_Southbound";

/// Initial contents of both databases.
#[derive(Clone, Debug, Default)]
pub struct TestSetup {
    pub nb_data: Vec<Row>,
    pub sb_data: Vec<Row>,
}

/// Closes the harness clients. Runs at most once, however often it is called.
#[derive(Debug)]
pub struct HarnessCleanup {
    clients: Vec<Arc<MemoryDb>>,
    done: AtomicBool,
}

impl HarnessCleanup {
    pub fn cleanup(&self) {
        if self.done.swap(true, Ordering::SeqCst) {
            return;
        }
        for client in &self.clients {
            client.close();
        }
        info!("Database harness cleaned up");
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }
}

/// Connected NB and SB clients seeded from a [`TestSetup`].
#[derive(Debug)]
pub struct NbSbHarness {
    pub nb: Arc<MemoryDb>,
    pub sb: Arc<MemoryDb>,
    pub cleanup: HarnessCleanup,
}

impl NbSbHarness {
    #[must_use]
    pub fn start(setup: TestSetup) -> Self {
        let nb = Arc::new(MemoryDb::with_rows(NB_DB_NAME, setup.nb_data));
        let sb = Arc::new(MemoryDb::with_rows(SB_DB_NAME, setup.sb_data));
        debug!(
            nb_rows = nb.row_count(),
            sb_rows = sb.row_count(),
            "Started database harness"
        );
        Self {
            cleanup: HarnessCleanup {
                clients: vec![nb.clone(), sb.clone()],
                done: AtomicBool::new(false),
            },
            nb,
            sb,
        }
    }
}

async fn wait_for_state(
    client: &dyn DbClient,
    connected: bool,
    state: &'static str,
) -> Result<(), DatabaseError> {
    let poll = async {
        while client.connected() != connected {
            tokio::time::sleep(Duration::from_millis(DB_STATE_POLL_INTERVAL_MILLIS)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(DB_STATE_WAIT_TIMEOUT_SECS), poll)
        .await
        .map_err(|_| DatabaseError::StateTimeout {
            db: client.name().to_string(),
            state,
        })
}

/// Drop and re-establish a client's connection.
///
/// # Errors
///
/// Returns [`DatabaseError::StateTimeout`] if the client does not reach the expected
/// state in time, or the error from [`DbClient::connect`].
pub async fn reset_client(client: &dyn DbClient) -> Result<(), DatabaseError> {
    if client.connected() {
        client.close();
    }
    wait_for_state(client, false, "disconnected").await?;
    client.connect().await?;
    wait_for_state(client, true, "connected").await?;
    debug!(db = %client.name(), "Database client reset");
    Ok(())
}

#[cfg(test)]
#[path = "harness_tests.rs"]
mod harness_tests;
