// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory [`DbClient`].
//!
//! Rows live in a map keyed by uuid. A transaction is applied to a copy of the map
//! and swapped in only if every operation succeeds, so a failed transaction leaves
//! no partial state behind.

use super::{DbClient, Operation, Row, RowPredicate, Table};
use crate::errors::DatabaseError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// In-memory transactional database.
#[derive(Debug)]
pub struct MemoryDb {
    name: String,
    rows: Mutex<BTreeMap<String, Row>>,
    connected: AtomicBool,
    next_uuid: AtomicU64,
    injected_failure: Mutex<Option<String>>,
}

impl MemoryDb {
    /// A connected, empty database.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Mutex::new(BTreeMap::new()),
            connected: AtomicBool::new(true),
            next_uuid: AtomicU64::new(1),
            injected_failure: Mutex::new(None),
        }
    }

    /// A connected database preloaded with `rows`; rows without a uuid get one.
    #[must_use]
    pub fn with_rows(name: impl Into<String>, rows: impl IntoIterator<Item = Row>) -> Self {
        let db = Self::new(name);
        {
            let mut table = db.lock_rows();
            for mut row in rows {
                if row.uuid().is_empty() {
                    row.set_uuid(db.allocate_uuid());
                }
                table.insert(row.uuid().to_string(), row);
            }
        }
        db
    }

    /// Make the next [`DbClient::transact`] fail with `reason`.
    pub fn fail_next_transact(&self, reason: impl Into<String>) {
        *self
            .injected_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(reason.into());
    }

    /// Total number of rows across all tables.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.lock_rows().len()
    }

    fn lock_rows(&self) -> MutexGuard<'_, BTreeMap<String, Row>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn allocate_uuid(&self) -> String {
        let n = self.next_uuid.fetch_add(1, Ordering::SeqCst);
        format!("{:08x}-0000-4000-8000-{n:012x}", name_prefix(&self.name))
    }

    fn ensure_connected(&self) -> Result<(), DatabaseError> {
        if self.connected() {
            Ok(())
        } else {
            Err(DatabaseError::NotConnected {
                db: self.name.clone(),
            })
        }
    }

    fn failed(&self, reason: impl Into<String>) -> DatabaseError {
        DatabaseError::TransactionFailed {
            db: self.name.clone(),
            reason: reason.into(),
        }
    }

    fn apply(
        &self,
        staged: &mut BTreeMap<String, Row>,
        op: Operation,
        inserted: &mut Vec<String>,
    ) -> Result<(), DatabaseError> {
        match op {
            Operation::Insert(mut row) => {
                if row.uuid().is_empty() {
                    row.set_uuid(self.allocate_uuid());
                }
                let uuid = row.uuid().to_string();
                if staged.contains_key(&uuid) {
                    return Err(self.failed(format!("duplicate uuid {uuid}")));
                }
                staged.insert(uuid.clone(), row);
                inserted.push(uuid);
            }
            Operation::Update(row) => {
                let slot = staged
                    .get_mut(row.uuid())
                    .ok_or_else(|| DatabaseError::RowNotFound {
                        db: self.name.clone(),
                        uuid: row.uuid().to_string(),
                    })?;
                if slot.table() != row.table() {
                    return Err(self.failed(format!(
                        "row {} belongs to {}, not {}",
                        row.uuid(),
                        slot.table(),
                        row.table()
                    )));
                }
                *slot = row;
            }
            Operation::Delete { table, uuid } => match staged.get(&uuid) {
                Some(row) if row.table() == table => {
                    staged.remove(&uuid);
                }
                _ => {
                    return Err(DatabaseError::RowNotFound {
                        db: self.name.clone(),
                        uuid,
                    })
                }
            },
        }
        Ok(())
    }

    fn check_limits(&self, staged: &BTreeMap<String, Row>) -> Result<(), DatabaseError> {
        for table in [
            Table::NbGlobal,
            Table::LoadBalancerGroup,
            Table::AddressSet,
            Table::Chassis,
        ] {
            if let Some(max) = table.max_rows() {
                let count = staged.values().filter(|r| r.table() == table).count();
                if count > max {
                    return Err(self.failed(format!(
                        "{table} allows at most {max} row(s), transaction would leave {count}"
                    )));
                }
            }
        }
        Ok(())
    }
}

// FNV-1a of the database name, so NB and SB uuids never collide
fn name_prefix(s: &str) -> u32 {
    s.bytes()
        .fold(0x811c_9dc5_u32, |h, b| (h ^ u32::from(b)).wrapping_mul(0x0100_0193))
}

#[async_trait]
impl DbClient for MemoryDb {
    fn name(&self) -> &str {
        &self.name
    }

    fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<(), DatabaseError> {
        if !self.connected.swap(true, Ordering::SeqCst) {
            debug!(db = %self.name, "Database client connected");
        }
        Ok(())
    }

    fn close(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            debug!(db = %self.name, "Database client closed");
        }
    }

    fn create(&self, rows: Vec<Row>) -> Result<Vec<Operation>, DatabaseError> {
        self.ensure_connected()?;
        Ok(rows.into_iter().map(Operation::Insert).collect())
    }

    fn delete_where(
        &self,
        table: Table,
        predicate: RowPredicate<'_>,
    ) -> Result<Vec<Operation>, DatabaseError> {
        Ok(self
            .list_where(table, predicate)?
            .into_iter()
            .map(|row| Operation::Delete {
                table,
                uuid: row.uuid().to_string(),
            })
            .collect())
    }

    fn list_where(
        &self,
        table: Table,
        predicate: RowPredicate<'_>,
    ) -> Result<Vec<Row>, DatabaseError> {
        self.ensure_connected()?;
        Ok(self
            .lock_rows()
            .values()
            .filter(|row| row.table() == table && predicate(row))
            .cloned()
            .collect())
    }

    async fn transact(&self, ops: Vec<Operation>) -> Result<Vec<String>, DatabaseError> {
        self.ensure_connected()?;

        let injected = self
            .injected_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(reason) = injected {
            warn!(db = %self.name, %reason, "Failing transaction on request");
            return Err(self.failed(reason));
        }

        let mut rows = self.lock_rows();
        let mut staged = rows.clone();
        let mut inserted = Vec::new();
        let count = ops.len();
        for op in ops {
            self.apply(&mut staged, op, &mut inserted)?;
        }
        self.check_limits(&staged)?;
        *rows = staged;
        debug!(db = %self.name, operations = count, "Transaction committed");
        Ok(inserted)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod memory_tests;
