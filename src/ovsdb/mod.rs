// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Transactional northbound/southbound database access.
//!
//! Controllers talk to the databases through the [`DbClient`] trait. Writes are a
//! two-step affair, mirroring OVSDB clients: build operations ([`DbClient::create`],
//! [`DbClient::delete_where`]) and then apply them atomically with
//! [`DbClient::transact`].
//!
//! - [`memory`] - In-memory [`DbClient`] implementation
//! - [`harness`] - Paired NB/SB clients for tests and local runs

pub mod harness;
pub mod memory;

pub use harness::{reset_client, HarnessCleanup, NbSbHarness, TestSetup};
pub use memory::MemoryDb;

use crate::errors::DatabaseError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;

/// Tables the orchestration layer touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    NbGlobal,
    LoadBalancerGroup,
    AddressSet,
    Chassis,
}

impl Table {
    /// Row limit enforced on commit, if any.
    #[must_use]
    pub fn max_rows(self) -> Option<usize> {
        match self {
            Table::NbGlobal => Some(1),
            _ => None,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Table::NbGlobal => "NB_Global",
            Table::LoadBalancerGroup => "Load_Balancer_Group",
            Table::AddressSet => "Address_Set",
            Table::Chassis => "Chassis",
        };
        f.write_str(name)
    }
}

/// The `NB_Global` row; its name is the zone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NbGlobal {
    pub uuid: String,
    pub name: String,
    pub options: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadBalancerGroup {
    pub uuid: String,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressSet {
    pub uuid: String,
    pub name: String,
    pub addresses: Vec<String>,
    pub external_ids: BTreeMap<String, String>,
}

/// Southbound chassis row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Chassis {
    pub uuid: String,
    pub name: String,
    pub hostname: String,
}

/// Any row in either database.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Row {
    NbGlobal(NbGlobal),
    LoadBalancerGroup(LoadBalancerGroup),
    AddressSet(AddressSet),
    Chassis(Chassis),
}

impl Row {
    #[must_use]
    pub fn table(&self) -> Table {
        match self {
            Row::NbGlobal(_) => Table::NbGlobal,
            Row::LoadBalancerGroup(_) => Table::LoadBalancerGroup,
            Row::AddressSet(_) => Table::AddressSet,
            Row::Chassis(_) => Table::Chassis,
        }
    }

    #[must_use]
    pub fn uuid(&self) -> &str {
        match self {
            Row::NbGlobal(r) => &r.uuid,
            Row::LoadBalancerGroup(r) => &r.uuid,
            Row::AddressSet(r) => &r.uuid,
            Row::Chassis(r) => &r.uuid,
        }
    }

    pub(crate) fn set_uuid(&mut self, uuid: String) {
        match self {
            Row::NbGlobal(r) => r.uuid = uuid,
            Row::LoadBalancerGroup(r) => r.uuid = uuid,
            Row::AddressSet(r) => r.uuid = uuid,
            Row::Chassis(r) => r.uuid = uuid,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Row::NbGlobal(r) => &r.name,
            Row::LoadBalancerGroup(r) => &r.name,
            Row::AddressSet(r) => &r.name,
            Row::Chassis(r) => &r.name,
        }
    }
}

/// One step of a transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Insert a row; an empty uuid is assigned on commit
    Insert(Row),
    /// Replace the row with the same uuid
    Update(Row),
    Delete { table: Table, uuid: String },
}

/// Row filter used by [`DbClient::delete_where`] and [`DbClient::list_where`].
pub type RowPredicate<'a> = &'a (dyn Fn(&Row) -> bool + Send + Sync);

/// Client for one transactional database.
#[async_trait]
pub trait DbClient: Send + Sync {
    /// Database name, for logs and errors (e.g. `OVN_Northbound`).
    fn name(&self) -> &str;

    fn connected(&self) -> bool;

    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    async fn connect(&self) -> Result<(), DatabaseError>;

    /// Close the connection. Closing a closed client is a no-op.
    fn close(&self);

    /// Build insert operations for `rows`. Nothing is applied until [`DbClient::transact`].
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NotConnected`] on a closed client.
    fn create(&self, rows: Vec<Row>) -> Result<Vec<Operation>, DatabaseError>;

    /// Build delete operations for every cached row of `table` matching `predicate`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NotConnected`] on a closed client.
    fn delete_where(
        &self,
        table: Table,
        predicate: RowPredicate<'_>,
    ) -> Result<Vec<Operation>, DatabaseError>;

    /// Cached rows of `table` matching `predicate`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NotConnected`] on a closed client.
    fn list_where(&self, table: Table, predicate: RowPredicate<'_>)
        -> Result<Vec<Row>, DatabaseError>;

    /// All cached rows of `table`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NotConnected`] on a closed client.
    fn list(&self, table: Table) -> Result<Vec<Row>, DatabaseError> {
        self.list_where(table, &|_| true)
    }

    /// Apply `ops` atomically, returning the uuids of inserted rows in order.
    ///
    /// # Errors
    ///
    /// Returns an error, with nothing applied, if any operation fails.
    async fn transact(&self, ops: Vec<Operation>) -> Result<Vec<String>, DatabaseError>;
}
