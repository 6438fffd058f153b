// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-network address-set factory.
//!
//! Every controller owns one [`AddressSetFactory`], namespaced by its controller name.
//! Address-set names are derived from a SHA-256 hash of the controller name and the
//! owner key, so the same owner (say, a namespace) in two networks maps to two
//! distinct address sets.

use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Length of the hex hash in an address-set name
const HASH_LEN: usize = 20;

/// Hashed address-set name for `owner` within `controller_name`.
#[must_use]
pub fn hashed_name(controller_name: &str, owner: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(controller_name.as_bytes());
    hasher.update(b":");
    hasher.update(owner.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("a{}", &digest[..HASH_LEN])
}

/// One address set owned by a controller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressSetEntry {
    /// Hashed name as it would appear in the database
    pub name: String,
    /// Owner key (e.g. a namespace name)
    pub owner: String,
    pub addresses: BTreeSet<String>,
}

/// Address sets of one controller, keyed by owner.
#[derive(Debug)]
pub struct AddressSetFactory {
    controller_name: String,
    sets: Mutex<BTreeMap<String, AddressSetEntry>>,
}

impl AddressSetFactory {
    #[must_use]
    pub fn new(controller_name: impl Into<String>) -> Self {
        Self {
            controller_name: controller_name.into(),
            sets: Mutex::new(BTreeMap::new()),
        }
    }

    /// Namespace this factory generates names in.
    #[must_use]
    pub fn controller_name(&self) -> &str {
        &self.controller_name
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, AddressSetEntry>> {
        self.sets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create the address set for `owner` if missing and add `addresses` to it.
    pub fn ensure(&self, owner: &str, addresses: &[&str]) -> AddressSetEntry {
        let mut sets = self.lock();
        let entry = sets.entry(owner.to_string()).or_insert_with(|| {
            debug!(controller = %self.controller_name, owner, "Creating address set");
            AddressSetEntry {
                name: hashed_name(&self.controller_name, owner),
                owner: owner.to_string(),
                addresses: BTreeSet::new(),
            }
        });
        entry
            .addresses
            .extend(addresses.iter().map(|a| (*a).to_string()));
        entry.clone()
    }

    #[must_use]
    pub fn get(&self, owner: &str) -> Option<AddressSetEntry> {
        self.lock().get(owner).cloned()
    }

    /// Remove the address set for `owner`. Returns whether it existed.
    pub fn delete(&self, owner: &str) -> bool {
        self.lock().remove(owner).is_some()
    }

    /// All address sets, ordered by owner.
    #[must_use]
    pub fn list(&self) -> Vec<AddressSetEntry> {
        self.lock().values().cloned().collect()
    }
}
