// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone resolution against the northbound database.
//!
//! Composing a controller requires reading the zone from the `NB_Global` row. When the
//! database has no such row, [`with_zone`] creates one for the duration of the
//! composition and removes it afterwards, so the database ends up holding only rows
//! that controller logic created itself.

use crate::constants::DEFAULT_ZONE;
use crate::errors::DatabaseError;
use crate::metrics;
use crate::ovsdb::{DbClient, NbGlobal, Row, Table};
use std::future::Future;
use tracing::{debug, info, warn};

/// Read the zone name from the `NB_Global` row. An unnamed row means the default zone.
///
/// # Errors
///
/// Returns [`DatabaseError::ZoneNotFound`] if there is no `NB_Global` row, or the
/// client error if the table cannot be read.
pub fn get_nb_zone(db: &dyn DbClient) -> Result<String, DatabaseError> {
    let rows = db.list(Table::NbGlobal)?;
    let row = rows.first().ok_or_else(|| DatabaseError::ZoneNotFound {
        db: db.name().to_string(),
    })?;
    if row.name().is_empty() {
        Ok(DEFAULT_ZONE.to_string())
    } else {
        Ok(row.name().to_string())
    }
}

/// Make sure a zone record exists, creating one named `zone` if not.
///
/// Returns `true` if the record was created here and must be released by the caller.
///
/// # Errors
///
/// Any database error while reading, creating or committing the record.
pub async fn ensure_zone(db: &dyn DbClient, zone: &str) -> Result<bool, DatabaseError> {
    match get_nb_zone(db) {
        Ok(existing) => {
            debug!(zone = %existing, "Zone record present");
            Ok(false)
        }
        Err(DatabaseError::ZoneNotFound { .. }) => {
            let ops = db.create(vec![Row::NbGlobal(NbGlobal {
                name: zone.to_string(),
                ..Default::default()
            })])?;
            db.transact(ops).await?;
            metrics::record_zone_synthesized(zone);
            info!(zone = %zone, db = %db.name(), "Synthesized zone record");
            Ok(true)
        }
        Err(e) => Err(e),
    }
}

/// Delete every zone record.
///
/// # Errors
///
/// Any database error while building or committing the deletion.
pub async fn release_zone(db: &dyn DbClient) -> Result<(), DatabaseError> {
    let ops = db.delete_where(Table::NbGlobal, &|_| true)?;
    let count = ops.len();
    db.transact(ops).await?;
    debug!(rows = count, db = %db.name(), "Released zone record");
    Ok(())
}

/// Run `f` with a zone record guaranteed to exist, releasing it afterwards if it was
/// created here.
///
/// The release runs whether `f` succeeds or fails. A release failure is returned when
/// `f` succeeded, and logged when `f` already failed.
///
/// # Errors
///
/// The error from [`ensure_zone`], from `f`, or from [`release_zone`].
pub async fn with_zone<T, E, F, Fut>(db: &dyn DbClient, zone: &str, f: F) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<DatabaseError>,
{
    let created = ensure_zone(db, zone).await?;
    let result = f().await;
    if created {
        if let Err(release_err) = release_zone(db).await {
            if result.is_ok() {
                return Err(release_err.into());
            }
            warn!(error = %release_err, "Failed to release synthesized zone record");
        }
    }
    result
}

#[cfg(test)]
#[path = "zone_tests.rs"]
mod zone_tests;
