// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `zone.rs`

#[cfg(test)]
mod tests {
    use crate::errors::{ConfigError, DatabaseError, OrchestratorError};
    use crate::ovsdb::{DbClient, MemoryDb, NbGlobal, Row, Table};
    use crate::zone::*;

    fn db_with_zone(name: &str) -> MemoryDb {
        MemoryDb::with_rows(
            "OVN_Northbound",
            vec![Row::NbGlobal(NbGlobal {
                name: name.to_string(),
                ..Default::default()
            })],
        )
    }

    #[test]
    fn test_get_nb_zone() {
        assert_eq!(get_nb_zone(&db_with_zone("zone-a")).unwrap(), "zone-a");
        assert_eq!(get_nb_zone(&db_with_zone("")).unwrap(), "global");
        assert!(matches!(
            get_nb_zone(&MemoryDb::new("OVN_Northbound")),
            Err(DatabaseError::ZoneNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_ensure_zone_existing() {
        let db = db_with_zone("zone-a");
        assert!(!ensure_zone(&db, "global").await.unwrap());
        assert_eq!(get_nb_zone(&db).unwrap(), "zone-a");
    }

    #[tokio::test]
    async fn test_ensure_then_release() {
        let db = MemoryDb::new("OVN_Northbound");
        assert!(ensure_zone(&db, "global").await.unwrap());
        assert_eq!(get_nb_zone(&db).unwrap(), "global");

        release_zone(&db).await.unwrap();
        assert!(db.list(Table::NbGlobal).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ensure_zone_surfaces_transact_failure() {
        let db = MemoryDb::new("OVN_Northbound");
        db.fail_next_transact("disk full");
        let err = ensure_zone(&db, "global").await.unwrap_err();
        assert!(matches!(err, DatabaseError::TransactionFailed { .. }));
    }

    #[tokio::test]
    async fn test_with_zone_absent_creates_one_and_leaves_none() {
        let db = MemoryDb::new("OVN_Northbound");
        let seen = with_zone(&db, "global", || async {
            Ok::<_, DatabaseError>(get_nb_zone(&db)?)
        })
        .await
        .unwrap();

        assert_eq!(seen, "global");
        assert_eq!(db.list(Table::NbGlobal).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_with_zone_present_is_left_alone() {
        let db = db_with_zone("zone-a");
        with_zone(&db, "global", || async { Ok::<_, DatabaseError>(()) })
            .await
            .unwrap();
        assert_eq!(get_nb_zone(&db).unwrap(), "zone-a");
    }

    #[tokio::test]
    async fn test_with_zone_releases_on_failure() {
        let db = MemoryDb::new("OVN_Northbound");
        let err = with_zone(&db, "global", || async {
            Err::<(), OrchestratorError>(
                ConfigError::MissingHandle {
                    handle: "watch factory",
                }
                .into(),
            )
        })
        .await
        .unwrap_err();

        assert!(err.as_config().is_some());
        assert!(db.list(Table::NbGlobal).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_with_zone_release_failure_after_success() {
        let db = MemoryDb::new("OVN_Northbound");
        let err = with_zone(&db, "global", || async {
            db.fail_next_transact("release rejected");
            Ok::<_, DatabaseError>(())
        })
        .await
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "transaction on OVN_Northbound failed: release rejected"
        );
    }
}
