//! Alliance database storage
//!
//! This module provides the data-access API used by the bot's command
//! handlers. [`AllianceStore`] is the entry point; it hands out one
//! repository per concern:
//! - servers: guild settings, general info, whole-server deletion
//! - alliances: master/sub-alliance registration
//! - permissions: role capability flags
//! - members: alliance members and kill counts
//! - intel: alliance and player intelligence
//! - roe: rules-of-engagement violations
//! - resources: global resource reference data
//!
//! Every repository call opens its own connection, so the store is cheap to
//! clone and can be shared between concurrently running handlers. SQLite's
//! file locking is the only coordination between them.

mod alliances;
mod intel;
mod members;
mod permissions;
mod resources;
mod roe;
mod servers;

pub use alliances::{AllianceKind, AllianceRecord, AllianceRepository};
pub use intel::{
    timestamp_now, AllianceIntel, AllianceIntelRecord, IntelRepository, PlayerIntelRecord,
    TIMESTAMP_FORMAT,
};
pub use members::{MemberRecord, MemberRepository};
pub use permissions::{RolePermissions, RolePermissionsRecord, RolePermissionsRepository};
pub use resources::{ResourceRecord, ResourceRepository};
pub use roe::{RoeRecord, RoeRepository};
pub use servers::{GeneralInfo, PurgeReport, ServerRepository, ServerSettings};

use crate::database::core::{QueryExecutor, SchemaManager, StoreResult};
use std::path::{Path, PathBuf};
use tracing::info;

/// Discord guild identifier; the scoping key of every server-owned table
pub type ServerId = u64;

/// Main alliance database (SQLite backend)
///
/// Holds only the location of the database file. Connections are opened
/// per call by the underlying [`QueryExecutor`].
#[derive(Debug, Clone)]
pub struct AllianceStore {
    executor: QueryExecutor,
}

impl AllianceStore {
    /// Open the store at `path`, creating any missing tables
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let store = Self::new(path);
        info!("Opening alliance database at {}", store.path().display());
        store.schema().create_all_tables()?;
        Ok(store)
    }

    /// Bind a store to `path` without touching the file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            executor: QueryExecutor::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.executor.path()
    }

    /// Get the query executor (for raw reads and writes)
    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    pub fn schema(&self) -> SchemaManager<'_> {
        SchemaManager::new(&self.executor)
    }

    pub fn servers(&self) -> ServerRepository<'_> {
        ServerRepository::new(&self.executor)
    }

    pub fn alliances(&self) -> AllianceRepository<'_> {
        AllianceRepository::new(&self.executor)
    }

    pub fn permissions(&self) -> RolePermissionsRepository<'_> {
        RolePermissionsRepository::new(&self.executor)
    }

    pub fn members(&self) -> MemberRepository<'_> {
        MemberRepository::new(&self.executor)
    }

    pub fn intel(&self) -> IntelRepository<'_> {
        IntelRepository::new(&self.executor)
    }

    pub fn roe(&self) -> RoeRepository<'_> {
        RoeRepository::new(&self.executor)
    }

    pub fn resources(&self) -> ResourceRepository<'_> {
        ResourceRepository::new(&self.executor)
    }

    /// Remove every row owned by `server_id`
    pub fn delete_server_data(&self, server_id: ServerId) -> StoreResult<PurgeReport> {
        self.servers().delete_server_data(server_id)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::AllianceStore;
    use tempfile::TempDir;

    /// A store on a fresh file inside its own temporary directory
    pub(crate) fn open_store() -> (TempDir, AllianceStore) {
        let dir = TempDir::new().unwrap();
        let store = AllianceStore::open(dir.path().join("stfc_bot.db")).unwrap();
        (dir, store)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::open_store;
    use super::*;
    use crate::database::core::{SchemaDefinitions, SchemaStatus};

    #[test]
    fn test_open_creates_schema() {
        let (_dir, store) = open_store();
        assert_eq!(store.schema().check_status().unwrap(), SchemaStatus::Current);
    }

    #[test]
    fn test_new_does_not_touch_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("untouched.db");
        let store = AllianceStore::new(&path);
        assert_eq!(store.path(), path.as_path());
        assert!(!path.exists());
    }

    #[test]
    fn test_clones_share_the_file() {
        let (_dir, store) = open_store();
        let other = store.clone();

        store.alliances().save_alliance(1, "A1").unwrap();
        assert_eq!(other.alliances().alliances(1).unwrap().len(), 1);
    }

    #[test]
    fn test_store_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AllianceStore>();
    }

    #[test]
    fn test_concurrent_handlers_on_separate_servers() {
        let (_dir, store) = open_store();

        let handles: Vec<_> = (1..=4u64)
            .map(|server_id| {
                let store = store.clone();
                std::thread::spawn(move || {
                    // no busy timeout is configured, so a contended write may
                    // legitimately fail; it must fail as an error, not a panic
                    store
                        .alliances()
                        .save_alliance(server_id, "A1")
                        .map_err(|e| e.is_contention())
                })
            })
            .collect();

        for handle in handles {
            match handle.join().unwrap() {
                Ok(outcome) => assert!(outcome.is_applied()),
                Err(contention) => assert!(contention),
            }
        }
    }

    #[test]
    fn test_delete_server_data_scenario() {
        let (_dir, store) = open_store();
        store.schema().seed_default_resources().unwrap();

        for server_id in [1, 2] {
            store
                .servers()
                .save_settings(&ServerSettings::new(server_id, "Alpha"))
                .unwrap();
            store.alliances().save_alliance(server_id, "A1").unwrap();
            store
                .permissions()
                .save_role_permissions(server_id, "Officer", &RolePermissions::default())
                .unwrap();
            store
                .members()
                .increment_member_kill_count(server_id, "A1", "p1", "Bob", 3)
                .unwrap();
            store
                .intel()
                .save_intelligence(server_id, "A1", &AllianceIntel::default())
                .unwrap();
            store
                .intel()
                .save_player_intelligence(server_id, "Bob", "A1", "2024-01-01")
                .unwrap();
            store
                .servers()
                .save_general_info(server_id, &GeneralInfo::default())
                .unwrap();
            store
                .roe()
                .save_roe(server_id, "A1", "Bob", 1, "2024-01-01")
                .unwrap();
        }

        let report = store.delete_server_data(1).unwrap();
        assert!(report.is_complete());
        assert_eq!(report.rows_deleted(), 8);

        let db = store.executor().connect().unwrap();
        for table in SchemaDefinitions::SERVER_SCOPED_TABLES {
            let sql = format!("SELECT COUNT(*) FROM {} WHERE ServerID = ?1", table);
            let gone: i64 = db.conn.query_row(&sql, [1], |row| row.get(0)).unwrap();
            let kept: i64 = db.conn.query_row(&sql, [2], |row| row.get(0)).unwrap();
            assert_eq!(gone, 0, "{} still has rows for server 1", table);
            assert_eq!(kept, 1, "{} lost rows for server 2", table);
        }
        assert_eq!(
            db.table_count("Resources").unwrap(),
            SchemaDefinitions::DEFAULT_RESOURCES.len() as u64
        );
    }
}
