//! Alliance repository
//!
//! A guild may register several alliances. One of them is the master
//! (`SubAlliance = 0`); the rest are sub-alliances (`SubAlliance = 1`).

use super::ServerId;
use crate::database::core::{execute_in, QueryExecutor, StoreError, StoreResult, WriteOutcome};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Role of an alliance within its guild
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllianceKind {
    #[default]
    Master,
    Sub,
}

impl AllianceKind {
    /// Value stored in the `SubAlliance` column
    pub fn sub_alliance_flag(&self) -> i64 {
        match self {
            AllianceKind::Master => 0,
            AllianceKind::Sub => 1,
        }
    }

    fn from_flag(flag: i64) -> Self {
        if flag == 0 {
            AllianceKind::Master
        } else {
            AllianceKind::Sub
        }
    }
}

/// A record from the Alliance table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllianceRecord {
    pub server_id: ServerId,
    pub alliance_id: String,
    pub kind: AllianceKind,
}

/// Repository for alliance registration
pub struct AllianceRepository<'a> {
    executor: &'a QueryExecutor,
}

impl<'a> AllianceRepository<'a> {
    pub fn new(executor: &'a QueryExecutor) -> Self {
        Self { executor }
    }

    /// Register an alliance as master (`SubAlliance = 0`)
    pub fn save_alliance(
        &self,
        server_id: ServerId,
        alliance_id: &str,
    ) -> StoreResult<WriteOutcome> {
        self.save_alliance_as(server_id, alliance_id, AllianceKind::default())
    }

    /// Insert or fully replace an alliance row
    ///
    /// This does not demote other alliances; use [`Self::set_new_master`]
    /// to move the master role.
    pub fn save_alliance_as(
        &self,
        server_id: ServerId,
        alliance_id: &str,
        kind: AllianceKind,
    ) -> StoreResult<WriteOutcome> {
        let rows = self.executor.write(
            "INSERT OR REPLACE INTO Alliance (ServerID, AllianceID, SubAlliance)
             VALUES (?1, ?2, ?3)",
            params![server_id, alliance_id, kind.sub_alliance_flag()],
        )?;
        Ok(WriteOutcome::Applied { rows })
    }

    /// Make `alliance_id` the only master alliance of the guild
    ///
    /// Demoting every alliance and promoting the new master happen in one
    /// transaction. If the alliance is not registered nothing changes and
    /// [`WriteOutcome::NotFound`] is returned.
    pub fn set_new_master(
        &self,
        server_id: ServerId,
        alliance_id: &str,
    ) -> StoreResult<WriteOutcome> {
        let outcome = self.executor.transaction(|tx| {
            let exists_sql =
                "SELECT COUNT(*) FROM Alliance WHERE ServerID = ?1 AND AllianceID = ?2";
            let exists: i64 = tx
                .query_row(exists_sql, params![server_id, alliance_id], |row| row.get(0))
                .map_err(|e| StoreError::query(exists_sql, e))?;
            if exists == 0 {
                return Ok(WriteOutcome::NotFound);
            }

            let demoted = execute_in(
                tx,
                "UPDATE Alliance SET SubAlliance = 1 WHERE ServerID = ?1",
                params![server_id],
            )?;
            let promoted = execute_in(
                tx,
                "UPDATE Alliance SET SubAlliance = 0 WHERE ServerID = ?1 AND AllianceID = ?2",
                params![server_id, alliance_id],
            )?;
            Ok(WriteOutcome::Applied {
                rows: demoted.max(promoted),
            })
        })?;

        if outcome.is_applied() {
            info!("Server {} master alliance set to {}", server_id, alliance_id);
        }
        Ok(outcome)
    }

    /// All alliances of a guild, ordered by alliance id
    pub fn alliances(&self, server_id: ServerId) -> StoreResult<Vec<AllianceRecord>> {
        self.executor.read_with(
            "SELECT ServerID, AllianceID, SubAlliance FROM Alliance
             WHERE ServerID = ?1 ORDER BY AllianceID",
            [server_id],
            |row| {
                Ok(AllianceRecord {
                    server_id: row.get(0)?,
                    alliance_id: row.get(1)?,
                    kind: AllianceKind::from_flag(row.get::<_, Option<i64>>(2)?.unwrap_or(0)),
                })
            },
        )
    }

    /// Ids of the guild's master alliances (normally exactly one)
    pub fn masters(&self, server_id: ServerId) -> StoreResult<Vec<String>> {
        self.executor.read_with(
            "SELECT AllianceID FROM Alliance
             WHERE ServerID = ?1 AND SubAlliance = 0 ORDER BY AllianceID",
            [server_id],
            |row| row.get(0),
        )
    }

    pub fn remove_alliance(
        &self,
        server_id: ServerId,
        alliance_id: &str,
    ) -> StoreResult<WriteOutcome> {
        let rows = self.executor.write(
            "DELETE FROM Alliance WHERE ServerID = ?1 AND AllianceID = ?2",
            params![server_id, alliance_id],
        )?;
        Ok(WriteOutcome::from_keyed(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::open_store;
    use super::*;

    fn kinds(records: &[AllianceRecord]) -> Vec<(&str, AllianceKind)> {
        records
            .iter()
            .map(|r| (r.alliance_id.as_str(), r.kind))
            .collect()
    }

    #[test]
    fn test_save_alliance_defaults_to_master() {
        let (_dir, store) = open_store();
        let repo = store.alliances();

        repo.save_alliance(1, "A1").unwrap();
        assert_eq!(
            kinds(&repo.alliances(1).unwrap()),
            vec![("A1", AllianceKind::Master)]
        );
    }

    #[test]
    fn test_save_alliance_upsert_overwrites() {
        let (_dir, store) = open_store();
        let repo = store.alliances();

        repo.save_alliance_as(1, "A1", AllianceKind::Master).unwrap();
        repo.save_alliance_as(1, "A1", AllianceKind::Sub).unwrap();

        let records = repo.alliances(1).unwrap();
        assert_eq!(kinds(&records), vec![("A1", AllianceKind::Sub)]);

        repo.save_alliance_as(1, "A1", AllianceKind::Master).unwrap();
        assert_eq!(
            kinds(&repo.alliances(1).unwrap()),
            vec![("A1", AllianceKind::Master)]
        );
    }

    #[test]
    fn test_set_new_master_scenario() {
        let (_dir, store) = open_store();
        let repo = store.alliances();

        repo.save_alliance(1, "A1").unwrap();
        repo.save_alliance(1, "A2").unwrap();
        assert!(repo.set_new_master(1, "A2").unwrap().is_applied());

        assert_eq!(
            kinds(&repo.alliances(1).unwrap()),
            vec![("A1", AllianceKind::Sub), ("A2", AllianceKind::Master)]
        );
        assert_eq!(repo.masters(1).unwrap(), vec!["A2".to_string()]);
    }

    #[test]
    fn test_set_new_master_leaves_exactly_one_master() {
        let (_dir, store) = open_store();
        let repo = store.alliances();

        // several masters from independent upserts
        for id in ["A1", "A2", "A3", "A4"] {
            repo.save_alliance(1, id).unwrap();
        }
        repo.save_alliance(2, "B1").unwrap();

        repo.set_new_master(1, "A3").unwrap();
        assert_eq!(repo.masters(1).unwrap(), vec!["A3".to_string()]);
        let subs = repo
            .alliances(1)
            .unwrap()
            .into_iter()
            .filter(|r| r.kind == AllianceKind::Sub)
            .count();
        assert_eq!(subs, 3);

        // other guilds are untouched
        assert_eq!(repo.masters(2).unwrap(), vec!["B1".to_string()]);
    }

    #[test]
    fn test_set_new_master_unknown_alliance_changes_nothing() {
        let (_dir, store) = open_store();
        let repo = store.alliances();

        repo.save_alliance(1, "A1").unwrap();
        repo.save_alliance_as(1, "A2", AllianceKind::Sub).unwrap();

        assert_eq!(
            repo.set_new_master(1, "missing").unwrap(),
            WriteOutcome::NotFound
        );
        assert_eq!(repo.masters(1).unwrap(), vec!["A1".to_string()]);
    }

    #[test]
    fn test_remove_alliance() {
        let (_dir, store) = open_store();
        let repo = store.alliances();

        repo.save_alliance(1, "A1").unwrap();
        assert!(repo.remove_alliance(1, "A1").unwrap().is_applied());
        assert_eq!(repo.remove_alliance(1, "A1").unwrap(), WriteOutcome::NotFound);
    }
}
