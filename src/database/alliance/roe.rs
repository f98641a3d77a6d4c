//! Rules-of-engagement violation repository

use super::ServerId;
use crate::database::core::{text_or_default, QueryExecutor, StoreResult, WriteOutcome};
use rusqlite::params;
use serde::Serialize;

/// A record from the ROE table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoeRecord {
    pub server_id: ServerId,
    pub alliance_id: String,
    pub player_name: String,
    pub violations: u32,
    pub last_updated: String,
}

pub struct RoeRepository<'a> {
    executor: &'a QueryExecutor,
}

impl<'a> RoeRepository<'a> {
    pub fn new(executor: &'a QueryExecutor) -> Self {
        Self { executor }
    }

    /// Insert or fully replace the violation record of a player
    pub fn save_roe(
        &self,
        server_id: ServerId,
        alliance_id: &str,
        player_name: &str,
        violations: u32,
        last_updated: &str,
    ) -> StoreResult<WriteOutcome> {
        let rows = self.executor.write(
            "INSERT OR REPLACE INTO ROE (ServerID, AllianceID, PlayerName, Violations, LastUpdated)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![server_id, alliance_id, player_name, violations, last_updated],
        )?;
        Ok(WriteOutcome::Applied { rows })
    }

    /// Record a first violation (`Violations = 1`)
    pub fn save_first_violation(
        &self,
        server_id: ServerId,
        alliance_id: &str,
        player_name: &str,
        last_updated: &str,
    ) -> StoreResult<WriteOutcome> {
        self.save_roe(server_id, alliance_id, player_name, 1, last_updated)
    }

    pub fn remove_roe(
        &self,
        server_id: ServerId,
        alliance_id: &str,
        player_name: &str,
    ) -> StoreResult<WriteOutcome> {
        let rows = self.executor.write(
            "DELETE FROM ROE WHERE ServerID = ?1 AND AllianceID = ?2 AND PlayerName = ?3",
            params![server_id, alliance_id, player_name],
        )?;
        Ok(WriteOutcome::from_keyed(rows))
    }

    pub fn roe_entry(
        &self,
        server_id: ServerId,
        alliance_id: &str,
        player_name: &str,
    ) -> StoreResult<Option<RoeRecord>> {
        let rows = self.executor.read_with(
            "SELECT ServerID, AllianceID, PlayerName, Violations, LastUpdated FROM ROE
             WHERE ServerID = ?1 AND AllianceID = ?2 AND PlayerName = ?3",
            params![server_id, alliance_id, player_name],
            map_roe,
        )?;
        Ok(rows.into_iter().next())
    }

    /// All violations of a guild, most violations first
    pub fn roe(&self, server_id: ServerId) -> StoreResult<Vec<RoeRecord>> {
        self.executor.read_with(
            "SELECT ServerID, AllianceID, PlayerName, Violations, LastUpdated FROM ROE
             WHERE ServerID = ?1 ORDER BY Violations DESC, AllianceID, PlayerName",
            [server_id],
            map_roe,
        )
    }
}

fn map_roe(row: &rusqlite::Row<'_>) -> rusqlite::Result<RoeRecord> {
    Ok(RoeRecord {
        server_id: row.get(0)?,
        alliance_id: text_or_default(row, 1)?,
        player_name: text_or_default(row, 2)?,
        violations: row.get::<_, Option<u32>>(3)?.unwrap_or(1),
        last_updated: text_or_default(row, 4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::open_store;
    use super::*;

    #[test]
    fn test_save_then_remove_roe() {
        let (_dir, store) = open_store();
        let repo = store.roe();

        repo.save_roe(1, "A1", "Bob", 3, "2024-01-01").unwrap();
        assert_eq!(
            repo.roe_entry(1, "A1", "Bob").unwrap().map(|r| r.violations),
            Some(3)
        );

        assert!(repo.remove_roe(1, "A1", "Bob").unwrap().is_applied());
        assert!(repo.roe_entry(1, "A1", "Bob").unwrap().is_none());
        assert!(repo.roe(1).unwrap().is_empty());
    }

    #[test]
    fn test_remove_missing_roe_is_not_found() {
        let (_dir, store) = open_store();
        assert_eq!(
            store.roe().remove_roe(1, "A1", "Nobody").unwrap(),
            WriteOutcome::NotFound
        );
    }

    #[test]
    fn test_first_violation_and_key_scope() {
        let (_dir, store) = open_store();
        let repo = store.roe();

        repo.save_first_violation(1, "A1", "Bob", "2024-01-01")
            .unwrap();
        // same player under another alliance is a separate record
        repo.save_roe(1, "A2", "Bob", 4, "2024-01-02").unwrap();

        let records = repo.roe(1).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].alliance_id, "A2");
        assert_eq!(records[1].violations, 1);
    }
}
