//! Intelligence repository
//!
//! Two kinds of intelligence are tracked per guild:
//! - the sharing posture towards another alliance (`AllianceIntelligence`)
//! - the last observed alliance of a player (`PlayerIntelligence`)

use super::ServerId;
use crate::database::core::{
    flag_or_default, text_or_default, QueryExecutor, StoreResult, WriteOutcome,
};
use chrono::Utc;
use rusqlite::params;
use serde::{Deserialize, Serialize};

/// Format of `LastUpdate`/`LastUpdated` text columns
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time in the format stored in timestamp text columns
pub fn timestamp_now() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Relationship flags towards another alliance; all off by default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllianceIntel {
    /// Area of activity
    pub aoa: bool,
    pub cognap: bool,
    pub player_kos: bool,
    pub galactic_kos: bool,
    pub alliance_kos: bool,
    pub nap: bool,
    pub war: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllianceIntelRecord {
    pub server_id: ServerId,
    pub alliance_id: String,
    pub intel: AllianceIntel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerIntelRecord {
    pub server_id: ServerId,
    pub player_name: String,
    pub player_alliance: String,
    pub last_update: String,
}

pub struct IntelRepository<'a> {
    executor: &'a QueryExecutor,
}

impl<'a> IntelRepository<'a> {
    pub fn new(executor: &'a QueryExecutor) -> Self {
        Self { executor }
    }

    /// Insert or fully replace the intelligence posture towards an alliance
    pub fn save_intelligence(
        &self,
        server_id: ServerId,
        alliance_id: &str,
        intel: &AllianceIntel,
    ) -> StoreResult<WriteOutcome> {
        let rows = self.executor.write(
            "INSERT OR REPLACE INTO AllianceIntelligence
                (ServerID, AllianceID, AoA, COGNAP, PlayerKos, GalacticKos, AllianceKos, NAP, War)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                server_id,
                alliance_id,
                intel.aoa,
                intel.cognap,
                intel.player_kos,
                intel.galactic_kos,
                intel.alliance_kos,
                intel.nap,
                intel.war,
            ],
        )?;
        Ok(WriteOutcome::Applied { rows })
    }

    pub fn alliance_intelligence(
        &self,
        server_id: ServerId,
    ) -> StoreResult<Vec<AllianceIntelRecord>> {
        self.executor.read_with(
            "SELECT ServerID, AllianceID, AoA, COGNAP, PlayerKos, GalacticKos, AllianceKos, NAP, War
             FROM AllianceIntelligence WHERE ServerID = ?1 ORDER BY AllianceID",
            [server_id],
            |row| {
                Ok(AllianceIntelRecord {
                    server_id: row.get(0)?,
                    alliance_id: text_or_default(row, 1)?,
                    intel: AllianceIntel {
                        aoa: flag_or_default(row, 2)?,
                        cognap: flag_or_default(row, 3)?,
                        player_kos: flag_or_default(row, 4)?,
                        galactic_kos: flag_or_default(row, 5)?,
                        alliance_kos: flag_or_default(row, 6)?,
                        nap: flag_or_default(row, 7)?,
                        war: flag_or_default(row, 8)?,
                    },
                })
            },
        )
    }

    /// Record the alliance a player was last seen in
    pub fn save_player_intelligence(
        &self,
        server_id: ServerId,
        player_name: &str,
        player_alliance: &str,
        last_update: &str,
    ) -> StoreResult<WriteOutcome> {
        let rows = self.executor.write(
            "INSERT OR REPLACE INTO PlayerIntelligence
                (ServerID, PlayerName, PlayerAlliance, LastUpdate)
             VALUES (?1, ?2, ?3, ?4)",
            params![server_id, player_name, player_alliance, last_update],
        )?;
        Ok(WriteOutcome::Applied { rows })
    }

    /// Same as [`Self::save_player_intelligence`], stamped with the current time
    pub fn observe_player(
        &self,
        server_id: ServerId,
        player_name: &str,
        player_alliance: &str,
    ) -> StoreResult<WriteOutcome> {
        self.save_player_intelligence(server_id, player_name, player_alliance, &timestamp_now())
    }

    pub fn remove_player_intelligence(
        &self,
        server_id: ServerId,
        player_name: &str,
    ) -> StoreResult<WriteOutcome> {
        let rows = self.executor.write(
            "DELETE FROM PlayerIntelligence WHERE ServerID = ?1 AND PlayerName = ?2",
            params![server_id, player_name],
        )?;
        Ok(WriteOutcome::from_keyed(rows))
    }

    pub fn player_intelligence(&self, server_id: ServerId) -> StoreResult<Vec<PlayerIntelRecord>> {
        self.executor.read_with(
            "SELECT ServerID, PlayerName, PlayerAlliance, LastUpdate
             FROM PlayerIntelligence WHERE ServerID = ?1 ORDER BY PlayerName",
            [server_id],
            |row| {
                Ok(PlayerIntelRecord {
                    server_id: row.get(0)?,
                    player_name: text_or_default(row, 1)?,
                    player_alliance: text_or_default(row, 2)?,
                    last_update: text_or_default(row, 3)?,
                })
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::open_store;
    use super::*;
    use chrono::NaiveDateTime;

    #[test]
    fn test_save_intelligence_defaults_and_overwrite() {
        let (_dir, store) = open_store();
        let repo = store.intel();

        repo.save_intelligence(1, "ENEMY", &AllianceIntel::default())
            .unwrap();
        let war = AllianceIntel {
            war: true,
            alliance_kos: true,
            ..Default::default()
        };
        repo.save_intelligence(1, "ENEMY", &war).unwrap();

        let records = repo.alliance_intelligence(1).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].intel, war);
    }

    #[test]
    fn test_player_intelligence_save_and_remove() {
        let (_dir, store) = open_store();
        let repo = store.intel();

        repo.save_player_intelligence(1, "Bob", "A1", "2024-01-01")
            .unwrap();
        repo.save_player_intelligence(1, "Bob", "A2", "2024-02-01")
            .unwrap();

        let records = repo.player_intelligence(1).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].player_alliance, "A2");
        assert_eq!(records[0].last_update, "2024-02-01");

        assert!(repo.remove_player_intelligence(1, "Bob").unwrap().is_applied());
        assert!(repo.player_intelligence(1).unwrap().is_empty());
        assert_eq!(
            repo.remove_player_intelligence(1, "Bob").unwrap(),
            WriteOutcome::NotFound
        );
    }

    #[test]
    fn test_observe_player_stamps_time() {
        let (_dir, store) = open_store();
        let repo = store.intel();

        repo.observe_player(1, "Ann", "A3").unwrap();
        let record = &repo.player_intelligence(1).unwrap()[0];
        assert!(NaiveDateTime::parse_from_str(&record.last_update, TIMESTAMP_FORMAT).is_ok());
    }
}
