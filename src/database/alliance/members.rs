//! Alliance member repository

use super::ServerId;
use crate::database::core::{text_or_default, QueryExecutor, StoreResult, WriteOutcome};
use rusqlite::params;
use serde::Serialize;

/// A record from the AllianceMember table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberRecord {
    pub server_id: ServerId,
    /// `None` for rows stored before the player ID was recorded
    pub player_id: Option<String>,
    pub alliance_id: String,
    pub player_name: String,
    pub kill_count: u32,
}

pub struct MemberRepository<'a> {
    executor: &'a QueryExecutor,
}

impl<'a> MemberRepository<'a> {
    pub fn new(executor: &'a QueryExecutor) -> Self {
        Self { executor }
    }

    /// Store a member row with its new kill count
    ///
    /// The caller passes the already-incremented total; the row is replaced
    /// as a whole, including the player's alliance and name.
    pub fn increment_member_kill_count(
        &self,
        server_id: ServerId,
        alliance_id: &str,
        player_id: &str,
        player_name: &str,
        kill_count: u32,
    ) -> StoreResult<WriteOutcome> {
        let rows = self.executor.write(
            "INSERT OR REPLACE INTO AllianceMember
                (ServerID, AllianceID, PlayerID, PlayerName, KillCount)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![server_id, alliance_id, player_id, player_name, kill_count],
        )?;
        Ok(WriteOutcome::Applied { rows })
    }

    pub fn member(
        &self,
        server_id: ServerId,
        player_id: &str,
    ) -> StoreResult<Option<MemberRecord>> {
        let rows = self.executor.read_with(
            "SELECT ServerID, PlayerID, AllianceID, PlayerName, KillCount
             FROM AllianceMember WHERE ServerID = ?1 AND PlayerID = ?2",
            params![server_id, player_id],
            map_member,
        )?;
        Ok(rows.into_iter().next())
    }

    /// Members of a guild, highest kill count first
    pub fn members(&self, server_id: ServerId) -> StoreResult<Vec<MemberRecord>> {
        self.executor.read_with(
            "SELECT ServerID, PlayerID, AllianceID, PlayerName, KillCount
             FROM AllianceMember WHERE ServerID = ?1
             ORDER BY KillCount DESC, PlayerName",
            [server_id],
            map_member,
        )
    }
}

fn map_member(row: &rusqlite::Row<'_>) -> rusqlite::Result<MemberRecord> {
    Ok(MemberRecord {
        server_id: row.get(0)?,
        player_id: row.get(1)?,
        alliance_id: text_or_default(row, 2)?,
        player_name: text_or_default(row, 3)?,
        kill_count: row.get::<_, Option<u32>>(4)?.unwrap_or(0),
    })
}
