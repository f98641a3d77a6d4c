//! Server repository
//!
//! Guild-level settings (`Server`), narrative reference text
//! (`GeneralAllianceInfo`) and whole-server deletion.

use super::ServerId;
use crate::database::core::{
    flag_or_default, text_or_default, QueryExecutor, SchemaDefinitions, StoreError, StoreResult,
    WriteOutcome,
};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Settings row for one guild
///
/// `war_points_channel` is not written by [`ServerRepository::save_settings`];
/// saving settings replaces the whole row, which clears it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    pub server_id: ServerId,
    pub alliance_name: String,
    pub manual_register: bool,
    pub create_channel: bool,
    pub channel_category: String,
    pub allow_ally_intel_access: bool,
    pub war_points_channel: Option<String>,
}

impl ServerSettings {
    /// Settings with every flag off and no channel category
    pub fn new(server_id: ServerId, alliance_name: &str) -> Self {
        Self {
            server_id,
            alliance_name: alliance_name.to_string(),
            manual_register: false,
            create_channel: false,
            channel_category: String::new(),
            allow_ally_intel_access: false,
            war_points_channel: None,
        }
    }
}

/// Free-text reference information for a guild; omitted fields are empty
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralInfo {
    pub home_info: String,
    pub roe_rules: String,
    pub allies_info: String,
    pub nap_info: String,
    pub cog_info: String,
    pub kos_info: String,
    pub war_info: String,
}

/// Outcome of deleting a server's data, table by table
#[derive(Debug, Clone, Default, Serialize)]
pub struct PurgeReport {
    pub server_id: ServerId,
    /// `(table, rows deleted)` for every table that was cleared
    pub deleted: Vec<(String, usize)>,
    /// `(table, error)` for every table that could not be cleared
    pub failed: Vec<(String, String)>,
}

impl PurgeReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn rows_deleted(&self) -> usize {
        self.deleted.iter().map(|(_, rows)| rows).sum()
    }
}

/// Repository for server-level data
pub struct ServerRepository<'a> {
    executor: &'a QueryExecutor,
}

impl<'a> ServerRepository<'a> {
    pub fn new(executor: &'a QueryExecutor) -> Self {
        Self { executor }
    }

    /// Insert or fully replace the settings row of a guild
    pub fn save_settings(&self, settings: &ServerSettings) -> StoreResult<WriteOutcome> {
        let rows = self.executor.write(
            "INSERT OR REPLACE INTO Server
                (ServerID, AllianceName, ManualRegister, CreateChannel, ChannelCategory,
                 AllowAllyIntelAccess)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                settings.server_id,
                settings.alliance_name,
                settings.manual_register,
                settings.create_channel,
                settings.channel_category,
                settings.allow_ally_intel_access,
            ],
        )?;
        Ok(WriteOutcome::Applied { rows })
    }

    /// Set the war points channel of an already registered guild
    pub fn set_war_points_channel(
        &self,
        server_id: ServerId,
        channel_name: &str,
    ) -> StoreResult<WriteOutcome> {
        let rows = self.executor.write(
            "UPDATE Server SET WarPointsChannel = ?1 WHERE ServerID = ?2",
            params![channel_name, server_id],
        )?;
        Ok(WriteOutcome::from_keyed(rows))
    }

    pub fn settings(&self, server_id: ServerId) -> StoreResult<Option<ServerSettings>> {
        let rows = self.executor.read_with(
            "SELECT ServerID, AllianceName, ManualRegister, CreateChannel, ChannelCategory,
                    AllowAllyIntelAccess, WarPointsChannel
             FROM Server WHERE ServerID = ?1",
            [server_id],
            |row| {
                Ok(ServerSettings {
                    server_id: row.get(0)?,
                    alliance_name: text_or_default(row, 1)?,
                    manual_register: flag_or_default(row, 2)?,
                    create_channel: flag_or_default(row, 3)?,
                    channel_category: text_or_default(row, 4)?,
                    allow_ally_intel_access: flag_or_default(row, 5)?,
                    war_points_channel: row.get(6)?,
                })
            },
        )?;
        Ok(rows.into_iter().next())
    }

    /// Insert or fully replace the general information of a guild
    pub fn save_general_info(
        &self,
        server_id: ServerId,
        info: &GeneralInfo,
    ) -> StoreResult<WriteOutcome> {
        let rows = self.executor.write(
            "INSERT OR REPLACE INTO GeneralAllianceInfo
                (ServerID, HomeInfo, RoeRules, AlliesInfo, NAPInfo, COGInfo, KosInfo, WarInfo)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                server_id,
                info.home_info,
                info.roe_rules,
                info.allies_info,
                info.nap_info,
                info.cog_info,
                info.kos_info,
                info.war_info,
            ],
        )?;
        Ok(WriteOutcome::Applied { rows })
    }

    pub fn general_info(&self, server_id: ServerId) -> StoreResult<Option<GeneralInfo>> {
        let db = self.executor.connect()?;
        let sql = "SELECT HomeInfo, RoeRules, AlliesInfo, NAPInfo, COGInfo, KosInfo, WarInfo
                   FROM GeneralAllianceInfo WHERE ServerID = ?1";

        db.conn
            .query_row(sql, [server_id], |row| {
                let text = |i: usize| text_or_default(row, i);
                Ok(GeneralInfo {
                    home_info: text(0)?,
                    roe_rules: text(1)?,
                    allies_info: text(2)?,
                    nap_info: text(3)?,
                    cog_info: text(4)?,
                    kos_info: text(5)?,
                    war_info: text(6)?,
                })
            })
            .optional()
            .map_err(|e| StoreError::query(sql, e))
    }

    /// Delete every row keyed by `server_id` from the server-owned tables
    ///
    /// `Resources` is global and left alone. Each table is cleared on its
    /// own; a failure on one table is logged and reported without stopping
    /// the others.
    pub fn delete_server_data(&self, server_id: ServerId) -> StoreResult<PurgeReport> {
        let db = self.executor.connect()?;
        let mut report = PurgeReport {
            server_id,
            ..Default::default()
        };

        for table in SchemaDefinitions::SERVER_SCOPED_TABLES {
            let sql = format!("DELETE FROM {} WHERE ServerID = ?1", table);
            match db.conn.execute(&sql, [server_id]) {
                Ok(rows) => report.deleted.push((table.to_string(), rows)),
                Err(e) => {
                    let err = StoreError::query(&sql, e);
                    warn!("Error deleting from {}: {}", table, err);
                    report.failed.push((table.to_string(), err.to_string()));
                }
            }
        }

        info!(
            "Server {} data deleted ({} rows, {} tables failed)",
            server_id,
            report.rows_deleted(),
            report.failed.len()
        );
        Ok(report)
    }
}
