//! Database schema management
//!
//! This module defines the nine tables of the alliance database and the
//! lifecycle operations over them: idempotent creation, full reset, and
//! seeding of the default resource reference data.
//!
//! There is no version metadata. Tables are created with
//! `CREATE TABLE IF NOT EXISTS` at startup and no foreign keys are declared,
//! so creation order does not matter.

use crate::database::core::error::{StoreError, StoreResult};
use crate::database::core::executor::{execute_in, QueryExecutor};
use rusqlite::params;
use serde::Serialize;
use tracing::{info, warn};

/// Schema definitions for all tables in the alliance database
/// `(Resource, Tier, System, Region, ReliabilityScore)` of a default resource row
pub type ResourceSeed = (&'static str, i64, &'static str, &'static str, i64);

pub struct SchemaDefinitions;

impl SchemaDefinitions {
    /// One row per guild, holding its settings
    pub const SERVER_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS Server (
            ServerID INTEGER PRIMARY KEY,
            AllianceName TEXT,
            ManualRegister INTEGER DEFAULT 0,
            CreateChannel INTEGER DEFAULT 0,
            ChannelCategory TEXT,
            WarPointsChannel TEXT,
            AllowAllyIntelAccess INTEGER DEFAULT 0
        );
    "#;

    pub const ALLIANCE_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS Alliance (
            ServerID INTEGER,
            AllianceID TEXT,
            SubAlliance INTEGER DEFAULT 0,
            PRIMARY KEY (ServerID, AllianceID)
        );
    "#;

    pub const ROLE_PERMISSIONS_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS AllianceRolePermissions (
            ServerID INTEGER,
            Role TEXT,
            MemberRole INTEGER DEFAULT 0,
            AmbassadorRole INTEGER DEFAULT 0,
            AllyRole INTEGER DEFAULT 0,
            AdminRole INTEGER DEFAULT 0,
            AccessAmbassadorChannels INTEGER DEFAULT 0,
            PRIMARY KEY (ServerID, Role)
        );
    "#;

    pub const MEMBER_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS AllianceMember (
            ServerID INTEGER,
            AllianceID TEXT,
            PlayerID TEXT,
            PlayerName TEXT,
            KillCount INTEGER DEFAULT 0,
            PRIMARY KEY (ServerID, PlayerID)
        );
    "#;

    pub const ALLIANCE_INTEL_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS AllianceIntelligence (
            ServerID INTEGER,
            AllianceID TEXT,
            AoA INTEGER DEFAULT 0,
            COGNAP INTEGER DEFAULT 0,
            PlayerKos INTEGER DEFAULT 0,
            GalacticKos INTEGER DEFAULT 0,
            AllianceKos INTEGER DEFAULT 0,
            NAP INTEGER DEFAULT 0,
            War INTEGER DEFAULT 0,
            PRIMARY KEY (ServerID, AllianceID)
        );
    "#;

    pub const PLAYER_INTEL_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS PlayerIntelligence (
            ServerID INTEGER,
            PlayerName TEXT,
            PlayerAlliance TEXT,
            LastUpdate TEXT,
            PRIMARY KEY (ServerID, PlayerName)
        );
    "#;

    pub const GENERAL_INFO_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS GeneralAllianceInfo (
            ServerID INTEGER PRIMARY KEY,
            HomeInfo TEXT,
            RoeRules TEXT,
            AlliesInfo TEXT,
            NAPInfo TEXT,
            COGInfo TEXT,
            KosInfo TEXT,
            WarInfo TEXT
        );
    "#;

    pub const ROE_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS ROE (
            ServerID INTEGER,
            AllianceID TEXT,
            PlayerName TEXT,
            Violations INTEGER DEFAULT 1,
            LastUpdated TEXT,
            PRIMARY KEY (ServerID, AllianceID, PlayerName)
        );
    "#;

    /// Global reference data, not owned by any server
    pub const RESOURCES_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS Resources (
            Resource TEXT,
            Tier INTEGER,
            System TEXT,
            Region TEXT,
            ReliabilityScore INTEGER DEFAULT 0,
            PRIMARY KEY (Resource, Tier, System)
        );
    "#;

    /// Every table as `(name, create statement)`
    pub const TABLES: &'static [(&'static str, &'static str)] = &[
        ("Server", Self::SERVER_TABLE),
        ("Alliance", Self::ALLIANCE_TABLE),
        ("AllianceRolePermissions", Self::ROLE_PERMISSIONS_TABLE),
        ("AllianceMember", Self::MEMBER_TABLE),
        ("AllianceIntelligence", Self::ALLIANCE_INTEL_TABLE),
        ("PlayerIntelligence", Self::PLAYER_INTEL_TABLE),
        ("GeneralAllianceInfo", Self::GENERAL_INFO_TABLE),
        ("ROE", Self::ROE_TABLE),
        ("Resources", Self::RESOURCES_TABLE),
    ];

    /// Tables keyed by `ServerID`; deleting a server clears all of them
    pub const SERVER_SCOPED_TABLES: &'static [&'static str] = &[
        "Server",
        "Alliance",
        "AllianceRolePermissions",
        "AllianceMember",
        "AllianceIntelligence",
        "PlayerIntelligence",
        "GeneralAllianceInfo",
        "ROE",
    ];

    /// Default resource rows: (resource, tier, system, region, reliability)
    pub const DEFAULT_RESOURCES: &'static [ResourceSeed] = &[
        ("crystal", 1, "Sol", "federation", 5),
        ("crystal", 2, "Wolf 359", "federation", 4),
        ("crystal", 3, "Vulcan", "federation", 3),
        ("crystal", 4, "Andoria", "federation", 2),
        ("ore", 1, "Qo'noS", "klingon", 5),
        ("ore", 2, "Kronos", "klingon", 4),
        ("ore", 3, "Rura Penthe", "klingon", 3),
        ("ore", 4, "Ketha", "klingon", 2),
        ("gas", 1, "Romulus", "romulan", 5),
        ("gas", 2, "Remus", "romulan", 4),
        ("gas", 3, "Reman", "romulan", 3),
        ("gas", 4, "Rator", "romulan", 2),
        ("dilithium", 1, "Deep Space", "neutral", 5),
        ("dilithium", 2, "Bajor", "neutral", 4),
        ("dilithium", 3, "Cardassia", "neutral", 3),
        ("dilithium", 4, "Terok Nor", "neutral", 2),
    ];

    /// Seeding never overwrites rows that already exist
    pub const SEED_RESOURCE_SQL: &'static str = r#"
        INSERT OR IGNORE INTO Resources (Resource, Tier, System, Region, ReliabilityScore)
        VALUES (?1, ?2, ?3, ?4, ?5)
    "#;

    pub fn table_names() -> impl Iterator<Item = &'static str> {
        Self::TABLES.iter().map(|(name, _)| *name)
    }
}

/// Status of the database schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SchemaStatus {
    /// None of the tables exist (fresh database)
    NotInitialized,

    /// Every table exists
    Current,

    /// Some tables are missing
    Incomplete { missing: Vec<String> },
}

impl std::fmt::Display for SchemaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaStatus::NotInitialized => write!(f, "not initialized"),
            SchemaStatus::Current => write!(f, "current"),
            SchemaStatus::Incomplete { missing } => {
                write!(f, "incomplete (missing: {})", missing.join(", "))
            }
        }
    }
}

/// Outcome of dropping every table
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResetReport {
    pub dropped: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl ResetReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcome of a full reset → create → seed cycle
#[derive(Debug, Clone, Serialize)]
pub struct InitReport {
    pub reset: ResetReport,
    pub seeded: usize,
}

/// Schema manager for the alliance database
///
/// Handles table creation, reset and default data seeding. Each operation
/// uses its own connection obtained from the executor.
pub struct SchemaManager<'a> {
    executor: &'a QueryExecutor,
}

impl<'a> SchemaManager<'a> {
    /// Create a new schema manager for the given executor
    pub fn new(executor: &'a QueryExecutor) -> Self {
        Self { executor }
    }

    /// Create every table that does not exist yet, then commit
    pub fn create_all_tables(&self) -> StoreResult<()> {
        self.executor.transaction(|tx| {
            for (_, create_sql) in SchemaDefinitions::TABLES {
                execute_in(tx, create_sql, [])?;
            }
            Ok(())
        })?;

        info!("Database tables created successfully");
        Ok(())
    }

    /// Drop every table, including `Resources`
    ///
    /// A failing drop is logged and recorded in the report; the remaining
    /// tables are still dropped. Only a failure to open the database is
    /// returned as an error.
    pub fn reset_all_tables(&self) -> StoreResult<ResetReport> {
        let db = self.executor.connect()?;
        let mut report = ResetReport::default();

        for table in SchemaDefinitions::table_names() {
            let sql = format!("DROP TABLE IF EXISTS {}", table);
            match db.conn.execute(&sql, []) {
                Ok(_) => report.dropped.push(table.to_string()),
                Err(e) => {
                    let err = StoreError::query(&sql, e);
                    warn!("Error dropping table {}: {}", table, err);
                    report.failed.push((table.to_string(), err.to_string()));
                }
            }
        }

        info!(
            "Database reset completed ({} dropped, {} failed)",
            report.dropped.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Insert the default resource rows, leaving existing rows untouched
    ///
    /// Returns the number of rows actually inserted.
    pub fn seed_default_resources(&self) -> StoreResult<usize> {
        let inserted = self.executor.transaction(|tx| {
            let mut inserted = 0;
            for (resource, tier, system, region, reliability) in
                SchemaDefinitions::DEFAULT_RESOURCES
            {
                match execute_in(
                    tx,
                    SchemaDefinitions::SEED_RESOURCE_SQL,
                    params![resource, tier, system, region, reliability],
                ) {
                    Ok(rows) => inserted += rows,
                    Err(e) => warn!("Error inserting resource {} T{}: {}", resource, tier, e),
                }
            }
            Ok(inserted)
        })?;

        info!("Default resource data loaded ({} new rows)", inserted);
        Ok(inserted)
    }

    /// Reset, recreate and seed the whole database
    pub fn initialize_database(&self) -> StoreResult<InitReport> {
        let reset = self.reset_all_tables()?;
        self.create_all_tables()?;
        let seeded = self.seed_default_resources()?;
        Ok(InitReport { reset, seeded })
    }

    /// Check which of the tables exist
    pub fn check_status(&self) -> StoreResult<SchemaStatus> {
        let db = self.executor.connect()?;

        let mut missing = Vec::new();
        for table in SchemaDefinitions::table_names() {
            if !db.table_exists(table)? {
                missing.push(table.to_string());
            }
        }

        Ok(if missing.is_empty() {
            SchemaStatus::Current
        } else if missing.len() == SchemaDefinitions::TABLES.len() {
            SchemaStatus::NotInitialized
        } else {
            SchemaStatus::Incomplete { missing }
        })
    }

    /// Row count per table; `None` for tables that do not exist
    pub fn table_counts(&self) -> StoreResult<Vec<(String, Option<u64>)>> {
        let db = self.executor.connect()?;

        let mut counts = Vec::new();
        for table in SchemaDefinitions::table_names() {
            let count = if db.table_exists(table)? {
                Some(db.table_count(table)?)
            } else {
                None
            };
            counts.push((table.to_string(), count));
        }
        Ok(counts)
    }
}
