//! Database module
//!
//! This module provides all persistence for the bot, organized into:
//!
//! - **core**: connection provider, query executor, schema management
//! - **alliance**: the data-access API used by command handlers
//!
//! # Architecture
//!
//! ```text
//! database/
//! ├── core/            # Foundation
//! │   ├── connection   # SQLite DatabaseConn wrapper
//! │   ├── executor     # read/write primitives, transactions
//! │   ├── error        # StoreError, WriteOutcome
//! │   └── schema       # table definitions, create/reset/seed
//! │
//! └── alliance/        # Data access
//!     ├── servers      # guild settings, general info, server deletion
//!     ├── alliances    # master and sub-alliances
//!     ├── permissions  # role capability flags
//!     ├── members      # members and kill counts
//!     ├── intel        # alliance and player intelligence
//!     ├── roe          # rules-of-engagement violations
//!     └── resources    # global resource locations
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use stfc_data::database::AllianceStore;
//!
//! # fn main() -> Result<(), stfc_data::database::StoreError> {
//! let store = AllianceStore::open("stfc_bot.db")?;
//!
//! store.alliances().save_alliance(1, "A1")?;
//! store.alliances().save_alliance(1, "A2")?;
//! store.alliances().set_new_master(1, "A2")?;
//!
//! for alliance in store.alliances().alliances(1)? {
//!     println!("{} {:?}", alliance.alliance_id, alliance.kind);
//! }
//! # Ok(())
//! # }
//! ```

pub mod alliance;
pub mod core;

// Core types
pub use self::core::{
    DatabaseConn, InitReport, QueryExecutor, ResetReport, Row, SchemaDefinitions, SchemaManager,
    SchemaStatus, StoreError, StoreResult, WriteOutcome,
};

// Data access
pub use alliance::{
    timestamp_now, AllianceIntel, AllianceIntelRecord, AllianceKind, AllianceRecord,
    AllianceRepository, AllianceStore, GeneralInfo, IntelRepository, MemberRecord,
    MemberRepository, PlayerIntelRecord, PurgeReport, ResourceRecord, ResourceRepository,
    RoeRecord, RoeRepository, RolePermissions, RolePermissionsRecord, RolePermissionsRepository,
    ServerId, ServerRepository, ServerSettings, TIMESTAMP_FORMAT,
};

/// Ensure the directory holding the database file exists
pub fn ensure_parent_dir(path: &std::path::Path) -> anyhow::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir).map_err(|e| {
            anyhow::anyhow!("Failed to create data directory '{}': {}", dir.display(), e)
        }),
        _ => Ok(()),
    }
}
