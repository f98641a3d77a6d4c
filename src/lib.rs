#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! stfc-data - persistence layer for a Star Trek Fleet Command alliance bot
//!
//! The crate stores per-guild alliance data (server settings, alliances,
//! role permissions, members, intelligence, rules-of-engagement violations)
//! and a global resource reference table in a single SQLite file. It is used
//! as a library by the bot's command handlers and ships an operational CLI
//! (`stfc-data`) for initializing and inspecting the database.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | `display` | Table formatting with `tabled` | `tabled` |
//! | `cli` | The `stfc-data` binary | `display` + `clap`, `tracing-subscriber` |
//!
//! ```toml
//! # Library only
//! stfc-data = { version = "0.3", default-features = false }
//!
//! # Default (CLI binary)
//! stfc-data = "0.3"
//! ```
//!
//! # Architecture
//!
//! - **[`database`]**: all persistence
//!   - `core`: connection provider, query executor, schema manager, errors
//!   - `alliance`: [`AllianceStore`] and one repository per concern
//! - **[`config`]**: bot configuration and legacy config migration
//! - **[`output`]**: output formats for the CLI
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use stfc_data::database::{AllianceIntel, AllianceStore, RolePermissions, WriteOutcome};
//!
//! # fn main() -> anyhow::Result<()> {
//! let store = AllianceStore::open("stfc_bot.db")?;
//! store.schema().seed_default_resources()?;
//!
//! let perms = RolePermissions {
//!     admin_role: true,
//!     ..Default::default()
//! };
//! store.permissions().save_role_permissions(42, "Officer", &perms)?;
//!
//! let war = AllianceIntel { war: true, ..Default::default() };
//! store.intel().save_intelligence(42, "ENEMY", &war)?;
//!
//! if store.roe().remove_roe(42, "A1", "Bob")? == WriteOutcome::NotFound {
//!     println!("no violation recorded");
//! }
//!
//! let report = store.delete_server_data(42)?;
//! println!("removed {} rows", report.rows_deleted());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod database;
pub mod output;

// =============================================================================
// Configuration
// =============================================================================

pub use config::{
    format_size, get_database_info, migrate_legacy_config, BotConfig, BotType, Credentials,
    DatabaseInfo, LegacyConfig, MigrationReport, TableInfo,
};

// =============================================================================
// Database
// =============================================================================

pub use database::{
    AllianceStore, InitReport, PurgeReport, QueryExecutor, ResetReport, SchemaDefinitions,
    SchemaManager, SchemaStatus, ServerId, StoreError, StoreResult, WriteOutcome,
};

pub use output::OutputFormat;
