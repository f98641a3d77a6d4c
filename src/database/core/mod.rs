//! Core database infrastructure
//!
//! This module provides the foundational database components:
//! - `DatabaseConn`: connection provider for the single database file
//! - `QueryExecutor`: per-call read/write primitives and scoped transactions
//! - `SchemaManager`: table creation, reset and default data seeding
//! - `StoreError` / `WriteOutcome`: distinguishable results for every call

mod connection;
mod error;
mod executor;
mod schema;

pub use connection::DatabaseConn;
pub use error::{StoreError, StoreResult, WriteOutcome};
pub(crate) use executor::{execute_in, flag_or_default, text_or_default};
pub use executor::{QueryExecutor, Row};
pub use schema::{
    InitReport, ResetReport, ResourceSeed, SchemaDefinitions, SchemaManager, SchemaStatus,
};
