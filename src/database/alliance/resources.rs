//! Resource repository
//!
//! Resources are global reference data (where to mine what), shared by every
//! guild. Application writes replace existing rows; the default seed data
//! loaded by the schema manager never does.

use crate::database::core::{text_or_default, QueryExecutor, StoreResult, WriteOutcome};
use rusqlite::params;
use serde::{Deserialize, Serialize};

/// A record from the Resources table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "display", derive(tabled::Tabled))]
pub struct ResourceRecord {
    pub resource: String,
    pub tier: u32,
    pub system: String,
    pub region: String,
    pub reliability_score: i64,
}

pub struct ResourceRepository<'a> {
    executor: &'a QueryExecutor,
}

impl<'a> ResourceRepository<'a> {
    pub fn new(executor: &'a QueryExecutor) -> Self {
        Self { executor }
    }

    /// Insert or fully replace a resource location
    pub fn save_resource(
        &self,
        resource: &str,
        tier: u32,
        system: &str,
        region: &str,
        reliability_score: i64,
    ) -> StoreResult<WriteOutcome> {
        let rows = self.executor.write(
            "INSERT OR REPLACE INTO Resources (Resource, Tier, System, Region, ReliabilityScore)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![resource, tier, system, region, reliability_score],
        )?;
        Ok(WriteOutcome::Applied { rows })
    }

    /// All known resource locations
    pub fn resources(&self) -> StoreResult<Vec<ResourceRecord>> {
        self.executor.read_with(
            "SELECT Resource, Tier, System, Region, ReliabilityScore FROM Resources
             ORDER BY Resource, Tier, System",
            [],
            map_resource,
        )
    }

    /// Locations of one resource, most reliable first
    pub fn find(&self, resource: &str) -> StoreResult<Vec<ResourceRecord>> {
        self.executor.read_with(
            "SELECT Resource, Tier, System, Region, ReliabilityScore FROM Resources
             WHERE Resource = ?1 COLLATE NOCASE
             ORDER BY ReliabilityScore DESC, Tier, System",
            [resource],
            map_resource,
        )
    }
}

fn map_resource(row: &rusqlite::Row<'_>) -> rusqlite::Result<ResourceRecord> {
    Ok(ResourceRecord {
        resource: text_or_default(row, 0)?,
        tier: row.get::<_, Option<u32>>(1)?.unwrap_or(0),
        system: text_or_default(row, 2)?,
        region: text_or_default(row, 3)?,
        reliability_score: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
    })
}
