//! Role permissions repository

use super::ServerId;
use crate::database::core::{
    flag_or_default, text_or_default, QueryExecutor, StoreResult, WriteOutcome,
};
use rusqlite::params;
use serde::{Deserialize, Serialize};

/// Capability flags granted to a guild role; all off by default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissions {
    pub member_role: bool,
    pub ambassador_role: bool,
    pub ally_role: bool,
    pub admin_role: bool,
    pub access_ambassador_channels: bool,
}

/// A record from the AllianceRolePermissions table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RolePermissionsRecord {
    pub server_id: ServerId,
    pub role: String,
    pub permissions: RolePermissions,
}

pub struct RolePermissionsRepository<'a> {
    executor: &'a QueryExecutor,
}

impl<'a> RolePermissionsRepository<'a> {
    pub fn new(executor: &'a QueryExecutor) -> Self {
        Self { executor }
    }

    /// Insert or fully replace the flags of one role
    pub fn save_role_permissions(
        &self,
        server_id: ServerId,
        role: &str,
        permissions: &RolePermissions,
    ) -> StoreResult<WriteOutcome> {
        let rows = self.executor.write(
            "INSERT OR REPLACE INTO AllianceRolePermissions
                (ServerID, Role, MemberRole, AmbassadorRole, AllyRole, AdminRole,
                 AccessAmbassadorChannels)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                server_id,
                role,
                permissions.member_role,
                permissions.ambassador_role,
                permissions.ally_role,
                permissions.admin_role,
                permissions.access_ambassador_channels,
            ],
        )?;
        Ok(WriteOutcome::Applied { rows })
    }

    /// All role permissions of a guild, ordered by role name
    pub fn role_permissions(
        &self,
        server_id: ServerId,
    ) -> StoreResult<Vec<RolePermissionsRecord>> {
        self.executor.read_with(
            "SELECT ServerID, Role, MemberRole, AmbassadorRole, AllyRole, AdminRole,
                    AccessAmbassadorChannels
             FROM AllianceRolePermissions WHERE ServerID = ?1 ORDER BY Role",
            [server_id],
            |row| {
                Ok(RolePermissionsRecord {
                    server_id: row.get(0)?,
                    role: text_or_default(row, 1)?,
                    permissions: RolePermissions {
                        member_role: flag_or_default(row, 2)?,
                        ambassador_role: flag_or_default(row, 3)?,
                        ally_role: flag_or_default(row, 4)?,
                        admin_role: flag_or_default(row, 5)?,
                        access_ambassador_channels: flag_or_default(row, 6)?,
                    },
                })
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::open_store;
    use super::*;

    #[test]
    fn test_default_permissions_are_all_off() {
        let (_dir, store) = open_store();
        let repo = store.permissions();

        repo.save_role_permissions(1, "Recruit", &RolePermissions::default())
            .unwrap();

        let records = repo.role_permissions(1).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].role, "Recruit");
        assert_eq!(records[0].permissions, RolePermissions::default());
    }

    #[test]
    fn test_upsert_replaces_flags() {
        let (_dir, store) = open_store();
        let repo = store.permissions();

        let officer = RolePermissions {
            member_role: true,
            admin_role: true,
            ..Default::default()
        };
        repo.save_role_permissions(1, "Officer", &officer).unwrap();

        let ambassador = RolePermissions {
            ambassador_role: true,
            access_ambassador_channels: true,
            ..Default::default()
        };
        repo.save_role_permissions(1, "Officer", &ambassador).unwrap();

        let records = repo.role_permissions(1).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].permissions, ambassador);
    }

    #[test]
    fn test_null_flags_read_as_off() {
        let (_dir, store) = open_store();
        store
            .executor()
            .write(
                "INSERT INTO AllianceRolePermissions (ServerID, Role, MemberRole, AdminRole)
                 VALUES (1, 'Recruit', NULL, 1)",
                [],
            )
            .unwrap();

        let records = store.permissions().role_permissions(1).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].permissions,
            RolePermissions {
                admin_role: true,
                ..Default::default()
            }
        );
    }
}
