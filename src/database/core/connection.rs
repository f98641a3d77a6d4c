//! Database connection management
//!
//! The store never keeps a handle between calls: every read or write opens a
//! fresh [`DatabaseConn`] on the configured file and drops it when done.

use crate::database::core::error::{StoreError, StoreResult};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Core database connection wrapper
///
/// `DatabaseConn` is a thin wrapper around a SQLite connection opened on a
/// single local file. Dropping it closes the connection.
pub struct DatabaseConn {
    pub conn: Connection,
    path: PathBuf,
}

impl DatabaseConn {
    /// Open a connection to the database file at `path`
    ///
    /// The file is created if it does not exist yet. Failure to open is
    /// returned as [`StoreError::Open`]; there is no retry.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(DatabaseConn {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Path of the underlying database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Version string of the linked SQLite library
    pub fn sqlite_version(&self) -> StoreResult<String> {
        let sql = "SELECT sqlite_version()";
        self.conn
            .query_row(sql, [], |row| row.get(0))
            .map_err(|e| StoreError::query(sql, e))
    }

    /// Check if a table exists in the database
    pub fn table_exists(&self, table_name: &str) -> StoreResult<bool> {
        let sql = "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1";
        let count: i64 = self
            .conn
            .query_row(sql, [table_name], |row| row.get(0))
            .map_err(|e| StoreError::query(sql, e))?;
        Ok(count > 0)
    }

    /// Get the row count for a table
    pub fn table_count(&self, table_name: &str) -> StoreResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table_name);
        self.conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|e| StoreError::query(&sql, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bot.db");

        let db = DatabaseConn::open(&path).unwrap();
        db.conn
            .execute("CREATE TABLE test (id INTEGER PRIMARY KEY)", [])
            .unwrap();

        assert!(path.exists());
        assert_eq!(db.path(), path.as_path());
    }

    #[test]
    fn test_open_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no-such-dir").join("bot.db");

        match DatabaseConn::open(&path) {
            Err(StoreError::Open { path: failed, .. }) => assert_eq!(failed, path),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("opening inside a missing directory should fail"),
        }
    }

    #[test]
    fn test_table_exists_and_count() {
        let dir = TempDir::new().unwrap();
        let db = DatabaseConn::open(&dir.path().join("bot.db")).unwrap();
        db.conn
            .execute("CREATE TABLE test_table (id INTEGER PRIMARY KEY)", [])
            .unwrap();
        db.conn
            .execute("INSERT INTO test_table (id) VALUES (1), (2), (3)", [])
            .unwrap();

        assert!(db.table_exists("test_table").unwrap());
        assert!(!db.table_exists("nonexistent_table").unwrap());
        assert_eq!(db.table_count("test_table").unwrap(), 3);
    }

    #[test]
    fn test_sqlite_version() {
        let dir = TempDir::new().unwrap();
        let db = DatabaseConn::open(&dir.path().join("bot.db")).unwrap();
        let version = db.sqlite_version().unwrap();
        assert!(version.starts_with('3'));
    }
}
