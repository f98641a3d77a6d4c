//! Query execution primitives
//!
//! [`QueryExecutor`] owns nothing but the database location. Each call opens
//! its own connection, runs one statement (or one scoped transaction), commits
//! and closes. Failures are logged and then returned to the caller as a
//! [`StoreError`] instead of being swallowed.

use crate::database::core::connection::DatabaseConn;
use crate::database::core::error::{StoreError, StoreResult};
use rusqlite::types::Value;
use rusqlite::{Params, Transaction};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A materialized result row, one dynamically typed value per column
pub type Row = Vec<Value>;

/// Per-call statement executor bound to one database file
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    path: PathBuf,
}

impl QueryExecutor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a fresh connection on the database file
    pub fn connect(&self) -> StoreResult<DatabaseConn> {
        DatabaseConn::open(&self.path).inspect_err(|e| warn!("{}", e))
    }

    /// Run a query without parameter binding and materialize every row
    pub fn read(&self, sql: &str) -> StoreResult<Vec<Row>> {
        let db = self.connect()?;
        debug!(sql, "read");

        let result = (|| -> rusqlite::Result<Vec<Row>> {
            let mut stmt = db.conn.prepare(sql)?;
            let columns = stmt.column_count();
            let rows = stmt.query_map([], |row| {
                (0..columns)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<rusqlite::Result<Row>>()
            })?;
            rows.collect::<rusqlite::Result<Vec<Row>>>()
        })();

        result
            .map_err(|e| StoreError::query(sql, e))
            .inspect_err(|e| warn!("database read error: {}", e))
    }

    /// Run a parameterized query and map every row with `f`
    pub fn read_with<P, T, F>(&self, sql: &str, params: P, f: F) -> StoreResult<Vec<T>>
    where
        P: Params,
        F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
    {
        let db = self.connect()?;
        debug!(sql, "read");

        let result = (|| -> rusqlite::Result<Vec<T>> {
            let mut stmt = db.conn.prepare(sql)?;
            let rows = stmt.query_map(params, f)?;
            rows.collect::<rusqlite::Result<Vec<T>>>()
        })();

        result
            .map_err(|e| StoreError::query(sql, e))
            .inspect_err(|e| warn!("database read error: {}", e))
    }

    /// Execute one parameterized insert/update/delete and commit it
    ///
    /// Returns the number of rows changed. SQLite runs the statement in
    /// autocommit mode, so success means the change is durable.
    pub fn write<P: Params>(&self, sql: &str, params: P) -> StoreResult<usize> {
        let db = self.connect()?;
        debug!(sql, "write");

        db.conn
            .execute(sql, params)
            .map_err(|e| StoreError::query(sql, e))
            .inspect_err(|e| warn!("database execute error: {}", e))
    }

    /// Run `f` inside a single transaction on a fresh connection
    ///
    /// The transaction commits only if `f` returns `Ok`; any error rolls it
    /// back when the transaction is dropped.
    pub fn transaction<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> StoreResult<T>,
    {
        let mut db = self.connect()?;
        let tx = db
            .conn
            .transaction()
            .map_err(StoreError::Transaction)
            .inspect_err(|e| warn!("{}", e))?;

        let value = f(&tx).inspect_err(|e| warn!("rolling back transaction: {}", e))?;

        tx.commit()
            .map_err(StoreError::Transaction)
            .inspect_err(|e| warn!("{}", e))?;
        Ok(value)
    }
}

/// Text column that may hold NULL in rows written by older bot versions
pub(crate) fn text_or_default(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
}

/// Integer flag column; NULL reads as unset
pub(crate) fn flag_or_default(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<bool> {
    Ok(row.get::<_, Option<bool>>(idx)?.unwrap_or(false))
}

/// Execute one statement inside an open transaction
pub(crate) fn execute_in<P: Params>(
    tx: &Transaction<'_>,
    sql: &str,
    params: P,
) -> StoreResult<usize> {
    debug!(sql, "write (transaction)");
    tx.execute(sql, params).map_err(|e| StoreError::query(sql, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;
    use tempfile::TempDir;

    fn executor(dir: &TempDir) -> QueryExecutor {
        let exec = QueryExecutor::new(dir.path().join("bot.db"));
        exec.write(
            "CREATE TABLE kv (k TEXT PRIMARY KEY, v INTEGER NOT NULL)",
            [],
        )
        .unwrap();
        exec
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let exec = executor(&dir);

        assert_eq!(exec.write("INSERT INTO kv VALUES (?1, ?2)", params!["a", 1]).unwrap(), 1);
        assert_eq!(exec.write("INSERT INTO kv VALUES (?1, ?2)", params!["b", 2]).unwrap(), 1);

        let rows = exec.read("SELECT k, v FROM kv ORDER BY k").unwrap();
        assert_eq!(
            rows,
            vec![
                vec![Value::Text("a".into()), Value::Integer(1)],
                vec![Value::Text("b".into()), Value::Integer(2)],
            ]
        );
    }

    #[test]
    fn test_read_empty_is_ok() {
        let dir = TempDir::new().unwrap();
        let exec = executor(&dir);
        assert!(exec.read("SELECT * FROM kv").unwrap().is_empty());
    }

    #[test]
    fn test_read_failure_is_distinguishable() {
        let dir = TempDir::new().unwrap();
        let exec = executor(&dir);
        let err = exec.read("SELECT * FROM missing_table").unwrap_err();
        assert!(matches!(err, StoreError::Query { .. }));
    }

    #[test]
    fn test_write_constraint_violation() {
        let dir = TempDir::new().unwrap();
        let exec = executor(&dir);
        exec.write("INSERT INTO kv VALUES (?1, ?2)", params!["a", 1]).unwrap();

        let err = exec
            .write("INSERT INTO kv VALUES (?1, ?2)", params!["a", 2])
            .unwrap_err();
        assert!(matches!(err, StoreError::Query { .. }));
    }

    #[test]
    fn test_read_with_mapper() {
        let dir = TempDir::new().unwrap();
        let exec = executor(&dir);
        exec.write("INSERT INTO kv VALUES (?1, ?2)", params!["a", 7]).unwrap();

        let values: Vec<i64> = exec
            .read_with("SELECT v FROM kv WHERE k = ?1", ["a"], |row| row.get(0))
            .unwrap();
        assert_eq!(values, vec![7]);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let dir = TempDir::new().unwrap();
        let exec = executor(&dir);

        let result: StoreResult<()> = exec.transaction(|tx| {
            execute_in(tx, "INSERT INTO kv VALUES (?1, ?2)", params!["a", 1])?;
            execute_in(tx, "INSERT INTO kv VALUES (?1, ?2)", params!["a", 2])?;
            Ok(())
        });

        assert!(result.is_err());
        assert!(exec.read("SELECT * FROM kv").unwrap().is_empty());
    }

    #[test]
    fn test_nullable_column_helpers() {
        let dir = TempDir::new().unwrap();
        let exec = QueryExecutor::new(dir.path().join("bot.db"));
        exec.write("CREATE TABLE t (name TEXT, flag INTEGER)", []).unwrap();
        exec.write("INSERT INTO t VALUES (NULL, NULL)", []).unwrap();
        exec.write("INSERT INTO t VALUES ('x', 1)", []).unwrap();

        let rows = exec
            .read_with("SELECT name, flag FROM t ORDER BY name", [], |row| {
                Ok((text_or_default(row, 0)?, flag_or_default(row, 1)?))
            })
            .unwrap();
        assert_eq!(rows, vec![(String::new(), false), ("x".to_string(), true)]);
    }

    #[test]
    fn test_transaction_commits() {
        let dir = TempDir::new().unwrap();
        let exec = executor(&dir);

        let changed = exec
            .transaction(|tx| {
                let a = execute_in(tx, "INSERT INTO kv VALUES (?1, ?2)", params!["a", 1])?;
                let b = execute_in(tx, "INSERT INTO kv VALUES (?1, ?2)", params!["b", 2])?;
                Ok(a + b)
            })
            .unwrap();

        assert_eq!(changed, 2);
        assert_eq!(exec.read("SELECT * FROM kv").unwrap().len(), 2);
    }
}
