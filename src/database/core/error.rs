//! Error and outcome types for the alliance store
//!
//! Every data-access call reports through [`StoreResult`], so callers can tell
//! "zero rows because the table is empty" apart from "zero rows because the
//! query failed".

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database file could not be opened
    #[error("failed to open database at '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A statement failed (bad SQL, constraint violation, locked file, ...)
    #[error("query failed ({sql}): {source}")]
    Query {
        sql: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Beginning or committing a transaction failed
    #[error("transaction failed: {0}")]
    Transaction(#[source] rusqlite::Error),
}

impl StoreError {
    pub(crate) fn query(sql: &str, source: rusqlite::Error) -> Self {
        StoreError::Query {
            sql: compact_sql(sql),
            source,
        }
    }

    /// Whether the failure came from SQLite reporting the file as busy or locked
    pub fn is_contention(&self) -> bool {
        let source = match self {
            StoreError::Open { source, .. }
            | StoreError::Query { source, .. }
            | StoreError::Transaction(source) => source,
        };
        matches!(
            source.sqlite_error_code(),
            Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked)
        )
    }
}

/// Convenience alias for results with [`StoreError`].
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result of a successful write statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The statement changed `rows` rows
    Applied { rows: usize },

    /// The statement was keyed on a row that does not exist
    NotFound,
}

impl WriteOutcome {
    /// Upserts always touch a row; keyed updates and deletes may not
    pub(crate) fn from_keyed(rows: usize) -> Self {
        if rows == 0 {
            WriteOutcome::NotFound
        } else {
            WriteOutcome::Applied { rows }
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, WriteOutcome::Applied { .. })
    }

    pub fn rows(&self) -> usize {
        match self {
            WriteOutcome::Applied { rows } => *rows,
            WriteOutcome::NotFound => 0,
        }
    }
}

/// Collapse whitespace so multi-line SQL templates read well in log lines
fn compact_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyed_outcome() {
        assert_eq!(WriteOutcome::from_keyed(0), WriteOutcome::NotFound);
        assert_eq!(
            WriteOutcome::from_keyed(2),
            WriteOutcome::Applied { rows: 2 }
        );
        assert!(!WriteOutcome::NotFound.is_applied());
        assert_eq!(WriteOutcome::NotFound.rows(), 0);
    }

    #[test]
    fn test_query_error_compacts_sql() {
        let err = StoreError::query(
            "SELECT *\n    FROM   Alliance",
            rusqlite::Error::QueryReturnedNoRows,
        );
        match &err {
            StoreError::Query { sql, .. } => assert_eq!(sql, "SELECT * FROM Alliance"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!err.is_contention());
    }
}
