use std::path::Path;

use rusqlite::Connection;

use crate::errors::{CrossNavError, Result};

/// SQL for the cross-reference tables: files, occurrences, and their
/// outgoing target relations.
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// SQLite store for the cross-reference index.
///
/// The write path is snapshot loading: one bulk transaction per changed
/// file set, after which the tables are only read. Pragmas are picked for
/// that load-once/read-many shape rather than for sustained concurrent
/// writers.
pub struct Database {
    conn: Connection,
}

fn db_error(operation: &str, message: String) -> CrossNavError {
    CrossNavError::Database {
        message,
        operation: operation.to_string(),
    }
}

impl Database {
    /// Creates the index database at `db_path`, creating parent directories
    /// as needed and applying the schema.
    pub fn initialize(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| db_error("initialize", format!("cannot create index directory: {e}")))?;
        }

        let db = Self::open(db_path)?;
        db.conn
            .execute_batch(SCHEMA_SQL)
            .map_err(|e| db_error("initialize", format!("cannot apply index schema: {e}")))?;

        Ok(db)
    }

    /// Opens an existing index database at `db_path`.
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)
            .map_err(|e| db_error("open", format!("cannot open index database: {e}")))?;

        // WAL keeps follow queries readable while a snapshot load is in
        // progress; the short busy timeout only has to cover that one
        // writer. Targets dangle by design, so only the structural
        // source-row foreign keys are enforced.
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;
             PRAGMA synchronous = NORMAL;
             PRAGMA temp_store = MEMORY;",
        )
        .map_err(|e| db_error("open", format!("cannot apply pragmas: {e}")))?;

        Ok(Self { conn })
    }

    /// Returns a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Consumes the `Database`, closing the underlying connection.
    pub fn close(self) {
        drop(self.conn);
    }

    /// Compacts the database and refreshes query-planner statistics.
    ///
    /// Run after a snapshot load, which may have rewritten and deleted large
    /// parts of every table.
    pub fn optimize(&self) -> Result<()> {
        self.conn
            .execute_batch("VACUUM; ANALYZE;")
            .map_err(|e| db_error("optimize", format!("cannot optimize index database: {e}")))
    }

    /// Returns the on-disk size of the database file in bytes.
    pub fn size(&self) -> Result<u64> {
        let size: i64 = self
            .conn
            .query_row(
                "SELECT page_count * page_size FROM pragma_page_count(), pragma_page_size()",
                [],
                |row| row.get(0),
            )
            .map_err(|e| db_error("size", format!("cannot read database size: {e}")))?;
        Ok(size as u64)
    }
}
