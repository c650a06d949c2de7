use std::collections::{BTreeSet, HashMap};

use rusqlite::{params, OptionalExtension};

use super::connection::Database;
use crate::errors::{CrossNavError, Result};
use crate::index::{ErrorFallbackIndex, FileTable, SymbolIndex};
use crate::types::{FileId, Location, SymbolKind, SymbolOccurrence};

/// A row from the `files` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRow {
    pub id: FileId,
    pub path: String,
    pub content_hash: String,
    pub has_errors: bool,
    pub indexed_at: i64,
}

/// Maps a row from the `files` table to a `FileRow`.
fn row_to_file(row: &rusqlite::Row) -> rusqlite::Result<FileRow> {
    let has_errors: i32 = row.get("has_errors")?;
    Ok(FileRow {
        id: FileId(row.get::<_, u32>("id")?),
        path: row.get("path")?,
        content_hash: row.get("content_hash")?,
        has_errors: has_errors != 0,
        indexed_at: row.get("indexed_at")?,
    })
}

/// Maps a row from the `occurrences` table to a location and an occurrence
/// with an empty target set (targets are attached separately).
fn row_to_occurrence(row: &rusqlite::Row) -> rusqlite::Result<(Location, SymbolOccurrence)> {
    let kind_str: String = row.get("kind")?;
    let is_definition: i32 = row.get("is_definition")?;
    let loc = Location::new(FileId(row.get::<_, u32>("file_id")?), row.get("offset")?);

    Ok((
        loc,
        SymbolOccurrence {
            kind: SymbolKind::from_str(&kind_str).unwrap_or(SymbolKind::Other),
            name: row.get("name")?,
            is_definition: is_definition != 0,
            symbol_length: row.get("symbol_length")?,
            targets: BTreeSet::new(),
        },
    ))
}

// ---------------------------------------------------------------------------
// File operations
// ---------------------------------------------------------------------------

impl Database {
    /// Inserts a file and returns its assigned id. If the path already
    /// exists, the row is replaced and the existing id is kept.
    pub fn insert_file(
        &self,
        path: &str,
        content_hash: &str,
        has_errors: bool,
        indexed_at: i64,
    ) -> Result<FileId> {
        if let Some(existing) = self.file_id_for_path(path)? {
            self.conn()
                .execute(
                    "UPDATE files SET content_hash = ?2, has_errors = ?3, indexed_at = ?4
                     WHERE id = ?1",
                    params![existing.0, content_hash, has_errors as i32, indexed_at],
                )
                .map_err(|e| CrossNavError::Database {
                    message: format!("failed to update file: {e}"),
                    operation: "insert_file".to_string(),
                })?;
            return Ok(existing);
        }

        self.conn()
            .execute(
                "INSERT INTO files (path, content_hash, has_errors, indexed_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![path, content_hash, has_errors as i32, indexed_at],
            )
            .map_err(|e| CrossNavError::Database {
                message: format!("failed to insert file: {e}"),
                operation: "insert_file".to_string(),
            })?;

        Ok(FileId(self.conn().last_insert_rowid() as u32))
    }

    /// Looks up the id of a file by path.
    pub fn file_id_for_path(&self, path: &str) -> Result<Option<FileId>> {
        let id: Option<u32> = self
            .conn()
            .query_row("SELECT id FROM files WHERE path = ?1", params![path], |r| {
                r.get(0)
            })
            .optional()
            .map_err(|e| CrossNavError::Database {
                message: format!("failed to look up file id: {e}"),
                operation: "file_id_for_path".to_string(),
            })?;
        Ok(id.map(FileId))
    }

    /// Returns all file rows, ordered by path.
    pub fn list_files(&self) -> Result<Vec<FileRow>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, path, content_hash, has_errors, indexed_at FROM files ORDER BY path")
            .map_err(|e| CrossNavError::Database {
                message: format!("failed to prepare file query: {e}"),
                operation: "list_files".to_string(),
            })?;

        let rows = stmt
            .query_map([], row_to_file)
            .map_err(|e| CrossNavError::Database {
                message: format!("failed to query files: {e}"),
                operation: "list_files".to_string(),
            })?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| CrossNavError::Database {
                message: format!("failed to read file rows: {e}"),
                operation: "list_files".to_string(),
            })
    }

    /// Removes a file and, via cascade, its occurrences and their targets.
    pub fn remove_file(&self, file_id: FileId) -> Result<()> {
        self.conn()
            .execute("DELETE FROM files WHERE id = ?1", params![file_id.0])
            .map_err(|e| CrossNavError::Database {
                message: format!("failed to remove file: {e}"),
                operation: "remove_file".to_string(),
            })?;
        Ok(())
    }

    /// Deletes all occurrences of a file (targets cascade), keeping the file
    /// row itself.
    pub fn delete_file_occurrences(&self, file_id: FileId) -> Result<()> {
        self.conn()
            .execute(
                "DELETE FROM occurrences WHERE file_id = ?1",
                params![file_id.0],
            )
            .map_err(|e| CrossNavError::Database {
                message: format!("failed to delete file occurrences: {e}"),
                operation: "delete_file_occurrences".to_string(),
            })?;
        Ok(())
    }

    /// Loads the path <-> id table for all files.
    pub fn load_file_table(&self) -> Result<FileTable> {
        let mut table = FileTable::new();
        for file in self.list_files()? {
            table.insert(file.id, file.path);
        }
        Ok(table)
    }
}

// ---------------------------------------------------------------------------
// Occurrence operations
// ---------------------------------------------------------------------------

impl Database {
    /// Inserts or replaces a single occurrence together with its target
    /// relations.
    pub fn insert_occurrence(
        &self,
        loc: Location,
        occurrence: &SymbolOccurrence,
        from_error_parse: bool,
    ) -> Result<()> {
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO occurrences
                    (file_id, offset, from_error_parse, kind, name, is_definition, symbol_length)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    loc.file_id.0,
                    loc.offset,
                    from_error_parse as i32,
                    occurrence.kind.as_str(),
                    occurrence.name,
                    occurrence.is_definition as i32,
                    occurrence.symbol_length,
                ],
            )
            .map_err(|e| CrossNavError::Database {
                message: format!("failed to insert occurrence: {e}"),
                operation: "insert_occurrence".to_string(),
            })?;

        for &target in &occurrence.targets {
            self.conn()
                .execute(
                    "INSERT OR REPLACE INTO targets
                        (file_id, offset, from_error_parse, target_file_id, target_offset)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        loc.file_id.0,
                        loc.offset,
                        from_error_parse as i32,
                        target.file_id.0,
                        target.offset,
                    ],
                )
                .map_err(|e| CrossNavError::Database {
                    message: format!("failed to insert target relation: {e}"),
                    operation: "insert_occurrence".to_string(),
                })?;
        }

        Ok(())
    }

    /// Inserts a batch of occurrences inside a single transaction.
    pub fn insert_occurrences(
        &self,
        occurrences: &[(Location, SymbolOccurrence, bool)],
    ) -> Result<()> {
        let tx = self
            .conn()
            .unchecked_transaction()
            .map_err(|e| CrossNavError::Database {
                message: format!("failed to begin transaction: {e}"),
                operation: "insert_occurrences".to_string(),
            })?;

        for (loc, occurrence, from_error_parse) in occurrences {
            self.insert_occurrence(*loc, occurrence, *from_error_parse)?;
        }

        tx.commit().map_err(|e| CrossNavError::Database {
            message: format!("failed to commit transaction: {e}"),
            operation: "insert_occurrences".to_string(),
        })
    }

    /// Loads the primary symbol index (rows not marked `from_error_parse`).
    pub fn load_symbol_index(&self) -> Result<SymbolIndex> {
        let mut index = SymbolIndex::new();
        for (loc, occurrence) in self.load_occurrences(false)? {
            index.insert(loc, occurrence);
        }
        Ok(index)
    }

    /// Loads the per-file error-fallback indices (rows marked
    /// `from_error_parse`).
    pub fn load_error_indexes(&self) -> Result<ErrorFallbackIndex> {
        let mut by_file: HashMap<FileId, SymbolIndex> = HashMap::new();
        for (loc, occurrence) in self.load_occurrences(true)? {
            by_file
                .entry(loc.file_id)
                .or_default()
                .insert(loc, occurrence);
        }

        let mut fallback = ErrorFallbackIndex::new();
        for (file_id, index) in by_file {
            fallback.insert(file_id, index);
        }
        Ok(fallback)
    }

    /// Loads all occurrences with the given `from_error_parse` flag, with
    /// their target relations attached.
    fn load_occurrences(
        &self,
        from_error_parse: bool,
    ) -> Result<Vec<(Location, SymbolOccurrence)>> {
        let mut targets: HashMap<Location, BTreeSet<Location>> = HashMap::new();
        {
            let mut stmt = self
                .conn()
                .prepare(
                    "SELECT file_id, offset, target_file_id, target_offset
                     FROM targets WHERE from_error_parse = ?1",
                )
                .map_err(|e| CrossNavError::Database {
                    message: format!("failed to prepare target query: {e}"),
                    operation: "load_occurrences".to_string(),
                })?;

            let rows = stmt
                .query_map(params![from_error_parse as i32], |row| {
                    let source = Location::new(
                        FileId(row.get::<_, u32>("file_id")?),
                        row.get("offset")?,
                    );
                    let target = Location::new(
                        FileId(row.get::<_, u32>("target_file_id")?),
                        row.get("target_offset")?,
                    );
                    Ok((source, target))
                })
                .map_err(|e| CrossNavError::Database {
                    message: format!("failed to query targets: {e}"),
                    operation: "load_occurrences".to_string(),
                })?;

            for row in rows {
                let (source, target) = row.map_err(|e| CrossNavError::Database {
                    message: format!("failed to read target row: {e}"),
                    operation: "load_occurrences".to_string(),
                })?;
                targets.entry(source).or_default().insert(target);
            }
        }

        let mut stmt = self
            .conn()
            .prepare(
                "SELECT file_id, offset, kind, name, is_definition, symbol_length
                 FROM occurrences WHERE from_error_parse = ?1",
            )
            .map_err(|e| CrossNavError::Database {
                message: format!("failed to prepare occurrence query: {e}"),
                operation: "load_occurrences".to_string(),
            })?;

        let rows = stmt
            .query_map(params![from_error_parse as i32], row_to_occurrence)
            .map_err(|e| CrossNavError::Database {
                message: format!("failed to query occurrences: {e}"),
                operation: "load_occurrences".to_string(),
            })?;

        let mut occurrences = Vec::new();
        for row in rows {
            let (loc, mut occurrence) = row.map_err(|e| CrossNavError::Database {
                message: format!("failed to read occurrence row: {e}"),
                operation: "load_occurrences".to_string(),
            })?;
            if let Some(outgoing) = targets.remove(&loc) {
                occurrence.targets = outgoing;
            }
            occurrences.push((loc, occurrence));
        }

        Ok(occurrences)
    }
}

// ---------------------------------------------------------------------------
// Stats and maintenance
// ---------------------------------------------------------------------------

impl Database {
    /// Counts rows in a table matching an optional predicate.
    fn count(&self, sql: &str, operation: &str) -> Result<u64> {
        let count: i64 = self
            .conn()
            .query_row(sql, [], |row| row.get(0))
            .map_err(|e| CrossNavError::Database {
                message: format!("failed to count rows: {e}"),
                operation: operation.to_string(),
            })?;
        Ok(count as u64)
    }

    pub fn file_count(&self) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM files", "file_count")
    }

    pub fn error_file_count(&self) -> Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM files WHERE has_errors != 0",
            "error_file_count",
        )
    }

    pub fn occurrence_count(&self) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM occurrences", "occurrence_count")
    }

    pub fn target_count(&self) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM targets", "target_count")
    }

    /// Deletes all index data.
    pub fn clear_all(&self) -> Result<()> {
        self.conn()
            .execute_batch("DELETE FROM targets; DELETE FROM occurrences; DELETE FROM files;")
            .map_err(|e| CrossNavError::Database {
                message: format!("failed to clear database: {e}"),
                operation: "clear_all".to_string(),
            })
    }
}
