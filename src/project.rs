use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::config::{get_db_path, load_config, save_config, CrossNavConfig};
use crate::db::{Database, FileRow};
use crate::errors::{CrossNavError, Result};
use crate::index::{ErrorFallbackIndex, FileTable, SymbolIndex};
use crate::query::FollowQuery;
use crate::types::{
    FileId, IndexSnapshot, IndexStats, Location, SnapshotFile, SymbolOccurrence,
};

/// A crossnav project: configuration, the backing database, and an in-memory
/// snapshot of the cross-reference indices.
///
/// The indices are loaded once at `open` time and never mutated afterwards,
/// so any number of queries may run against them concurrently. Reloading
/// after `load_snapshot` is done by reopening the project.
pub struct Project {
    db: Database,
    config: CrossNavConfig,
    project_root: PathBuf,
    symbols: SymbolIndex,
    error_symbols: ErrorFallbackIndex,
    files: FileTable,
}

/// Result of loading an index snapshot.
pub struct LoadResult {
    /// Number of files in the snapshot.
    pub file_count: usize,
    /// Files skipped because their stored content hash was unchanged.
    pub files_unchanged: usize,
    /// Previously indexed files absent from the snapshot.
    pub files_removed: usize,
    /// Occurrences written for the changed files.
    pub occurrence_count: usize,
    pub duration_ms: u64,
}

/// Returns the current UNIX timestamp in seconds.
fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

impl Project {
    /// Initializes a new crossnav project at the given root.
    ///
    /// Creates the `.crossnav` directory, writes a default configuration,
    /// and initializes a fresh SQLite database.
    pub fn init(project_root: &Path) -> Result<Self> {
        let config = CrossNavConfig {
            root_dir: project_root.to_string_lossy().to_string(),
            ..CrossNavConfig::default()
        };
        save_config(project_root, &config)?;

        let db = Database::initialize(&get_db_path(project_root))?;

        Ok(Self {
            db,
            config,
            project_root: project_root.to_path_buf(),
            symbols: SymbolIndex::new(),
            error_symbols: ErrorFallbackIndex::new(),
            files: FileTable::new(),
        })
    }

    /// Opens an existing crossnav project at the given root and loads its
    /// indices into memory.
    pub fn open(project_root: &Path) -> Result<Self> {
        let config = load_config(project_root)?;
        let db_path = get_db_path(project_root);

        if !db_path.exists() {
            return Err(CrossNavError::Config {
                message: format!(
                    "no crossnav database found at '{}'; run 'crossnav init' first",
                    db_path.display()
                ),
            });
        }

        let db = Database::open(&db_path)?;
        let symbols = db.load_symbol_index()?;
        let error_symbols = db.load_error_indexes()?;
        let files = db.load_file_table()?;
        debug!(
            occurrences = symbols.len(),
            error_files = error_symbols.len(),
            files = files.len(),
            "loaded cross-reference index"
        );

        Ok(Self {
            db,
            config,
            project_root: project_root.to_path_buf(),
            symbols,
            error_symbols,
            files,
        })
    }

    /// Returns `true` if a crossnav project has been initialized at the given root.
    pub fn is_initialized(project_root: &Path) -> bool {
        get_db_path(project_root).exists()
    }

    pub fn config(&self) -> &CrossNavConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.project_root
    }

    /// The primary symbol index.
    pub fn symbols(&self) -> &SymbolIndex {
        &self.symbols
    }

    /// The per-file error-fallback indices.
    pub fn error_symbols(&self) -> &ErrorFallbackIndex {
        &self.error_symbols
    }

    /// The path <-> file id table.
    pub fn files(&self) -> &FileTable {
        &self.files
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

impl Project {
    /// Resolves a follow-location query against the loaded indices.
    pub fn follow(&self, query: &FollowQuery) -> Option<Location> {
        query.resolve(&self.symbols, &self.error_symbols)
    }

    /// Lists every indexed occurrence of a file in offset order: primary
    /// rows first, then error-fallback rows, flagged `true`.
    pub fn file_occurrences(
        &self,
        file_id: FileId,
    ) -> Vec<(Location, &SymbolOccurrence, bool)> {
        let mut listing: Vec<(Location, &SymbolOccurrence, bool)> = self
            .symbols
            .file_occurrences(file_id)
            .map(|(loc, occurrence)| (loc, occurrence, false))
            .collect();
        if let Some(error_index) = self.error_symbols.get(file_id) {
            listing.extend(
                error_index
                    .file_occurrences(file_id)
                    .map(|(loc, occurrence)| (loc, occurrence, true)),
            );
        }
        listing
    }

    /// Returns aggregate statistics about the stored index.
    pub fn stats(&self) -> Result<IndexStats> {
        Ok(IndexStats {
            file_count: self.db.file_count()?,
            occurrence_count: self.db.occurrence_count()?,
            target_count: self.db.target_count()?,
            error_file_count: self.db.error_file_count()?,
            db_size_bytes: self.db.size()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Snapshot loading
// ---------------------------------------------------------------------------

impl Project {
    /// Brings the stored index up to date with a snapshot.
    ///
    /// Files whose stored content hash matches the snapshot are skipped;
    /// changed and new files have their occurrences rewritten, and files
    /// absent from the snapshot are removed. The in-memory indices of this
    /// `Project` instance are not refreshed; reopen the project to query the
    /// new data.
    pub fn load_snapshot(&self, snapshot: &IndexSnapshot) -> Result<LoadResult> {
        let started = Instant::now();
        let indexed_at = current_timestamp();

        let existing: HashMap<String, FileRow> = self
            .db
            .list_files()?
            .into_iter()
            .map(|row| (row.path.clone(), row))
            .collect();

        // Drop files the snapshot no longer knows about.
        let snapshot_paths: HashSet<&str> =
            snapshot.files.iter().map(|f| f.path.as_str()).collect();
        let mut files_removed = 0;
        for (path, row) in &existing {
            if !snapshot_paths.contains(path.as_str()) {
                self.db.remove_file(row.id)?;
                files_removed += 1;
            }
        }

        // First pass: register files so every path has an id before target
        // relations are resolved, and split the snapshot into unchanged and
        // changed files by content hash.
        let mut files = FileTable::new();
        let mut changed: Vec<&SnapshotFile> = Vec::new();
        let mut files_unchanged = 0;
        for file in &snapshot.files {
            let hash = snapshot_file_hash(file);
            match existing.get(&file.path) {
                Some(row) if row.content_hash == hash => {
                    files.insert(row.id, file.path.clone());
                    files_unchanged += 1;
                }
                _ => {
                    let file_id = self
                        .db
                        .insert_file(&file.path, &hash, file.has_errors, indexed_at)?;
                    self.db.delete_file_occurrences(file_id)?;
                    files.insert(file_id, file.path.clone());
                    changed.push(file);
                }
            }
        }

        // Second pass: occurrences and their targets for the changed files.
        // Targets naming a path outside the snapshot are dropped; dangling
        // locations inside known files are kept, the resolver tolerates them.
        let mut batch: Vec<(Location, SymbolOccurrence, bool)> = Vec::new();
        for file in changed {
            let file_id = match files.file_id(&file.path) {
                Some(id) => id,
                None => continue,
            };
            for occurrence in &file.occurrences {
                let targets = occurrence
                    .targets
                    .iter()
                    .filter_map(|t| {
                        files
                            .file_id(&t.path)
                            .map(|id| Location::new(id, t.offset))
                    })
                    .collect();

                batch.push((
                    Location::new(file_id, occurrence.offset),
                    SymbolOccurrence {
                        kind: occurrence.kind,
                        name: occurrence.name.clone(),
                        is_definition: occurrence.is_definition,
                        symbol_length: occurrence.symbol_length,
                        targets,
                    },
                    file.has_errors,
                ));
            }
        }
        let occurrence_count = batch.len();
        self.db.insert_occurrences(&batch)?;
        self.db.optimize()?;

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            files = snapshot.files.len(),
            unchanged = files_unchanged,
            removed = files_removed,
            occurrences = occurrence_count,
            duration_ms,
            "loaded index snapshot"
        );

        Ok(LoadResult {
            file_count: snapshot.files.len(),
            files_unchanged,
            files_removed,
            occurrence_count,
            duration_ms,
        })
    }

    /// Deletes all stored index data.
    ///
    /// Used by forced loads: an unchanged-file skip cannot repair target
    /// relations that were dropped when their file was not yet in the
    /// snapshot, so a forced load rebuilds everything from scratch.
    pub fn clear_index(&self) -> Result<()> {
        self.db.clear_all()
    }

    /// Parses and loads a snapshot from JSON text.
    pub fn load_snapshot_json(&self, json: &str) -> Result<LoadResult> {
        let snapshot: IndexSnapshot =
            serde_json::from_str(json).map_err(|e| CrossNavError::Snapshot {
                message: format!("failed to parse snapshot: {e}"),
            })?;
        self.load_snapshot(&snapshot)
    }
}

/// Content hash of a snapshot file, used to skip unchanged files on reload.
///
/// Covers every field that ends up in the stored index, so two files hash
/// equal only if loading them would produce identical rows.
fn snapshot_file_hash(file: &SnapshotFile) -> String {
    let mut hasher = Sha256::new();
    hasher.update(file.path.as_bytes());
    hasher.update([file.has_errors as u8]);
    for occurrence in &file.occurrences {
        hasher.update(occurrence.offset.to_le_bytes());
        hasher.update(occurrence.kind.as_str().as_bytes());
        hasher.update(occurrence.name.as_bytes());
        hasher.update([0u8, occurrence.is_definition as u8]);
        hasher.update(occurrence.symbol_length.to_le_bytes());
        for target in &occurrence.targets {
            hasher.update(target.path.as_bytes());
            hasher.update([0u8]);
            hasher.update(target.offset.to_le_bytes());
        }
    }
    hex::encode(&hasher.finalize()[..16])
}
