use std::collections::{BTreeMap, HashMap};

use crate::types::{FileId, Location, SymbolOccurrence};

/// Ordered mapping from [`Location`] to [`SymbolOccurrence`] covering one
/// project's fully-parsed files.
///
/// Supports exact lookup and nearest-enclosing lookup: a query offset that
/// falls inside an occurrence's token span (`offset .. offset +
/// symbol_length`) resolves to that occurrence.
#[derive(Debug, Clone, Default)]
pub struct SymbolIndex {
    map: BTreeMap<Location, SymbolOccurrence>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, loc: Location, occurrence: SymbolOccurrence) {
        self.map.insert(loc, occurrence);
    }

    /// Exact lookup.
    pub fn get(&self, loc: Location) -> Option<&SymbolOccurrence> {
        self.map.get(&loc)
    }

    /// Exact or nearest-enclosing lookup.
    ///
    /// Finds the greatest indexed location at or before `loc` in the same
    /// file and returns it if `loc` falls within its token span. An
    /// occurrence with `symbol_length == 0` only matches exactly.
    pub fn lookup(&self, loc: Location) -> Option<(Location, &SymbolOccurrence)> {
        let (&found, occurrence) = self.map.range(..=loc).next_back()?;
        if found.file_id != loc.file_id {
            return None;
        }
        if found.offset == loc.offset {
            return Some((found, occurrence));
        }
        let span_end = found.offset.saturating_add(occurrence.symbol_length);
        if loc.offset < span_end {
            Some((found, occurrence))
        } else {
            None
        }
    }

    /// Iterates all occurrences in a single file, in offset order.
    pub fn file_occurrences(
        &self,
        file_id: FileId,
    ) -> impl Iterator<Item = (Location, &SymbolOccurrence)> {
        let start = Location::new(file_id, 0);
        let end = Location::new(file_id, u32::MAX);
        self.map.range(start..=end).map(|(&l, o)| (l, o))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Location, &SymbolOccurrence)> {
        self.map.iter().map(|(&l, o)| (l, o))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl FromIterator<(Location, SymbolOccurrence)> for SymbolIndex {
    fn from_iter<I: IntoIterator<Item = (Location, SymbolOccurrence)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

/// Per-file secondary indices built from best-effort parsing of files that
/// failed to parse cleanly.
///
/// Consulted only when the primary index has no usable entry for a file; the
/// occurrences are lower-confidence but structurally identical.
#[derive(Debug, Clone, Default)]
pub struct ErrorFallbackIndex {
    by_file: HashMap<FileId, SymbolIndex>,
}

impl ErrorFallbackIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file_id: FileId, index: SymbolIndex) {
        self.by_file.insert(file_id, index);
    }

    /// Returns the fallback index for a file, if one exists.
    pub fn get(&self, file_id: FileId) -> Option<&SymbolIndex> {
        self.by_file.get(&file_id)
    }

    pub fn len(&self) -> usize {
        self.by_file.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_file.is_empty()
    }
}

/// Resolution context for target relations: either the primary index or the
/// fallback index of a specific file.
///
/// Exposes one uniform lookup so resolution code does not branch on which
/// index it is walking.
#[derive(Debug, Clone, Copy)]
pub enum IndexContext<'a> {
    Primary(&'a SymbolIndex),
    FallbackFor(FileId, &'a SymbolIndex),
}

impl<'a> IndexContext<'a> {
    /// Looks up an occurrence at or enclosing `loc` in this context.
    pub fn lookup(&self, loc: Location) -> Option<(Location, &'a SymbolOccurrence)> {
        match self {
            IndexContext::Primary(index) => index.lookup(loc),
            IndexContext::FallbackFor(_, index) => index.lookup(loc),
        }
    }
}

/// Bidirectional mapping between file paths and file ids.
#[derive(Debug, Clone, Default)]
pub struct FileTable {
    by_id: HashMap<FileId, String>,
    by_path: HashMap<String, FileId>,
}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file_id: FileId, path: String) {
        self.by_path.insert(path.clone(), file_id);
        self.by_id.insert(file_id, path);
    }

    pub fn path(&self, file_id: FileId) -> Option<&str> {
        self.by_id.get(&file_id).map(String::as_str)
    }

    pub fn file_id(&self, path: &str) -> Option<FileId> {
        self.by_path.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
