use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Identifier of an indexed file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct FileId(pub u32);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A position inside an indexed file: file identifier plus byte offset.
///
/// Locations are immutable value types, totally ordered by `(file_id, offset)`.
/// "No location" is expressed as `Option<Location>` rather than a sentinel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Location {
    pub file_id: FileId,
    pub offset: u32,
}

impl Location {
    pub fn new(file_id: FileId, offset: u32) -> Self {
        Location { file_id, offset }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file_id, self.offset)
    }
}

/// Kinds of symbol occurrences in the cross-reference index.
///
/// This is a closed set: kinds the indexer reports outside of it are stored
/// as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Class,
    Struct,
    ClassTemplate,
    Function,
    Method,
    Constructor,
    Destructor,
    FunctionTemplate,
    Other,
}

/// Kinds through which the kind-mismatch re-hop may continue.
///
/// When a follow lands on a non-definition whose kind differs from the source
/// occurrence's kind, one extra hop through the target's own best target is
/// attempted, but only for these kinds. Navigation intent for kinds outside
/// the set is undefined, so it is deliberately not extended.
pub const CONTINUABLE_KINDS: [SymbolKind; 8] = [
    SymbolKind::Class,
    SymbolKind::ClassTemplate,
    SymbolKind::Struct,
    SymbolKind::Function,
    SymbolKind::Method,
    SymbolKind::Destructor,
    SymbolKind::Constructor,
    SymbolKind::FunctionTemplate,
];

#[allow(clippy::should_implement_trait)]
impl SymbolKind {
    /// Returns the string representation of this symbol kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Class => "class",
            SymbolKind::Struct => "struct",
            SymbolKind::ClassTemplate => "class_template",
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Constructor => "constructor",
            SymbolKind::Destructor => "destructor",
            SymbolKind::FunctionTemplate => "function_template",
            SymbolKind::Other => "other",
        }
    }

    /// Parses a string into a `SymbolKind`, returning `None` for unrecognized values.
    pub fn from_str(s: &str) -> Option<SymbolKind> {
        match s {
            "class" => Some(SymbolKind::Class),
            "struct" => Some(SymbolKind::Struct),
            "class_template" => Some(SymbolKind::ClassTemplate),
            "function" => Some(SymbolKind::Function),
            "method" => Some(SymbolKind::Method),
            "constructor" => Some(SymbolKind::Constructor),
            "destructor" => Some(SymbolKind::Destructor),
            "function_template" => Some(SymbolKind::FunctionTemplate),
            "other" => Some(SymbolKind::Other),
            _ => None,
        }
    }

    /// Returns `true` for class-like kinds (class, struct, class template).
    pub fn is_class(&self) -> bool {
        matches!(
            self,
            SymbolKind::Class | SymbolKind::Struct | SymbolKind::ClassTemplate
        )
    }

    /// Returns `true` if the kind is in [`CONTINUABLE_KINDS`].
    pub fn is_continuable(&self) -> bool {
        CONTINUABLE_KINDS.contains(self)
    }
}

/// One indexed occurrence of a symbol at some location.
///
/// Immutable once indexed. The `targets` set holds the outgoing target
/// relations: locations of related occurrences (a declaration, a definition,
/// an override base). It may be empty, and entries may dangle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolOccurrence {
    pub kind: SymbolKind,
    /// Display name of the symbol; not used by resolution.
    pub name: String,
    pub is_definition: bool,
    /// Length in bytes of the symbol token, for nearest-enclosing lookup.
    pub symbol_length: u32,
    pub targets: BTreeSet<Location>,
}

impl SymbolOccurrence {
    /// Returns `true` if this occurrence's kind is class-like.
    pub fn is_class(&self) -> bool {
        self.kind.is_class()
    }
}

/// Aggregate statistics about a loaded index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub file_count: u64,
    pub occurrence_count: u64,
    pub target_count: u64,
    /// Files that only parsed under the error-tolerant pass.
    pub error_file_count: u64,
    pub db_size_bytes: u64,
}

// ---------------------------------------------------------------------------
// Snapshot format (produced by an external indexer, consumed by `load`)
// ---------------------------------------------------------------------------

/// A target relation inside a snapshot, addressed by path since file ids are
/// assigned at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotTarget {
    pub path: String,
    pub offset: u32,
}

/// One occurrence inside a snapshot file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotOccurrence {
    pub offset: u32,
    pub kind: SymbolKind,
    #[serde(default)]
    pub name: String,
    pub is_definition: bool,
    #[serde(default)]
    pub symbol_length: u32,
    #[serde(default)]
    pub targets: Vec<SnapshotTarget>,
}

/// One file inside a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub path: String,
    /// `true` if this file failed to parse cleanly; its occurrences go to the
    /// error-fallback index instead of the primary one.
    #[serde(default)]
    pub has_errors: bool,
    pub occurrences: Vec<SnapshotOccurrence>,
}

/// A full index snapshot emitted by an external indexer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub files: Vec<SnapshotFile>,
}
