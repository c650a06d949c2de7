//! In-memory cross-reference indices.
//!
//! The primary [`SymbolIndex`] covers fully-parsed files; the per-file
//! [`ErrorFallbackIndex`] holds lower-confidence occurrences from files that
//! failed to parse cleanly. Both are read-only once loaded.

mod symbol_index;

pub use symbol_index::{ErrorFallbackIndex, FileTable, IndexContext, SymbolIndex};
