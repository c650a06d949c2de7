//! Query layer: request flags, the follow query, and the result sink.

use crate::index::{ErrorFallbackIndex, SymbolIndex};
use crate::resolution;
use crate::types::Location;

/// Flags controlling query behavior.
///
/// Only `declaration_only` is consumed by follow-location resolution: it
/// prefers a declaration location over a definition when both are resolvable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryFlags {
    pub declaration_only: bool,
}

/// A follow-location request: a source location plus flags.
#[derive(Debug, Clone, Copy)]
pub struct FollowQuery {
    pub location: Location,
    pub flags: QueryFlags,
}

impl FollowQuery {
    pub fn new(location: Location) -> Self {
        FollowQuery {
            location,
            flags: QueryFlags::default(),
        }
    }

    pub fn declaration_only(mut self, declaration_only: bool) -> Self {
        self.flags.declaration_only = declaration_only;
        self
    }

    /// Resolves this query against the given indices.
    pub fn resolve(
        &self,
        primary: &SymbolIndex,
        fallback: &ErrorFallbackIndex,
    ) -> Option<Location> {
        resolution::resolve(self, primary, fallback)
    }

    /// Resolves this query and emits the result into `sink`.
    ///
    /// The sink is invoked at most once; it is not invoked at all when the
    /// query has no result.
    pub fn run<S: ResultSink>(
        &self,
        primary: &SymbolIndex,
        fallback: &ErrorFallbackIndex,
        sink: &mut S,
    ) {
        if let Some(location) = self.resolve(primary, fallback) {
            sink.emit(location);
        }
    }
}

/// Receives the result location of a query.
pub trait ResultSink {
    fn emit(&mut self, location: Location);
}

impl<F: FnMut(Location)> ResultSink for F {
    fn emit(&mut self, location: Location) {
        self(location)
    }
}
