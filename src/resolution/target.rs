use crate::index::IndexContext;
use crate::types::{Location, SymbolOccurrence};

/// Selects the single most useful outgoing target relation of an occurrence.
///
/// Walks `occurrence.targets` in ascending location order, resolving each
/// relation in `context`:
/// - a relation that resolves to a definition is preferred over one that
///   resolves to a mere declaration;
/// - a relation that does not resolve in `context` is skipped (dangling
///   relations are normal, not an error);
/// - ties break to the lowest location, so selection is deterministic and
///   repeated queries are idempotent.
///
/// Returns `None` when no relation resolves.
pub fn best_target<'a>(
    occurrence: &SymbolOccurrence,
    context: IndexContext<'a>,
) -> Option<(Location, &'a SymbolOccurrence)> {
    let mut best: Option<(Location, &SymbolOccurrence)> = None;

    for &relation in &occurrence.targets {
        let Some((loc, resolved)) = context.lookup(relation) else {
            continue;
        };
        if resolved.is_definition {
            // First definition in location order wins outright.
            return Some((loc, resolved));
        }
        if best.is_none() {
            best = Some((loc, resolved));
        }
    }

    best
}
