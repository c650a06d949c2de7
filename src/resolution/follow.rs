use tracing::debug;

use crate::index::{ErrorFallbackIndex, IndexContext, SymbolIndex};
use crate::query::FollowQuery;
use crate::resolution::best_target;
use crate::types::{Location, SymbolOccurrence};

/// Upper bound on best-target hops taken from the source occurrence.
///
/// The first hop is the initial selection; the second recovers a definition
/// when the first lands on a kind-mismatched forward declaration. No further
/// hops are taken, so resolution terminates even over cyclic relation graphs
/// (mutually referencing forward declarations and the like).
const MAX_HOPS: u32 = 2;

/// Resolves a follow-location query to a destination location.
///
/// Every failure mode degrades to `None`: a location with no occurrence, an
/// occurrence with no resolvable target, a failed declaration lookup. Absence
/// of a navigable target is a normal outcome, never an error.
pub fn resolve(
    query: &FollowQuery,
    primary: &SymbolIndex,
    fallback: &ErrorFallbackIndex,
) -> Option<Location> {
    let errors = fallback.get(query.location.file_id);

    // Locate the source occurrence, falling back to the per-file error index
    // when the primary index has no entry.
    let mut found_in_error = false;
    let (source_loc, source) = primary.lookup(query.location).or_else(|| {
        let found = errors?.lookup(query.location)?;
        found_in_error = true;
        Some(found)
    })?;

    // A class definition is its own destination: following from inside a
    // class body must not bounce to a self-referential target.
    if source.is_class() && source.is_definition {
        debug!(location = %source_loc, "follow is a no-op on a class definition");
        return None;
    }

    let primary_ctx = IndexContext::Primary(primary);
    let fallback_ctx =
        errors.map(|index| IndexContext::FallbackFor(query.location.file_id, index));

    // Best-target selection with the error-fallback retry: when the primary
    // context yields nothing and the source was only found in the error
    // index, re-run the selection from the source occurrence against that
    // file's fallback index.
    let select_with_retry = |occurrence: &SymbolOccurrence| {
        best_target(occurrence, primary_ctx).or_else(|| {
            if found_in_error {
                best_target(source, fallback_ctx?)
            } else {
                None
            }
        })
    };

    let mut candidate = select_with_retry(source)?;
    let mut hops = 1;

    // Kind-mismatch re-hop, bounded by the hop counter. A direct hit often
    // lands on a forward declaration instead of the definition; one extra
    // hop through that declaration's own best target recovers the definition
    // without cycle detection.
    while hops < MAX_HOPS {
        let (_, target) = candidate;
        if target.kind == source.kind
            || target.is_definition
            || target.targets.is_empty()
            || !target.kind.is_continuable()
        {
            break;
        }
        hops += 1;
        match select_with_retry(target) {
            Some(next) => candidate = next,
            // A failed re-hop keeps the first-hop candidate.
            None => break,
        }
    }

    let (mut result_loc, result) = candidate;

    // Declaration-only is a best-effort preference: when the candidate is a
    // definition, try one more selection to reach its declaration, but keep
    // the definition when that lookup fails.
    if query.flags.declaration_only && result.is_definition {
        if let Some((decl_loc, _)) = best_target(result, primary_ctx) {
            result_loc = decl_loc;
        }
    }

    debug!(from = %source_loc, to = %result_loc, hops, found_in_error, "resolved follow query");
    Some(result_loc)
}
