use std::collections::BTreeSet;

use crossnav::index::{ErrorFallbackIndex, SymbolIndex};
use crossnav::query::{FollowQuery, ResultSink};
use crossnav::types::{FileId, Location, SymbolKind, SymbolOccurrence};

fn loc(file: u32, offset: u32) -> Location {
    Location::new(FileId(file), offset)
}

fn occ(
    kind: SymbolKind,
    name: &str,
    is_definition: bool,
    targets: &[Location],
) -> SymbolOccurrence {
    SymbolOccurrence {
        kind,
        name: name.to_string(),
        is_definition,
        symbol_length: 4,
        targets: targets.iter().copied().collect::<BTreeSet<_>>(),
    }
}

fn follow(primary: &SymbolIndex, fallback: &ErrorFallbackIndex, from: Location) -> Option<Location> {
    FollowQuery::new(from).resolve(primary, fallback)
}

#[test]
fn test_no_occurrence_returns_none() {
    let primary = SymbolIndex::new();
    let fallback = ErrorFallbackIndex::new();

    assert_eq!(
        follow(&primary, &fallback, loc(1, 10)),
        None,
        "a location with no occurrence in either index has no result"
    );
}

#[test]
fn test_class_definition_is_its_own_destination() {
    let mut primary = SymbolIndex::new();
    // A class definition with a self-referential target must not bounce.
    primary.insert(
        loc(1, 10),
        occ(SymbolKind::Class, "Widget", true, &[loc(1, 10), loc(2, 0)]),
    );
    primary.insert(loc(2, 0), occ(SymbolKind::Class, "Widget", false, &[]));
    let fallback = ErrorFallbackIndex::new();

    assert_eq!(
        follow(&primary, &fallback, loc(1, 10)),
        None,
        "follow on a class definition is a no-op regardless of its targets"
    );
}

#[test]
fn test_class_declaration_still_follows() {
    let mut primary = SymbolIndex::new();
    primary.insert(
        loc(1, 10),
        occ(SymbolKind::Class, "Widget", false, &[loc(2, 0)]),
    );
    primary.insert(loc(2, 0), occ(SymbolKind::Class, "Widget", true, &[]));
    let fallback = ErrorFallbackIndex::new();

    assert_eq!(
        follow(&primary, &fallback, loc(1, 10)),
        Some(loc(2, 0)),
        "a class forward declaration follows to the class definition"
    );
}

#[test]
fn test_direct_definition() {
    let mut primary = SymbolIndex::new();
    primary.insert(
        loc(1, 100),
        occ(SymbolKind::Method, "render", false, &[loc(2, 50)]),
    );
    primary.insert(loc(2, 50), occ(SymbolKind::Method, "render", true, &[]));
    let fallback = ErrorFallbackIndex::new();

    assert_eq!(follow(&primary, &fallback, loc(1, 100)), Some(loc(2, 50)));
}

#[test]
fn test_definition_preferred_over_declaration() {
    let mut primary = SymbolIndex::new();
    // Declaration sorts before the definition; the definition must still win.
    primary.insert(
        loc(1, 100),
        occ(
            SymbolKind::Function,
            "parse",
            false,
            &[loc(2, 10), loc(3, 10)],
        ),
    );
    primary.insert(loc(2, 10), occ(SymbolKind::Function, "parse", false, &[]));
    primary.insert(loc(3, 10), occ(SymbolKind::Function, "parse", true, &[]));
    let fallback = ErrorFallbackIndex::new();

    assert_eq!(
        follow(&primary, &fallback, loc(1, 100)),
        Some(loc(3, 10)),
        "a target resolving to a definition beats one resolving to a declaration"
    );
}

#[test]
fn test_two_hop_recovery_through_forward_declaration() {
    let mut primary = SymbolIndex::new();
    // Call site (method kind) -> forward declaration (function kind, not a
    // definition) -> definition. Kinds differ and Function is continuable,
    // so one extra hop recovers the definition.
    primary.insert(
        loc(1, 100),
        occ(SymbolKind::Method, "helper", false, &[loc(2, 10)]),
    );
    primary.insert(
        loc(2, 10),
        occ(SymbolKind::Function, "helper", false, &[loc(3, 20)]),
    );
    primary.insert(loc(3, 20), occ(SymbolKind::Function, "helper", true, &[]));
    let fallback = ErrorFallbackIndex::new();

    assert_eq!(
        follow(&primary, &fallback, loc(1, 100)),
        Some(loc(3, 20)),
        "the re-hop should land on the definition behind the declaration"
    );
}

#[test]
fn test_no_rehop_for_non_continuable_kind() {
    let mut primary = SymbolIndex::new();
    primary.insert(
        loc(1, 100),
        occ(SymbolKind::Method, "x", false, &[loc(2, 10)]),
    );
    // Target kind Other is outside the continuable subset.
    primary.insert(loc(2, 10), occ(SymbolKind::Other, "x", false, &[loc(3, 20)]));
    primary.insert(loc(3, 20), occ(SymbolKind::Other, "x", true, &[]));
    let fallback = ErrorFallbackIndex::new();

    assert_eq!(
        follow(&primary, &fallback, loc(1, 100)),
        Some(loc(2, 10)),
        "no extra hop is taken through a non-continuable kind"
    );
}

#[test]
fn test_no_rehop_when_kinds_match() {
    let mut primary = SymbolIndex::new();
    primary.insert(
        loc(1, 100),
        occ(SymbolKind::Function, "x", false, &[loc(2, 10)]),
    );
    primary.insert(
        loc(2, 10),
        occ(SymbolKind::Function, "x", false, &[loc(3, 20)]),
    );
    primary.insert(loc(3, 20), occ(SymbolKind::Function, "x", true, &[]));
    let fallback = ErrorFallbackIndex::new();

    assert_eq!(
        follow(&primary, &fallback, loc(1, 100)),
        Some(loc(2, 10)),
        "same-kind targets are taken as-is, even when not definitions"
    );
}

#[test]
fn test_rehop_failure_keeps_first_hop() {
    let mut primary = SymbolIndex::new();
    primary.insert(
        loc(1, 100),
        occ(SymbolKind::Method, "x", false, &[loc(2, 10)]),
    );
    // Continuable target whose own targets all dangle.
    primary.insert(
        loc(2, 10),
        occ(SymbolKind::Function, "x", false, &[loc(9, 999)]),
    );
    let fallback = ErrorFallbackIndex::new();

    assert_eq!(
        follow(&primary, &fallback, loc(1, 100)),
        Some(loc(2, 10)),
        "a failed re-hop keeps the first-hop candidate"
    );
}

#[test]
fn test_cyclic_relations_terminate() {
    let mut primary = SymbolIndex::new();
    // Mutually referencing forward declarations: a -> b -> a -> b ...
    primary.insert(
        loc(1, 10),
        occ(SymbolKind::Method, "cycle", false, &[loc(2, 10)]),
    );
    primary.insert(
        loc(2, 10),
        occ(SymbolKind::Function, "cycle", false, &[loc(1, 10)]),
    );
    let fallback = ErrorFallbackIndex::new();

    // Hop 1 lands on the declaration at 2:10, hop 2 follows it back to the
    // source; the hop cap stops resolution there.
    assert_eq!(
        follow(&primary, &fallback, loc(1, 10)),
        Some(loc(1, 10)),
        "cyclic relation graphs resolve in at most two hops"
    );
}

#[test]
fn test_dangling_targets_are_skipped() {
    let mut primary = SymbolIndex::new();
    primary.insert(
        loc(1, 100),
        occ(
            SymbolKind::Function,
            "x",
            false,
            &[loc(0, 1), loc(2, 9999), loc(5, 50)],
        ),
    );
    primary.insert(loc(5, 50), occ(SymbolKind::Function, "x", true, &[]));
    let fallback = ErrorFallbackIndex::new();

    assert_eq!(
        follow(&primary, &fallback, loc(1, 100)),
        Some(loc(5, 50)),
        "relations that resolve to nothing are discarded, not errors"
    );
}

#[test]
fn test_error_fallback_locates_and_resolves() {
    // The file failed to parse cleanly: the occurrence and its target exist
    // only in the error-fallback index.
    let primary = SymbolIndex::new();
    let mut error_index = SymbolIndex::new();
    error_index.insert(
        loc(7, 100),
        occ(SymbolKind::Function, "broken", false, &[loc(7, 10)]),
    );
    error_index.insert(loc(7, 10), occ(SymbolKind::Function, "broken", true, &[]));
    let mut fallback = ErrorFallbackIndex::new();
    fallback.insert(FileId(7), error_index);

    assert_eq!(
        follow(&primary, &fallback, loc(7, 100)),
        Some(loc(7, 10)),
        "navigation still works inside files with parse errors"
    );
}

#[test]
fn test_error_fallback_not_used_without_found_in_error() {
    // The source occurrence exists in the primary index; its target only
    // resolves in the fallback index. The fallback retry is reserved for
    // occurrences located through the error index, so this does not resolve.
    let mut primary = SymbolIndex::new();
    primary.insert(
        loc(7, 100),
        occ(SymbolKind::Function, "x", false, &[loc(7, 10)]),
    );
    let mut error_index = SymbolIndex::new();
    error_index.insert(loc(7, 10), occ(SymbolKind::Function, "x", true, &[]));
    let mut fallback = ErrorFallbackIndex::new();
    fallback.insert(FileId(7), error_index);

    assert_eq!(follow(&primary, &fallback, loc(7, 100)), None);
}

#[test]
fn test_second_hop_fallback_retry_reruns_from_source() {
    // Everything lives in the error-fallback index. The first hop lands on
    // a continuable non-definition of a different kind, so a second hop is
    // attempted; its primary lookup fails too, and the fallback retry always
    // re-runs from the source occurrence, not from the first-hop target.
    let primary = SymbolIndex::new();
    let mut error_index = SymbolIndex::new();
    error_index.insert(
        loc(7, 100),
        occ(SymbolKind::Method, "helper", false, &[loc(7, 10)]),
    );
    error_index.insert(
        loc(7, 10),
        occ(SymbolKind::Function, "helper", false, &[loc(7, 50)]),
    );
    error_index.insert(loc(7, 50), occ(SymbolKind::Function, "helper", true, &[]));
    let mut fallback = ErrorFallbackIndex::new();
    fallback.insert(FileId(7), error_index);

    assert_eq!(
        follow(&primary, &fallback, loc(7, 100)),
        Some(loc(7, 10)),
        "the second hop's fallback retry restarts from the source, so the \
         first-hop target wins over the definition behind it"
    );
}

#[test]
fn test_declaration_only_returns_declaration() {
    let mut primary = SymbolIndex::new();
    primary.insert(
        loc(1, 100),
        occ(SymbolKind::Function, "x", false, &[loc(3, 10)]),
    );
    // The definition's own best target is its declaration.
    primary.insert(
        loc(3, 10),
        occ(SymbolKind::Function, "x", true, &[loc(2, 10)]),
    );
    primary.insert(loc(2, 10), occ(SymbolKind::Function, "x", false, &[]));
    let fallback = ErrorFallbackIndex::new();

    let result = FollowQuery::new(loc(1, 100))
        .declaration_only(true)
        .resolve(&primary, &fallback);
    assert_eq!(
        result,
        Some(loc(2, 10)),
        "declaration-only prefers the declaration when it is resolvable"
    );
}

#[test]
fn test_declaration_only_falls_back_to_definition() {
    let mut primary = SymbolIndex::new();
    primary.insert(
        loc(1, 100),
        occ(SymbolKind::Function, "x", false, &[loc(3, 10)]),
    );
    // Definition with no resolvable targets: the declaration lookup fails.
    primary.insert(
        loc(3, 10),
        occ(SymbolKind::Function, "x", true, &[loc(9, 999)]),
    );
    let fallback = ErrorFallbackIndex::new();

    let result = FollowQuery::new(loc(1, 100))
        .declaration_only(true)
        .resolve(&primary, &fallback);
    assert_eq!(
        result,
        Some(loc(3, 10)),
        "declaration-only is a preference, never a hard filter"
    );
}

#[test]
fn test_declaration_only_ignored_for_non_definition_result() {
    let mut primary = SymbolIndex::new();
    primary.insert(
        loc(1, 100),
        occ(SymbolKind::Function, "x", false, &[loc(2, 10)]),
    );
    primary.insert(loc(2, 10), occ(SymbolKind::Function, "x", false, &[]));
    let fallback = ErrorFallbackIndex::new();

    let result = FollowQuery::new(loc(1, 100))
        .declaration_only(true)
        .resolve(&primary, &fallback);
    assert_eq!(result, Some(loc(2, 10)));
}

#[test]
fn test_enclosing_offset_resolves() {
    let mut primary = SymbolIndex::new();
    // symbol_length is 4, so offsets 100..104 hit this occurrence.
    primary.insert(
        loc(1, 100),
        occ(SymbolKind::Function, "x", false, &[loc(2, 10)]),
    );
    primary.insert(loc(2, 10), occ(SymbolKind::Function, "x", true, &[]));
    let fallback = ErrorFallbackIndex::new();

    assert_eq!(follow(&primary, &fallback, loc(1, 103)), Some(loc(2, 10)));
    assert_eq!(
        follow(&primary, &fallback, loc(1, 104)),
        None,
        "an offset past the symbol span does not match"
    );
}

#[test]
fn test_resolution_is_idempotent() {
    let mut primary = SymbolIndex::new();
    primary.insert(
        loc(1, 100),
        occ(
            SymbolKind::Function,
            "x",
            false,
            &[loc(2, 10), loc(2, 20), loc(3, 10)],
        ),
    );
    primary.insert(loc(2, 10), occ(SymbolKind::Function, "x", true, &[]));
    primary.insert(loc(2, 20), occ(SymbolKind::Function, "x", true, &[]));
    primary.insert(loc(3, 10), occ(SymbolKind::Function, "x", false, &[]));
    let fallback = ErrorFallbackIndex::new();

    let first = follow(&primary, &fallback, loc(1, 100));
    for _ in 0..10 {
        assert_eq!(
            follow(&primary, &fallback, loc(1, 100)),
            first,
            "identical inputs must yield identical results"
        );
    }
    // Ties between definitions break to the lowest location.
    assert_eq!(first, Some(loc(2, 10)));
}

#[test]
fn test_sink_invoked_at_most_once() {
    let mut primary = SymbolIndex::new();
    primary.insert(
        loc(1, 100),
        occ(SymbolKind::Function, "x", false, &[loc(2, 10)]),
    );
    primary.insert(loc(2, 10), occ(SymbolKind::Function, "x", true, &[]));
    let fallback = ErrorFallbackIndex::new();

    let mut emitted: Vec<Location> = Vec::new();
    let mut sink = |l: Location| emitted.push(l);
    FollowQuery::new(loc(1, 100)).run(&primary, &fallback, &mut sink);
    assert_eq!(emitted, vec![loc(2, 10)]);

    let mut missed = 0;
    let mut counting = |_l: Location| missed += 1;
    FollowQuery::new(loc(9, 9)).run(&primary, &fallback, &mut counting);
    assert_eq!(missed, 0, "the sink is never invoked without a result");
}

#[test]
fn test_sink_trait_object_usage() {
    struct Collect(Vec<Location>);
    impl ResultSink for Collect {
        fn emit(&mut self, location: Location) {
            self.0.push(location);
        }
    }

    let mut primary = SymbolIndex::new();
    primary.insert(
        loc(1, 100),
        occ(SymbolKind::Function, "x", false, &[loc(2, 10)]),
    );
    primary.insert(loc(2, 10), occ(SymbolKind::Function, "x", true, &[]));
    let fallback = ErrorFallbackIndex::new();

    let mut sink = Collect(Vec::new());
    FollowQuery::new(loc(1, 100)).run(&primary, &fallback, &mut sink);
    assert_eq!(sink.0.len(), 1);
}
