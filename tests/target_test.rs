use std::collections::BTreeSet;

use crossnav::index::{IndexContext, SymbolIndex};
use crossnav::resolution::best_target;
use crossnav::types::{FileId, Location, SymbolKind, SymbolOccurrence};

fn loc(file: u32, offset: u32) -> Location {
    Location::new(FileId(file), offset)
}

fn occ(kind: SymbolKind, is_definition: bool, targets: &[Location]) -> SymbolOccurrence {
    SymbolOccurrence {
        kind,
        name: "sym".to_string(),
        is_definition,
        symbol_length: 3,
        targets: targets.iter().copied().collect::<BTreeSet<_>>(),
    }
}

#[test]
fn test_empty_target_set_yields_none() {
    let index = SymbolIndex::new();
    let source = occ(SymbolKind::Function, false, &[]);

    assert!(best_target(&source, IndexContext::Primary(&index)).is_none());
}

#[test]
fn test_all_dangling_yields_none() {
    let index = SymbolIndex::new();
    let source = occ(SymbolKind::Function, false, &[loc(1, 1), loc(2, 2)]);

    assert!(
        best_target(&source, IndexContext::Primary(&index)).is_none(),
        "unresolvable relations are discarded, not errors"
    );
}

#[test]
fn test_definition_wins_over_declaration() {
    let mut index = SymbolIndex::new();
    index.insert(loc(1, 10), occ(SymbolKind::Function, false, &[]));
    index.insert(loc(2, 10), occ(SymbolKind::Function, true, &[]));
    let source = occ(SymbolKind::Function, false, &[loc(1, 10), loc(2, 10)]);

    let (found, resolved) = best_target(&source, IndexContext::Primary(&index))
        .expect("a target should resolve");
    assert_eq!(found, loc(2, 10));
    assert!(resolved.is_definition);
}

#[test]
fn test_first_declaration_wins_without_definitions() {
    let mut index = SymbolIndex::new();
    index.insert(loc(1, 10), occ(SymbolKind::Function, false, &[]));
    index.insert(loc(2, 10), occ(SymbolKind::Function, false, &[]));
    let source = occ(SymbolKind::Function, false, &[loc(2, 10), loc(1, 10)]);

    let (found, _) = best_target(&source, IndexContext::Primary(&index))
        .expect("a target should resolve");
    assert_eq!(
        found,
        loc(1, 10),
        "ties break to the lowest location, independent of insertion order"
    );
}

#[test]
fn test_first_definition_wins_among_definitions() {
    let mut index = SymbolIndex::new();
    index.insert(loc(1, 10), occ(SymbolKind::Function, true, &[]));
    index.insert(loc(2, 10), occ(SymbolKind::Function, true, &[]));
    let source = occ(SymbolKind::Function, false, &[loc(2, 10), loc(1, 10)]);

    let (found, _) = best_target(&source, IndexContext::Primary(&index))
        .expect("a target should resolve");
    assert_eq!(found, loc(1, 10));
}

#[test]
fn test_enclosing_resolution_of_relations() {
    let mut index = SymbolIndex::new();
    // symbol_length 3: offsets 10..13 belong to this occurrence.
    index.insert(loc(1, 10), occ(SymbolKind::Function, true, &[]));
    let source = occ(SymbolKind::Function, false, &[loc(1, 12)]);

    let (found, _) = best_target(&source, IndexContext::Primary(&index))
        .expect("an in-span relation should resolve");
    assert_eq!(found, loc(1, 10), "resolution reports the occurrence's own location");
}

#[test]
fn test_fallback_context_lookup() {
    let mut index = SymbolIndex::new();
    index.insert(loc(3, 10), occ(SymbolKind::Function, true, &[]));
    let source = occ(SymbolKind::Function, false, &[loc(3, 10)]);

    let context = IndexContext::FallbackFor(FileId(3), &index);
    let (found, resolved) = best_target(&source, context).expect("a target should resolve");
    assert_eq!(found, loc(3, 10));
    assert!(resolved.is_definition);
}
