//! Scenario tests for PathSystem and Slice: build a small search forest the
//! way the evaluator would, finish it, and check every query family.

use greval_core::{
    Edge, EdgeDirection, EdgeId, Path, PathSystem, PathSystemKey, Set, Slice, TypeCollection,
    TypeDescriptor, Value, Vertex, VertexId,
};

fn person(id: u32) -> Vertex {
    Vertex::new(VertexId::new(id), TypeDescriptor::new("Person"))
}

fn city(id: u32) -> Vertex {
    Vertex::new(VertexId::new(id), TypeDescriptor::new("City"))
}

fn knows(id: i32, from: &Vertex, to: &Vertex) -> Edge {
    Edge::new(
        EdgeId::new(id),
        from.clone(),
        to.clone(),
        TypeDescriptor::new("Knows"),
    )
}

fn lives_in(id: i32, from: &Vertex, to: &Vertex) -> Edge {
    Edge::new(
        EdgeId::new(id),
        from.clone(),
        to.clone(),
        TypeDescriptor::new("LivesIn"),
    )
}

/// Forest used by most tests:
///
/// ```text
///        p1 (root, state 0)
///       /  \
///   e1 /    \ e2
///     p2     p3
///     |       \
///  e3 |        \ e4
///     c4*       p5*      (* = final)
/// ```
fn sample_system() -> PathSystem {
    let mut ps = PathSystem::new();
    ps.set_root_vertex(person(1), 0, false).unwrap();
    ps.add_vertex(
        person(2),
        1,
        Some(knows(1, &person(1), &person(2))),
        None,
        0,
        1,
        false,
    )
    .unwrap();
    ps.add_vertex(
        person(3),
        1,
        Some(knows(2, &person(1), &person(3))),
        None,
        0,
        1,
        false,
    )
    .unwrap();
    ps.add_vertex(
        city(4),
        2,
        Some(lives_in(3, &person(2), &city(4))),
        None,
        1,
        2,
        true,
    )
    .unwrap();
    ps.add_vertex(
        person(5),
        2,
        Some(knows(4, &person(3), &person(5))),
        None,
        1,
        2,
        true,
    )
    .unwrap();
    ps.finish().unwrap();
    ps
}

#[test]
fn node_and_leaf_queries() {
    let ps = sample_system();

    assert_eq!(ps.nodes().unwrap().len(), 5);
    let leaves = ps.leaves().unwrap();
    assert_eq!(leaves.len(), 2);
    assert!(leaves.contains(&Value::from(city(4))));
    assert!(leaves.contains(&Value::from(person(5))));

    let inner = ps.inner_nodes().unwrap();
    assert_eq!(inner.len(), 3);
    assert!(inner.contains(&Value::from(person(1))));

    assert_eq!(ps.edges().unwrap().len(), 4);
}

#[test]
fn family_queries() {
    let ps = sample_system();

    let children = ps.children(VertexId::new(1)).unwrap();
    assert_eq!(children.len(), 2);
    assert!(children.contains(&Value::from(person(2))));

    assert_eq!(ps.parent(VertexId::new(2)).unwrap(), Value::from(person(1)));
    assert_eq!(ps.parent(VertexId::new(1)).unwrap(), Value::invalid());
    assert_eq!(ps.parent(VertexId::new(99)).unwrap(), Value::invalid());

    let siblings = ps.siblings(VertexId::new(2)).unwrap();
    assert_eq!(siblings.len(), 1);
    assert!(siblings.contains(&Value::from(person(3))));

    assert!(ps.is_sibling(VertexId::new(2), VertexId::new(3)).unwrap());
    assert!(!ps.is_sibling(VertexId::new(2), VertexId::new(4)).unwrap());
    assert!(ps.is_neighbour(VertexId::new(1), VertexId::new(2)).unwrap());
    assert!(!ps.is_neighbour(VertexId::new(2), VertexId::new(3)).unwrap());
}

#[test]
fn metric_queries() {
    let ps = sample_system();

    assert_eq!(ps.distance(VertexId::new(4)).unwrap(), Some(2));
    assert_eq!(ps.distance(VertexId::new(99)).unwrap(), None);
    assert_eq!(ps.depth().unwrap(), 2);
    assert_eq!(ps.min_path_length().unwrap(), Some(2));
    assert_eq!(ps.max_path_length().unwrap(), Some(2));

    // Degree at the root: two outgoing forest edges, nothing incoming.
    assert_eq!(
        ps.degree(VertexId::new(1), EdgeDirection::Out, None).unwrap(),
        2
    );
    assert_eq!(
        ps.degree(VertexId::new(1), EdgeDirection::In, None).unwrap(),
        0
    );

    // Type filters narrow the count.
    let mut only_knows = TypeCollection::new();
    only_knows.add_allowed(TypeDescriptor::new("Knows"));
    assert_eq!(
        ps.degree(VertexId::new(2), EdgeDirection::InOut, Some(&only_knows))
            .unwrap(),
        1
    );

    let mut no_lives_in = TypeCollection::new();
    no_lives_in.add_forbidden(TypeDescriptor::new("LivesIn"));
    assert_eq!(
        ps.degree(VertexId::new(2), EdgeDirection::InOut, Some(&no_lives_in))
            .unwrap(),
        1
    );
}

#[test]
fn containment_queries() {
    let ps = sample_system();

    assert!(ps.contains_vertex(VertexId::new(4)).unwrap());
    assert!(!ps.contains_vertex(VertexId::new(99)).unwrap());

    // Containment is orientation-free.
    let reversed = knows(1, &person(1), &person(2)).reversed();
    assert!(ps.contains_edge(&reversed).unwrap());

    assert!(ps.contains_type(&TypeDescriptor::new("City")).unwrap());
    assert!(ps.contains_type(&TypeDescriptor::new("LivesIn")).unwrap());
    assert!(!ps.contains_type(&TypeDescriptor::new("Owns")).unwrap());
}

#[test]
fn path_extraction_returns_root_to_target_paths() {
    let ps = sample_system();

    let path = ps.extract_path(VertexId::new(4)).unwrap();
    assert_eq!(path.start_vertex().id(), VertexId::new(1));
    assert_eq!(path.end_vertex().id(), VertexId::new(4));
    assert_eq!(path.length(), 2);
    assert!(path.is_trail());
    assert!(!path.is_cycle());
    assert_eq!(path.reverse().reverse(), path);

    let all = ps.extract_paths().unwrap();
    assert_eq!(all.len(), 2);
    let of_len = ps.extract_paths_of_length(2).unwrap();
    assert_eq!(of_len, all);
    assert!(ps.extract_paths_of_length(1).unwrap().is_empty());
}

#[test]
fn extracted_subpath_relationship_holds() {
    let ps = sample_system();
    let long = ps.extract_path(VertexId::new(4)).unwrap();

    let mut prefix = Path::new(person(1));
    prefix
        .add_edge(knows(1, &person(1), &person(2)))
        .unwrap();
    assert!(prefix.is_subpath_of(&long));
}

#[test]
fn finish_is_idempotent_and_freezes_results() {
    let mut ps = sample_system();
    let hash = ps.value_hash();
    let leaves = ps.leaves().unwrap();

    ps.finish().unwrap();
    ps.finish().unwrap();

    assert_eq!(ps.value_hash(), hash);
    assert_eq!(ps.leaves().unwrap(), leaves);
}

#[test]
fn deferred_entries_copy_linkage_from_their_parent() {
    let mut ps = PathSystem::new();
    ps.set_root_vertex(person(1), 0, false).unwrap();
    ps.add_vertex(
        person(2),
        1,
        Some(knows(1, &person(1), &person(2))),
        None,
        0,
        1,
        false,
    )
    .unwrap();
    // State-only transition: same vertex, new state, no edge.
    ps.add_vertex(person(2), 2, None, Some(VertexId::new(2)), 1, 1, true)
        .unwrap();
    ps.finish().unwrap();

    // The deferred entry inherited the resolved parent's linkage, so the
    // extracted path is the one-edge path to v2.
    let key = PathSystemKey::new(VertexId::new(2), 2);
    let path = ps.extract_path_for(key).unwrap();
    assert_eq!(path.length(), 1);
    assert_eq!(path.end_vertex().id(), VertexId::new(2));

    // And it is a leaf.
    let leaves = ps.leaves().unwrap();
    assert!(leaves.contains(&Value::from(person(2))));
}

#[test]
fn unresolvable_deferred_entry_fails_finish() {
    let mut ps = PathSystem::new();
    ps.set_root_vertex(person(1), 0, false).unwrap();
    // References a (vertex, state) pair that was never added.
    ps.add_vertex(person(2), 1, None, Some(VertexId::new(77)), 5, 1, false)
        .unwrap();
    assert!(ps.finish().is_err());
}

#[test]
fn path_system_hash_ignores_discovery_order() {
    let build = |swap: bool| {
        let mut ps = PathSystem::new();
        ps.set_root_vertex(person(1), 0, false).unwrap();
        let adds = [
            (person(2), 1, knows(1, &person(1), &person(2))),
            (person(3), 1, knows(2, &person(1), &person(3))),
        ];
        let order: Vec<_> = if swap {
            adds.iter().rev().collect()
        } else {
            adds.iter().collect()
        };
        for (v, s, e) in order {
            ps.add_vertex(v.clone(), *s, Some(e.clone()), None, 0, 1, true)
                .unwrap();
        }
        ps.finish().unwrap();
        ps
    };

    let a = build(false);
    let b = build(true);
    assert_eq!(a, b);
    assert_eq!(a.value_hash(), b.value_hash());
}

// ----------------------------------------------------------------------
// Slice
// ----------------------------------------------------------------------

/// Two criteria reaching a shared vertex independently.
fn sample_slice() -> Slice {
    let mut slice = Slice::new();
    slice.add_slicing_criterion_vertex(person(1), 0, false);
    slice.add_slicing_criterion_vertex(person(2), 0, false);
    slice.add_vertex(
        city(3),
        1,
        Some(lives_in(1, &person(1), &city(3))),
        None,
        0,
        1,
        true,
    );
    slice.add_vertex(
        city(3),
        1,
        Some(lives_in(2, &person(2), &city(3))),
        None,
        0,
        1,
        true,
    );
    slice
}

#[test]
fn slice_keeps_every_derivation_of_a_shared_vertex() {
    let slice = sample_slice();

    assert_eq!(slice.weight(), 4);
    assert_eq!(slice.criterion_count(), 2);
    assert_eq!(slice.nodes().unwrap().len(), 3);
    assert_eq!(slice.edges().unwrap().len(), 2);

    // Both parents are reported: the union over all derivations.
    let parents = slice.parents(VertexId::new(3)).unwrap();
    assert_eq!(parents.len(), 2);
    assert!(parents.contains(&Value::from(person(1))));
    assert!(parents.contains(&Value::from(person(2))));
}

#[test]
fn slice_leaf_and_containment_queries() {
    let slice = sample_slice();

    let leaves = slice.leaves().unwrap();
    assert_eq!(leaves.len(), 1);
    assert!(leaves.contains(&Value::from(city(3))));

    let inner: Set = slice.inner_nodes().unwrap();
    assert_eq!(inner.len(), 2);

    assert!(slice.contains_vertex(VertexId::new(3)).unwrap());
    assert!(slice
        .contains_edge(&lives_in(1, &person(1), &city(3)).reversed())
        .unwrap());
    assert!(slice.contains_type(&TypeDescriptor::new("City")).unwrap());
    assert!(slice.is_neighbour(VertexId::new(2), VertexId::new(3)).unwrap());
}

#[test]
fn slice_clearing_is_lazy_and_idempotent() {
    let mut slice = sample_slice();
    slice.clear_path_system().unwrap();
    let hash = slice.value_hash();

    // Re-clearing changes nothing.
    slice.clear_path_system().unwrap();
    assert_eq!(slice.value_hash(), hash);

    // Mutation re-arms the pass; the next query sees the new entry.
    slice.add_vertex(
        person(4),
        2,
        Some(knows(3, &person(2), &person(4))),
        None,
        0,
        1,
        false,
    );
    assert_ne!(slice.value_hash(), hash);
    assert_eq!(slice.nodes().unwrap().len(), 4);
}

#[test]
fn slice_deferred_entries_resolve_on_first_query() {
    let mut slice = Slice::new();
    slice.add_slicing_criterion_vertex(person(1), 0, false);
    slice.add_vertex(
        person(2),
        1,
        Some(knows(1, &person(1), &person(2))),
        None,
        0,
        1,
        false,
    );
    // State-only transition on v2.
    slice.add_vertex(person(2), 2, None, Some(VertexId::new(2)), 1, 1, true);

    // The deferred entry copies its parent's linkage, so the edge set still
    // has exactly the one real edge and v2 is a leaf.
    assert_eq!(slice.edges().unwrap().len(), 1);
    assert!(slice
        .leaves()
        .unwrap()
        .contains(&Value::from(person(2))));
}

#[test]
fn values_wrap_path_structures() {
    let ps = sample_system();
    let nodes = ps.nodes().unwrap();
    let v = Value::from(ps);
    assert_eq!(v.to_collection().unwrap(), Value::from(nodes));

    let slice = sample_slice();
    let expected = slice.nodes().unwrap();
    let v = Value::from(slice);
    assert_eq!(v.to_collection().unwrap(), Value::from(expected));
}
