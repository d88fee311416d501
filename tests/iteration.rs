//! Tests for scope bookkeeping, edge partitioning and body reattachment.
use ahash::AHashMap;
use flowbridge::ir::*;
use flowbridge::iteration::*;
use flowbridge::prelude::*;
use flowbridge::records::{RawBlocks, RawEdge, RawNode};

fn body(id: &str) -> Scope {
    Scope::Body(id.to_string())
}

/// `X`, `Y` and the loop at the root; `A`, `B` inside the loop.
fn loop_scopes() -> ScopeMap {
    let mut scopes = ScopeMap::new();
    scopes.insert("X", Scope::Root);
    scopes.insert("Y", Scope::Root);
    scopes.insert("loop", Scope::Root);
    scopes.insert("A", body("loop"));
    scopes.insert("B", body("loop"));
    scopes
}

/// Edges as they appear in the root edge list.
fn at_root(edges: Vec<RawEdge>) -> Vec<(Scope, RawEdge)> {
    edges.into_iter().map(|edge| (Scope::Root, edge)).collect()
}

#[test]
fn test_edges_across_the_boundary_are_mixed() {
    let edges = vec![
        RawEdge::new("xa", "X", "A"),
        RawEdge::new("ab", "A", "B"),
        RawEdge::new("by", "B", "Y"),
    ];
    let partition = partition_edges(Platform::Dify, at_root(edges), &loop_scopes());

    let internal: Vec<&str> = partition.internal("loop").iter().map(|e| e.id.as_str()).collect();
    assert_eq!(internal, vec!["ab"]);
    let mixed: Vec<&str> = partition.mixed.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(mixed, vec!["xa", "by"]);
    assert!(partition.external().is_empty());
    assert!(partition.dangling.is_empty());
    assert_eq!(partition.len(), 3);
}

#[test]
fn test_every_edge_lands_in_exactly_one_category() {
    let scopes = loop_scopes();
    let edges = vec![
        RawEdge::new("root", "X", "loop"),
        RawEdge::new("inner", "A", "B"),
        RawEdge::new("cross", "X", "B"),
        RawEdge::new("ghost", "X", "nowhere"),
        RawEdge::new("start", "loop", "A").with_source_handle("iteration-start"),
    ];
    let partition = partition_edges(Platform::Bailian, at_root(edges.clone()), &scopes);

    assert_eq!(partition.len(), edges.len());
    assert_eq!(partition.external().len(), 1);
    assert_eq!(partition.internal("loop").len(), 1);
    assert_eq!(partition.entry_edges("loop").len(), 1);
    assert_eq!(partition.mixed.len(), 1);
    assert_eq!(partition.dangling.len(), 1);
    assert!(!partition.is_empty());
}

#[test]
fn test_platform_start_handle_marks_entry_edges() {
    let scopes = loop_scopes();
    let coze = RawEdge::new("", "loop", "A").with_source_handle("loop-function-inline-output");
    assert_eq!(
        classify_edge(Platform::Coze, &Scope::Root, &coze, &scopes),
        EdgeClass::Start("loop".to_string())
    );

    // The same port means nothing to a platform that uses pseudo nodes.
    assert_eq!(classify_edge(Platform::Dify, &Scope::Root, &coze, &scopes), EdgeClass::Mixed);

    // A start handle that leaves the body is not an entry edge.
    let outward = RawEdge::new("", "loop", "Y").with_source_handle("loop-function-inline-output");
    assert_eq!(
        classify_edge(Platform::Coze, &Scope::Root, &outward, &scopes),
        EdgeClass::Internal(Scope::Root)
    );
}

#[test]
fn test_pseudo_start_node_marks_entry_edges() {
    let mut scopes = loop_scopes();
    scopes.insert_pseudo_start("loop-start", "loop");

    let edge = RawEdge::new("e", "loop-start", "A");
    assert_eq!(
        classify_edge(Platform::Dify, &Scope::Root, &edge, &scopes),
        EdgeClass::Start("loop".to_string())
    );
    // From the pseudo node to somewhere outside its body.
    let edge = RawEdge::new("e", "loop-start", "Y");
    assert_eq!(classify_edge(Platform::Dify, &Scope::Root, &edge, &scopes), EdgeClass::Dangling);
}

#[test]
fn test_same_id_on_two_levels_stays_apart() {
    // `end` is both a root node and a block inside the loop.
    let mut scopes = ScopeMap::new();
    for id in ["s", "it", "end"] {
        scopes.insert(id, Scope::Root);
    }
    scopes.insert("end", body("it"));
    scopes.insert("b2", body("it"));
    assert!(scopes.contains(&Scope::Root, "end"));
    assert!(scopes.contains(&body("it"), "end"));
    assert_eq!(scopes.scope_of("end", &body("it")), Some(&body("it")));
    assert_eq!(scopes.scope_of("end", &Scope::Root), Some(&Scope::Root));
    assert_eq!(scopes.scope_of("b2", &Scope::Root), Some(&body("it")));

    let edges = vec![
        (Scope::Root, RawEdge::new("a", "s", "it")),
        (Scope::Root, RawEdge::new("b", "it", "end")),
        (body("it"), RawEdge::new("e-start", "it", "end").with_source_handle("iteration-start")),
        (body("it"), RawEdge::new("e-body", "end", "b2")),
    ];
    let partition = partition_edges(Platform::Bailian, edges, &scopes);

    let external: Vec<&str> = partition.external().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(external, vec!["a", "b"]);
    let internal: Vec<&str> = partition.internal("it").iter().map(|e| e.id.as_str()).collect();
    assert_eq!(internal, vec!["e-body"]);
    let entries = partition.entry_edges("it");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, "e-start");
    assert_eq!(entries[0].target, "end");
    assert!(partition.mixed.is_empty());
    assert!(partition.dangling.is_empty());

    // Read from the root list, the same pair crosses the boundary.
    let from_root = RawEdge::new("x", "end", "b2");
    assert_eq!(
        classify_edge(Platform::Bailian, &Scope::Root, &from_root, &scopes),
        EdgeClass::Mixed
    );
}

#[test]
fn test_pseudo_start_is_scoped_to_its_body() {
    let mut scopes = loop_scopes();
    // A root node and the loop's pseudo start share an id.
    scopes.insert("X", Scope::Root);
    scopes.insert_pseudo_start("X", "loop");
    assert_eq!(scopes.pseudo_start_owner("X", &body("loop")), Some("loop"));

    let inside = RawEdge::new("in", "X", "A");
    assert_eq!(
        classify_edge(Platform::Dify, &body("loop"), &inside, &scopes),
        EdgeClass::Start("loop".to_string())
    );
    let outside = RawEdge::new("out", "X", "Y");
    assert_eq!(
        classify_edge(Platform::Dify, &Scope::Root, &outside, &scopes),
        EdgeClass::Internal(Scope::Root)
    );
}

#[test]
fn test_entry_edges_are_resourced() {
    let mut scopes = loop_scopes();
    scopes.insert_pseudo_start("loop-start", "loop");
    let edges = vec![RawEdge::new("e", "loop-start", "A").with_target_handle("in")];

    let partition = partition_edges(Platform::Dify, at_root(edges), &scopes);
    let entries = partition.entry_edges("loop");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, "e");
    assert_eq!(entries[0].source, "loop");
    assert_eq!(entries[0].target, "A");
    assert_eq!(entries[0].target_handle, "in");
    assert_eq!(entries[0].kind, EdgeKind::IterationStart);
    assert!(partition.entry_edges("other").is_empty());
}

#[test]
fn test_locate_blocks_prefers_inline() {
    let inline = RawBlocks::new(vec![RawNode::new("inline", "5")], vec![]);
    let mut nested = AHashMap::new();
    nested.insert("loop".to_string(), RawBlocks::new(vec![RawNode::new("aux", "5")], vec![]));

    let with_inline = RawNode::new("loop", "21").with_blocks(inline);
    let found = locate_blocks(&with_inline, &nested).unwrap();
    assert_eq!(found.nodes[0].id, "inline");

    let without = RawNode::new("loop", "21");
    assert_eq!(locate_blocks(&without, &nested).unwrap().nodes[0].id, "aux");

    let unrelated = RawNode::new("other", "21");
    assert!(locate_blocks(&unrelated, &nested).is_none());
}

#[test]
fn test_reattach_only_touches_iterations() {
    let body = Graph::new(
        vec![Node::new("a", "a", NodeConfig::Code(CodeConfig::default()))],
        vec![],
    );
    let entry = Edge::new("e", "loop", "a").with_kind(EdgeKind::IterationStart);

    let mut iteration = Node::new(
        "loop",
        "Loop",
        NodeConfig::Iteration(Box::new(IterationConfig::default())),
    );
    assert!(reattach(&mut iteration, body.clone(), vec![entry.clone()]));
    let config = iteration.iteration().unwrap();
    assert_eq!(config.body, body);
    assert_eq!(config.entry_edges, vec![entry.clone()]);

    let mut code = Node::new("c", "c", NodeConfig::Code(CodeConfig::default()));
    let before = code.clone();
    assert!(!reattach(&mut code, body, vec![entry]));
    assert_eq!(code, before);
}

#[test]
fn test_scope_display() {
    assert_eq!(Scope::Root.to_string(), "root");
    assert_eq!(body("loop").to_string(), "body of 'loop'");
}
