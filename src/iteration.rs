//! Iteration flattening and reattachment.
//!
//! Loop bodies arrive either inline on the iteration record or in the
//! document's auxiliary nested section. Their blocks are lifted through the
//! same registry as top-level nodes; this module owns the scope bookkeeping,
//! the edge partition and the final reattachment of each body onto its
//! iteration node.
//!
//! After partitioning, every captured edge is in exactly one category:
//! internal to one graph level, an iteration-start edge, mixed (endpoints on
//! different levels) or dangling (an endpoint that was never lifted). Only
//! the first two survive into the graph.
use crate::ir::{Edge, EdgeKind, Graph, Node};
use crate::platform::Platform;
use crate::records::{RawBlocks, RawEdge, RawNode};
use ahash::AHashMap;
use std::fmt;

/// The graph level a node lives on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Root,
    /// The body of the iteration with this id.
    Body(String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Root => f.write_str("root"),
            Scope::Body(id) => write!(f, "body of '{}'", id),
        }
    }
}

/// The levels every lifted node lives on, plus the loop-start pseudo nodes
/// that were removed. Each level is its own id namespace, so one id may be
/// recorded once per level.
#[derive(Debug, Default, Clone)]
pub struct ScopeMap {
    /// Node id → levels it was lifted on, in lift order.
    scopes: AHashMap<String, Vec<Scope>>,
    /// Pseudo id → bodies it was removed from.
    pseudo_starts: AHashMap<String, Vec<Scope>>,
}

/// What an edge source names once looked up from a given level.
enum Source<'s> {
    Node(&'s Scope),
    /// A removed pseudo node; the scope is its iteration's body.
    PseudoStart(&'s Scope),
}

impl ScopeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node_id: impl Into<String>, scope: Scope) {
        let levels = self.scopes.entry(node_id.into()).or_default();
        if !levels.contains(&scope) {
            levels.push(scope);
        }
    }

    pub fn insert_pseudo_start(&mut self, pseudo_id: impl Into<String>, iteration_id: impl Into<String>) {
        let body = Scope::Body(iteration_id.into());
        let bodies = self.pseudo_starts.entry(pseudo_id.into()).or_default();
        if !bodies.contains(&body) {
            bodies.push(body);
        }
    }

    /// Whether a node with this id was lifted on `scope`.
    pub fn contains(&self, scope: &Scope, node_id: &str) -> bool {
        self.scopes.get(node_id).is_some_and(|levels| levels.contains(scope))
    }

    /// The level `node_id` resolves to when seen from `level`: that level
    /// itself when the id lives there, otherwise the first level it was
    /// lifted on.
    pub fn scope_of(&self, node_id: &str, level: &Scope) -> Option<&Scope> {
        self.scopes.get(node_id).and_then(|levels| nearest(levels, level))
    }

    /// The iteration owning the pseudo node `node_id`, seen from `level`.
    pub fn pseudo_start_owner(&self, node_id: &str, level: &Scope) -> Option<&str> {
        match self.pseudo_starts.get(node_id).and_then(|bodies| nearest(bodies, level)) {
            Some(Scope::Body(owner)) => Some(owner),
            _ => None,
        }
    }

    fn source(&self, node_id: &str, level: &Scope) -> Option<Source<'_>> {
        let node = self.scope_of(node_id, level);
        let pseudo = self.pseudo_starts.get(node_id).and_then(|bodies| nearest(bodies, level));
        match (node, pseudo) {
            (Some(scope), _) if scope == level => Some(Source::Node(scope)),
            (_, Some(body)) if body == level => Some(Source::PseudoStart(body)),
            (Some(scope), _) => Some(Source::Node(scope)),
            (None, Some(body)) => Some(Source::PseudoStart(body)),
            (None, None) => None,
        }
    }
}

fn nearest<'s>(levels: &'s [Scope], level: &Scope) -> Option<&'s Scope> {
    levels.iter().find(|s| *s == level).or_else(|| levels.first())
}

/// Finds an iteration's nested block list: inline on the record first, then
/// in the auxiliary section keyed by its id.
pub fn locate_blocks<'d>(
    raw: &'d RawNode,
    nested: &'d AHashMap<String, RawBlocks>,
) -> Option<&'d RawBlocks> {
    raw.blocks.as_ref().or_else(|| nested.get(&raw.id))
}

/// Which category one captured edge falls into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeClass {
    /// Both endpoints on this level.
    Internal(Scope),
    /// A loop-start edge into the body of this iteration.
    Start(String),
    Mixed,
    Dangling,
}

/// Classifies an edge captured from the edge list of `level`. Endpoints are
/// looked up on that level first, so ids repeated across levels stay apart.
pub fn classify_edge(platform: Platform, level: &Scope, edge: &RawEdge, scopes: &ScopeMap) -> EdgeClass {
    let start_handle = platform.iteration_start_handle();
    if start_handle.is_some()
        && edge.source_handle.as_deref() == start_handle
        && scopes.contains(&Scope::Body(edge.source.clone()), &edge.target)
    {
        return EdgeClass::Start(edge.source.clone());
    }

    match scopes.source(&edge.source, level) {
        Some(Source::PseudoStart(body)) => match body {
            Scope::Body(owner) if scopes.contains(body, &edge.target) => EdgeClass::Start(owner.clone()),
            _ => EdgeClass::Dangling,
        },
        Some(Source::Node(source)) if scopes.contains(source, &edge.target) => {
            EdgeClass::Internal(source.clone())
        }
        Some(Source::Node(_)) if scopes.scope_of(&edge.target, level).is_some() => EdgeClass::Mixed,
        Some(Source::Node(_)) => EdgeClass::Dangling,
        None => EdgeClass::Dangling,
    }
}

/// Captured edges split by category.
#[derive(Debug, Default)]
pub struct EdgePartition {
    /// Edges whose endpoints share one level, keyed by that level.
    pub levels: AHashMap<Scope, Vec<RawEdge>>,
    /// Loop-start edges, already re-sourced onto their iteration.
    pub entries: AHashMap<String, Vec<Edge>>,
    pub mixed: Vec<RawEdge>,
    pub dangling: Vec<RawEdge>,
}

impl EdgePartition {
    /// Edges that stay in the root graph.
    pub fn external(&self) -> &[RawEdge] {
        self.levels.get(&Scope::Root).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Edges internal to the body of `iteration_id`.
    pub fn internal(&self, iteration_id: &str) -> &[RawEdge] {
        self.levels
            .get(&Scope::Body(iteration_id.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn entry_edges(&self, iteration_id: &str) -> &[Edge] {
        self.entries.get(iteration_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.levels.values().map(Vec::len).sum::<usize>()
            + self.entries.values().map(Vec::len).sum::<usize>()
            + self.mixed.len()
            + self.dangling.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partitions every captured edge, each paired with the level whose edge list
/// it came from. Order within each category follows `edges`.
pub fn partition_edges(
    platform: Platform,
    edges: impl IntoIterator<Item = (Scope, RawEdge)>,
    scopes: &ScopeMap,
) -> EdgePartition {
    let mut partition = EdgePartition::default();
    for (level, edge) in edges {
        match classify_edge(platform, &level, &edge, scopes) {
            EdgeClass::Internal(scope) => partition.levels.entry(scope).or_default().push(edge),
            EdgeClass::Start(iteration_id) => {
                let entry = entry_edge(&edge, &iteration_id);
                partition.entries.entry(iteration_id).or_default().push(entry);
            }
            EdgeClass::Mixed => partition.mixed.push(edge),
            EdgeClass::Dangling => partition.dangling.push(edge),
        }
    }
    partition
}

/// Re-sources a loop-start edge onto its iteration and marks it for generators.
fn entry_edge(raw: &RawEdge, iteration_id: &str) -> Edge {
    let mut edge = Edge::new(raw.effective_id(), iteration_id, &raw.target).with_kind(EdgeKind::IterationStart);
    if let Some(handle) = raw.target_handle.as_deref().filter(|h| !h.is_empty()) {
        edge.target_handle = handle.to_string();
    }
    edge
}

/// Attaches `body` and its entry edges to an iteration node. Returns false,
/// leaving the node untouched, when `node` is not an iteration.
pub fn reattach(node: &mut Node, body: Graph, entry_edges: Vec<Edge>) -> bool {
    match node.iteration_mut() {
        Some(config) => {
            config.body = body;
            config.entry_edges = entry_edges;
            true
        }
        None => false,
    }
}
