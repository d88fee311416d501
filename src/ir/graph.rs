use super::{Edge, EdgeKind, Node, NodeType};
use crate::error::StructuralError;
use ahash::AHashSet;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// One graph level: the root of a conversion, or the body of one iteration.
///
/// Nodes and edges keep document order. Ids are unique within a level; each
/// iteration body is its own id namespace.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Edges leaving `node_id` on this level.
    pub fn outgoing<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source == node_id)
    }

    /// Edges entering `node_id` on this level.
    pub fn incoming<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.target == node_id)
    }

    pub fn nodes_of_type(&self, node_type: NodeType) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.node_type == node_type)
    }

    /// Visits every node on this level and, depth-first, inside iteration bodies.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        for node in &self.nodes {
            visit(node);
            if let Some(iteration) = node.iteration() {
                iteration.body.walk(visit);
            }
        }
    }

    /// Total node count across all levels.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_| count += 1);
        count
    }

    /// Checks the structural invariants of this level and every nested body.
    pub fn validate(&self) -> Result<(), StructuralError> {
        validate(self)
    }
}

/// Fails with a `StructuralError` when any level of `graph` has a duplicate
/// node id, an edge whose endpoint is not on the same level, a config whose
/// variant disagrees with the node type, duplicate output names, or a malformed
/// iteration entry edge.
pub fn validate(graph: &Graph) -> Result<(), StructuralError> {
    if let Some(id) = graph.nodes.iter().map(|n| n.id.as_str()).duplicates().next() {
        return Err(StructuralError::DuplicateNodeId { id: id.to_string() });
    }

    let ids: AHashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();

    for edge in &graph.edges {
        if edge.kind != EdgeKind::Control {
            return Err(StructuralError::MisplacedEntryEdge {
                edge_id: edge.id.clone(),
            });
        }
        for endpoint in [&edge.source, &edge.target] {
            if !ids.contains(endpoint.as_str()) {
                return Err(StructuralError::EdgeEndpointMissing {
                    edge_id: edge.id.clone(),
                    node_id: endpoint.clone(),
                });
            }
        }
    }

    for node in &graph.nodes {
        let config_type = node.config.node_type();
        if config_type != node.node_type {
            return Err(StructuralError::ConfigMismatch {
                node_id: node.id.clone(),
                node_type: node.node_type,
                config_type,
            });
        }

        if let Some(name) = node.outputs.iter().map(|o| o.name.as_str()).duplicates().next() {
            return Err(StructuralError::DuplicateOutput {
                node_id: node.id.clone(),
                output: name.to_string(),
            });
        }

        if let Some(iteration) = node.iteration() {
            for entry in &iteration.entry_edges {
                if entry.kind != EdgeKind::IterationStart
                    || entry.source != node.id
                    || !iteration.body.contains(&entry.target)
                {
                    return Err(StructuralError::InvalidEntryEdge {
                        iteration_id: node.id.clone(),
                        edge_id: entry.id.clone(),
                    });
                }
            }
            validate(&iteration.body)?;
        }
    }

    Ok(())
}
