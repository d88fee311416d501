use super::report::{ConversionReport, Diagnostic};
use crate::error::ConvertError;
use crate::handle;
use crate::ir::{CanonicalHandle, Edge, Graph, Node, NodeConfig, NodeType, VariableReference};
use crate::iteration::{self, EdgePartition, Scope, ScopeMap};
use crate::platform::Platform;
use crate::records::{RawBlocks, RawDocument, RawEdge, RawNode};
use crate::registry::{DecodeContext, DecoderRegistry, ITERATION_OUTPUT};
use crate::resolver::ReferenceResolver;
use ahash::{AHashMap, AHashSet};
use serde_json::Value;
use tracing::{debug, warn};

/// A node in document order; End nodes wait for the final removed set.
enum Slot<'d> {
    Ready(Node),
    DeferredEnd(&'d RawNode),
}

/// Builds the unified graph for one document. All state here lives for exactly
/// one conversion run.
pub(super) struct GraphBuilder<'a, 'd> {
    platform: Platform,
    registry: &'a DecoderRegistry,
    document: &'d RawDocument,
    resolver: ReferenceResolver,
    /// Pseudo nodes, placeholders and dropped nested blocks.
    removed: AHashSet<String>,
    scopes: ScopeMap,
    levels: Vec<(Scope, Vec<Slot<'d>>)>,
    visited_nested: AHashSet<&'d str>,
    /// Every edge list seen so far, tagged with the level it belongs to.
    captured_edges: Vec<(Scope, RawEdge)>,
    report: ConversionReport,
}

impl<'a, 'd> GraphBuilder<'a, 'd> {
    pub(super) fn new(registry: &'a DecoderRegistry, document: &'d RawDocument) -> Self {
        Self {
            platform: registry.platform(),
            registry,
            document,
            resolver: ReferenceResolver::new(),
            removed: AHashSet::new(),
            scopes: ScopeMap::new(),
            levels: Vec::new(),
            visited_nested: AHashSet::new(),
            captured_edges: Vec::new(),
            report: ConversionReport::default(),
        }
    }

    pub(super) fn build(mut self) -> Result<(Graph, ConversionReport), ConvertError> {
        let document = self.document;
        document.check()?;

        // Remapped output names must be registered before any consumer is decoded.
        self.prescan(&document.nodes, None);

        self.capture_edges(Scope::Root, &document.edges);
        self.lift_level(&document.nodes, Scope::Root);
        self.drop_orphan_blocks();
        let mut levels = self.finish_levels();

        let edges = std::mem::take(&mut self.captured_edges);
        let partition = iteration::partition_edges(self.platform, edges, &self.scopes);
        self.report_dropped_edges(&partition);

        self.drop_dangling_references(&mut levels);
        let mut levels: AHashMap<Scope, Vec<Node>> = levels.into_iter().collect();
        let graph = self.assemble(Scope::Root, &mut levels, &partition);

        graph.validate()?;
        Ok((graph, self.report))
    }

    /// Registers iteration output remaps and loop-start aliases at every level.
    fn prescan(&mut self, nodes: &'d [RawNode], owner: Option<&'d str>) {
        let document = self.document;
        for raw in nodes {
            if let Some(owner) = owner {
                if self.platform.is_pseudo_tag(&raw.type_tag) {
                    self.resolver.register_node_alias(&raw.id, owner);
                    continue;
                }
            }
            if self.registry.node_type(&raw.type_tag) != Some(NodeType::Iteration) {
                continue;
            }
            for output in &raw.outputs {
                if output.name != ITERATION_OUTPUT {
                    self.resolver
                        .register_output_mapping(&raw.id, &output.name, ITERATION_OUTPUT);
                }
            }
            if let Some(start) = raw
                .params
                .get("start_node_id")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
            {
                self.resolver.register_node_alias(start, &raw.id);
            }
            if let Some(blocks) = iteration::locate_blocks(raw, &document.nested) {
                self.prescan(&blocks.nodes, Some(&raw.id));
            }
        }
    }

    /// Decodes one level in document order and recurses into iteration bodies.
    fn lift_level(&mut self, nodes: &'d [RawNode], scope: Scope) {
        let document = self.document;
        let mut slots = Vec::with_capacity(nodes.len());
        for raw in nodes {
            if self.platform.is_pseudo_tag(&raw.type_tag) {
                debug!(node = %raw.id, tag = %raw.type_tag, "removing pseudo node");
                self.removed.insert(raw.id.clone());
                if let Scope::Body(owner) = &scope {
                    self.scopes.insert_pseudo_start(&raw.id, owner);
                }
                continue;
            }
            if self.registry.node_type(&raw.type_tag) == Some(NodeType::End) {
                slots.push(Slot::DeferredEnd(raw));
                continue;
            }
            let node = self.decode(raw, &scope);
            match &node {
                Some(node) if node.node_type == NodeType::Iteration => {
                    if raw.blocks.is_none() && document.nested.contains_key(&raw.id) {
                        self.visited_nested.insert(raw.id.as_str());
                    }
                    if let Some(blocks) = iteration::locate_blocks(raw, &document.nested) {
                        let body = Scope::Body(raw.id.clone());
                        self.capture_edges(body.clone(), &blocks.edges);
                        self.lift_level(&blocks.nodes, body);
                    }
                }
                // A placeholder or a dropped block cannot own a body; nested
                // sections keyed by its id are left to `drop_orphan_blocks`.
                _ => {
                    if let Some(blocks) = raw.blocks.as_ref() {
                        self.drop_unlifted(&raw.id, blocks);
                    }
                }
            }
            slots.extend(node.map(Slot::Ready));
        }
        self.levels.push((scope, slots));
    }

    fn capture_edges(&mut self, level: Scope, edges: &[RawEdge]) {
        self.captured_edges
            .extend(edges.iter().map(|edge| (level.clone(), edge.clone())));
    }

    /// Top-level nodes degrade to a placeholder; nested blocks are dropped.
    fn decode(&mut self, raw: &RawNode, scope: &Scope) -> Option<Node> {
        let ctx = DecodeContext::new(self.platform, &self.resolver, &self.removed);
        let node = match scope {
            Scope::Root => {
                let decoded = self.registry.decode_with_fallback(raw, &ctx);
                match decoded.fallback {
                    None => {
                        self.report.converted_nodes += 1;
                        decoded.node
                    }
                    Some(error) => {
                        self.removed.insert(raw.id.clone());
                        self.report.placeholders.push(raw.id.clone());
                        self.report.push(Diagnostic::UnsupportedNode {
                            node_id: raw.id.clone(),
                            type_tag: raw.type_tag.clone(),
                            reason: error.to_string(),
                        });
                        decoded.node
                    }
                }
            }
            Scope::Body(owner) => match self.registry.try_decode(raw, &ctx) {
                Ok(node) => {
                    self.report.converted_nodes += 1;
                    node
                }
                Err(error) => {
                    warn!(iteration = %owner, node = %raw.id, tag = %raw.type_tag, %error, "dropping nested block");
                    self.drop_block(owner, raw, error.to_string());
                    return None;
                }
            },
        };
        self.scopes.insert(&node.id, scope.clone());
        Some(node)
    }

    fn drop_block(&mut self, owner: &str, raw: &RawNode, reason: String) {
        self.removed.insert(raw.id.clone());
        self.report.dropped_blocks.push(raw.id.clone());
        self.report.push(Diagnostic::DroppedNestedBlock {
            iteration_id: owner.to_string(),
            node_id: raw.id.clone(),
            type_tag: raw.type_tag.clone(),
            reason,
        });
    }

    /// Nested sections whose owner never became an iteration are never lifted.
    fn drop_orphan_blocks(&mut self) {
        let document = self.document;
        let mut orphans: Vec<(&'d String, &'d RawBlocks)> = document
            .nested
            .iter()
            .filter(|(owner, _)| !self.visited_nested.contains(owner.as_str()))
            .collect();
        orphans.sort_by(|a, b| a.0.cmp(b.0));
        for (owner, blocks) in orphans {
            self.drop_unlifted(owner, blocks);
        }
    }

    /// Drops a whole block list, recursing into inline bodies. Its edges are
    /// still captured so the report names each one as dangling.
    fn drop_unlifted(&mut self, owner: &str, blocks: &'d RawBlocks) {
        self.capture_edges(Scope::Body(owner.to_string()), &blocks.edges);
        for raw in &blocks.nodes {
            if self.platform.is_pseudo_tag(&raw.type_tag) {
                self.removed.insert(raw.id.clone());
                continue;
            }
            debug!(iteration = %owner, node = %raw.id, "nested block has no iteration to attach to");
            self.drop_block(owner, raw, format!("'{}' is not a converted iteration", owner));
            if let Some(inner) = raw.blocks.as_ref() {
                self.drop_unlifted(&raw.id, inner);
            }
        }
    }

    /// Decodes the deferred End nodes now that the removed set is final.
    fn finish_levels(&mut self) -> Vec<(Scope, Vec<Node>)> {
        let levels = std::mem::take(&mut self.levels);
        let mut finished = Vec::with_capacity(levels.len());
        for (scope, slots) in levels {
            let mut nodes = Vec::with_capacity(slots.len());
            for slot in slots {
                match slot {
                    Slot::Ready(node) => nodes.push(node),
                    Slot::DeferredEnd(raw) => nodes.extend(self.decode(raw, &scope)),
                }
            }
            finished.push((scope, nodes));
        }
        finished
    }

    fn report_dropped_edges(&mut self, partition: &EdgePartition) {
        for edge in &partition.mixed {
            warn!(edge = %edge.effective_id(), source = %edge.source, target = %edge.target, "dropping edge across an iteration boundary");
            self.report.push(Diagnostic::MixedEdge {
                edge_id: edge.effective_id(),
                from: edge.source.clone(),
                to: edge.target.clone(),
            });
        }
        for edge in &partition.dangling {
            debug!(edge = %edge.effective_id(), source = %edge.source, target = %edge.target, "dropping edge with a missing endpoint");
            self.report.push(Diagnostic::DanglingEdge {
                edge_id: edge.effective_id(),
                from: edge.source.clone(),
                to: edge.target.clone(),
            });
        }
    }

    /// Drops inputs, and clears config references, whose producer is absent
    /// from every level of the graph.
    fn drop_dangling_references(&mut self, levels: &mut [(Scope, Vec<Node>)]) {
        let present: AHashSet<String> = levels
            .iter()
            .flat_map(|(_, nodes)| nodes.iter().map(|n| n.id.clone()))
            .collect();
        let report = &mut self.report;
        for (_, nodes) in levels.iter_mut() {
            for node in nodes.iter_mut() {
                let node_id = node.id.clone();
                node.inputs.retain(|input| match input.as_reference() {
                    Some(r) if !present.contains(&r.node_id) => {
                        dangling(report, &node_id, &input.name, &r.node_id);
                        false
                    }
                    _ => true,
                });
                let mut clear = |slot: &mut Option<VariableReference>, name: &str| {
                    if let Some(r) = slot {
                        if !present.contains(&r.node_id) {
                            dangling(report, &node_id, name, &r.node_id);
                            *slot = None;
                        }
                    }
                };
                match &mut node.config {
                    NodeConfig::Condition(c) => {
                        for case in &mut c.cases {
                            for condition in &mut case.conditions {
                                clear(&mut condition.left, &case.id);
                            }
                        }
                    }
                    NodeConfig::Classifier(c) => clear(&mut c.query, "query"),
                    NodeConfig::Iteration(c) => {
                        clear(&mut c.iterator, "iterator");
                        clear(&mut c.output, "output");
                    }
                    _ => {}
                }
            }
        }
    }

    /// Builds one level's graph, reattaching each iteration's body first.
    fn assemble(
        &mut self,
        scope: Scope,
        levels: &mut AHashMap<Scope, Vec<Node>>,
        partition: &EdgePartition,
    ) -> Graph {
        let mut nodes = levels.remove(&scope).unwrap_or_default();
        for node in nodes.iter_mut() {
            if node.node_type == NodeType::Iteration {
                let body = self.assemble(Scope::Body(node.id.clone()), levels, partition);
                let entries = partition.entry_edges(&node.id).to_vec();
                iteration::reattach(node, body, entries);
            }
        }

        let edges: Vec<Edge> = {
            let by_id: AHashMap<&str, &Node> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();
            partition
                .levels
                .get(&scope)
                .into_iter()
                .flatten()
                .filter_map(|raw| by_id.get(raw.source.as_str()).map(|source| (raw, *source)))
                .map(|(raw, source)| {
                    let edge = handle::canonical_edge(self.platform, raw, source);
                    if let CanonicalHandle::Raw(h) = &edge.source_handle {
                        self.report.push(Diagnostic::UnrecognizedHandle {
                            edge_id: edge.id.clone(),
                            node_id: edge.source.clone(),
                            handle: h.clone(),
                        });
                    }
                    if let (CanonicalHandle::Case(index), Some(classes)) = (
                        &edge.source_handle,
                        handle::class_out_of_range(&edge.source_handle, source),
                    ) {
                        self.report.push(Diagnostic::BranchOutOfRange {
                            edge_id: edge.id.clone(),
                            node_id: edge.source.clone(),
                            index: *index,
                            classes,
                        });
                    }
                    edge
                })
                .collect()
        };

        Graph::new(nodes, edges)
    }
}

fn dangling(report: &mut ConversionReport, node_id: &str, slot: &str, missing: &str) {
    debug!(node = %node_id, %slot, %missing, "dropping dangling reference");
    report.push(Diagnostic::DanglingReference {
        node_id: node_id.to_string(),
        slot: slot.to_string(),
        missing: missing.to_string(),
    });
}
