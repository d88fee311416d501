//! Per-run table that reconciles the output names platforms use with the names
//! the unified graph expects.
//!
//! Platforms disagree on a node's natural output name; a loop construct may
//! emit `result_list` where every consumer in the unified graph expects
//! `output`. Producers that need a remapped name register it in a pre-pass,
//! before any consumer is decoded, and consumers resolve through the table
//! while capturing their references. No second rewriting pass over nested
//! structures is needed.
//!
//! The table also aliases node ids: a loop-start pseudo node is addressed by
//! body nodes, but its values are produced by the owning iteration.
use crate::ir::{VarType, VariableReference};
use ahash::AHashMap;
use tracing::debug;

#[derive(Debug, Default, Clone)]
pub struct ReferenceResolver {
    output_names: AHashMap<String, AHashMap<String, String>>,
    node_aliases: AHashMap<String, String>,
}

impl ReferenceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `(node_id, original_name)` is exposed as `effective_name`.
    /// Registering the same pair again replaces the earlier mapping.
    pub fn register_output_mapping(
        &mut self,
        node_id: impl Into<String>,
        original_name: impl Into<String>,
        effective_name: impl Into<String>,
    ) {
        let node_id = node_id.into();
        let original_name = original_name.into();
        let effective_name = effective_name.into();
        debug!(node = %node_id, from = %original_name, to = %effective_name, "registered output mapping");
        self.output_names
            .entry(node_id)
            .or_default()
            .insert(original_name, effective_name);
    }

    /// The registered name for exactly this pair, or `name` unchanged. Never fails.
    pub fn resolve_output_name<'a>(&'a self, node_id: &str, name: &'a str) -> &'a str {
        self.output_names
            .get(node_id)
            .and_then(|names| names.get(name))
            .map(String::as_str)
            .unwrap_or(name)
    }

    /// Makes references to `alias` resolve to `node_id`.
    pub fn register_node_alias(&mut self, alias: impl Into<String>, node_id: impl Into<String>) {
        let alias = alias.into();
        let node_id = node_id.into();
        debug!(%alias, node = %node_id, "registered node alias");
        self.node_aliases.insert(alias, node_id);
    }

    pub fn resolve_node_id<'a>(&'a self, node_id: &'a str) -> &'a str {
        self.node_aliases
            .get(node_id)
            .map(String::as_str)
            .unwrap_or(node_id)
    }

    /// Captures a reference with both the producer id and the output name resolved.
    pub fn resolve(&self, node_id: &str, output_name: &str, var_type: VarType) -> VariableReference {
        let node_id = self.resolve_node_id(node_id);
        let output_name = self.resolve_output_name(node_id, output_name);
        VariableReference::new(node_id, output_name, var_type)
    }

    pub fn is_empty(&self) -> bool {
        self.output_names.is_empty() && self.node_aliases.is_empty()
    }
}
