use crate::error::FormatError;
use crate::ir::NodeMeta;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The record tree handed to the conversion core.
///
/// A platform adapter builds this from an already-deserialized document. Node
/// parameters are an opaque bag keyed by canonical names; structural data
/// (ids, tags, inputs, outputs, nested blocks, edges) is lifted out of the bag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDocument {
    pub nodes: Vec<RawNode>,
    pub edges: Vec<RawEdge>,
    /// Auxiliary section of loop bodies keyed by the owning iteration's id, for
    /// platforms that do not store bodies inline on the node.
    pub nested: AHashMap<String, RawBlocks>,
}

impl RawDocument {
    pub fn new(nodes: Vec<RawNode>, edges: Vec<RawEdge>) -> Self {
        Self {
            nodes,
            edges,
            nested: AHashMap::new(),
        }
    }

    pub fn with_nested(mut self, iteration_id: impl Into<String>, blocks: RawBlocks) -> Self {
        self.nested.insert(iteration_id.into(), blocks);
        self
    }

    /// Fails when the document cannot identify its own nodes.
    pub fn check(&self) -> Result<(), FormatError> {
        check_nodes(&self.nodes)?;
        for blocks in self.nested.values() {
            check_nodes(&blocks.nodes)?;
        }
        Ok(())
    }
}

fn check_nodes(nodes: &[RawNode]) -> Result<(), FormatError> {
    for (index, node) in nodes.iter().enumerate() {
        if node.id.trim().is_empty() {
            return Err(FormatError::MissingNodeId { index });
        }
        if node.type_tag.trim().is_empty() {
            return Err(FormatError::MissingTypeTag {
                node_id: node.id.clone(),
            });
        }
        if let Some(blocks) = &node.blocks {
            check_nodes(&blocks.nodes)?;
        }
    }
    Ok(())
}

/// A nested block list: the nodes and edges of one loop body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawBlocks {
    pub nodes: Vec<RawNode>,
    pub edges: Vec<RawEdge>,
}

impl RawBlocks {
    pub fn new(nodes: Vec<RawNode>, edges: Vec<RawEdge>) -> Self {
        Self { nodes, edges }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawNode {
    pub id: String,
    pub type_tag: String,
    pub title: Option<String>,
    pub params: Map<String, Value>,
    pub inputs: Vec<RawInput>,
    pub outputs: Vec<RawOutput>,
    /// Loop body stored inline on the node.
    pub blocks: Option<RawBlocks>,
    pub meta: NodeMeta,
}

impl RawNode {
    pub fn new(id: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_tag: type_tag.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_param(mut self, key: &str, value: Value) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    pub fn with_input(mut self, input: RawInput) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn with_output(mut self, name: impl Into<String>, var_type: Option<&str>) -> Self {
        self.outputs.push(RawOutput {
            name: name.into(),
            var_type: var_type.map(str::to_string),
        });
        self
    }

    pub fn with_blocks(mut self, blocks: RawBlocks) -> Self {
        self.blocks = Some(blocks);
        self
    }

    /// The display title, falling back to the id.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawReference {
    pub node_id: String,
    pub output_name: String,
}

impl RawReference {
    pub fn new(node_id: impl Into<String>, output_name: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            output_name: output_name.into(),
        }
    }

    /// The canonical parameter-bag shape of a reference.
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "node_id": self.node_id, "output_name": self.output_name })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawValue {
    Reference(RawReference),
    Literal(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInput {
    pub name: String,
    pub var_type: Option<String>,
    pub value: RawValue,
}

impl RawInput {
    pub fn reference(
        name: impl Into<String>,
        node_id: impl Into<String>,
        output_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            var_type: None,
            value: RawValue::Reference(RawReference::new(node_id, output_name)),
        }
    }

    pub fn literal(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            var_type: None,
            value: RawValue::Literal(value),
        }
    }

    pub fn with_type(mut self, var_type: impl Into<String>) -> Self {
        self.var_type = Some(var_type.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOutput {
    pub name: String,
    pub var_type: Option<String>,
}

/// A connection as the platform records it; handles are platform-native.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEdge {
    pub id: String,
    pub source: String,
    pub source_handle: Option<String>,
    pub target: String,
    pub target_handle: Option<String>,
}

impl RawEdge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            ..Default::default()
        }
    }

    pub fn with_source_handle(mut self, handle: impl Into<String>) -> Self {
        self.source_handle = Some(handle.into());
        self
    }

    pub fn with_target_handle(mut self, handle: impl Into<String>) -> Self {
        self.target_handle = Some(handle.into());
        self
    }

    /// Edge ids are optional on some platforms; derive a stable one when absent.
    pub fn effective_id(&self) -> String {
        if self.id.is_empty() {
            format!(
                "{}-{}-{}",
                self.source,
                self.source_handle.as_deref().unwrap_or("default"),
                self.target
            )
        } else {
            self.id.clone()
        }
    }
}
