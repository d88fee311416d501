use super::{Edge, Graph, Literal, VarType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of node kinds the unified graph understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Start,
    End,
    Llm,
    Code,
    Condition,
    Classifier,
    Iteration,
}

impl NodeType {
    pub const ALL: [NodeType; 7] = [
        NodeType::Start,
        NodeType::End,
        NodeType::Llm,
        NodeType::Code,
        NodeType::Condition,
        NodeType::Classifier,
        NodeType::Iteration,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NodeType::Start => "start",
            NodeType::End => "end",
            NodeType::Llm => "llm",
            NodeType::Code => "code",
            NodeType::Condition => "condition",
            NodeType::Classifier => "classifier",
            NodeType::Iteration => "iteration",
        }
    }

    /// Whether edges leaving this node select a branch.
    pub fn is_branching(self) -> bool {
        matches!(self, NodeType::Condition | NodeType::Classifier)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// "Take the value node `node_id` emitted under `output_name`."
///
/// A reference does not own its producer. A reference whose producer is gone
/// is detected when the graph is assembled, not when it is captured.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableReference {
    pub node_id: String,
    pub output_name: String,
    pub var_type: VarType,
}

impl VariableReference {
    pub fn new(node_id: impl Into<String>, output_name: impl Into<String>, var_type: VarType) -> Self {
        Self {
            node_id: node_id.into(),
            output_name: output_name.into(),
            var_type,
        }
    }
}

impl fmt::Display for VariableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{{#{}.{}#}}}}", self.node_id, self.output_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputValue {
    Reference(VariableReference),
    Literal(Literal),
}

/// A named, typed input slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input {
    pub name: String,
    pub var_type: VarType,
    pub value: InputValue,
}

impl Input {
    pub fn reference(name: impl Into<String>, reference: VariableReference) -> Self {
        Self {
            name: name.into(),
            var_type: reference.var_type,
            value: InputValue::Reference(reference),
        }
    }

    pub fn literal(name: impl Into<String>, var_type: VarType, value: Literal) -> Self {
        Self {
            name: name.into(),
            var_type,
            value: InputValue::Literal(value),
        }
    }

    pub fn as_reference(&self) -> Option<&VariableReference> {
        match &self.value {
            InputValue::Reference(r) => Some(r),
            InputValue::Literal(_) => None,
        }
    }
}

/// A named, typed output slot. Names are unique within their node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub name: String,
    pub var_type: VarType,
}

impl Output {
    pub fn new(name: impl Into<String>, var_type: VarType) -> Self {
        Self {
            name: name.into(),
            var_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Presentation metadata. Carried through unchanged for generators.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeMeta {
    pub position: Option<Position>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    pub provider: Option<String>,
    pub name: String,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StartConfig {}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EndConfig {
    /// Streaming answer template, for platforms whose terminal node renders text.
    pub answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    pub model: ModelConfig,
    pub system_prompt: Option<String>,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CodeLanguage {
    #[default]
    Python3,
    JavaScript,
    Other(String),
}

impl CodeLanguage {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "python" | "python3" | "py" => CodeLanguage::Python3,
            "javascript" | "js" | "typescript" | "ts" | "nodejs" => CodeLanguage::JavaScript,
            _ => CodeLanguage::Other(raw.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CodeConfig {
    pub language: CodeLanguage,
    pub code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub left: Option<VariableReference>,
    pub operator: String,
    pub right: Literal,
}

/// One declared branch of a condition node; its position is its case index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchCase {
    pub id: String,
    pub logical_operator: LogicalOperator,
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConditionConfig {
    pub cases: Vec<BranchCase>,
}

/// One declared class of a classifier node; its position is its case index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassLabel {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub model: ModelConfig,
    pub query: Option<VariableReference>,
    pub instruction: Option<String>,
    pub classes: Vec<ClassLabel>,
}

/// The only config that owns a nested graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IterationConfig {
    /// The array the loop walks over.
    pub iterator: Option<VariableReference>,
    /// The body value collected per item into the iteration's `output`.
    pub output: Option<VariableReference>,
    pub output_type: VarType,
    pub parallel: bool,
    /// Loop-start edges, re-sourced onto the iteration node and marked with
    /// `EdgeKind::IterationStart`. They belong to neither the parent nor the body
    /// edge set; generators re-expand them into their own loop-entry construct.
    pub entry_edges: Vec<Edge>,
    pub body: Graph,
}

/// Per-type configuration. The variant always agrees with `Node::node_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeConfig {
    Start(StartConfig),
    End(EndConfig),
    Llm(LlmConfig),
    Code(CodeConfig),
    Condition(ConditionConfig),
    Classifier(ClassifierConfig),
    Iteration(Box<IterationConfig>),
}

impl NodeConfig {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeConfig::Start(_) => NodeType::Start,
            NodeConfig::End(_) => NodeType::End,
            NodeConfig::Llm(_) => NodeType::Llm,
            NodeConfig::Code(_) => NodeType::Code,
            NodeConfig::Condition(_) => NodeType::Condition,
            NodeConfig::Classifier(_) => NodeType::Classifier,
            NodeConfig::Iteration(_) => NodeType::Iteration,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub node_type: NodeType,
    pub title: String,
    pub config: NodeConfig,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub meta: NodeMeta,
}

impl Node {
    /// Builds a node whose type is taken from its config.
    pub fn new(id: impl Into<String>, title: impl Into<String>, config: NodeConfig) -> Self {
        Self {
            id: id.into(),
            node_type: config.node_type(),
            title: title.into(),
            config,
            inputs: Vec::new(),
            outputs: Vec::new(),
            meta: NodeMeta::default(),
        }
    }

    pub fn with_inputs(mut self, inputs: Vec<Input>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<Output>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_meta(mut self, meta: NodeMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn output(&self, name: &str) -> Option<&Output> {
        self.outputs.iter().find(|o| o.name == name)
    }

    pub fn iteration(&self) -> Option<&IterationConfig> {
        match &self.config {
            NodeConfig::Iteration(config) => Some(&**config),
            _ => None,
        }
    }

    pub fn iteration_mut(&mut self) -> Option<&mut IterationConfig> {
        match &mut self.config {
            NodeConfig::Iteration(config) => Some(&mut **config),
            _ => None,
        }
    }

    /// Every reference this node captures, in inputs and in its config.
    pub fn references(&self) -> Vec<&VariableReference> {
        let mut refs: Vec<&VariableReference> =
            self.inputs.iter().filter_map(Input::as_reference).collect();
        match &self.config {
            NodeConfig::Condition(c) => refs.extend(
                c.cases
                    .iter()
                    .flat_map(|case| case.conditions.iter())
                    .filter_map(|cond| cond.left.as_ref()),
            ),
            NodeConfig::Classifier(c) => refs.extend(c.query.as_ref()),
            NodeConfig::Iteration(c) => {
                refs.extend(c.iterator.as_ref());
                refs.extend(c.output.as_ref());
            }
            _ => {}
        }
        refs
    }
}
