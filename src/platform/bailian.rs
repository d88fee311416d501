//! Bailian application-flow documents.
//!
//! Loop bodies live in a `subflows` section keyed by iteration id. Values are
//! either literals or `${node_id.output}` templates.
use super::{Platform, parse_error, shape};
use crate::error::FormatError;
use crate::ir::NodeType;
use crate::records::{RawBlocks, RawDocument, RawEdge, RawInput, RawNode};
use ahash::AHashMap;
use serde::Deserialize;
use serde_json::{Map, Value, json};

pub const NODE_TAGS: &[(&str, NodeType)] = &[
    ("Start", NodeType::Start),
    ("End", NodeType::End),
    ("LLM", NodeType::Llm),
    ("Script", NodeType::Code),
    ("Judge", NodeType::Condition),
    ("Classifier", NodeType::Classifier),
    ("Iteration", NodeType::Iteration),
];

pub const ITERATION_START_HANDLE: &str = "iteration-start";
pub const OUT_HANDLE: &str = "out";
pub const BRANCH_PREFIX: &str = "branch_";
pub const ELSE_HANDLE: &str = "else";

#[derive(Deserialize)]
struct BailianFlow {
    nodes: Vec<BailianNode>,
    #[serde(default)]
    edges: Vec<BailianEdge>,
    #[serde(default)]
    subflows: AHashMap<String, BailianSubflow>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct BailianSubflow {
    nodes: Vec<BailianNode>,
    edges: Vec<BailianEdge>,
}

#[derive(Deserialize)]
struct BailianNode {
    #[serde(default)]
    id: String,
    #[serde(default, rename = "type")]
    node_type: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    position: Option<Value>,
    #[serde(default)]
    config: Map<String, Value>,
    #[serde(default)]
    inputs: Vec<BailianParam>,
    #[serde(default)]
    outputs: Vec<BailianParam>,
}

#[derive(Deserialize)]
struct BailianParam {
    key: String,
    #[serde(default, rename = "type")]
    var_type: Option<String>,
    #[serde(default)]
    value: Value,
}

#[derive(Deserialize)]
struct BailianEdge {
    #[serde(default)]
    id: String,
    source: String,
    #[serde(default, alias = "sourceHandle")]
    source_handle: Option<String>,
    target: String,
    #[serde(default, alias = "targetHandle")]
    target_handle: Option<String>,
}

pub fn parse_document(document: Value) -> Result<RawDocument, FormatError> {
    if document.get("nodes").is_none() {
        return Err(FormatError::MissingField("nodes".to_string()));
    }
    let flow: BailianFlow =
        serde_json::from_value(document).map_err(|e| parse_error(Platform::Bailian, e))?;

    let nested = flow
        .subflows
        .into_iter()
        .map(|(owner, sub)| {
            let blocks = RawBlocks::new(
                sub.nodes.into_iter().map(node_record).collect(),
                sub.edges.into_iter().map(edge_record).collect(),
            );
            (owner, blocks)
        })
        .collect();

    Ok(RawDocument {
        nodes: flow.nodes.into_iter().map(node_record).collect(),
        edges: flow.edges.into_iter().map(edge_record).collect(),
        nested,
    })
}

fn edge_record(edge: BailianEdge) -> RawEdge {
    RawEdge {
        id: edge.id,
        source: edge.source,
        source_handle: edge.source_handle,
        target: edge.target,
        target_handle: edge.target_handle,
    }
}

fn node_record(node: BailianNode) -> RawNode {
    let config = node.config;
    let mut raw = RawNode::new(node.id, node.node_type.as_str());
    raw.title = node.name;
    raw.meta = shape::meta(node.position.as_ref(), node.description);
    raw.inputs = node
        .inputs
        .into_iter()
        .map(|param| {
            let input = match param.value.as_str().and_then(shape::template_reference) {
                Some(r) => RawInput::reference(param.key, r.node_id, r.output_name),
                None => RawInput::literal(param.key, param.value),
            };
            RawInput {
                var_type: param.var_type,
                ..input
            }
        })
        .collect();
    for output in node.outputs {
        raw = raw.with_output(output.key, output.var_type.as_deref());
    }

    match node.node_type.as_str() {
        "End" => {
            raw = raw.with_param("answer", json!(shape::text(config.get("template"))));
        }
        "LLM" => {
            raw = raw
                .with_param("model", model(&config))
                .with_param("system_prompt", json!(shape::text(config.get("systemPrompt"))))
                .with_param("prompt", json!(shape::text(config.get("prompt")).unwrap_or_default()));
        }
        "Script" => {
            raw = raw
                .with_param("language", json!(shape::text(config.get("scriptType"))))
                .with_param("code", json!(shape::text(config.get("script")).unwrap_or_default()));
        }
        "Judge" => {
            raw = raw.with_param("cases", branches(config.get("branches")));
        }
        "Classifier" => {
            raw = raw
                .with_param("model", model(&config))
                .with_param("query", template(config.get("query")))
                .with_param("instruction", json!(shape::text(config.get("instruction"))))
                .with_param("classes", intentions(config.get("intentions")));
        }
        "Iteration" => {
            raw = raw
                .with_param("iterator", template(config.get("iterator")))
                .with_param("output", template(config.get("result")))
                .with_param("output_type", json!(shape::text(config.get("resultType"))))
                .with_param("parallel", json!(shape::flag(config.get("parallel"))));
        }
        _ => {}
    }
    raw
}

fn template(value: Option<&Value>) -> Value {
    shape::reference(
        value
            .and_then(Value::as_str)
            .and_then(shape::template_reference)
            .as_ref(),
    )
}

fn model(config: &Map<String, Value>) -> Value {
    shape::model(
        Some("dashscope".to_string()),
        shape::text(config.get("modelId")),
        shape::number(config.get("temperature")),
        shape::number(config.get("maxTokens")),
    )
}

/// Intentions are either `[{id, name}]` or a plain list of names.
fn intentions(value: Option<&Value>) -> Value {
    let classes: Vec<Value> = value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(name) => json!({ "id": i.to_string(), "name": name }),
            other => json!({
                "id": shape::text(other.get("id")).unwrap_or_else(|| i.to_string()),
                "name": shape::text(other.get("name")).unwrap_or_default(),
            }),
        })
        .collect();
    Value::Array(classes)
}

fn branches(value: Option<&Value>) -> Value {
    let cases: Vec<Value> = value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .enumerate()
        .map(|(i, branch)| {
            let conditions: Vec<Value> = branch
                .get("conditions")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .map(|c| {
                    json!({
                        "left": template(c.get("left")),
                        "operator": shape::text(c.get("operator")).unwrap_or_default(),
                        "right": c.get("right").cloned().unwrap_or(Value::Null),
                    })
                })
                .collect();
            json!({
                "id": shape::text(branch.get("id")).unwrap_or_else(|| i.to_string()),
                "logical_operator": shape::text(branch.get("logic")).unwrap_or_else(|| "and".to_string()),
                "conditions": conditions,
            })
        })
        .collect();
    Value::Array(cases)
}
