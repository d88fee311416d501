//! Coze workflow documents.
//!
//! Node tags are numeric strings. Loop bodies are stored inline on the loop
//! node as `blocks` and `edges`; the loop-start edge leaves the loop node on a
//! dedicated pseudo-port.
use super::{Platform, parse_error, shape};
use crate::error::FormatError;
use crate::ir::NodeType;
use crate::records::{RawBlocks, RawDocument, RawEdge, RawInput, RawNode, RawReference, RawValue};
use serde::Deserialize;
use serde_json::{Map, Value, json};

pub const NODE_TAGS: &[(&str, NodeType)] = &[
    ("1", NodeType::Start),
    ("2", NodeType::End),
    ("3", NodeType::Llm),
    ("5", NodeType::Code),
    ("8", NodeType::Condition),
    ("22", NodeType::Classifier),
    ("21", NodeType::Iteration),
];

pub const LOOP_START_PORT: &str = "loop-function-inline-output";
pub const TRUE_PORT: &str = "true";
pub const FALSE_PORT: &str = "false";
pub const ENUMERATED_TRUE_PREFIX: &str = "true_";
pub const BRANCH_PREFIX: &str = "branch_";
pub const DEFAULT_PORT: &str = "default";

#[derive(Deserialize)]
struct CozeCanvas {
    nodes: Vec<CozeNode>,
    #[serde(default)]
    edges: Vec<CozeEdge>,
}

#[derive(Deserialize)]
struct CozeNode {
    #[serde(default)]
    id: String,
    #[serde(default, rename = "type")]
    node_type: Value,
    #[serde(default)]
    meta: Option<Value>,
    #[serde(default)]
    data: Map<String, Value>,
    #[serde(default)]
    blocks: Option<Vec<CozeNode>>,
    #[serde(default)]
    edges: Option<Vec<CozeEdge>>,
}

#[derive(Deserialize)]
struct CozeEdge {
    #[serde(alias = "sourceNodeID")]
    source_node_id: String,
    #[serde(alias = "targetNodeID")]
    target_node_id: String,
    #[serde(default, alias = "sourcePortID")]
    source_port_id: Option<String>,
    #[serde(default, alias = "targetPortID")]
    target_port_id: Option<String>,
}

pub fn parse_document(document: Value) -> Result<RawDocument, FormatError> {
    if document.get("nodes").is_none() {
        return Err(FormatError::MissingField("nodes".to_string()));
    }
    let canvas: CozeCanvas =
        serde_json::from_value(document).map_err(|e| parse_error(Platform::Coze, e))?;
    Ok(RawDocument::new(
        canvas.nodes.into_iter().map(node_record).collect(),
        canvas.edges.into_iter().map(edge_record).collect(),
    ))
}

fn edge_record(edge: CozeEdge) -> RawEdge {
    // Empty ports mean unconditional flow.
    RawEdge {
        id: String::new(),
        source: edge.source_node_id,
        source_handle: edge.source_port_id.filter(|p| !p.is_empty()),
        target: edge.target_node_id,
        target_handle: edge.target_port_id.filter(|p| !p.is_empty()),
    }
}

fn node_record(node: CozeNode) -> RawNode {
    let data = node.data;
    let tag = shape::text(Some(&node.node_type)).unwrap_or_default();
    let node_meta = data.get("nodeMeta");
    let mut raw = RawNode::new(node.id, tag.as_str());
    raw.title = shape::text(node_meta.and_then(|m| m.get("title")));
    raw.meta = shape::meta(
        node.meta.as_ref().and_then(|m| m.get("position")),
        shape::text(node_meta.and_then(|m| m.get("description"))),
    );

    let inputs = data.get("inputs").cloned().unwrap_or(Value::Null);
    raw.inputs = input_parameters(inputs.get("inputParameters"));
    for output in data.get("outputs").and_then(Value::as_array).into_iter().flatten() {
        if let Some(name) = shape::text(output.get("name")) {
            raw = raw.with_output(name, output.get("type").and_then(Value::as_str));
        }
    }

    match tag.as_str() {
        "2" => {
            let content = inputs.get("content");
            let answer = content
                .and_then(|c| c.pointer("/value/content"))
                .or(content);
            raw = raw.with_param("answer", json!(shape::text(answer)));
        }
        "3" => {
            let params = shape::pairs_to_object(inputs.get("llmParam"));
            raw = raw
                .with_param("model", model(&params))
                .with_param("system_prompt", json!(shape::text(params.get("systemPrompt"))))
                .with_param("prompt", json!(shape::text(params.get("prompt")).unwrap_or_default()));
        }
        "5" => {
            let language = match shape::number(inputs.get("language")) {
                Some(n) if n == 5.0 => "javascript".to_string(),
                Some(_) => "python3".to_string(),
                None => shape::text(inputs.get("language")).unwrap_or_else(|| "python3".to_string()),
            };
            raw = raw
                .with_param("language", json!(language))
                .with_param("code", json!(shape::text(inputs.get("code")).unwrap_or_default()));
        }
        "8" => {
            raw = raw.with_param("cases", branches(inputs.get("branches")));
        }
        "22" => {
            let params = shape::pairs_to_object(inputs.get("llmParam"));
            let classes: Vec<Value> = inputs
                .get("intents")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .enumerate()
                .map(|(i, intent)| json!({ "id": i.to_string(), "name": shape::text(intent.get("name")).unwrap_or_default() }))
                .collect();
            let query = first_reference(&raw.inputs);
            raw = raw
                .with_param("model", model(&params))
                .with_param("query", shape::reference(query.as_ref()))
                .with_param("instruction", json!(shape::text(params.get("systemPrompt"))))
                .with_param("classes", Value::Array(classes));
        }
        "21" => {
            let iterator = first_reference(&raw.inputs);
            let output_spec = data
                .get("outputs")
                .and_then(Value::as_array)
                .and_then(|o| o.first())
                .cloned()
                .unwrap_or(Value::Null);
            raw = raw
                .with_param("iterator", shape::reference(iterator.as_ref()))
                .with_param("output", shape::reference(value_reference(output_spec.get("input")).as_ref()))
                .with_param("output_type", json!(shape::text(output_spec.get("type"))))
                .with_param("parallel", json!(shape::flag(inputs.get("parallel"))));
            raw.blocks = Some(RawBlocks::new(
                node.blocks.unwrap_or_default().into_iter().map(node_record).collect(),
                node.edges.unwrap_or_default().into_iter().map(edge_record).collect(),
            ));
        }
        _ => {}
    }
    raw
}

fn first_reference(inputs: &[RawInput]) -> Option<RawReference> {
    inputs.iter().find_map(|i| match &i.value {
        RawValue::Reference(r) => Some(r.clone()),
        RawValue::Literal(_) => None,
    })
}

/// `{type, value: {type: "ref", content: {blockID, name}}}` or a literal.
fn value_reference(input: Option<&Value>) -> Option<RawReference> {
    let value = input?.get("value")?;
    if value.get("type").and_then(Value::as_str) != Some("ref") {
        return None;
    }
    let content = value.get("content")?;
    Some(RawReference::new(
        shape::text(content.get("blockID"))?,
        shape::text(content.get("name"))?,
    ))
}

fn input_parameters(value: Option<&Value>) -> Vec<RawInput> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|param| {
            let name = shape::text(param.get("name"))?;
            let input = param.get("input");
            let mut raw = match value_reference(input) {
                Some(r) => RawInput::reference(name, r.node_id, r.output_name),
                None => RawInput::literal(
                    name,
                    input
                        .and_then(|i| i.pointer("/value/content"))
                        .cloned()
                        .unwrap_or(Value::Null),
                ),
            };
            raw.var_type = shape::text(input.and_then(|i| i.get("type")));
            Some(raw)
        })
        .collect()
}

fn model(params: &Map<String, Value>) -> Value {
    shape::model(
        shape::text(params.get("modelType")),
        shape::text(params.get("modelName")),
        shape::number(params.get("temperature")),
        shape::number(params.get("maxTokens")),
    )
}

const OPERATORS: &[(i64, &str)] = &[
    (1, "=="),
    (2, "!="),
    (3, "length >"),
    (4, "length >="),
    (5, "length <"),
    (6, "length <="),
    (7, "contains"),
    (8, "not contains"),
    (9, "is empty"),
    (10, "is not empty"),
    (11, "is true"),
    (12, "is false"),
    (13, ">"),
    (14, ">="),
    (15, "<"),
    (16, "<="),
];

/// Coze condition branches are positional; `logic` is 1 for OR, 2 for AND.
fn branches(value: Option<&Value>) -> Value {
    let cases: Vec<Value> = value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .enumerate()
        .map(|(index, branch)| {
            let condition = branch.get("condition").cloned().unwrap_or(Value::Null);
            let logic = match shape::number(condition.get("logic")) {
                Some(n) if n == 1.0 => "or",
                _ => "and",
            };
            let conditions: Vec<Value> = condition
                .get("conditions")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .map(|c| {
                    let operator = shape::number(c.get("operator"))
                        .and_then(|n| OPERATORS.iter().find(|(k, _)| *k as f64 == n))
                        .map(|(_, name)| name.to_string())
                        .or_else(|| shape::text(c.get("operator")))
                        .unwrap_or_default();
                    let right = c
                        .pointer("/right/input/value/content")
                        .cloned()
                        .unwrap_or(Value::Null);
                    json!({
                        "left": shape::reference(value_reference(c.pointer("/left/input")).as_ref()),
                        "operator": operator,
                        "right": right,
                    })
                })
                .collect();
            json!({ "id": index.to_string(), "logical_operator": logic, "conditions": conditions })
        })
        .collect();
    Value::Array(cases)
}
