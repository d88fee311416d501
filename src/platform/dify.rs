//! Dify workflow documents.
//!
//! Node behavior lives under `data.type`. Iteration children sit flat in the
//! node list with a `parentId`; they are moved into the document's auxiliary
//! nested section keyed by the iteration id. All edges, including loop-body
//! edges, stay in the top-level edge list.
use super::{Platform, parse_error, shape};
use crate::error::FormatError;
use crate::ir::NodeType;
use crate::records::{RawBlocks, RawDocument, RawEdge, RawInput, RawNode, RawReference};
use ahash::AHashMap;
use serde::Deserialize;
use serde_json::{Map, Value, json};

pub const NODE_TAGS: &[(&str, NodeType)] = &[
    ("start", NodeType::Start),
    ("end", NodeType::End),
    ("answer", NodeType::End),
    ("llm", NodeType::Llm),
    ("code", NodeType::Code),
    ("if-else", NodeType::Condition),
    ("question-classifier", NodeType::Classifier),
    ("iteration", NodeType::Iteration),
];

pub const ITERATION_START_TAG: &str = "iteration-start";
pub const SOURCE_HANDLE: &str = "source";
pub const TRUE_HANDLE: &str = "true";
pub const FALSE_HANDLE: &str = "false";

#[derive(Deserialize)]
struct DifyGraph {
    nodes: Vec<DifyNode>,
    #[serde(default)]
    edges: Vec<DifyEdge>,
}

#[derive(Deserialize)]
struct DifyNode {
    #[serde(default)]
    id: String,
    #[serde(default, alias = "parentId")]
    parent_id: Option<String>,
    #[serde(default)]
    position: Option<Value>,
    #[serde(default)]
    data: Map<String, Value>,
}

#[derive(Deserialize)]
struct DifyEdge {
    #[serde(default)]
    id: String,
    source: String,
    #[serde(default, alias = "sourceHandle")]
    source_handle: Option<String>,
    target: String,
    #[serde(default, alias = "targetHandle")]
    target_handle: Option<String>,
}

/// Accepts the bare graph, `{graph: ...}`, or a full `{workflow: {graph: ...}}` export.
pub fn parse_document(document: Value) -> Result<RawDocument, FormatError> {
    let graph = document
        .pointer("/workflow/graph")
        .or_else(|| document.get("graph"))
        .cloned()
        .unwrap_or(document);
    if graph.get("nodes").is_none() {
        return Err(FormatError::MissingField("nodes".to_string()));
    }
    let graph: DifyGraph =
        serde_json::from_value(graph).map_err(|e| parse_error(Platform::Dify, e))?;

    let mut top_level = Vec::new();
    let mut nested: AHashMap<String, RawBlocks> = AHashMap::new();
    for node in graph.nodes {
        let parent = node.parent_id.clone().or_else(|| {
            shape::text(node.data.get("iteration_id")).filter(|p| !p.is_empty())
        });
        let raw = node_record(node);
        match parent {
            Some(parent) => nested.entry(parent).or_default().nodes.push(raw),
            None => top_level.push(raw),
        }
    }

    let edges = graph
        .edges
        .into_iter()
        .map(|e| RawEdge {
            id: e.id,
            source: e.source,
            source_handle: e.source_handle,
            target: e.target,
            target_handle: e.target_handle,
        })
        .collect();

    Ok(RawDocument {
        nodes: top_level,
        edges,
        nested,
    })
}

fn node_record(node: DifyNode) -> RawNode {
    let data = node.data;
    let tag = shape::text(data.get("type")).unwrap_or_default();
    let mut raw = RawNode::new(node.id, tag.as_str());
    raw.title = shape::text(data.get("title"));
    raw.meta = shape::meta(node.position.as_ref(), shape::text(data.get("desc")));

    match tag.as_str() {
        "start" => {
            for var in array(&data, "variables") {
                if let Some(name) = shape::text(var.get("variable")) {
                    raw = raw.with_output(name, var.get("type").and_then(Value::as_str));
                }
            }
        }
        "end" => {
            raw.inputs = selector_inputs(array(&data, "outputs"));
        }
        "answer" => {
            raw = raw.with_param("answer", json!(shape::text(data.get("answer"))));
        }
        "llm" => {
            let (system, user) = prompts(data.get("prompt_template"));
            raw = raw
                .with_param("model", model(data.get("model")))
                .with_param("system_prompt", json!(system))
                .with_param("prompt", json!(user))
                .with_output("text", Some("string"));
        }
        "code" => {
            raw.inputs = selector_inputs(array(&data, "variables"));
            raw = raw
                .with_param("language", json!(shape::text(data.get("code_language"))))
                .with_param("code", json!(shape::text(data.get("code"))));
            if let Some(Value::Object(outputs)) = data.get("outputs") {
                for (name, spec) in outputs {
                    raw = raw.with_output(name.clone(), spec.get("type").and_then(Value::as_str));
                }
            }
        }
        "if-else" => {
            raw = raw.with_param("cases", cases(&data));
        }
        "question-classifier" => {
            let classes: Vec<Value> = array(&data, "classes")
                .iter()
                .map(|c| json!({ "id": shape::text(c.get("id")), "name": shape::text(c.get("name")) }))
                .collect();
            raw = raw
                .with_param("model", model(data.get("model")))
                .with_param("query", shape::reference(selector(data.get("query_variable_selector")).as_ref()))
                .with_param("instruction", json!(shape::text(data.get("instruction"))))
                .with_param("classes", Value::Array(classes))
                .with_output("class_name", Some("string"));
        }
        "iteration" => {
            let output_type = shape::text(data.get("output_type"));
            raw = raw
                .with_param("iterator", shape::reference(selector(data.get("iterator_selector")).as_ref()))
                .with_param("output", shape::reference(selector(data.get("output_selector")).as_ref()))
                .with_param("output_type", json!(output_type))
                .with_param("parallel", json!(shape::flag(data.get("is_parallel"))))
                .with_param("start_node_id", json!(shape::text(data.get("start_node_id"))))
                .with_output("output", output_type.as_deref());
        }
        _ => {}
    }
    raw
}

fn array<'a>(data: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    data.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// `[node_id, output_name]`, possibly with a longer path whose tail is ignored.
fn selector(value: Option<&Value>) -> Option<RawReference> {
    let parts = value?.as_array()?;
    let node_id = parts.first()?.as_str()?;
    let output = parts.get(1)?.as_str()?;
    Some(RawReference::new(node_id, output))
}

fn selector_inputs(items: &[Value]) -> Vec<RawInput> {
    items
        .iter()
        .filter_map(|item| {
            let name = shape::text(item.get("variable"))?;
            let mut input = match selector(item.get("value_selector")) {
                Some(r) => RawInput::reference(name, r.node_id, r.output_name),
                None => RawInput::literal(name, item.get("value").cloned().unwrap_or(Value::Null)),
            };
            input.var_type = shape::text(item.get("value_type"));
            Some(input)
        })
        .collect()
}

fn model(value: Option<&Value>) -> Value {
    let value = value.cloned().unwrap_or(Value::Null);
    let params = value.get("completion_params");
    shape::model(
        shape::text(value.get("provider")),
        shape::text(value.get("name")),
        shape::number(params.and_then(|p| p.get("temperature"))),
        shape::number(params.and_then(|p| p.get("max_tokens"))),
    )
}

/// Chat models carry a list of role messages, completion models a single `{text}`.
fn prompts(value: Option<&Value>) -> (Option<String>, String) {
    match value {
        Some(Value::Array(messages)) => {
            let mut system = None;
            let mut user = Vec::new();
            for message in messages {
                let text = shape::text(message.get("text")).unwrap_or_default();
                match message.get("role").and_then(Value::as_str) {
                    Some("system") => system = Some(text),
                    _ => user.push(text),
                }
            }
            (system, user.join("\n"))
        }
        Some(other) => (None, shape::text(other.get("text")).unwrap_or_default()),
        None => (None, String::new()),
    }
}

/// Multi-case if-else nodes list `cases`; older exports put a single condition
/// group on the node itself, which becomes one case with id `true`.
fn cases(data: &Map<String, Value>) -> Value {
    let groups: Vec<(String, Option<&Value>, &[Value])> = match data.get("cases") {
        Some(Value::Array(cases)) => cases
            .iter()
            .map(|c| {
                (
                    shape::text(c.get("case_id")).unwrap_or_default(),
                    c.get("logical_operator"),
                    c.get("conditions")
                        .and_then(Value::as_array)
                        .map(Vec::as_slice)
                        .unwrap_or(&[]),
                )
            })
            .collect(),
        _ => vec![(
            TRUE_HANDLE.to_string(),
            data.get("logical_operator"),
            array(data, "conditions"),
        )],
    };

    Value::Array(
        groups
            .into_iter()
            .map(|(id, logic, conditions)| {
                let conditions: Vec<Value> = conditions
                    .iter()
                    .map(|c| {
                        json!({
                            "left": shape::reference(selector(c.get("variable_selector")).as_ref()),
                            "operator": shape::text(c.get("comparison_operator")).unwrap_or_default(),
                            "right": c.get("value").cloned().unwrap_or(Value::Null),
                        })
                    })
                    .collect();
                json!({
                    "id": id,
                    "logical_operator": shape::text(logic).unwrap_or_else(|| "and".to_string()),
                    "conditions": conditions,
                })
            })
            .collect(),
    )
}
