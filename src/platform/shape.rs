//! Shape normalization shared by the platform adapters.
//!
//! Platform documents spell the same concept several ways (a number as a
//! string, a list of name/value pairs instead of an object). The adapters run
//! every field through these helpers once, so the decoders downstream see one
//! canonical shape.
use crate::ir::{NodeMeta, Position};
use crate::records::RawReference;
use serde_json::{Map, Value, json};

/// A string, or a number/bool rendered as one.
pub(crate) fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A number, or a string holding one.
pub(crate) fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        _ => false,
    }
}

pub(crate) fn position(value: Option<&Value>) -> Option<Position> {
    let value = value?;
    Some(Position {
        x: number(value.get("x"))?,
        y: number(value.get("y"))?,
    })
}

pub(crate) fn meta(position_value: Option<&Value>, description: Option<String>) -> NodeMeta {
    NodeMeta {
        position: position(position_value),
        description: description.filter(|d| !d.is_empty()),
    }
}

/// The canonical `model` parameter shape.
pub(crate) fn model(
    provider: Option<String>,
    name: Option<String>,
    temperature: Option<f64>,
    max_tokens: Option<f64>,
) -> Value {
    json!({
        "provider": provider,
        "name": name.unwrap_or_default(),
        "temperature": temperature,
        "max_tokens": max_tokens.map(|t| t as u32),
    })
}

pub(crate) fn reference(value: Option<&RawReference>) -> Value {
    value.map(RawReference::to_value).unwrap_or(Value::Null)
}

/// Turns `[{name, value}, ...]` (or `[{name, input: {value: {content}}}]`)
/// into `{name: value}`. Objects pass through.
pub(crate) fn pairs_to_object(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                let name = item.get("name")?.as_str()?;
                let value = item
                    .pointer("/input/value/content")
                    .or_else(|| item.get("value"))
                    .cloned()
                    .unwrap_or(Value::Null);
                Some((name.to_string(), value))
            })
            .collect(),
        _ => Map::new(),
    }
}

/// Parses a `${node.output}` template into a reference when the whole string is
/// one placeholder.
pub(crate) fn template_reference(raw: &str) -> Option<RawReference> {
    let inner = raw.trim().strip_prefix("${")?.strip_suffix('}')?;
    let (node_id, output) = inner.split_once('.')?;
    if node_id.is_empty() || output.is_empty() || inner.contains(['{', '}', '$']) {
        return None;
    }
    Some(RawReference::new(node_id, output))
}
