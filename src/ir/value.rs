use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A literal carried by an input or a condition operand.
///
/// The IR keeps its own literal type rather than `serde_json::Value` so that a
/// graph can be written with non-self-describing encoders (see `GraphArtifact`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Literal {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Literal>),
    Object(Vec<(String, Literal)>),
}

impl Literal {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }
}

impl From<serde_json::Value> for Literal {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Literal::Null,
            serde_json::Value::Bool(b) => Literal::Bool(b),
            serde_json::Value::Number(n) => Literal::Number(n.as_f64().unwrap_or_default()),
            serde_json::Value::String(s) => Literal::String(s),
            serde_json::Value::Array(items) => {
                Literal::Array(items.into_iter().map(Literal::from).collect())
            }
            serde_json::Value::Object(map) => Literal::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Literal::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Literal::String(s) => write!(f, "{:?}", s),
            Literal::Array(items) => write!(f, "[{}]", items.iter().join(", ")),
            Literal::Object(fields) => write!(
                f,
                "{{{}}}",
                fields
                    .iter()
                    .map(|(k, v)| format!("{:?}: {}", k, v))
                    .join(", ")
            ),
        }
    }
}

/// The declared type of an input, output or reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VarType {
    #[default]
    String,
    Number,
    Integer,
    Boolean,
    Object,
    File,
    ArrayString,
    ArrayNumber,
    ArrayBoolean,
    ArrayObject,
    ArrayFile,
    Array,
    Any,
}

impl VarType {
    /// Parses the many spellings platforms use for variable types.
    ///
    /// Unknown spellings map to `Any`; type names are metadata for generation and
    /// never block a conversion.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "string" | "str" | "text" | "text_input" | "paragraph" | "select" => VarType::String,
            "number" | "float" | "double" => VarType::Number,
            "integer" | "int" => VarType::Integer,
            "boolean" | "bool" => VarType::Boolean,
            "object" | "json" | "dict" => VarType::Object,
            "file" => VarType::File,
            "array[string]" | "array<string>" | "list<string>" | "array_string" => {
                VarType::ArrayString
            }
            "array[number]" | "array<number>" | "array[integer]" | "array<integer>"
            | "array_number" => VarType::ArrayNumber,
            "array[boolean]" | "array<boolean>" | "array_boolean" => VarType::ArrayBoolean,
            "array[object]" | "array<object>" | "list<object>" | "array_object" => {
                VarType::ArrayObject
            }
            "array[file]" | "array<file>" | "file_list" | "array_file" => VarType::ArrayFile,
            "array" | "list" => VarType::Array,
            _ => VarType::Any,
        }
    }

    pub fn is_array(self) -> bool {
        matches!(
            self,
            VarType::ArrayString
                | VarType::ArrayNumber
                | VarType::ArrayBoolean
                | VarType::ArrayObject
                | VarType::ArrayFile
                | VarType::Array
        )
    }

    /// The element type of an array type; non-array types return themselves.
    pub fn element(self) -> Self {
        match self {
            VarType::ArrayString => VarType::String,
            VarType::ArrayNumber => VarType::Number,
            VarType::ArrayBoolean => VarType::Boolean,
            VarType::ArrayObject => VarType::Object,
            VarType::ArrayFile => VarType::File,
            VarType::Array => VarType::Any,
            other => other,
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VarType::String => "string",
            VarType::Number => "number",
            VarType::Integer => "integer",
            VarType::Boolean => "boolean",
            VarType::Object => "object",
            VarType::File => "file",
            VarType::ArrayString => "array[string]",
            VarType::ArrayNumber => "array[number]",
            VarType::ArrayBoolean => "array[boolean]",
            VarType::ArrayObject => "array[object]",
            VarType::ArrayFile => "array[file]",
            VarType::Array => "array",
            VarType::Any => "any",
        };
        f.write_str(name)
    }
}
