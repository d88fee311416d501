//! Typed views of the canonical parameter bag, one per node kind.
//!
//! A decoder deserializes its view once; a shape mismatch becomes a single
//! `DecodeError::InvalidParams` instead of a manual lookup at every read site.
use crate::error::DecodeError;
use crate::ir::ModelConfig;
use crate::records::{RawNode, RawReference};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub(crate) fn read<T: DeserializeOwned>(raw: &RawNode) -> Result<T, DecodeError> {
    serde_json::from_value(Value::Object(raw.params.clone())).map_err(|e| {
        DecodeError::InvalidParams {
            node_id: raw.id.clone(),
            message: e.to_string(),
        }
    })
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub(crate) struct ModelParams {
    pub provider: Option<String>,
    pub name: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl From<ModelParams> for ModelConfig {
    fn from(p: ModelParams) -> Self {
        ModelConfig {
            provider: p.provider,
            name: p.name.unwrap_or_default(),
            temperature: p.temperature,
            max_tokens: p.max_tokens,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub(crate) struct EndParams {
    pub answer: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub(crate) struct LlmParams {
    pub model: ModelParams,
    pub system_prompt: Option<String>,
    pub prompt: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub(crate) struct CodeParams {
    pub language: Option<String>,
    pub code: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub(crate) struct ConditionParams {
    pub cases: Vec<CaseParams>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub(crate) struct CaseParams {
    pub id: Option<String>,
    pub logical_operator: Option<String>,
    pub conditions: Vec<OperandParams>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub(crate) struct OperandParams {
    pub left: Option<RawReference>,
    pub operator: Option<String>,
    pub right: Value,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub(crate) struct ClassifierParams {
    pub model: ModelParams,
    pub query: Option<RawReference>,
    pub instruction: Option<String>,
    pub classes: Vec<ClassParams>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub(crate) struct ClassParams {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub(crate) struct IterationParams {
    pub iterator: Option<RawReference>,
    pub output: Option<RawReference>,
    pub output_type: Option<String>,
    pub parallel: bool,
    /// Id of the platform's loop-start pseudo node, when it has one.
    pub start_node_id: Option<String>,
}
