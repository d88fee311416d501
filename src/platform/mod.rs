//! The orchestration platforms a workflow can be read from or generated for.
//!
//! Each platform contributes three things: a type-tag table mapping its node
//! tags onto the closed `NodeType` set, the spelling of its structural
//! pseudo-constructs (loop-start nodes and handles), and an adapter turning an
//! already-deserialized document into the core's record tree.
use crate::error::FormatError;
use crate::ir::NodeType;
use crate::records::RawDocument;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod bailian;
pub mod coze;
pub mod dify;
mod shape;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Dify,
    Coze,
    Bailian,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Dify, Platform::Coze, Platform::Bailian];

    pub fn name(self) -> &'static str {
        match self {
            Platform::Dify => "dify",
            Platform::Coze => "coze",
            Platform::Bailian => "bailian",
        }
    }

    /// The platform's node type tags. The first tag listed for a type is the one
    /// generators emit.
    pub fn node_tags(self) -> &'static [(&'static str, NodeType)] {
        match self {
            Platform::Dify => dify::NODE_TAGS,
            Platform::Coze => coze::NODE_TAGS,
            Platform::Bailian => bailian::NODE_TAGS,
        }
    }

    pub fn node_type(self, tag: &str) -> Option<NodeType> {
        self.node_tags()
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, ty)| *ty)
    }

    /// The tag a generator writes for `node_type` on this platform.
    pub fn node_tag(self, node_type: NodeType) -> &'static str {
        self.node_tags()
            .iter()
            .find(|(_, ty)| *ty == node_type)
            .map(|(tag, _)| *tag)
            .unwrap_or_else(|| node_type.name())
    }

    /// Tags of structural pseudo nodes that carry no behavior of their own and
    /// are removed rather than decoded.
    pub fn is_pseudo_tag(self, tag: &str) -> bool {
        match self {
            Platform::Dify => tag == dify::ITERATION_START_TAG,
            Platform::Coze | Platform::Bailian => false,
        }
    }

    /// The pseudo-handle on an iteration node meaning "from the per-item input",
    /// for platforms that draw loop-start edges from the iteration itself.
    pub fn iteration_start_handle(self) -> Option<&'static str> {
        match self {
            Platform::Dify => None,
            Platform::Coze => Some(coze::LOOP_START_PORT),
            Platform::Bailian => Some(bailian::ITERATION_START_HANDLE),
        }
    }

    /// Reshapes an already-deserialized platform document into a `RawDocument`.
    pub fn parse_document(self, document: serde_json::Value) -> Result<RawDocument, FormatError> {
        let raw = match self {
            Platform::Dify => dify::parse_document(document)?,
            Platform::Coze => coze::parse_document(document)?,
            Platform::Bailian => bailian::parse_document(document)?,
        };
        raw.check()?;
        Ok(raw)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown platform '{}'", s))
    }
}

fn parse_error(platform: Platform, error: serde_json::Error) -> FormatError {
    FormatError::Parse {
        platform: platform.name().to_string(),
        message: error.to_string(),
    }
}
