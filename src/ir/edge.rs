use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_HANDLE: &str = "default";
pub const FALLTHROUGH_HANDLE: &str = "__default__";
pub const CASE_PREFIX: &str = "case_";

/// The platform-neutral identifier of the port an edge leaves from.
///
/// Serialized as a tagged variant, so a `Raw` handle spelled like a canonical
/// one (`default`, `case_1`) keeps its variant. `Display` gives the
/// string form: `default`, `case_<k>`, `__default__` or the raw handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalHandle {
    /// Unconditional flow.
    Default,
    /// The `k`-th declared branch of a condition or classifier.
    Case(usize),
    /// The false/else/fallthrough branch.
    Fallthrough,
    /// A platform handle no rule understood, passed through unchanged.
    Raw(String),
}

impl CanonicalHandle {
    pub fn is_branch(&self) -> bool {
        matches!(self, CanonicalHandle::Case(_) | CanonicalHandle::Fallthrough)
    }
}

impl fmt::Display for CanonicalHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanonicalHandle::Default => f.write_str(DEFAULT_HANDLE),
            CanonicalHandle::Case(k) => write!(f, "{}{}", CASE_PREFIX, k),
            CanonicalHandle::Fallthrough => f.write_str(FALLTHROUGH_HANDLE),
            CanonicalHandle::Raw(raw) => f.write_str(raw),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EdgeKind {
    #[default]
    Control,
    /// A loop-entry edge kept on an iteration's config; see `IterationConfig::entry_edges`.
    IterationStart,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub source_handle: CanonicalHandle,
    pub target: String,
    pub target_handle: String,
    pub kind: EdgeKind,
}

impl Edge {
    /// An unconditional control edge between two nodes of the same graph level.
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            source_handle: CanonicalHandle::Default,
            target: target.into(),
            target_handle: "target".to_string(),
            kind: EdgeKind::Control,
        }
    }

    pub fn with_source_handle(mut self, handle: CanonicalHandle) -> Self {
        self.source_handle = handle;
        self
    }

    pub fn with_kind(mut self, kind: EdgeKind) -> Self {
        self.kind = kind;
        self
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{}",
            self.source, self.source_handle, self.target, self.target_handle
        )
    }
}
