//! Branch/Handle Translator.
//!
//! Pure functions between a platform's source-handle spelling and the
//! platform-neutral [`CanonicalHandle`]. Enumerated branches keep each
//! platform's own index base; nothing is renumbered across platforms.
//!
//! For every handle a rule accepts, translating to canonical form and back
//! yields the original handle. Handles no rule accepts pass through as
//! [`CanonicalHandle::Raw`].
use crate::ir::{CanonicalHandle, Edge, Node, NodeConfig};
use crate::platform::{Platform, bailian, coze, dify};
use crate::records::RawEdge;
use tracing::debug;

/// Translates `handle`, as written on an edge leaving `source`, to canonical form.
pub fn to_canonical_handle(platform: Platform, handle: Option<&str>, source: &Node) -> CanonicalHandle {
    let canonical = match handle.filter(|h| !h.is_empty()) {
        None => CanonicalHandle::Default,
        Some(handle) => match platform {
            Platform::Dify => dify_to_canonical(handle, source),
            Platform::Coze => coze_to_canonical(handle, source),
            Platform::Bailian => bailian_to_canonical(handle, source),
        },
    };
    if let CanonicalHandle::Raw(raw) = &canonical {
        debug!(%platform, node = %source.id, handle = %raw, "passing through unrecognized handle");
    }
    canonical
}

/// The handle `platform` writes for `handle` on an edge leaving `source`.
/// `None` means the platform leaves unconditional edges without a handle.
pub fn from_canonical_handle(platform: Platform, handle: &CanonicalHandle, source: &Node) -> Option<String> {
    if let CanonicalHandle::Raw(raw) = handle {
        return Some(raw.clone());
    }
    match platform {
        Platform::Dify => Some(dify_from_canonical(handle, source)),
        Platform::Coze => coze_from_canonical(handle, source),
        Platform::Bailian => Some(bailian_from_canonical(handle, source)),
    }
}

/// Builds the unified edge for `raw`, whose source node has already been decoded.
pub fn canonical_edge(platform: Platform, raw: &RawEdge, source: &Node) -> Edge {
    let mut edge = Edge::new(raw.effective_id(), &raw.source, &raw.target)
        .with_source_handle(to_canonical_handle(platform, raw.source_handle.as_deref(), source));
    if let Some(target_handle) = raw.target_handle.as_deref().filter(|h| !h.is_empty()) {
        edge.target_handle = target_handle.to_string();
    }
    edge
}

/// `<prefix><k>` → `k`.
fn indexed(handle: &str, prefix: &str) -> Option<usize> {
    let digits = handle.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Leading zeros would not survive the way back.
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    digits.parse().ok()
}

/// The number of classes `source` declares, when `handle` picks a class
/// past the end of that list.
pub fn class_out_of_range(handle: &CanonicalHandle, source: &Node) -> Option<usize> {
    match (handle, &source.config) {
        (CanonicalHandle::Case(index), NodeConfig::Classifier(c)) if *index >= c.classes.len() => {
            Some(c.classes.len())
        }
        _ => None,
    }
}

/// A classifier branch index, checked against the decoded class list. An index
/// past the end is kept numerically.
fn class_case(index: usize, source: &Node) -> CanonicalHandle {
    let handle = CanonicalHandle::Case(index);
    if let Some(classes) = class_out_of_range(&handle, source) {
        debug!(node = %source.id, index, classes, "branch index past the declared classes");
    }
    handle
}

fn dify_to_canonical(handle: &str, source: &Node) -> CanonicalHandle {
    if handle == dify::SOURCE_HANDLE {
        return CanonicalHandle::Default;
    }
    match &source.config {
        NodeConfig::Condition(c) => {
            if let Some(k) = c.cases.iter().position(|case| case.id == handle) {
                CanonicalHandle::Case(k)
            } else if handle == dify::FALSE_HANDLE {
                CanonicalHandle::Fallthrough
            } else if handle == dify::TRUE_HANDLE && c.cases.is_empty() {
                CanonicalHandle::Case(0)
            } else {
                CanonicalHandle::Raw(handle.to_string())
            }
        }
        NodeConfig::Classifier(c) => c
            .classes
            .iter()
            .position(|class| class.id == handle)
            .map(CanonicalHandle::Case)
            .unwrap_or_else(|| CanonicalHandle::Raw(handle.to_string())),
        _ => CanonicalHandle::Raw(handle.to_string()),
    }
}

fn dify_from_canonical(handle: &CanonicalHandle, source: &Node) -> String {
    match handle {
        CanonicalHandle::Default => dify::SOURCE_HANDLE.to_string(),
        CanonicalHandle::Fallthrough => dify::FALSE_HANDLE.to_string(),
        CanonicalHandle::Case(k) => match &source.config {
            NodeConfig::Condition(c) => match c.cases.get(*k) {
                Some(case) => case.id.clone(),
                None if *k == 0 => dify::TRUE_HANDLE.to_string(),
                None => k.to_string(),
            },
            NodeConfig::Classifier(c) => c
                .classes
                .get(*k)
                .map(|class| class.id.clone())
                .unwrap_or_else(|| k.to_string()),
            _ => handle.to_string(),
        },
        CanonicalHandle::Raw(raw) => raw.clone(),
    }
}

fn coze_to_canonical(handle: &str, source: &Node) -> CanonicalHandle {
    match &source.config {
        NodeConfig::Condition(_) => {
            if handle == coze::TRUE_PORT {
                CanonicalHandle::Case(0)
            } else if handle == coze::FALSE_PORT {
                CanonicalHandle::Fallthrough
            } else {
                // `true_0` would collide with plain `true`.
                match indexed(handle, coze::ENUMERATED_TRUE_PREFIX) {
                    Some(k) if k >= 1 => CanonicalHandle::Case(k),
                    _ => CanonicalHandle::Raw(handle.to_string()),
                }
            }
        }
        NodeConfig::Classifier(_) => {
            if handle == coze::DEFAULT_PORT {
                CanonicalHandle::Fallthrough
            } else {
                indexed(handle, coze::BRANCH_PREFIX)
                    .map(|k| class_case(k, source))
                    .unwrap_or_else(|| CanonicalHandle::Raw(handle.to_string()))
            }
        }
        _ => CanonicalHandle::Raw(handle.to_string()),
    }
}

fn coze_from_canonical(handle: &CanonicalHandle, source: &Node) -> Option<String> {
    let port = match (handle, &source.config) {
        (CanonicalHandle::Default, _) => return None,
        (CanonicalHandle::Case(0), NodeConfig::Condition(_)) => coze::TRUE_PORT.to_string(),
        (CanonicalHandle::Case(k), NodeConfig::Condition(_)) => {
            format!("{}{}", coze::ENUMERATED_TRUE_PREFIX, k)
        }
        (CanonicalHandle::Case(k), _) => format!("{}{}", coze::BRANCH_PREFIX, k),
        (CanonicalHandle::Fallthrough, NodeConfig::Condition(_)) => coze::FALSE_PORT.to_string(),
        (CanonicalHandle::Fallthrough, _) => coze::DEFAULT_PORT.to_string(),
        (CanonicalHandle::Raw(raw), _) => raw.clone(),
    };
    Some(port)
}

fn bailian_to_canonical(handle: &str, source: &Node) -> CanonicalHandle {
    if handle == bailian::OUT_HANDLE {
        return CanonicalHandle::Default;
    }
    if !source.node_type.is_branching() {
        return CanonicalHandle::Raw(handle.to_string());
    }
    if handle == bailian::ELSE_HANDLE {
        return CanonicalHandle::Fallthrough;
    }
    indexed(handle, bailian::BRANCH_PREFIX)
        .map(|k| class_case(k, source))
        .unwrap_or_else(|| CanonicalHandle::Raw(handle.to_string()))
}

fn bailian_from_canonical(handle: &CanonicalHandle, _source: &Node) -> String {
    match handle {
        CanonicalHandle::Default => bailian::OUT_HANDLE.to_string(),
        CanonicalHandle::Case(k) => format!("{}{}", bailian::BRANCH_PREFIX, k),
        CanonicalHandle::Fallthrough => bailian::ELSE_HANDLE.to_string(),
        CanonicalHandle::Raw(raw) => raw.clone(),
    }
}
