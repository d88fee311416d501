use std::fmt;
use thiserror::Error;

/// The non-fatal categories a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// An unrecognized node, nested block or branch; degraded, never fatal.
    UnsupportedConstruct,
    /// An input or config value that referenced an absent node; dropped.
    DanglingReference,
    /// An edge that has no representation in the unified graph; dropped.
    DroppedEdge,
}

/// One thing a conversion run could not carry over faithfully.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Diagnostic {
    #[error("Node '{node_id}' ({type_tag}) replaced by a placeholder: {reason}")]
    UnsupportedNode {
        node_id: String,
        type_tag: String,
        reason: String,
    },

    #[error("Nested block '{node_id}' ({type_tag}) in iteration '{iteration_id}' dropped: {reason}")]
    DroppedNestedBlock {
        iteration_id: String,
        node_id: String,
        type_tag: String,
        reason: String,
    },

    #[error("Edge '{edge_id}' ({from} -> {to}) crosses an iteration boundary and was dropped")]
    MixedEdge {
        edge_id: String,
        from: String,
        to: String,
    },

    #[error("Edge '{edge_id}' ({from} -> {to}) has an endpoint that is not in the graph and was dropped")]
    DanglingEdge {
        edge_id: String,
        from: String,
        to: String,
    },

    #[error("'{slot}' of node '{node_id}' referenced missing node '{missing}' and was dropped")]
    DanglingReference {
        node_id: String,
        slot: String,
        missing: String,
    },

    #[error("Edge '{edge_id}' leaves '{node_id}' on branch {index}, but only {classes} class(es) are declared; kept as is")]
    BranchOutOfRange {
        edge_id: String,
        node_id: String,
        index: usize,
        classes: usize,
    },

    #[error("Edge '{edge_id}' leaves '{node_id}' on unrecognized handle '{handle}'; kept as is")]
    UnrecognizedHandle {
        edge_id: String,
        node_id: String,
        handle: String,
    },
}

impl Diagnostic {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Diagnostic::UnsupportedNode { .. }
            | Diagnostic::DroppedNestedBlock { .. }
            | Diagnostic::BranchOutOfRange { .. }
            | Diagnostic::UnrecognizedHandle { .. } => DiagnosticKind::UnsupportedConstruct,
            Diagnostic::DanglingReference { .. } => DiagnosticKind::DanglingReference,
            Diagnostic::MixedEdge { .. } | Diagnostic::DanglingEdge { .. } => {
                DiagnosticKind::DroppedEdge
            }
        }
    }
}

/// Post-run summary of everything that was degraded or dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionReport {
    pub diagnostics: Vec<Diagnostic>,
    /// Nodes decoded with their registered decoder, across all levels.
    pub converted_nodes: usize,
    /// Ids of top-level nodes replaced by placeholders.
    pub placeholders: Vec<String>,
    /// Ids of nested blocks that were dropped.
    pub dropped_blocks: Vec<String>,
}

impl ConversionReport {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind() == kind).count()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind() == kind)
    }

    /// True when nothing was degraded or dropped.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Converted {} node(s); {} placeholder(s), {} dropped block(s)",
            self.converted_nodes,
            self.placeholders.len(),
            self.dropped_blocks.len()
        )?;
        writeln!(
            f,
            "Unsupported constructs: {}, dangling references: {}, dropped edges: {}",
            self.count(DiagnosticKind::UnsupportedConstruct),
            self.count(DiagnosticKind::DanglingReference),
            self.count(DiagnosticKind::DroppedEdge)
        )?;
        for diagnostic in &self.diagnostics {
            writeln!(f, "  - {}", diagnostic)?;
        }
        Ok(())
    }
}
