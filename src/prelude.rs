//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the flowbridge crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use flowbridge::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let json = std::fs::read_to_string("path/to/workflow.json")?;
//! let conversion = Converter::new(Platform::Coze).convert_str(&json)?;
//!
//! for node in &conversion.graph.nodes {
//!     println!("{} ({})", node.title, node.node_type);
//! }
//! # Ok(())
//! # }
//! ```

// Conversion
pub use crate::converter::{Conversion, ConversionReport, Converter, Diagnostic, DiagnosticKind};
pub use crate::platform::Platform;
pub use crate::records::{IntoDocument, RawDocument};

// Graph IR
pub use crate::ir::{
    CanonicalHandle, Edge, EdgeKind, Graph, GraphArtifact, Input, InputValue, Node, NodeConfig,
    NodeType, Output, VarType, VariableReference,
};

// Translation helpers for generators
pub use crate::handle::{from_canonical_handle, to_canonical_handle};

// Error types
pub use crate::error::{ArtifactError, ConvertError, FormatError, StructuralError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
