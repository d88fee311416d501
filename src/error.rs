use crate::ir::NodeType;
use thiserror::Error;

/// The document cannot identify its own nodes; no graph can be produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("Failed to parse {platform} document: {message}")]
    Parse { platform: String, message: String },

    #[error("Document is missing the required field '{0}'")]
    MissingField(String),

    #[error("Node at position {index} has no id")]
    MissingNodeId { index: usize },

    #[error("Node '{node_id}' has no type tag")]
    MissingTypeTag { node_id: String },
}

/// A graph invariant does not hold after assembly. Aborts the conversion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructuralError {
    #[error("Two nodes on the same graph level share the id '{id}'")]
    DuplicateNodeId { id: String },

    #[error("Edge '{edge_id}' references node '{node_id}', which is not on the same graph level")]
    EdgeEndpointMissing { edge_id: String, node_id: String },

    #[error("Node '{node_id}' is typed {node_type} but carries a {config_type} config")]
    ConfigMismatch {
        node_id: String,
        node_type: NodeType,
        config_type: NodeType,
    },

    #[error("Node '{node_id}' declares the output '{output}' more than once")]
    DuplicateOutput { node_id: String, output: String },

    #[error("Entry edge '{edge_id}' of iteration '{iteration_id}' does not start at the iteration or end inside its body")]
    InvalidEntryEdge {
        iteration_id: String,
        edge_id: String,
    },

    #[error("Loop-entry edge '{edge_id}' appears in a graph level's edge list")]
    MisplacedEntryEdge { edge_id: String },
}

/// Any error that aborts a conversion run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Structural(#[from] StructuralError),
}

/// A single node could not be decoded. Never aborts a conversion: top-level
/// nodes degrade to a placeholder, nested blocks are dropped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("No decoder is registered for type tag '{type_tag}'")]
    NotRegistered { type_tag: String },

    #[error("Node '{node_id}' has invalid parameters: {message}")]
    InvalidParams { node_id: String, message: String },
}

/// Errors that can occur while saving or loading a binary graph artifact.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArtifactError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("{0}")]
    Encode(String),

    #[error("{0}")]
    Decode(String),
}
