use super::definition::RawDocument;
use crate::error::FormatError;

/// A trait for platform documents that can be converted into the record tree
/// the conversion core consumes.
///
/// This is the seam between serialization-format readers and the core: an
/// implementor has already unpacked any archive or encoding and only reshapes
/// the platform's records into `RawDocument`.
///
/// # Example
///
/// ```rust,no_run
/// use flowbridge::error::FormatError;
/// use flowbridge::records::{IntoDocument, RawDocument, RawEdge, RawNode};
///
/// struct MyStep { id: String, kind: String }
/// struct MyFlow { steps: Vec<MyStep>, links: Vec<(String, String)> }
///
/// impl IntoDocument for MyFlow {
///     fn into_document(self) -> Result<RawDocument, FormatError> {
///         let nodes = self
///             .steps
///             .into_iter()
///             .map(|s| RawNode::new(s.id, s.kind))
///             .collect();
///         let edges = self
///             .links
///             .into_iter()
///             .enumerate()
///             .map(|(i, (from, to))| RawEdge::new(format!("e{}", i), from, to))
///             .collect();
///         Ok(RawDocument::new(nodes, edges))
///     }
/// }
/// ```
pub trait IntoDocument {
    /// Consumes the object and converts it into the core's record tree.
    fn into_document(self) -> Result<RawDocument, FormatError>;
}

impl IntoDocument for RawDocument {
    fn into_document(self) -> Result<RawDocument, FormatError> {
        Ok(self)
    }
}
