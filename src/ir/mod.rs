//! The unified graph representation every conversion routes through.
pub mod artifact;
pub mod edge;
pub mod graph;
pub mod node;
pub mod value;

pub use artifact::*;
pub use edge::*;
pub use graph::*;
pub use node::*;
pub use value::*;
