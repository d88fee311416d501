//! # Flowbridge - Workflow Conversion Core
//!
//! **Flowbridge** converts agent workflows between low-code orchestration
//! platforms (Dify, Coze and Bailian) by routing every conversion through one
//! unified graph representation. A platform document is read once into the
//! unified graph; a platform-specific generator then emits an equivalent
//! workflow for another platform.
//!
//! ## Core Workflow
//!
//! 1.  **Load Your Document**: Deserialize the platform export (JSON, or anything
//!     `serde_json::Value` can hold). Unpacking archives happens before this step.
//! 2.  **Reshape It**: `Platform::parse_document` turns the platform's records into a
//!     `RawDocument`. Custom formats implement the `IntoDocument` trait instead.
//! 3.  **Convert**: Use `Converter::builder` to create a converter for the source
//!     platform and call `convert`. Unsupported nodes degrade to placeholders,
//!     loop bodies are lifted into nested graphs, branch handles are translated
//!     to canonical form and every reference is resolved.
//! 4.  **Generate**: Hand the resulting `Graph` (or a saved `GraphArtifact`) to a
//!     generator, which maps canonical handles back with `from_canonical_handle`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flowbridge::prelude::*;
//! use serde_json::json;
//!
//! fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let document = json!({
//!         "nodes": [
//!             { "id": "start", "data": { "type": "start", "title": "Start",
//!               "variables": [{ "variable": "user_input", "type": "string" }] } },
//!             { "id": "llm", "data": { "type": "llm", "title": "Answer",
//!               "model": { "provider": "openai", "name": "gpt-4o" },
//!               "prompt_template": [{ "role": "user", "text": "{{#start.user_input#}}" }] } },
//!             { "id": "end", "data": { "type": "end", "title": "End",
//!               "outputs": [{ "variable": "answer", "value_selector": ["llm", "text"] }] } }
//!         ],
//!         "edges": [
//!             { "id": "e1", "source": "start", "sourceHandle": "source", "target": "llm" },
//!             { "id": "e2", "source": "llm", "sourceHandle": "source", "target": "end" }
//!         ]
//!     });
//!
//!     let converter = Converter::builder(Platform::Dify)
//!         .with_type_mapping("answer-v2", NodeType::End)
//!         .build();
//!     let conversion = converter.convert_value(document)?;
//!
//!     println!("{} node(s) converted", conversion.graph.node_count());
//!     print!("{}", conversion.report);
//!
//!     // Persist the graph for a generator running elsewhere.
//!     conversion.to_artifact().save("workflow.fbg")?;
//!     Ok(())
//! }
//! ```

pub mod converter;
pub mod error;
pub mod handle;
pub mod ir;
pub mod iteration;
pub mod platform;
pub mod prelude;
pub mod records;
pub mod registry;
pub mod resolver;
