use crate::error::{ConvertError, FormatError};
use crate::ir::{Graph, GraphArtifact, NodeType};
use crate::platform::Platform;
use crate::records::IntoDocument;
use crate::registry::{DecoderCtor, DecoderRegistry, constructor_for};
use tracing::info;

mod builder;
mod report;

use builder::GraphBuilder;
pub use report::{ConversionReport, Diagnostic, DiagnosticKind};

/// The result of one successful conversion run.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub source: Platform,
    pub graph: Graph,
    pub report: ConversionReport,
}

impl Conversion {
    /// Packages the graph for a generator running in another process.
    pub fn to_artifact(&self) -> GraphArtifact {
        GraphArtifact::new(self.source, self.graph.clone())
    }
}

/// Reads one platform's workflows into the unified graph.
///
/// A converter holds only its decoder table. Every call to [`Converter::convert`]
/// builds its own resolver, removed-node set and report, so one converter can
/// be reused for any number of documents.
#[derive(Debug, Clone)]
pub struct Converter {
    registry: DecoderRegistry,
}

pub struct ConverterBuilder {
    registry: DecoderRegistry,
}

impl ConverterBuilder {
    pub fn new(platform: Platform) -> Self {
        Self {
            registry: DecoderRegistry::with_defaults(platform),
        }
    }

    /// Decodes `type_tag` with the built-in decoder for `node_type`.
    pub fn with_type_mapping(mut self, type_tag: &str, node_type: NodeType) -> Self {
        self.registry.register(type_tag, constructor_for(node_type));
        self
    }

    pub fn with_decoder(mut self, type_tag: &str, ctor: DecoderCtor) -> Self {
        self.registry.register(type_tag, ctor);
        self
    }

    /// Unregisters `type_tag`; its nodes become placeholders.
    pub fn without_type(mut self, type_tag: &str) -> Self {
        self.registry.unregister(type_tag);
        self
    }

    pub fn build(self) -> Converter {
        Converter {
            registry: self.registry,
        }
    }
}

impl Converter {
    pub fn builder(platform: Platform) -> ConverterBuilder {
        ConverterBuilder::new(platform)
    }

    /// A converter with the built-in decoders for `platform`.
    pub fn new(platform: Platform) -> Self {
        Self::builder(platform).build()
    }

    pub fn platform(&self) -> Platform {
        self.registry.platform()
    }

    pub fn registry(&self) -> &DecoderRegistry {
        &self.registry
    }

    pub fn convert(&self, document: impl IntoDocument) -> Result<Conversion, ConvertError> {
        let document = document.into_document()?;
        let (graph, report) = GraphBuilder::new(&self.registry, &document).build()?;
        info!(
            platform = %self.platform(),
            nodes = graph.node_count(),
            placeholders = report.placeholders.len(),
            diagnostics = report.diagnostics.len(),
            "conversion finished"
        );
        Ok(Conversion {
            source: self.platform(),
            graph,
            report,
        })
    }

    /// Converts an already-deserialized platform document.
    pub fn convert_value(&self, document: serde_json::Value) -> Result<Conversion, ConvertError> {
        let document = self.platform().parse_document(document)?;
        self.convert(document)
    }

    pub fn convert_str(&self, json: &str) -> Result<Conversion, ConvertError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| FormatError::Parse {
                platform: self.platform().to_string(),
                message: e.to_string(),
            })?;
        self.convert_value(value)
    }
}
