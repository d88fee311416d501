//! Node Dispatch Registry.
//!
//! Maps a platform's node type tags to decoder constructors. Decoders are
//! built per conversion run against a [`DecodeContext`], which carries the
//! run's reference resolver and the set of node ids already known to be
//! removed or substituted.
//!
//! An unknown tag never fails a conversion on its own: [`DecoderRegistry::decode_with_fallback`]
//! substitutes a placeholder Code node that keeps the original id.
use crate::error::DecodeError;
use crate::ir::{Input, Literal, Node, NodeType, Output, VarType, VariableReference};
use crate::platform::Platform;
use crate::records::{RawInput, RawNode, RawOutput, RawReference, RawValue};
use crate::resolver::ReferenceResolver;
use ahash::{AHashMap, AHashSet};
use serde_json::Value;
use tracing::{debug, warn};

mod decoders;
mod params;

pub use decoders::{
    DecoderCtor, ITERATION_OUTPUT, NodeDecoder, PLACEHOLDER_OUTPUT, constructor_for, placeholder,
};

/// Per-run state a decoder reads while decoding one node.
pub struct DecodeContext<'a> {
    pub platform: Platform,
    pub resolver: &'a ReferenceResolver,
    pub removed: &'a AHashSet<String>,
}

impl<'a> DecodeContext<'a> {
    pub fn new(
        platform: Platform,
        resolver: &'a ReferenceResolver,
        removed: &'a AHashSet<String>,
    ) -> Self {
        Self {
            platform,
            resolver,
            removed,
        }
    }

    /// Captures a reference through the resolver.
    pub fn capture(&self, reference: &RawReference, var_type: VarType) -> VariableReference {
        self.resolver
            .resolve(&reference.node_id, &reference.output_name, var_type)
    }

    pub fn is_removed(&self, node_id: &str) -> bool {
        self.removed.contains(node_id)
    }

    pub fn inputs(&self, raw: &[RawInput]) -> Vec<Input> {
        raw.iter()
            .map(|input| {
                let declared = input.var_type.as_deref().map(VarType::parse);
                match &input.value {
                    RawValue::Reference(r) => {
                        Input::reference(&input.name, self.capture(r, declared.unwrap_or(VarType::Any)))
                    }
                    RawValue::Literal(value) => Input::literal(
                        &input.name,
                        declared.unwrap_or_else(|| infer_type(value)),
                        Literal::from(value.clone()),
                    ),
                }
            })
            .collect()
    }

    /// Declared outputs; a repeated name keeps its first declaration.
    pub fn outputs(&self, raw: &[RawOutput]) -> Vec<Output> {
        let mut seen = AHashSet::new();
        raw.iter()
            .filter(|&output| seen.insert(output.name.as_str()))
            .map(|output| {
                Output::new(
                    &output.name,
                    output
                        .var_type
                        .as_deref()
                        .map(VarType::parse)
                        .unwrap_or_default(),
                )
            })
            .collect()
    }
}

fn infer_type(value: &Value) -> VarType {
    match value {
        Value::String(_) => VarType::String,
        Value::Number(_) => VarType::Number,
        Value::Bool(_) => VarType::Boolean,
        Value::Array(_) => VarType::Array,
        Value::Object(_) => VarType::Object,
        Value::Null => VarType::Any,
    }
}

/// The outcome of [`DecoderRegistry::decode_with_fallback`].
#[derive(Debug)]
pub struct Decoded {
    pub node: Node,
    /// Why the node was substituted, when it was.
    pub fallback: Option<DecodeError>,
}

impl Decoded {
    pub fn was_supported(&self) -> bool {
        self.fallback.is_none()
    }
}

/// Type tag → decoder constructor for one platform.
#[derive(Clone)]
pub struct DecoderRegistry {
    platform: Platform,
    constructors: AHashMap<String, DecoderCtor>,
}

impl DecoderRegistry {
    /// An empty registry; every tag degrades to a placeholder.
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            constructors: AHashMap::new(),
        }
    }

    /// A registry holding the built-in decoder for every tag the platform declares.
    pub fn with_defaults(platform: Platform) -> Self {
        let mut registry = Self::new(platform);
        for &(tag, node_type) in platform.node_tags() {
            registry.register(tag, constructor_for(node_type));
        }
        registry
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Registers `ctor` for `type_tag`, replacing any earlier registration.
    pub fn register(&mut self, type_tag: impl Into<String>, ctor: DecoderCtor) {
        self.constructors.insert(type_tag.into(), ctor);
    }

    pub fn unregister(&mut self, type_tag: &str) -> bool {
        self.constructors.remove(type_tag).is_some()
    }

    pub fn is_registered(&self, type_tag: &str) -> bool {
        self.constructors.contains_key(type_tag)
    }

    /// The node type the decoder registered for `type_tag` produces.
    pub fn node_type(&self, type_tag: &str) -> Option<NodeType> {
        let resolver = ReferenceResolver::new();
        let removed = AHashSet::new();
        let ctx = DecodeContext::new(self.platform, &resolver, &removed);
        self.create(type_tag, &ctx).ok().map(|decoder| decoder.node_type())
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn create<'c>(
        &self,
        type_tag: &str,
        ctx: &'c DecodeContext<'c>,
    ) -> Result<Box<dyn NodeDecoder + 'c>, DecodeError> {
        self.constructors
            .get(type_tag)
            .map(|ctor| ctor(ctx))
            .ok_or_else(|| DecodeError::NotRegistered {
                type_tag: type_tag.to_string(),
            })
    }

    /// Decodes `raw` with its registered decoder.
    pub fn try_decode(&self, raw: &RawNode, ctx: &DecodeContext<'_>) -> Result<Node, DecodeError> {
        let decoder = self.create(&raw.type_tag, ctx)?;
        let node = decoder.decode(raw)?;
        debug!(node = %node.id, tag = %raw.type_tag, node_type = %decoder.node_type(), "decoded node");
        Ok(node)
    }

    /// Decodes `raw`, or substitutes a placeholder Code node with the same id
    /// when its tag is unregistered or its parameters do not decode.
    pub fn decode_with_fallback(&self, raw: &RawNode, ctx: &DecodeContext<'_>) -> Decoded {
        match self.try_decode(raw, ctx) {
            Ok(node) => Decoded {
                node,
                fallback: None,
            },
            Err(error) => {
                warn!(node = %raw.id, tag = %raw.type_tag, %error, "substituting placeholder");
                Decoded {
                    node: placeholder(raw, ctx),
                    fallback: Some(error),
                }
            }
        }
    }
}

impl std::fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<&str> = self.tags().collect();
        tags.sort_unstable();
        f.debug_struct("DecoderRegistry")
            .field("platform", &self.platform)
            .field("tags", &tags)
            .finish()
    }
}
