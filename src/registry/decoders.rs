use super::DecodeContext;
use super::params::{self, *};
use crate::error::DecodeError;
use crate::ir::*;
use crate::records::RawNode;
use tracing::debug;

/// Canonical name of an iteration's collected result.
pub const ITERATION_OUTPUT: &str = "output";
/// Output every placeholder exposes so planned edges and references stay valid.
pub const PLACEHOLDER_OUTPUT: &str = "output";

/// Defines the contract for decoding one platform node record into a unified `Node`.
pub trait NodeDecoder {
    fn node_type(&self) -> NodeType;
    fn decode(&self, raw: &RawNode) -> Result<Node, DecodeError>;
}

/// Builds a decoder bound to one conversion run's context.
pub type DecoderCtor = for<'c> fn(&'c DecodeContext<'c>) -> Box<dyn NodeDecoder + 'c>;

/// Master macro defining the built-in decoders, their constructors, and the
/// exhaustive node-type → constructor table.
macro_rules! define_node_decoders {
    ( $( ($struct_name:ident, $ctor:ident, $node_type:path, $decode:ident) ),* $(,)? ) => {
        $(
            struct $struct_name<'c> {
                ctx: &'c DecodeContext<'c>,
            }

            impl NodeDecoder for $struct_name<'_> {
                fn node_type(&self) -> NodeType { $node_type }
                fn decode(&self, raw: &RawNode) -> Result<Node, DecodeError> {
                    $decode(self.ctx, raw)
                }
            }

            fn $ctor<'c>(ctx: &'c DecodeContext<'c>) -> Box<dyn NodeDecoder + 'c> {
                Box::new($struct_name { ctx })
            }
        )*

        /// The built-in constructor for a node type.
        pub fn constructor_for(node_type: NodeType) -> DecoderCtor {
            match node_type {
                $( $node_type => $ctor as DecoderCtor, )*
            }
        }
    };
}

define_node_decoders! {
    (StartDecoder, start_decoder, NodeType::Start, decode_start),
    (EndDecoder, end_decoder, NodeType::End, decode_end),
    (LlmDecoder, llm_decoder, NodeType::Llm, decode_llm),
    (CodeDecoder, code_decoder, NodeType::Code, decode_code),
    (ConditionDecoder, condition_decoder, NodeType::Condition, decode_condition),
    (ClassifierDecoder, classifier_decoder, NodeType::Classifier, decode_classifier),
    (IterationDecoder, iteration_decoder, NodeType::Iteration, decode_iteration),
}

fn base(ctx: &DecodeContext<'_>, raw: &RawNode, config: NodeConfig) -> Node {
    Node::new(raw.id.clone(), raw.display_title(), config)
        .with_inputs(ctx.inputs(&raw.inputs))
        .with_outputs(ctx.outputs(&raw.outputs))
        .with_meta(raw.meta.clone())
}

fn or_default_output(mut node: Node, name: &str, var_type: VarType) -> Node {
    if node.outputs.is_empty() {
        node.outputs.push(Output::new(name, var_type));
    }
    node
}

fn decode_start(ctx: &DecodeContext<'_>, raw: &RawNode) -> Result<Node, DecodeError> {
    Ok(base(ctx, raw, NodeConfig::Start(StartConfig::default())))
}

/// Runs once the removed-node set is final; inputs pointing at a removed or
/// substituted producer are dropped without error.
fn decode_end(ctx: &DecodeContext<'_>, raw: &RawNode) -> Result<Node, DecodeError> {
    let p: EndParams = params::read(raw)?;
    let mut node = base(ctx, raw, NodeConfig::End(EndConfig { answer: p.answer }));
    node.inputs.retain(|input| match input.as_reference() {
        Some(r) if ctx.is_removed(&r.node_id) => {
            debug!(node = %raw.id, input = %input.name, producer = %r.node_id, "dropping end input from removed node");
            false
        }
        _ => true,
    });
    Ok(node)
}

fn decode_llm(ctx: &DecodeContext<'_>, raw: &RawNode) -> Result<Node, DecodeError> {
    let p: LlmParams = params::read(raw)?;
    let config = LlmConfig {
        model: p.model.into(),
        system_prompt: p.system_prompt.filter(|s| !s.is_empty()),
        prompt: p.prompt.unwrap_or_default(),
    };
    Ok(or_default_output(
        base(ctx, raw, NodeConfig::Llm(config)),
        "text",
        VarType::String,
    ))
}

fn decode_code(ctx: &DecodeContext<'_>, raw: &RawNode) -> Result<Node, DecodeError> {
    let p: CodeParams = params::read(raw)?;
    let config = CodeConfig {
        language: p
            .language
            .as_deref()
            .map(CodeLanguage::parse)
            .unwrap_or_default(),
        code: p.code.unwrap_or_default(),
    };
    Ok(base(ctx, raw, NodeConfig::Code(config)))
}

fn decode_condition(ctx: &DecodeContext<'_>, raw: &RawNode) -> Result<Node, DecodeError> {
    let p: ConditionParams = params::read(raw)?;
    let cases = p
        .cases
        .into_iter()
        .enumerate()
        .map(|(index, case)| BranchCase {
            id: case.id.filter(|id| !id.is_empty()).unwrap_or_else(|| index.to_string()),
            logical_operator: match case.logical_operator.as_deref() {
                Some(op) if op.eq_ignore_ascii_case("or") => LogicalOperator::Or,
                _ => LogicalOperator::And,
            },
            conditions: case
                .conditions
                .into_iter()
                .map(|c| Condition {
                    left: c.left.map(|r| ctx.capture(&r, VarType::Any)),
                    operator: c.operator.unwrap_or_default(),
                    right: Literal::from(c.right),
                })
                .collect(),
        })
        .collect();
    Ok(base(ctx, raw, NodeConfig::Condition(ConditionConfig { cases })))
}

fn decode_classifier(ctx: &DecodeContext<'_>, raw: &RawNode) -> Result<Node, DecodeError> {
    let p: ClassifierParams = params::read(raw)?;
    // Every declared class keeps its slot, even unnamed ones: branch handles
    // index into this list positionally.
    let classes = p
        .classes
        .into_iter()
        .enumerate()
        .map(|(index, c)| ClassLabel {
            id: c.id.filter(|id| !id.is_empty()).unwrap_or_else(|| index.to_string()),
            name: c.name.unwrap_or_default(),
        })
        .collect();
    let config = ClassifierConfig {
        model: p.model.into(),
        query: p.query.map(|r| ctx.capture(&r, VarType::String)),
        instruction: p.instruction.filter(|s| !s.is_empty()),
        classes,
    };
    Ok(or_default_output(
        base(ctx, raw, NodeConfig::Classifier(config)),
        "class_name",
        VarType::String,
    ))
}

/// Decodes the iteration itself; its body is attached later by the flattener.
fn decode_iteration(ctx: &DecodeContext<'_>, raw: &RawNode) -> Result<Node, DecodeError> {
    let p: IterationParams = params::read(raw)?;
    let output_type = p
        .output_type
        .as_deref()
        .or_else(|| raw.outputs.first().and_then(|o| o.var_type.as_deref()))
        .map(VarType::parse)
        .unwrap_or(VarType::Array);
    let config = IterationConfig {
        iterator: p.iterator.map(|r| ctx.capture(&r, VarType::Array)),
        output: p.output.map(|r| ctx.capture(&r, output_type.element())),
        output_type,
        parallel: p.parallel,
        entry_edges: Vec::new(),
        body: Graph::default(),
    };
    let mut node = base(ctx, raw, NodeConfig::Iteration(Box::new(config)));
    // Native output names were registered against `output` in the pre-scan.
    node.outputs = vec![Output::new(ITERATION_OUTPUT, output_type)];
    Ok(node)
}

/// A stub code node standing in for an unsupported one. It keeps the original
/// id, so edges already planned against it stay valid.
pub fn placeholder(raw: &RawNode, ctx: &DecodeContext<'_>) -> Node {
    let code = format!(
        "# Unsupported {} node type '{}' (node '{}'); convert this step manually.\n\
         def main() -> dict:\n    return {{\"{}\": \"\"}}\n",
        ctx.platform, raw.type_tag, raw.id, PLACEHOLDER_OUTPUT
    );
    let config = CodeConfig {
        language: CodeLanguage::Python3,
        code,
    };
    Node::new(
        raw.id.clone(),
        format!("{} [manual: unsupported {}]", raw.display_title(), raw.type_tag),
        NodeConfig::Code(config),
    )
    .with_outputs(vec![Output::new(PLACEHOLDER_OUTPUT, VarType::String)])
    .with_meta(raw.meta.clone())
}
