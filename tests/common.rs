//! Common test utilities for building platform documents and record trees.
use flowbridge::prelude::*;
use flowbridge::records::{RawEdge, RawInput, RawNode};
use serde_json::{Value, json};

/// A Dify workflow: `Start -> Iteration(body: Code) -> End`.
///
/// The Code node reads `Start.user_input` and the per-item value of the
/// iteration's loop-start pseudo node, which is wired to it by a pseudo-edge.
#[allow(dead_code)]
pub fn dify_iteration_document() -> Value {
    json!({
        "workflow": { "graph": {
            "nodes": [
                {
                    "id": "start",
                    "position": { "x": 0, "y": 0 },
                    "data": {
                        "type": "start",
                        "title": "Start",
                        "variables": [
                            { "variable": "user_input", "type": "string" },
                            { "variable": "items", "type": "array[string]" }
                        ]
                    }
                },
                {
                    "id": "iter",
                    "data": {
                        "type": "iteration",
                        "title": "For each item",
                        "iterator_selector": ["start", "items"],
                        "output_selector": ["code", "result"],
                        "output_type": "array[string]",
                        "start_node_id": "iter-start",
                        "is_parallel": false
                    }
                },
                {
                    "id": "iter-start",
                    "parentId": "iter",
                    "data": { "type": "iteration-start", "title": "" }
                },
                {
                    "id": "code",
                    "parentId": "iter",
                    "data": {
                        "type": "code",
                        "title": "Shout",
                        "code_language": "python3",
                        "code": "def main(q, item):\n    return {'result': q + item.upper()}",
                        "variables": [
                            { "variable": "q", "value_selector": ["start", "user_input"] },
                            { "variable": "item", "value_selector": ["iter-start", "item"] }
                        ],
                        "outputs": { "result": { "type": "string" } }
                    }
                },
                {
                    "id": "end",
                    "data": {
                        "type": "end",
                        "title": "End",
                        "outputs": [
                            { "variable": "results", "value_selector": ["iter", "output"] }
                        ]
                    }
                }
            ],
            "edges": [
                { "id": "e-start-iter", "source": "start", "sourceHandle": "source", "target": "iter", "targetHandle": "target" },
                { "id": "e-iter-end", "source": "iter", "sourceHandle": "source", "target": "end", "targetHandle": "target" },
                { "id": "e-loop-code", "source": "iter-start", "sourceHandle": "source", "target": "code", "targetHandle": "target" }
            ]
        }}
    })
}

/// A Dify workflow with an if-else node routing to three LLM nodes.
#[allow(dead_code)]
pub fn dify_branching_document() -> Value {
    let llm = |id: &str| {
        json!({
            "id": id,
            "data": {
                "type": "llm",
                "title": id,
                "model": { "provider": "openai", "name": "gpt-4o", "completion_params": { "temperature": 0.2 } },
                "prompt_template": [
                    { "role": "system", "text": "Be brief." },
                    { "role": "user", "text": "{{#start.q#}}" }
                ]
            }
        })
    };
    json!({
        "nodes": [
            { "id": "start", "data": { "type": "start", "variables": [{ "variable": "q", "type": "string" }] } },
            {
                "id": "branch",
                "data": {
                    "type": "if-else",
                    "title": "Route",
                    "cases": [
                        {
                            "case_id": "true",
                            "logical_operator": "and",
                            "conditions": [
                                { "variable_selector": ["start", "q"], "comparison_operator": "contains", "value": "refund" }
                            ]
                        },
                        {
                            "case_id": "c2",
                            "logical_operator": "or",
                            "conditions": [
                                { "variable_selector": ["start", "q"], "comparison_operator": "is", "value": "hi" }
                            ]
                        }
                    ]
                }
            },
            llm("refunds"),
            llm("greeting"),
            llm("other")
        ],
        "edges": [
            { "id": "e0", "source": "start", "sourceHandle": "source", "target": "branch" },
            { "id": "e1", "source": "branch", "sourceHandle": "true", "target": "refunds" },
            { "id": "e2", "source": "branch", "sourceHandle": "c2", "target": "greeting" },
            { "id": "e3", "source": "branch", "sourceHandle": "false", "target": "other" }
        ]
    })
}

fn coze_ref(block: &str, name: &str) -> Value {
    json!({ "type": "string", "value": { "type": "ref", "content": { "blockID": block, "name": name } } })
}

/// A Coze workflow: `Start -> Loop(body: Code) -> Condition -> LLM x3 -> End`.
///
/// The loop exposes its result as `results`; the End node reads it under that
/// native name.
#[allow(dead_code)]
pub fn coze_document() -> Value {
    let llm = |id: &str| {
        json!({
            "id": id,
            "type": "3",
            "data": {
                "nodeMeta": { "title": id },
                "inputs": {
                    "inputParameters": [{ "name": "input", "input": coze_ref("100001", "input") }],
                    "llmParam": [
                        { "name": "modelName", "input": { "value": { "content": "doubao-pro" } } },
                        { "name": "temperature", "input": { "value": { "content": "0.7" } } },
                        { "name": "prompt", "input": { "value": { "content": "{{input}}" } } }
                    ]
                },
                "outputs": [{ "name": "output", "type": "string" }]
            }
        })
    };
    json!({
        "nodes": [
            {
                "id": "100001",
                "type": "1",
                "meta": { "position": { "x": 0, "y": 0 } },
                "data": {
                    "nodeMeta": { "title": "Start" },
                    "outputs": [
                        { "name": "input", "type": "string" },
                        { "name": "items", "type": "list" }
                    ]
                }
            },
            {
                "id": "loop",
                "type": "21",
                "data": {
                    "nodeMeta": { "title": "Loop" },
                    "inputs": {
                        "inputParameters": [{ "name": "input", "input": coze_ref("100001", "items") }]
                    },
                    "outputs": [{ "name": "results", "type": "list", "input": coze_ref("code1", "out") }]
                },
                "blocks": [
                    {
                        "id": "code1",
                        "type": "5",
                        "data": {
                            "nodeMeta": { "title": "Body" },
                            "inputs": {
                                "inputParameters": [{ "name": "x", "input": coze_ref("loop", "input") }],
                                "code": "async function main({ params }) { return { out: params.x } }",
                                "language": 5
                            },
                            "outputs": [{ "name": "out", "type": "string" }]
                        }
                    }
                ],
                "edges": [
                    { "sourceNodeID": "loop", "targetNodeID": "code1", "sourcePortID": "loop-function-inline-output" }
                ]
            },
            {
                "id": "cond",
                "type": "8",
                "data": {
                    "nodeMeta": { "title": "Check" },
                    "inputs": {
                        "branches": [
                            {
                                "condition": {
                                    "logic": 2,
                                    "conditions": [{
                                        "operator": 7,
                                        "left": { "input": coze_ref("100001", "input") },
                                        "right": { "input": { "type": "string", "value": { "type": "literal", "content": "a" } } }
                                    }]
                                }
                            },
                            {
                                "condition": {
                                    "logic": 1,
                                    "conditions": [{
                                        "operator": 9,
                                        "left": { "input": coze_ref("100001", "input") }
                                    }]
                                }
                            }
                        ]
                    }
                }
            },
            llm("llm_a"),
            llm("llm_b"),
            llm("llm_c"),
            {
                "id": "900001",
                "type": "2",
                "data": {
                    "nodeMeta": { "title": "End" },
                    "inputs": {
                        "inputParameters": [{ "name": "answer", "input": coze_ref("loop", "results") }]
                    }
                }
            }
        ],
        "edges": [
            { "sourceNodeID": "100001", "targetNodeID": "loop" },
            { "sourceNodeID": "loop", "targetNodeID": "cond" },
            { "sourceNodeID": "cond", "targetNodeID": "llm_a", "sourcePortID": "true" },
            { "sourceNodeID": "cond", "targetNodeID": "llm_b", "sourcePortID": "true_1" },
            { "sourceNodeID": "cond", "targetNodeID": "llm_c", "sourcePortID": "false" },
            { "sourceNodeID": "llm_a", "targetNodeID": "900001" },
            { "sourceNodeID": "llm_b", "targetNodeID": "900001" },
            { "sourceNodeID": "llm_c", "targetNodeID": "900001" }
        ]
    })
}

/// A Bailian application flow whose End node comes before the iteration it
/// reads from, with the loop body in the `subflows` section.
#[allow(dead_code)]
pub fn bailian_document() -> Value {
    json!({
        "nodes": [
            {
                "id": "end",
                "type": "End",
                "name": "End",
                "config": { "template": "${iter.result}" },
                "inputs": [{ "key": "summary", "type": "array[string]", "value": "${iter.result}" }]
            },
            {
                "id": "start",
                "type": "Start",
                "name": "Start",
                "outputs": [
                    { "key": "query", "type": "string" },
                    { "key": "docs", "type": "array[string]" }
                ]
            },
            {
                "id": "intent",
                "type": "Classifier",
                "name": "Intent",
                "config": {
                    "modelId": "qwen-max",
                    "query": "${start.query}",
                    "intentions": ["summarize", { "id": "skip", "name": "skip it" }]
                }
            },
            {
                "id": "iter",
                "type": "Iteration",
                "name": "Each doc",
                "config": {
                    "iterator": "${start.docs}",
                    "result": "${summarize.text}",
                    "resultType": "array[string]"
                },
                "outputs": [{ "key": "result", "type": "array[string]" }]
            },
            { "id": "fallback", "type": "Script", "name": "Fallback", "config": { "scriptType": "python", "script": "pass" } }
        ],
        "edges": [
            { "id": "b0", "source": "start", "sourceHandle": "out", "target": "intent" },
            { "id": "b1", "source": "intent", "sourceHandle": "branch_0", "target": "iter" },
            { "id": "b2", "source": "intent", "sourceHandle": "else", "target": "fallback" },
            { "id": "b3", "source": "iter", "sourceHandle": "out", "target": "end" },
            { "id": "b4", "source": "fallback", "target": "end" }
        ],
        "subflows": {
            "iter": {
                "nodes": [
                    {
                        "id": "summarize",
                        "type": "LLM",
                        "name": "Summarize",
                        "config": { "modelId": "qwen-turbo", "prompt": "Summarize ${iter.item}" },
                        "inputs": [{ "key": "doc", "value": "${iter.item}" }]
                    }
                ],
                "edges": [
                    { "id": "s0", "source": "iter", "sourceHandle": "iteration-start", "target": "summarize" }
                ]
            }
        }
    })
}

/// `Start -> Z -> End` where `Z` carries a tag no decoder is registered for.
/// The End node reads from both `Start` and `Z`.
#[allow(dead_code)]
pub fn unknown_node_document() -> RawDocument {
    RawDocument::new(
        vec![
            RawNode::new("start", "start")
                .with_title("Start")
                .with_output("user_input", Some("string")),
            RawNode::new("z", "knowledge-retrieval")
                .with_title("Lookup")
                .with_input(RawInput::reference("query", "start", "user_input"))
                .with_output("result", Some("array[object]")),
            RawNode::new("end", "end")
                .with_title("End")
                .with_input(RawInput::reference("echo", "start", "user_input"))
                .with_input(RawInput::reference("docs", "z", "result")),
        ],
        vec![
            RawEdge::new("in", "start", "z").with_source_handle("source"),
            RawEdge::new("out", "z", "end").with_source_handle("source"),
        ],
    )
}

/// Finds a node by id on one graph level, failing the test when absent.
#[allow(dead_code)]
pub fn node<'g>(graph: &'g Graph, id: &str) -> &'g Node {
    graph
        .node(id)
        .unwrap_or_else(|| panic!("node '{}' missing from graph", id))
}
