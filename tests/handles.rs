//! Tests for translating platform source handles to and from canonical form.
use flowbridge::ir::*;
use flowbridge::prelude::*;

fn condition(case_ids: &[&str]) -> Node {
    let cases = case_ids
        .iter()
        .map(|id| BranchCase {
            id: id.to_string(),
            logical_operator: LogicalOperator::And,
            conditions: vec![],
        })
        .collect();
    Node::new("cond", "If", NodeConfig::Condition(ConditionConfig { cases }))
}

fn classifier(class_ids: &[&str]) -> Node {
    let classes = class_ids
        .iter()
        .map(|id| ClassLabel {
            id: id.to_string(),
            name: format!("class {}", id),
        })
        .collect();
    Node::new(
        "cls",
        "Classify",
        NodeConfig::Classifier(ClassifierConfig {
            classes,
            ..Default::default()
        }),
    )
}

fn llm() -> Node {
    Node::new("llm", "LLM", NodeConfig::Llm(LlmConfig::default()))
}

fn round_trip(platform: Platform, handle: &str, node: &Node) -> Option<String> {
    let canonical = to_canonical_handle(platform, Some(handle), node);
    from_canonical_handle(platform, &canonical, node)
}

#[test]
fn test_missing_handle_is_default() {
    for platform in Platform::ALL {
        assert_eq!(to_canonical_handle(platform, None, &llm()), CanonicalHandle::Default);
        assert_eq!(to_canonical_handle(platform, Some(""), &llm()), CanonicalHandle::Default);
    }
}

#[test]
fn test_dify_condition_handles() {
    let node = condition(&["true", "c2", "c3"]);
    assert_eq!(to_canonical_handle(Platform::Dify, Some("source"), &node), CanonicalHandle::Default);
    assert_eq!(to_canonical_handle(Platform::Dify, Some("true"), &node), CanonicalHandle::Case(0));
    assert_eq!(to_canonical_handle(Platform::Dify, Some("c3"), &node), CanonicalHandle::Case(2));
    assert_eq!(to_canonical_handle(Platform::Dify, Some("false"), &node), CanonicalHandle::Fallthrough);
    assert_eq!(
        to_canonical_handle(Platform::Dify, Some("c9"), &node),
        CanonicalHandle::Raw("c9".to_string())
    );

    for handle in ["source", "true", "c2", "c3", "false", "c9"] {
        assert_eq!(round_trip(Platform::Dify, handle, &node).as_deref(), Some(handle));
    }
}

#[test]
fn test_dify_legacy_condition_without_cases() {
    let node = condition(&[]);
    assert_eq!(to_canonical_handle(Platform::Dify, Some("true"), &node), CanonicalHandle::Case(0));
    assert_eq!(round_trip(Platform::Dify, "true", &node).as_deref(), Some("true"));
}

#[test]
fn test_dify_classifier_handles() {
    let node = classifier(&["1711", "1712"]);
    assert_eq!(to_canonical_handle(Platform::Dify, Some("1712"), &node), CanonicalHandle::Case(1));
    assert_eq!(
        from_canonical_handle(Platform::Dify, &CanonicalHandle::Case(0), &node).as_deref(),
        Some("1711")
    );
    assert!(matches!(
        to_canonical_handle(Platform::Dify, Some("9999"), &node),
        CanonicalHandle::Raw(_)
    ));
}

#[test]
fn test_coze_condition_ports() {
    let node = condition(&["0", "1", "2"]);
    assert_eq!(to_canonical_handle(Platform::Coze, Some("true"), &node), CanonicalHandle::Case(0));
    assert_eq!(to_canonical_handle(Platform::Coze, Some("true_1"), &node), CanonicalHandle::Case(1));
    assert_eq!(to_canonical_handle(Platform::Coze, Some("true_2"), &node), CanonicalHandle::Case(2));
    assert_eq!(to_canonical_handle(Platform::Coze, Some("false"), &node), CanonicalHandle::Fallthrough);

    // These never come back the same way, so they are not translated.
    for handle in ["true_0", "true_01", "true_", "true_x"] {
        assert_eq!(
            to_canonical_handle(Platform::Coze, Some(handle), &node),
            CanonicalHandle::Raw(handle.to_string())
        );
    }
    for handle in ["true", "true_1", "true_2", "false", "true_0"] {
        assert_eq!(round_trip(Platform::Coze, handle, &node).as_deref(), Some(handle));
    }
}

#[test]
fn test_coze_classifier_ports() {
    let node = classifier(&["0", "1"]);
    assert_eq!(to_canonical_handle(Platform::Coze, Some("branch_1"), &node), CanonicalHandle::Case(1));
    assert_eq!(to_canonical_handle(Platform::Coze, Some("default"), &node), CanonicalHandle::Fallthrough);
    // Past the declared classes, but still numeric.
    assert_eq!(to_canonical_handle(Platform::Coze, Some("branch_7"), &node), CanonicalHandle::Case(7));

    for handle in ["branch_0", "branch_1", "branch_7", "default"] {
        assert_eq!(round_trip(Platform::Coze, handle, &node).as_deref(), Some(handle));
    }
}

#[test]
fn test_coze_default_has_no_port() {
    assert_eq!(from_canonical_handle(Platform::Coze, &CanonicalHandle::Default, &llm()), None);
}

#[test]
fn test_bailian_handles() {
    let node = classifier(&["a", "b"]);
    assert_eq!(to_canonical_handle(Platform::Bailian, Some("out"), &node), CanonicalHandle::Default);
    assert_eq!(to_canonical_handle(Platform::Bailian, Some("branch_1"), &node), CanonicalHandle::Case(1));
    assert_eq!(to_canonical_handle(Platform::Bailian, Some("else"), &node), CanonicalHandle::Fallthrough);

    // Branch spellings only mean something on branching nodes.
    assert_eq!(
        to_canonical_handle(Platform::Bailian, Some("branch_0"), &llm()),
        CanonicalHandle::Raw("branch_0".to_string())
    );

    for handle in ["out", "branch_0", "branch_1", "else"] {
        assert_eq!(round_trip(Platform::Bailian, handle, &node).as_deref(), Some(handle));
    }
    let judge = condition(&["x"]);
    assert_eq!(round_trip(Platform::Bailian, "branch_0", &judge).as_deref(), Some("branch_0"));
}

#[test]
fn test_indices_are_not_rebased_across_platforms() {
    // Dify's first case and Coze's plain `true` both mean case 0.
    let dify = to_canonical_handle(Platform::Dify, Some("true"), &condition(&["true", "c2"]));
    let coze = to_canonical_handle(Platform::Coze, Some("true"), &condition(&["0", "1"]));
    assert_eq!(dify, coze);

    // And case 0 is written back in each platform's own spelling.
    let bailian = from_canonical_handle(Platform::Bailian, &coze, &classifier(&["a"]));
    assert_eq!(bailian.as_deref(), Some("branch_0"));
}

#[test]
fn test_raw_handles_pass_through() {
    let raw = CanonicalHandle::Raw("weird-port".to_string());
    for platform in Platform::ALL {
        assert_eq!(
            from_canonical_handle(platform, &raw, &llm()).as_deref(),
            Some("weird-port")
        );
        assert_eq!(round_trip(platform, "weird-port", &llm()).as_deref(), Some("weird-port"));
    }
}
