// tests/annotation_tests.rs

mod common;

use std::sync::Arc;

use common::{binop_module, expr_chain, init_tracing, name, num, PYTHON_RULES};
use predicates::prelude::*;
use uastkit::annotate::annotate;
use uastkit::prelude::*;
use uastkit::config::{AnnotatorConfig, DEFAULT_MAX_DEPTH};
use uastkit::{resolve_positions, AnnotatedNode, Annotator, NativeNode};

fn roles_of(node: &AnnotatedNode) -> Vec<&str> {
    node.roles.iter().map(Role::as_str).collect()
}

// ---
// Binary expressions and root validation
// ---

#[test]
fn test_binop_children_receive_edge_roles() {
    init_tracing();
    let tree = annotate(&PYTHON_RULES, &binop_module()).unwrap();
    assert_eq!(roles_of(&tree), ["File", "Module"]);

    let binop = tree.find_kind("BinOp").unwrap();
    assert_eq!(roles_of(binop), ["Expression", "Binary"]);
    assert_eq!(
        roles_of(binop.child("op").unwrap()),
        ["Expression", "Binary", "Operator", "Add"]
    );
    assert_eq!(
        roles_of(binop.child("left").unwrap()),
        ["Expression", "Binary", "Left", "Identifier"]
    );
    assert_eq!(
        roles_of(binop.child("right").unwrap()),
        ["Expression", "Binary", "Right", "Literal", "Number", "Primitive"]
    );
}

#[test]
fn test_wrong_root_kind_is_structural_error() {
    init_tracing();
    let root = NativeNode::new("Expression").with_child("body", name("x"));
    let err = annotate(&PYTHON_RULES, &root).unwrap_err();
    assert!(predicate::str::contains("Module").eval(&err.to_string()));
    assert_eq!(err.kind, "Expression");
    assert!(err.path.is_root());
}

#[test]
fn test_error_rule_deep_in_tree_aborts_whole_tree() {
    init_tracing();
    let root = NativeNode::new("Module").with_list(
        "body",
        [
            NativeNode::new("Expr").with_child("value", name("ok")),
            NativeNode::new("Expr").with_child("value", NativeNode::new("Yield")),
        ],
    );
    let err = annotate(&PYTHON_RULES, &root).unwrap_err();
    assert_eq!(err.message, "yield outside of a function body");
    assert_eq!(err.path.to_string(), "body[1].value");
    assert_eq!(err.location(), "Yield at body[1].value");
}

// ---
// Scopes
// ---

fn nested_comment_module() -> NativeNode {
    NativeNode::new("Module").with_list(
        "body",
        [NativeNode::new("FunctionDef").with_list(
            "body",
            [NativeNode::new("If").with_list(
                "body",
                [NativeNode::new("Pass").with_child("noops", NativeNode::new("SameLineNoops"))],
            )],
        )],
    )
}

#[test]
fn test_descendants_reach_any_depth() {
    init_tracing();
    let tree = annotate(&PYTHON_RULES, &nested_comment_module()).unwrap();
    let comment = tree.find_kind("SameLineNoops").unwrap();
    assert_eq!(roles_of(comment), ["Comment"]);
}

#[test]
fn test_children_scope_stops_at_one_level() {
    let shallow = Rule::on("Module")
        .roles([Role::File])
        .children([Rule::on("SameLineNoops").roles([Role::Comment]).build()])
        .build();
    let tree = annotate(&shallow, &nested_comment_module()).unwrap();
    let comment = tree.find_kind("SameLineNoops").unwrap();
    assert!(comment.roles.is_empty());
}

#[test]
fn test_unmatched_nodes_keep_empty_roles() {
    let tree = annotate(&PYTHON_RULES, &nested_comment_module()).unwrap();
    for kind in ["FunctionDef", "If", "Pass"] {
        assert!(tree.find_kind(kind).unwrap().roles.is_empty(), "{kind}");
    }
}

#[test]
fn test_field_role_never_matches_root() {
    let rules = Rule::on(field_role("body")).roles([Role::Body]).build();
    let tree = annotate(&rules, &NativeNode::new("Module")).unwrap();
    assert!(tree.roles.is_empty());
}

#[test]
fn test_list_elements_share_field_role() {
    let root = NativeNode::new("Module").with_list(
        "body",
        [NativeNode::new("Expr").with_child(
            "value",
            NativeNode::new("Call")
                .with_child("func", name("print"))
                .with_list("args", [num("1"), name("x")]),
        )],
    );
    let tree = annotate(&PYTHON_RULES, &root).unwrap();
    let call = tree.find_kind("Call").unwrap();
    let args: Vec<_> = call.children_by_role("args").map(roles_of).collect();
    assert_eq!(args.len(), 2);
    assert!(args.iter().all(|roles| roles[..4] == ["Function", "Call", "Positional", "Argument"]));
    // The callee rule sits one level below the `func` edge.
    assert_eq!(
        roles_of(call.child("func").unwrap()),
        ["Identifier", "Expression"]
    );
}

// ---
// Accumulation and determinism
// ---

#[test]
fn test_roles_accumulate_across_paths_without_duplicates() {
    let root = NativeNode::new("Module").with_list(
        "body",
        [NativeNode::new("Assign")
            .with_list("targets", [name("a")])
            .with_child("value", num("1"))],
    );
    let tree = annotate(&PYTHON_RULES, &root).unwrap();
    let assign = tree.find_kind("Assign").unwrap();
    assert_eq!(
        roles_of(assign.child("targets").unwrap()),
        ["Left", "Identifier", "Expression"]
    );
    assert_eq!(
        roles_of(assign.child("value").unwrap()),
        ["Right", "Literal", "Number", "Expression", "Primitive"]
    );
}

#[test]
fn test_reannotation_is_idempotent() {
    let annotator = Annotator::new(Arc::clone(&PYTHON_RULES));
    let once = annotator.annotate(&binop_module()).unwrap();
    let twice = annotator.annotate_tree(once.clone()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_shared_annotator_is_deterministic_across_threads() {
    init_tracing();
    let annotator = Annotator::new(Arc::clone(&PYTHON_RULES));
    let expected = annotator.annotate(&binop_module()).unwrap();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let annotator = annotator.clone();
                scope.spawn(move || annotator.annotate(&binop_module()).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_input_tree_is_not_modified() {
    let native = binop_module();
    let before = native.clone();
    annotate(&PYTHON_RULES, &native).unwrap();
    assert_eq!(native, before);
}

#[test]
fn test_deep_chain_within_limit() {
    let mut node = name("leaf");
    for _ in 0..300 {
        node = NativeNode::new("Expr").with_child("value", node);
    }
    let root = NativeNode::new("Module").with_child("body", node);
    let tree = annotate(&PYTHON_RULES, &root).unwrap();
    assert_eq!(tree.node_count(), 302);
    assert_eq!(roles_of(tree.find_kind("Name").unwrap()), ["Identifier", "Expression"]);
}

#[test]
fn test_chain_at_depth_limit_annotates_and_resolves() {
    init_tracing();
    let tree = annotate(&PYTHON_RULES, &expr_chain(DEFAULT_MAX_DEPTH)).unwrap();
    assert_eq!(tree.depth(), DEFAULT_MAX_DEPTH);
    assert_eq!(roles_of(tree.find_kind("Name").unwrap()), ["Identifier", "Expression"]);

    let resolved = resolve_positions("x\n", tree);
    assert!(resolved.warnings.is_empty());
    assert!(resolved.tree.walk().all(|n| n.position.map(|p| p.offset) == Some(0)));
}

#[test]
fn test_chain_past_depth_limit_is_rejected() {
    let err = annotate(&PYTHON_RULES, &expr_chain(DEFAULT_MAX_DEPTH + 1)).unwrap_err();
    assert_eq!(
        err.message,
        format!(
            "tree depth {} exceeds the maximum of {DEFAULT_MAX_DEPTH}",
            DEFAULT_MAX_DEPTH + 1
        )
    );
    assert!(err.path.is_root());
}

#[test]
fn test_annotate_tree_applies_the_depth_limit() {
    let config = AnnotatorConfig { max_depth: 40 };
    let annotator = Annotator::with_config(Arc::clone(&PYTHON_RULES), config);
    let within = AnnotatedNode::from_native(&expr_chain(40));
    assert!(annotator.annotate_tree(within).is_ok());

    let deeper = AnnotatedNode::from_native(&expr_chain(41));
    let err = annotator.annotate_tree(deeper).unwrap_err();
    assert_eq!(err.kind, "Module");
    assert!(predicate::str::contains("exceeds the maximum of 40").eval(&err.message));
}

#[test]
fn test_raised_depth_limit_handles_very_deep_chains() {
    let depth = 20 * DEFAULT_MAX_DEPTH;
    let config = AnnotatorConfig { max_depth: depth };
    let annotator = Annotator::with_config(Arc::clone(&PYTHON_RULES), config);
    let tree = annotator.annotate(&expr_chain(depth)).unwrap();
    let resolved = resolve_positions("x\n", tree);
    assert_eq!(resolved.tree.node_count(), depth);
    assert!(resolved.tree.walk().all(|n| n.position.is_some()));
}

#[test]
fn test_rule_table_lints_clean() {
    assert!(PYTHON_RULES.lint().is_empty());
    assert_eq!(PYTHON_RULES.rule_count(), 23);
}
