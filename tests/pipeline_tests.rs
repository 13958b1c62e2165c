// tests/pipeline_tests.rs

mod common;

use std::sync::Arc;

use common::{binop_module, expr_chain, init_tracing, BINOP_SOURCE, PYTHON_RULES};
use predicates::prelude::*;
use serde_json::json;
use uastkit::prelude::*;
use uastkit::config::DEFAULT_MAX_DEPTH;
use uastkit::errors::ConvertError;
use uastkit::{Config, NativeNode, NormalizeError, Normalizer, PositionWarning};

fn python_normalizer() -> Normalizer {
    Normalizer::new(Arc::clone(&PYTHON_RULES))
}

// ---
// Native trees
// ---

#[test]
fn test_normalize_annotates_and_positions() {
    init_tracing();
    let out = python_normalizer()
        .normalize(BINOP_SOURCE, &binop_module())
        .unwrap();
    assert!(out.warnings.is_empty());
    assert!(out.tree.walk().all(|n| n.position.is_some()));

    let num = out.tree.find_kind("Num").unwrap();
    assert!(num.roles.contains(&Role::Right));
    assert_eq!(num.position.map(|p| (p.offset, p.line, p.column)), Some((4, 1, 4)));
}

#[test]
fn test_structural_error_yields_no_tree() {
    let err = python_normalizer()
        .normalize("x", &NativeNode::new("Expression"))
        .unwrap_err();
    let message = predicate::str::contains("root must be").and(predicate::str::contains("Module"));
    assert!(message.eval(&err.to_string()));
}

#[test]
fn test_warnings_survive_the_pipeline() {
    let native = NativeNode::new("Module").with_child("body", NativeNode::new("Pass").at(3, 0));
    let out = python_normalizer().normalize("pass\n", &native).unwrap();
    assert!(matches!(out.warnings[..], [PositionWarning::LineOutOfRange { line: 3, .. }]));
    assert_eq!(out.tree.child("body").unwrap().position, out.tree.position);
}

// ---
// Native JSON
// ---

fn call_json() -> serde_json::Value {
    json!({
        "ast_type": "Module",
        "body": [{
            "ast_type": "Expr", "lineno": 1, "col_offset": 0,
            "value": {
                "ast_type": "Call", "lineno": 1, "col_offset": 0,
                "func": {"ast_type": "Name", "id": "print", "lineno": 1, "col_offset": 0},
                "args": [{"ast_type": "Str", "s": "hi", "lineno": 1, "col_offset": 6}],
                "keywords": []
            }
        }]
    })
}

#[test]
fn test_normalize_json_end_to_end() {
    init_tracing();
    let out = python_normalizer()
        .normalize_json("print(\"hi\")\n", &call_json())
        .unwrap();
    let call = out.tree.find_kind("Call").unwrap();
    assert_eq!(
        call.roles.as_slice(),
        &[Role::Function, Role::Call, Role::Expression]
    );

    // `args` is promoted to a container; the container carries the edge roles.
    let args = call.child("args").unwrap();
    assert_eq!(args.kind, "Call.args");
    assert!(args.roles.contains(&Role::Positional));
    assert_eq!(args.position, call.position);

    let hi = out.tree.find_kind("Str").unwrap();
    assert_eq!(hi.token.as_deref(), Some("hi"));
    assert_eq!(hi.position.map(|p| p.offset), Some(6));
    assert!(hi.roles.contains(&Role::String));
}

#[test]
fn test_normalize_json_wraps_both_failure_kinds() {
    let normalizer = python_normalizer();
    let convert = normalizer.normalize_json("", &json!("Module")).unwrap_err();
    assert!(matches!(convert, NormalizeError::Convert(_)));

    let structural = normalizer
        .normalize_json("", &json!({"ast_type": "Interactive"}))
        .unwrap_err();
    match structural {
        NormalizeError::Structural(err) => assert_eq!(err.kind, "Interactive"),
        other => panic!("expected a structural error, got {other}"),
    }
}

#[test]
fn test_config_drives_every_stage() {
    let config = Config::from_yaml_str(
        "annotator:\n  max_depth: 64\npositions:\n  column_base: 1\nnative:\n  kind_key: type\n  promote_lists: false\n",
    )
    .unwrap();
    let normalizer = Normalizer::from_config(Arc::clone(&PYTHON_RULES), &config);
    let native = json!({
        "type": "Module",
        "body": [{"type": "Name", "id": "x", "lineno": 1, "col_offset": 3}]
    });
    let out = normalizer.normalize_json("  x\n", &native).unwrap();
    let name = out.tree.child("body").unwrap();
    assert_eq!(name.kind, "Name");
    assert_eq!(name.position.map(|p| p.offset), Some(2));
    assert_eq!(normalizer.annotator().config().max_depth, 64);
}

#[test]
fn test_output_serializes_with_role_names() {
    let out = python_normalizer()
        .normalize(BINOP_SOURCE, &binop_module())
        .unwrap();
    let value = serde_json::to_value(&out.tree).unwrap();
    assert_eq!(value["kind"], "Module");
    assert_eq!(value["roles"], json!(["File", "Module"]));
    assert_eq!(value["position"], json!({"offset": 0, "line": 1, "column": 0}));
    let text = value.to_string();
    assert!(predicate::str::contains("\"Operator\"").eval(&text));
}

// ---
// Depth limit
// ---

/// A module whose body is a chain of `Expr` objects; `depth` nodes after
/// conversion, counting the promoted `Module.body` container.
fn expr_chain_json(depth: usize) -> serde_json::Value {
    let mut value = json!({"ast_type": "Name", "id": "x", "lineno": 1, "col_offset": 0});
    for _ in 3..depth {
        value = json!({"ast_type": "Expr", "value": value, "lineno": 1, "col_offset": 0});
    }
    json!({"ast_type": "Module", "body": [value]})
}

#[test]
fn test_every_stage_runs_at_the_depth_limit() {
    init_tracing();
    let normalizer = python_normalizer();
    let out = normalizer
        .normalize("x\n", &expr_chain(DEFAULT_MAX_DEPTH))
        .unwrap();
    assert_eq!(out.tree.node_count(), DEFAULT_MAX_DEPTH);
    assert!(out.warnings.is_empty());

    let out = normalizer
        .normalize_json("x\n", &expr_chain_json(DEFAULT_MAX_DEPTH))
        .unwrap();
    assert_eq!(out.tree.depth(), DEFAULT_MAX_DEPTH);
    let name = out.tree.find_kind("Name").unwrap();
    assert_eq!(name.token.as_deref(), Some("x"));
    assert!(name.roles.contains(&Role::Identifier));
}

#[test]
fn test_json_past_the_depth_limit_is_rejected() {
    let err = python_normalizer()
        .normalize_json("x\n", &expr_chain_json(DEFAULT_MAX_DEPTH + 1))
        .unwrap_err();
    match err {
        NormalizeError::Convert(ConvertError::TooDeep { path, max_depth }) => {
            assert_eq!(max_depth, DEFAULT_MAX_DEPTH);
            assert!(path.starts_with("body[0].value.value"), "{path}");
        }
        other => panic!("expected a depth error, got {other}"),
    }
}
