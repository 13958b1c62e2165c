//! # uastkit Test Fixtures
//!
//! Shared rule table, native trees and logging setup for the integration
//! tests. Each test binary uses a different subset.

#![allow(dead_code)]

use once_cell::sync::Lazy;
use std::sync::Arc;
use uastkit::prelude::*;
use uastkit::NativeNode;

/// Installs a `tracing` subscriber honouring `RUST_LOG`. Safe to call from
/// every test; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A reduced Python rule table: root validation, binary expressions,
/// calls, names, literals and comment containers. Built once and shared by
/// every annotator in a test binary.
pub static PYTHON_RULES: Lazy<Arc<Rule>> = Lazy::new(|| Arc::new(python_rules()));

fn python_rules() -> Rule {
    Rule::on(any())
        .on_self([
            Rule::on(not("Module")).error("root must be of kind Module"),
            Rule::on("Module")
                .roles([Role::File, Role::Module])
                .descendants([
                    Rule::on("BinOp")
                        .roles([Role::Expression, Role::Binary])
                        .children([
                            Rule::on(field_role("op"))
                                .roles([Role::Expression, Role::Binary, Role::Operator])
                                .build(),
                            Rule::on(field_role("left"))
                                .roles([Role::Expression, Role::Binary, Role::Left])
                                .build(),
                            Rule::on(field_role("right"))
                                .roles([Role::Expression, Role::Binary, Role::Right])
                                .build(),
                        ])
                        .build(),
                    Rule::on("Add")
                        .roles([Role::Binary, Role::Operator, Role::Add])
                        .build(),
                    Rule::on("Sub")
                        .roles([Role::Binary, Role::Operator, Role::Subtract])
                        .build(),
                    Rule::on("Call")
                        .roles([Role::Function, Role::Call, Role::Expression])
                        .children([
                            Rule::on(field_role("args"))
                                .roles([Role::Function, Role::Call, Role::Positional, Role::Argument])
                                .build(),
                            Rule::on(field_role("func"))
                                .children([Rule::on("Name").roles([Role::Call, Role::Callee]).build()])
                                .build(),
                        ])
                        .build(),
                    Rule::on("Assign")
                        .roles([Role::Binary, Role::Assignment, Role::Expression])
                        .children([
                            Rule::on(field_role("targets"))
                                .roles([Role::Left])
                                .build(),
                            Rule::on(field_role("value"))
                                .roles([Role::Right])
                                .build(),
                        ])
                        .build(),
                    Rule::on("Name")
                        .roles([Role::Identifier, Role::Expression])
                        .build(),
                    Rule::on("Num")
                        .roles([Role::Literal, Role::Number, Role::Expression, Role::Primitive])
                        .build(),
                    Rule::on("Str")
                        .roles([Role::Literal, Role::String, Role::Expression, Role::Primitive])
                        .build(),
                    Rule::on("Yield").error("yield outside of a function body"),
                    Rule::on("SameLineNoops").roles([Role::Comment]).build(),
                    Rule::on("PreviousNoops")
                        .roles([Role::Whitespace])
                        .children([Rule::on(field_role("lines")).roles([Role::Comment]).build()])
                        .build(),
                ])
                .build(),
        ])
        .build()
}

pub fn name(id: &str) -> NativeNode {
    NativeNode::new("Name").with_token(id)
}

pub fn num(n: &str) -> NativeNode {
    NativeNode::new("Num").with_token(n)
}

/// `a + 1` as a module-level expression statement.
pub fn binop_module() -> NativeNode {
    NativeNode::new("Module").with_list(
        "body",
        [NativeNode::new("Expr").at(1, 0).with_child(
            "value",
            NativeNode::new("BinOp")
                .at(1, 0)
                .with_child("left", name("a").at(1, 0))
                .with_child("op", NativeNode::new("Add").with_token("+"))
                .with_child("right", num("1").at(1, 4)),
        )],
    )
}

/// Source text matching [`binop_module`].
pub const BINOP_SOURCE: &str = "a + 1\n";

/// `Module { body: Expr { value: Expr { ... Name } } }` with `depth` nodes
/// in total. Every node below the root is hinted at line 1, column 0.
pub fn expr_chain(depth: usize) -> NativeNode {
    let mut node = name("x").at(1, 0);
    for _ in 2..depth {
        node = NativeNode::new("Expr").at(1, 0).with_child("value", node);
    }
    NativeNode::new("Module").with_child("body", node)
}
