//! # Annotator
//!
//! Walks a native tree and attaches roles according to a [`Rule`] graph.
//!
//! ## Traversal
//!
//! The root rule is evaluated against the root node as a one-element scope.
//! Evaluating a scope (a list of rules) against a node runs two phases:
//!
//! 1. validation rules, in declaration order; the first whose predicate
//!    matches aborts the whole annotation with a [`StructuralError`];
//! 2. annotation rules, in declaration order; every matching rule adds its
//!    roles, then evaluates its `self` scope against the same node, its
//!    `children` scope against each immediate child, and its `descendants`
//!    scope against every node below, pre-order.
//!
//! Children are always visited in declared field order, so a child's subtree
//! is finished before its next sibling starts. A node no rule matches keeps
//! an empty role set; that is not an error.
//!
//! ## Known gap
//!
//! Nothing correlates positions across two sibling list fields (for example
//! Python's `Compare.ops` and `Compare.comparators`). Rule tables annotate
//! such lists as wholes.

use std::sync::Arc;

use crate::ast::{AnnotatedNode, Kind, NativeNode};
use crate::config::AnnotatorConfig;
use crate::errors::{NodePath, StructuralError};
use crate::rules::{matches, Action, MatchContext, Rule};

// ============================================================================
// ANNOTATOR
// ============================================================================

/// A rule table ready to annotate trees. Cheap to clone and safe to share
/// across threads; every call keeps its own state.
#[derive(Debug, Clone)]
pub struct Annotator {
    rules: Arc<Rule>,
    config: AnnotatorConfig,
}

impl Annotator {
    /// Takes the table by value or as an `Arc<Rule>` the caller already
    /// shares; the table itself is never copied.
    pub fn new(rules: impl Into<Arc<Rule>>) -> Self {
        Self::with_config(rules, AnnotatorConfig::default())
    }

    pub fn with_config(rules: impl Into<Arc<Rule>>, config: AnnotatorConfig) -> Self {
        Self {
            rules: rules.into(),
            config,
        }
    }

    pub fn rules(&self) -> &Rule {
        &self.rules
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    /// Annotates a native tree. The input is left untouched; on error no
    /// tree is produced.
    pub fn annotate(&self, native: &NativeNode) -> Result<AnnotatedNode, StructuralError> {
        annotate_native(&self.rules, &self.config, native)
    }

    /// Runs the rule table over an already built tree. Roles only
    /// accumulate, so applying the same table twice changes nothing.
    pub fn annotate_tree(&self, tree: AnnotatedNode) -> Result<AnnotatedNode, StructuralError> {
        check_depth(&self.config, tree.depth(), &tree.kind)?;
        run(&self.rules, tree)
    }
}

/// One-off annotation with the default configuration. The rule table is
/// only borrowed.
///
/// # Examples
///
/// ```rust
/// use uastkit::annotate::annotate;
/// use uastkit::ast::NativeNode;
/// use uastkit::role::Role;
/// use uastkit::rules::{predicate::not, Rule};
///
/// let rules = Rule::on(uastkit::rules::predicate::any())
///     .on_self([
///         Rule::on(not("Module")).error("root must be of kind Module"),
///         Rule::on("Module").roles([Role::File]).build(),
///     ])
///     .build();
/// let tree = annotate(&rules, &NativeNode::new("Module")).unwrap();
/// assert_eq!(tree.roles.as_slice(), &[Role::File]);
/// let err = annotate(&rules, &NativeNode::new("Expression")).unwrap_err();
/// assert_eq!(err.message, "root must be of kind Module");
/// ```
pub fn annotate(rules: &Rule, native: &NativeNode) -> Result<AnnotatedNode, StructuralError> {
    annotate_native(rules, &AnnotatorConfig::default(), native)
}

fn annotate_native(
    rules: &Rule,
    config: &AnnotatorConfig,
    native: &NativeNode,
) -> Result<AnnotatedNode, StructuralError> {
    check_depth(config, native.depth(), &native.kind)?;
    run(rules, AnnotatedNode::from_native(native))
}

fn check_depth(config: &AnnotatorConfig, depth: usize, root: &Kind) -> Result<(), StructuralError> {
    if depth > config.max_depth {
        return Err(StructuralError::new(
            format!("tree depth {depth} exceeds the maximum of {}", config.max_depth),
            root.clone(),
            NodePath::root(),
        ));
    }
    Ok(())
}

fn run(rules: &Rule, mut tree: AnnotatedNode) -> Result<AnnotatedNode, StructuralError> {
    tracing::debug!(root = %tree.kind, "annotating tree");
    let mut pass = Pass::default();
    pass.apply_scope(std::slice::from_ref(rules), &mut tree, None)?;
    tracing::debug!(
        rule_matches = pass.rule_matches,
        annotated = tree.walk().filter(|n| !n.roles.is_empty()).count(),
        nodes = tree.node_count(),
        "annotation finished"
    );
    Ok(tree)
}

// ============================================================================
// TRAVERSAL
// ============================================================================

/// Mutable state of a single annotation run.
#[derive(Default)]
struct Pass {
    path: NodePath,
    rule_matches: usize,
}

impl Pass {
    fn apply_scope(
        &mut self,
        rules: &[Rule],
        node: &mut AnnotatedNode,
        field_role: Option<&str>,
    ) -> Result<(), StructuralError> {
        let ctx = MatchContext { field_role };

        for rule in rules {
            let Action::Validate { message } = &rule.action else {
                continue;
            };
            if matches(&rule.predicate, &*node, &ctx) {
                tracing::debug!(
                    path = %self.path,
                    kind = %node.kind,
                    predicate = %rule.predicate,
                    "validation rule rejected tree"
                );
                return Err(StructuralError::new(
                    message.clone(),
                    node.kind.clone(),
                    self.path.clone(),
                ));
            }
        }

        for rule in rules {
            let Action::Annotate(annotation) = &rule.action else {
                continue;
            };
            if !matches(&rule.predicate, &*node, &ctx) {
                continue;
            }
            self.rule_matches += 1;
            tracing::trace!(path = %self.path, predicate = %rule.predicate, "rule matched");

            node.roles.extend(&annotation.roles);
            if !annotation.on_self.is_empty() {
                self.apply_scope(&annotation.on_self, node, field_role)?;
            }
            if !annotation.children.is_empty() {
                self.apply_children(&annotation.children, node)?;
            }
            if !annotation.descendants.is_empty() {
                self.apply_descendants(&annotation.descendants, node)?;
            }
        }
        Ok(())
    }

    fn apply_children(
        &mut self,
        rules: &[Rule],
        node: &mut AnnotatedNode,
    ) -> Result<(), StructuralError> {
        for (role, index, child) in node.children_mut() {
            self.path.push(role, index);
            self.apply_scope(rules, child, Some(role))?;
            self.path.pop();
        }
        Ok(())
    }

    /// Pre-order over every node below `node`. Uses an explicit stack, so
    /// tree depth costs heap rather than call frames.
    fn apply_descendants(
        &mut self,
        rules: &[Rule],
        node: &mut AnnotatedNode,
    ) -> Result<(), StructuralError> {
        let base = self.path.len();
        let mut stack = Vec::new();
        push_children(&mut stack, node, base);
        while let Some(Pending {
            depth,
            role,
            index,
            node,
        }) = stack.pop()
        {
            self.path.truncate(depth);
            self.path.push(role, index);
            self.apply_scope(rules, node, Some(role))?;
            push_children(&mut stack, node, depth + 1);
        }
        self.path.truncate(base);
        Ok(())
    }
}

/// A node waiting on the descendants stack. `depth` is the length of its
/// parent's path.
struct Pending<'a> {
    depth: usize,
    role: &'a str,
    index: Option<usize>,
    node: &'a mut AnnotatedNode,
}

fn push_children<'a>(stack: &mut Vec<Pending<'a>>, node: &'a mut AnnotatedNode, depth: usize) {
    let start = stack.len();
    stack.extend(node.children_mut().map(|(role, index, node)| Pending {
        depth,
        role,
        index,
        node,
    }));
    stack[start..].reverse();
}
