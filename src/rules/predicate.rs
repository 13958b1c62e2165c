//! Node predicates. Combinations beyond negation are written by nesting
//! rules rather than with boolean operators here.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ast::{Kind, TreeNode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Matches every node.
    Any,
    /// Node kind equals the given kind.
    Kind(Kind),
    /// The node hangs off its parent under this field role.
    FieldRole(String),
    /// The node owns a field with this role.
    HasField(String),
    Not(Box<Predicate>),
}

/// Edge information for the node being tested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchContext<'a> {
    /// Field role of the edge from the parent; `None` for the root.
    pub field_role: Option<&'a str>,
}

impl<'a> MatchContext<'a> {
    pub fn root() -> Self {
        Self { field_role: None }
    }

    pub fn edge(field_role: &'a str) -> Self {
        Self {
            field_role: Some(field_role),
        }
    }
}

pub fn any() -> Predicate {
    Predicate::Any
}

pub fn kind(kind: impl Into<Kind>) -> Predicate {
    Predicate::Kind(kind.into())
}

pub fn field_role(role: impl Into<String>) -> Predicate {
    Predicate::FieldRole(role.into())
}

pub fn has_field(role: impl Into<String>) -> Predicate {
    Predicate::HasField(role.into())
}

pub fn not(predicate: impl Into<Predicate>) -> Predicate {
    Predicate::Not(Box::new(predicate.into()))
}

/// Kinds convert straight into kind predicates so rule tables can write
/// `Rule::on("BinOp")`.
impl From<&str> for Predicate {
    fn from(name: &str) -> Self {
        Predicate::Kind(Kind::new(name))
    }
}

impl From<Kind> for Predicate {
    fn from(kind: Kind) -> Self {
        Predicate::Kind(kind)
    }
}

/// Tests `node` against `predicate`. Pure.
///
/// # Examples
///
/// ```rust
/// use uastkit::ast::NativeNode;
/// use uastkit::rules::predicate::{field_role, kind, matches, not, MatchContext};
/// let op = NativeNode::new("Add");
/// assert!(matches(&kind("Add"), &op, &MatchContext::edge("op")));
/// assert!(matches(&field_role("op"), &op, &MatchContext::edge("op")));
/// assert!(!matches(&field_role("op"), &op, &MatchContext::root()));
/// assert!(matches(&not(kind("Sub")), &op, &MatchContext::root()));
/// ```
pub fn matches(predicate: &Predicate, node: &impl TreeNode, ctx: &MatchContext<'_>) -> bool {
    match predicate {
        Predicate::Any => true,
        Predicate::Kind(kind) => node.kind() == kind,
        Predicate::FieldRole(role) => ctx.field_role == Some(role.as_str()),
        Predicate::HasField(role) => node.has_field(role),
        Predicate::Not(inner) => !matches(inner, node, ctx),
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Any => write!(f, "any"),
            Predicate::Kind(kind) => write!(f, "kind({kind})"),
            Predicate::FieldRole(role) => write!(f, "field_role({role})"),
            Predicate::HasField(role) => write!(f, "has_field({role})"),
            Predicate::Not(inner) => write!(f, "not({inner})"),
        }
    }
}
