//! AST module for uastkit
//!
//! This module provides the native tree types consumed by the annotator and
//! the annotated tree types it produces. A native tree is whatever a
//! language parser emits, reduced to a uniform shape: a kind identifier,
//! an ordered list of named fields holding child nodes, an optional token
//! and optional line / column hints.

// ============================================================================
// IMPORTS
// ============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod annotated;
pub mod convert;

pub use annotated::{AnnotatedChild, AnnotatedField, AnnotatedNode, Position};

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// Identifier of a native node kind, such as `"BinOp"` or `"Module"`.
///
/// Kinds are open-ended: they belong to the language being normalized, not to
/// the engine, so any string is accepted.
///
/// # Examples
///
/// ```rust
/// use uastkit::ast::Kind;
/// let kind = Kind::new("BinOp");
/// assert_eq!(kind.as_str(), "BinOp");
/// assert_eq!(kind, Kind::from("BinOp"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kind(String);

impl Kind {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Kind {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Kind {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl PartialEq<str> for Kind {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Kind {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One node of the native input tree.
///
/// Field roles are semantic edge labels (`"left"`, `"body"`, `"args"`), not
/// positions. Their declaration order is the traversal order.
///
/// # Examples
///
/// ```rust
/// use uastkit::ast::NativeNode;
/// let node = NativeNode::new("BinOp")
///     .at(1, 0)
///     .with_child("left", NativeNode::new("Name").with_token("a"))
///     .with_child("op", NativeNode::new("Add"))
///     .with_child("right", NativeNode::new("Num").with_token("1"));
/// let roles: Vec<_> = node.children().map(|(role, _)| role).collect();
/// assert_eq!(roles, ["left", "op", "right"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeNode {
    pub kind: Kind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

/// A named edge from a parent to one child or an ordered list of children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub role: String,
    pub value: Child,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Child {
    Node(Box<NativeNode>),
    List(Vec<NativeNode>),
}

/// Read-only view shared by native and annotated nodes; predicates only
/// ever look at a node through this trait.
pub trait TreeNode {
    fn kind(&self) -> &Kind;

    fn token(&self) -> Option<&str>;

    /// True when the node owns a field with the given role.
    fn has_field(&self, role: &str) -> bool;
}

// ============================================================================
// PUBLIC API IMPLEMENTATION
// ============================================================================

impl NativeNode {
    pub fn new(kind: impl Into<Kind>) -> Self {
        Self {
            kind: kind.into(),
            fields: Vec::new(),
            token: None,
            properties: Vec::new(),
            line: None,
            column: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets both position hints.
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push((key.into(), value.into()));
        self
    }

    pub fn with_child(mut self, role: impl Into<String>, child: NativeNode) -> Self {
        self.fields.push(Field {
            role: role.into(),
            value: Child::Node(Box::new(child)),
        });
        self
    }

    pub fn with_list(
        mut self,
        role: impl Into<String>,
        children: impl IntoIterator<Item = NativeNode>,
    ) -> Self {
        self.fields.push(Field {
            role: role.into(),
            value: Child::List(children.into_iter().collect()),
        });
        self
    }

    /// Iterates the immediate children in declared order, flattening list
    /// fields. Every element of a list carries the list's field role.
    pub fn children(&self) -> impl Iterator<Item = (&str, &NativeNode)> + '_ {
        self.fields.iter().flat_map(|field| {
            let role = field.role.as_str();
            let nodes: Box<dyn Iterator<Item = &NativeNode> + '_> = match &field.value {
                Child::Node(node) => Box::new(std::iter::once(node.as_ref())),
                Child::List(nodes) => Box::new(nodes.iter()),
            };
            nodes.map(move |node| (role, node))
        })
    }

    /// Returns the first child reachable through `role`.
    pub fn child(&self, role: &str) -> Option<&NativeNode> {
        self.children().find(|(r, _)| *r == role).map(|(_, n)| n)
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Number of nodes in the subtree rooted here, including this node.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children().map(|(_, child)| child));
        }
        count
    }

    /// Length of the longest root-to-leaf path, counting nodes.
    ///
    /// Iterative, so it is safe to call on trees too deep to recurse over.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.children().map(|(_, child)| (child, depth + 1)));
        }
        deepest
    }
}

// Children are moved onto a heap stack first, so dropping never recurses
// once per level.
impl Drop for NativeNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.fields);
        while let Some(field) = stack.pop() {
            let nodes = match field.value {
                Child::Node(node) => vec![*node],
                Child::List(nodes) => nodes,
            };
            for mut node in nodes {
                stack.append(&mut node.fields);
            }
        }
    }
}

impl TreeNode for NativeNode {
    fn kind(&self) -> &Kind {
        &self.kind
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn has_field(&self, role: &str) -> bool {
        self.fields.iter().any(|f| f.role == role)
    }
}
