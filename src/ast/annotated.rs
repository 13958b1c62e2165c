//! The annotated ("universal") tree.
//!
//! An `AnnotatedNode` mirrors a `NativeNode` one-to-one and additionally
//! carries the semantic roles attached by the annotator and, once the
//! position resolver has run, an absolute source position.

use serde::{Deserialize, Serialize};

use crate::ast::{Child, Kind, NativeNode, TreeNode};
use crate::role::RoleSet;

/// Absolute position of a node in its source text.
///
/// `offset` is a byte offset; `line` is 1-based; `column` uses the base the
/// resolver was configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedNode {
    pub kind: Kind,
    #[serde(default, skip_serializing_if = "RoleSet::is_empty")]
    pub roles: RoleSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<AnnotatedField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedField {
    pub role: String,
    pub value: AnnotatedChild,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotatedChild {
    Node(Box<AnnotatedNode>),
    List(Vec<AnnotatedNode>),
}

impl AnnotatedNode {
    /// Structural copy of a native subtree with empty role sets and no
    /// positions.
    pub fn from_native(native: &NativeNode) -> Self {
        let mut root = Self::shell(native);
        let mut stack = vec![(native, &mut root)];
        while let Some((native, target)) = stack.pop() {
            target.fields = native
                .fields
                .iter()
                .map(|field| AnnotatedField {
                    role: field.role.clone(),
                    value: match &field.value {
                        Child::Node(node) => AnnotatedChild::Node(Box::new(Self::shell(node))),
                        Child::List(nodes) => {
                            AnnotatedChild::List(nodes.iter().map(Self::shell).collect())
                        }
                    },
                })
                .collect();
            let sources = native.children().map(|(_, child)| child);
            let targets = target.children_mut().map(|(_, _, child)| child);
            stack.extend(sources.zip(targets));
        }
        root
    }

    /// Copy of a single native node without its fields.
    fn shell(native: &NativeNode) -> Self {
        Self {
            kind: native.kind.clone(),
            roles: RoleSet::new(),
            token: native.token.clone(),
            properties: native.properties.clone(),
            line: native.line,
            column: native.column,
            position: None,
            fields: Vec::new(),
        }
    }

    /// Immediate children in declared order, list fields flattened.
    pub fn children(&self) -> impl Iterator<Item = (&str, &AnnotatedNode)> + '_ {
        self.fields.iter().flat_map(|field| {
            let role = field.role.as_str();
            let nodes: Box<dyn Iterator<Item = &AnnotatedNode> + '_> = match &field.value {
                AnnotatedChild::Node(node) => Box::new(std::iter::once(node.as_ref())),
                AnnotatedChild::List(nodes) => Box::new(nodes.iter()),
            };
            nodes.map(move |node| (role, node))
        })
    }

    /// Mutable variant of [`children`](Self::children). The third element is
    /// the index inside a list field, `None` for single-node fields.
    pub(crate) fn children_mut(
        &mut self,
    ) -> impl Iterator<Item = (&str, Option<usize>, &mut AnnotatedNode)> + '_ {
        self.fields.iter_mut().flat_map(|field| {
            let role = field.role.as_str();
            let nodes: Box<dyn Iterator<Item = (Option<usize>, &mut AnnotatedNode)> + '_> =
                match &mut field.value {
                    AnnotatedChild::Node(node) => {
                        Box::new(std::iter::once((None, node.as_mut())))
                    }
                    AnnotatedChild::List(nodes) => {
                        Box::new(nodes.iter_mut().enumerate().map(|(i, n)| (Some(i), n)))
                    }
                };
            nodes.map(move |(index, node)| (role, index, node))
        })
    }

    pub fn child(&self, role: &str) -> Option<&AnnotatedNode> {
        self.children().find(|(r, _)| *r == role).map(|(_, n)| n)
    }

    /// All children reachable through `role`, in order.
    pub fn children_by_role<'a>(
        &'a self,
        role: &'a str,
    ) -> impl Iterator<Item = &'a AnnotatedNode> + 'a {
        self.children().filter(move |(r, _)| *r == role).map(|(_, n)| n)
    }

    /// Pre-order walk over the subtree, this node first.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    pub fn node_count(&self) -> usize {
        self.walk().count()
    }

    /// Length of the longest root-to-leaf path, counting nodes.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.children().map(|(_, child)| (child, depth + 1)));
        }
        deepest
    }

    /// Finds the first node in pre-order with the given kind.
    pub fn find_kind(&self, kind: &str) -> Option<&AnnotatedNode> {
        self.walk().find(|n| n.kind == kind)
    }
}

impl TreeNode for AnnotatedNode {
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

// Unlinks children onto a heap stack so dropping a deep tree does not
// recurse once per level.
impl Drop for AnnotatedNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.fields);
        while let Some(field) = stack.pop() {
            let nodes = match field.value {
                AnnotatedChild::Node(node) => vec![*node],
                AnnotatedChild::List(nodes) => nodes,
            };
            for mut node in nodes {
                stack.append(&mut node.fields);
            }
        }
    }
}

/// Pre-order iterator returned by [`AnnotatedNode::walk`].
pub struct Walk<'a> {
    stack: Vec<&'a AnnotatedNode>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a AnnotatedNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        let children: Vec<_> = node.children().map(|(_, c)| c).collect();
        self.stack.extend(children.into_iter().rev());
        Some(node)
    }
}
