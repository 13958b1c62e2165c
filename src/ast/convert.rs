//! Native JSON → [`NativeNode`] conversion.
//!
//! Parsers for dynamic languages usually dump their AST as nested JSON
//! objects, one object per node, with the node kind stored under a fixed key
//! (`"ast_type"` for Python). [`NativeSchema`] names those keys and decides
//! how lists and scalars are mapped:
//!
//! - object values become child fields, `null` values are dropped;
//! - lists holding nodes become list fields, or, with `promote_lists`, a
//!   synthetic container node of kind `"<Kind>.<field>"` that holds the
//!   elements under the same field role;
//! - lists holding only scalars and scalar values become properties, unless
//!   `"<Kind>.<field>"` is listed in `promoted_properties`, in which case the
//!   scalar becomes a leaf node of that kind carrying the scalar as token;
//! - the first scalar found under one of `token_keys` becomes the token,
//!   falling back to `synthetic_tokens[kind]`.
//!
//! Empty lists produce nothing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::ast::{Child, Field, Kind, NativeNode};
use crate::config::DEFAULT_MAX_DEPTH;
use crate::errors::{ConvertError, NodePath};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NativeSchema {
    pub kind_key: String,
    pub line_key: String,
    pub column_key: String,
    /// Candidate token keys, in priority order.
    pub token_keys: Vec<String>,
    pub promote_lists: bool,
    /// `"<Kind>.<field>"` entries whose scalar value becomes a leaf node.
    pub promoted_properties: Vec<String>,
    /// Token for nodes that carry none of their own, keyed by kind.
    pub synthetic_tokens: BTreeMap<String, String>,
}

impl Default for NativeSchema {
    fn default() -> Self {
        Self {
            kind_key: "ast_type".into(),
            line_key: "lineno".into(),
            column_key: "col_offset".into(),
            token_keys: ["id", "name", "attr", "arg", "s", "n", "module", "asname"]
                .into_iter()
                .map(String::from)
                .collect(),
            promote_lists: true,
            promoted_properties: Vec::new(),
            synthetic_tokens: BTreeMap::new(),
        }
    }
}

impl NativeSchema {
    fn is_promoted(&self, kind: &str, field: &str) -> bool {
        self.promoted_properties
            .iter()
            .any(|entry| entry.split_once('.') == Some((kind, field)))
    }
}

/// Converts a JSON tree using [`DEFAULT_MAX_DEPTH`] as the nesting limit.
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
/// use uastkit::ast::convert::{to_native, NativeSchema};
/// let json = json!({
///     "ast_type": "Module",
///     "body": [{"ast_type": "Pass", "lineno": 1, "col_offset": 0}]
/// });
/// let module = to_native(&json, &NativeSchema::default()).unwrap();
/// let body = module.child("body").unwrap();
/// assert_eq!(body.kind, "Module.body");
/// assert_eq!(body.child("body").unwrap().line, Some(1));
/// ```
pub fn to_native(value: &Value, schema: &NativeSchema) -> Result<NativeNode, ConvertError> {
    to_native_bounded(value, schema, DEFAULT_MAX_DEPTH)
}

/// Converts a JSON tree, rejecting nesting deeper than `max_depth` nodes.
/// Promoted list containers count as one level.
pub fn to_native_bounded(
    value: &Value,
    schema: &NativeSchema,
    max_depth: usize,
) -> Result<NativeNode, ConvertError> {
    let mut converter = Converter {
        schema,
        max_depth,
        path: NodePath::root(),
    };
    let node = converter.convert(value)?;
    tracing::debug!(nodes = node.node_count(), "converted native tree");
    Ok(node)
}

struct Converter<'a> {
    schema: &'a NativeSchema,
    max_depth: usize,
    path: NodePath,
}

/// A JSON object waiting to be converted into an already allocated node.
struct Task<'v, 't> {
    value: &'v Value,
    target: &'t mut NativeNode,
    depth: usize,
    /// Length of the parent's path.
    path_len: usize,
    segment: Option<(&'v str, Option<usize>)>,
}

/// What remains to be converted below one field of a node.
enum Pending<'v> {
    Done,
    Node(&'v str, &'v Value),
    /// One entry per list element; `None` for elements already built.
    Elements(&'v str, Vec<Option<(usize, &'v Value)>>),
}

impl Converter<'_> {
    /// Converts nodes in pre-order from an explicit stack, so the first
    /// error in document order is the one reported.
    fn convert<'v>(&mut self, value: &'v Value) -> Result<NativeNode, ConvertError> {
        let mut root = NativeNode::new("");
        let mut stack = vec![Task {
            value,
            target: &mut root,
            depth: 1,
            path_len: 0,
            segment: None,
        }];
        while let Some(Task {
            value,
            target,
            depth,
            path_len,
            segment,
        }) = stack.pop()
        {
            self.path.truncate(path_len);
            if let Some((key, index)) = segment {
                self.path.push(key, index);
            }
            let pending = self.node(value, target, depth)?;

            let path_len = self.path.len();
            let nested = if self.schema.promote_lists { 2 } else { 1 };
            let start = stack.len();
            for (field, pending) in target.fields.iter_mut().zip(pending) {
                match (pending, &mut field.value) {
                    (Pending::Node(key, value), Child::Node(child)) => stack.push(Task {
                        value,
                        target: child.as_mut(),
                        depth: depth + 1,
                        path_len,
                        segment: Some((key, None)),
                    }),
                    (Pending::Elements(key, items), child) => {
                        let elements = match child {
                            Child::List(elements) => elements,
                            Child::Node(container) => match container.fields.first_mut() {
                                Some(Field {
                                    value: Child::List(elements),
                                    ..
                                }) => elements,
                                _ => continue,
                            },
                        };
                        for (element, item) in elements.iter_mut().zip(items) {
                            if let Some((index, value)) = item {
                                stack.push(Task {
                                    value,
                                    target: element,
                                    depth: depth + nested,
                                    path_len,
                                    segment: Some((key, Some(index))),
                                });
                            }
                        }
                    }
                    _ => {}
                }
            }
            stack[start..].reverse();
        }
        Ok(root)
    }

    /// Fills `node` from one JSON object. Child objects get empty
    /// placeholder nodes, returned as pending work in field order.
    fn node<'v>(
        &mut self,
        value: &'v Value,
        node: &mut NativeNode,
        depth: usize,
    ) -> Result<Vec<Pending<'v>>, ConvertError> {
        if depth > self.max_depth {
            return Err(ConvertError::TooDeep {
                path: self.path.to_string(),
                max_depth: self.max_depth,
            });
        }
        let Value::Object(object) = value else {
            return Err(ConvertError::NotAnObject {
                path: self.path.to_string(),
                found: json_type(value),
            });
        };

        let schema = self.schema;
        let kind = self.kind(object)?;
        node.kind = kind.clone();
        node.line = self.position(object, &schema.line_key)?;
        node.column = self.position(object, &schema.column_key)?;

        let token_key = schema
            .token_keys
            .iter()
            .find(|key| object.get(key.as_str()).and_then(scalar_text).is_some());
        node.token = match token_key {
            Some(key) => object.get(key.as_str()).and_then(scalar_text),
            None => schema.synthetic_tokens.get(kind.as_str()).cloned(),
        };

        let mut pending = Vec::new();
        for (key, value) in object {
            if *key == schema.kind_key
                || *key == schema.line_key
                || *key == schema.column_key
                || Some(key) == token_key
            {
                continue;
            }
            if let Some(field) = self.field(node, &kind, key, value) {
                pending.push(field);
            }
        }
        Ok(pending)
    }

    /// Adds one JSON member to `node`. Returns `None` when no field was
    /// pushed (nulls, empty lists and properties).
    fn field<'v>(
        &self,
        node: &mut NativeNode,
        kind: &Kind,
        key: &'v str,
        value: &'v Value,
    ) -> Option<Pending<'v>> {
        match value {
            Value::Null => None,
            Value::Object(_) => {
                node.fields.push(Field {
                    role: key.to_string(),
                    value: Child::Node(Box::new(NativeNode::new(""))),
                });
                Some(Pending::Node(key, value))
            }
            Value::Array(items) if items.is_empty() => None,
            Value::Array(items) if !items.iter().any(Value::is_object) => {
                node.properties.push((key.to_string(), value.to_string()));
                None
            }
            Value::Array(items) => {
                let element_kind = Kind::new(format!("{kind}.{key}"));
                let mut elements = Vec::with_capacity(items.len());
                let mut pending = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    if item.is_null() {
                        continue;
                    }
                    match scalar_text(item) {
                        Some(text) => {
                            elements.push(NativeNode::new(element_kind.clone()).with_token(text));
                            pending.push(None);
                        }
                        None => {
                            elements.push(NativeNode::new(""));
                            pending.push(Some((index, item)));
                        }
                    }
                }
                let value = if self.schema.promote_lists {
                    let mut container = NativeNode::new(element_kind);
                    container.fields.push(Field {
                        role: key.to_string(),
                        value: Child::List(elements),
                    });
                    Child::Node(Box::new(container))
                } else {
                    Child::List(elements)
                };
                node.fields.push(Field {
                    role: key.to_string(),
                    value,
                });
                Some(Pending::Elements(key, pending))
            }
            scalar => {
                let text = scalar_text(scalar).unwrap_or_default();
                if self.schema.is_promoted(kind.as_str(), key) {
                    let leaf = NativeNode::new(format!("{kind}.{key}")).with_token(text);
                    node.fields.push(Field {
                        role: key.to_string(),
                        value: Child::Node(Box::new(leaf)),
                    });
                    Some(Pending::Done)
                } else {
                    node.properties.push((key.to_string(), text));
                    None
                }
            }
        }
    }

    fn kind(&self, object: &Map<String, Value>) -> Result<Kind, ConvertError> {
        let key = &self.schema.kind_key;
        match object.get(key.as_str()) {
            Some(Value::String(name)) => Ok(Kind::new(name.as_str())),
            Some(_) => Err(ConvertError::InvalidKind {
                path: self.path.to_string(),
                key: key.clone(),
            }),
            None => Err(ConvertError::MissingKind {
                path: self.path.to_string(),
                key: key.clone(),
            }),
        }
    }

    fn position(&self, object: &Map<String, Value>, key: &str) -> Result<Option<u32>, ConvertError> {
        match object.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| ConvertError::InvalidPosition {
                    path: self.path.to_string(),
                    key: key.to_string(),
                    value: value.to_string(),
                }),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
