//! uastkit Error Handling
//!
//! Three failure domains exist and each has its own type:
//!
//! - [`StructuralError`]: fatal, produced by a validation rule (or the depth
//!   guard). No tree is returned.
//! - [`ConvertError`]: the native JSON could not be turned into a tree.
//! - [`ConfigError`]: configuration could not be loaded or is invalid.
//!
//! Position problems are not errors; see [`crate::position::PositionWarning`].
//! All error types implement `miette::Diagnostic` with stable codes.

use miette::Diagnostic;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::ast::Kind;

// ============================================================================
// NODE PATHS
// ============================================================================

/// One step from a parent to a child: field role plus list index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub field: String,
    pub index: Option<usize>,
}

/// Location of a node relative to the root, rendered as `body[0].value`.
/// The root itself renders as `<root>`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodePath(Vec<PathSegment>);

impl NodePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub(crate) fn push(&mut self, field: &str, index: Option<usize>) {
        self.0.push(PathSegment {
            field: field.to_string(),
            index,
        });
    }

    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }

    /// Drops every segment past the first `len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&segment.field)?;
            if let Some(index) = segment.index {
                write!(f, "[{index}]")?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// STRUCTURAL ERRORS
// ============================================================================

/// Fatal annotation failure. Carries the rule's message verbatim.
///
/// # Examples
///
/// ```rust
/// use uastkit::ast::Kind;
/// use uastkit::errors::{NodePath, StructuralError};
/// let err = StructuralError::new("root must be of kind Module", Kind::new("Expression"), NodePath::root());
/// assert_eq!(err.to_string(), "root must be of kind Module");
/// assert_eq!(err.location(), "Expression at <root>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(
    code(uastkit::structural),
    help("the native tree violates a structural rule of the rule table; it was rejected as a whole")
)]
pub struct StructuralError {
    pub message: String,
    /// Kind of the node the rule fired on.
    pub kind: Kind,
    pub path: NodePath,
}

impl StructuralError {
    pub fn new(message: impl Into<String>, kind: Kind, path: NodePath) -> Self {
        Self {
            message: message.into(),
            kind,
            path,
        }
    }

    pub fn location(&self) -> String {
        format!("{} at {}", self.kind, self.path)
    }
}

// ============================================================================
// CONVERSION ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ConvertError {
    #[error("expected a JSON object for a node at {path}, found {found}")]
    #[diagnostic(code(uastkit::convert::not_an_object))]
    NotAnObject { path: String, found: &'static str },

    #[error("node at {path} has no `{key}` key")]
    #[diagnostic(
        code(uastkit::convert::missing_kind),
        help("every native node object must name its kind; check `native.kind_key` in the configuration")
    )]
    MissingKind { path: String, key: String },

    #[error("node at {path} has a non-string `{key}`")]
    #[diagnostic(code(uastkit::convert::invalid_kind))]
    InvalidKind { path: String, key: String },

    #[error("node at {path} has an invalid `{key}`: {value}")]
    #[diagnostic(
        code(uastkit::convert::invalid_position),
        help("line and column hints must be non-negative integers")
    )]
    InvalidPosition {
        path: String,
        key: String,
        value: String,
    },

    #[error("native tree exceeds the maximum depth of {max_depth} at {path}")]
    #[diagnostic(code(uastkit::convert::too_deep))]
    TooDeep { path: String, max_depth: usize },
}

// ============================================================================
// CONFIGURATION ERRORS
// ============================================================================

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read configuration file {}", path.display())]
    #[diagnostic(code(uastkit::config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML configuration")]
    #[diagnostic(code(uastkit::config::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON configuration")]
    #[diagnostic(code(uastkit::config::json))]
    Json(#[from] serde_json::Error),

    #[error("unsupported configuration format `{extension}`")]
    #[diagnostic(
        code(uastkit::config::format),
        help("use a .yaml, .yml or .json file")
    )]
    UnsupportedFormat { extension: String },

    #[error("invalid configuration value for `{field}`: {reason}")]
    #[diagnostic(code(uastkit::config::invalid))]
    Invalid { field: &'static str, reason: String },
}

/// Failure of the full JSON → annotated pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum NormalizeError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Structural(#[from] StructuralError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic;

    #[test]
    fn node_path_rendering() {
        let mut path = NodePath::root();
        assert_eq!(path.to_string(), "<root>");
        path.push("body", Some(2));
        path.push("value", None);
        assert_eq!(path.to_string(), "body[2].value");
        path.pop();
        assert_eq!(path.to_string(), "body[2]");
        path.push("args", Some(0));
        path.truncate(1);
        assert_eq!((path.len(), path.to_string()), (1, "body[2]".to_string()));
    }

    #[test]
    fn structural_error_has_code() {
        let err = StructuralError::new("boom", Kind::new("X"), NodePath::root());
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("uastkit::structural"));
    }

    #[test]
    fn normalize_error_is_transparent() {
        let err: NormalizeError = ConvertError::MissingKind {
            path: "<root>".into(),
            key: "ast_type".into(),
        }
        .into();
        assert_eq!(err.to_string(), "node at <root> has no `ast_type` key");
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("uastkit::convert::missing_kind"));
    }
}
