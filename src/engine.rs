use std::sync::Arc;

use serde_json::Value;

use crate::annotate::Annotator;
use crate::ast::convert::{to_native_bounded, NativeSchema};
use crate::ast::{AnnotatedNode, NativeNode};
use crate::config::{Config, PositionConfig};
use crate::errors::{NormalizeError, StructuralError};
use crate::position::{PositionResolver, PositionWarning};
use crate::rules::Rule;

// ============================================================================
// OUTPUT TYPES
// ============================================================================

/// A fully normalized tree: roles attached and every node positioned.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub tree: AnnotatedNode,
    pub warnings: Vec<PositionWarning>,
}

// ============================================================================
// NORMALIZATION PIPELINE - annotate, then resolve positions
// ============================================================================

/// Annotation followed by position resolution, with one shared
/// configuration. Like [`Annotator`], cheap to clone and shareable.
///
/// # Examples
///
/// ```rust
/// use uastkit::ast::NativeNode;
/// use uastkit::engine::Normalizer;
/// use uastkit::role::Role;
/// use uastkit::rules::Rule;
///
/// let normalizer = Normalizer::new(Rule::on("Module").roles([Role::File]).build());
/// let out = normalizer
///     .normalize("pass\n", &NativeNode::new("Module").at(1, 0))
///     .unwrap();
/// assert_eq!(out.tree.roles.primary(), Some(&Role::File));
/// assert_eq!(out.tree.position.map(|p| p.offset), Some(0));
/// ```
#[derive(Debug, Clone)]
pub struct Normalizer {
    annotator: Annotator,
    resolver: PositionResolver,
    schema: Arc<NativeSchema>,
}

impl Normalizer {
    pub fn new(rules: impl Into<Arc<Rule>>) -> Self {
        Self::from_config(rules, &Config::default())
    }

    pub fn from_config(rules: impl Into<Arc<Rule>>, config: &Config) -> Self {
        Self {
            annotator: Annotator::with_config(rules, config.annotator),
            resolver: PositionResolver::new(config.positions),
            schema: Arc::new(config.native.clone()),
        }
    }

    /// Overrides only the position settings.
    pub fn with_positions(mut self, positions: PositionConfig) -> Self {
        self.resolver = PositionResolver::new(positions);
        self
    }

    pub fn annotator(&self) -> &Annotator {
        &self.annotator
    }

    pub fn normalize(
        &self,
        source: &str,
        native: &NativeNode,
    ) -> Result<Normalized, StructuralError> {
        let annotated = self.annotator.annotate(native)?;
        let resolved = self.resolver.resolve(source, annotated);
        Ok(Normalized {
            tree: resolved.tree,
            warnings: resolved.warnings,
        })
    }

    /// Converts a parser's JSON dump with the configured schema, then
    /// normalizes it.
    pub fn normalize_json(&self, source: &str, native: &Value) -> Result<Normalized, NormalizeError> {
        let native = to_native_bounded(native, &self.schema, self.annotator.config().max_depth)?;
        Ok(self.normalize(source, &native)?)
    }
}
