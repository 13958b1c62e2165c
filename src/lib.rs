//! # uastkit
//!
//! Normalizes language-specific syntax trees into a universal, role-tagged
//! tree. A declarative [`Rule`] table drives the [`Annotator`]; the
//! [`PositionResolver`] then maps line / column hints to byte offsets.
//! [`Normalizer`] runs both.

pub use crate::annotate::{annotate, Annotator};
pub use crate::ast::{AnnotatedNode, Kind, NativeNode, Position};
pub use crate::config::Config;
pub use crate::engine::{Normalized, Normalizer};
pub use crate::errors::{NormalizeError, StructuralError};
pub use crate::position::{resolve_positions, PositionResolver, PositionWarning};
pub use crate::role::{Role, RoleSet};
pub use crate::rules::Rule;

pub mod annotate;
pub mod ast;
pub mod config;
pub mod engine;
pub mod errors;
pub mod position;
pub mod role;
pub mod rules;

/// Everything needed to write a rule table.
pub mod prelude {
    pub use crate::role::Role;
    pub use crate::rules::predicate::{any, field_role, has_field, kind, not};
    pub use crate::rules::{Predicate, Rule};
}
