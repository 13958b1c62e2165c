//! Engine configuration.
//!
//! Every section has defaults, so an empty document is a valid
//! configuration. Files are YAML or JSON, chosen by extension:
//!
//! ```yaml
//! annotator:
//!   max_depth: 500
//! positions:
//!   column_base: 1
//! native:
//!   kind_key: ast_type
//!   promote_lists: true
//! ```

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ast::convert::NativeSchema;
use crate::errors::ConfigError;

/// Default nesting limit. Annotation, position resolution, conversion and
/// dropping all walk trees with explicit stacks; the derived `Clone`,
/// `PartialEq`, `Debug` and serde impls of the tree types still recurse, so
/// this stays low enough for them to run on a 2 MiB thread stack.
pub const DEFAULT_MAX_DEPTH: usize = 1_000;

/// Shared default configuration.
pub static DEFAULT_CONFIG: Lazy<Config> = Lazy::new(Config::default);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub annotator: AnnotatorConfig,
    pub positions: PositionConfig,
    pub native: NativeSchema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnnotatorConfig {
    /// Trees deeper than this, counted in nodes, are rejected before
    /// annotation and during JSON conversion.
    pub max_depth: usize,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PositionConfig {
    /// Value of the first column of a line: 0 for byte columns as emitted by
    /// Python's `ast`, 1 for editors-style columns.
    pub column_base: u32,
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self { column_base: 0 }
    }
}

impl Config {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a `.yaml`, `.yml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&text)?,
            "json" => Self::from_json_str(&text)?,
            _ => return Err(ConfigError::UnsupportedFormat { extension }),
        };
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.annotator.max_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "annotator.max_depth",
                reason: "must be greater than zero".into(),
            });
        }
        if self.positions.column_base > 1 {
            return Err(ConfigError::Invalid {
                field: "positions.column_base",
                reason: format!("must be 0 or 1, got {}", self.positions.column_base),
            });
        }
        if self.native.kind_key.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "native.kind_key",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}
