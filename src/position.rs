//! # Position Resolution
//!
//! Turns the line / column hints carried by native nodes into absolute byte
//! offsets into the original source text.
//!
//! Lines are 1-based. Columns are byte columns counted from the configured
//! base ([`PositionConfig::column_base`], 0 by default as emitted by
//! Python's `ast`). `\n`, `\r\n` and a lone `\r` all end a line; a terminator
//! at the very end of the text does not open an extra line.
//!
//! A node without usable hints inherits the position of its nearest
//! positioned ancestor; unusable hints also record a [`PositionWarning`]. The
//! root falls back to the start of the text. Resolution never fails.
//!
//! ## Ordering
//!
//! Ancestor fallback takes precedence over pre-order monotonicity. A hint-less
//! node that follows a positioned sibling subtree, such as Python's `op` in
//! `f(x) + 1` or a synthetic list container, gets its ancestor's offset even
//! though an earlier node in pre-order sits further right. Offsets are
//! non-decreasing in pre-order only over nodes resolved from their own hints
//! (`line` set, no out-of-range warning), and only when the parser emitted
//! those hints in source order.

use miette::Diagnostic;
use thiserror::Error;

use crate::ast::{AnnotatedNode, Kind, Position};
use crate::config::PositionConfig;
use crate::errors::NodePath;

// ============================================================================
// LINE INDEX
// ============================================================================

/// Start offsets and lengths of every line of a source text.
///
/// # Examples
///
/// ```rust
/// use uastkit::position::LineIndex;
/// let index = LineIndex::new("a = 1\r\nb = 2\n");
/// assert_eq!(index.line_count(), 2);
/// assert_eq!(index.line_start(2), Some(7));
/// assert_eq!(index.offset(2, 4, 0), Some(11));
/// assert_eq!(index.line_col(11, 0), Some((2, 4)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Byte offset where each line starts; never empty.
    starts: Vec<usize>,
    /// Byte offset where each line's content ends, terminator excluded.
    ends: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let bytes = source.as_bytes();
        let mut starts = vec![0];
        let mut ends = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            let next = match bytes[i] {
                b'\n' => i + 1,
                b'\r' if bytes.get(i + 1) == Some(&b'\n') => i + 2,
                b'\r' => i + 1,
                _ => {
                    i += 1;
                    continue;
                }
            };
            ends.push(i);
            if next < bytes.len() {
                starts.push(next);
            }
            i = next;
        }
        if ends.len() < starts.len() {
            ends.push(bytes.len());
        }
        Self {
            starts,
            ends,
            len: bytes.len(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// Length of the indexed text in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Offset of the first byte of a 1-based line.
    pub fn line_start(&self, line: u32) -> Option<usize> {
        let index = (line as usize).checked_sub(1)?;
        self.starts.get(index).copied()
    }

    /// Length in bytes of a 1-based line, terminator excluded.
    pub fn line_len(&self, line: u32) -> Option<usize> {
        let index = (line as usize).checked_sub(1)?;
        Some(self.ends.get(index)? - self.starts[index])
    }

    /// Exact offset of `line:column`. `None` when the line does not exist or
    /// the column lies before `base` or past the end of the line.
    pub fn offset(&self, line: u32, column: u32, base: u32) -> Option<usize> {
        let start = self.line_start(line)?;
        let relative = column.checked_sub(base)? as usize;
        (relative <= self.line_len(line)?).then_some(start + relative)
    }

    /// Inverse of [`offset`](Self::offset). An offset inside a line
    /// terminator maps to the end of that line.
    pub fn line_col(&self, offset: usize, base: u32) -> Option<(u32, u32)> {
        if offset > self.len {
            return None;
        }
        let index = self.starts.partition_point(|&start| start <= offset) - 1;
        let column = offset.min(self.ends[index]) - self.starts[index];
        let line = u32::try_from(index + 1).ok()?;
        let column = u32::try_from(column).ok()?.checked_add(base)?;
        Some((line, column))
    }
}

// ============================================================================
// WARNINGS
// ============================================================================

/// Recoverable position problem. The affected node still received a
/// position; see each variant for which one.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum PositionWarning {
    /// The node inherited its nearest positioned ancestor's position.
    #[error("{kind} at {path}: line {line} is outside the source ({line_count} lines)")]
    #[diagnostic(code(uastkit::position::line_out_of_range), severity(Warning))]
    LineOutOfRange {
        path: NodePath,
        kind: Kind,
        line: u32,
        line_count: usize,
    },

    /// The node inherited its nearest positioned ancestor's position.
    #[error("{kind} at {path}: column {column} on line {line} is below the column base {base}")]
    #[diagnostic(code(uastkit::position::column_out_of_range), severity(Warning))]
    ColumnOutOfRange {
        path: NodePath,
        kind: Kind,
        line: u32,
        column: u32,
        base: u32,
    },

    /// The node kept its line and was moved to the end of it.
    #[error("{kind} at {path}: column {column} is past the end of line {line} ({line_len} bytes)")]
    #[diagnostic(code(uastkit::position::column_clamped), severity(Warning))]
    ColumnClamped {
        path: NodePath,
        kind: Kind,
        line: u32,
        column: u32,
        line_len: usize,
    },
}

impl PositionWarning {
    pub fn path(&self) -> &NodePath {
        match self {
            Self::LineOutOfRange { path, .. }
            | Self::ColumnOutOfRange { path, .. }
            | Self::ColumnClamped { path, .. } => path,
        }
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Output of a resolution pass: every node carries a position.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub tree: AnnotatedNode,
    pub warnings: Vec<PositionWarning>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PositionResolver {
    config: PositionConfig,
}

impl PositionResolver {
    pub fn new(config: PositionConfig) -> Self {
        Self { config }
    }

    pub fn resolve(&self, source: &str, mut tree: AnnotatedNode) -> Resolved {
        let index = LineIndex::new(source);
        let mut walk = ResolveWalk {
            index: &index,
            base: self.config.column_base,
            path: NodePath::root(),
            warnings: Vec::new(),
        };
        let origin = Position {
            offset: 0,
            line: 1,
            column: self.config.column_base,
        };
        walk.assign(&mut tree, origin);

        for warning in &walk.warnings {
            tracing::warn!(%warning, "position fallback");
        }
        tracing::debug!(
            lines = index.line_count(),
            nodes = tree.node_count(),
            warnings = walk.warnings.len(),
            "resolved positions"
        );
        Resolved {
            tree,
            warnings: walk.warnings,
        }
    }
}

/// Resolves with the default column base.
pub fn resolve_positions(source: &str, tree: AnnotatedNode) -> Resolved {
    PositionResolver::default().resolve(source, tree)
}

struct ResolveWalk<'a> {
    index: &'a LineIndex,
    base: u32,
    path: NodePath,
    warnings: Vec<PositionWarning>,
}

impl ResolveWalk<'_> {
    /// Pre-order over the whole tree with an explicit stack. Each entry
    /// holds the position its parent resolved to.
    fn assign(&mut self, root: &mut AnnotatedNode, origin: Position) {
        let root_position = self.position_of(root, origin);
        root.position = Some(root_position);
        let mut stack = Vec::new();
        push_children(&mut stack, root, 0, root_position);
        while let Some(Pending {
            depth,
            role,
            index,
            node,
            inherited,
        }) = stack.pop()
        {
            self.path.truncate(depth);
            self.path.push(role, index);
            let position = self.position_of(node, inherited);
            node.position = Some(position);
            push_children(&mut stack, node, depth + 1, position);
        }
        self.path.truncate(0);
    }

    fn position_of(&mut self, node: &AnnotatedNode, inherited: Position) -> Position {
        match node.line {
            Some(line) => self.locate(node, line).unwrap_or(inherited),
            None => inherited,
        }
    }

    fn locate(&mut self, node: &AnnotatedNode, line: u32) -> Option<Position> {
        let (Some(start), Some(line_len)) = (self.index.line_start(line), self.index.line_len(line))
        else {
            self.warnings.push(PositionWarning::LineOutOfRange {
                path: self.path.clone(),
                kind: node.kind.clone(),
                line,
                line_count: self.index.line_count(),
            });
            return None;
        };
        let Some(column) = node.column else {
            return Some(Position {
                offset: start,
                line,
                column: self.base,
            });
        };
        let Some(relative) = column.checked_sub(self.base) else {
            self.warnings.push(PositionWarning::ColumnOutOfRange {
                path: self.path.clone(),
                kind: node.kind.clone(),
                line,
                column,
                base: self.base,
            });
            return None;
        };
        let mut relative = relative as usize;
        if relative > line_len {
            self.warnings.push(PositionWarning::ColumnClamped {
                path: self.path.clone(),
                kind: node.kind.clone(),
                line,
                column,
                line_len,
            });
            relative = line_len;
        }
        Some(Position {
            offset: start + relative,
            line,
            column: self.base + relative as u32,
        })
    }
}

struct Pending<'a> {
    depth: usize,
    role: &'a str,
    index: Option<usize>,
    node: &'a mut AnnotatedNode,
    inherited: Position,
}

fn push_children<'a>(
    stack: &mut Vec<Pending<'a>>,
    node: &'a mut AnnotatedNode,
    depth: usize,
    inherited: Position,
) {
    let start = stack.len();
    stack.extend(node.children_mut().map(|(role, index, node)| Pending {
        depth,
        role,
        index,
        node,
        inherited,
    }));
    stack[start..].reverse();
}
