//! Universal semantic roles.
//!
//! A [`Role`] describes what a node *means* independently of the syntax of the
//! language it came from. The vocabulary is closed so that downstream tools
//! can match on it exhaustively; [`Role::Custom`] is the escape hatch for
//! roles a rule table needs before they are added here.

use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

macro_rules! roles {
    ($($variant:ident),+ $(,)?) => {
        /// A semantic role tag.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Role {
            $($variant,)+
            /// A role outside the built-in vocabulary.
            Custom(String),
        }

        impl Role {
            /// Every built-in role, in declaration order.
            pub const BUILTIN: &'static [Role] = &[$(Role::$variant),+];

            pub fn as_str(&self) -> &str {
                match self {
                    $(Role::$variant => stringify!($variant),)+
                    Role::Custom(name) => name.as_str(),
                }
            }
        }
    };
}

roles! {
    Identifier,
    Qualified,
    Operator,
    Binary,
    Unary,
    Left,
    Right,
    Infix,
    Postfix,
    Bitwise,
    Boolean,
    Unsigned,
    LeftShift,
    RightShift,
    Or,
    Xor,
    And,
    Expression,
    Statement,
    Equal,
    Not,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Identical,
    Contains,
    Increment,
    Decrement,
    Negative,
    Positive,
    Dereference,
    TakeAddress,
    File,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Package,
    Declaration,
    Import,
    Pathname,
    Alias,
    Function,
    Body,
    Name,
    Receiver,
    Argument,
    Value,
    ArgsList,
    Base,
    Implements,
    Instance,
    Subtype,
    Subpackage,
    Module,
    Friend,
    World,
    If,
    Condition,
    Then,
    Else,
    Switch,
    Case,
    Default,
    For,
    Initialization,
    Update,
    Iterator,
    While,
    DoWhile,
    Break,
    Continue,
    Goto,
    Block,
    Scope,
    Return,
    Try,
    Catch,
    Finally,
    Throw,
    Assert,
    Call,
    Callee,
    Positional,
    Noop,
    Literal,
    Byte,
    ByteString,
    Character,
    List,
    Map,
    Null,
    Number,
    Regexp,
    Set,
    String,
    Tuple,
    Type,
    Entry,
    Key,
    Primitive,
    Assignment,
    This,
    Comment,
    Documentation,
    Whitespace,
    Incomplete,
    Unannotated,
    Visibility,
    Annotation,
    Anonymous,
    Enumeration,
    Arithmetic,
    Relational,
    Variable,
}

static ROLES_BY_NAME: Lazy<HashMap<&'static str, Role>> = Lazy::new(|| {
    Role::BUILTIN
        .iter()
        .map(|role| (role.as_str(), role.clone()))
        .collect()
});

impl Role {
    /// Creates a role outside the built-in vocabulary. Names that match a
    /// built-in role resolve to it instead.
    pub fn custom(name: impl Into<std::string::String>) -> Self {
        let name = name.into();
        ROLES_BY_NAME
            .get(name.as_str())
            .cloned()
            .unwrap_or(Role::Custom(name))
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Role::Custom(_))
    }
}

impl FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Role::custom(s))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = std::string::String::deserialize(deserializer)?;
        Ok(Role::custom(name))
    }
}

// ============================================================================
// ROLE SET
// ============================================================================

/// Ordered, duplicate-free collection of roles.
///
/// Insertion order is meaningful: the first role attached is the node's
/// primary classification. Roles are only ever added.
///
/// # Examples
///
/// ```rust
/// use uastkit::role::{Role, RoleSet};
/// let mut roles = RoleSet::new();
/// assert!(roles.insert(Role::Expression));
/// assert!(roles.insert(Role::Binary));
/// assert!(!roles.insert(Role::Expression));
/// assert_eq!(roles.primary(), Some(&Role::Expression));
/// assert_eq!(roles.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(Vec<Role>);

impl RoleSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Adds `role` unless already present. Returns `true` if it was new.
    pub fn insert(&mut self, role: Role) -> bool {
        if self.0.contains(&role) {
            return false;
        }
        self.0.push(role);
        true
    }

    /// Adds every role in order, skipping duplicates. Returns how many were new.
    pub fn extend<'a>(&mut self, roles: impl IntoIterator<Item = &'a Role>) -> usize {
        roles
            .into_iter()
            .filter(|role| self.insert((*role).clone()))
            .count()
    }

    pub fn contains(&self, role: &Role) -> bool {
        self.0.contains(role)
    }

    pub fn primary(&self) -> Option<&Role> {
        self.0.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Role> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Role] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a RoleSet {
    type Item = &'a Role;
    type IntoIter = std::slice::Iter<'a, Role>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        let mut set = RoleSet::new();
        for role in iter {
            set.insert(role);
        }
        set
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.0.iter().map(Role::as_str).collect();
        write!(f, "[{}]", names.join(", "))
    }
}
