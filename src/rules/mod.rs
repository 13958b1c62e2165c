//! # Annotation Rules
//!
//! A [`Rule`] pairs a [`Predicate`] with what happens when it matches. There
//! are exactly two categories of rule:
//!
//! - **Validation rules** (`Rule::on(p).error(msg)`) abort the whole
//!   annotation with a structural error. Within one scope they are checked
//!   first, in declaration order, and the first match wins.
//! - **Annotation rules** (`Rule::on(p).roles(..)`) attach roles and may open
//!   nested scopes: `on_self` (same node), `children` (immediate children)
//!   and `descendants` (every node below). Within one scope every matching
//!   annotation rule contributes, in declaration order.
//!
//! Rules are immutable once built and are meant to be constructed once and
//! shared (for example from a `once_cell::sync::Lazy` static).
//!
//! ```rust
//! use uastkit::role::Role;
//! use uastkit::rules::{predicate::{any, field_role, not}, Rule};
//!
//! let rules: Rule = Rule::on(any())
//!     .on_self([
//!         Rule::on(not("Module")).error("root must be of kind Module"),
//!         Rule::on("Module")
//!             .roles([Role::File, Role::Module])
//!             .descendants([Rule::on("BinOp")
//!                 .roles([Role::Expression, Role::Binary])
//!                 .children([
//!                     Rule::on(field_role("op")).roles([Role::Operator]).build(),
//!                     Rule::on(field_role("left")).roles([Role::Left]).build(),
//!                 ])
//!                 .build()])
//!             .build(),
//!     ])
//!     .build();
//! assert_eq!(rules.rule_count(), 6);
//! ```

pub mod predicate;

use serde::{Deserialize, Serialize};

use crate::role::Role;
pub use predicate::{matches, MatchContext, Predicate};

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub predicate: Predicate,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Abort annotation with this message.
    Validate { message: String },
    Annotate(Annotation),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default, rename = "self")]
    pub on_self: Vec<Rule>,
    #[serde(default)]
    pub children: Vec<Rule>,
    #[serde(default)]
    pub descendants: Vec<Rule>,
}

/// Builder returned by [`Rule::on`].
#[derive(Debug, Clone)]
#[must_use = "a rule builder does nothing until it is built"]
pub struct RuleBuilder {
    predicate: Predicate,
    annotation: Annotation,
}

// ============================================================================
// PUBLIC API IMPLEMENTATION
// ============================================================================

impl Rule {
    /// Starts a rule matching `predicate`. Plain strings are kind predicates.
    pub fn on(predicate: impl Into<Predicate>) -> RuleBuilder {
        RuleBuilder {
            predicate: predicate.into(),
            annotation: Annotation::default(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self.action, Action::Validate { .. })
    }

    pub fn annotation(&self) -> Option<&Annotation> {
        match &self.action {
            Action::Annotate(annotation) => Some(annotation),
            Action::Validate { .. } => None,
        }
    }

    /// Number of rules in this rule graph, including this one.
    pub fn rule_count(&self) -> usize {
        1 + self
            .annotation()
            .map(|a| a.scopes().flatten().map(Rule::rule_count).sum::<usize>())
            .unwrap_or(0)
    }

    /// Static checks over a rule table. Returns one finding per suspicious
    /// rule; an empty list means the table looks sound.
    pub fn lint(&self) -> Vec<RuleLint> {
        let mut findings = Vec::new();
        self.lint_into("root".to_string(), &mut findings);
        findings
    }

    fn lint_into(&self, path: String, findings: &mut Vec<RuleLint>) {
        match &self.action {
            Action::Validate { message } => {
                if message.trim().is_empty() {
                    findings.push(RuleLint {
                        path,
                        predicate: self.predicate.to_string(),
                        issue: LintIssue::EmptyMessage,
                    });
                }
            }
            Action::Annotate(annotation) => {
                if annotation.is_inert() {
                    findings.push(RuleLint {
                        path: path.clone(),
                        predicate: self.predicate.to_string(),
                        issue: LintIssue::NoEffect,
                    });
                }
                let mut seen: Vec<&Role> = Vec::new();
                for role in &annotation.roles {
                    if seen.contains(&role) {
                        findings.push(RuleLint {
                            path: path.clone(),
                            predicate: self.predicate.to_string(),
                            issue: LintIssue::DuplicateRole(role.clone()),
                        });
                    }
                    seen.push(role);
                }
                for (scope, rules) in annotation.named_scopes() {
                    for (i, rule) in rules.iter().enumerate() {
                        rule.lint_into(format!("{path}.{scope}[{i}]"), findings);
                    }
                }
            }
        }
    }
}

impl Annotation {
    fn scopes(&self) -> impl Iterator<Item = &Vec<Rule>> {
        [&self.on_self, &self.children, &self.descendants].into_iter()
    }

    fn named_scopes(&self) -> impl Iterator<Item = (&'static str, &Vec<Rule>)> {
        [
            ("self", &self.on_self),
            ("children", &self.children),
            ("descendants", &self.descendants),
        ]
        .into_iter()
    }

    /// No roles and no nested rules.
    pub fn is_inert(&self) -> bool {
        self.roles.is_empty() && self.scopes().all(|s| s.is_empty())
    }
}

impl RuleBuilder {
    /// Roles to attach on match, in order.
    pub fn roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.annotation.roles.extend(roles);
        self
    }

    /// Rules re-evaluated against the same node.
    pub fn on_self(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.annotation.on_self.extend(rules);
        self
    }

    /// Rules evaluated against each immediate child.
    pub fn children(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.annotation.children.extend(rules);
        self
    }

    /// Rules evaluated against every node below the matched one.
    pub fn descendants(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.annotation.descendants.extend(rules);
        self
    }

    /// Turns this into a validation rule. Roles and scopes collected so far
    /// are discarded; a validating rule only ever aborts.
    pub fn error(self, message: impl Into<String>) -> Rule {
        Rule {
            predicate: self.predicate,
            action: Action::Validate {
                message: message.into(),
            },
        }
    }

    pub fn build(self) -> Rule {
        Rule {
            predicate: self.predicate,
            action: Action::Annotate(self.annotation),
        }
    }
}

impl From<RuleBuilder> for Rule {
    fn from(builder: RuleBuilder) -> Self {
        builder.build()
    }
}

// ============================================================================
// LINTING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleLint {
    /// Location of the rule inside the table, e.g. `root.self[1].descendants[4]`.
    pub path: String,
    pub predicate: String,
    pub issue: LintIssue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintIssue {
    /// Annotation rule with no roles and no nested scopes.
    NoEffect,
    /// Validation rule with a blank message.
    EmptyMessage,
    DuplicateRole(Role),
}

impl std::fmt::Display for RuleLint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.issue {
            LintIssue::NoEffect => {
                write!(f, "{} ({}): rule has no effect", self.path, self.predicate)
            }
            LintIssue::EmptyMessage => write!(
                f,
                "{} ({}): validation rule has an empty message",
                self.path, self.predicate
            ),
            LintIssue::DuplicateRole(role) => write!(
                f,
                "{} ({}): role {} listed twice",
                self.path, self.predicate, role
            ),
        }
    }
}
