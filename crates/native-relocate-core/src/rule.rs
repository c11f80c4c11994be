// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Relocation rules and the ordered, first-match-wins [`RuleSet`].
//!
//! A rule is a capability pair: "can you rename this type?" and "rename it".
//! The engine never decides what gets relocated; it asks each rule in the
//! order the caller supplied and applies the first one that accepts.

use std::fmt;

use thiserror::Error;

/// Failure reported by a rule while answering a query.
///
/// Rule faults are not handled by the transformers: they abort the current
/// `process_resource` call and nothing is recorded for that resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("relocation rule failed for `{name}`: {reason}")]
pub struct RuleError {
    /// Type name that was being queried.
    pub name: String,
    /// Rule-supplied description of the fault.
    pub reason: String,
}

impl RuleError {
    /// Build an error for `name`.
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Decides whether and how to rename a fully-qualified type name.
///
/// Implementations must be deterministic within one call: the same input
/// name yields the same answer. The engine does not cache answers across
/// calls.
pub trait RelocationRule {
    /// Returns `true` when this rule renames `name`.
    fn can_relocate(&self, name: &str) -> Result<bool, RuleError>;

    /// Rename `name`. Only called after [`can_relocate`](Self::can_relocate)
    /// accepted it.
    fn relocate(&self, name: &str) -> Result<String, RuleError>;
}

impl<T: RelocationRule + ?Sized> RelocationRule for &T {
    fn can_relocate(&self, name: &str) -> Result<bool, RuleError> {
        (**self).can_relocate(name)
    }

    fn relocate(&self, name: &str) -> Result<String, RuleError> {
        (**self).relocate(name)
    }
}

impl<T: RelocationRule + ?Sized> RelocationRule for Box<T> {
    fn can_relocate(&self, name: &str) -> Result<bool, RuleError> {
        (**self).can_relocate(name)
    }

    fn relocate(&self, name: &str) -> Result<String, RuleError> {
        (**self).relocate(name)
    }
}

/// Returns the output of the first rule in `rules` that accepts `name`, or
/// `name` unchanged when none does.
pub fn relocate<R: RelocationRule>(rules: &[R], name: &str) -> Result<String, RuleError> {
    for rule in rules {
        if rule.can_relocate(name)? {
            return rule.relocate(name);
        }
    }
    Ok(name.to_owned())
}

/// Ordered sequence of relocation rules supplied by the caller.
#[derive(Default)]
pub struct RuleSet {
    rules: Vec<Box<dyn RelocationRule>>,
}

impl RuleSet {
    /// Create an empty rule set. An empty set relocates nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule; it is consulted after every rule already present.
    pub fn push<R: RelocationRule + 'static>(&mut self, rule: R) {
        self.rules.push(Box::new(rule));
    }

    /// Builder form of [`push`](Self::push).
    pub fn with<R: RelocationRule + 'static>(mut self, rule: R) -> Self {
        self.push(rule);
        self
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set holds no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First-match-wins lookup for `name`; see [`relocate`].
    pub fn relocate(&self, name: &str) -> Result<String, RuleError> {
        relocate(&self.rules, name)
    }
}

impl FromIterator<Box<dyn RelocationRule>> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Box<dyn RelocationRule>>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.rules.len())
            .finish()
    }
}
