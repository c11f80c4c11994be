// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Saved relocation profiles.

use std::str::FromStr;

use native_relocate_core::{PackageRelocator, RuleSet, SelectorError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ordered list of relocations applied in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RelocationProfile {
    /// Relocations in priority order; the first accepting one wins.
    #[serde(default)]
    pub relocations: Vec<RelocationSpec>,
}

impl RelocationProfile {
    /// Profile holding `relocations` in order.
    pub fn new(relocations: Vec<RelocationSpec>) -> Self {
        Self { relocations }
    }

    /// Whether the profile relocates nothing.
    pub fn is_empty(&self) -> bool {
        self.relocations.is_empty()
    }

    /// Append every rule of the profile to `rules`, keeping declaration order.
    ///
    /// Fails on the first relocation whose selectors do not compile; rules
    /// before it have already been appended.
    pub fn extend_rule_set(&self, rules: &mut RuleSet) -> Result<(), SelectorError> {
        for spec in &self.relocations {
            rules.push(spec.to_relocator()?);
        }
        Ok(())
    }

    /// Rule set holding the profile's relocations.
    pub fn to_rule_set(&self) -> Result<RuleSet, SelectorError> {
        let mut rules = RuleSet::new();
        self.extend_rule_set(&mut rules)?;
        Ok(rules)
    }
}

/// One package relocation, as written in a profile file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationSpec {
    /// Source package prefix, e.g. `org.jooq`.
    pub pattern: String,
    /// Target package prefix, e.g. `shaded.org.jooq`.
    pub shaded_pattern: String,
    /// Wildcard patterns a class must match to be relocated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<String>,
    /// Wildcard patterns excluded from relocation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<String>,
}

impl RelocationSpec {
    /// Relocate `pattern` to `shaded_pattern` without filters.
    pub fn new(pattern: impl Into<String>, shaded_pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            shaded_pattern: shaded_pattern.into(),
            includes: Vec::new(),
            excludes: Vec::new(),
        }
    }

    /// The rule this spec describes.
    pub fn to_relocator(&self) -> Result<PackageRelocator, SelectorError> {
        PackageRelocator::new(&self.pattern, &self.shaded_pattern)
            .with_includes(&self.includes)?
            .with_excludes(&self.excludes)
    }
}

/// Inline relocation that is not of the form `from=to`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid relocation `{0}`, expected <pattern>=<shaded-pattern>")]
pub struct ParseRelocationError(String);

impl FromStr for RelocationSpec {
    type Err = ParseRelocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((from, to)) if !from.trim().is_empty() && !to.trim().is_empty() => {
                Ok(Self::new(from.trim(), to.trim()))
            }
            _ => Err(ParseRelocationError(s.to_owned())),
        }
    }
}
