// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Package-prefix relocation rule, the common case for shaded jars.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use thiserror::Error;

use crate::rule::{RelocationRule, RuleError};

/// An include or exclude selector that is not a valid wildcard pattern.
#[derive(Debug, Error)]
#[error("invalid selector `{selector}`: {source}")]
pub struct SelectorError {
    /// Selector as given.
    pub selector: String,
    /// Pattern compiler failure.
    pub source: globset::Error,
}

/// Moves every class under `pattern` to `shaded_pattern`.
///
/// Patterns are dotted package prefixes (`org.jooq`); slash-separated input
/// (`org/jooq`) is normalized. Matching is a plain prefix test, so
/// `org.foo` also covers `org.foobar`, exactly like the packaging tool's
/// simple relocator.
///
/// `includes` and `excludes` narrow the match with wildcard selectors over
/// the class name, compared in path form (`org/jooq/impl/DSL`): `*` matches
/// within one segment, `**` matches across segments. An empty include list
/// includes everything.
#[derive(Debug, Clone)]
pub struct PackageRelocator {
    pattern: String,
    shaded_pattern: String,
    includes: GlobSet,
    excludes: GlobSet,
}

impl PackageRelocator {
    /// Relocate `pattern` to `shaded_pattern`.
    pub fn new(pattern: &str, shaded_pattern: &str) -> Self {
        Self {
            pattern: normalize(pattern),
            shaded_pattern: normalize(shaded_pattern),
            includes: GlobSet::empty(),
            excludes: GlobSet::empty(),
        }
    }

    /// Only relocate classes matching one of `includes`.
    pub fn with_includes<I, S>(mut self, includes: I) -> Result<Self, SelectorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.includes = compile_selectors(includes)?;
        Ok(self)
    }

    /// Never relocate classes matching one of `excludes`.
    pub fn with_excludes<I, S>(mut self, excludes: I) -> Result<Self, SelectorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excludes = compile_selectors(excludes)?;
        Ok(self)
    }

    /// Source package prefix.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn is_included(&self, path: &str) -> bool {
        self.includes.is_empty() || self.includes.is_match(path)
    }
}

impl RelocationRule for PackageRelocator {
    fn can_relocate(&self, name: &str) -> Result<bool, RuleError> {
        if name.contains('/') || !name.starts_with(&self.pattern) {
            return Ok(false);
        }
        let path = as_path(name);
        Ok(self.is_included(&path) && !self.excludes.is_match(&path))
    }

    fn relocate(&self, name: &str) -> Result<String, RuleError> {
        match name.strip_prefix(&self.pattern) {
            Some(rest) => Ok(format!("{}{rest}", self.shaded_pattern)),
            None => Err(RuleError::new(
                name,
                format!("not under package `{}`", self.pattern),
            )),
        }
    }
}

fn normalize(pattern: &str) -> String {
    pattern.trim().replace('/', ".")
}

fn as_path(name: &str) -> String {
    name.replace('.', "/")
}

fn compile_selectors<I, S>(selectors: I) -> Result<GlobSet, SelectorError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut builder = GlobSetBuilder::new();
    for selector in selectors {
        let selector = selector.as_ref();
        let glob = GlobBuilder::new(&as_path(&normalize(selector)))
            .literal_separator(true)
            .build()
            .map_err(|source| SelectorError {
                selector: selector.to_owned(),
                source,
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| SelectorError {
        selector: String::new(),
        source,
    })
}
