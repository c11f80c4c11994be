// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Relocation of class lists inside a native-image `Args` value.
//!
//! Only `--initialize-at-run-time=...` and `--initialize-at-build-time=...`
//! carry type names. Every other argument is copied verbatim.

use tracing::{debug, warn};

use crate::rule::{RuleError, RuleSet};

/// Flag whose value lists classes initialized at image run time.
pub const INITIALIZE_AT_RUN_TIME: &str = "--initialize-at-run-time";
/// Flag whose value lists classes initialized at image build time.
pub const INITIALIZE_AT_BUILD_TIME: &str = "--initialize-at-build-time";

const TYPE_LIST_FLAGS: [&str; 2] = [INITIALIZE_AT_RUN_TIME, INITIALIZE_AT_BUILD_TIME];

fn is_arg_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0b' | '\x0c' | '\r')
}

/// Split an `Args` value into tokens, one cut per whitespace character.
///
/// Consecutive separators produce empty tokens, which survive reassembly as
/// repeated spaces. Trailing empty tokens are dropped.
pub fn split_args(value: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = value.split(is_arg_separator).collect();
    while tokens.last().is_some_and(|t| t.is_empty()) {
        tokens.pop();
    }
    tokens
}

/// Whether `token` is a flag carrying a class list.
pub fn is_type_list_flag(token: &str) -> bool {
    TYPE_LIST_FLAGS.iter().any(|flag| token.starts_with(flag))
}

fn type_candidates(list: &str) -> Vec<&str> {
    if !list.contains(',') {
        return vec![list];
    }
    let mut candidates: Vec<&str> = list.split(',').collect();
    while candidates.last().is_some_and(|c| c.is_empty()) {
        candidates.pop();
    }
    candidates
}

/// Rewrite every class list in `value` through `rules`.
///
/// Returns `Ok(None)` when `value` holds no class-list flag, so the caller
/// can leave the property exactly as parsed. Otherwise returns the
/// reassembled value: tokens joined by single spaces, candidates joined by
/// commas. Each flag is written as `option=` followed by `candidate,` per
/// candidate with the final separator turned into the token separator,
/// which keeps output byte-compatible with existing descriptors.
pub fn rewrite_args(value: &str, rules: &RuleSet) -> Result<Option<String>, RuleError> {
    let mut out = String::with_capacity(value.len());
    let mut changed = false;
    for token in split_args(value) {
        if !is_type_list_flag(token) {
            out.push_str(token);
            out.push(' ');
            continue;
        }
        let Some((option, list)) = token.split_once('=') else {
            warn!(token, "class-list flag without a value, left untouched");
            out.push_str(token);
            out.push(' ');
            continue;
        };
        out.push_str(option);
        out.push('=');
        for candidate in type_candidates(list) {
            let candidate = candidate.trim_matches(|c: char| c <= ' ');
            let relocated = rules.relocate(candidate)?;
            if relocated != candidate {
                debug!(from = candidate, to = %relocated, "relocated initialization class");
            }
            out.push_str(&relocated);
            out.push(',');
        }
        out.pop();
        out.push(' ');
        changed = true;
    }
    if !changed {
        return Ok(None);
    }
    out.pop();
    Ok(Some(out))
}
