// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Character substitution applied to message text before transmission.

use std::borrow::Cow;
use std::collections::BTreeMap;

use aho_corasick::{AhoCorasick, MatchKind};
use courier_core::CourierError;

pub use courier_core::stringify;

/// Replaces configured characters in a single pass over the text.
///
/// Every key is replaced with its value wherever it occurs. Replacements are
/// never rescanned, so the result does not depend on the table's order.
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    matcher: Option<AhoCorasick>,
    replacements: Vec<String>,
}

impl Sanitizer {
    /// Builds a sanitizer from a substitution table. Empty keys are ignored.
    pub fn new(mapping: &BTreeMap<String, String>) -> Result<Self, CourierError> {
        let (patterns, replacements): (Vec<&str>, Vec<String>) = mapping
            .iter()
            .filter(|(from, _)| !from.is_empty())
            .map(|(from, to)| (from.as_str(), to.clone()))
            .unzip();

        if patterns.is_empty() {
            return Ok(Self::default());
        }

        let matcher = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .build(&patterns)
            .map_err(|e| CourierError::Config(format!("invalid special_chars table: {e}")))?;

        Ok(Self {
            matcher: Some(matcher),
            replacements,
        })
    }

    /// Returns true when the table is empty.
    pub fn is_noop(&self) -> bool {
        self.matcher.is_none()
    }

    /// Applies the substitutions. Borrows the input when nothing matches.
    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match &self.matcher {
            Some(matcher) if matcher.is_match(text) => {
                Cow::Owned(matcher.replace_all(text, self.replacements.as_slice()))
            }
            _ => Cow::Borrowed(text),
        }
    }
}
