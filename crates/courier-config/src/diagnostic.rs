// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Startup diagnostics for configuration errors.
//!
//! Figment reports unknown keys, missing keys and type mismatches; this
//! module turns each of them into a miette report. Unknown keys are located
//! in the TOML text they came from and get a closest-match hint.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a known key needs to be offered as a hint.
const HINT_MIN_SCORE: f64 = 0.75;

/// One problem found while loading or validating `courier.toml`.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(code(courier::config::unknown_key), help("{}", unknown_key_hint(suggestion.as_deref(), valid_keys)))]
    UnknownKey {
        key: String,
        /// Closest known key, when one is similar enough.
        suggestion: Option<String>,
        /// Known keys of the enclosing table, comma separated.
        valid_keys: String,
        #[label("not a known key here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: {detail}")]
    #[diagnostic(code(courier::config::invalid_type), help("use a value of type {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    #[error("`{key}` is required")]
    #[diagnostic(code(courier::config::missing_key), help("set `{key}` in courier.toml"))]
    MissingKey { key: String },

    /// A value that deserialized but is not usable (see `validation`).
    #[error("invalid configuration: {message}")]
    #[diagnostic(code(courier::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(courier::config::other))]
    Other(String),
}

fn unknown_key_hint(suggestion: Option<&str>, valid_keys: &str) -> String {
    let known = if valid_keys.is_empty() {
        "this table takes no keys".to_string()
    } else {
        format!("known keys: {valid_keys}")
    };
    match suggestion {
        Some(s) => format!("did you mean `{s}`? {known}"),
        None => known,
    }
}

/// Splits a figment error into one diagnostic per underlying error.
///
/// `toml_sources` holds `(path, content)` pairs used to place unknown keys.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| diagnose(&error, toml_sources))
        .collect()
}

fn diagnose(error: &figment::Error, toml_sources: &[(String, String)]) -> ConfigError {
    match &error.kind {
        Kind::UnknownField(field, expected) => {
            let (span, src) = find_source_span(error, field, toml_sources);
            ConfigError::UnknownKey {
                key: field.to_string(),
                suggestion: suggest_key(field, expected),
                valid_keys: expected.join(", "),
                span,
                src,
            }
        }
        Kind::MissingField(field) => ConfigError::MissingKey {
            key: dotted_key(error, field),
        },
        Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
            key: error.path.join("."),
            detail: format!("found {actual}, expected {expected}"),
            expected: expected.clone(),
        },
        _ => ConfigError::Other(error.to_string()),
    }
}

/// Joins the error path and the field into `section.key` form. Only for
/// missing fields: an unknown field's path already ends with the field.
fn dotted_key(error: &figment::error::Error, field: &str) -> String {
    if error.path.is_empty() {
        field.to_string()
    } else {
        format!("{}.{field}", error.path.join("."))
    }
}

/// Find the source span of an unknown key in the TOML file it came from.
fn find_source_span(
    error: &figment::error::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let source_path = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    // Inline sources carry no file metadata; fall back to the only source.
    let source = match source_path {
        Some(path) => toml_sources.iter().find(|(p, _)| *p == path),
        None if toml_sources.len() == 1 => toml_sources.first(),
        None => None,
    };

    if let Some((path, content)) = source {
        let table = match error.path.split_last() {
            Some((last, table)) if last == field => table,
            _ => error.path.as_slice(),
        };
        if let Some(offset) = find_key_offset(content, table, field) {
            let span = SourceSpan::new(offset.into(), field.len());
            return (Some(span), Some(NamedSource::new(path, content.clone())));
        }
    }

    (None, None)
}

/// Find the byte offset of a key in TOML content, relative to a section path.
///
/// Section headers are matched on their leading path segment, so a key under
/// `[[stores]]` or `[supported_backends.kannel]` is found after the first
/// header of that section. Top-level keys are searched from the start.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let mut offset = 0;
    let mut in_section = path.is_empty();

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') {
            let header = trimmed.trim_matches(|c: char| c == '[' || c == ']' || c.is_whitespace());
            in_section = match path.first() {
                Some(section) => header.split('.').next() == Some(section.as_str()),
                None => false,
            };
        } else if in_section {
            let is_key = trimmed
                .strip_prefix(field)
                .is_some_and(|after| after.starts_with([' ', '=', '\t']));
            if is_key {
                return Some(offset + (line.len() - trimmed.len()));
            }
        }
        offset += line.len();
    }

    None
}

/// Closest key in `valid_keys` by Jaro-Winkler similarity, if any is
/// similar enough to be a plausible typo.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    let mut best: Option<(f64, &str)> = None;
    for &key in valid_keys {
        let score = strsim::jaro_winkler(unknown, key);
        if score > HINT_MIN_SCORE && best.is_none_or(|(top, _)| score > top) {
            best = Some((score, key));
        }
    }
    best.map(|(_, key)| key.to_string())
}

/// Prints every error to stderr as a miette report, followed by a count.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
    if errors.len() > 1 {
        eprintln!("courier: {} configuration errors", errors.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggest_chunk_size_for_typo() {
        let valid = &["chunk_size", "poll_interval_ms", "request_timeout_secs"];
        assert_eq!(
            suggest_key("chunk_szie", valid),
            Some("chunk_size".to_string())
        );
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        let valid = &["chunk_size", "poll_interval_ms"];
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn find_key_offset_in_section() {
        let content = "[dispatch]\nchunk_szie = 10\n";
        let path = vec!["dispatch".to_string()];
        let o = find_key_offset(content, &path, "chunk_szie").unwrap();
        assert_eq!(&content[o..o + 10], "chunk_szie");
    }

    #[test]
    fn find_key_offset_in_nested_table_header() {
        let content = "[log]\nlevel = \"info\"\n\n[supported_backends.kannel]\nidentity_regex = \"x\"\n";
        let path = vec!["supported_backends".to_string(), "kannel".to_string()];
        let o = find_key_offset(content, &path, "identity_regex").unwrap();
        assert_eq!(&content[o..o + 14], "identity_regex");
    }

    #[test]
    fn find_key_offset_ignores_other_sections() {
        let content = "[log]\nchunk_size = 1\n[dispatch]\nchunk_size = 2\n";
        let path = vec!["dispatch".to_string()];
        let o = find_key_offset(content, &path, "chunk_size").unwrap();
        assert!(o > content.find("[dispatch]").unwrap());
    }
}
