// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rich config error reporting.
//!
//! Figment reports deserialization problems as a flat error chain; this
//! module turns each entry into a [`ConfigError`] that miette can render
//! with a source snippet, and decorates unknown-key errors with a
//! did-you-mean suggestion picked by Jaro-Winkler similarity.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Similarity floor below which no correction is offered. Catches typos
/// like `log_leve` -> `log_level` or `page_siz` -> `page_size` without
/// suggesting unrelated keys.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// One reportable configuration problem.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(mesabot::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Closest valid key, when one is similar enough.
        suggestion: Option<String>,
        /// Comma-joined keys accepted in this section.
        valid_keys: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(mesabot::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(mesabot::config::missing_key),
        help("add `{key} = <value>` to your mesabot.toml")
    )]
    MissingKey { key: String },

    /// Produced by the semantic validation pass, not by deserialization.
    #[error("validation error: {message}")]
    #[diagnostic(code(mesabot::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(mesabot::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    if let Some(candidate) = suggestion {
        format!("did you mean `{candidate}`? Valid keys: {valid_keys}")
    } else {
        format!("valid keys: {valid_keys}")
    }
}

/// Explode a `figment::Error` (which chains every problem found during
/// extraction) into one [`ConfigError`] per problem.
///
/// `toml_sources` pairs each loaded file path with its raw content so
/// unknown-key errors can carry a span into the offending file.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|entry| match &entry.kind {
            Kind::UnknownField(field, accepted) => {
                let valid: Vec<&str> = accepted.to_vec();
                let (span, src) = locate(&entry, field, toml_sources);
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion: suggest_key(field, &valid),
                    valid_keys: valid.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: field.clone().into_owned(),
            },
            Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                key: dotted_path(&entry),
                detail: format!("found {actual}, expected {expected}"),
                expected: expected.to_string(),
                span: None,
                src: None,
            },
            _ => ConfigError::Other(entry.to_string()),
        })
        .collect()
}

fn dotted_path(entry: &figment::error::Error) -> String {
    entry
        .path
        .iter()
        .map(|segment| segment.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

/// Resolve the span and source snippet for a bad key, if the error can be
/// traced back to one of the loaded TOML files.
fn locate(
    entry: &figment::error::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let Some(path) = entry
        .metadata
        .as_ref()
        .and_then(|meta| meta.source.as_ref())
        .and_then(|source| match source {
            figment::Source::File(file) => Some(file.display().to_string()),
            _ => None,
        })
    else {
        return (None, None);
    };

    let Some((name, content)) = toml_sources
        .iter()
        .find(|(candidate, _)| *candidate == path)
    else {
        return (None, None);
    };

    let section: Vec<String> = entry.path.iter().map(|s| s.to_string()).collect();
    match find_key_offset(content, &section, field) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(name, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `field` within `content`, scoped to the `[section]`
/// header named by the first path segment (or the whole file for
/// top-level keys). Only matches the key position of a line, so a value
/// that merely mentions the word is not misattributed.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let scope_start = match path.first() {
        None => 0,
        Some(section) => {
            let header = format!("[{section}]");
            content.find(&header)? + header.len()
        }
    };

    let mut cursor = scope_start;
    for line in content[scope_start..].lines() {
        let key = line.trim_start();
        if let Some(rest) = key.strip_prefix(field) {
            let boundary = rest.starts_with('=') || rest.starts_with(' ') || rest.starts_with('\t');
            if boundary {
                return Some(cursor + (line.len() - key.len()));
            }
        }
        cursor += line.len() + 1;
    }
    None
}

/// Pick the valid key most similar to `unknown`, if any clears the
/// suggestion threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, key)| key.to_string())
}

/// Print every error to stderr through miette's graphical handler,
/// falling back to plain `Display` if rendering fails.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut rendered = String::new();
        match handler.render_report(&mut rendered, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{rendered}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}
