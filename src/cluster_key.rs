//! Clustering-key expression parsing.
//!
//! Warehouses report a table's clustering key as loosely formatted SQL text,
//! e.g. `LINEAR(ID, SUBSTRING("Region", 1, 3))`. [`parse_clustering_key`]
//! decomposes it into ordered segments, each naming one known column and the
//! expression wrapped around it (with the column abstracted to
//! [`NAME_PLACEHOLDER`]).
//!
//! The expression list is split on every comma outside a single-quoted
//! literal. A piece that names no known column is folded back, comma-joined,
//! into the previous segment's expression; this is what reassembles
//! `SUBSTRING(B,1,3)` after the split. Function names are never taken as
//! column references.
//! Nested commas in expressions that reference a column in a later argument
//! can therefore be misattributed; the parser stays best-effort and never
//! fails.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const NAME_PLACEHOLDER: &str = "${name}";

const LINEAR_KEYWORD: &str = "linear";

/// Single-quoted literals are matched so identifiers inside them are skipped;
/// [`split_pieces`] keeps each literal inside one piece.
static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"'(?:[^']|'')*'|(?:(?:"(?:[^"]|"")*"|[A-Za-z_][A-Za-z0-9_$]*)\s*\.\s*)*(?:"(?:[^"]|"")*"|[A-Za-z_][A-Za-z0-9_$]*)"#,
    )
    .expect("clustering key reference pattern is valid")
});

static IDENTIFIER_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:[^"]|"")*"|[A-Za-z_][A-Za-z0-9_$]*"#)
        .expect("identifier part pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyReference {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusteringKeySegment {
    pub clustering_key: Vec<KeyReference>,
    /// Wrapping expression with the column replaced by [`NAME_PLACEHOLDER`];
    /// empty for a bare column reference.
    pub expression: String,
}

impl ClusteringKeySegment {
    fn reference(name: &str, expression: String) -> Self {
        Self {
            clustering_key: vec![KeyReference {
                name: name.to_string(),
            }],
            expression,
        }
    }

    /// Rebuilds SQL text for the segment, quoting the column name.
    pub fn render(&self) -> String {
        let names = self
            .clustering_key
            .iter()
            .map(|key| format!("\"{}\"", key.name.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(", ");
        if self.expression.is_empty() {
            names
        } else {
            self.expression.replace(NAME_PLACEHOLDER, &names)
        }
    }
}

/// A column reference located inside one comma-separated piece.
struct ResolvedReference<'a> {
    column: &'a str,
    start: usize,
    end: usize,
}

/// Parses a clustering-key expression against the table's column names.
///
/// Returns `None` when the expression is absent or blank.
pub fn parse_clustering_key<S: AsRef<str>>(
    column_names: &[S],
    expression: Option<&str>,
) -> Option<Vec<ClusteringKeySegment>> {
    let trimmed = expression?.trim();
    if trimmed.is_empty() {
        return None;
    }

    let body = strip_enclosing_parentheses(strip_linear_keyword(trimmed));
    let mut segments: Vec<ClusteringKeySegment> = Vec::new();

    for piece in split_pieces(body) {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        match resolve_reference(column_names, piece) {
            Some(found) if found.start == 0 && found.end == piece.len() => {
                segments.push(ClusteringKeySegment::reference(found.column, String::new()));
            }
            Some(found) => {
                let wrapped = format!(
                    "{}{NAME_PLACEHOLDER}{}",
                    &piece[..found.start],
                    &piece[found.end..]
                );
                segments.push(ClusteringKeySegment::reference(found.column, wrapped));
            }
            None => match segments.last_mut() {
                Some(previous) => {
                    previous.expression.push(',');
                    previous.expression.push_str(piece);
                }
                None => debug!("Dropping clustering key text '{piece}' with no preceding column"),
            },
        }
    }

    Some(segments)
}

/// Splits on commas that are not inside a single-quoted literal.
fn split_pieces(body: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut in_literal = false;
    let mut start = 0;
    for (idx, ch) in body.char_indices() {
        match ch {
            '\'' => in_literal = !in_literal,
            ',' if !in_literal => {
                pieces.push(&body[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    pieces.push(&body[start..]);
    pieces
}

fn strip_linear_keyword(text: &str) -> &str {
    match text.get(..LINEAR_KEYWORD.len()) {
        Some(head) if head.eq_ignore_ascii_case(LINEAR_KEYWORD) => {
            let rest = text[LINEAR_KEYWORD.len()..].trim_start();
            if rest.starts_with('(') { rest } else { text }
        }
        _ => text,
    }
}

fn strip_enclosing_parentheses(text: &str) -> &str {
    text.strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
        .map(str::trim)
        .unwrap_or(text)
}

/// Finds the first identifier in `piece` that names a known column, skipping
/// literals and function names.
fn resolve_reference<'a, S: AsRef<str>>(
    column_names: &'a [S],
    piece: &str,
) -> Option<ResolvedReference<'a>> {
    REFERENCE_PATTERN.find_iter(piece).find_map(|candidate| {
        let text = candidate.as_str();
        if text.starts_with('\'') || piece[candidate.end()..].trim_start().starts_with('(') {
            return None;
        }
        let bare = bare_identifier(text)?;
        let column = column_names
            .iter()
            .map(AsRef::<str>::as_ref)
            .find(|name| name.eq_ignore_ascii_case(&bare))?;
        Some(ResolvedReference {
            column,
            start: candidate.start(),
            end: candidate.end(),
        })
    })
}

/// Strips `database.schema.` qualification and quoting from a reference.
fn bare_identifier(reference: &str) -> Option<String> {
    let last = IDENTIFIER_PART.find_iter(reference).last()?.as_str();
    match last
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
    {
        Some(quoted) => Some(quoted.replace("\"\"", "\"")),
        None => Some(last.to_string()),
    }
}
