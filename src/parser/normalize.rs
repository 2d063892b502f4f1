//! SQL text normalization for binding lookup.

use pest::Parser;

use super::grammar::{to_parse_error, Rule, SqlParser};
use crate::error::Result;

/// Normalizes SQL text so that statements differing only in literals, hints,
/// comments, letter case, or spacing map to the same text.
///
/// Words are lower-cased, literals become `?`, comments and optimizer hints are
/// dropped, and trailing `;` tokens are removed. The remaining tokens are
/// joined by exactly one space whatever the source spacing was, so `a=1` and
/// `a = 1` normalize alike.
///
/// # Errors
///
/// Returns a `ParseError` if the text cannot be tokenized.
pub fn normalize(sql: &str) -> Result<String> {
    let pairs = SqlParser::parse(Rule::normalize_tokens, sql).map_err(to_parse_error)?;

    let mut tokens: Vec<String> = pairs
        .flatten()
        .filter_map(|pair| match pair.as_rule() {
            Rule::norm_string | Rule::norm_number => Some("?".to_string()),
            Rule::norm_word => Some(pair.as_str().to_ascii_lowercase()),
            Rule::norm_symbol => Some(pair.as_str().to_string()),
            _ => None,
        })
        .collect();

    while tokens.last().is_some_and(|t| t == ";") {
        tokens.pop();
    }
    Ok(tokens.join(" "))
}

/// Returns the digest of the normalized SQL as lowercase hex.
///
/// # Errors
///
/// Same as [`normalize`].
pub fn digest(sql: &str) -> Result<String> {
    let normalized = normalize(sql)?;
    Ok(format!("{:08x}", crc32fast::hash(normalized.as_bytes())))
}
