//! SQL parsing.
//!
//! The parser turns SQL text into the [`ast`] tree. Optimizer hints in
//! `/*+ ... */` comments are attached to their SELECT block and index hints
//! to their table name, so the hint machinery in [`crate::bindinfo`] can find
//! them with a plain tree walk ([`visit`]).

pub mod ast;
mod grammar;
mod normalize;
pub mod visit;

pub use grammar::parse_statement;
pub use normalize::{digest, normalize};

use crate::error::{Result, SableError};
use ast::Statement;

/// Character sets the parser accepts. Everything is decoded as UTF-8; the
/// charset only has to be one we know.
const SUPPORTED_CHARSETS: &[&str] = &["utf8mb4", "utf8", "latin1", "binary", "ascii"];

/// Parser handle.
///
/// Stateless apart from its defaults; one handle may be shared freely.
#[derive(Debug, Clone)]
pub struct Parser {
    default_charset: String,
    default_collation: String,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Creates a parser defaulting to `utf8mb4` / `utf8mb4_bin`.
    #[must_use]
    pub fn new() -> Self {
        Parser {
            default_charset: "utf8mb4".to_string(),
            default_collation: "utf8mb4_bin".to_string(),
        }
    }

    /// Returns the charset used when none is given.
    #[must_use]
    pub fn default_charset(&self) -> &str {
        &self.default_charset
    }

    /// Returns the collation used when none is given.
    #[must_use]
    pub fn default_collation(&self) -> &str {
        &self.default_collation
    }

    /// Parses exactly one statement.
    ///
    /// Empty `charset` or `collation` select the parser defaults.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedCharset` for an unknown charset or a collation that
    /// does not belong to it, and `ParseError` for malformed SQL.
    pub fn parse_one_stmt(&self, sql: &str, charset: &str, collation: &str) -> Result<Statement> {
        let charset = if charset.is_empty() {
            self.default_charset.as_str()
        } else {
            charset
        };
        let charset = charset.to_ascii_lowercase();
        if !SUPPORTED_CHARSETS.contains(&charset.as_str()) {
            return Err(SableError::UnsupportedCharset(charset));
        }
        if !collation.is_empty() {
            let collation = collation.to_ascii_lowercase();
            if collation != "binary" && !collation.starts_with(&format!("{charset}_")) {
                return Err(SableError::UnsupportedCharset(format!(
                    "collation {collation} for charset {charset}"
                )));
            }
        }
        parse_statement(sql)
    }
}
