//! Positional hint capture and transfer.
//!
//! A [`HintSet`] records the hints of one statement by position: the i-th
//! table-hint list belongs to the i-th SELECT block met by
//! [`walk`](crate::parser::visit::walk), the j-th index-hint list to the j-th
//! base table. Nothing is matched by name, so the lists only mean something
//! when replayed onto a statement of the same shape.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::codec;
use crate::error::{Result, SableError};
use crate::parser::ast::{IndexHint, Statement, TableHint};
use crate::parser::visit::{walk, walk_mut, HintSite, HintSiteMut};
use crate::parser::Parser;

const HINT_SET_MAGIC: &[u8; 4] = b"SBHS";

/// Hints captured from one statement, keyed by traversal position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintSet {
    table_hints: Vec<Vec<TableHint>>,
    index_hints: Vec<Vec<IndexHint>>,
}

impl HintSet {
    /// Creates an empty hint set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a hint set from per-block and per-table lists.
    #[must_use]
    pub fn from_parts(table_hints: Vec<Vec<TableHint>>, index_hints: Vec<Vec<IndexHint>>) -> Self {
        HintSet {
            table_hints,
            index_hints,
        }
    }

    /// One list per SELECT block.
    #[must_use]
    pub fn table_hints(&self) -> &[Vec<TableHint>] {
        &self.table_hints
    }

    /// One list per base table.
    #[must_use]
    pub fn index_hints(&self) -> &[Vec<IndexHint>] {
        &self.index_hints
    }

    /// Hints of the outermost SELECT block, or an empty slice when the
    /// statement had no SELECT block.
    #[must_use]
    pub fn first_table_hints(&self) -> &[TableHint] {
        self.table_hints.first().map_or(&[], Vec::as_slice)
    }

    /// Returns true if any block carries a hint with exactly this name.
    ///
    /// Names are stored lower-cased, so the comparison is case-sensitive
    /// against the normalized form.
    #[must_use]
    pub fn contains_table_hint(&self, name: &str) -> bool {
        self.table_hints.iter().flatten().any(|hint| hint.name == name)
    }

    /// Checks that `stmt` has as many SELECT blocks and base tables as the
    /// statement these hints were captured from.
    ///
    /// # Errors
    ///
    /// Returns `HintShapeMismatch` with both sets of counts when they differ.
    pub fn check_shape(&self, stmt: &Statement) -> Result<()> {
        let (blocks, tables) = count_sites(stmt);
        if blocks == self.table_hints.len() && tables == self.index_hints.len() {
            return Ok(());
        }
        Err(SableError::HintShapeMismatch {
            expected_blocks: self.table_hints.len(),
            expected_tables: self.index_hints.len(),
            actual_blocks: blocks,
            actual_tables: tables,
        })
    }

    /// Serializes the hint set for persistence.
    ///
    /// # Errors
    ///
    /// Returns `CorruptedHints` if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>> {
        codec::encode(HINT_SET_MAGIC, self)
    }

    /// Restores a hint set written by [`HintSet::encode`].
    ///
    /// # Errors
    ///
    /// Returns `CorruptedHints`, `ChecksumError` or `UnsupportedVersion`
    /// when the bytes are not a valid encoding.
    pub fn decode(data: &[u8]) -> Result<Self> {
        codec::decode(HINT_SET_MAGIC, data)
    }
}

fn count_sites(stmt: &Statement) -> (usize, usize) {
    let mut blocks = 0;
    let mut tables = 0;
    walk(stmt, &mut |site| match site {
        HintSite::Select(_) => blocks += 1,
        HintSite::Table(_) => tables += 1,
    });
    (blocks, tables)
}

/// Captures the hints of every SELECT block and base table of `stmt`.
#[must_use]
pub fn collect_hints(stmt: &Statement) -> HintSet {
    let mut set = HintSet::new();
    walk(stmt, &mut |site| match site {
        HintSite::Select(select) => set.table_hints.push(select.hints.clone()),
        HintSite::Table(table) => set.index_hints.push(table.index_hints.clone()),
    });
    set
}

/// Replaces the hints of `stmt` with those in `hints`, by position.
///
/// Every SELECT block and base table is overwritten. Positions past the end of
/// the captured lists get no hints; captured lists past the end of the
/// statement are ignored.
#[must_use]
pub fn bind_hints(mut stmt: Statement, hints: &HintSet) -> Statement {
    let mut block = 0;
    let mut table = 0;
    walk_mut(&mut stmt, &mut |site| match site {
        HintSiteMut::Select(select) => {
            select.hints = hints.table_hints.get(block).cloned().unwrap_or_default();
            block += 1;
        }
        HintSiteMut::Table(name) => {
            name.index_hints = hints.index_hints.get(table).cloned().unwrap_or_default();
            table += 1;
        }
    });

    if block != hints.table_hints.len() || table != hints.index_hints.len() {
        debug!(
            captured_blocks = hints.table_hints.len(),
            captured_tables = hints.index_hints.len(),
            bound_blocks = block,
            bound_tables = table,
            "hint set shape differs from statement"
        );
    }
    stmt
}

/// Parses `sql` and collects its hints.
///
/// # Errors
///
/// Returns the parser's error unchanged.
pub fn parse_hints_set(parser: &Parser, sql: &str, charset: &str, collation: &str) -> Result<HintSet> {
    let stmt = parser.parse_one_stmt(sql, charset, collation)?;
    Ok(collect_hints(&stmt))
}
