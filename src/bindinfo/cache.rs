//! In-memory binding cache.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::hints_set::bind_hints;
use super::record::BindRecord;
use crate::error::Result;
use crate::parser::ast::Statement;
use crate::parser::{normalize, Parser};

type BindKey = (String, String);

/// Bindings keyed by `(db, normalized sql)`.
///
/// Safe to share between sessions; lookups take a read lock.
#[derive(Debug, Default)]
pub struct BindingCache {
    records: RwLock<HashMap<BindKey, Arc<BindRecord>>>,
}

impl BindingCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the binding for the record's key.
    ///
    /// Returns the record it replaced, if any. The db part of the key is
    /// lower-cased, as in every lookup.
    pub fn add(&self, record: BindRecord) -> Option<Arc<BindRecord>> {
        let key = (record.db.to_ascii_lowercase(), record.original_sql.clone());
        debug!(db = %key.0, sql = %key.1, "adding binding");
        self.records.write().insert(key, Arc::new(record))
    }

    /// Returns the active binding for `normalized` in `db`.
    #[must_use]
    pub fn get(&self, db: &str, normalized: &str) -> Option<Arc<BindRecord>> {
        let key = (db.to_ascii_lowercase(), normalized.to_string());
        self.records
            .read()
            .get(&key)
            .filter(|record| record.is_using())
            .cloned()
    }

    /// Marks the binding deleted. Returns false if there was no active binding.
    pub fn remove(&self, db: &str, normalized: &str) -> bool {
        let key = (db.to_ascii_lowercase(), normalized.to_string());
        let mut records = self.records.write();
        match records.get_mut(&key) {
            Some(record) if record.is_using() => {
                *record = Arc::new(record.deleted());
                debug!(db = %key.0, sql = %key.1, "binding marked deleted");
                true
            }
            _ => false,
        }
    }

    /// Drops deleted bindings, returning how many were dropped.
    pub fn purge_deleted(&self) -> usize {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|_, record| record.is_using());
        before - records.len()
    }

    /// All records, deleted ones included, for persistence.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<BindRecord>> {
        self.records.read().values().cloned().collect()
    }

    /// Number of records, deleted ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Parses `sql` and, if an active binding exists for it, returns the
    /// statement with the binding's hints applied.
    ///
    /// # Errors
    ///
    /// Returns parse errors for `sql`.
    pub fn match_binding(
        &self,
        parser: &Parser,
        db: &str,
        sql: &str,
        charset: &str,
        collation: &str,
    ) -> Result<Option<Statement>> {
        let Some((stmt, record)) = self.lookup(parser, db, sql, charset, collation)? else {
            return Ok(None);
        };
        Ok(Some(bind_hints(stmt, &record.hints)))
    }

    /// Like [`BindingCache::match_binding`], but refuses to bind onto a
    /// statement whose shape differs from the binding's.
    ///
    /// # Errors
    ///
    /// Returns parse errors for `sql`, or `HintShapeMismatch`.
    pub fn match_binding_strict(
        &self,
        parser: &Parser,
        db: &str,
        sql: &str,
        charset: &str,
        collation: &str,
    ) -> Result<Option<Statement>> {
        let Some((stmt, record)) = self.lookup(parser, db, sql, charset, collation)? else {
            return Ok(None);
        };
        record.hints.check_shape(&stmt)?;
        Ok(Some(bind_hints(stmt, &record.hints)))
    }

    fn lookup(
        &self,
        parser: &Parser,
        db: &str,
        sql: &str,
        charset: &str,
        collation: &str,
    ) -> Result<Option<(Statement, Arc<BindRecord>)>> {
        let stmt = parser.parse_one_stmt(sql, charset, collation)?;
        let normalized = normalize(sql)?;
        match self.get(db, &normalized) {
            Some(record) => {
                debug!(db, sql = %normalized, "binding hit");
                Ok(Some((stmt, record)))
            }
            None => Ok(None),
        }
    }
}
