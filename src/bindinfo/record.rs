//! Persisted plan bindings.

use serde::{Deserialize, Serialize};

use super::codec;
use super::hints_set::{collect_hints, HintSet};
use crate::error::Result;
use crate::parser::{normalize, Parser};

const BIND_RECORD_MAGIC: &[u8; 4] = b"SBBR";

/// Lifecycle state of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindStatus {
    /// Applied to matching statements.
    Using,
    /// Dropped; kept until purged so the drop can be persisted.
    Deleted,
}

/// A plan binding: the hints of `bind_sql`, applied to statements whose
/// normalized text equals `original_sql`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindRecord {
    /// Normalized text of the statement being bound.
    pub original_sql: String,
    /// Hinted statement text the hints were taken from.
    pub bind_sql: String,
    /// Default database the binding applies in.
    pub db: String,
    pub status: BindStatus,
    pub charset: String,
    pub collation: String,
    /// Hints collected from `bind_sql`.
    pub hints: HintSet,
}

impl BindRecord {
    /// Creates an active binding.
    ///
    /// Both statements are parsed. The hinted statement must have the same
    /// number of SELECT blocks and base tables as the original, otherwise its
    /// hints could not be replayed by position.
    ///
    /// # Errors
    ///
    /// Returns parse errors from either statement, or `HintShapeMismatch` when
    /// the two statements differ in shape.
    pub fn new(
        parser: &Parser,
        original_sql: &str,
        bind_sql: &str,
        db: &str,
        charset: &str,
        collation: &str,
    ) -> Result<Self> {
        let original = parser.parse_one_stmt(original_sql, charset, collation)?;
        let hinted = parser.parse_one_stmt(bind_sql, charset, collation)?;
        let hints = collect_hints(&hinted);
        hints.check_shape(&original)?;

        Ok(BindRecord {
            original_sql: normalize(original_sql)?,
            bind_sql: bind_sql.to_string(),
            db: db.to_ascii_lowercase(),
            status: BindStatus::Using,
            charset: charset.to_string(),
            collation: collation.to_string(),
            hints,
        })
    }

    /// Returns true if the binding is active.
    #[must_use]
    pub fn is_using(&self) -> bool {
        self.status == BindStatus::Using
    }

    /// Returns a copy of this record marked deleted.
    #[must_use]
    pub fn deleted(&self) -> Self {
        BindRecord {
            status: BindStatus::Deleted,
            ..self.clone()
        }
    }

    /// Serializes the record for persistence.
    ///
    /// # Errors
    ///
    /// Returns `CorruptedHints` if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>> {
        codec::encode(BIND_RECORD_MAGIC, self)
    }

    /// Restores a record written by [`BindRecord::encode`].
    ///
    /// # Errors
    ///
    /// Returns `CorruptedHints`, `ChecksumError` or `UnsupportedVersion`
    /// when the bytes are not a valid encoding.
    pub fn decode(data: &[u8]) -> Result<Self> {
        codec::decode(BIND_RECORD_MAGIC, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SableError;

    #[test]
    fn test_new_collects_bind_hints() {
        let parser = Parser::new();
        let record = BindRecord::new(
            &parser,
            "SELECT * FROM t1 WHERE a = 1",
            "SELECT /*+ USE_INDEX(t1, idx_a) */ * FROM t1 WHERE a = 1",
            "Test",
            "utf8mb4",
            "utf8mb4_bin",
        )
        .unwrap();

        assert_eq!(record.original_sql, "select * from t1 where a = ?");
        assert_eq!(record.db, "test");
        assert!(record.is_using());
        assert!(record.hints.contains_table_hint("use_index"));
    }

    #[test]
    fn test_new_rejects_shape_mismatch() {
        let parser = Parser::new();
        let err = BindRecord::new(
            &parser,
            "SELECT * FROM t1",
            "SELECT /*+ HASH_JOIN(t1) */ * FROM t1 JOIN t2 ON t1.a = t2.a",
            "test",
            "",
            "",
        )
        .unwrap_err();
        assert!(matches!(err, SableError::HintShapeMismatch { .. }));
    }

    #[test]
    fn test_encode_decode() {
        let parser = Parser::new();
        let record = BindRecord::new(
            &parser,
            "SELECT a FROM t",
            "SELECT /*+ MAX_EXECUTION_TIME(100) */ a FROM t FORCE INDEX (i)",
            "test",
            "",
            "",
        )
        .unwrap()
        .deleted();

        let bytes = record.encode().unwrap();
        assert_eq!(&bytes[0..4], b"SBBR");
        let decoded = BindRecord::decode(&bytes).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.status, BindStatus::Deleted);

        // Hint-set bytes are not a record.
        assert!(BindRecord::decode(&record.hints.encode().unwrap()).is_err());
    }
}
