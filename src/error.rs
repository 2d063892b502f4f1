//! Error types for sable.

use thiserror::Error;

/// Result type alias using [`SableError`].
pub type Result<T> = std::result::Result<T, SableError>;

/// Broad category of a [`SableError`], used by statement executors to decide
/// how a failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed SQL text.
    Parse,
    /// Caller or planner bug: wrong context, bad offset, wrong type.
    Precondition,
    /// Required input is missing where it must be present.
    DegenerateInput,
    /// A batch entry point that has no implementation was reached.
    NotImplemented,
    /// Persisted hint or binding data could not be decoded.
    Storage,
    /// General execution failure.
    Execution,
}

/// Error types for sable operations.
#[derive(Debug, Error)]
pub enum SableError {
    // ==================== Parse Errors ====================
    /// Parse error with location information.
    #[error("Parse error at line {line}, column {col}: {message}")]
    ParseError {
        line: usize,
        col: usize,
        message: String,
    },

    /// Charset or collation not understood by the parser.
    #[error("Unsupported charset or collation: {0}")]
    UnsupportedCharset(String),

    // ==================== Precondition Errors ====================
    /// `VALUES(col)` offset does not address one of the supplied values.
    #[error("Session current insert values len {len} and column's offset {offset} don't match")]
    InsertValuesOffset { len: usize, offset: usize },

    /// Prepared parameter index past the end of the bound parameters.
    #[error("Prepared parameter index {index} out of range ({len} parameters bound)")]
    ParamIndexOutOfRange { len: usize, index: usize },

    /// Column index past the end of the input chunk.
    #[error("Column index {index} out of range ({num_columns} columns)")]
    ColumnIndexOutOfRange { index: usize, num_columns: usize },

    /// Type mismatch errors.
    #[error("Type error: expected {expected}, got {actual}")]
    TypeError { expected: String, actual: String },

    /// Statement shape differs from the shape the hints were captured from.
    #[error(
        "Hint shape mismatch: captured {expected_blocks} select blocks and {expected_tables} \
         tables, statement has {actual_blocks} select blocks and {actual_tables} tables"
    )]
    HintShapeMismatch {
        expected_blocks: usize,
        expected_tables: usize,
        actual_blocks: usize,
        actual_tables: usize,
    },

    // ==================== Degenerate Input Errors ====================
    /// Insert statement evaluated `VALUES(col)` but no row supplied a value.
    #[error("Session current insert values is nil")]
    InsertValuesAbsent,

    // ==================== Dispatch Errors ====================
    /// Batch evaluation requested from a function without a batch implementation.
    #[error("Vectorized {eval_type} evaluation not implemented for {function}")]
    NotImplemented {
        function: &'static str,
        eval_type: &'static str,
    },

    // ==================== Storage Errors ====================
    /// Serialized hint or binding data could not be decoded.
    #[error("Corrupted hint data: {0}")]
    CorruptedHints(String),

    /// Checksum validation failure.
    #[error("Checksum mismatch: {0}")]
    ChecksumError(String),

    /// Unsupported serialized format version.
    #[error("Unsupported hint format version: {version} (max supported: {max_supported})")]
    UnsupportedVersion { version: u32, max_supported: u32 },

    /// Arrow conversion failure.
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    // ==================== Execution Errors ====================
    /// General execution errors.
    #[error("Execution error: {0}")]
    ExecutionError(String),
}

impl SableError {
    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            SableError::ParseError { .. } | SableError::UnsupportedCharset(_) => ErrorKind::Parse,
            SableError::InsertValuesOffset { .. }
            | SableError::ParamIndexOutOfRange { .. }
            | SableError::ColumnIndexOutOfRange { .. }
            | SableError::TypeError { .. }
            | SableError::HintShapeMismatch { .. } => ErrorKind::Precondition,
            SableError::InsertValuesAbsent => ErrorKind::DegenerateInput,
            SableError::NotImplemented { .. } => ErrorKind::NotImplemented,
            SableError::CorruptedHints(_)
            | SableError::ChecksumError(_)
            | SableError::UnsupportedVersion { .. }
            | SableError::ArrowError(_) => ErrorKind::Storage,
            SableError::ExecutionError(_) => ErrorKind::Execution,
        }
    }

    /// Shorthand for a type mismatch between two displayable type names.
    pub(crate) fn type_error(expected: impl ToString, actual: impl ToString) -> Self {
        SableError::TypeError {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}
