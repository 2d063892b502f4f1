//! Input batch of rows stored column-wise.

use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;

use super::column::Column;
use crate::error::{Result, SableError};
use crate::types::Value;

/// A batch of `num_rows` rows. Every column has exactly `num_rows` rows.
///
/// A chunk may have rows but no columns, e.g. when a projection only uses
/// constants.
#[derive(Debug, Clone)]
pub struct Chunk {
    columns: Vec<Column>,
    num_rows: usize,
}

impl Chunk {
    /// Creates a chunk from equally long columns.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError` if the columns differ in length.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let num_rows = columns.first().map_or(0, Column::len);
        if let Some(bad) = columns.iter().position(|c| c.len() != num_rows) {
            return Err(SableError::ExecutionError(format!(
                "column {bad} has {} rows, expected {num_rows}",
                columns[bad].len()
            )));
        }
        Ok(Chunk { columns, num_rows })
    }

    /// Creates a chunk with `num_rows` rows and no columns.
    #[must_use]
    pub fn with_rows(num_rows: usize) -> Self {
        Chunk {
            columns: Vec::new(),
            num_rows,
        }
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the column at `index`.
    ///
    /// # Errors
    ///
    /// Returns `ColumnIndexOutOfRange` for a bad index.
    pub fn column(&self, index: usize) -> Result<&Column> {
        self.columns
            .get(index)
            .ok_or(SableError::ColumnIndexOutOfRange {
                index,
                num_columns: self.columns.len(),
            })
    }

    /// Consumes the chunk, returning its columns.
    #[must_use]
    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    /// Returns one row as values.
    #[must_use]
    pub fn row(&self, row: usize) -> Vec<Value> {
        self.columns.iter().map(|c| c.value(row)).collect()
    }

    /// Copies an Arrow record batch into a chunk.
    ///
    /// # Errors
    ///
    /// Returns `TypeError` for columns of an unsupported Arrow type.
    pub fn from_record_batch(batch: &RecordBatch) -> Result<Self> {
        let columns = batch
            .columns()
            .iter()
            .map(|array| Column::from_arrow(array.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Chunk {
            columns,
            num_rows: batch.num_rows(),
        })
    }

    /// Converts to an Arrow record batch with the given column names.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError` if the number of names does not match the
    /// number of columns, or an Arrow error if the batch cannot be built.
    pub fn to_record_batch(&self, names: &[&str]) -> Result<RecordBatch> {
        if names.len() != self.columns.len() {
            return Err(SableError::ExecutionError(format!(
                "{} names for {} columns",
                names.len(),
                self.columns.len()
            )));
        }
        let fields: Vec<Field> = names
            .iter()
            .zip(&self.columns)
            .map(|(name, column)| Field::new(*name, column.eval_type().to_arrow(), true))
            .collect();
        let arrays: Vec<ArrayRef> = self.columns.iter().map(Column::to_arrow).collect();
        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
    }
}
