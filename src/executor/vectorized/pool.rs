//! Free list of result columns.

use parking_lot::Mutex;
use tracing::trace;

use super::column::Column;
use crate::types::EvalType;

/// Recycles [`Column`] allocations between evaluation calls.
///
/// Columns come back with their old contents. Returning a column moves it
/// into the pool, so no caller keeps a handle to reused storage.
#[derive(Debug)]
pub struct ColumnPool {
    free: Mutex<Vec<Column>>,
    capacity: usize,
}

impl ColumnPool {
    /// Creates a pool holding at most `capacity` idle columns.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        ColumnPool {
            free: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    /// Takes a column of `eval_type`, reusing an idle one when available.
    ///
    /// A reused column has zero rows but keeps its previous buffers.
    pub fn get(&self, eval_type: EvalType, rows: usize) -> Column {
        match self.free.lock().pop() {
            Some(mut column) => {
                trace!(from = %column.eval_type(), to = %eval_type, "reusing pooled column");
                column.reset(eval_type);
                column
            }
            None => Column::new(eval_type, rows),
        }
    }

    /// Returns a column to the pool. Dropped if the pool is full.
    pub fn put(&self, column: Column) {
        let mut free = self.free.lock();
        if free.len() < self.capacity {
            free.push(column);
        }
    }

    /// Number of idle columns.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }
}
