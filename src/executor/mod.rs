//! Batch evaluation of expression lists.
//!
//! [`ExpressionExecutor`] feeds chunks through expressions and hands back
//! result columns drawn from a shared [`ColumnPool`].

pub mod vectorized;

use std::sync::Arc;

use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::expression::{EvalContext, Expression};

use self::vectorized::{Chunk, Column, ColumnPool, DEFAULT_BATCH_SIZE};

/// Default number of idle columns kept by the pool.
pub const DEFAULT_POOL_CAPACITY: usize = 64;

/// Configuration for the expression executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum rows per batch when splitting Arrow input.
    pub batch_size: usize,
    /// Maximum idle columns kept for reuse.
    pub pool_capacity: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

impl ExecutorConfig {
    /// Creates a new executor configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the batch size. Zero is treated as one.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the pool capacity.
    #[must_use]
    pub fn with_pool_capacity(mut self, pool_capacity: usize) -> Self {
        self.pool_capacity = pool_capacity;
        self
    }
}

/// Evaluates expressions over chunks.
#[derive(Debug)]
pub struct ExpressionExecutor {
    config: ExecutorConfig,
    pool: Arc<ColumnPool>,
}

impl Default for ExpressionExecutor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

impl ExpressionExecutor {
    /// Creates an executor with its own column pool.
    #[must_use]
    pub fn new(config: ExecutorConfig) -> Self {
        let pool = Arc::new(ColumnPool::new(config.pool_capacity));
        Self { config, pool }
    }

    /// Creates an executor sharing an existing pool.
    #[must_use]
    pub fn with_pool(config: ExecutorConfig, pool: Arc<ColumnPool>) -> Self {
        Self { config, pool }
    }

    /// Returns the executor configuration.
    #[must_use]
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    #[must_use]
    pub fn pool(&self) -> &Arc<ColumnPool> {
        &self.pool
    }

    /// Evaluates each expression over `input`, one result column each.
    ///
    /// # Errors
    ///
    /// Returns the first evaluation error unchanged. Columns already produced
    /// go back to the pool.
    pub fn execute(&self, ctx: &EvalContext, exprs: &[Expression], input: &Chunk) -> Result<Vec<Column>> {
        let mut results = Vec::with_capacity(exprs.len());
        for expr in exprs {
            let mut column = self.pool.get(expr.eval_type(), input.num_rows());
            if let Err(e) = expr.vec_eval(ctx, input, &mut column) {
                self.pool.put(column);
                for done in results {
                    self.pool.put(done);
                }
                return Err(e);
            }
            results.push(column);
        }
        Ok(results)
    }

    /// Evaluates `exprs` over `input` into a new chunk.
    ///
    /// # Errors
    ///
    /// Same as [`ExpressionExecutor::execute`].
    pub fn project(&self, ctx: &EvalContext, exprs: &[Expression], input: &Chunk) -> Result<Chunk> {
        let columns = self.execute(ctx, exprs, input)?;
        if columns.is_empty() {
            return Ok(Chunk::with_rows(input.num_rows()));
        }
        Chunk::new(columns)
    }

    /// Returns a chunk's columns to the pool.
    pub fn recycle(&self, chunk: Chunk) {
        for column in chunk.into_columns() {
            self.pool.put(column);
        }
    }

    /// Evaluates `exprs` over an Arrow batch, `batch_size` rows at a time,
    /// naming the output columns `names`.
    ///
    /// # Errors
    ///
    /// Returns conversion errors and the first evaluation error unchanged.
    pub fn execute_record_batch(
        &self,
        ctx: &EvalContext,
        exprs: &[Expression],
        names: &[&str],
        batch: &RecordBatch,
    ) -> Result<Vec<RecordBatch>> {
        let step = self.config.batch_size.max(1);
        let mut out = Vec::new();
        let mut offset = 0;
        while offset < batch.num_rows() {
            let len = step.min(batch.num_rows() - offset);
            let input = Chunk::from_record_batch(&batch.slice(offset, len))?;
            let projected = self.project(ctx, exprs, &input)?;
            out.push(projected.to_record_batch(names)?);
            self.recycle(projected);
            offset += len;
        }
        Ok(out)
    }
}
