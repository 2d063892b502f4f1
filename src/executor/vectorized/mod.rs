//! Columnar batch primitives for vectorized expression evaluation.
//!
//! Expressions read their input from a [`Chunk`] and write their result into a
//! [`Column`]. Result columns are recycled through a [`ColumnPool`].

mod chunk;
mod column;
mod pool;

pub use chunk::Chunk;
pub use column::Column;
pub use pool::ColumnPool;

/// Default number of rows per batch.
pub const DEFAULT_BATCH_SIZE: usize = 1024;
