//! Runtime values and evaluation types.

mod value;

pub use value::{EvalType, Value};
