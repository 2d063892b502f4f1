//! The contract every built-in function implements.

use std::fmt;

use super::{EvalContext, Expression};
use crate::error::{Result, SableError};
use crate::executor::vectorized::{Chunk, Column};
use crate::types::{EvalType, Value};

/// A built-in scalar function.
///
/// Every function evaluates one row at a time through [`eval`]. A function
/// that also reports [`vectorized`] must implement the batch entry point for
/// its return type. Batch entry points must:
///
/// 1. size `result` to exactly `input.num_rows()` rows before anything else,
/// 2. give every row a null flag,
/// 3. either fill every row and return `Ok`, or return `Err` (the caller
///    discards `result`),
/// 4. not assume `result` is zeroed, as pooled columns hold stale data.
///
/// The provided batch bodies fail with `NotImplemented`.
///
/// [`eval`]: BuiltinFunction::eval
/// [`vectorized`]: BuiltinFunction::vectorized
pub trait BuiltinFunction: fmt::Debug + Send + Sync {
    /// Function name, used in error messages.
    fn name(&self) -> &'static str;

    fn return_type(&self) -> EvalType;

    fn args(&self) -> &[Expression];

    /// Whether the batch entry point for [`return_type`] is implemented.
    /// Must not change over the function's lifetime.
    ///
    /// [`return_type`]: BuiltinFunction::return_type
    fn vectorized(&self) -> bool {
        false
    }

    /// Evaluates one row.
    ///
    /// # Errors
    ///
    /// Function-specific.
    fn eval(&self, ctx: &EvalContext, row: &[Value]) -> Result<Value>;

    /// Batch entry for INT results.
    ///
    /// # Errors
    ///
    /// `NotImplemented` unless overridden.
    fn vec_eval_int(&self, _ctx: &EvalContext, _input: &Chunk, _result: &mut Column) -> Result<()> {
        Err(not_implemented(self.name(), EvalType::Int))
    }

    /// Batch entry for REAL results.
    ///
    /// # Errors
    ///
    /// `NotImplemented` unless overridden.
    fn vec_eval_real(&self, _ctx: &EvalContext, _input: &Chunk, _result: &mut Column) -> Result<()> {
        Err(not_implemented(self.name(), EvalType::Real))
    }

    /// Batch entry for DECIMAL results.
    ///
    /// # Errors
    ///
    /// `NotImplemented` unless overridden.
    fn vec_eval_decimal(&self, _ctx: &EvalContext, _input: &Chunk, _result: &mut Column) -> Result<()> {
        Err(not_implemented(self.name(), EvalType::Decimal))
    }

    /// Batch entry for STRING results.
    ///
    /// # Errors
    ///
    /// `NotImplemented` unless overridden.
    fn vec_eval_string(&self, _ctx: &EvalContext, _input: &Chunk, _result: &mut Column) -> Result<()> {
        Err(not_implemented(self.name(), EvalType::String))
    }

    /// Batch entry for DATETIME results.
    ///
    /// # Errors
    ///
    /// `NotImplemented` unless overridden.
    fn vec_eval_datetime(&self, _ctx: &EvalContext, _input: &Chunk, _result: &mut Column) -> Result<()> {
        Err(not_implemented(self.name(), EvalType::Datetime))
    }

    /// Batch entry for DURATION results.
    ///
    /// # Errors
    ///
    /// `NotImplemented` unless overridden.
    fn vec_eval_duration(&self, _ctx: &EvalContext, _input: &Chunk, _result: &mut Column) -> Result<()> {
        Err(not_implemented(self.name(), EvalType::Duration))
    }

    /// Batch entry for JSON results.
    ///
    /// # Errors
    ///
    /// `NotImplemented` unless overridden.
    fn vec_eval_json(&self, _ctx: &EvalContext, _input: &Chunk, _result: &mut Column) -> Result<()> {
        Err(not_implemented(self.name(), EvalType::Json))
    }
}

pub(crate) fn not_implemented(function: &'static str, eval_type: EvalType) -> SableError {
    SableError::NotImplemented {
        function,
        eval_type: eval_type.name(),
    }
}
