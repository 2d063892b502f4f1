//! Expression trees and their evaluation, one row or one batch at a time.

pub mod builtin;
mod context;
mod function;

use std::sync::Arc;

use tracing::debug;

pub use context::{EvalContext, StatementContext, StatementKind};
pub use function::BuiltinFunction;

use crate::error::{Result, SableError};
use crate::executor::vectorized::{Chunk, Column};
use crate::types::{EvalType, Value};

/// An evaluable expression.
#[derive(Debug, Clone)]
pub enum Expression {
    /// Input column by position.
    Column { index: usize, eval_type: EvalType },
    /// Literal value. A NULL constant still has a type.
    Constant { value: Value, eval_type: EvalType },
    /// Built-in function call.
    ScalarFunction(ScalarFunction),
}

/// Function node with its batch capability decided at construction.
#[derive(Debug, Clone)]
pub struct ScalarFunction {
    func: Arc<dyn BuiltinFunction>,
    vectorized: bool,
}

impl ScalarFunction {
    /// Wraps `func`. The node is batch-evaluated only if the function and all
    /// of its arguments are.
    #[must_use]
    pub fn new(func: Arc<dyn BuiltinFunction>) -> Self {
        let vectorized = func.vectorized() && func.args().iter().all(Expression::vectorized);
        debug!(function = func.name(), vectorized, "built function node");
        ScalarFunction { func, vectorized }
    }

    #[must_use]
    pub fn function(&self) -> &dyn BuiltinFunction {
        self.func.as_ref()
    }

    #[must_use]
    pub fn vectorized(&self) -> bool {
        self.vectorized
    }

    fn vec_eval(&self, ctx: &EvalContext, input: &Chunk, result: &mut Column) -> Result<()> {
        if !self.vectorized {
            return self.eval_rows(ctx, input, result);
        }
        match self.func.return_type() {
            EvalType::Int => self.func.vec_eval_int(ctx, input, result),
            EvalType::Real => self.func.vec_eval_real(ctx, input, result),
            EvalType::Decimal => self.func.vec_eval_decimal(ctx, input, result),
            EvalType::String => self.func.vec_eval_string(ctx, input, result),
            EvalType::Datetime => self.func.vec_eval_datetime(ctx, input, result),
            EvalType::Duration => self.func.vec_eval_duration(ctx, input, result),
            EvalType::Json => self.func.vec_eval_json(ctx, input, result),
        }
    }

    /// Row-at-a-time fallback.
    fn eval_rows(&self, ctx: &EvalContext, input: &Chunk, result: &mut Column) -> Result<()> {
        result.resize(input.num_rows(), true);
        for row in 0..input.num_rows() {
            let value = self.func.eval(ctx, &input.row(row))?;
            result.set_value(row, value)?;
        }
        Ok(())
    }
}

impl Expression {
    #[must_use]
    pub fn column(index: usize, eval_type: EvalType) -> Self {
        Expression::Column { index, eval_type }
    }

    /// A constant typed by its value.
    ///
    /// # Errors
    ///
    /// Returns `TypeError` for NULL, which has no type of its own; use
    /// [`Expression::typed_constant`].
    pub fn constant(value: Value) -> Result<Self> {
        let eval_type = value
            .eval_type()
            .ok_or_else(|| SableError::type_error("typed value", "NULL"))?;
        Ok(Expression::Constant { value, eval_type })
    }

    /// A constant of an explicit type.
    ///
    /// # Errors
    ///
    /// Returns `TypeError` if `value` cannot be coerced to `eval_type`.
    pub fn typed_constant(value: Value, eval_type: EvalType) -> Result<Self> {
        Ok(Expression::Constant {
            value: value.coerce_to(eval_type)?,
            eval_type,
        })
    }

    /// A function call node.
    #[must_use]
    pub fn function(func: Arc<dyn BuiltinFunction>) -> Self {
        Expression::ScalarFunction(ScalarFunction::new(func))
    }

    #[must_use]
    pub fn eval_type(&self) -> EvalType {
        match self {
            Expression::Column { eval_type, .. } | Expression::Constant { eval_type, .. } => {
                *eval_type
            }
            Expression::ScalarFunction(f) => f.func.return_type(),
        }
    }

    /// Whether batch evaluation of this node avoids the row fallback.
    #[must_use]
    pub fn vectorized(&self) -> bool {
        match self {
            Expression::Column { .. } | Expression::Constant { .. } => true,
            Expression::ScalarFunction(f) => f.vectorized,
        }
    }

    /// Evaluates one row.
    ///
    /// # Errors
    ///
    /// Returns `ColumnIndexOutOfRange` for a column past the end of `row`, or
    /// the function's error.
    pub fn eval(&self, ctx: &EvalContext, row: &[Value]) -> Result<Value> {
        match self {
            Expression::Column { index, .. } => {
                row.get(*index)
                    .cloned()
                    .ok_or(SableError::ColumnIndexOutOfRange {
                        index: *index,
                        num_columns: row.len(),
                    })
            }
            Expression::Constant { value, .. } => Ok(value.clone()),
            Expression::ScalarFunction(f) => f.func.eval(ctx, row),
        }
    }

    /// Evaluates every row of `input` into `result`.
    ///
    /// `result` is retyped to [`Expression::eval_type`] if needed. On success it
    /// holds exactly `input.num_rows()` rows; on error its contents are
    /// unspecified.
    ///
    /// # Errors
    ///
    /// Propagates the first error unchanged.
    pub fn vec_eval(&self, ctx: &EvalContext, input: &Chunk, result: &mut Column) -> Result<()> {
        if result.eval_type() != self.eval_type() {
            result.reset(self.eval_type());
        }
        match self {
            Expression::Column { index, .. } => result.copy_from(input.column(*index)?),
            Expression::Constant { value, .. } => {
                let n = input.num_rows();
                result.resize(n, true);
                if !value.is_null() {
                    for row in 0..n {
                        result.set_value(row, value.clone())?;
                    }
                }
                Ok(())
            }
            Expression::ScalarFunction(f) => f.vec_eval(ctx, input, result),
        }
    }
}
