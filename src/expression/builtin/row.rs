//! `ROW(a, b, ...)` row constructor.

use crate::error::{Result, SableError};
use crate::expression::{BuiltinFunction, EvalContext, Expression};
use crate::types::{EvalType, Value};

/// A row constructor used as an operand of row comparisons such as
/// `(a, b) = ROW(1, 2)`. It has no value of its own: the comparison that
/// owns it expands it, so evaluating it directly is an error.
#[derive(Debug)]
pub struct Row {
    args: Vec<Expression>,
}

impl Row {
    #[must_use]
    pub fn new(args: Vec<Expression>) -> Self {
        Row { args }
    }
}

impl BuiltinFunction for Row {
    fn name(&self) -> &'static str {
        "row"
    }

    fn return_type(&self) -> EvalType {
        EvalType::String
    }

    fn args(&self) -> &[Expression] {
        &self.args
    }

    fn eval(&self, _ctx: &EvalContext, _row: &[Value]) -> Result<Value> {
        Err(SableError::ExecutionError(format!(
            "row constructor with {} fields has no scalar value",
            self.args.len()
        )))
    }
}
