//! Bit manipulation built-ins.

use crate::error::{Result, SableError};
use crate::expression::{BuiltinFunction, EvalContext, Expression};
use crate::types::{EvalType, Value};

/// `BIT_COUNT(x)`: number of set bits in the 64-bit two's complement of `x`.
#[derive(Debug)]
pub struct BitCount {
    args: Vec<Expression>,
}

impl BitCount {
    #[must_use]
    pub fn new(arg: Expression) -> Self {
        BitCount { args: vec![arg] }
    }
}

impl BuiltinFunction for BitCount {
    fn name(&self) -> &'static str {
        "bit_count"
    }

    fn return_type(&self) -> EvalType {
        EvalType::Int
    }

    fn args(&self) -> &[Expression] {
        &self.args
    }

    fn eval(&self, ctx: &EvalContext, row: &[Value]) -> Result<Value> {
        match self.args[0].eval(ctx, row)? {
            Value::Null => Ok(Value::Null),
            Value::Int(x) => Ok(Value::Int(i64::from(x.count_ones()))),
            other => Err(SableError::type_error(
                EvalType::Int,
                other.eval_type().map_or("NULL", |t| t.name()),
            )),
        }
    }
}
