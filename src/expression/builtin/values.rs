//! `VALUES(col)` in `INSERT ... ON DUPLICATE KEY UPDATE`.

use crate::error::{Result, SableError};
use crate::executor::vectorized::{Chunk, Column};
use crate::expression::function::not_implemented;
use crate::expression::{BuiltinFunction, EvalContext, Expression};
use crate::types::{EvalType, Value};

/// Reads the value the INSERT would have written to one column.
///
/// `args` are the values of the row being inserted, in column order, and
/// `offset` picks the column. Outside an INSERT the result is NULL. A NULL
/// source value reads back as NULL; only the batch body rejects a batch in
/// which every row is NULL. Only the INT flavour has a batch implementation.
#[derive(Debug)]
pub struct Values {
    offset: usize,
    ret_type: EvalType,
    args: Vec<Expression>,
}

impl Values {
    #[must_use]
    pub fn new(offset: usize, ret_type: EvalType, args: Vec<Expression>) -> Self {
        Values {
            offset,
            ret_type,
            args,
        }
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn source(&self) -> Result<&Expression> {
        self.args.get(self.offset).ok_or(SableError::InsertValuesOffset {
            len: self.args.len(),
            offset: self.offset,
        })
    }
}

impl BuiltinFunction for Values {
    fn name(&self) -> &'static str {
        match self.ret_type {
            EvalType::Int => "values_int",
            EvalType::Real => "values_real",
            EvalType::Decimal => "values_decimal",
            EvalType::String => "values_string",
            EvalType::Datetime => "values_datetime",
            EvalType::Duration => "values_duration",
            EvalType::Json => "values_json",
        }
    }

    fn return_type(&self) -> EvalType {
        self.ret_type
    }

    fn args(&self) -> &[Expression] {
        &self.args
    }

    fn vectorized(&self) -> bool {
        self.ret_type == EvalType::Int
    }

    fn eval(&self, ctx: &EvalContext, row: &[Value]) -> Result<Value> {
        if !ctx.in_insert_stmt() {
            return Ok(Value::Null);
        }
        let value = self.source()?.eval(ctx, row)?;
        if value.is_null() {
            return Ok(Value::Null);
        }
        value.coerce_to(self.ret_type)
    }

    fn vec_eval_int(&self, ctx: &EvalContext, input: &Chunk, result: &mut Column) -> Result<()> {
        if self.ret_type != EvalType::Int {
            return Err(not_implemented(self.name(), EvalType::Int));
        }
        result.resize(input.num_rows(), true);
        if !ctx.in_insert_stmt() {
            return Ok(());
        }

        let source = self.source()?;
        if source.eval_type() == EvalType::Int {
            source.vec_eval(ctx, input, result)?;
        } else {
            let mut buf = Column::new(source.eval_type(), input.num_rows());
            source.vec_eval(ctx, input, &mut buf)?;
            for row in 0..buf.len() {
                result.set_value(row, buf.value(row))?;
            }
        }

        if result.all_null() {
            return Err(SableError::InsertValuesAbsent);
        }
        Ok(())
    }
}
