//! User variables and prepared-statement parameters.

use crate::error::{Result, SableError};
use crate::expression::{BuiltinFunction, EvalContext, Expression};
use crate::types::{EvalType, Value};

/// `GETVAR(name)`: the session user variable `@name` as a string.
#[derive(Debug)]
pub struct GetVar {
    args: Vec<Expression>,
}

impl GetVar {
    #[must_use]
    pub fn new(name: Expression) -> Self {
        GetVar { args: vec![name] }
    }
}

impl BuiltinFunction for GetVar {
    fn name(&self) -> &'static str {
        "getvar"
    }

    fn return_type(&self) -> EvalType {
        EvalType::String
    }

    fn args(&self) -> &[Expression] {
        &self.args
    }

    fn eval(&self, ctx: &EvalContext, row: &[Value]) -> Result<Value> {
        let name = self.args[0].eval(ctx, row)?;
        let Some(name) = name.as_string() else {
            return Ok(Value::Null);
        };
        match ctx.user_var(name) {
            None | Some(Value::Null) => Ok(Value::Null),
            Some(value) => value.coerce_to(EvalType::String),
        }
    }
}

/// `SETVAR(name, value)`: assigns `@name` and returns the value as a string.
#[derive(Debug)]
pub struct SetVar {
    args: Vec<Expression>,
}

impl SetVar {
    #[must_use]
    pub fn new(name: Expression, value: Expression) -> Self {
        SetVar {
            args: vec![name, value],
        }
    }
}

impl BuiltinFunction for SetVar {
    fn name(&self) -> &'static str {
        "setvar"
    }

    fn return_type(&self) -> EvalType {
        EvalType::String
    }

    fn args(&self) -> &[Expression] {
        &self.args
    }

    fn eval(&self, ctx: &EvalContext, row: &[Value]) -> Result<Value> {
        let name = self.args[0].eval(ctx, row)?;
        let Some(name) = name.as_string() else {
            return Ok(Value::Null);
        };
        let value = self.args[1].eval(ctx, row)?;
        ctx.set_user_var(name, value.clone());
        value.coerce_to(EvalType::String)
    }
}

/// `GET_PARAM(index)`: a prepared-statement parameter rendered as a string.
#[derive(Debug)]
pub struct GetParamString {
    args: Vec<Expression>,
}

impl GetParamString {
    #[must_use]
    pub fn new(index: Expression) -> Self {
        GetParamString { args: vec![index] }
    }
}

impl BuiltinFunction for GetParamString {
    fn name(&self) -> &'static str {
        "get_param"
    }

    fn return_type(&self) -> EvalType {
        EvalType::String
    }

    fn args(&self) -> &[Expression] {
        &self.args
    }

    fn eval(&self, ctx: &EvalContext, row: &[Value]) -> Result<Value> {
        let index = match self.args[0].eval(ctx, row)? {
            Value::Null => return Ok(Value::Null),
            Value::Int(i) => i,
            other => {
                return Err(SableError::type_error(
                    EvalType::Int,
                    other.eval_type().map_or("NULL", |t| t.name()),
                ))
            }
        };
        let index = usize::try_from(index)
            .map_err(|_| SableError::type_error("non-negative parameter index", index))?;
        ctx.param(index)?.clone().coerce_to(EvalType::String)
    }
}
