//! Built-in functions and the by-name factory.
//!
//! Only `VALUES` with an INT result is batch-capable. The rest evaluate row by
//! row and are batch-evaluated through the row fallback.

mod bit;
mod row;
mod values;
mod vars;

use std::sync::Arc;

pub use bit::BitCount;
pub use row::Row;
pub use values::Values;
pub use vars::{GetParamString, GetVar, SetVar};

use super::{BuiltinFunction, Expression};
use crate::error::{Result, SableError};
use crate::types::EvalType;

/// Builds a function call node by name.
///
/// Recognized names: `bit_count`, `getvar`, `setvar`, `get_param`, `row`. `values`
/// needs a column offset and is built with [`values`] instead.
///
/// # Errors
///
/// Returns `ExecutionError` for an unknown name or wrong argument count, and
/// `TypeError` if `ret_type` is not the function's result type.
pub fn new_function(name: &str, ret_type: EvalType, args: Vec<Expression>) -> Result<Expression> {
    let name = name.to_ascii_lowercase();
    let func: Arc<dyn BuiltinFunction> = match name.as_str() {
        "bit_count" => {
            let [arg] = exactly(&name, args)?;
            Arc::new(BitCount::new(arg))
        }
        "getvar" => {
            let [arg] = exactly(&name, args)?;
            Arc::new(GetVar::new(arg))
        }
        "get_param" => {
            let [arg] = exactly(&name, args)?;
            Arc::new(GetParamString::new(arg))
        }
        "setvar" => {
            let [var, value] = exactly(&name, args)?;
            Arc::new(SetVar::new(var, value))
        }
        "row" if args.is_empty() => {
            return Err(SableError::ExecutionError(
                "row takes at least 1 argument(s), got 0".to_string(),
            ))
        }
        "row" => Arc::new(Row::new(args)),
        "values" => {
            return Err(SableError::ExecutionError(
                "values requires a column offset".to_string(),
            ))
        }
        _ => return Err(SableError::ExecutionError(format!("Unknown function: {name}"))),
    };

    if func.return_type() != ret_type {
        return Err(SableError::type_error(func.return_type(), ret_type));
    }
    Ok(Expression::function(func))
}

/// Builds `VALUES(col)` reading argument `offset` of the inserted row.
///
/// The offset is not checked here; an offset past the end of `args` fails at
/// evaluation time inside an INSERT.
#[must_use]
pub fn values(offset: usize, ret_type: EvalType, args: Vec<Expression>) -> Expression {
    Expression::function(Arc::new(Values::new(offset, ret_type, args)))
}

fn exactly<const N: usize>(name: &str, args: Vec<Expression>) -> Result<[Expression; N]> {
    <[Expression; N]>::try_from(args).map_err(|args| {
        SableError::ExecutionError(format!("{name} takes {N} argument(s), got {}", args.len()))
    })
}
