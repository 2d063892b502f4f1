//! sable - plan-binding hints and vectorized expression evaluation for a
//! MySQL-flavoured SQL engine.
//!
//! Two independent pieces:
//!
//! - [`bindinfo`] captures the optimizer and index hints of a statement by
//!   traversal position ([`HintSet`]) and replays them onto another statement
//!   of the same shape, which is how a stored plan binding is applied to new
//!   query text.
//! - [`expression`] and [`executor`] evaluate built-in functions over columnar
//!   batches, falling back to row-at-a-time evaluation for functions without a
//!   batch implementation.

pub mod bindinfo;
pub mod error;
pub mod executor;
pub mod expression;
pub mod parser;
pub mod types;

pub use bindinfo::{bind_hints, collect_hints, parse_hints_set, BindRecord, BindingCache, HintSet};
pub use error::{ErrorKind, Result, SableError};
pub use executor::{ExecutorConfig, ExpressionExecutor};
pub use expression::{BuiltinFunction, EvalContext, Expression, StatementContext};
pub use parser::Parser;
pub use types::{EvalType, Value};
