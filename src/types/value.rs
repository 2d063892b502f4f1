//! Value and `EvalType` definitions for sable.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SableError};

/// Result type of an expression, which selects the batch entry point used to
/// evaluate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvalType {
    /// 64-bit signed integer.
    Int,
    /// 64-bit floating point.
    Real,
    /// Arbitrary-precision decimal.
    Decimal,
    /// UTF-8 string.
    String,
    /// Datetime (stored as microseconds since epoch).
    Datetime,
    /// Duration (stored as nanoseconds).
    Duration,
    /// JSON document.
    Json,
}

impl EvalType {
    /// Returns the name of the evaluation type.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            EvalType::Int => "INT",
            EvalType::Real => "REAL",
            EvalType::Decimal => "DECIMAL",
            EvalType::String => "STRING",
            EvalType::Datetime => "DATETIME",
            EvalType::Duration => "DURATION",
            EvalType::Json => "JSON",
        }
    }

    /// Converts to an Arrow data type.
    ///
    /// Decimals and JSON documents travel as their text form.
    #[must_use]
    pub fn to_arrow(&self) -> arrow::datatypes::DataType {
        use arrow::datatypes::{DataType, TimeUnit};
        match self {
            EvalType::Int => DataType::Int64,
            EvalType::Real => DataType::Float64,
            EvalType::Decimal | EvalType::String | EvalType::Json => DataType::Utf8,
            EvalType::Datetime => DataType::Timestamp(TimeUnit::Microsecond, None),
            EvalType::Duration => DataType::Duration(TimeUnit::Nanosecond),
        }
    }

    /// Converts from an Arrow data type.
    ///
    /// Returns None for unsupported Arrow types.
    #[must_use]
    pub fn from_arrow(arrow_type: &arrow::datatypes::DataType) -> Option<Self> {
        use arrow::datatypes::{DataType, TimeUnit};
        match arrow_type {
            DataType::Int64 => Some(EvalType::Int),
            DataType::Float64 => Some(EvalType::Real),
            DataType::Utf8 => Some(EvalType::String),
            DataType::Timestamp(TimeUnit::Microsecond, None) => Some(EvalType::Datetime),
            DataType::Duration(TimeUnit::Nanosecond) => Some(EvalType::Duration),
            _ => None,
        }
    }
}

impl fmt::Display for EvalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runtime value container for data.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 64-bit signed integer value.
    Int(i64),
    /// 64-bit floating point value.
    Real(f64),
    /// Decimal value.
    Decimal(BigDecimal),
    /// String value.
    String(String),
    /// Datetime value (microseconds since Unix epoch).
    Datetime(i64),
    /// Duration value (nanoseconds).
    Duration(i64),
    /// JSON value.
    Json(serde_json::Value),
    /// Null value.
    Null,
}

impl Value {
    /// Returns true if this value is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Attempts to extract an i64 value.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Attempts to extract an f64 value.
    #[must_use]
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_decimal(&self) -> Option<&BigDecimal> {
        match self {
            Value::Decimal(d) => Some(d),
            _ => None,
        }
    }

    /// Attempts to extract a string reference.
    #[must_use]
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns the evaluation type of this value, or None for Null.
    #[must_use]
    pub fn eval_type(&self) -> Option<EvalType> {
        match self {
            Value::Int(_) => Some(EvalType::Int),
            Value::Real(_) => Some(EvalType::Real),
            Value::Decimal(_) => Some(EvalType::Decimal),
            Value::String(_) => Some(EvalType::String),
            Value::Datetime(_) => Some(EvalType::Datetime),
            Value::Duration(_) => Some(EvalType::Duration),
            Value::Json(_) => Some(EvalType::Json),
            Value::Null => None,
        }
    }

    /// Converts this value so it can be stored in a column of `target` type.
    ///
    /// Integers widen to reals and decimals, reals and strings parse as
    /// decimals, and every non-null value renders to a string.
    ///
    /// # Errors
    ///
    /// Returns a `TypeError` for any other combination.
    pub fn coerce_to(self, target: EvalType) -> Result<Value> {
        match (self, target) {
            (Value::Null, _) => Ok(Value::Null),
            (Value::Int(i), EvalType::Real) => Ok(Value::Real(i as f64)),
            (Value::Int(i), EvalType::Decimal) => Ok(Value::Decimal(BigDecimal::from(i))),
            (Value::Real(x), EvalType::Decimal) => parse_decimal(&x.to_string(), EvalType::Real),
            (Value::String(s), EvalType::Decimal) => parse_decimal(s.trim(), EvalType::String),
            (Value::String(s), EvalType::String) => Ok(Value::String(s)),
            (Value::String(s), EvalType::Json) => serde_json::from_str(&s)
                .map(Value::Json)
                .map_err(|_| SableError::type_error(EvalType::Json, EvalType::String)),
            (v, EvalType::String) => Ok(Value::String(v.to_string())),
            (v, target) if v.eval_type() == Some(target) => Ok(v),
            (v, target) => Err(SableError::type_error(
                target,
                v.eval_type().map_or("NULL", |t| t.name()),
            )),
        }
    }

    /// Compares two values using SQL null semantics.
    ///
    /// Returns None if either value is null or types don't match.
    #[must_use]
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b))
            | (Value::Datetime(a), Value::Datetime(b))
            | (Value::Duration(a), Value::Duration(b)) => Some(a.cmp(b)),
            (Value::Real(a), Value::Real(b)) => a.partial_cmp(b),
            (Value::Decimal(a), Value::Decimal(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            // Null, JSON or type mismatch
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) | Value::Datetime(v) | Value::Duration(v) => write!(f, "{v}"),
            Value::Real(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Json(v) => write!(f, "{v}"),
            Value::Null => f.write_str("NULL"),
        }
    }
}

fn parse_decimal(text: &str, from: EvalType) -> Result<Value> {
    BigDecimal::from_str(text)
        .map(Value::Decimal)
        .map_err(|_| SableError::type_error(EvalType::Decimal, from))
}
