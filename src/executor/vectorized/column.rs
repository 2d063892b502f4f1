//! Mutable result column for batch evaluation.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, DurationNanosecondArray, Float64Array, Int64Array, StringArray,
    TimestampMicrosecondArray,
};
use arrow::util::bit_util;
use bigdecimal::BigDecimal;

use crate::error::{Result, SableError};
use crate::types::{EvalType, Value};

/// Typed value storage. Datetime and duration share the integer layout.
#[derive(Debug, Clone)]
enum ColumnData {
    Int(Vec<i64>),
    Real(Vec<f64>),
    Decimal(Vec<BigDecimal>),
    Str(Vec<String>),
    Json(Vec<serde_json::Value>),
}

impl ColumnData {
    fn for_type(eval_type: EvalType, capacity: usize) -> Self {
        match eval_type {
            EvalType::Int | EvalType::Datetime | EvalType::Duration => {
                ColumnData::Int(Vec::with_capacity(capacity))
            }
            EvalType::Real => ColumnData::Real(Vec::with_capacity(capacity)),
            EvalType::Decimal => ColumnData::Decimal(Vec::with_capacity(capacity)),
            EvalType::String => ColumnData::Str(Vec::with_capacity(capacity)),
            EvalType::Json => ColumnData::Json(Vec::with_capacity(capacity)),
        }
    }

    fn matches(&self, eval_type: EvalType) -> bool {
        matches!(
            (self, eval_type),
            (
                ColumnData::Int(_),
                EvalType::Int | EvalType::Datetime | EvalType::Duration
            ) | (ColumnData::Real(_), EvalType::Real)
                | (ColumnData::Decimal(_), EvalType::Decimal)
                | (ColumnData::Str(_), EvalType::String)
                | (ColumnData::Json(_), EvalType::Json)
        )
    }

    /// Grows or shrinks to `n` slots. Retained slots keep whatever they held.
    fn resize(&mut self, n: usize) {
        match self {
            ColumnData::Int(v) => v.resize(n, 0),
            ColumnData::Real(v) => v.resize(n, 0.0),
            ColumnData::Decimal(v) => v.resize(n, BigDecimal::default()),
            ColumnData::Str(v) => v.resize(n, String::new()),
            ColumnData::Json(v) => v.resize(n, serde_json::Value::Null),
        }
    }
}

/// A column of `len` values of one [`EvalType`] plus a validity bitmap.
///
/// The bitmap uses Arrow's convention: a set bit marks a non-null row. Values
/// under a null bit are unspecified. Columns taken from a
/// [`ColumnPool`](super::ColumnPool) keep the contents of their previous use,
/// so writers must not assume any slot is zeroed.
#[derive(Debug, Clone)]
pub struct Column {
    eval_type: EvalType,
    len: usize,
    validity: Vec<u8>,
    data: ColumnData,
}

impl Column {
    /// Creates an empty column with room for `capacity` rows.
    #[must_use]
    pub fn new(eval_type: EvalType, capacity: usize) -> Self {
        Column {
            eval_type,
            len: 0,
            validity: Vec::with_capacity(bit_util::ceil(capacity, 8)),
            data: ColumnData::for_type(eval_type, capacity),
        }
    }

    /// Builds a column from values, coercing each to `eval_type`.
    ///
    /// # Errors
    ///
    /// Returns `TypeError` if a value cannot be coerced.
    pub fn from_values(eval_type: EvalType, values: impl IntoIterator<Item = Value>) -> Result<Self> {
        let values: Vec<Value> = values.into_iter().collect();
        let mut column = Column::new(eval_type, values.len());
        column.resize(values.len(), true);
        for (row, value) in values.into_iter().enumerate() {
            column.set_value(row, value)?;
        }
        Ok(column)
    }

    #[must_use]
    pub fn eval_type(&self) -> EvalType {
        self.eval_type
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Changes the column's type, keeping the allocation when the storage
    /// layout stays the same. Leaves the column with zero rows.
    pub fn reset(&mut self, eval_type: EvalType) {
        if !self.data.matches(eval_type) {
            self.data = ColumnData::for_type(eval_type, self.data_capacity());
        }
        self.eval_type = eval_type;
        self.len = 0;
    }

    fn data_capacity(&self) -> usize {
        match &self.data {
            ColumnData::Int(v) => v.capacity(),
            ColumnData::Real(v) => v.capacity(),
            ColumnData::Decimal(v) => v.capacity(),
            ColumnData::Str(v) => v.capacity(),
            ColumnData::Json(v) => v.capacity(),
        }
    }

    /// Sets the row count to exactly `n` and every row's null flag to
    /// `all_null`. Value slots are not cleared.
    pub fn resize(&mut self, n: usize, all_null: bool) {
        self.data.resize(n);
        self.validity.clear();
        self.validity
            .resize(bit_util::ceil(n, 8), if all_null { 0x00 } else { 0xFF });
        self.len = n;
    }

    /// Returns true if `row` is null. Rows past the end read as null.
    #[must_use]
    pub fn is_null(&self, row: usize) -> bool {
        row >= self.len || !bit_util::get_bit(&self.validity, row)
    }

    pub fn set_null(&mut self, row: usize, null: bool) {
        debug_assert!(row < self.len);
        if null {
            bit_util::unset_bit(&mut self.validity, row);
        } else {
            bit_util::set_bit(&mut self.validity, row);
        }
    }

    #[must_use]
    pub fn null_count(&self) -> usize {
        (0..self.len).filter(|&row| self.is_null(row)).count()
    }

    /// Returns true if every row is null; vacuously true for zero rows.
    #[must_use]
    pub fn all_null(&self) -> bool {
        (0..self.len).all(|row| self.is_null(row))
    }

    /// Integer slots (also datetime and duration).
    ///
    /// # Errors
    ///
    /// Returns `TypeError` for non-integer columns.
    pub fn i64s(&self) -> Result<&[i64]> {
        match &self.data {
            ColumnData::Int(v) => Ok(v),
            _ => Err(SableError::type_error("INT", self.eval_type)),
        }
    }

    /// Mutable integer slots.
    ///
    /// # Errors
    ///
    /// Returns `TypeError` for non-integer columns.
    pub fn i64s_mut(&mut self) -> Result<&mut [i64]> {
        match &mut self.data {
            ColumnData::Int(v) => Ok(v),
            _ => Err(SableError::type_error("INT", self.eval_type)),
        }
    }

    /// Floating-point slots.
    ///
    /// # Errors
    ///
    /// Returns `TypeError` for non-real columns.
    pub fn f64s(&self) -> Result<&[f64]> {
        match &self.data {
            ColumnData::Real(v) => Ok(v),
            _ => Err(SableError::type_error("REAL", self.eval_type)),
        }
    }

    /// Mutable floating-point slots.
    ///
    /// # Errors
    ///
    /// Returns `TypeError` for non-real columns.
    pub fn f64s_mut(&mut self) -> Result<&mut [f64]> {
        match &mut self.data {
            ColumnData::Real(v) => Ok(v),
            _ => Err(SableError::type_error("REAL", self.eval_type)),
        }
    }

    /// Reads `row` as a [`Value`], `Value::Null` for null rows.
    #[must_use]
    pub fn value(&self, row: usize) -> Value {
        if self.is_null(row) {
            return Value::Null;
        }
        match (&self.data, self.eval_type) {
            (ColumnData::Int(v), EvalType::Datetime) => Value::Datetime(v[row]),
            (ColumnData::Int(v), EvalType::Duration) => Value::Duration(v[row]),
            (ColumnData::Int(v), _) => Value::Int(v[row]),
            (ColumnData::Real(v), _) => Value::Real(v[row]),
            (ColumnData::Decimal(v), _) => Value::Decimal(v[row].clone()),
            (ColumnData::Str(v), _) => Value::String(v[row].clone()),
            (ColumnData::Json(v), _) => Value::Json(v[row].clone()),
        }
    }

    /// Writes `value` into `row`, coercing it to the column's type.
    ///
    /// # Errors
    ///
    /// Returns `TypeError` if the value cannot be coerced.
    pub fn set_value(&mut self, row: usize, value: Value) -> Result<()> {
        debug_assert!(row < self.len);
        if value.is_null() {
            self.set_null(row, true);
            return Ok(());
        }
        match (&mut self.data, value.coerce_to(self.eval_type)?) {
            (
                ColumnData::Int(v),
                Value::Int(x) | Value::Datetime(x) | Value::Duration(x),
            ) => v[row] = x,
            (ColumnData::Real(v), Value::Real(x)) => v[row] = x,
            (ColumnData::Decimal(v), Value::Decimal(d)) => v[row] = d,
            (ColumnData::Str(v), Value::String(s)) => {
                // Reuse the slot's allocation.
                v[row].clear();
                v[row].push_str(&s);
            }
            (ColumnData::Json(v), Value::Json(j)) => v[row] = j,
            (_, other) => return Err(SableError::type_error(self.eval_type, describe(&other))),
        }
        self.set_null(row, false);
        Ok(())
    }

    /// Makes this column an exact copy of `other`'s rows and null flags.
    ///
    /// # Errors
    ///
    /// Returns `TypeError` if the two columns have different types.
    pub fn copy_from(&mut self, other: &Column) -> Result<()> {
        if self.eval_type != other.eval_type {
            return Err(SableError::type_error(self.eval_type, other.eval_type));
        }
        self.resize(other.len, true);
        let n = self.validity.len();
        self.validity.copy_from_slice(&other.validity[..n]);
        match (&mut self.data, &other.data) {
            (ColumnData::Int(dst), ColumnData::Int(src)) => dst.copy_from_slice(&src[..other.len]),
            (ColumnData::Real(dst), ColumnData::Real(src)) => dst.copy_from_slice(&src[..other.len]),
            (ColumnData::Decimal(dst), ColumnData::Decimal(src)) => {
                dst.clone_from_slice(&src[..other.len]);
            }
            (ColumnData::Str(dst), ColumnData::Str(src)) => {
                dst.clone_from_slice(&src[..other.len]);
            }
            (ColumnData::Json(dst), ColumnData::Json(src)) => {
                dst.clone_from_slice(&src[..other.len]);
            }
            _ => return Err(SableError::type_error(self.eval_type, other.eval_type)),
        }
        Ok(())
    }

    /// Converts to an Arrow array of [`EvalType::to_arrow`] type. Decimals and
    /// JSON are rendered as text.
    #[must_use]
    pub fn to_arrow(&self) -> ArrayRef {
        let valid = |row: usize| !self.is_null(row);
        match (&self.data, self.eval_type) {
            (ColumnData::Int(v), EvalType::Datetime) => Arc::new(
                (0..self.len)
                    .map(|row| valid(row).then(|| v[row]))
                    .collect::<TimestampMicrosecondArray>(),
            ),
            (ColumnData::Int(v), EvalType::Duration) => Arc::new(
                (0..self.len)
                    .map(|row| valid(row).then(|| v[row]))
                    .collect::<DurationNanosecondArray>(),
            ),
            (ColumnData::Int(v), _) => Arc::new(
                (0..self.len)
                    .map(|row| valid(row).then(|| v[row]))
                    .collect::<Int64Array>(),
            ),
            (ColumnData::Real(v), _) => Arc::new(
                (0..self.len)
                    .map(|row| valid(row).then(|| v[row]))
                    .collect::<Float64Array>(),
            ),
            (ColumnData::Str(v), _) => Arc::new(
                (0..self.len)
                    .map(|row| valid(row).then(|| v[row].as_str()))
                    .collect::<StringArray>(),
            ),
            (ColumnData::Decimal(v), _) => Arc::new(
                (0..self.len)
                    .map(|row| valid(row).then(|| v[row].to_string()))
                    .collect::<StringArray>(),
            ),
            (ColumnData::Json(v), _) => Arc::new(
                (0..self.len)
                    .map(|row| valid(row).then(|| v[row].to_string()))
                    .collect::<StringArray>(),
            ),
        }
    }

    /// Copies an Arrow array into a new column.
    ///
    /// # Errors
    ///
    /// Returns `TypeError` for Arrow types with no [`EvalType`] counterpart.
    pub fn from_arrow(array: &dyn Array) -> Result<Self> {
        let eval_type = EvalType::from_arrow(array.data_type())
            .ok_or_else(|| SableError::type_error("supported Arrow type", array.data_type()))?;
        let mut column = Column::new(eval_type, array.len());
        column.resize(array.len(), true);

        let mismatch = || SableError::type_error(eval_type.to_arrow(), array.data_type());
        match eval_type {
            EvalType::Int => {
                let arr = array.as_any().downcast_ref::<Int64Array>().ok_or_else(mismatch)?;
                column.fill_int(arr.iter())?;
            }
            EvalType::Datetime => {
                let arr = array
                    .as_any()
                    .downcast_ref::<TimestampMicrosecondArray>()
                    .ok_or_else(mismatch)?;
                column.fill_int(arr.iter())?;
            }
            EvalType::Duration => {
                let arr = array
                    .as_any()
                    .downcast_ref::<DurationNanosecondArray>()
                    .ok_or_else(mismatch)?;
                column.fill_int(arr.iter())?;
            }
            EvalType::Real => {
                let arr = array.as_any().downcast_ref::<Float64Array>().ok_or_else(mismatch)?;
                for (row, value) in arr.iter().enumerate() {
                    if let Some(x) = value {
                        column.f64s_mut()?[row] = x;
                        column.set_null(row, false);
                    }
                }
            }
            EvalType::Decimal | EvalType::String | EvalType::Json => {
                let arr = array.as_any().downcast_ref::<StringArray>().ok_or_else(mismatch)?;
                for (row, value) in arr.iter().enumerate() {
                    if let Some(s) = value {
                        column.set_value(row, Value::String(s.to_string()))?;
                    }
                }
            }
        }
        Ok(column)
    }

    fn fill_int(&mut self, values: impl Iterator<Item = Option<i64>>) -> Result<()> {
        for (row, value) in values.enumerate() {
            if let Some(x) = value {
                self.i64s_mut()?[row] = x;
                self.set_null(row, false);
            }
        }
        Ok(())
    }
}

fn describe(value: &Value) -> &'static str {
    value.eval_type().map_or("NULL", |t| t.name())
}
