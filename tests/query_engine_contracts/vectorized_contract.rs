//! Contract tests for batch expression evaluation.
//!
//! These tests verify:
//! - Batch results always have exactly one row per input row
//! - Every row's null flag is written, even into dirty pooled columns
//! - `VALUES(col)` splits into NULL / precondition / degenerate-input outcomes
//! - Functions without a batch body report `NotImplemented` and are reached
//!   through the row fallback instead

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sable::error::ErrorKind;
use sable::executor::vectorized::{Chunk, Column, ColumnPool};
use sable::expression::builtin::{self, GetVar, Values};
use sable::expression::{StatementKind, ScalarFunction};
use sable::parser::parse_statement;
use sable::{BuiltinFunction, EvalContext, EvalType, Expression, SableError, StatementContext, Value};

fn insert_ctx() -> EvalContext {
    EvalContext::new().with_statement(StatementContext::new(StatementKind::Insert))
}

fn int_chunk(values: &[Option<i64>]) -> Chunk {
    let column = Column::from_values(
        EvalType::Int,
        values.iter().map(|v| v.map_or(Value::Null, Value::Int)),
    )
    .expect("int column");
    Chunk::new(vec![column]).expect("chunk")
}

/// A column that looks like it came back from a pool after a larger batch:
/// non-null, non-zero, longer than any input here.
fn dirty_column(pool: &ColumnPool) -> Column {
    let mut column = pool.get(EvalType::Int, 0);
    column.resize(2048, false);
    for v in column.i64s_mut().expect("int slots") {
        *v = -7;
    }
    column
}

fn values_int(offset: usize, args: usize) -> Expression {
    builtin::values(
        offset,
        EvalType::Int,
        (0..args).map(|i| Expression::column(i, EvalType::Int)).collect(),
    )
}

/// Test function with no batch body that counts row evaluations.
#[derive(Debug, Default)]
struct CountingDouble {
    calls: AtomicUsize,
    args: Vec<Expression>,
}

impl BuiltinFunction for CountingDouble {
    fn name(&self) -> &'static str {
        "counting_double"
    }

    fn return_type(&self) -> EvalType {
        EvalType::Int
    }

    fn args(&self) -> &[Expression] {
        &self.args
    }

    fn eval(&self, _ctx: &EvalContext, row: &[Value]) -> sable::Result<Value> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(match row.first() {
            Some(Value::Int(v)) => Value::Int(v * 2),
            _ => Value::Null,
        })
    }
}

// ============================================================================
// Result sizing
// ============================================================================

#[test]
fn test_result_sized_to_input_over_dirty_columns() {
    // Contract: for every eval path, the result has exactly n rows and each
    // row's null flag reflects this batch, not the column's previous use.
    let pool = ColumnPool::new(4);
    let exprs = [
        values_int(0, 1),
        Expression::column(0, EvalType::Int),
        Expression::typed_constant(Value::Null, EvalType::Int).expect("null constant"),
        builtin::new_function("bit_count", EvalType::Int, vec![Expression::column(0, EvalType::Int)])
            .expect("bit_count"),
    ];

    for n in [0usize, 1, 5, 1024] {
        let input = int_chunk(&vec![None; n]);
        for expr in &exprs {
            let mut result = dirty_column(&pool);
            expr.vec_eval(&EvalContext::new(), &input, &mut result)
                .expect("select context never fails");
            assert_eq!(result.len(), n, "{expr:?} over {n} rows");
            assert_eq!(result.null_count(), n, "{expr:?} over {n} rows");
            pool.put(result);
        }
    }
}

#[test]
fn test_values_outside_insert_is_all_null() {
    // Contract: outside an INSERT every row is NULL, whatever the input or
    // offset, and the call succeeds.
    let input = int_chunk(&[Some(1), Some(2), Some(3)]);
    for ctx in [
        EvalContext::new(),
        EvalContext::new().with_statement(StatementContext::new(StatementKind::Update)),
        EvalContext::new().with_statement(StatementContext::new(StatementKind::Delete)),
    ] {
        let mut result = Column::new(EvalType::Int, 0);
        values_int(9, 1).vec_eval(&ctx, &input, &mut result).expect("null result");
        assert_eq!(result.len(), 3);
        assert!(result.all_null());
    }
}

// ============================================================================
// VALUES inside INSERT
// ============================================================================

#[test]
fn test_values_inside_insert_copies_source() {
    // Contract: with a valid offset and at least one value, the result
    // mirrors the chosen argument's rows.
    let input = Chunk::new(vec![
        Column::from_values(EvalType::Int, [Value::Int(1), Value::Int(2)]).expect("a"),
        Column::from_values(EvalType::Int, [Value::Null, Value::Int(20)]).expect("b"),
    ])
    .expect("chunk");

    let mut result = dirty_column(&ColumnPool::new(1));
    values_int(1, 2)
        .vec_eval(&insert_ctx(), &input, &mut result)
        .expect("values");
    assert_eq!(result.len(), 2);
    assert_eq!(result.value(0), Value::Null);
    assert_eq!(result.value(1), Value::Int(20));
}

#[test]
fn test_values_bad_offset_is_precondition_failure() {
    // Contract: an offset past the argument list fails with the length and
    // offset in the message.
    let err = values_int(3, 2)
        .vec_eval(&insert_ctx(), &int_chunk(&[Some(1)]), &mut Column::new(EvalType::Int, 0))
        .expect_err("bad offset");
    assert!(matches!(err, SableError::InsertValuesOffset { len: 2, offset: 3 }));
    assert_eq!(err.kind(), ErrorKind::Precondition);
    assert_eq!(
        err.to_string(),
        "Session current insert values len 2 and column's offset 3 don't match"
    );
}

#[test]
fn test_values_all_null_is_degenerate_input() {
    // Contract: inside an INSERT, a source with no non-null row fails. An
    // empty batch has no value either.
    for rows in [vec![None, None], vec![]] {
        let err = values_int(0, 1)
            .vec_eval(&insert_ctx(), &int_chunk(&rows), &mut Column::new(EvalType::Int, 0))
            .expect_err("no values");
        assert!(matches!(err, SableError::InsertValuesAbsent));
        assert_eq!(err.kind(), ErrorKind::DegenerateInput);
        assert_eq!(err.to_string(), "Session current insert values is nil");
    }
}

#[test]
fn test_values_context_from_parsed_statement() {
    // Contract: the statement context follows the statement kind.
    let stmt = parse_statement("INSERT INTO t (a) VALUES (1) ON DUPLICATE KEY UPDATE a = VALUES(a) + 1")
        .expect("parse");
    let ctx = EvalContext::new().with_statement(StatementContext::for_statement(&stmt));
    let mut result = Column::new(EvalType::Int, 0);
    values_int(0, 1)
        .vec_eval(&ctx, &int_chunk(&[Some(5)]), &mut result)
        .expect("values");
    assert_eq!(result.value(0), Value::Int(5));
}

#[test]
fn test_values_scalar_path_matches_batch_path() {
    // Contract: eval and vec_eval agree row by row.
    let f = Values::new(0, EvalType::Int, vec![Expression::column(0, EvalType::Int)]);
    let ctx = insert_ctx();
    let input = int_chunk(&[Some(4), None, Some(-1)]);

    let mut batch = Column::new(EvalType::Int, 0);
    f.vec_eval_int(&ctx, &input, &mut batch).expect("batch");
    for row in 0..input.num_rows() {
        assert_eq!(f.eval(&ctx, &input.row(row)).expect("row"), batch.value(row));
    }
}

#[test]
fn test_values_row_fallback_keeps_null_rows() {
    // Contract: a NULL source row reads back as NULL whichever path runs.
    let input = int_chunk(&[None, Some(5)]);
    let wrapped = builtin::values(
        0,
        EvalType::Int,
        vec![builtin::new_function("bit_count", EvalType::Int, vec![Expression::column(0, EvalType::Int)])
            .expect("bit_count")],
    );
    assert!(!wrapped.vectorized());
    for expr in [values_int(0, 1), wrapped] {
        let mut result = dirty_column(&ColumnPool::new(1));
        expr.vec_eval(&insert_ctx(), &input, &mut result).expect("values");
        assert_eq!(result.len(), 2);
        assert!(result.is_null(0));
        assert!(!result.is_null(1));
    }

    let reals = Chunk::new(vec![
        Column::from_values(EvalType::Real, [Value::Null, Value::Real(1.5)]).expect("reals"),
    ])
    .expect("chunk");
    let mut result = Column::new(EvalType::Real, 0);
    builtin::values(0, EvalType::Real, vec![Expression::column(0, EvalType::Real)])
        .vec_eval(&insert_ctx(), &reals, &mut result)
        .expect("values_real");
    assert_eq!(result.value(0), Value::Null);
    assert_eq!(result.value(1), Value::Real(1.5));
}

// ============================================================================
// Dispatch
// ============================================================================

#[test]
fn test_unimplemented_batch_entries_report_not_implemented() {
    // Contract: a function without a batch body fails every batch entry.
    let f = GetVar::new(Expression::constant(Value::String("x".into())).expect("const"));
    let ctx = EvalContext::new();
    let input = Chunk::with_rows(2);
    let mut result = Column::new(EvalType::String, 0);

    let results = [
        f.vec_eval_int(&ctx, &input, &mut result),
        f.vec_eval_real(&ctx, &input, &mut result),
        f.vec_eval_decimal(&ctx, &input, &mut result),
        f.vec_eval_string(&ctx, &input, &mut result),
        f.vec_eval_datetime(&ctx, &input, &mut result),
        f.vec_eval_duration(&ctx, &input, &mut result),
        f.vec_eval_json(&ctx, &input, &mut result),
    ];
    let names = ["INT", "REAL", "DECIMAL", "STRING", "DATETIME", "DURATION", "JSON"];
    for (res, expected) in results.into_iter().zip(names) {
        let err = res.expect_err("not implemented");
        assert_eq!(err.kind(), ErrorKind::NotImplemented);
        assert!(
            matches!(err, SableError::NotImplemented { function: "getvar", eval_type } if eval_type == expected)
        );
    }
    assert!(!f.vectorized());
}

#[test]
fn test_values_real_has_no_batch_body() {
    let f = Values::new(0, EvalType::Real, vec![Expression::column(0, EvalType::Real)]);
    assert!(!f.vectorized());
    assert!(matches!(
        f.vec_eval_int(&insert_ctx(), &Chunk::with_rows(1), &mut Column::new(EvalType::Int, 0)),
        Err(SableError::NotImplemented { .. })
    ));
}

#[test]
fn test_values_decimal_goes_through_row_fallback() {
    let f = Values::new(0, EvalType::Decimal, vec![Expression::column(0, EvalType::Int)]);
    assert!(!f.vectorized());
    let err = f
        .vec_eval_decimal(&insert_ctx(), &Chunk::with_rows(1), &mut Column::new(EvalType::Decimal, 0))
        .expect_err("no batch body");
    assert!(matches!(
        err,
        SableError::NotImplemented { function: "values_decimal", eval_type: "DECIMAL" }
    ));

    let mut result = Column::new(EvalType::Decimal, 0);
    builtin::values(0, EvalType::Decimal, vec![Expression::column(0, EvalType::Int)])
        .vec_eval(&insert_ctx(), &int_chunk(&[Some(7), None]), &mut result)
        .expect("row fallback");
    assert_eq!(result.value(0), Value::Int(7).coerce_to(EvalType::Decimal).expect("decimal"));
    assert!(result.is_null(1));
}

#[test]
fn test_non_vectorized_function_uses_row_fallback() {
    // Contract: the caller checks the capability flag and evaluates row by
    // row instead of calling the batch entry.
    let func = Arc::new(CountingDouble {
        calls: AtomicUsize::new(0),
        args: vec![Expression::column(0, EvalType::Int)],
    });
    let node = ScalarFunction::new(func.clone());
    assert!(!node.vectorized());

    let expr = Expression::function(func.clone());
    let mut result = dirty_column(&ColumnPool::new(1));
    expr.vec_eval(&EvalContext::new(), &int_chunk(&[Some(1), None, Some(3)]), &mut result)
        .expect("fallback");

    assert_eq!(func.calls.load(Ordering::Relaxed), 3);
    assert_eq!(result.len(), 3);
    assert_eq!(result.value(0), Value::Int(2));
    assert_eq!(result.value(1), Value::Null);
    assert_eq!(result.value(2), Value::Int(6));
}

#[test]
fn test_capability_is_fixed_per_node() {
    // Contract: the flag is decided once from the function and its arguments.
    let batchable = values_int(0, 1);
    let wrapped = builtin::values(0, EvalType::Int, vec![Expression::function(Arc::new(CountingDouble::default()))]);
    for _ in 0..3 {
        assert!(batchable.vectorized());
        assert!(!wrapped.vectorized());
    }
}
