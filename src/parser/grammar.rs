//! Pest parser integration for the SQL grammar.

use std::cell::Cell;
use std::sync::OnceLock;

use pest::iterators::Pair;
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest::Parser;
use pest_derive::Parser;

use crate::error::{Result, SableError};
use crate::parser::ast::{
    Assignment, BinaryOp, ColumnName, DeleteStmt, Expr, HintTable, IndexHint, IndexHintKind,
    IndexHintScope, InsertSource, InsertStmt, Join, JoinKind, Limit, Literal, OrderByItem, Query,
    SelectField, SelectStmt, Statement, TableFactor, TableHint, TableName, TableRef, TableSource,
    UnaryOp, UnionArm, UpdateStmt,
};

#[derive(Parser)]
#[grammar = "parser/grammar.pest"]
pub(crate) struct SqlParser;

/// Parses a single SQL statement into a Statement AST.
///
/// # Errors
///
/// Returns a `ParseError` if the statement is syntactically invalid.
pub fn parse_statement(sql: &str) -> Result<Statement> {
    let pairs = SqlParser::parse(Rule::sql, sql).map_err(to_parse_error)?;

    let builder = AstBuilder::default();
    for pair in pairs {
        if pair.as_rule() == Rule::sql {
            for inner in pair.into_inner() {
                if inner.as_rule() == Rule::statement {
                    return builder.build_statement(inner);
                }
            }
        }
    }
    Err(SableError::ParseError {
        line: 0,
        col: 0,
        message: "No statement found".into(),
    })
}

pub(crate) fn to_parse_error(e: pest::error::Error<Rule>) -> SableError {
    let (line, col) = match e.line_col {
        pest::error::LineColLocation::Pos((l, c))
        | pest::error::LineColLocation::Span((l, c), _) => (l, c),
    };
    SableError::ParseError {
        line,
        col,
        message: e.variant.message().to_string(),
    }
}

fn pratt() -> &'static PrattParser<Rule> {
    static PRATT: OnceLock<PrattParser<Rule>> = OnceLock::new();
    PRATT.get_or_init(|| {
        PrattParser::new()
            .op(Op::infix(Rule::op_or, Assoc::Left))
            .op(Op::infix(Rule::op_and, Assoc::Left))
            .op(Op::prefix(Rule::op_not))
            .op(Op::infix(Rule::op_eq, Assoc::Left)
                | Op::infix(Rule::op_neq, Assoc::Left)
                | Op::infix(Rule::op_lt, Assoc::Left)
                | Op::infix(Rule::op_lte, Assoc::Left)
                | Op::infix(Rule::op_gt, Assoc::Left)
                | Op::infix(Rule::op_gte, Assoc::Left)
                | Op::postfix(Rule::is_null_op)
                | Op::postfix(Rule::in_op))
            .op(Op::infix(Rule::op_add, Assoc::Left) | Op::infix(Rule::op_sub, Assoc::Left))
            .op(Op::infix(Rule::op_mul, Assoc::Left)
                | Op::infix(Rule::op_div, Assoc::Left)
                | Op::infix(Rule::op_mod, Assoc::Left))
            .op(Op::prefix(Rule::op_neg))
    })
}

fn error_at(pair: &Pair<Rule>, message: impl Into<String>) -> SableError {
    let (line, col) = pair.line_col();
    SableError::ParseError {
        line,
        col,
        message: message.into(),
    }
}

fn expect_child<'i>(pair: Pair<'i, Rule>, rule: Rule) -> Result<Pair<'i, Rule>> {
    let err = error_at(&pair, format!("Expected {rule:?}"));
    pair.into_inner()
        .find(|p| p.as_rule() == rule)
        .ok_or(err)
}

fn has_child(pair: &Pair<Rule>, rule: Rule) -> bool {
    pair.clone().into_inner().any(|p| p.as_rule() == rule)
}

/// Strips backticks from a quoted identifier.
fn ident_text(pair: &Pair<Rule>) -> String {
    let s = pair.as_str();
    if s.len() >= 2 && s.starts_with('`') && s.ends_with('`') {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

fn parse_u64(pair: &Pair<Rule>) -> Result<u64> {
    pair.as_str()
        .parse()
        .map_err(|_| error_at(pair, format!("Invalid integer '{}'", pair.as_str())))
}

/// Removes the surrounding quotes and resolves escapes of a string literal.
fn unquote(raw: &str) -> String {
    let quote = raw.chars().next().unwrap_or('\'');
    let body = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('0') => out.push('\0'),
                Some(other) => out.push(other),
                None => {}
            }
        } else if c == quote && chars.peek() == Some(&quote) {
            chars.next();
            out.push(quote);
        } else {
            out.push(c);
        }
    }
    out
}

/// Builds AST nodes from pest pairs.
///
/// Placeholders are numbered in source order across the whole statement.
#[derive(Default)]
struct AstBuilder {
    params: Cell<usize>,
}

impl AstBuilder {
    fn build_statement(&self, pair: Pair<Rule>) -> Result<Statement> {
        let err = error_at(&pair, "Unknown statement type");
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::insert_stmt => return self.build_insert(inner).map(Statement::Insert),
                Rule::update_stmt => return self.build_update(inner).map(Statement::Update),
                Rule::delete_stmt => return self.build_delete(inner).map(Statement::Delete),
                Rule::query => return self.build_query(inner).map(Statement::Query),
                _ => {}
            }
        }
        Err(err)
    }

    fn build_query(&self, pair: Pair<Rule>) -> Result<Query> {
        let err = error_at(&pair, "Query without SELECT");
        let mut first = None;
        let mut unions = Vec::new();
        let mut union_all = false;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::union_op => union_all = has_child(&inner, Rule::union_all),
                Rule::select_stmt => {
                    let select = self.build_select(inner)?;
                    if first.is_none() {
                        first = Some(Box::new(select));
                    } else {
                        unions.push(UnionArm {
                            all: union_all,
                            select,
                        });
                    }
                }
                _ => {}
            }
        }

        Ok(Query {
            first: first.ok_or(err)?,
            unions,
        })
    }

    fn build_select(&self, pair: Pair<Rule>) -> Result<SelectStmt> {
        let mut select = SelectStmt::default();

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::hint_comment => select.hints = build_hints(inner)?,
                Rule::distinct => select.distinct = true,
                Rule::field_list => {
                    for field in inner.into_inner() {
                        select.fields.push(self.build_field(field)?);
                    }
                }
                Rule::from_clause => {
                    let refs = expect_child(inner, Rule::table_refs)?;
                    select.from = Some(self.build_table_refs(refs)?);
                }
                Rule::where_clause => {
                    select.where_clause = Some(self.build_expr(expect_child(inner, Rule::expr)?)?);
                }
                Rule::group_by_clause => {
                    select.group_by = self.build_expr_list(expect_child(inner, Rule::expr_list)?)?;
                }
                Rule::having_clause => {
                    select.having = Some(self.build_expr(expect_child(inner, Rule::expr)?)?);
                }
                Rule::order_by_clause => select.order_by = self.build_order_by(inner)?,
                Rule::limit_clause => select.limit = Some(build_limit(inner)?),
                _ => {}
            }
        }

        Ok(select)
    }

    fn build_field(&self, pair: Pair<Rule>) -> Result<SelectField> {
        let err = error_at(&pair, "Empty select field");
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::wildcard_field => {
                    let table = inner
                        .into_inner()
                        .find(|p| p.as_rule() == Rule::identifier)
                        .map(|p| ident_text(&p));
                    return Ok(SelectField::Wildcard { table });
                }
                Rule::expr_field => {
                    let mut expr = None;
                    let mut alias = None;
                    for part in inner.into_inner() {
                        match part.as_rule() {
                            Rule::expr => expr = Some(self.build_expr(part)?),
                            Rule::alias => alias = Some(build_alias(part)?),
                            _ => {}
                        }
                    }
                    if let Some(expr) = expr {
                        return Ok(SelectField::Expr { expr, alias });
                    }
                }
                _ => {}
            }
        }
        Err(err)
    }

    fn build_order_by(&self, pair: Pair<Rule>) -> Result<Vec<OrderByItem>> {
        let mut items = Vec::new();
        for item in pair.into_inner() {
            if item.as_rule() != Rule::order_item {
                continue;
            }
            let mut expr = None;
            let mut ascending = true;
            for part in item.into_inner() {
                match part.as_rule() {
                    Rule::expr => expr = Some(self.build_expr(part)?),
                    Rule::order_dir => ascending = !has_child(&part, Rule::kw_desc),
                    _ => {}
                }
            }
            if let Some(expr) = expr {
                items.push(OrderByItem { expr, ascending });
            }
        }
        Ok(items)
    }

    // -------------------------------------------------------------------------
    // Table references
    // -------------------------------------------------------------------------

    fn build_table_refs(&self, pair: Pair<Rule>) -> Result<TableRef> {
        let err = error_at(&pair, "Empty table reference list");
        let mut result: Option<TableRef> = None;
        for inner in pair.into_inner() {
            if inner.as_rule() != Rule::table_ref {
                continue;
            }
            let right = self.build_table_ref(inner)?;
            result = Some(match result {
                None => right,
                Some(left) => TableRef::Join(Box::new(Join {
                    left,
                    right,
                    kind: JoinKind::Cross,
                    on: None,
                })),
            });
        }
        result.ok_or(err)
    }

    fn build_table_ref(&self, pair: Pair<Rule>) -> Result<TableRef> {
        let err = error_at(&pair, "Missing table");
        let mut result: Option<TableRef> = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::table_factor => result = Some(self.build_table_factor(inner)?),
                Rule::join_clause => {
                    let left = result.take().ok_or_else(|| error_at(&inner, "JOIN without left side"))?;
                    result = Some(self.build_join(left, inner)?);
                }
                _ => {}
            }
        }
        result.ok_or(err)
    }

    fn build_join(&self, left: TableRef, pair: Pair<Rule>) -> Result<TableRef> {
        let err = error_at(&pair, "JOIN without right side");
        let mut kind = JoinKind::Inner;
        let mut right = None;
        let mut on = None;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::join_kind => {
                    if let Some(k) = inner.into_inner().next() {
                        kind = match k.as_rule() {
                            Rule::join_left => JoinKind::Left,
                            Rule::join_right => JoinKind::Right,
                            Rule::join_cross => JoinKind::Cross,
                            Rule::join_straight => JoinKind::Straight,
                            _ => JoinKind::Inner,
                        };
                    }
                }
                Rule::table_factor => right = Some(self.build_table_factor(inner)?),
                Rule::expr => on = Some(self.build_expr(inner)?),
                _ => {}
            }
        }

        Ok(TableRef::Join(Box::new(Join {
            left,
            right: right.ok_or(err)?,
            kind,
            on,
        })))
    }

    fn build_table_factor(&self, pair: Pair<Rule>) -> Result<TableRef> {
        let err = error_at(&pair, "Empty table factor");
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::derived_table => {
                    let mut query = None;
                    let mut alias = None;
                    for part in inner.into_inner() {
                        match part.as_rule() {
                            Rule::query => query = Some(self.build_query(part)?),
                            Rule::alias => alias = Some(build_alias(part)?),
                            _ => {}
                        }
                    }
                    if let Some(query) = query {
                        return Ok(TableRef::Source(TableSource {
                            factor: TableFactor::Derived(Box::new(query)),
                            alias,
                        }));
                    }
                }
                Rule::table_source => {
                    let mut table = None;
                    let mut alias = None;
                    let mut hints = Vec::new();
                    for part in inner.into_inner() {
                        match part.as_rule() {
                            Rule::table_name => table = Some(build_table_name(part)),
                            Rule::alias => alias = Some(build_alias(part)?),
                            Rule::index_hint_list => hints = build_index_hints(part),
                            _ => {}
                        }
                    }
                    if let Some(mut table) = table {
                        table.index_hints = hints;
                        return Ok(TableRef::Source(TableSource {
                            factor: TableFactor::Table(table),
                            alias,
                        }));
                    }
                }
                _ => {}
            }
        }
        Err(err)
    }

    // -------------------------------------------------------------------------
    // DML
    // -------------------------------------------------------------------------

    fn build_insert(&self, pair: Pair<Rule>) -> Result<InsertStmt> {
        let err = error_at(&pair, "INSERT requires a target table and rows");
        let mut table = None;
        let mut columns = Vec::new();
        let mut source = None;
        let mut on_duplicate = Vec::new();

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::table_name => table = Some(build_table_name(inner)),
                Rule::insert_columns => {
                    columns = inner
                        .into_inner()
                        .filter(|p| p.as_rule() == Rule::identifier)
                        .map(|p| ident_text(&p))
                        .collect();
                }
                Rule::values_source => {
                    let mut rows = Vec::new();
                    for row in inner.into_inner() {
                        if row.as_rule() == Rule::row_values {
                            let values = match row.into_inner().next() {
                                Some(list) => self.build_expr_list(list)?,
                                None => Vec::new(),
                            };
                            rows.push(values);
                        }
                    }
                    source = Some(InsertSource::Values(rows));
                }
                Rule::query => source = Some(InsertSource::Select(Box::new(self.build_query(inner)?))),
                Rule::on_duplicate => {
                    on_duplicate =
                        self.build_assignments(expect_child(inner, Rule::assignment_list)?)?;
                }
                _ => {}
            }
        }

        match (table, source) {
            (Some(table), Some(source)) => Ok(InsertStmt {
                table,
                columns,
                source,
                on_duplicate,
            }),
            _ => Err(err),
        }
    }

    fn build_update(&self, pair: Pair<Rule>) -> Result<UpdateStmt> {
        let err = error_at(&pair, "UPDATE requires a table");
        let mut table = None;
        let mut assignments = Vec::new();
        let mut where_clause = None;
        let mut order_by = Vec::new();
        let mut limit = None;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::table_refs => table = Some(self.build_table_refs(inner)?),
                Rule::assignment_list => assignments = self.build_assignments(inner)?,
                Rule::where_clause => {
                    where_clause = Some(self.build_expr(expect_child(inner, Rule::expr)?)?);
                }
                Rule::order_by_clause => order_by = self.build_order_by(inner)?,
                Rule::limit_clause => limit = Some(build_limit(inner)?),
                _ => {}
            }
        }

        Ok(UpdateStmt {
            table: table.ok_or(err)?,
            assignments,
            where_clause,
            order_by,
            limit,
        })
    }

    fn build_delete(&self, pair: Pair<Rule>) -> Result<DeleteStmt> {
        let err = error_at(&pair, "DELETE requires a table");
        let mut table = None;
        let mut where_clause = None;
        let mut order_by = Vec::new();
        let mut limit = None;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::table_name => table = Some(build_table_name(inner)),
                Rule::index_hint_list => {
                    if let Some(table) = table.as_mut() {
                        table.index_hints = build_index_hints(inner);
                    }
                }
                Rule::where_clause => {
                    where_clause = Some(self.build_expr(expect_child(inner, Rule::expr)?)?);
                }
                Rule::order_by_clause => order_by = self.build_order_by(inner)?,
                Rule::limit_clause => limit = Some(build_limit(inner)?),
                _ => {}
            }
        }

        Ok(DeleteStmt {
            table: table.ok_or(err)?,
            where_clause,
            order_by,
            limit,
        })
    }

    fn build_assignments(&self, pair: Pair<Rule>) -> Result<Vec<Assignment>> {
        let mut assignments = Vec::new();
        for assignment in pair.into_inner() {
            if assignment.as_rule() != Rule::assignment {
                continue;
            }
            let err = error_at(&assignment, "Malformed assignment");
            let mut column = None;
            let mut value = None;
            for part in assignment.into_inner() {
                match part.as_rule() {
                    Rule::column_ref => column = Some(build_column_ref(part)),
                    Rule::expr => value = Some(self.build_expr(part)?),
                    _ => {}
                }
            }
            match (column, value) {
                (Some(column), Some(value)) => assignments.push(Assignment { column, value }),
                _ => return Err(err),
            }
        }
        Ok(assignments)
    }

    // -------------------------------------------------------------------------
    // Expressions
    // -------------------------------------------------------------------------

    fn build_expr_list(&self, pair: Pair<Rule>) -> Result<Vec<Expr>> {
        pair.into_inner()
            .filter(|p| p.as_rule() == Rule::expr)
            .map(|p| self.build_expr(p))
            .collect()
    }

    fn build_expr(&self, pair: Pair<Rule>) -> Result<Expr> {
        pratt()
            .map_primary(|primary| self.build_primary(primary))
            .map_prefix(|op, rhs| {
                let op = match op.as_rule() {
                    Rule::op_neg => UnaryOp::Neg,
                    _ => UnaryOp::Not,
                };
                Ok(Expr::Unary {
                    op,
                    expr: Box::new(rhs?),
                })
            })
            .map_postfix(|lhs, op| {
                let expr = Box::new(lhs?);
                let negated = has_child(&op, Rule::negation);
                match op.as_rule() {
                    Rule::is_null_op => Ok(Expr::IsNull { expr, negated }),
                    _ => {
                        for inner in op.into_inner() {
                            match inner.as_rule() {
                                Rule::query => {
                                    return Ok(Expr::InSubquery {
                                        expr,
                                        query: Box::new(self.build_query(inner)?),
                                        negated,
                                    });
                                }
                                Rule::expr_list => {
                                    return Ok(Expr::InList {
                                        expr,
                                        list: self.build_expr_list(inner)?,
                                        negated,
                                    });
                                }
                                _ => {}
                            }
                        }
                        Ok(Expr::InList {
                            expr,
                            list: Vec::new(),
                            negated,
                        })
                    }
                }
            })
            .map_infix(|lhs, op, rhs| {
                let op = match op.as_rule() {
                    Rule::op_or => BinaryOp::Or,
                    Rule::op_and => BinaryOp::And,
                    Rule::op_eq => BinaryOp::Eq,
                    Rule::op_neq => BinaryOp::Neq,
                    Rule::op_lt => BinaryOp::Lt,
                    Rule::op_lte => BinaryOp::Lte,
                    Rule::op_gt => BinaryOp::Gt,
                    Rule::op_gte => BinaryOp::Gte,
                    Rule::op_add => BinaryOp::Add,
                    Rule::op_sub => BinaryOp::Sub,
                    Rule::op_mul => BinaryOp::Mul,
                    Rule::op_div => BinaryOp::Div,
                    _ => BinaryOp::Mod,
                };
                Ok(Expr::Binary {
                    left: Box::new(lhs?),
                    op,
                    right: Box::new(rhs?),
                })
            })
            .parse(pair.into_inner())
    }

    fn build_primary(&self, pair: Pair<Rule>) -> Result<Expr> {
        match pair.as_rule() {
            Rule::integer_literal => pair
                .as_str()
                .parse::<i64>()
                .map(|v| Expr::Literal(Literal::Int(v)))
                .map_err(|_| error_at(&pair, "Integer literal out of range")),
            Rule::float_literal => pair
                .as_str()
                .parse::<f64>()
                .map(|v| Expr::Literal(Literal::Float(v)))
                .map_err(|_| error_at(&pair, "Invalid float literal")),
            Rule::string_literal => Ok(Expr::Literal(Literal::String(unquote(pair.as_str())))),
            Rule::null_literal => Ok(Expr::Literal(Literal::Null)),
            Rule::bool_literal => Ok(Expr::Literal(Literal::Bool(has_child(&pair, Rule::kw_true)))),
            Rule::param => {
                let index = self.params.get();
                self.params.set(index + 1);
                Ok(Expr::Param(index))
            }
            Rule::variable => Ok(Expr::Variable(pair.as_str()[1..].to_ascii_lowercase())),
            Rule::exists_expr => Ok(Expr::Exists(Box::new(
                self.build_query(expect_child(pair, Rule::query)?)?,
            ))),
            Rule::values_func => Ok(Expr::Values(build_column_ref(expect_child(
                pair,
                Rule::column_ref,
            )?))),
            Rule::subquery => Ok(Expr::Subquery(Box::new(
                self.build_query(expect_child(pair, Rule::query)?)?,
            ))),
            Rule::function_call => {
                let mut name = String::new();
                let mut args = Vec::new();
                for inner in pair.into_inner() {
                    match inner.as_rule() {
                        Rule::function_name => name = inner.as_str().to_ascii_lowercase(),
                        Rule::expr_list => args = self.build_expr_list(inner)?,
                        _ => {}
                    }
                }
                Ok(Expr::Function { name, args })
            }
            Rule::column_ref => Ok(Expr::Column(build_column_ref(pair))),
            Rule::expr => self.build_expr(pair),
            _ => Err(error_at(&pair, format!("Unexpected {:?}", pair.as_rule()))),
        }
    }
}

fn build_alias(pair: Pair<Rule>) -> Result<String> {
    expect_child(pair, Rule::identifier).map(|p| ident_text(&p))
}

fn build_table_name(pair: Pair<Rule>) -> TableName {
    let idents: Vec<String> = pair
        .into_inner()
        .filter(|p| p.as_rule() == Rule::identifier)
        .map(|p| ident_text(&p))
        .collect();
    let mut table = TableName::default();
    match idents.as_slice() {
        [schema, name] => {
            table.schema = Some(schema.clone());
            table.name = name.clone();
        }
        [name, ..] => table.name = name.clone(),
        [] => {}
    }
    table
}

fn build_column_ref(pair: Pair<Rule>) -> ColumnName {
    let idents: Vec<String> = pair
        .into_inner()
        .filter(|p| p.as_rule() == Rule::identifier)
        .map(|p| ident_text(&p))
        .collect();
    let mut column = ColumnName::default();
    match idents.as_slice() {
        [schema, table, name] => {
            column.schema = Some(schema.clone());
            column.table = Some(table.clone());
            column.name = name.clone();
        }
        [table, name] => {
            column.table = Some(table.clone());
            column.name = name.clone();
        }
        [name] => column.name = name.clone(),
        _ => {}
    }
    column
}

fn build_limit(pair: Pair<Rule>) -> Result<Limit> {
    let err = error_at(&pair, "Malformed LIMIT");
    for inner in pair.into_inner() {
        let numbers: Vec<Pair<Rule>> = match inner.as_rule() {
            Rule::limit_offset_comma | Rule::limit_count_offset => inner
                .clone()
                .into_inner()
                .filter(|p| p.as_rule() == Rule::integer_literal)
                .collect(),
            _ => continue,
        };
        return match (inner.as_rule(), numbers.as_slice()) {
            (Rule::limit_offset_comma, [offset, count]) => Ok(Limit {
                count: parse_u64(count)?,
                offset: Some(parse_u64(offset)?),
            }),
            (Rule::limit_count_offset, [count]) => Ok(Limit {
                count: parse_u64(count)?,
                offset: None,
            }),
            (Rule::limit_count_offset, [count, offset]) => Ok(Limit {
                count: parse_u64(count)?,
                offset: Some(parse_u64(offset)?),
            }),
            _ => Err(err),
        };
    }
    Err(err)
}

fn build_index_hints(pair: Pair<Rule>) -> Vec<IndexHint> {
    let mut hints = Vec::new();
    for hint in pair.into_inner() {
        if hint.as_rule() != Rule::index_hint {
            continue;
        }
        let mut kind = IndexHintKind::Use;
        let mut scope = IndexHintScope::Scan;
        let mut index_names = Vec::new();
        for part in hint.into_inner() {
            match part.as_rule() {
                Rule::index_hint_kind => {
                    if has_child(&part, Rule::kw_ignore) {
                        kind = IndexHintKind::Ignore;
                    } else if has_child(&part, Rule::kw_force) {
                        kind = IndexHintKind::Force;
                    }
                }
                Rule::index_hint_scope => {
                    if has_child(&part, Rule::scope_join) {
                        scope = IndexHintScope::Join;
                    } else if has_child(&part, Rule::scope_order_by) {
                        scope = IndexHintScope::OrderBy;
                    } else if has_child(&part, Rule::scope_group_by) {
                        scope = IndexHintScope::GroupBy;
                    }
                }
                Rule::index_name_list => {
                    index_names = part
                        .into_inner()
                        .filter(|p| p.as_rule() == Rule::identifier)
                        .map(|p| ident_text(&p))
                        .collect();
                }
                _ => {}
            }
        }
        hints.push(IndexHint {
            kind,
            scope,
            index_names,
        });
    }
    hints
}

fn build_hints(pair: Pair<Rule>) -> Result<Vec<TableHint>> {
    let mut hints = Vec::new();
    let Some(list) = pair.into_inner().find(|p| p.as_rule() == Rule::hint_list) else {
        return Ok(hints);
    };

    for hint_pair in list.into_inner() {
        if hint_pair.as_rule() != Rule::hint {
            continue;
        }
        let mut hint = TableHint::new("");
        let mut tables = Vec::new();
        for part in hint_pair.into_inner() {
            match part.as_rule() {
                Rule::hint_name => hint.name = part.as_str().to_ascii_lowercase(),
                Rule::hint_qb => hint.qb_name = Some(part.as_str()[1..].to_string()),
                Rule::hint_args => {
                    for arg in part.into_inner() {
                        let Some(value) = arg.into_inner().next() else {
                            continue;
                        };
                        match value.as_rule() {
                            Rule::integer_literal => hint.value = Some(parse_u64(&value)?),
                            Rule::hint_table => tables.push(build_hint_table(value)),
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }

        if TableHint::takes_indexes(&hint.name) {
            let mut args = tables.into_iter();
            hint.tables.extend(args.next());
            hint.indexes = args.map(|t| t.table).collect();
        } else {
            hint.tables = tables;
        }
        hints.push(hint);
    }
    Ok(hints)
}

fn build_hint_table(pair: Pair<Rule>) -> HintTable {
    let mut idents = Vec::new();
    let mut qb_name = None;
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::hint_ident => idents.push(ident_text(&part)),
            Rule::hint_qb => qb_name = Some(part.as_str()[1..].to_string()),
            _ => {}
        }
    }
    let table = idents.pop().unwrap_or_default();
    HintTable {
        schema: idents.pop(),
        table,
        qb_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(stmt: &Statement) -> &SelectStmt {
        match stmt {
            Statement::Query(q) => &q.first,
            other => panic!("expected query, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_simple_select() {
        let stmt = parse_statement("SELECT a, b FROM t WHERE a > 1").unwrap();
        let s = select(&stmt);
        assert_eq!(s.fields.len(), 2);
        assert!(s.where_clause.is_some());
        assert!(s.hints.is_empty());
    }

    #[test]
    fn test_parse_optimizer_hints() {
        let stmt =
            parse_statement("select /*+ HASH_JOIN(t1, t2), use_index(t1 idx_a, idx_b) */ * from t1, t2")
                .unwrap();
        let s = select(&stmt);
        assert_eq!(s.hints.len(), 2);
        assert_eq!(s.hints[0].name, "hash_join");
        assert_eq!(s.hints[0].tables.len(), 2);
        assert_eq!(s.hints[1].name, "use_index");
        assert_eq!(s.hints[1].tables[0].table, "t1");
        assert_eq!(s.hints[1].indexes, vec!["idx_a".to_string(), "idx_b".to_string()]);
    }

    #[test]
    fn test_parse_hint_with_value_and_qb() {
        let stmt = parse_statement("SELECT /*+ MAX_EXECUTION_TIME(1000) QB_NAME(qb1) */ 1").unwrap();
        let s = select(&stmt);
        assert_eq!(s.hints[0].value, Some(1000));
        assert_eq!(s.hints[1].name, "qb_name");
        assert_eq!(s.hints[1].tables[0].table, "qb1");

        let stmt = parse_statement("SELECT /*+ INL_JOIN(@sel_2 t1) */ 1").unwrap();
        assert_eq!(select(&stmt).hints[0].qb_name.as_deref(), Some("sel_2"));
    }

    #[test]
    fn test_ordinary_comment_is_not_a_hint() {
        let stmt = parse_statement("SELECT /* HASH_JOIN(t1) */ a FROM t1").unwrap();
        assert!(select(&stmt).hints.is_empty());
    }

    #[test]
    fn test_parse_index_hints() {
        let stmt = parse_statement(
            "SELECT * FROM t1 USE INDEX (idx_a) IGNORE INDEX FOR ORDER BY (idx_b), t2 FORCE KEY (PRIMARY)",
        )
        .unwrap();
        let s = select(&stmt);
        let Some(TableRef::Join(join)) = &s.from else {
            panic!("expected join");
        };
        let TableRef::Source(TableSource {
            factor: TableFactor::Table(t1),
            ..
        }) = &join.left
        else {
            panic!("expected table");
        };
        assert_eq!(t1.index_hints.len(), 2);
        assert_eq!(t1.index_hints[0].kind, IndexHintKind::Use);
        assert_eq!(t1.index_hints[1].kind, IndexHintKind::Ignore);
        assert_eq!(t1.index_hints[1].scope, IndexHintScope::OrderBy);

        let TableRef::Source(TableSource {
            factor: TableFactor::Table(t2),
            ..
        }) = &join.right
        else {
            panic!("expected table");
        };
        assert_eq!(t2.index_hints[0].kind, IndexHintKind::Force);
        assert_eq!(t2.index_hints[0].index_names, vec!["PRIMARY".to_string()]);
    }

    #[test]
    fn test_parse_operator_precedence() {
        let stmt = parse_statement("SELECT 1 + 2 * 3 = 7 AND NOT a OR b").unwrap();
        let SelectField::Expr { expr, .. } = &select(&stmt).fields[0] else {
            panic!("expected expression");
        };
        let Expr::Binary { op, left, .. } = expr else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Or);
        let Expr::Binary { op, .. } = left.as_ref() else {
            panic!("expected AND");
        };
        assert_eq!(*op, BinaryOp::And);
    }

    #[test]
    fn test_parse_in_and_exists() {
        let stmt = parse_statement(
            "SELECT a FROM t WHERE a NOT IN (SELECT b FROM s) AND EXISTS (SELECT 1 FROM u) AND c IN (1, 2) AND d IS NOT NULL",
        )
        .unwrap();
        assert!(select(&stmt).where_clause.is_some());
    }

    #[test]
    fn test_parse_union() {
        let stmt = parse_statement("SELECT a FROM t UNION ALL SELECT b FROM s UNION SELECT c FROM u").unwrap();
        let Statement::Query(q) = stmt else {
            panic!("expected query");
        };
        assert_eq!(q.unions.len(), 2);
        assert!(q.unions[0].all);
        assert!(!q.unions[1].all);
    }

    #[test]
    fn test_parse_insert_on_duplicate() {
        let stmt = parse_statement(
            "INSERT INTO t (a, b) VALUES (1, ?), (2, ?) ON DUPLICATE KEY UPDATE b = VALUES(b)",
        )
        .unwrap();
        let Statement::Insert(insert) = stmt else {
            panic!("expected insert");
        };
        assert_eq!(insert.columns, vec!["a".to_string(), "b".to_string()]);
        let InsertSource::Values(rows) = &insert.source else {
            panic!("expected values");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][1], Expr::Param(1));
        assert!(matches!(insert.on_duplicate[0].value, Expr::Values(_)));
    }

    #[test]
    fn test_parse_update_delete() {
        assert!(matches!(
            parse_statement("UPDATE t SET a = a + 1 WHERE b = 'x'").unwrap(),
            Statement::Update(_)
        ));
        assert!(matches!(
            parse_statement("DELETE FROM t WHERE a = 1 LIMIT 10").unwrap(),
            Statement::Delete(_)
        ));
    }

    #[test]
    fn test_parse_limit_forms() {
        let stmt = parse_statement("SELECT a FROM t LIMIT 5, 10").unwrap();
        assert_eq!(
            select(&stmt).limit,
            Some(Limit {
                count: 10,
                offset: Some(5)
            })
        );
        let stmt = parse_statement("SELECT a FROM t LIMIT 10 OFFSET 5").unwrap();
        assert_eq!(
            select(&stmt).limit,
            Some(Limit {
                count: 10,
                offset: Some(5)
            })
        );
    }

    #[test]
    fn test_parse_error_location() {
        let err = parse_statement("SELECT FROM").unwrap_err();
        assert!(matches!(err, SableError::ParseError { line: 1, .. }));
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("'it''s'"), "it's");
        assert_eq!(unquote(r"'a\nb'"), "a\nb");
        assert_eq!(unquote("\"x\""), "x");
    }
}
