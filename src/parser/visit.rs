//! Depth-first walks over the hint-carrying nodes of a statement.
//!
//! Both walks enter nodes in the same order: a SELECT block is reported
//! before anything inside it, then its select list, FROM clause, WHERE,
//! GROUP BY, HAVING and ORDER BY are walked in that order, which is the
//! order they appear in the text. UNION operands go
//! left to right. Joins walk left, right, then the ON condition. INSERT walks
//! its source SELECT, then the target table, then VALUES rows, then
//! ON DUPLICATE KEY UPDATE. UPDATE walks its tables, assignments, WHERE and
//! ORDER BY; DELETE walks its table, WHERE and ORDER BY.
//!
//! The order depends only on the shape of the tree, so two trees of the same
//! shape report their hint sites in lockstep.

use super::ast::{
    Expr, InsertSource, OrderByItem, Query, SelectField, SelectStmt, Statement, TableFactor,
    TableName, TableRef,
};

/// A node that carries hints, seen read-only.
#[derive(Debug, Clone, Copy)]
pub enum HintSite<'a> {
    /// A SELECT block and its optimizer hints.
    Select(&'a SelectStmt),
    /// A base table and its index hints.
    Table(&'a TableName),
}

/// A node that carries hints, open for rewriting.
#[derive(Debug)]
pub enum HintSiteMut<'a> {
    /// A SELECT block whose optimizer hints may be replaced.
    Select(&'a mut SelectStmt),
    /// A base table whose index hints may be replaced.
    Table(&'a mut TableName),
}

/// Calls `f` for every SELECT block and base table in traversal order.
pub fn walk<F>(stmt: &Statement, f: &mut F)
where
    F: FnMut(HintSite<'_>),
{
    match stmt {
        Statement::Query(query) => walk_query(query, f),
        Statement::Insert(insert) => {
            if let InsertSource::Select(query) = &insert.source {
                walk_query(query, f);
            }
            f(HintSite::Table(&insert.table));
            if let InsertSource::Values(rows) = &insert.source {
                for expr in rows.iter().flatten() {
                    walk_expr(expr, f);
                }
            }
            for assignment in &insert.on_duplicate {
                walk_expr(&assignment.value, f);
            }
        }
        Statement::Update(update) => {
            walk_table_ref(&update.table, f);
            for assignment in &update.assignments {
                walk_expr(&assignment.value, f);
            }
            if let Some(expr) = &update.where_clause {
                walk_expr(expr, f);
            }
            walk_order_by(&update.order_by, f);
        }
        Statement::Delete(delete) => {
            f(HintSite::Table(&delete.table));
            if let Some(expr) = &delete.where_clause {
                walk_expr(expr, f);
            }
            walk_order_by(&delete.order_by, f);
        }
    }
}

fn walk_query<F: FnMut(HintSite<'_>)>(query: &Query, f: &mut F) {
    walk_select(&query.first, f);
    for arm in &query.unions {
        walk_select(&arm.select, f);
    }
}

fn walk_select<F: FnMut(HintSite<'_>)>(select: &SelectStmt, f: &mut F) {
    f(HintSite::Select(select));
    for field in &select.fields {
        if let SelectField::Expr { expr, .. } = field {
            walk_expr(expr, f);
        }
    }
    if let Some(from) = &select.from {
        walk_table_ref(from, f);
    }
    if let Some(expr) = &select.where_clause {
        walk_expr(expr, f);
    }
    for expr in &select.group_by {
        walk_expr(expr, f);
    }
    if let Some(expr) = &select.having {
        walk_expr(expr, f);
    }
    walk_order_by(&select.order_by, f);
}

fn walk_table_ref<F: FnMut(HintSite<'_>)>(table_ref: &TableRef, f: &mut F) {
    match table_ref {
        TableRef::Source(source) => match &source.factor {
            TableFactor::Table(table) => f(HintSite::Table(table)),
            TableFactor::Derived(query) => walk_query(query, f),
        },
        TableRef::Join(join) => {
            walk_table_ref(&join.left, f);
            walk_table_ref(&join.right, f);
            if let Some(on) = &join.on {
                walk_expr(on, f);
            }
        }
    }
}

fn walk_order_by<F: FnMut(HintSite<'_>)>(items: &[OrderByItem], f: &mut F) {
    for item in items {
        walk_expr(&item.expr, f);
    }
}

fn walk_expr<F: FnMut(HintSite<'_>)>(expr: &Expr, f: &mut F) {
    match expr {
        Expr::Column(_) | Expr::Literal(_) | Expr::Param(_) | Expr::Variable(_) | Expr::Values(_) => {}
        Expr::Unary { expr, .. } | Expr::IsNull { expr, .. } => walk_expr(expr, f),
        Expr::Binary { left, right, .. } => {
            walk_expr(left, f);
            walk_expr(right, f);
        }
        Expr::InList { expr, list, .. } => {
            walk_expr(expr, f);
            for item in list {
                walk_expr(item, f);
            }
        }
        Expr::InSubquery { expr, query, .. } => {
            walk_expr(expr, f);
            walk_query(query, f);
        }
        Expr::Exists(query) | Expr::Subquery(query) => walk_query(query, f),
        Expr::Function { args, .. } => {
            for arg in args {
                walk_expr(arg, f);
            }
        }
    }
}

/// Calls `f` for every SELECT block and base table in traversal order, with
/// mutable access. Visits exactly the nodes [`walk`] visits, in the same order.
pub fn walk_mut<F>(stmt: &mut Statement, f: &mut F)
where
    F: FnMut(HintSiteMut<'_>),
{
    match stmt {
        Statement::Query(query) => walk_query_mut(query, f),
        Statement::Insert(insert) => {
            if let InsertSource::Select(query) = &mut insert.source {
                walk_query_mut(query, f);
            }
            f(HintSiteMut::Table(&mut insert.table));
            if let InsertSource::Values(rows) = &mut insert.source {
                for expr in rows.iter_mut().flatten() {
                    walk_expr_mut(expr, f);
                }
            }
            for assignment in &mut insert.on_duplicate {
                walk_expr_mut(&mut assignment.value, f);
            }
        }
        Statement::Update(update) => {
            walk_table_ref_mut(&mut update.table, f);
            for assignment in &mut update.assignments {
                walk_expr_mut(&mut assignment.value, f);
            }
            if let Some(expr) = &mut update.where_clause {
                walk_expr_mut(expr, f);
            }
            walk_order_by_mut(&mut update.order_by, f);
        }
        Statement::Delete(delete) => {
            f(HintSiteMut::Table(&mut delete.table));
            if let Some(expr) = &mut delete.where_clause {
                walk_expr_mut(expr, f);
            }
            walk_order_by_mut(&mut delete.order_by, f);
        }
    }
}

fn walk_query_mut<F: FnMut(HintSiteMut<'_>)>(query: &mut Query, f: &mut F) {
    walk_select_mut(&mut query.first, f);
    for arm in &mut query.unions {
        walk_select_mut(&mut arm.select, f);
    }
}

fn walk_select_mut<F: FnMut(HintSiteMut<'_>)>(select: &mut SelectStmt, f: &mut F) {
    f(HintSiteMut::Select(select));
    for field in &mut select.fields {
        if let SelectField::Expr { expr, .. } = field {
            walk_expr_mut(expr, f);
        }
    }
    if let Some(from) = &mut select.from {
        walk_table_ref_mut(from, f);
    }
    if let Some(expr) = &mut select.where_clause {
        walk_expr_mut(expr, f);
    }
    for expr in &mut select.group_by {
        walk_expr_mut(expr, f);
    }
    if let Some(expr) = &mut select.having {
        walk_expr_mut(expr, f);
    }
    walk_order_by_mut(&mut select.order_by, f);
}

fn walk_table_ref_mut<F: FnMut(HintSiteMut<'_>)>(table_ref: &mut TableRef, f: &mut F) {
    match table_ref {
        TableRef::Source(source) => match &mut source.factor {
            TableFactor::Table(table) => f(HintSiteMut::Table(table)),
            TableFactor::Derived(query) => walk_query_mut(query, f),
        },
        TableRef::Join(join) => {
            walk_table_ref_mut(&mut join.left, f);
            walk_table_ref_mut(&mut join.right, f);
            if let Some(on) = &mut join.on {
                walk_expr_mut(on, f);
            }
        }
    }
}

fn walk_order_by_mut<F: FnMut(HintSiteMut<'_>)>(items: &mut [OrderByItem], f: &mut F) {
    for item in items {
        walk_expr_mut(&mut item.expr, f);
    }
}

fn walk_expr_mut<F: FnMut(HintSiteMut<'_>)>(expr: &mut Expr, f: &mut F) {
    match expr {
        Expr::Column(_) | Expr::Literal(_) | Expr::Param(_) | Expr::Variable(_) | Expr::Values(_) => {}
        Expr::Unary { expr, .. } | Expr::IsNull { expr, .. } => walk_expr_mut(expr, f),
        Expr::Binary { left, right, .. } => {
            walk_expr_mut(left, f);
            walk_expr_mut(right, f);
        }
        Expr::InList { expr, list, .. } => {
            walk_expr_mut(expr, f);
            for item in list {
                walk_expr_mut(item, f);
            }
        }
        Expr::InSubquery { expr, query, .. } => {
            walk_expr_mut(expr, f);
            walk_query_mut(query, f);
        }
        Expr::Exists(query) | Expr::Subquery(query) => walk_query_mut(query, f),
        Expr::Function { args, .. } => {
            for arg in args {
                walk_expr_mut(arg, f);
            }
        }
    }
}
