//! Per-query evaluation state.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::{Result, SableError};
use crate::parser::ast::Statement;
use crate::types::Value;

/// Kind of statement being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementKind {
    #[default]
    Select,
    Insert,
    Update,
    Delete,
}

/// Facts about the running statement that functions may depend on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatementContext {
    kind: StatementKind,
}

impl StatementContext {
    #[must_use]
    pub fn new(kind: StatementKind) -> Self {
        StatementContext { kind }
    }

    /// Derives the context from a parsed statement.
    #[must_use]
    pub fn for_statement(stmt: &Statement) -> Self {
        let kind = match stmt {
            Statement::Query(_) => StatementKind::Select,
            Statement::Insert(_) => StatementKind::Insert,
            Statement::Update(_) => StatementKind::Update,
            Statement::Delete(_) => StatementKind::Delete,
        };
        StatementContext { kind }
    }

    #[must_use]
    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    #[must_use]
    pub fn in_insert_stmt(&self) -> bool {
        self.kind == StatementKind::Insert
    }
}

/// Evaluation context owned by one query.
///
/// User variables sit behind a lock so `SETVAR` can assign through the shared
/// reference every expression receives.
#[derive(Debug, Default)]
pub struct EvalContext {
    statement: StatementContext,
    params: Vec<Value>,
    user_vars: RwLock<HashMap<String, Value>>,
}

impl EvalContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the statement context.
    #[must_use]
    pub fn with_statement(mut self, statement: StatementContext) -> Self {
        self.statement = statement;
        self
    }

    /// Sets the prepared-statement parameters.
    #[must_use]
    pub fn with_params(mut self, params: Vec<Value>) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn statement(&self) -> &StatementContext {
        &self.statement
    }

    #[must_use]
    pub fn in_insert_stmt(&self) -> bool {
        self.statement.in_insert_stmt()
    }

    /// Returns the parameter bound at `index`.
    ///
    /// # Errors
    ///
    /// Returns `ParamIndexOutOfRange` if no parameter is bound there.
    pub fn param(&self, index: usize) -> Result<&Value> {
        self.params.get(index).ok_or(SableError::ParamIndexOutOfRange {
            len: self.params.len(),
            index,
        })
    }

    /// Reads a user variable. Names are case-insensitive.
    #[must_use]
    pub fn user_var(&self, name: &str) -> Option<Value> {
        self.user_vars.read().get(&name.to_ascii_lowercase()).cloned()
    }

    /// Assigns a user variable. Assigning NULL keeps the variable defined.
    pub fn set_user_var(&self, name: &str, value: Value) {
        self.user_vars.write().insert(name.to_ascii_lowercase(), value);
    }
}
