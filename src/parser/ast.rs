//! Abstract Syntax Tree definitions for SQL statements.
//!
//! Two kinds of node carry hint annotations: every [`SelectStmt`] owns a list
//! of optimizer hints and every [`TableName`] owns a list of index hints. The
//! rest of the tree is plain query structure.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A parsed SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// SELECT, possibly combined with UNION.
    Query(Query),
    /// INSERT statement.
    Insert(InsertStmt),
    /// UPDATE statement.
    Update(UpdateStmt),
    /// DELETE statement.
    Delete(DeleteStmt),
}

/// One or more SELECT blocks joined by UNION.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// First SELECT block.
    pub first: Box<SelectStmt>,
    /// Remaining UNION operands, in source order.
    pub unions: Vec<UnionArm>,
}

impl Query {
    /// Creates a query consisting of a single SELECT block.
    #[must_use]
    pub fn single(select: SelectStmt) -> Self {
        Query {
            first: Box::new(select),
            unions: Vec::new(),
        }
    }
}

/// A UNION operand.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionArm {
    /// UNION ALL (true) or UNION DISTINCT (false).
    pub all: bool,
    /// The SELECT block on the right of the operator.
    pub select: SelectStmt,
}

/// A single SELECT query block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectStmt {
    /// Optimizer hints from the `/*+ ... */` comment.
    pub hints: Vec<TableHint>,
    /// SELECT DISTINCT.
    pub distinct: bool,
    /// Select list.
    pub fields: Vec<SelectField>,
    /// FROM clause.
    pub from: Option<TableRef>,
    /// WHERE clause.
    pub where_clause: Option<Expr>,
    /// GROUP BY expressions.
    pub group_by: Vec<Expr>,
    /// HAVING clause.
    pub having: Option<Expr>,
    /// ORDER BY items.
    pub order_by: Vec<OrderByItem>,
    /// LIMIT clause.
    pub limit: Option<Limit>,
}

/// Item in the select list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectField {
    /// `*` or `t.*`.
    Wildcard { table: Option<String> },
    /// Expression with optional alias.
    Expr { expr: Expr, alias: Option<String> },
}

/// ORDER BY item.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expr: Expr,
    /// Sort direction (true = ASC, false = DESC).
    pub ascending: bool,
}

/// LIMIT clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub count: u64,
    pub offset: Option<u64>,
}

/// Table reference in a FROM clause, left-deep for joins.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRef {
    /// A single table or derived table.
    Source(TableSource),
    /// Two references joined together.
    Join(Box<Join>),
}

/// A JOIN between two table references.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub left: TableRef,
    pub right: TableRef,
    pub kind: JoinKind,
    pub on: Option<Expr>,
}

/// Join types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Cross,
    Straight,
}

/// An aliased table factor.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSource {
    pub factor: TableFactor,
    pub alias: Option<String>,
}

/// Something a FROM clause can read from.
#[derive(Debug, Clone, PartialEq)]
pub enum TableFactor {
    /// Base table.
    Table(TableName),
    /// Derived table `(SELECT ...)`.
    Derived(Box<Query>),
}

/// Base table name, the node that owns index hints.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableName {
    pub schema: Option<String>,
    pub name: String,
    pub index_hints: Vec<IndexHint>,
}

impl TableName {
    /// Creates an unqualified table name without hints.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        TableName {
            schema: None,
            name: name.into(),
            index_hints: Vec::new(),
        }
    }
}

/// INSERT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStmt {
    pub table: TableName,
    pub columns: Vec<String>,
    pub source: InsertSource,
    /// `ON DUPLICATE KEY UPDATE` assignments.
    pub on_duplicate: Vec<Assignment>,
}

/// Rows supplied to an INSERT.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    /// `VALUES (..), (..)`.
    Values(Vec<Vec<Expr>>),
    /// `INSERT ... SELECT`.
    Select(Box<Query>),
}

/// UPDATE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStmt {
    pub table: TableRef,
    pub assignments: Vec<Assignment>,
    pub where_clause: Option<Expr>,
    pub order_by: Vec<OrderByItem>,
    pub limit: Option<Limit>,
}

/// DELETE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStmt {
    pub table: TableName,
    pub where_clause: Option<Expr>,
    pub order_by: Vec<OrderByItem>,
    pub limit: Option<Limit>,
}

/// `column = expr` in SET or ON DUPLICATE KEY UPDATE.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: ColumnName,
    pub value: Expr,
}

/// Possibly qualified column name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnName {
    pub schema: Option<String>,
    pub table: Option<String>,
    pub name: String,
}

/// Scalar expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference.
    Column(ColumnName),
    /// Constant.
    Literal(Literal),
    /// `?` placeholder, numbered from 0 in source order.
    Param(usize),
    /// `@name` user variable.
    Variable(String),
    /// Unary operation.
    Unary { op: UnaryOp, expr: Box<Expr> },
    /// Binary operation.
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// IS NULL / IS NOT NULL.
    IsNull { expr: Box<Expr>, negated: bool },
    /// `expr [NOT] IN (list)`.
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    /// `expr [NOT] IN (SELECT ...)`.
    InSubquery {
        expr: Box<Expr>,
        query: Box<Query>,
        negated: bool,
    },
    /// `EXISTS (SELECT ...)`.
    Exists(Box<Query>),
    /// Scalar subquery.
    Subquery(Box<Query>),
    /// Function call; name is lower-cased. `COUNT(*)` has no arguments.
    Function { name: String, args: Vec<Expr> },
    /// `VALUES(col)` inside ON DUPLICATE KEY UPDATE.
    Values(ColumnName),
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

// =============================================================================
// Hints
// =============================================================================

/// Optimizer hint attached to a SELECT block, e.g. `HASH_JOIN(t1, t2)`.
///
/// The name is normalized to lower case at parse time; the parameters are not
/// interpreted here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableHint {
    /// Normalized hint name.
    pub name: String,
    /// Query block the hint targets (`@qb`).
    pub qb_name: Option<String>,
    /// Table arguments.
    pub tables: Vec<HintTable>,
    /// Index arguments, for index-selecting hints.
    pub indexes: Vec<String>,
    /// Integer argument, e.g. `MAX_EXECUTION_TIME(1000)`.
    pub value: Option<u64>,
}

impl TableHint {
    /// Creates a hint with the given name and no arguments.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        TableHint {
            name: name.as_ref().to_ascii_lowercase(),
            qb_name: None,
            tables: Vec::new(),
            indexes: Vec::new(),
            value: None,
        }
    }

    /// Adds a table argument.
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.tables.push(HintTable {
            schema: None,
            table: table.into(),
            qb_name: None,
        });
        self
    }

    /// Returns true for hints whose arguments after the table are index names.
    #[must_use]
    pub fn takes_indexes(name: &str) -> bool {
        matches!(
            name,
            "use_index" | "ignore_index" | "force_index" | "use_index_merge" | "index_lookup"
        )
    }
}

/// Table argument of a [`TableHint`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HintTable {
    pub schema: Option<String>,
    pub table: String,
    pub qb_name: Option<String>,
}

/// Index hint attached to a table name, e.g. `USE INDEX FOR JOIN (idx_a)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexHint {
    pub kind: IndexHintKind,
    pub scope: IndexHintScope,
    pub index_names: Vec<String>,
}

impl IndexHint {
    /// Creates an index hint of the given kind for scans.
    #[must_use]
    pub fn new(kind: IndexHintKind, index_names: Vec<String>) -> Self {
        IndexHint {
            kind,
            scope: IndexHintScope::Scan,
            index_names,
        }
    }
}

/// Index hint directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexHintKind {
    Use,
    Ignore,
    Force,
}

/// Which part of planning an index hint applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexHintScope {
    /// No FOR clause.
    Scan,
    Join,
    OrderBy,
    GroupBy,
}

impl fmt::Display for TableHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        let mut sep = "";
        if let Some(qb) = &self.qb_name {
            write!(f, "@{qb}")?;
            sep = " ";
        }
        for table in &self.tables {
            f.write_str(sep)?;
            if let Some(schema) = &table.schema {
                write!(f, "{schema}.")?;
            }
            f.write_str(&table.table)?;
            if let Some(qb) = &table.qb_name {
                write!(f, "@{qb}")?;
            }
            sep = ", ";
        }
        if !self.indexes.is_empty() {
            f.write_str(if self.tables.is_empty() { "" } else { " " })?;
            f.write_str(&self.indexes.join(", "))?;
        }
        if let Some(value) = self.value {
            write!(f, "{sep}{value}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for IndexHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            IndexHintKind::Use => "USE",
            IndexHintKind::Ignore => "IGNORE",
            IndexHintKind::Force => "FORCE",
        };
        let scope = match self.scope {
            IndexHintScope::Scan => "",
            IndexHintScope::Join => " FOR JOIN",
            IndexHintScope::OrderBy => " FOR ORDER BY",
            IndexHintScope::GroupBy => " FOR GROUP BY",
        };
        write!(f, "{kind} INDEX{scope} ({})", self.index_names.join(", "))
    }
}
