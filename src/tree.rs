//! The statement tree the renderer walks.
//!
//! A closed set of variants covering the four supported statement kinds plus
//! UNION. Leaf expressions keep the parser's own serialization so the renderer
//! can print anything it does not restructure.

/// A parsed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Box<Select>),
    Insert(Box<Insert>),
    Update(Box<Update>),
    Delete(Box<Delete>),
    Union(Box<Union>),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Select {
    pub distinct: bool,
    pub projection: Vec<SelectItem>,
    pub from: Vec<TableExpr>,
    pub selection: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderItem>,
    pub limit: Option<Limit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    /// `REPLACE INTO` instead of `INSERT INTO`.
    pub replace: bool,
    pub table: String,
    pub columns: Vec<String>,
    pub source: InsertSource,
    /// `ON DUPLICATE KEY UPDATE` assignments, serialized.
    pub on_duplicate: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    Values(Vec<Vec<Expr>>),
    Query(Statement),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub tables: Vec<TableExpr>,
    /// `SET` assignments, serialized.
    pub assignments: Vec<String>,
    pub selection: Option<Expr>,
    pub order_by: Vec<OrderItem>,
    pub limit: Option<Limit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub tables: Vec<TableExpr>,
    pub selection: Option<Expr>,
    pub order_by: Vec<OrderItem>,
    pub limit: Option<Limit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Union {
    pub left: Statement,
    pub right: Statement,
    /// `UNION ALL` rather than `UNION`.
    pub all: bool,
    pub order_by: Vec<OrderItem>,
    pub limit: Option<Limit>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    Expr { expr: Expr, alias: Option<String> },
    /// `*`, `t.*` and anything else rendered verbatim.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableExpr {
    /// A named table with an optional alias.
    Plain { name: String, alias: Option<String> },
    /// A subquery in table position.
    Derived {
        subquery: Statement,
        alias: Option<String>,
    },
    Join {
        left: Box<TableExpr>,
        kind: JoinKind,
        right: Box<TableExpr>,
        constraint: Option<JoinConstraint>,
    },
    /// Parenthesized table expressions.
    Group {
        members: Vec<TableExpr>,
        alias: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinKind {
    pub fn keyword(self, natural: bool) -> &'static str {
        match (self, natural) {
            (JoinKind::Inner, false) => "JOIN",
            (JoinKind::Inner, true) => "NATURAL JOIN",
            (JoinKind::Left, false) => "LEFT JOIN",
            (JoinKind::Left, true) => "NATURAL LEFT JOIN",
            (JoinKind::Right, false) => "RIGHT JOIN",
            (JoinKind::Right, true) => "NATURAL RIGHT JOIN",
            (JoinKind::Full, false) => "FULL JOIN",
            (JoinKind::Full, true) => "NATURAL FULL JOIN",
            (JoinKind::Cross, _) => "CROSS JOIN",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinConstraint {
    On(Expr),
    Using(Vec<String>),
    Natural,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub expr: Expr,
    pub desc: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Limit {
    pub row_count: Option<Expr>,
    pub offset: Option<Expr>,
}

/// Boolean and value expressions.
///
/// `And`/`Or` keep both their operands, for filter line splitting, and their
/// serialized text, for when they are printed as a single line.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    And {
        left: Box<Expr>,
        right: Box<Expr>,
        text: String,
    },
    Or {
        left: Box<Expr>,
        right: Box<Expr>,
        text: String,
    },
    Comparison {
        left: Box<Expr>,
        op: String,
        right: Box<Expr>,
    },
    Exists {
        negated: bool,
        subquery: Box<Statement>,
    },
    Subquery(Box<Statement>),
    Raw(String),
}

impl Expr {
    pub fn raw(text: impl Into<String>) -> Self {
        Expr::Raw(text.into())
    }
}
