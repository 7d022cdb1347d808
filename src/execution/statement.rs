/// A parsed statement, one variant per statement kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    CreateDatabase {
        name: String,
    },
    UseDatabase {
        name: String,
    },
    ShowDatabases,
    CreateTable {
        name: String,
        columns: Vec<String>,
    },
    ListTables,
    Insert {
        table: String,
        columns: Vec<String>,
        /// One inner list per `VALUES (...)` tuple
        values: Vec<Vec<String>>,
    },
    Select {
        table: String,
        columns: Projection,
        where_expr: Option<Expr>,
    },
    Drop {
        table: Option<String>,
        database: Option<String>,
        columns: Option<Vec<String>>,
    },
}

/// Column list of a SELECT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// `SELECT *`
    All,
    Columns(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    Lt,
    GtEq,
    LtEq,
}

impl CompareOp {
    /// Compares two values as strings.
    pub fn apply(&self, left: &str, right: &str) -> bool {
        match self {
            CompareOp::Eq => left == right,
            CompareOp::NotEq => left != right,
            CompareOp::Gt => left > right,
            CompareOp::Lt => left < right,
            CompareOp::GtEq => left >= right,
            CompareOp::LtEq => left <= right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// WHERE clause tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// `column <op> value`
    Condition {
        column: String,
        op: CompareOp,
        value: String,
    },
    Binary {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn condition(column: impl Into<String>, op: CompareOp, value: impl Into<String>) -> Self {
        Expr::Condition {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op: LogicalOp::And,
            right: Box::new(right),
        }
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op: LogicalOp::Or,
            right: Box::new(right),
        }
    }
}
