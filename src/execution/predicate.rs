use super::statement::{Expr, LogicalOp};

/// Evaluates a WHERE tree against one row.
///
/// Values are compared as strings with surrounding single quotes removed on
/// both sides. A condition on a column that is missing from `columns` (or
/// from a short row) is false.
pub fn eval_where(expr: &Expr, columns: &[String], row: &[String]) -> bool {
    match expr {
        Expr::Condition { column, op, value } => {
            let Some(cell) = columns
                .iter()
                .position(|c| c == column)
                .and_then(|i| row.get(i))
            else {
                return false;
            };
            op.apply(cell.trim_matches('\''), value.trim_matches('\''))
        }
        Expr::Binary { left, op, right } => {
            let left = eval_where(left, columns, row);
            let right = eval_where(right, columns, row);
            match op {
                LogicalOp::And => left && right,
                LogicalOp::Or => left || right,
            }
        }
    }
}
