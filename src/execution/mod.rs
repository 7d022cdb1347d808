//! Statement execution on top of the catalog and table heaps.
//!
//! Statements arrive already parsed; this layer only validates them against
//! the catalog and routes them to storage.

mod executor;
mod predicate;
mod statement;

pub use executor::{Executor, QueryResult};
pub use predicate::eval_where;
pub use statement::{CompareOp, Expr, LogicalOp, Projection, Statement};
