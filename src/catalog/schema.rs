use serde::{Deserialize, Serialize};

use crate::common::{DbError, Result};

/// Schema of one table as persisted in the catalog log.
///
/// Serialized as a single JSON object:
/// `{"name":"t","columns":["a","b"],"primary_key":"a"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<String>,
    /// Always the first column at creation time
    pub primary_key: String,
}

impl TableSchema {
    /// Builds a schema whose primary key is the first column.
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Result<Self> {
        let name = name.into();
        let primary_key = columns
            .first()
            .cloned()
            .ok_or_else(|| DbError::InvalidSchema(format!("table {name:?} has no columns")))?;

        Ok(Self {
            name,
            columns,
            primary_key,
        })
    }

    /// Returns the position of the named column.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}
