use std::path::PathBuf;

use thiserror::Error;

use super::types::PageId;

/// Database error types
#[derive(Error, Debug)]
pub enum DbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data of {len} bytes exceeds page size {page_size}")]
    DataExceedsPageSize { len: usize, page_size: usize },

    #[error("Page {0} is not a leaf node (internal nodes are not supported)")]
    NotALeaf(PageId),

    #[error("Leaf node full: record needs {needed} bytes, {available} available")]
    NodeFull { needed: usize, available: usize },

    #[error("Key not found")]
    KeyNotFound,

    #[error("Index corrupted: {0}")]
    IndexCorrupted(String),

    #[error("Table {0:?} already exists")]
    TableAlreadyExists(String),

    #[error("Table {0:?} does not exist")]
    TableNotFound(String),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Catalog file {path:?}: {source}")]
    CatalogIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog entry on line {line}: {source}")]
    CatalogDecode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode catalog entry: {0}")]
    CatalogEncode(#[from] serde_json::Error),

    #[error("No database selected. Use CREATE DATABASE and USE first")]
    NoDatabaseSelected,

    #[error("Database {0:?} does not exist")]
    DatabaseNotFound(String),

    #[error("Cannot drop the currently selected database {0:?}")]
    CannotDropCurrentDatabase(String),

    #[error("Column mismatch: expected {expected:?}, got {actual:?}")]
    ColumnMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Column {0:?} does not exist")]
    UnknownColumn(String),

    #[error("Unsupported statement: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, DbError>;
