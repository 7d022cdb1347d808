//! PageDB - an embedded page-based relational store in Rust
//!
//! This crate provides the storage and metadata core of a small relational
//! database: table rows and index records are laid out in fixed-size pages of
//! a backing file, and table definitions live in a line-delimited catalog log.
//!
//! # Architecture
//!
//! The system is organized into several layers:
//!
//! - **Storage Layer** (`storage`): Handles disk I/O and page organization
//!   - `PageStore`: Owns the backing file, caches pages, allocates page numbers
//!   - `HeapPage`: Length-prefixed rows packed back to back in a page
//!   - `TableHeap`: Row insertion and full scans over a table's heap pages
//!
//! - **Rows** (`tuple`): The length-prefixed CSV row codec
//!
//! - **Index** (`index`): B-tree node format and a single-leaf B-tree facade
//!
//! - **Catalog** (`catalog`): Table schemas persisted as newline-delimited JSON
//!
//! - **Execution** (`execution`): Routes parsed statements to catalog and storage
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use pagedb::index::BTreeIndex;
//! use pagedb::storage::disk::PageStore;
//! use pagedb::storage::TableHeap;
//!
//! // Rows go to a table heap file
//! let heap = TableHeap::open("users.db").unwrap();
//! heap.insert_row(&["1", "alice"]).unwrap();
//! assert_eq!(heap.read_all_rows().unwrap(), vec![vec!["1", "alice"]]);
//!
//! // Key/value records go to a single B-tree leaf
//! let store = Arc::new(Mutex::new(PageStore::open("index.db").unwrap()));
//! let index = BTreeIndex::create(store).unwrap();
//! index.insert(b"alice", b"1").unwrap();
//! assert_eq!(index.search(b"alice").unwrap(), b"1");
//! ```

pub mod catalog;
pub mod common;
pub mod execution;
pub mod index;
pub mod storage;
pub mod tuple;

// Re-export commonly used types at the crate root
pub use common::{DbError, PageId, Result, Row, SharedPageStore};
