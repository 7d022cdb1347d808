use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::common::{DbError, Result};

use super::TableSchema;

struct CatalogState {
    /// Catalog log, opened for reading and appending
    file: File,
    tables: BTreeMap<String, TableSchema>,
}

/// Catalog maps table names to schemas and mirrors them in a
/// newline-delimited JSON log, one schema per line.
///
/// Every operation holds one lock across the in-memory map and the file.
/// Mutations reach the file before the map, so a failed write leaves the
/// map as it was. Dropping a table rewrites the whole log.
pub struct Catalog {
    path: PathBuf,
    state: Mutex<CatalogState>,
}

impl Catalog {
    /// Opens the catalog log at `path`, creating an empty one if needed, and
    /// replays every line. Any malformed line fails the whole load.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let io_err = |source| DbError::CatalogIo {
            path: path.clone(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)
            .map_err(io_err)?;

        let mut tables = BTreeMap::new();
        for (index, line) in BufReader::new(&file).lines().enumerate() {
            let line = line.map_err(io_err)?;
            let schema: TableSchema =
                serde_json::from_str(&line).map_err(|source| DbError::CatalogDecode {
                    line: index + 1,
                    source,
                })?;
            tables.insert(schema.name.clone(), schema);
        }
        info!(path = %path.display(), tables = tables.len(), "opened catalog");

        Ok(Self {
            path,
            state: Mutex::new(CatalogState { file, tables }),
        })
    }

    fn io_error(&self, source: std::io::Error) -> DbError {
        DbError::CatalogIo {
            path: self.path.clone(),
            source,
        }
    }

    /// Registers a new table and appends its schema to the log.
    /// The primary key is the first column.
    pub fn add_table(&self, name: &str, columns: Vec<String>) -> Result<()> {
        let mut state = self.state.lock();
        if state.tables.contains_key(name) {
            warn!(table = name, "table already exists");
            return Err(DbError::TableAlreadyExists(name.to_string()));
        }

        let schema = TableSchema::new(name, columns)?;
        let mut line = serde_json::to_vec(&schema)?;
        line.push(b'\n');
        state
            .file
            .write_all(&line)
            .map_err(|e| self.io_error(e))?;

        info!(table = name, columns = ?schema.columns, "added table");
        state.tables.insert(schema.name.clone(), schema);
        Ok(())
    }

    /// Returns the schema of `name`, if registered.
    pub fn get_table(&self, name: &str) -> Option<TableSchema> {
        self.state.lock().tables.get(name).cloned()
    }

    /// Returns every schema, ordered by table name. Empty when there are none.
    pub fn list_tables(&self) -> Vec<TableSchema> {
        self.state.lock().tables.values().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.state.lock().tables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.state.lock().tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes a table and rewrites the log from the remaining schemas.
    pub fn drop_table(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock();
        if !state.tables.contains_key(name) {
            return Err(DbError::TableNotFound(name.to_string()));
        }

        let mut remaining = state.tables.clone();
        remaining.remove(name);

        let mut contents = Vec::new();
        for schema in remaining.values() {
            serde_json::to_writer(&mut contents, schema)?;
            contents.push(b'\n');
        }

        // the handle appends, so after truncation writes land at offset 0
        state.file.set_len(0).map_err(|e| self.io_error(e))?;
        state
            .file
            .write_all(&contents)
            .map_err(|e| self.io_error(e))?;

        state.tables = remaining;
        info!(table = name, "dropped table");
        Ok(())
    }

    /// Returns the path of the catalog log.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
