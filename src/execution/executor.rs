use std::fmt;
use std::fs::{self, OpenOptions};
use std::io;

use tracing::{debug, info};

use crate::catalog::{Catalog, TableSchema};
use crate::common::{DatabaseConfig, DbError, Result, Row};
use crate::storage::TableHeap;

use super::predicate::eval_where;
use super::statement::{Expr, Projection, Statement};

/// Outcome of one statement, ready to be printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    Message(String),
    Tables(Vec<TableSchema>),
    Databases(Vec<String>),
    Rows { columns: Vec<String>, rows: Vec<Row> },
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Message(message) => write!(f, "{message}"),
            QueryResult::Tables(tables) if tables.is_empty() => write!(f, "Tables: Empty Database"),
            QueryResult::Tables(tables) => {
                write!(f, "Tables:")?;
                for table in tables {
                    write!(f, "\n - {} : {:?}", table.name, table.columns)?;
                }
                Ok(())
            }
            QueryResult::Databases(names) if names.is_empty() => {
                write!(f, "Databases: No database found.")
            }
            QueryResult::Databases(names) => {
                write!(f, "Databases:")?;
                for name in names {
                    write!(f, "\n - {name}")?;
                }
                Ok(())
            }
            QueryResult::Rows { columns, rows } => {
                write!(f, "{}", columns.join(" | "))?;
                for row in rows {
                    write!(f, "\n{}", row.join(" | "))?;
                }
                Ok(())
            }
        }
    }
}

struct Session {
    database: String,
    catalog: Catalog,
}

/// Executor routes parsed statements to the catalog and table heaps of the
/// currently selected database.
///
/// Each database is a directory under the configured data directory holding
/// a catalog log and one heap file per table.
pub struct Executor {
    config: DatabaseConfig,
    session: Option<Session>,
}

impl Executor {
    /// Creates an executor, creating the data directory if needed.
    pub fn new(config: DatabaseConfig) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self {
            config,
            session: None,
        })
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Name of the selected database, if any.
    pub fn current_database(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.database.as_str())
    }

    pub fn execute(&mut self, statement: &Statement) -> Result<QueryResult> {
        match statement {
            Statement::CreateDatabase { name } => self.create_database(name),
            Statement::UseDatabase { name } => self.use_database(name),
            Statement::ShowDatabases => self.show_databases(),
            Statement::CreateTable { name, columns } => {
                self.session()?.catalog.add_table(name, columns.clone())?;
                Ok(QueryResult::Message(format!("Table created: {name}")))
            }
            Statement::ListTables => Ok(QueryResult::Tables(self.session()?.catalog.list_tables())),
            Statement::Insert {
                table,
                columns,
                values,
            } => self.insert(table, columns, values),
            Statement::Select {
                table,
                columns,
                where_expr,
            } => self.select(table, columns, where_expr.as_ref()),
            Statement::Drop {
                table,
                database,
                columns,
            } => {
                if columns.is_some() {
                    return Err(DbError::Unsupported("DROP COLUMN".to_string()));
                }
                match (table, database) {
                    (Some(table), _) => self.drop_table(table),
                    (None, Some(database)) => self.drop_database(database),
                    (None, None) => Err(DbError::Unsupported(
                        "DROP without a table or database".to_string(),
                    )),
                }
            }
        }
    }

    fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(DbError::NoDatabaseSelected)
    }

    fn table_heap(&self, session: &Session, table: &str) -> Result<TableHeap> {
        TableHeap::open(self.config.table_path(&session.database, table))
    }

    fn create_database(&self, name: &str) -> Result<QueryResult> {
        fs::create_dir_all(self.config.database_dir(name))?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.config.catalog_path(name))?;

        info!(database = name, "created database");
        Ok(QueryResult::Message(format!("Database '{name}' created.")))
    }

    fn use_database(&mut self, name: &str) -> Result<QueryResult> {
        let catalog_path = self.config.catalog_path(name);
        if !catalog_path.exists() {
            return Err(DbError::DatabaseNotFound(name.to_string()));
        }

        let catalog = Catalog::open(catalog_path)?;
        self.session = Some(Session {
            database: name.to_string(),
            catalog,
        });

        info!(database = name, "switched database");
        Ok(QueryResult::Message(format!("Switched to database '{name}'.")))
    }

    fn show_databases(&self) -> Result<QueryResult> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.config.data_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(QueryResult::Databases(names))
    }

    fn insert(
        &self,
        table: &str,
        columns: &[String],
        values: &[Vec<String>],
    ) -> Result<QueryResult> {
        let session = self.session()?;
        let schema = session
            .catalog
            .get_table(table)
            .ok_or_else(|| DbError::TableNotFound(table.to_string()))?;
        if schema.columns != columns {
            return Err(DbError::ColumnMismatch {
                expected: schema.columns,
                actual: columns.to_vec(),
            });
        }

        if let Some(row) = values.iter().find(|row| row.len() != schema.column_count()) {
            return Err(DbError::ColumnMismatch {
                expected: schema.columns,
                actual: row.clone(),
            });
        }

        let heap = self.table_heap(session, table)?;
        for row in values {
            heap.insert_row(row.as_slice())?;
        }

        debug!(table, rows = values.len(), "inserted rows");
        Ok(QueryResult::Message(format!(
            "{} row(s) inserted.",
            values.len()
        )))
    }

    fn select(
        &self,
        table: &str,
        projection: &Projection,
        where_expr: Option<&Expr>,
    ) -> Result<QueryResult> {
        let session = self.session()?;
        let schema = session
            .catalog
            .get_table(table)
            .ok_or_else(|| DbError::TableNotFound(table.to_string()))?;

        let indices = match projection {
            Projection::All => (0..schema.column_count()).collect::<Vec<_>>(),
            Projection::Columns(names) => names
                .iter()
                .map(|name| {
                    schema
                        .column_index(name)
                        .ok_or_else(|| DbError::UnknownColumn(name.clone()))
                })
                .collect::<Result<Vec<_>>>()?,
        };

        let rows = self
            .table_heap(session, table)?
            .read_all_rows()?
            .into_iter()
            .filter(|row| where_expr.map_or(true, |expr| eval_where(expr, &schema.columns, row)))
            .map(|row| {
                indices
                    .iter()
                    .map(|&i| row.get(i).cloned().unwrap_or_default())
                    .collect::<Row>()
            })
            .collect::<Vec<_>>();

        debug!(table, rows = rows.len(), "selected rows");
        Ok(QueryResult::Rows {
            columns: indices.iter().map(|&i| schema.columns[i].clone()).collect(),
            rows,
        })
    }

    fn drop_table(&self, table: &str) -> Result<QueryResult> {
        let session = self.session()?;
        session.catalog.drop_table(table)?;

        let path = self.config.table_path(&session.database, table);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        Ok(QueryResult::Message(format!("Table '{table}' dropped.")))
    }

    fn drop_database(&self, database: &str) -> Result<QueryResult> {
        if self.current_database() == Some(database) {
            return Err(DbError::CannotDropCurrentDatabase(database.to_string()));
        }

        let dir = self.config.database_dir(database);
        if !dir.is_dir() {
            return Err(DbError::DatabaseNotFound(database.to_string()));
        }
        fs::remove_dir_all(&dir)?;

        info!(database, "dropped database");
        Ok(QueryResult::Message(format!("Database '{database}' dropped.")))
    }
}
