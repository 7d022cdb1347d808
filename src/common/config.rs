use std::path::PathBuf;

/// Size of a page in bytes (4 KB)
pub const PAGE_SIZE: usize = 4096;

/// Size of the B-tree node header at the start of a node page
pub const NODE_HEADER_SIZE: usize = 11;

/// File name of the per-database catalog log
pub const CATALOG_FILE_NAME: &str = "catalog.db";

/// Extension of per-table heap files
pub const TABLE_FILE_EXTENSION: &str = "db";

/// Directory holding one subdirectory per database
pub const DEFAULT_DATA_DIR: &str = "data";

/// Runtime configuration deciding where databases live on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Root directory; each database is a subdirectory of it.
    pub data_dir: PathBuf,
}

impl DatabaseConfig {
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Sets the data directory.
    pub fn with_data_dir<P: Into<PathBuf>>(mut self, data_dir: P) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Directory of the given database.
    pub fn database_dir(&self, database: &str) -> PathBuf {
        self.data_dir.join(database)
    }

    /// Catalog log path of the given database.
    pub fn catalog_path(&self, database: &str) -> PathBuf {
        self.database_dir(database).join(CATALOG_FILE_NAME)
    }

    /// Heap file path of a table inside the given database.
    pub fn table_path(&self, database: &str, table: &str) -> PathBuf {
        self.database_dir(database)
            .join(format!("{table}.{TABLE_FILE_EXTENSION}"))
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_paths() {
        let config = DatabaseConfig::default().with_data_dir("/tmp/pagedb");

        assert_eq!(
            config.catalog_path("shop"),
            PathBuf::from("/tmp/pagedb/shop/catalog.db")
        );
        assert_eq!(
            config.table_path("shop", "orders"),
            PathBuf::from("/tmp/pagedb/shop/orders.db")
        );
    }
}
