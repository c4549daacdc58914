use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::info;

use crate::engine::storage::TableStorage;
use crate::error::{DbError, Result};

/// Directory layout of every database the server knows about.
///
/// ## Layout
/// ```text
/// <root>/
///   markbook/          <- one directory per database
///     marks.tab        <- one file per table
///     students.tab
///   coursework/
///     ...
/// ```
///
/// Database names are lower-cased on disk, so `USE MarkBook` and
/// `USE markbook` select the same directory.
#[derive(Clone, Debug)]
pub struct Catalog {
    root: PathBuf,
}

impl Catalog {
    /// Opens the catalog, creating the root directory if needed.
    pub fn open<P: Into<PathBuf>>(root: P) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn database_path(&self, name: &str) -> PathBuf {
        self.root.join(name.to_lowercase())
    }

    pub fn database_exists(&self, name: &str) -> bool {
        self.database_path(name).is_dir()
    }

    /// Creates the directory for a new database.
    pub fn create_database(&self, name: &str) -> Result<PathBuf> {
        let path = self.database_path(name);
        fs::create_dir(&path).map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => DbError::DatabaseExists(name.to_string()),
            _ => DbError::Io(e),
        })?;
        info!(database = name, "database created");
        Ok(path)
    }

    /// Recursively deletes a database directory and every table in it.
    pub fn drop_database(&self, name: &str) -> Result<()> {
        let path = self.database_path(name);
        if !path.is_dir() {
            return Err(DbError::DatabaseNotFound(name.to_string()));
        }
        fs::remove_dir_all(&path)?;
        info!(database = name, "database dropped");
        Ok(())
    }

    /// Storage handle for `table` inside the database directory `database`.
    pub fn table(&self, database: &Path, table: &str) -> TableStorage {
        TableStorage::new(database, table)
    }
}
