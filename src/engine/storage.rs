use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::engine::table::Table;
use crate::error::{DbError, Result};

/// File extension of table files inside a database directory.
pub const TABLE_EXTENSION: &str = "tab";

/// Handle on the backing file of one table.
///
/// Tables are never cached: every statement loads the whole file, mutates
/// the in-memory [`Table`] and rewrites the whole file before returning.
///
/// ## File Format
/// ```text
/// marks.tab:
/// id<TAB>name<TAB>mark
/// 1<TAB>Simon<TAB>65
/// 2<TAB>Sion<TAB>55
/// ```
#[derive(Clone, Debug)]
pub struct TableStorage {
    /// Table name as typed in the statement
    pub name: String,
    /// Full path to the table file (dir/name.tab)
    path: PathBuf,
}

impl TableStorage {
    /// Resolves the file for `name` inside the database directory `dir`.
    /// File names are lower-cased so table lookup ignores case.
    pub fn new(dir: &Path, name: &str) -> Self {
        let path = dir.join(format!("{}.{}", name.to_lowercase(), TABLE_EXTENSION));
        Self {
            name: name.to_string(),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Writes a brand-new table file, failing if one already exists.
    pub fn create(&self, table: &Table) -> Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => DbError::TableExists(self.name.clone()),
                _ => DbError::Io(e),
            })?;
        file.write_all(table.serialize().as_bytes())?;
        debug!(path = %self.path.display(), "table file created");
        Ok(())
    }

    /// Reads and parses the whole table file.
    pub fn load(&self) -> Result<Table> {
        let text = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => DbError::TableNotFound(self.name.clone()),
            _ => DbError::Io(e),
        })?;
        Table::parse(self.name.clone(), &text)
    }

    /// Rewrites the whole table file.
    pub fn save(&self, table: &Table) -> Result<()> {
        fs::write(&self.path, table.serialize())?;
        debug!(path = %self.path.display(), rows = table.row_count(), "table file written");
        Ok(())
    }

    pub fn remove(&self) -> Result<()> {
        fs::remove_file(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => DbError::TableNotFound(self.name.clone()),
            _ => DbError::Io(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_load_save() {
        let dir = TempDir::new().unwrap();
        let storage = TableStorage::new(dir.path(), "Marks");
        assert_eq!(storage.path(), dir.path().join("marks.tab"));
        assert!(!storage.exists());

        let mut table = Table::with_columns("Marks", ["id", "name"]).unwrap();
        storage.create(&table).unwrap();
        assert!(storage.exists());
        assert!(matches!(
            storage.create(&table),
            Err(DbError::TableExists(_))
        ));

        table.add_row(["1", "Simon"]).unwrap();
        storage.save(&table).unwrap();
        let loaded = storage.load().unwrap();
        assert_eq!(loaded.header_names(), vec!["id", "name"]);
        assert_eq!(loaded.row_values(0), vec!["1", "Simon"]);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let storage = TableStorage::new(dir.path(), "ghost");
        assert!(matches!(storage.load(), Err(DbError::TableNotFound(_))));
        assert!(matches!(storage.remove(), Err(DbError::TableNotFound(_))));
    }
}
