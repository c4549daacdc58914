use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

pub mod catalog;
pub mod condition;
pub mod executor;
pub mod storage;
pub mod table;

pub use catalog::Catalog;
pub use condition::{evaluate, Condition};
pub use executor::{execute_join, execute_select_scan, Projection, ResultSet};
pub use storage::TableStorage;
pub use table::{check_cell_value, Header, Row, Table, ID_COLUMN};

use crate::error::{DbError, Result};

/// The database currently selected by USE or CREATE DATABASE.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    /// Database name as typed by the user
    pub database: String,
    /// Directory holding the database's table files
    pub path: PathBuf,
}

/// ALTER TABLE action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlterAction {
    Add,
    Drop,
}

/// What a successful operation hands back to the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The statement was applied; nothing to show.
    Done,
    /// SELECT or JOIN output.
    Rows(ResultSet),
}

/// The operation engine: applies one statement at a time to the table files
/// under the catalog root.
///
/// ## Lifecycle of a table operation
/// ```text
/// check session → load table file → mutate in memory → rewrite table file
/// ```
///
/// Every check happens before the rewrite, so a failing statement never
/// touches the file. The engine owns its [`Session`]; there is no global
/// "current database". Give each client its own engine.
pub struct Engine {
    catalog: Catalog,
    session: Option<Session>,
}

impl Engine {
    /// Opens an engine on `root`, creating the directory if needed. No
    /// database is selected yet.
    pub fn open<P: Into<PathBuf>>(root: P) -> Result<Self> {
        let catalog = Catalog::open(root)?;
        debug!(root = %catalog.root().display(), "engine opened");
        Ok(Self {
            catalog,
            session: None,
        })
    }

    pub fn root(&self) -> &Path {
        self.catalog.root()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Selects an existing database.
    pub fn use_database(&mut self, name: &str) -> Result<Outcome> {
        if !self.catalog.database_exists(name) {
            return Err(DbError::DatabaseNotFound(name.to_string()));
        }
        self.select(name);
        Ok(Outcome::Done)
    }

    /// Creates a database directory and selects it.
    pub fn create_database(&mut self, name: &str) -> Result<Outcome> {
        self.catalog.create_database(name)?;
        self.select(name);
        Ok(Outcome::Done)
    }

    /// Deletes a database and every table in it. Dropping the selected
    /// database clears the session.
    pub fn drop_database(&mut self, name: &str) -> Result<Outcome> {
        self.catalog.drop_database(name)?;
        let path = self.catalog.database_path(name);
        if self.session.as_ref().is_some_and(|s| s.path == path) {
            info!(database = name, "selected database dropped; session cleared");
            self.session = None;
        }
        Ok(Outcome::Done)
    }

    /// Creates an empty table whose header is `id` followed by `columns`.
    ///
    /// `id` may be listed first explicitly; anywhere else it is rejected, as
    /// are duplicate column names.
    pub fn create_table(&mut self, name: &str, columns: &[String]) -> Result<Outcome> {
        let storage = self.storage(name)?;
        if storage.exists() {
            return Err(DbError::TableExists(name.to_string()));
        }

        let user_columns = match columns.first() {
            Some(first) if first.eq_ignore_ascii_case(ID_COLUMN) => &columns[1..],
            _ => columns,
        };
        if let Some(id) = user_columns.iter().find(|c| c.eq_ignore_ascii_case(ID_COLUMN)) {
            return Err(DbError::ReservedColumn(id.clone()));
        }

        let table = Table::with_columns(
            name,
            std::iter::once(ID_COLUMN.to_string()).chain(user_columns.iter().cloned()),
        )?;
        storage.create(&table)?;
        info!(table = name, columns = table.headers().len(), "table created");
        Ok(Outcome::Done)
    }

    pub fn drop_table(&mut self, name: &str) -> Result<Outcome> {
        self.storage(name)?.remove()?;
        info!(table = name, "table dropped");
        Ok(Outcome::Done)
    }

    /// Adds or drops a column on every row of a table. The `id` column can
    /// be neither added nor dropped.
    pub fn alter_table(&mut self, name: &str, action: AlterAction, column: &str) -> Result<Outcome> {
        let storage = self.storage(name)?;
        let mut table = storage.load()?;

        if column.eq_ignore_ascii_case(ID_COLUMN) {
            return Err(match action {
                AlterAction::Add => DbError::ColumnExists(column.to_string()),
                AlterAction::Drop => DbError::ReservedColumn(column.to_string()),
            });
        }

        match action {
            AlterAction::Add => {
                table.add_column(column)?;
            }
            AlterAction::Drop => table.delete_column(column)?,
        }
        storage.save(&table)?;
        debug!(table = name, ?action, column, "table altered");
        Ok(Outcome::Done)
    }

    /// Appends a row. Its id is the row count before the insert plus one,
    /// which repeats an existing id once rows have been deleted.
    ///
    /// ## Arguments
    /// * `name` - Table in the selected database
    /// * `values` - One value per non-id column, in header order
    ///
    /// ## Returns
    /// * `Ok(Outcome::Done)` - Row appended and file rewritten
    /// * `Err(ValueCountMismatch)` - Wrong number of values
    /// * `Err(InvalidValue)` - A value holds a tab or line break
    pub fn insert_into_table(&mut self, name: &str, values: &[String]) -> Result<Outcome> {
        let storage = self.storage(name)?;
        let mut table = storage.load()?;

        let expected = table.headers().len().saturating_sub(1);
        if values.len() != expected {
            return Err(DbError::ValueCountMismatch {
                expected,
                found: values.len(),
            });
        }

        for value in values {
            check_cell_value(value)?;
        }

        let next_id = table.row_count() + 1;
        table.add_row(std::iter::once(next_id.to_string()).chain(values.iter().cloned()))?;
        storage.save(&table)?;
        debug!(table = name, id = next_id, "row inserted");
        Ok(Outcome::Done)
    }

    /// Filters and projects a table without modifying it.
    ///
    /// ## Arguments
    /// * `name` - Table in the selected database
    /// * `projection` - `*` or the requested columns, in output order
    /// * `condition` - Row filter, evaluated on the full unprojected row
    ///
    /// ## Returns
    /// * `Ok(Outcome::Rows(_))` - Projected header plus matching rows in file order
    /// * `Err(ColumnNotFound)` - A projected column does not exist
    /// * `Err(UnknownConditionAttribute)` - A single-term condition names an unknown column
    pub fn select_from_table(
        &mut self,
        name: &str,
        projection: &Projection,
        condition: &Condition,
    ) -> Result<Outcome> {
        let table = self.storage(name)?.load()?;
        check_condition(&table, condition)?;
        let result = execute_select_scan(&table, projection, condition)?;
        debug!(table = name, rows = result.len(), "rows selected");
        Ok(Outcome::Rows(result))
    }

    /// Applies every `column = value` assignment to each row matching the
    /// condition. All assignments are checked before any row changes.
    ///
    /// ## Arguments
    /// * `name` - Table in the selected database
    /// * `assignments` - `(column, value)` pairs, applied in order
    /// * `condition` - Selects the rows to change
    ///
    /// ## Returns
    /// * `Ok(Outcome::Done)` - Matching rows updated and file rewritten
    /// * `Err(ColumnNotFound)` / `Err(ReservedColumn)` - Bad assignment column
    /// * `Err(InvalidValue)` - A value holds a tab or line break
    pub fn update_table(
        &mut self,
        name: &str,
        assignments: &[(String, String)],
        condition: &Condition,
    ) -> Result<Outcome> {
        let storage = self.storage(name)?;
        let mut table = storage.load()?;
        check_condition(&table, condition)?;

        for (column, value) in assignments {
            check_cell_value(value)?;
            if column.eq_ignore_ascii_case(ID_COLUMN) {
                return Err(DbError::ReservedColumn(column.clone()));
            }
            if !table.has_column(column) {
                return Err(DbError::ColumnNotFound(column.clone()));
            }
        }

        let header: Vec<String> = table.header_names().into_iter().map(String::from).collect();
        let matching: Vec<usize> = (0..table.row_count())
            .filter(|&i| condition.matches(&header, &table.row_values(i)))
            .collect();

        for &index in &matching {
            for (column, value) in assignments {
                table.update_cell(index, column, value.as_str())?;
            }
        }
        storage.save(&table)?;
        debug!(table = name, rows = matching.len(), "rows updated");
        Ok(Outcome::Done)
    }

    /// Removes every row matching the condition in one pass. Surviving rows
    /// keep their ids.
    ///
    /// ## Returns
    /// * `Ok(Outcome::Done)` - Matching rows removed and file rewritten
    /// * `Err(UnknownConditionAttribute)` / `Err(InvalidCondition)` - Bad single-term condition
    pub fn delete_from_table(&mut self, name: &str, condition: &Condition) -> Result<Outcome> {
        let storage = self.storage(name)?;
        let mut table = storage.load()?;
        check_condition(&table, condition)?;

        let header: Vec<String> = table.header_names().into_iter().map(String::from).collect();
        let removed = table.retain_rows(|headers, row| {
            let values: Vec<&str> = headers.iter().map(|h| row.get(h.id)).collect();
            !condition.matches(&header, &values)
        });
        storage.save(&table)?;
        debug!(table = name, rows = removed, "rows deleted");
        Ok(Outcome::Done)
    }

    /// Nested-loop join of two tables on `left_attr == right_attr`.
    ///
    /// ## Arguments
    /// * `left`, `right` - Tables in the selected database
    /// * `left_attr`, `right_attr` - Join columns of each side
    ///
    /// ## Returns
    /// * `Ok(Outcome::Rows(_))` - See [`execute_join`] for the column layout
    /// * `Err(TableNotFound)` / `Err(ColumnNotFound)` - Missing table or join column
    pub fn join_tables(
        &mut self,
        left: &str,
        right: &str,
        left_attr: &str,
        right_attr: &str,
    ) -> Result<Outcome> {
        let left_table = self.storage(left)?.load()?;
        let right_table = self.storage(right)?.load()?;
        let result = execute_join(&left_table, &right_table, left_attr, right_attr)?;
        debug!(left, right, rows = result.len(), "tables joined");
        Ok(Outcome::Rows(result))
    }

    fn select(&mut self, name: &str) {
        let path = self.catalog.database_path(name);
        info!(database = name, "database selected");
        self.session = Some(Session {
            database: name.to_string(),
            path,
        });
    }

    /// Storage handle for a table of the selected database.
    fn storage(&self, table: &str) -> Result<TableStorage> {
        let session = self.session.as_ref().ok_or(DbError::NoDatabaseSelected)?;
        if !session.path.is_dir() {
            return Err(DbError::DatabaseNotFound(session.database.clone()));
        }
        Ok(self.catalog.table(&session.path, table))
    }
}

/// Runs the strict single-term check and reports non-fatal problems of
/// grouped conditions.
fn check_condition(table: &Table, condition: &Condition) -> Result<()> {
    let header = table.header_names();
    condition.validate(&header)?;
    for diagnostic in condition.diagnostics(&header) {
        warn!(table = table.name(), "{}", diagnostic);
    }
    Ok(())
}
