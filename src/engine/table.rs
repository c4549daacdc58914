use std::collections::HashMap;
use std::fmt;

use crate::error::{DbError, Result};

/// Name of the implicitly managed first column of every table.
pub const ID_COLUMN: &str = "id";

/// Fails when `value` holds a character the file format uses as a
/// separator. Cells are written unescaped.
pub fn check_cell_value(value: &str) -> Result<()> {
    if value.contains(['\t', '\n', '\r']) {
        return Err(DbError::InvalidValue(value.to_string()));
    }
    Ok(())
}

/// Stable identity of a column within one loaded table.
///
/// Rows store their cells keyed by this id rather than by position, so
/// adding or dropping a column never shifts the cells of the others.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(u32);

/// A column name. Case is preserved; lookups ignore it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub id: ColumnId,
    pub name: String,
}

/// One row: a cell for every column of the owning table's current schema.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Row {
    cells: HashMap<ColumnId, String>,
}

impl Row {
    pub fn get(&self, column: ColumnId) -> &str {
        self.cells.get(&column).map(String::as_str).unwrap_or("")
    }
}

/// In-memory image of a table file: ordered headers plus ordered rows.
///
/// Invariant: every row holds exactly one cell per header. All mutation goes
/// through the methods below, which update the schema and every row together.
#[derive(Clone, Debug)]
pub struct Table {
    name: String,
    headers: Vec<Header>,
    rows: Vec<Row>,
    next_column: u32,
}

impl Table {
    /// Empty table with no columns.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            headers: Vec::new(),
            rows: Vec::new(),
            next_column: 0,
        }
    }

    /// Empty table with the given columns, in order.
    pub fn with_columns<I, S>(name: impl Into<String>, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Table::new(name);
        for column in columns {
            table.add_column(column)?;
        }
        Ok(table)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    pub fn header_names(&self) -> Vec<&str> {
        self.headers.iter().map(|h| h.name.as_str()).collect()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cells of row `index` in header order.
    pub fn row_values(&self, index: usize) -> Vec<&str> {
        let row = &self.rows[index];
        self.headers.iter().map(|h| row.get(h.id)).collect()
    }

    /// Finds a column by name, ignoring ASCII case.
    pub fn lookup_column(&self, name: &str) -> Option<ColumnId> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.id)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.lookup_column(name).is_some()
    }

    /// Appends a column, giving every existing row an empty cell for it.
    pub fn add_column(&mut self, name: impl Into<String>) -> Result<ColumnId> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(DbError::ColumnExists(name));
        }
        let id = ColumnId(self.next_column);
        self.next_column += 1;
        for row in &mut self.rows {
            row.cells.insert(id, String::new());
        }
        self.headers.push(Header { id, name });
        Ok(id)
    }

    /// Removes a column and its cell from every row.
    pub fn delete_column(&mut self, name: &str) -> Result<()> {
        let id = self
            .lookup_column(name)
            .ok_or_else(|| DbError::ColumnNotFound(name.to_string()))?;
        self.headers.retain(|h| h.id != id);
        for row in &mut self.rows {
            row.cells.remove(&id);
        }
        Ok(())
    }

    /// Appends a row whose values line up with the headers.
    pub fn add_row<I, S>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.len() != self.headers.len() {
            return Err(DbError::ValueCountMismatch {
                expected: self.headers.len(),
                found: values.len(),
            });
        }
        let cells = self.headers.iter().map(|h| h.id).zip(values).collect();
        self.rows.push(Row { cells });
        Ok(())
    }

    pub fn delete_row_at(&mut self, index: usize) -> Row {
        self.rows.remove(index)
    }

    /// Keeps the rows for which `keep` returns true, in order, and returns how
    /// many were dropped.
    pub fn retain_rows<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&[Header], &Row) -> bool,
    {
        let before = self.rows.len();
        let headers = &self.headers;
        self.rows.retain(|row| keep(headers, row));
        before - self.rows.len()
    }

    pub fn update_cell(&mut self, row_index: usize, column: &str, value: impl Into<String>) -> Result<()> {
        let id = self
            .lookup_column(column)
            .ok_or_else(|| DbError::ColumnNotFound(column.to_string()))?;
        let row = self
            .rows
            .get_mut(row_index)
            .ok_or_else(|| DbError::CorruptTable(self.name.clone()))?;
        row.cells.insert(id, value.into());
        Ok(())
    }

    /// Parses the on-disk form: a tab-separated header line followed by one
    /// tab-separated line per row.
    ///
    /// A row that is short by any number of trailing cells is padded with
    /// empty ones; cells beyond the last header are ignored. An empty file
    /// yields a table holding only the `id` column.
    pub fn parse(name: impl Into<String>, text: &str) -> Result<Self> {
        let name = name.into();
        let mut lines = text.lines();
        let columns: Vec<&str> = match lines.next() {
            Some(line) if !line.is_empty() => line.split('\t').collect(),
            _ => vec![ID_COLUMN],
        };
        let mut table = Table::with_columns(name.clone(), columns)
            .map_err(|_| DbError::CorruptTable(name.clone()))?;

        let width = table.headers.len();
        for line in lines.filter(|l| !l.is_empty()) {
            let mut values: Vec<&str> = line.split('\t').take(width).collect();
            values.resize(width, "");
            table.add_row(values)?;
        }
        Ok(table)
    }

    /// Renders the on-disk form; every line is newline-terminated.
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header_names().join("\t"))?;
        for index in 0..self.rows.len() {
            writeln!(f, "{}", self.row_values(index).join("\t"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marks() -> Table {
        let mut table = Table::with_columns("marks", ["id", "name", "mark"]).unwrap();
        table.add_row(["1", "Simon", "65"]).unwrap();
        table.add_row(["2", "Sion", "55"]).unwrap();
        table
    }

    #[test]
    fn test_serialize_and_parse() {
        let table = marks();
        let text = table.serialize();
        assert_eq!(text, "id\tname\tmark\n1\tSimon\t65\n2\tSion\t55\n");

        let parsed = Table::parse("marks", &text).unwrap();
        assert_eq!(parsed.header_names(), table.header_names());
        assert_eq!(parsed.row_count(), 2);
        assert_eq!(parsed.row_values(1), vec!["2", "Sion", "55"]);
    }

    #[test]
    fn test_parse_pads_short_rows() {
        let table = Table::parse("t", "id\tname\tage\n1\tBob\n2\n").unwrap();
        assert_eq!(table.row_values(0), vec!["1", "Bob", ""]);
        assert_eq!(table.row_values(1), vec!["2", "", ""]);
    }

    #[test]
    fn test_parse_drops_extra_cells() {
        let table = Table::parse("t", "id\tname\n1\tBob\textra\n2\tSue\n").unwrap();
        assert_eq!(table.header_names(), vec!["id", "name"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.row_values(0), vec!["1", "Bob"]);
        assert_eq!(table.serialize(), "id\tname\n1\tBob\n2\tSue\n");
    }

    #[test]
    fn test_cell_values_exclude_separators() {
        assert!(check_cell_value("Bob Smith").is_ok());
        assert!(check_cell_value("").is_ok());
        for bad in ["a\tb", "a\nb", "a\r"] {
            assert!(matches!(
                check_cell_value(bad),
                Err(DbError::InvalidValue(v)) if v == bad
            ));
        }
    }

    #[test]
    fn test_parse_empty_file() {
        let table = Table::parse("t", "").unwrap();
        assert_eq!(table.header_names(), vec!["id"]);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_add_column_fills_rows() {
        let mut table = marks();
        table.add_column("age").unwrap();
        assert_eq!(table.header_names(), vec!["id", "name", "mark", "age"]);
        assert_eq!(table.row_values(0), vec!["1", "Simon", "65", ""]);
        assert!(matches!(
            table.add_column("NAME"),
            Err(DbError::ColumnExists(_))
        ));
    }

    #[test]
    fn test_delete_column_keeps_other_cells() {
        let mut table = marks();
        table.add_column("age").unwrap();
        table.update_cell(0, "age", "21").unwrap();
        table.delete_column("name").unwrap();
        assert_eq!(table.header_names(), vec!["id", "mark", "age"]);
        assert_eq!(table.row_values(0), vec!["1", "65", "21"]);
        assert!(matches!(
            table.delete_column("name"),
            Err(DbError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_readding_column_starts_empty() {
        let mut table = marks();
        table.delete_column("mark").unwrap();
        table.add_column("mark").unwrap();
        assert_eq!(table.row_values(0), vec!["1", "Simon", ""]);
    }

    #[test]
    fn test_add_row_checks_width() {
        let mut table = marks();
        assert!(matches!(
            table.add_row(["3", "Rob"]),
            Err(DbError::ValueCountMismatch {
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn test_row_removal() {
        let mut table = marks();
        table.add_row(["3", "Rob", "35"]).unwrap();
        let removed = table.delete_row_at(0);
        assert_eq!(removed.get(table.lookup_column("name").unwrap()), "Simon");
        let name = table.lookup_column("name").unwrap();
        let dropped = table.retain_rows(|_, row| row.get(name) != "Rob");
        assert_eq!(dropped, 1);
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.row_values(0), vec!["2", "Sion", "55"]);
    }

    #[test]
    fn test_lookup_ignores_case() {
        let table = marks();
        assert_eq!(table.lookup_column("MARK"), table.lookup_column("mark"));
        assert!(table.lookup_column("grade").is_none());
    }
}
