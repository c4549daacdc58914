use std::fmt;

use crate::engine::condition::Condition;
use crate::engine::table::{ColumnId, Table, ID_COLUMN};
use crate::error::{DbError, Result};

/// Column list of a SELECT.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Projection {
    /// `SELECT *`
    All,
    /// `SELECT a, b, ...`, in the order written
    Columns(Vec<String>),
}

/// Rows produced by SELECT or JOIN.
///
/// Unlike [`Table`] a result set has no schema invariants to maintain: it is
/// rendered once and thrown away.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for ResultSet {
    /// Tab-separated header line, then one line per row.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.columns.join("\t"))?;
        for row in &self.rows {
            writeln!(f, "{}", row.join("\t"))?;
        }
        Ok(())
    }
}

/// Executes a SELECT with full table scan, filtering and projection.
///
/// ```text
/// Table Rows → Condition Filter → Column Projection → ResultSet
///                   ↑                    ↑
///          full, unprojected row    SELECT list
/// ```
///
/// The condition always sees the whole row, so it may refer to columns
/// that are not selected. Rows keep their file order.
pub fn execute_select_scan(
    table: &Table,
    projection: &Projection,
    condition: &Condition,
) -> Result<ResultSet> {
    let selected: Vec<ColumnId> = match projection {
        Projection::All => table.headers().iter().map(|h| h.id).collect(),
        Projection::Columns(names) => names
            .iter()
            .map(|name| {
                table
                    .lookup_column(name)
                    .ok_or_else(|| DbError::ColumnNotFound(name.clone()))
            })
            .collect::<Result<_>>()?,
    };

    let columns: Vec<String> = selected
        .iter()
        .filter_map(|id| table.headers().iter().find(|h| h.id == *id))
        .map(|h| h.name.clone())
        .collect();

    let header = table.header_names();
    let rows: Vec<Vec<String>> = table
        .rows()
        .iter()
        .enumerate()
        .filter(|(index, _)| condition.matches(&header, &table.row_values(*index)))
        .map(|(_, row)| {
            selected
                .iter()
                .map(|id| row.get(*id).to_string())
                .collect::<Vec<_>>()
        })
        .collect();

    Ok(ResultSet { columns, rows })
}

/// Nested-loop equi-join of `left` and `right` on `left_attr == right_attr`.
///
/// Output columns are a fresh `id` followed by every left column other than
/// its `id` and join attribute (prefixed `left.`), then the same for the
/// right table. Matching compares cells as exact strings. Output ids run
/// from 1 in left-row-major order.
///
/// ## Layout
/// ```text
/// JOIN coursework AND marks ON submission AND id
/// id  coursework.task  marks.name  marks.mark
/// 1   OXO              Rob         35
/// ```
///
/// ## Arguments
/// * `left`, `right` - Loaded tables; their names become the column prefixes
/// * `left_attr`, `right_attr` - Join columns, matched ignoring case
///
/// ## Returns
/// * `Ok(ResultSet)` - Header only when no pair matches
/// * `Err(ColumnNotFound)` - Either join column is missing
pub fn execute_join(
    left: &Table,
    right: &Table,
    left_attr: &str,
    right_attr: &str,
) -> Result<ResultSet> {
    let left_side = JoinSide::new(left, left_attr)?;
    let right_side = JoinSide::new(right, right_attr)?;

    let mut columns = vec![ID_COLUMN.to_string()];
    columns.extend(left_side.column_names());
    columns.extend(right_side.column_names());

    let mut rows = Vec::new();
    for left_row in left.rows() {
        let key = left_row.get(left_side.key);
        for right_row in right.rows() {
            if right_row.get(right_side.key) != key {
                continue;
            }
            let mut out = Vec::with_capacity(columns.len());
            out.push((rows.len() + 1).to_string());
            out.extend(left_side.projected.iter().map(|id| left_row.get(*id).to_string()));
            out.extend(right_side.projected.iter().map(|id| right_row.get(*id).to_string()));
            rows.push(out);
        }
    }

    Ok(ResultSet { columns, rows })
}

struct JoinSide<'a> {
    table: &'a Table,
    key: ColumnId,
    projected: Vec<ColumnId>,
}

impl<'a> JoinSide<'a> {
    fn new(table: &'a Table, attr: &str) -> Result<Self> {
        let key = table
            .lookup_column(attr)
            .ok_or_else(|| DbError::ColumnNotFound(attr.to_string()))?;
        let id = table.lookup_column(ID_COLUMN);
        // When the join attribute is `id` itself the two exclusions coincide.
        let projected = table
            .headers()
            .iter()
            .map(|h| h.id)
            .filter(|c| *c != key && Some(*c) != id)
            .collect();
        Ok(Self {
            table,
            key,
            projected,
        })
    }

    fn column_names(&self) -> Vec<String> {
        self.projected
            .iter()
            .filter_map(|c| self.table.headers().iter().find(|h| h.id == *c))
            .map(|h| format!("{}.{}", self.table.name(), h.name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marks() -> Table {
        let mut t = Table::with_columns("marks", ["id", "name", "mark", "pass"]).unwrap();
        t.add_row(["1", "Simon", "65", "TRUE"]).unwrap();
        t.add_row(["2", "Sion", "55", "TRUE"]).unwrap();
        t.add_row(["3", "Rob", "35", "FALSE"]).unwrap();
        t.add_row(["4", "Chris", "20", "FALSE"]).unwrap();
        t
    }

    fn coursework() -> Table {
        let mut t = Table::with_columns("coursework", ["id", "task", "submission"]).unwrap();
        t.add_row(["1", "OXO", "3"]).unwrap();
        t.add_row(["2", "DB", "1"]).unwrap();
        t.add_row(["3", "OXO", "4"]).unwrap();
        t.add_row(["4", "STAG", "2"]).unwrap();
        t
    }

    #[test]
    fn test_select_all() {
        let result = execute_select_scan(&marks(), &Projection::All, &Condition::Always).unwrap();
        assert_eq!(result.columns, vec!["id", "name", "mark", "pass"]);
        assert_eq!(result.len(), 4);
        assert_eq!(result.rows[0], vec!["1", "Simon", "65", "TRUE"]);
    }

    #[test]
    fn test_select_projection_uses_full_row_for_condition() {
        let projection = Projection::Columns(vec!["NAME".into()]);
        let condition = Condition::parse("pass == FALSE");
        let result = execute_select_scan(&marks(), &projection, &condition).unwrap();
        assert_eq!(result.columns, vec!["name"]);
        assert_eq!(result.rows, vec![vec!["Rob"], vec!["Chris"]]);
    }

    #[test]
    fn test_select_unknown_column() {
        let projection = Projection::Columns(vec!["grade".into()]);
        assert!(matches!(
            execute_select_scan(&marks(), &projection, &Condition::Always),
            Err(DbError::ColumnNotFound(c)) if c == "grade"
        ));
    }

    #[test]
    fn test_join_on_attribute() {
        let result = execute_join(&coursework(), &marks(), "submission", "id").unwrap();
        assert_eq!(
            result.columns,
            vec![
                "id",
                "coursework.task",
                "marks.name",
                "marks.mark",
                "marks.pass"
            ]
        );
        assert_eq!(result.len(), 4);
        assert_eq!(result.rows[0], vec!["1", "OXO", "Rob", "35", "FALSE"]);
        assert_eq!(result.rows[1], vec!["2", "DB", "Simon", "65", "TRUE"]);
        assert_eq!(result.rows[3][0], "4");
    }

    #[test]
    fn test_join_order_is_left_major() {
        let mut left = Table::with_columns("l", ["id", "k"]).unwrap();
        left.add_row(["1", "a"]).unwrap();
        left.add_row(["2", "b"]).unwrap();
        let mut right = Table::with_columns("r", ["id", "k", "v"]).unwrap();
        right.add_row(["1", "b", "x"]).unwrap();
        right.add_row(["2", "a", "y"]).unwrap();
        right.add_row(["3", "a", "z"]).unwrap();

        let result = execute_join(&left, &right, "k", "k").unwrap();
        assert_eq!(result.columns, vec!["id", "r.v"]);
        assert_eq!(
            result.rows,
            vec![vec!["1", "y"], vec!["2", "z"], vec!["3", "x"]]
        );
    }

    #[test]
    fn test_join_without_matches() {
        let result = execute_join(&marks(), &coursework(), "name", "task").unwrap();
        assert!(result.is_empty());
        assert_eq!(
            result.to_string(),
            "id\tmarks.mark\tmarks.pass\tcoursework.submission\n"
        );
    }

    #[test]
    fn test_join_unknown_attribute() {
        assert!(matches!(
            execute_join(&marks(), &coursework(), "grade", "task"),
            Err(DbError::ColumnNotFound(_))
        ));
    }
}
