use crate::engine::{AlterAction, Condition, Projection};

/// One parsed statement. The parser produces exactly one of these per
/// statement and [`crate::sql::execute`] dispatches on it exhaustively.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `USE db;`
    Use { database: String },
    /// `CREATE DATABASE db;`
    CreateDatabase { database: String },
    /// `CREATE TABLE t [(a, b, ...)];`
    CreateTable { table: String, columns: Vec<String> },
    /// `DROP DATABASE db;`
    DropDatabase { database: String },
    /// `DROP TABLE t;`
    DropTable { table: String },
    /// `ALTER TABLE t ADD|DROP column;`
    Alter {
        table: String,
        action: AlterAction,
        column: String,
    },
    /// `INSERT INTO t VALUES (v, ...);`
    Insert { table: String, values: Vec<String> },
    /// `SELECT * | a, b FROM t [WHERE condition];`
    Select {
        table: String,
        projection: Projection,
        condition: Condition,
    },
    /// `UPDATE t SET a = v, ... WHERE condition;`
    Update {
        table: String,
        assignments: Vec<(String, String)>,
        condition: Condition,
    },
    /// `DELETE FROM t WHERE condition;`
    Delete { table: String, condition: Condition },
    /// `JOIN t1 AND t2 ON a1 AND a2;`
    Join {
        left: String,
        right: String,
        left_attr: String,
        right_attr: String,
    },
}

impl Command {
    /// Leading keyword of the statement, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Use { .. } => "USE",
            Command::CreateDatabase { .. } | Command::CreateTable { .. } => "CREATE",
            Command::DropDatabase { .. } | Command::DropTable { .. } => "DROP",
            Command::Alter { .. } => "ALTER",
            Command::Insert { .. } => "INSERT",
            Command::Select { .. } => "SELECT",
            Command::Update { .. } => "UPDATE",
            Command::Delete { .. } => "DELETE",
            Command::Join { .. } => "JOIN",
        }
    }
}
