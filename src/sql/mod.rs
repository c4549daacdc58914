//! Statement front half: text → tokens → [`Command`] → engine call.

pub mod ast;
pub mod cursor;
pub mod lexer;
pub mod parser;

use tracing::{debug, warn};

use crate::engine::{Engine, Outcome};
use crate::error::Result;

pub use ast::Command;
pub use parser::{parse_statement, Parser};

/// Parses and executes one statement against the engine.
///
/// ## Processing Pipeline
/// 1. **Lexing**: [`lexer::tokenize`] checks characters and the single `;`
/// 2. **Parsing**: [`Parser`] turns the tokens into one [`Command`]
/// 3. **Execution**: the command is dispatched to exactly one [`Engine`]
///    operation
///
/// Nothing is executed unless the whole statement parses.
pub fn execute(engine: &mut Engine, statement: &str) -> Result<Outcome> {
    let tokens = lexer::tokenize(statement)?;
    debug!(tokens = tokens.len(), "statement lexed");
    let command = Parser::new(tokens).parse()?;
    debug!(command = command.name(), "statement parsed");

    match command {
        Command::Use { database } => engine.use_database(&database),
        Command::CreateDatabase { database } => engine.create_database(&database),
        Command::CreateTable { table, columns } => engine.create_table(&table, &columns),
        Command::DropDatabase { database } => engine.drop_database(&database),
        Command::DropTable { table } => engine.drop_table(&table),
        Command::Alter {
            table,
            action,
            column,
        } => engine.alter_table(&table, action, &column),
        Command::Insert { table, values } => engine.insert_into_table(&table, &values),
        Command::Select {
            table,
            projection,
            condition,
        } => engine.select_from_table(&table, &projection, &condition),
        Command::Update {
            table,
            assignments,
            condition,
        } => engine.update_table(&table, &assignments, &condition),
        Command::Delete { table, condition } => engine.delete_from_table(&table, &condition),
        Command::Join {
            left,
            right,
            left_attr,
            right_attr,
        } => engine.join_tables(&left, &right, &left_attr, &right_attr),
    }
}

/// Runs one statement and renders the response the client sees.
///
/// ## Response format
/// ```text
/// [OK]
/// id<TAB>name<TAB>mark      <- SELECT and JOIN only
/// 1<TAB>Simon<TAB>65
/// ```
/// or a single `[ERROR] <message>` line. Every line ends with a newline.
/// Failures never escape this function.
pub fn handle_command(engine: &mut Engine, statement: &str) -> String {
    match execute(engine, statement) {
        Ok(Outcome::Done) => "[OK]\n".to_string(),
        Ok(Outcome::Rows(result)) => format!("[OK]\n{}", result),
        Err(e) => {
            warn!(kind = ?e.kind(), error = %e, "statement failed");
            format!("[ERROR] {}\n", e)
        }
    }
}
