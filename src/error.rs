use thiserror::Error;

/// Result alias used by the `sql` and `engine` layers.
pub type Result<T> = std::result::Result<T, DbError>;

/// Broad category of a [`DbError`].
///
/// Every failure a statement can produce falls into exactly one of these
/// four buckets; the front end only ever sees the rendered message, but tests
/// and callers can match on the category without parsing strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unrecognised character or wrong number of `;` terminators.
    Lexical,
    /// Token sequence does not fit the grammar of the dispatched command.
    Syntax,
    /// Leading keyword is not one of the nine supported commands.
    InvalidCommand,
    /// Statement was well formed but could not be applied.
    DatabaseOperation,
}

/// Every way a single statement can fail.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Unrecognised character: {0}")]
    UnrecognisedCharacter(char),

    #[error("';' is expected at the end of the statement")]
    MissingTerminator,

    #[error("More than one ';' found")]
    MultipleTerminators,

    #[error("Invalid syntax: {0}")]
    Syntax(String),

    #[error("Invalid command type: {0}")]
    InvalidCommand(String),

    #[error("No database selected")]
    NoDatabaseSelected,

    #[error("Database {0} does not exist")]
    DatabaseNotFound(String),

    #[error("Database {0} already exists")]
    DatabaseExists(String),

    #[error("Table {0} does not exist")]
    TableNotFound(String),

    #[error("Table {0} already exists")]
    TableExists(String),

    #[error("Column {0} does not exist")]
    ColumnNotFound(String),

    #[error("Column {0} already exists")]
    ColumnExists(String),

    #[error("Column {0} is managed automatically")]
    ReservedColumn(String),

    #[error("Expected {expected} values but {found} were supplied")]
    ValueCountMismatch { expected: usize, found: usize },

    #[error("Value {0:?} contains a tab or line break")]
    InvalidValue(String),

    #[error("Condition attribute not found: {0}")]
    UnknownConditionAttribute(String),

    #[error("Invalid condition format: {0}")]
    InvalidCondition(String),

    #[error("Table file {0} is corrupt")]
    CorruptTable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DbError {
    /// Maps the concrete failure onto its category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::UnrecognisedCharacter(_)
            | DbError::MissingTerminator
            | DbError::MultipleTerminators => ErrorKind::Lexical,
            DbError::Syntax(_) => ErrorKind::Syntax,
            DbError::InvalidCommand(_) => ErrorKind::InvalidCommand,
            _ => ErrorKind::DatabaseOperation,
        }
    }

    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        DbError::Syntax(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(DbError::UnrecognisedCharacter('#').kind(), ErrorKind::Lexical);
        assert_eq!(DbError::MultipleTerminators.kind(), ErrorKind::Lexical);
        assert_eq!(DbError::syntax("x").kind(), ErrorKind::Syntax);
        assert_eq!(
            DbError::InvalidCommand("FOO".into()).kind(),
            ErrorKind::InvalidCommand
        );
        assert_eq!(
            DbError::TableNotFound("t".into()).kind(),
            ErrorKind::DatabaseOperation
        );
    }

    #[test]
    fn messages_are_human_readable() {
        let err = DbError::ValueCountMismatch {
            expected: 2,
            found: 3,
        };
        assert_eq!(err.to_string(), "Expected 2 values but 3 were supplied");
        assert_eq!(
            DbError::NoDatabaseSelected.to_string(),
            "No database selected"
        );
        assert_eq!(
            DbError::InvalidValue("a\tb".into()).to_string(),
            "Value \"a\\tb\" contains a tab or line break"
        );
    }
}
