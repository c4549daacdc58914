use crate::engine::{AlterAction, Condition, Projection};
use crate::error::{DbError, Result};
use crate::sql::ast::Command;
use crate::sql::cursor::{describe, Cursor};
use crate::sql::lexer::{tokenize, Token, TokenKind};

/// Recursive-descent parser over one lexed statement.
///
/// Single pass, left to right, no backtracking: every grammar below can
/// decide what comes next from the current token alone.
///
/// ## Grammars
/// ```text
/// USE name
/// CREATE DATABASE name | CREATE TABLE name [ ( col, ... ) ]
/// DROP DATABASE name | DROP TABLE name
/// ALTER TABLE name (ADD | DROP) col
/// INSERT INTO name VALUES ( literal, ... )
/// SELECT (* | col, ...) FROM name [WHERE condition]
/// UPDATE name SET col = literal, ... WHERE condition
/// DELETE FROM name WHERE condition
/// JOIN name AND name ON col AND col
/// ```
///
/// Every statement must then reach the `;` terminator. Tokens after it are
/// never looked at.
pub struct Parser {
    cursor: Cursor,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            cursor: Cursor::new(tokens),
        }
    }

    /// Parses the single statement held by this parser.
    pub fn parse(&mut self) -> Result<Command> {
        let command = match self.cursor.current().kind {
            TokenKind::Use => self.parse_use(),
            TokenKind::Create => self.parse_create(),
            TokenKind::Drop => self.parse_drop(),
            TokenKind::Alter => self.parse_alter(),
            TokenKind::Insert => self.parse_insert(),
            TokenKind::Select => self.parse_select(),
            TokenKind::Update => self.parse_update(),
            TokenKind::Delete => self.parse_delete(),
            TokenKind::Join => self.parse_join(),
            _ => Err(DbError::InvalidCommand(describe(self.cursor.current()))),
        }?;

        self.cursor.expect(TokenKind::End, "';'")?;
        Ok(command)
    }

    fn parse_use(&mut self) -> Result<Command> {
        self.cursor.consume(TokenKind::Use, "USE")?;
        let database = self.identifier("database name")?;
        Ok(Command::Use { database })
    }

    fn parse_create(&mut self) -> Result<Command> {
        self.cursor.consume(TokenKind::Create, "CREATE")?;
        match self.cursor.current().kind {
            TokenKind::Database => {
                self.cursor.advance();
                let database = self.identifier("database name")?;
                Ok(Command::CreateDatabase { database })
            }
            TokenKind::Table => {
                self.cursor.advance();
                let table = self.identifier("table name")?;
                let columns = if self.cursor.check(TokenKind::LeftParen) {
                    self.cursor.advance();
                    let columns = self.identifier_list("column name")?;
                    self.cursor.consume(TokenKind::RightParen, "')'")?;
                    columns
                } else {
                    Vec::new()
                };
                Ok(Command::CreateTable { table, columns })
            }
            _ => Err(self.unexpected("DATABASE or TABLE")),
        }
    }

    fn parse_drop(&mut self) -> Result<Command> {
        self.cursor.consume(TokenKind::Drop, "DROP")?;
        match self.cursor.current().kind {
            TokenKind::Database => {
                self.cursor.advance();
                let database = self.identifier("database name")?;
                Ok(Command::DropDatabase { database })
            }
            TokenKind::Table => {
                self.cursor.advance();
                let table = self.identifier("table name")?;
                Ok(Command::DropTable { table })
            }
            _ => Err(self.unexpected("DATABASE or TABLE")),
        }
    }

    fn parse_alter(&mut self) -> Result<Command> {
        self.cursor.consume(TokenKind::Alter, "ALTER")?;
        self.cursor.consume(TokenKind::Table, "TABLE")?;
        let table = self.identifier("table name")?;
        let action = match self.cursor.current().kind {
            TokenKind::Add => AlterAction::Add,
            TokenKind::Drop => AlterAction::Drop,
            _ => return Err(self.unexpected("ADD or DROP")),
        };
        self.cursor.advance();
        let column = self.identifier("column name")?;
        Ok(Command::Alter {
            table,
            action,
            column,
        })
    }

    fn parse_insert(&mut self) -> Result<Command> {
        self.cursor.consume(TokenKind::Insert, "INSERT")?;
        self.cursor.consume(TokenKind::Into, "INTO")?;
        let table = self.identifier("table name")?;
        self.cursor.consume(TokenKind::Values, "VALUES")?;
        self.cursor.consume(TokenKind::LeftParen, "'('")?;
        let mut values = vec![self.literal()?];
        while self.cursor.check(TokenKind::Comma) {
            self.cursor.advance();
            values.push(self.literal()?);
        }
        self.cursor.consume(TokenKind::RightParen, "')'")?;
        Ok(Command::Insert { table, values })
    }

    fn parse_select(&mut self) -> Result<Command> {
        self.cursor.consume(TokenKind::Select, "SELECT")?;
        let projection = if self.cursor.check(TokenKind::Asterisk) {
            self.cursor.advance();
            Projection::All
        } else {
            Projection::Columns(self.identifier_list("column name or '*'")?)
        };
        self.cursor.consume(TokenKind::From, "FROM")?;
        let table = self.identifier("table name")?;
        let condition = if self.cursor.check(TokenKind::Where) {
            self.cursor.advance();
            self.condition()?
        } else {
            Condition::Always
        };
        Ok(Command::Select {
            table,
            projection,
            condition,
        })
    }

    fn parse_update(&mut self) -> Result<Command> {
        self.cursor.consume(TokenKind::Update, "UPDATE")?;
        let table = self.identifier("table name")?;
        self.cursor.consume(TokenKind::Set, "SET")?;

        let mut assignments = vec![self.assignment()?];
        while self.cursor.check(TokenKind::Comma) {
            self.cursor.advance();
            assignments.push(self.assignment()?);
        }

        self.cursor.consume(TokenKind::Where, "WHERE")?;
        let condition = self.condition()?;
        Ok(Command::Update {
            table,
            assignments,
            condition,
        })
    }

    fn parse_delete(&mut self) -> Result<Command> {
        self.cursor.consume(TokenKind::Delete, "DELETE")?;
        self.cursor.consume(TokenKind::From, "FROM")?;
        let table = self.identifier("table name")?;
        self.cursor.consume(TokenKind::Where, "WHERE")?;
        let condition = self.condition()?;
        Ok(Command::Delete { table, condition })
    }

    fn parse_join(&mut self) -> Result<Command> {
        self.cursor.consume(TokenKind::Join, "JOIN")?;
        let left = self.identifier("table name")?;
        self.cursor.consume(TokenKind::And, "AND")?;
        let right = self.identifier("table name")?;
        self.cursor.consume(TokenKind::On, "ON")?;
        let left_attr = self.identifier("attribute name")?;
        self.cursor.consume(TokenKind::And, "AND")?;
        let right_attr = self.identifier("attribute name")?;
        Ok(Command::Join {
            left,
            right,
            left_attr,
            right_attr,
        })
    }

    // helpers

    fn identifier(&mut self, what: &str) -> Result<String> {
        self.cursor.consume(TokenKind::Identifier, what)
    }

    /// `ident (, ident)*`; at least one element.
    fn identifier_list(&mut self, what: &str) -> Result<Vec<String>> {
        let mut names = vec![self.identifier(what)?];
        while self.cursor.check(TokenKind::Comma) {
            self.cursor.advance();
            names.push(self.identifier(what)?);
        }
        Ok(names)
    }

    fn literal(&mut self) -> Result<String> {
        let token = self.cursor.current();
        if !token.kind.is_literal() {
            return Err(self.unexpected("a value"));
        }
        let text = token.text.clone();
        self.cursor.advance();
        Ok(text)
    }

    /// `column = literal`
    fn assignment(&mut self) -> Result<(String, String)> {
        let column = self.identifier("column name")?;
        self.cursor.consume(TokenKind::Equals, "'='")?;
        let value = self.literal()?;
        Ok((column, value))
    }

    /// Rebuilds the condition text from every token up to the terminator and
    /// hands it to [`Condition::parse`]. String literals get their quotes back
    /// so values containing spaces survive as one term value.
    fn condition(&mut self) -> Result<Condition> {
        let mut parts = Vec::new();
        while !matches!(self.cursor.current().kind, TokenKind::End | TokenKind::Eof) {
            let token = self.cursor.current();
            parts.push(match token.kind {
                TokenKind::StringLiteral => format!("'{}'", token.text),
                _ => token.text.clone(),
            });
            self.cursor.advance();
        }
        if parts.is_empty() {
            return Err(self.unexpected("a condition"));
        }
        Ok(Condition::parse(&parts.join(" ")))
    }

    fn unexpected(&self, what: &str) -> DbError {
        DbError::syntax(format!(
            "expected {}, found {}",
            what,
            describe(self.cursor.current())
        ))
    }
}

/// Lexes and parses one statement.
pub fn parse_statement(text: &str) -> Result<Command> {
    Parser::new(tokenize(text)?).parse()
}
