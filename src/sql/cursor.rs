use crate::error::{DbError, Result};
use crate::sql::lexer::{Token, TokenKind};

/// Forward-only navigator over a lexed statement.
///
/// The cursor never moves backward and clamps at the last token, which the
/// lexer guarantees to be [`TokenKind::Eof`].
pub struct Cursor {
    tokens: Vec<Token>,
    position: usize,
}

impl Cursor {
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut tokens = tokens;
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, ""));
        }
        Self {
            tokens,
            position: 0,
        }
    }

    /// Token at the current position, or the trailing EOF past the end.
    pub fn current(&self) -> &Token {
        self.tokens
            .get(self.position)
            .unwrap_or_else(|| self.last())
    }

    /// One token ahead without moving.
    pub fn peek_next(&self) -> &Token {
        self.tokens
            .get(self.position + 1)
            .unwrap_or_else(|| self.last())
    }

    /// Moves one token forward (clamped) and returns the new current token.
    pub fn advance(&mut self) -> &Token {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
        self.current()
    }

    pub fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    /// Fails with a syntax error naming `what` unless the current token has
    /// the given kind. Does not move.
    pub fn expect(&self, kind: TokenKind, what: &str) -> Result<&Token> {
        let token = self.current();
        if token.kind == kind {
            Ok(token)
        } else {
            Err(DbError::syntax(format!(
                "expected {}, found {}",
                what,
                describe(token)
            )))
        }
    }

    /// [`Cursor::expect`] followed by [`Cursor::advance`], yielding the text of
    /// the consumed token.
    pub fn consume(&mut self, kind: TokenKind, what: &str) -> Result<String> {
        let text = self.expect(kind, what)?.text.clone();
        self.advance();
        Ok(text)
    }

    fn last(&self) -> &Token {
        // `new` guarantees at least the EOF token.
        &self.tokens[self.tokens.len() - 1]
    }
}

/// Human-readable rendering of a token for error messages.
pub(crate) fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::Eof => "end of input".to_string(),
        TokenKind::End => "';'".to_string(),
        TokenKind::StringLiteral => format!("'{}'", token.text),
        _ => token.text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::lexer::tokenize;

    #[test]
    fn test_navigation() {
        let mut cursor = Cursor::new(tokenize("DROP TABLE t;").unwrap());
        assert_eq!(cursor.current().kind, TokenKind::Drop);
        assert_eq!(cursor.peek_next().kind, TokenKind::Table);
        assert_eq!(cursor.advance().kind, TokenKind::Table);
        assert_eq!(cursor.advance().text, "t");
        assert_eq!(cursor.advance().kind, TokenKind::End);
        assert_eq!(cursor.advance().kind, TokenKind::Eof);
    }

    #[test]
    fn test_clamps_at_eof() {
        let mut cursor = Cursor::new(tokenize(";").unwrap());
        cursor.advance();
        cursor.advance();
        cursor.advance();
        assert_eq!(cursor.current().kind, TokenKind::Eof);
        assert_eq!(cursor.peek_next().kind, TokenKind::Eof);
    }

    #[test]
    fn test_expect() {
        let mut cursor = Cursor::new(tokenize("USE 42;").unwrap());
        assert!(cursor.expect(TokenKind::Use, "USE").is_ok());
        cursor.advance();
        let err = cursor.expect(TokenKind::Identifier, "database name").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid syntax: expected database name, found 42"
        );
    }

    #[test]
    fn test_appends_missing_eof() {
        let cursor = Cursor::new(Vec::new());
        assert_eq!(cursor.current().kind, TokenKind::Eof);
    }
}
