use crate::error::{DbError, Result};

/// Every kind of token the statement language knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // --- Keywords ---
    Use,
    Create,
    Database,
    Table,
    Drop,
    Alter,
    Insert,
    Into,
    Values,
    Select,
    From,
    Where,
    Update,
    Set,
    Delete,
    Join,
    And,
    Or,
    On,
    Add,
    Like,

    // --- Literals ---
    /// Optional sign followed by digits (e.g. `-42`).
    IntegerLiteral,
    /// Optional sign, digits, a mandatory dot and more digits (e.g. `3.14`).
    FloatLiteral,
    /// Single-quoted text; the token text has the quotes stripped.
    StringLiteral,
    /// `TRUE` or `FALSE`, lexed as keywords and re-tagged.
    BooleanLiteral,
    /// `NULL`, lexed as a keyword and re-tagged.
    NullLiteral,

    /// Table, database or column name.
    Identifier,

    // --- Symbols ---
    LeftParen,
    RightParen,
    Comma,
    /// `=` or `==`; the token text tells them apart.
    Equals,
    GreaterThan,
    LessThan,
    GreaterEquals,
    LessEquals,
    NotEquals,
    Asterisk,

    /// The statement terminator `;`.
    End,
    /// Appended after the last real token so the cursor always has something
    /// to return.
    Eof,
}

impl TokenKind {
    /// True for the kinds accepted as a value in INSERT and UPDATE.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::IntegerLiteral
                | TokenKind::FloatLiteral
                | TokenKind::StringLiteral
                | TokenKind::BooleanLiteral
                | TokenKind::NullLiteral
        )
    }

    fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "USE" => TokenKind::Use,
            "CREATE" => TokenKind::Create,
            "DATABASE" => TokenKind::Database,
            "TABLE" => TokenKind::Table,
            "DROP" => TokenKind::Drop,
            "ALTER" => TokenKind::Alter,
            "INSERT" => TokenKind::Insert,
            "INTO" => TokenKind::Into,
            "VALUES" => TokenKind::Values,
            "SELECT" => TokenKind::Select,
            "FROM" => TokenKind::From,
            "WHERE" => TokenKind::Where,
            "UPDATE" => TokenKind::Update,
            "SET" => TokenKind::Set,
            "DELETE" => TokenKind::Delete,
            "JOIN" => TokenKind::Join,
            "AND" => TokenKind::And,
            "OR" => TokenKind::Or,
            "ON" => TokenKind::On,
            "ADD" => TokenKind::Add,
            "LIKE" => TokenKind::Like,
            "TRUE" | "FALSE" => TokenKind::BooleanLiteral,
            "NULL" => TokenKind::NullLiteral,
            _ => return None,
        };
        Some(kind)
    }
}

/// A single lexeme. Tokens are never mutated once the lexer emits them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Scans statement text into [`Token`]s.
///
/// At every position the lexer tries, in order: whitespace, keyword or
/// identifier, float, integer, quoted string and finally the fixed symbols
/// (two-character symbols before their one-character prefixes). Keywords are
/// matched case-insensitively against the whole word, so `SELECTOR` stays a
/// single identifier.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Lexes the whole input.
    ///
    /// The returned sequence holds exactly one [`TokenKind::End`] and is
    /// closed by a [`TokenKind::Eof`] token.
    ///
    /// # Errors
    /// [`DbError::UnrecognisedCharacter`] when nothing matches at the current
    /// position, [`DbError::MissingTerminator`] / [`DbError::MultipleTerminators`]
    /// when the statement does not carry exactly one `;`.
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            if self.is_at_end() {
                break;
            }
            tokens.push(self.next_token()?);
        }

        match tokens.iter().filter(|t| t.kind == TokenKind::End).count() {
            0 => return Err(DbError::MissingTerminator),
            1 => {}
            _ => return Err(DbError::MultipleTerminators),
        }

        tokens.push(Token::new(TokenKind::Eof, ""));
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token> {
        let ch = self.current_char();

        if ch.is_ascii_alphabetic() {
            return Ok(self.read_word());
        }
        if let Some(token) = self.read_number() {
            return Ok(token);
        }
        if ch == '\'' {
            if let Some(token) = self.read_string() {
                return Ok(token);
            }
        }
        self.read_symbol()
            .ok_or(DbError::UnrecognisedCharacter(ch))
    }

    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn char_at(&self, position: usize) -> Option<char> {
        self.input.get(position).copied()
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.position += 1;
        }
    }

    fn read_word(&mut self) -> Token {
        let start = self.position;
        while let Some(c) = self.char_at(self.position) {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.position += 1;
            } else {
                break;
            }
        }
        let word: String = self.input[start..self.position].iter().collect();
        let upper = word.to_ascii_uppercase();

        match TokenKind::keyword(&upper) {
            Some(kind) => Token::new(kind, upper),
            None => Token::new(TokenKind::Identifier, word),
        }
    }

    /// `[+-]?\d+\.\d+` or `[+-]?\d+`. Leaves the position untouched on a
    /// miss so a lone sign falls through to the symbol table.
    fn read_number(&mut self) -> Option<Token> {
        let mut end = self.position;
        if matches!(self.char_at(end), Some('+') | Some('-')) {
            end += 1;
        }
        let digits_start = end;
        while self.char_at(end).is_some_and(|c| c.is_ascii_digit()) {
            end += 1;
        }
        if end == digits_start {
            return None;
        }

        let mut kind = TokenKind::IntegerLiteral;
        if self.char_at(end) == Some('.')
            && self.char_at(end + 1).is_some_and(|c| c.is_ascii_digit())
        {
            end += 1;
            while self.char_at(end).is_some_and(|c| c.is_ascii_digit()) {
                end += 1;
            }
            kind = TokenKind::FloatLiteral;
        }

        let text: String = self.input[self.position..end].iter().collect();
        self.position = end;
        Some(Token::new(kind, text))
    }

    /// `'[^']*'`; an unterminated quote is not a string.
    fn read_string(&mut self) -> Option<Token> {
        let body_start = self.position + 1;
        let close = (body_start..self.input.len()).find(|&i| self.input[i] == '\'')?;
        let text: String = self.input[body_start..close].iter().collect();
        self.position = close + 1;
        Some(Token::new(TokenKind::StringLiteral, text))
    }

    fn read_symbol(&mut self) -> Option<Token> {
        let ch = self.current_char();
        let next = self.char_at(self.position + 1);

        let (kind, len) = match (ch, next) {
            ('=', Some('=')) => (TokenKind::Equals, 2),
            ('>', Some('=')) => (TokenKind::GreaterEquals, 2),
            ('<', Some('=')) => (TokenKind::LessEquals, 2),
            ('!', Some('=')) => (TokenKind::NotEquals, 2),
            (';', _) => (TokenKind::End, 1),
            ('(', _) => (TokenKind::LeftParen, 1),
            (')', _) => (TokenKind::RightParen, 1),
            (',', _) => (TokenKind::Comma, 1),
            ('=', _) => (TokenKind::Equals, 1),
            ('>', _) => (TokenKind::GreaterThan, 1),
            ('<', _) => (TokenKind::LessThan, 1),
            ('*', _) => (TokenKind::Asterisk, 1),
            _ => return None,
        };

        let text: String = self.input[self.position..self.position + len].iter().collect();
        self.position += len;
        Some(Token::new(kind, text))
    }
}

/// Convenience wrapper around [`Lexer::tokenize`].
pub fn tokenize(text: &str) -> Result<Vec<Token>> {
    Lexer::new(text).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_use() {
        let tokens = tokenize("USE markbook;").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenKind::Use, "USE"),
                Token::new(TokenKind::Identifier, "markbook"),
                Token::new(TokenKind::End, ";"),
                Token::new(TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let tokens = tokenize("select * fRoM marks;").unwrap();
        assert_eq!(tokens[0], Token::new(TokenKind::Select, "SELECT"));
        assert_eq!(tokens[2], Token::new(TokenKind::From, "FROM"));
    }

    #[test]
    fn test_keyword_prefix_stays_identifier() {
        let tokens = tokenize("SELECTOR ORDER android;").unwrap();
        assert_eq!(tokens[0], Token::new(TokenKind::Identifier, "SELECTOR"));
        assert_eq!(tokens[1], Token::new(TokenKind::Identifier, "ORDER"));
        assert_eq!(tokens[2], Token::new(TokenKind::Identifier, "android"));
    }

    #[test]
    fn test_literals() {
        let tokens = tokenize("INSERT INTO t VALUES ('Simon', 65, -1.5, +3, true, NULL);").unwrap();
        let values: Vec<_> = tokens[5..].iter().filter(|t| t.kind != TokenKind::Comma).collect();
        assert_eq!(*values[0], Token::new(TokenKind::StringLiteral, "Simon"));
        assert_eq!(*values[1], Token::new(TokenKind::IntegerLiteral, "65"));
        assert_eq!(*values[2], Token::new(TokenKind::FloatLiteral, "-1.5"));
        assert_eq!(*values[3], Token::new(TokenKind::IntegerLiteral, "+3"));
        assert_eq!(*values[4], Token::new(TokenKind::BooleanLiteral, "TRUE"));
        assert_eq!(*values[5], Token::new(TokenKind::NullLiteral, "NULL"));
    }

    #[test]
    fn test_string_keeps_inner_spaces() {
        let tokens = tokenize("'Bob Dylan';").unwrap();
        assert_eq!(tokens[0], Token::new(TokenKind::StringLiteral, "Bob Dylan"));
        let tokens = tokenize("'';").unwrap();
        assert_eq!(tokens[0], Token::new(TokenKind::StringLiteral, ""));
    }

    #[test]
    fn test_symbols_longest_match() {
        assert_eq!(
            kinds(">= <= != == = > < * ( ) , ;"),
            vec![
                TokenKind::GreaterEquals,
                TokenKind::LessEquals,
                TokenKind::NotEquals,
                TokenKind::Equals,
                TokenKind::Equals,
                TokenKind::GreaterThan,
                TokenKind::LessThan,
                TokenKind::Asterisk,
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::Comma,
                TokenKind::End,
                TokenKind::Eof,
            ]
        );
        let tokens = tokenize("a==b;").unwrap();
        assert_eq!(tokens[1].text, "==");
    }

    #[test]
    fn test_whitespace_is_discarded() {
        assert_eq!(
            kinds("  DROP\tTABLE \n t ;  "),
            vec![
                TokenKind::Drop,
                TokenKind::Table,
                TokenKind::Identifier,
                TokenKind::End,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_float_needs_digits_after_dot() {
        let result = tokenize("1.;");
        assert!(matches!(result, Err(DbError::UnrecognisedCharacter('.'))));
    }

    #[test]
    fn test_unrecognised_character() {
        let err = tokenize("SELECT # FROM t;").unwrap_err();
        assert!(matches!(err, DbError::UnrecognisedCharacter('#')));
        assert_eq!(err.kind(), ErrorKind::Lexical);
        assert!(matches!(
            tokenize("SELECT ! FROM t;"),
            Err(DbError::UnrecognisedCharacter('!'))
        ));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            tokenize("INSERT INTO t VALUES ('abc);"),
            Err(DbError::UnrecognisedCharacter('\''))
        ));
    }

    #[test]
    fn test_terminator_count() {
        assert!(matches!(tokenize("USE db"), Err(DbError::MissingTerminator)));
        assert!(matches!(
            tokenize("USE db;;"),
            Err(DbError::MultipleTerminators)
        ));
    }
}
