//! Lexer for the builtin statement subset
//!
//! The lexer never fails: unknown characters become `Unknown` tokens and an
//! unterminated string runs to the end of input. Rejecting bad input is the
//! parser's job.

use std::ops::Range;

/// Token type enumeration (case-insensitive for keywords)
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Select,
    From,
    Where,
    OrderBy,
    Limit,
    Let,
    As,
    Asc,
    Desc,
    True,
    False,
    Null,

    // Identifiers and literals
    Ident(String),
    Number(String),
    String(String),

    // Operators and symbols
    Star,
    Comma,
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    LParen,
    RParen,
    Semicolon,

    // Special tokens
    Eof,
    Unknown(char),
}

/// Token with its character range in the input
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

impl Token {
    pub fn new(kind: TokenKind, span: Range<usize>) -> Self {
        Self { kind, span }
    }
}

/// Character-by-character tokenizer
pub struct Lexer {
    input: Vec<char>,
    pos: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    /// Tokenize the entire input. The last token is always `Eof`.
    pub fn tokenize(input: &str) -> Vec<Token> {
        let mut lexer = Self::new(input);
        let mut tokens = Vec::new();

        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        tokens
    }

    fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.pos;
        if self.is_at_end() {
            return Token::new(TokenKind::Eof, start..start);
        }

        let ch = self.current_char();
        let kind = match ch {
            '*' => self.single(TokenKind::Star),
            ',' => self.single(TokenKind::Comma),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            ';' => self.single(TokenKind::Semicolon),
            '=' => self.single(TokenKind::Eq),
            '!' => {
                self.advance();
                if self.current_char() == '=' {
                    self.advance();
                    TokenKind::Ne
                } else {
                    TokenKind::Unknown('!')
                }
            }
            '>' => {
                self.advance();
                if self.current_char() == '=' {
                    self.advance();
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '<' => {
                self.advance();
                match self.current_char() {
                    '=' => {
                        self.advance();
                        TokenKind::Le
                    }
                    '>' => {
                        self.advance();
                        TokenKind::Ne
                    }
                    _ => TokenKind::Lt,
                }
            }
            '\'' | '"' => self.scan_string(ch),
            '0'..='9' | '-' => self.scan_number(),
            c if c.is_alphabetic() || c == '_' || c == '$' => self.scan_identifier(),
            _ => self.single(TokenKind::Unknown(ch)),
        };

        Token::new(kind, start..self.pos)
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// Scan a quoted string. Backslash escapes the next character.
    fn scan_string(&mut self, quote: char) -> TokenKind {
        self.advance();

        let mut value = String::new();
        while !self.is_at_end() && self.current_char() != quote {
            let ch = self.current_char();
            if ch == '\\' {
                self.advance();
                match self.current_char() {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    '\0' => break,
                    other => value.push(other),
                }
            } else {
                value.push(ch);
            }
            self.advance();
        }

        if self.current_char() == quote {
            self.advance();
        }

        TokenKind::String(value)
    }

    fn scan_number(&mut self) -> TokenKind {
        let mut value = String::new();

        if self.current_char() == '-' {
            if !self.peek_char().is_ascii_digit() {
                self.advance();
                return TokenKind::Unknown('-');
            }
            value.push('-');
            self.advance();
        }

        while self.current_char().is_ascii_digit() {
            value.push(self.current_char());
            self.advance();
        }

        if self.current_char() == '.' && self.peek_char().is_ascii_digit() {
            value.push('.');
            self.advance();
            while self.current_char().is_ascii_digit() {
                value.push(self.current_char());
                self.advance();
            }
        }

        TokenKind::Number(value)
    }

    /// Scan an identifier or keyword. Dots join qualified names like `Artifact.Linux.Users`.
    fn scan_identifier(&mut self) -> TokenKind {
        let mut value = String::new();

        while !self.is_at_end() {
            let ch = self.current_char();
            let continues = ch.is_alphanumeric()
                || ch == '_'
                || ch == '$'
                || (ch == '.' && (self.peek_char().is_alphanumeric() || self.peek_char() == '_'));
            if !continues {
                break;
            }
            value.push(ch);
            self.advance();
        }

        match value.to_uppercase().as_str() {
            "SELECT" => TokenKind::Select,
            "FROM" => TokenKind::From,
            "WHERE" => TokenKind::Where,
            "LIMIT" => TokenKind::Limit,
            "LET" => TokenKind::Let,
            "AS" => TokenKind::As,
            "ASC" => TokenKind::Asc,
            "DESC" => TokenKind::Desc,
            "TRUE" => TokenKind::True,
            "FALSE" => TokenKind::False,
            "NULL" => TokenKind::Null,
            "ORDER" => {
                // Check for "ORDER BY"
                let saved_pos = self.pos;
                self.skip_whitespace();
                if self.peek_word().eq_ignore_ascii_case("BY") {
                    self.pos += 2;
                    TokenKind::OrderBy
                } else {
                    self.pos = saved_pos;
                    TokenKind::Ident(value)
                }
            }
            _ => TokenKind::Ident(value),
        }
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    /// Peek the next word without consuming it
    fn peek_word(&self) -> String {
        self.input[self.pos..]
            .iter()
            .take_while(|c| c.is_alphanumeric() || **c == '_')
            .collect()
    }

    fn current_char(&self) -> char {
        self.input.get(self.pos).copied().unwrap_or('\0')
    }

    fn peek_char(&self) -> char {
        self.input.get(self.pos + 1).copied().unwrap_or('\0')
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }
}
