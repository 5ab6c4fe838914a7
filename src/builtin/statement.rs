//! Statement AST and parser for the builtin evaluator
//!
//! Grammar (keywords are case-insensitive):
//!
//! ```text
//! statement := SELECT query
//!            | LET name ( '=' | '<=' ) SELECT query
//! query     := column ( ',' column )* [ FROM source ] [ WHERE condition ]
//!              [ ORDER BY name [ ASC | DESC ] ] [ LIMIT number ] [ ';' ]
//! column    := '*' | expr [ AS name ]
//! expr      := literal | name | name '(' args ')'
//! source    := name '(' args ')' | name
//! args      := [ name '=' operand ( ',' name '=' operand )* ]
//! condition := name ( '=' | '!=' | '<' | '<=' | '>' | '>=' ) operand
//! operand   := literal | name
//! ```

use serde_json::{Number, Value};

use super::lexer::{Lexer, Token, TokenKind};
use crate::error::{ParseError, Result};

/// Value passed to a keyword argument or compared in a condition
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Value),
    /// Name looked up in the current row, then in the scope
    Name(String),
}

/// Function or plugin invocation with keyword arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub args: Vec<(String, Operand)>,
}

impl Call {
    /// Argument by keyword
    pub fn arg(&self, name: &str) -> Option<&Operand> {
        self.args.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Name(String),
    Call(Call),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// `*`: every field of the source row
    All,
    /// Expression shown under `label`
    Expr { expr: Expr, label: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// `FROM plugin(...)`
    Plugin(Call),
    /// `FROM name`, a variable bound with `LET`
    Variable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub op: CompareOp,
    pub value: Operand,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

/// A parsed `SELECT`
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub columns: Vec<Column>,
    pub source: Option<Source>,
    pub condition: Option<Condition>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

/// How `LET` binds its query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LetMode {
    /// `=`: store the query, evaluate on every use
    Deferred,
    /// `<=`: evaluate now, store the rows
    Materialized,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(SelectQuery),
    Let {
        name: String,
        mode: LetMode,
        query: SelectQuery,
    },
}

impl Statement {
    /// Parse one statement
    ///
    /// # Arguments
    /// * `input` - Statement text
    ///
    /// # Returns
    /// * `Result<Statement>` - Parsed statement or parse error
    pub fn parse(input: &str) -> Result<Statement> {
        let mut parser = StatementParser::new(input);
        let statement = parser.parse_statement()?;
        parser.finish()?;
        Ok(statement)
    }
}

/// Recursive-descent parser over the token stream
struct StatementParser {
    input: Vec<char>,
    tokens: Vec<Token>,
    pos: usize,
}

impl StatementParser {
    fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            tokens: Lexer::tokenize(input),
            pos: 0,
        }
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        match self.peek_kind() {
            TokenKind::Select => {
                self.advance();
                Ok(Statement::Select(self.parse_query()?))
            }
            TokenKind::Let => {
                self.advance();
                let name = self.expect_ident("variable name")?;
                let mode = match self.peek_kind() {
                    TokenKind::Eq => LetMode::Deferred,
                    TokenKind::Le => LetMode::Materialized,
                    _ => return Err(self.unexpected("'=' or '<='")),
                };
                self.advance();
                self.expect(TokenKind::Select, "SELECT")?;
                let query = self.parse_query()?;
                Ok(Statement::Let { name, mode, query })
            }
            TokenKind::Eof => Err(ParseError::UnexpectedEnd("SELECT or LET".to_string()).into()),
            _ => Err(ParseError::UnknownStatement(self.describe_current()).into()),
        }
    }

    fn parse_query(&mut self) -> Result<SelectQuery> {
        let mut columns = vec![self.parse_column()?];
        while self.peek_kind() == &TokenKind::Comma {
            self.advance();
            columns.push(self.parse_column()?);
        }

        let source = if self.peek_kind() == &TokenKind::From {
            self.advance();
            Some(self.parse_source()?)
        } else {
            None
        };

        let condition = if self.peek_kind() == &TokenKind::Where {
            self.advance();
            Some(self.parse_condition()?)
        } else {
            None
        };

        let order_by = if self.peek_kind() == &TokenKind::OrderBy {
            self.advance();
            let column = self.expect_ident("column name")?;
            let descending = match self.peek_kind() {
                TokenKind::Desc => {
                    self.advance();
                    true
                }
                TokenKind::Asc => {
                    self.advance();
                    false
                }
                _ => false,
            };
            Some(OrderBy { column, descending })
        } else {
            None
        };

        let limit = if self.peek_kind() == &TokenKind::Limit {
            self.advance();
            Some(self.parse_limit()?)
        } else {
            None
        };

        Ok(SelectQuery {
            columns,
            source,
            condition,
            order_by,
            limit,
        })
    }

    fn parse_column(&mut self) -> Result<Column> {
        if self.peek_kind() == &TokenKind::Star {
            self.advance();
            return Ok(Column::All);
        }

        let start = self.current().span.start;
        let expr = self.parse_expr()?;
        let end = self.previous_end();

        let label = if self.peek_kind() == &TokenKind::As {
            self.advance();
            self.expect_ident("column alias")?
        } else {
            self.input[start..end].iter().collect()
        };

        Ok(Column::Expr { expr, label })
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        if let Some(value) = self.try_literal()? {
            return Ok(Expr::Literal(value));
        }

        let name = self.expect_ident("column, function or literal")?;
        if self.peek_kind() == &TokenKind::LParen {
            Ok(Expr::Call(self.parse_call(name)?))
        } else {
            Ok(Expr::Name(name))
        }
    }

    fn parse_source(&mut self) -> Result<Source> {
        let name = self.expect_ident("plugin or variable")?;
        if self.peek_kind() == &TokenKind::LParen {
            Ok(Source::Plugin(self.parse_call(name)?))
        } else {
            Ok(Source::Variable(name))
        }
    }

    /// Parse `( args )` after a name
    fn parse_call(&mut self, name: String) -> Result<Call> {
        self.expect(TokenKind::LParen, "(")?;

        let mut args = Vec::new();
        if self.peek_kind() != &TokenKind::RParen {
            loop {
                let key = self.expect_ident("argument name")?;
                self.expect(TokenKind::Eq, "=")?;
                args.push((key, self.parse_operand()?));

                if self.peek_kind() != &TokenKind::Comma {
                    break;
                }
                self.advance();
            }
        }

        self.expect(TokenKind::RParen, ")")?;
        Ok(Call { name, args })
    }

    fn parse_condition(&mut self) -> Result<Condition> {
        let column = self.expect_ident("column name")?;
        let op = match self.peek_kind() {
            TokenKind::Eq => CompareOp::Eq,
            TokenKind::Ne => CompareOp::Ne,
            TokenKind::Lt => CompareOp::Lt,
            TokenKind::Le => CompareOp::Le,
            TokenKind::Gt => CompareOp::Gt,
            TokenKind::Ge => CompareOp::Ge,
            _ => return Err(self.unexpected("comparison operator")),
        };
        self.advance();
        let value = self.parse_operand()?;
        Ok(Condition { column, op, value })
    }

    fn parse_operand(&mut self) -> Result<Operand> {
        if let Some(value) = self.try_literal()? {
            return Ok(Operand::Literal(value));
        }
        Ok(Operand::Name(self.expect_ident("value")?))
    }

    fn parse_limit(&mut self) -> Result<usize> {
        let TokenKind::Number(text) = self.peek_kind().clone() else {
            return Err(self.unexpected("row count"));
        };
        let limit = text.parse::<usize>().map_err(|_| ParseError::UnexpectedToken {
            expected: "non-negative integer".to_string(),
            found: text.clone(),
        })?;
        self.advance();
        Ok(limit)
    }

    /// Consume a literal if one is next
    fn try_literal(&mut self) -> Result<Option<Value>> {
        let value = match self.peek_kind() {
            TokenKind::String(s) => Value::String(s.clone()),
            TokenKind::Number(n) => parse_number(n)?,
            TokenKind::True => Value::Bool(true),
            TokenKind::False => Value::Bool(false),
            TokenKind::Null => Value::Null,
            _ => return Ok(None),
        };
        self.advance();
        Ok(Some(value))
    }

    /// Only an optional `;` may follow a statement
    fn finish(&mut self) -> Result<()> {
        if self.peek_kind() == &TokenKind::Semicolon {
            self.advance();
        }
        if self.peek_kind() == &TokenKind::Eof {
            Ok(())
        } else {
            Err(self.unexpected("end of statement"))
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<()> {
        if self.peek_kind() == &kind {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_ident(&mut self, expected: &str) -> Result<String> {
        match self.peek_kind().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn unexpected(&self, expected: &str) -> crate::error::VqlshError {
        if self.peek_kind() == &TokenKind::Eof {
            ParseError::UnexpectedEnd(expected.to_string()).into()
        } else {
            ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: self.describe_current(),
            }
            .into()
        }
    }

    fn describe_current(&self) -> String {
        let span = self.current().span.clone();
        self.input[span].iter().collect()
    }

    fn current(&self) -> &Token {
        // The stream always ends with Eof and `advance` never moves past it
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn previous_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(0, |t| t.span.end)
    }

    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }
}

fn parse_number(text: &str) -> Result<Value> {
    if let Ok(i) = text.parse::<i64>() {
        return Ok(Value::Number(i.into()));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| ParseError::SyntaxError(format!("invalid number {text}")).into())
}
