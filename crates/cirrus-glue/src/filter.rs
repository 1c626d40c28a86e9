//! Partition filter expressions (`GetPartitions` `Expression`).
//!
//! Supported syntax:
//!
//! ```text
//! expr    := and (OR and)*
//! and     := unary (AND unary)*
//! unary   := NOT unary | '(' expr ')' | predicate
//! predicate :=
//!       column op literal                 op: = <> != < <= > >=
//!     | column [NOT] BETWEEN literal AND literal
//!     | column [NOT] IN '(' literal (',' literal)* ')'
//!     | column [NOT] LIKE 'pattern'
//!     | column IS [NOT] NULL
//! ```
//!
//! Caveats:
//!
//! - Column names consist of upper/lowercase letters, dots and underscores.
//! - Literal dates and timestamps must be valid calendar values; February 31st
//!   is rejected, not rolled over.
//! - Timestamp fractions beyond microseconds are truncated.
//! - `LIKE` supports the `%` and `_` wildcards only; bracket escapes are not
//!   recognised and every other character matches literally.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use cirrus_core::{CloudError, CloudResult};
use regex::Regex;
use rust_decimal::Decimal;

use crate::catalog::Column;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            CmpOp::Eq => ordering == Ordering::Equal,
            CmpOp::Ne => ordering != Ordering::Equal,
            CmpOp::Lt => ordering == Ordering::Less,
            CmpOp::Le => ordering != Ordering::Greater,
            CmpOp::Gt => ordering == Ordering::Greater,
            CmpOp::Ge => ordering != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Number(String),
    Op(CmpOp),
    LParen,
    RParen,
    Comma,
}

#[derive(Debug)]
enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Compare {
        column: String,
        op: CmpOp,
        literal: String,
    },
    Between {
        column: String,
        low: String,
        high: String,
        negated: bool,
    },
    In {
        column: String,
        items: Vec<String>,
        negated: bool,
    },
    Like {
        column: String,
        pattern: Regex,
        negated: bool,
    },
    IsNull {
        column: String,
        negated: bool,
    },
}

/// Declared type of a partition key column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Decimal,
    Date,
    Timestamp,
}

impl ColumnType {
    pub fn parse(declared: &str) -> CloudResult<Self> {
        let lowered = declared.trim().to_ascii_lowercase();
        // Strip parameters such as `varchar(10)` or `decimal(10,2)`.
        let base = lowered.split('(').next().unwrap_or_default().trim();
        match base {
            "string" | "char" | "varchar" => Ok(ColumnType::Text),
            "tinyint" | "smallint" | "int" | "integer" | "bigint" => Ok(ColumnType::Integer),
            "decimal" => Ok(ColumnType::Decimal),
            "date" => Ok(ColumnType::Date),
            "timestamp" => Ok(ColumnType::Timestamp),
            _ => Err(CloudError::invalid_input(format!("Unknown type : '{declared}'"))),
        }
    }

    fn cast(self, raw: &str) -> CloudResult<Typed> {
        let invalid = |reason: String| {
            CloudError::invalid_input(format!("Could not convert '{raw}' to {self:?}: {reason}"))
        };
        Ok(match self {
            ColumnType::Text => Typed::Text(raw.to_string()),
            ColumnType::Integer => Typed::Integer(
                raw.trim()
                    .parse::<i64>()
                    .map_err(|e| invalid(e.to_string()))?,
            ),
            ColumnType::Decimal => Typed::Decimal(
                Decimal::from_str(raw.trim()).map_err(|e| invalid(e.to_string()))?,
            ),
            ColumnType::Date => Typed::Date(
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .map_err(|e| invalid(e.to_string()))?,
            ),
            ColumnType::Timestamp => {
                let parsed = NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S%.f")
                    .map_err(|e| invalid(e.to_string()))?;
                let micros_only = parsed.nanosecond() / 1_000 * 1_000;
                Typed::Timestamp(parsed.with_nanosecond(micros_only).unwrap_or(parsed))
            }
        })
    }
}

/// A value cast to its column's type. Both sides of a comparison always share
/// a variant, so the derived ordering only ever compares like with like.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
enum Typed {
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

/// A parsed filter, reusable across every partition of a table.
#[derive(Debug)]
pub struct PartitionFilter {
    expr: Expr,
}

impl PartitionFilter {
    pub fn parse(expression: &str) -> CloudResult<Self> {
        let tokens = tokenize(expression)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            source: expression,
        };
        let expr = parser.parse_or()?;
        if parser.pos != parser.tokens.len() {
            return Err(parser.unsupported());
        }
        Ok(Self { expr })
    }

    /// Evaluate against one partition's values, typed by the table's keys.
    pub fn matches(&self, keys: &[Column], values: &[String]) -> CloudResult<bool> {
        let row = Row { keys, values };
        row.eval(&self.expr)
    }
}

struct Row<'a> {
    keys: &'a [Column],
    values: &'a [String],
}

impl Row<'_> {
    fn column(&self, name: &str) -> CloudResult<(ColumnType, Option<&str>)> {
        let index = self
            .keys
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| CloudError::invalid_input(format!("Unknown column '{name}'")))?;
        let column_type = ColumnType::parse(self.keys[index].column_type.as_deref().unwrap_or("string"))?;
        Ok((column_type, self.values.get(index).map(String::as_str)))
    }

    fn compare(&self, column: &str, literal: &str) -> CloudResult<Option<Ordering>> {
        let (column_type, value) = self.column(column)?;
        let rhs = column_type.cast(literal)?;
        let Some(value) = value else {
            return Ok(None);
        };
        let lhs = column_type.cast(value)?;
        Ok(lhs.partial_cmp(&rhs))
    }

    fn eval(&self, expr: &Expr) -> CloudResult<bool> {
        match expr {
            Expr::Or(a, b) => Ok(self.eval(a)? || self.eval(b)?),
            Expr::And(a, b) => Ok(self.eval(a)? && self.eval(b)?),
            Expr::Not(inner) => Ok(!self.eval(inner)?),
            Expr::Compare {
                column,
                op,
                literal,
            } => Ok(self
                .compare(column, literal)?
                .is_some_and(|ordering| op.holds(ordering))),
            Expr::Between {
                column,
                low,
                high,
                negated,
            } => {
                let above = self.compare(column, low)?;
                let below = self.compare(column, high)?;
                let inside = match (above, below) {
                    (Some(a), Some(b)) => a != Ordering::Less && b != Ordering::Greater,
                    _ => return Ok(false),
                };
                Ok(inside != *negated)
            }
            Expr::In {
                column,
                items,
                negated,
            } => {
                let mut found = false;
                for item in items {
                    match self.compare(column, item)? {
                        Some(Ordering::Equal) => found = true,
                        Some(_) => {}
                        None => return Ok(false),
                    }
                }
                Ok(found != *negated)
            }
            Expr::Like {
                column,
                pattern,
                negated,
            } => {
                let (column_type, value) = self.column(column)?;
                if column_type != ColumnType::Text {
                    return Err(CloudError::invalid_input(format!(
                        "LIKE is only supported on string columns, '{column}' is {column_type:?}"
                    )));
                }
                Ok(value.is_some_and(|v| pattern.is_match(v) != *negated))
            }
            Expr::IsNull { column, negated } => {
                let (_, value) = self.column(column)?;
                Ok(value.is_none() != *negated)
            }
        }
    }
}

/// Translate a SQL `LIKE` pattern into an anchored regex.
fn like_to_regex(pattern: &str) -> CloudResult<Regex> {
    let mut translated = String::from("(?s)^");
    for c in pattern.chars() {
        match c {
            '%' => translated.push_str(".*"),
            '_' => translated.push('.'),
            other => translated.push_str(&regex::escape(&other.to_string())),
        }
    }
    translated.push('$');
    Regex::new(&translated).map_err(|e| CloudError::invalid_input(e.to_string()))
}

fn tokenize(source: &str) -> CloudResult<Vec<Token>> {
    let unsupported = || CloudError::invalid_input(format!("Unsupported expression '{source}'"));
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            _ if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '\'' => {
                let mut literal = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(unsupported()),
                        Some('\'') if chars.get(i + 1) == Some(&'\'') => {
                            literal.push('\'');
                            i += 2;
                        }
                        Some('\'') => {
                            i += 1;
                            break;
                        }
                        Some(other) => {
                            literal.push(*other);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Str(literal));
            }
            '=' => {
                tokens.push(Token::Op(CmpOp::Eq));
                i += 1;
            }
            '!' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Op(CmpOp::Ne));
                i += 2;
            }
            '<' => {
                let (op, width) = match chars.get(i + 1) {
                    Some('=') => (CmpOp::Le, 2),
                    Some('>') => (CmpOp::Ne, 2),
                    _ => (CmpOp::Lt, 1),
                };
                tokens.push(Token::Op(op));
                i += width;
            }
            '>' => {
                let (op, width) = match chars.get(i + 1) {
                    Some('=') => (CmpOp::Ge, 2),
                    _ => (CmpOp::Gt, 1),
                };
                tokens.push(Token::Op(op));
                i += width;
            }
            _ if c.is_ascii_digit()
                || (c == '-' && chars.get(i + 1).is_some_and(char::is_ascii_digit)) =>
            {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                tokens.push(Token::Number(chars[start..i].iter().collect()));
            }
            _ if c.is_ascii_alphabetic() || c == '_' || c == '.' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_alphabetic() || chars[i] == '_' || chars[i] == '.')
                {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            _ => return Err(unsupported()),
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'a str,
}

impl Parser<'_> {
    fn unsupported(&self) -> CloudError {
        CloudError::invalid_input(format!("Unsupported expression '{}'", self.source))
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(word)) if word.eq_ignore_ascii_case(keyword))
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> CloudResult<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unsupported())
        }
    }

    fn expect(&mut self, expected: &Token) -> CloudResult<()> {
        match self.next() {
            Some(ref token) if token == expected => Ok(()),
            _ => Err(self.unsupported()),
        }
    }

    fn parse_or(&mut self) -> CloudResult<Expr> {
        let mut lhs = self.parse_and()?;
        while self.eat_keyword("OR") {
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> CloudResult<Expr> {
        let mut lhs = self.parse_unary()?;
        while self.eat_keyword("AND") {
            let rhs = self.parse_unary()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> CloudResult<Expr> {
        if self.eat_keyword("NOT") {
            return Ok(Expr::Not(Box::new(self.parse_unary()?)));
        }
        if self.peek() == Some(&Token::LParen) {
            self.pos += 1;
            let inner = self.parse_or()?;
            self.expect(&Token::RParen)?;
            return Ok(inner);
        }
        self.parse_predicate()
    }

    fn parse_literal(&mut self) -> CloudResult<String> {
        match self.next() {
            Some(Token::Str(s)) | Some(Token::Number(s)) => Ok(s),
            _ => Err(self.unsupported()),
        }
    }

    fn parse_predicate(&mut self) -> CloudResult<Expr> {
        let column = match self.next() {
            Some(Token::Ident(name)) if !is_keyword(&name) => name,
            _ => return Err(self.unsupported()),
        };

        if let Some(Token::Op(op)) = self.peek().cloned() {
            self.pos += 1;
            let literal = self.parse_literal()?;
            return Ok(Expr::Compare {
                column,
                op,
                literal,
            });
        }

        if self.eat_keyword("IS") {
            let negated = self.eat_keyword("NOT");
            self.expect_keyword("NULL")?;
            return Ok(Expr::IsNull { column, negated });
        }

        let negated = self.eat_keyword("NOT");
        if self.eat_keyword("BETWEEN") {
            let low = self.parse_literal()?;
            self.expect_keyword("AND")?;
            let high = self.parse_literal()?;
            return Ok(Expr::Between {
                column,
                low,
                high,
                negated,
            });
        }
        if self.eat_keyword("IN") {
            self.expect(&Token::LParen)?;
            let mut items = vec![self.parse_literal()?];
            while self.peek() == Some(&Token::Comma) {
                self.pos += 1;
                items.push(self.parse_literal()?);
            }
            self.expect(&Token::RParen)?;
            return Ok(Expr::In {
                column,
                items,
                negated,
            });
        }
        if self.eat_keyword("LIKE") {
            let pattern = match self.next() {
                Some(Token::Str(s)) => like_to_regex(&s)?,
                _ => return Err(self.unsupported()),
            };
            return Ok(Expr::Like {
                column,
                pattern,
                negated,
            });
        }
        Err(self.unsupported())
    }
}

fn is_keyword(word: &str) -> bool {
    ["AND", "OR", "NOT", "BETWEEN", "IN", "LIKE", "IS", "NULL"]
        .iter()
        .any(|k| word.eq_ignore_ascii_case(k))
}
