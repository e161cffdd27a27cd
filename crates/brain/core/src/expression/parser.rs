//! Tokenizer and precedence-climbing parser.
//!
//! Precedence, loosest first: `?:`, `||`, `&&`, `== !=`, `< <= > >=`,
//! `+ -`, `* / %`, unary `! -`.

use super::{BinaryOp, Expr, UnaryOp, Value};
use crate::error::EvalError;

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Text(String),
    Ident(String),
    Dot,
    LParen,
    RParen,
    Question,
    Colon,
    Bang,
    Op(BinaryOp),
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn error(&self, message: impl Into<String>) -> EvalError {
        EvalError::Parse {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn tokens(mut self) -> Result<Vec<(usize, Token)>, EvalError> {
        let mut out = Vec::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
                continue;
            }
            let start = self.pos;
            let token = match c {
                '0'..='9' => self.number()?,
                '.' if self.src[self.pos + 1..]
                    .chars()
                    .next()
                    .is_some_and(|n| n.is_ascii_digit()) =>
                {
                    self.number()?
                }
                '\'' | '"' => self.text(c)?,
                c if c.is_ascii_alphabetic() || c == '_' => self.ident(),
                _ => self.symbol()?,
            };
            out.push((start, token));
        }
        Ok(out)
    }

    fn number(&mut self) -> Result<Token, EvalError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || c == '.')
        {
            self.bump();
        }
        self.src[start..self.pos]
            .parse::<f64>()
            .map(Token::Number)
            .map_err(|_| self.error(format!("bad number `{}`", &self.src[start..self.pos])))
    }

    fn text(&mut self, quote: char) -> Result<Token, EvalError> {
        self.bump();
        let start = self.pos;
        while let Some(c) = self.bump() {
            if c == quote {
                let end = self.pos - quote.len_utf8();
                return Ok(Token::Text(self.src[start..end].to_owned()));
            }
        }
        Err(self.error("unterminated text literal"))
    }

    fn ident(&mut self) -> Token {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.bump();
        }
        Token::Ident(self.src[start..self.pos].to_owned())
    }

    fn symbol(&mut self) -> Result<Token, EvalError> {
        let start = self.pos;
        let Some(c) = self.bump() else {
            return Err(self.error("unexpected end of input"));
        };
        let token = match c {
            '.' => Token::Dot,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '?' => Token::Question,
            ':' => Token::Colon,
            '*' => Token::Op(BinaryOp::Mul),
            '/' => Token::Op(BinaryOp::Div),
            '%' => Token::Op(BinaryOp::Rem),
            '+' => Token::Op(BinaryOp::Add),
            '-' => Token::Op(BinaryOp::Sub),
            '<' if self.eat('=') => Token::Op(BinaryOp::Le),
            '<' => Token::Op(BinaryOp::Lt),
            '>' if self.eat('=') => Token::Op(BinaryOp::Ge),
            '>' => Token::Op(BinaryOp::Gt),
            '=' if self.eat('=') => Token::Op(BinaryOp::Eq),
            '!' if self.eat('=') => Token::Op(BinaryOp::Ne),
            '!' => Token::Bang,
            '&' if self.eat('&') => Token::Op(BinaryOp::And),
            '|' if self.eat('|') => Token::Op(BinaryOp::Or),
            other => {
                return Err(EvalError::Parse {
                    offset: start,
                    message: format!("unexpected character `{other}`"),
                });
            }
        };
        Ok(token)
    }
}

fn binding_power(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Or => 2,
        BinaryOp::And => 3,
        BinaryOp::Eq | BinaryOp::Ne => 4,
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 5,
        BinaryOp::Add | BinaryOp::Sub => 6,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 7,
    }
}

const TERNARY_POWER: u8 = 1;
const UNARY_POWER: u8 = 8;

struct Parser {
    tokens: Vec<(usize, Token)>,
    cursor: usize,
    end: usize,
}

impl Parser {
    fn offset(&self) -> usize {
        self.tokens
            .get(self.cursor)
            .map_or(self.end, |(offset, _)| *offset)
    }

    fn error(&self, message: impl Into<String>) -> EvalError {
        EvalError::Parse {
            offset: self.offset(),
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor).map(|(_, t)| t)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).map(|(_, t)| t.clone());
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<(), EvalError> {
        if self.peek() == Some(expected) {
            self.cursor += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    fn expression(&mut self, min_power: u8) -> Result<Expr, EvalError> {
        let mut lhs = self.prefix()?;

        loop {
            match self.peek() {
                Some(Token::Op(op)) => {
                    let op = *op;
                    let power = binding_power(op);
                    if power < min_power {
                        break;
                    }
                    self.cursor += 1;
                    let rhs = self.expression(power + 1)?;
                    lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
                }
                Some(Token::Question) => {
                    if TERNARY_POWER < min_power {
                        break;
                    }
                    self.cursor += 1;
                    let then = self.expression(TERNARY_POWER)?;
                    self.expect(&Token::Colon, "`:` in conditional")?;
                    let otherwise = self.expression(TERNARY_POWER)?;
                    lhs = Expr::Ternary(Box::new(lhs), Box::new(then), Box::new(otherwise));
                }
                _ => break,
            }
        }

        Ok(lhs)
    }

    fn prefix(&mut self) -> Result<Expr, EvalError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Literal(Value::Number(n))),
            Some(Token::Text(s)) => Ok(Expr::Literal(Value::Text(s))),
            Some(Token::Bang) => {
                let operand = self.expression(UNARY_POWER)?;
                Ok(Expr::Unary(UnaryOp::Not, Box::new(operand)))
            }
            Some(Token::Op(BinaryOp::Sub)) => {
                let operand = self.expression(UNARY_POWER)?;
                Ok(Expr::Unary(UnaryOp::Neg, Box::new(operand)))
            }
            Some(Token::LParen) => {
                let inner = self.expression(0)?;
                self.expect(&Token::RParen, "`)`")?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => self.path(name),
            Some(other) => {
                self.cursor -= 1;
                Err(self.error(format!("unexpected token {other:?}")))
            }
            None => Err(self.error("unexpected end of expression")),
        }
    }

    fn path(&mut self, first: String) -> Result<Expr, EvalError> {
        let lowered = first.to_ascii_lowercase();
        if lowered == "true" || lowered == "false" {
            return Ok(Expr::Literal(Value::Bool(lowered == "true")));
        }

        let mut segments = vec![lowered];
        while self.peek() == Some(&Token::Dot) {
            self.cursor += 1;
            match self.next() {
                Some(Token::Ident(segment)) => segments.push(segment),
                _ => {
                    self.cursor = self.cursor.saturating_sub(1);
                    return Err(self.error("expected name after `.`"));
                }
            }
        }
        Ok(Expr::Path(segments))
    }
}

pub(super) fn parse(source: &str) -> Result<Expr, EvalError> {
    let tokens = Lexer::new(source).tokens()?;
    let mut parser = Parser {
        tokens,
        cursor: 0,
        end: source.len(),
    };
    let expr = parser.expression(0)?;
    if parser.peek().is_some() {
        return Err(parser.error("trailing input"));
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Literal(Value::Number(n)))
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(
            parse("1 + 2 * 3").unwrap(),
            Expr::Binary(
                BinaryOp::Add,
                num(1.0),
                Box::new(Expr::Binary(BinaryOp::Mul, num(2.0), num(3.0)))
            )
        );
    }

    #[test]
    fn parses_dotted_paths_and_keywords() {
        assert_eq!(
            parse("q.entity.config.wanders").unwrap(),
            Expr::Path(vec![
                "q".into(),
                "entity".into(),
                "config".into(),
                "wanders".into()
            ])
        );
        assert_eq!(parse("TRUE").unwrap(), Expr::Literal(Value::Bool(true)));
        assert_eq!(parse("'mareep'").unwrap(), Expr::Literal(Value::Text("mareep".into())));
        assert_eq!(parse(".5").unwrap(), Expr::Literal(Value::Number(0.5)));
    }

    #[test]
    fn ternary_is_right_associative() {
        let expr = parse("a ? 1 : b ? 2 : 3").unwrap();
        let Expr::Ternary(_, _, otherwise) = expr else {
            panic!("expected ternary");
        };
        assert!(matches!(*otherwise, Expr::Ternary(..)));
    }

    #[test]
    fn reports_offset_of_bad_input() {
        assert!(matches!(parse("1 +"), Err(EvalError::Parse { offset: 3, .. })));
        assert!(matches!(parse("(1 + 2"), Err(EvalError::Parse { .. })));
        assert!(matches!(parse("1 2"), Err(EvalError::Parse { offset: 2, .. })));
        assert!(matches!(parse("a # b"), Err(EvalError::Parse { offset: 2, .. })));
    }
}
