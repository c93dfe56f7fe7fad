//! Expression parser
//!
//! Recursive descent over the token stream, lowest precedence first:
//! `||`, `&&`, equality, comparison, additive, multiplicative, unary,
//! primary.

use super::token::{tokenize, Spanned, Token};
use super::ExprError;

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Not,
    Neg,
}

/// Parsed expression tree
#[derive(Debug, Clone)]
pub(crate) enum Ast {
    /// A literal value (number, string, boolean, null)
    Literal(serde_json::Value),
    /// A field path into the current record (`a`, `a.b.c`)
    Field(Vec<String>),
    /// A unary operation
    Unary { op: UnaryOp, operand: Box<Ast> },
    /// A binary operation
    Binary {
        op: BinaryOp,
        lhs: Box<Ast>,
        rhs: Box<Ast>,
    },
    /// A builtin function call
    Call { function: String, args: Vec<Ast> },
}

/// Parse expression text into an [`Ast`]
pub(crate) fn parse(source: &str) -> Result<Ast, ExprError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        source_len: source.len(),
    };
    let ast = parser.parse_or()?;
    if let Some(spanned) = parser.peek() {
        return Err(ExprError::parse(
            spanned.offset,
            format!("unexpected token {:?}", spanned.token),
        ));
    }
    Ok(ast)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    source_len: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Spanned> {
        let spanned = self.tokens.get(self.pos);
        if spanned.is_some() {
            self.pos += 1;
        }
        spanned
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek().map(|s| &s.token) == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<(), ExprError> {
        let offset = self.offset();
        if self.eat(&token) {
            Ok(())
        } else {
            Err(ExprError::parse(offset, format!("expected {}", what)))
        }
    }

    fn offset(&self) -> usize {
        self.peek().map(|s| s.offset).unwrap_or(self.source_len)
    }

    fn parse_or(&mut self) -> Result<Ast, ExprError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::OrOr) {
            let rhs = self.parse_and()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Ast, ExprError> {
        let mut lhs = self.parse_equality()?;
        while self.eat(&Token::AndAnd) {
            let rhs = self.parse_equality()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Ast, ExprError> {
        let mut lhs = self.parse_comparison()?;
        loop {
            let op = match self.peek().map(|s| &s.token) {
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::NotEq,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_comparison()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<Ast, ExprError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek().map(|s| &s.token) {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::LtEq) => BinaryOp::LtEq,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::GtEq) => BinaryOp::GtEq,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_additive()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Ast, ExprError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().map(|s| &s.token) {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_multiplicative()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Ast, ExprError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek().map(|s| &s.token) {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Ast, ExprError> {
        if self.eat(&Token::Not) {
            let operand = self.parse_unary()?;
            return Ok(Ast::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        if self.eat(&Token::Minus) {
            let operand = self.parse_unary()?;
            return Ok(Ast::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Ast, ExprError> {
        let offset = self.offset();
        let token = match self.next() {
            Some(spanned) => spanned.token.clone(),
            None => return Err(ExprError::parse(offset, "unexpected end of expression")),
        };

        match token {
            Token::Number(n) => Ok(Ast::Literal(number_literal(n))),
            Token::Str(s) => Ok(Ast::Literal(serde_json::Value::String(s))),
            Token::True => Ok(Ast::Literal(serde_json::Value::Bool(true))),
            Token::False => Ok(Ast::Literal(serde_json::Value::Bool(false))),
            Token::Null => Ok(Ast::Literal(serde_json::Value::Null)),
            Token::LParen => {
                let inner = self.parse_or()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::Ident(name) => {
                if self.eat(&Token::LParen) {
                    let args = self.parse_args()?;
                    Ok(Ast::Call {
                        function: name,
                        args,
                    })
                } else {
                    let mut path = vec![name];
                    while self.eat(&Token::Dot) {
                        let offset = self.offset();
                        match self.next().map(|s| s.token.clone()) {
                            Some(Token::Ident(segment)) => path.push(segment),
                            _ => {
                                return Err(ExprError::parse(
                                    offset,
                                    "expected field name after '.'",
                                ))
                            }
                        }
                    }
                    Ok(Ast::Field(path))
                }
            }
            other => Err(ExprError::parse(
                offset,
                format!("unexpected token {:?}", other),
            )),
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Ast>, ExprError> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_or()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(Token::RParen, "')' after arguments")?;
            return Ok(args);
        }
    }
}

fn binary(op: BinaryOp, lhs: Ast, rhs: Ast) -> Ast {
    Ast::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

fn number_literal(n: f64) -> serde_json::Value {
    super::eval::number_value(n)
}
