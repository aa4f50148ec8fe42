//! Parser for formula text.
//!
//! Precedence, lowest first: `+ -`, `* / %`, unary `+ -`, `**` (right
//! associative), then calls and primaries.

use super::ast::{BinOp, Expr};
use super::error::FormulaError;
use super::token::{Token, TokenKind};

pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
        }
    }

    /// Parse a complete formula. Trailing tokens are an error.
    pub fn parse(&mut self) -> Result<Expr, FormulaError> {
        if self.check(&TokenKind::Eof) {
            return Err(FormulaError::parse("empty formula", self.source, 1));
        }
        let expr = self.parse_additive()?;
        if !self.check(&TokenKind::Eof) {
            let t = self.peek();
            return Err(FormulaError::parse(
                format!("unexpected {}", t.kind.describe()),
                self.source,
                t.col,
            ));
        }
        Ok(expr)
    }

    fn parse_additive(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let col = self.advance().col;
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                col,
            };
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            let col = self.advance().col;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                col,
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, FormulaError> {
        match self.peek().kind {
            TokenKind::Minus => {
                self.advance();
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            TokenKind::Plus => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    // `-2 ** 2` is `-(2 ** 2)` and the exponent may itself be signed: `2 ** -1`.
    fn parse_power(&mut self) -> Result<Expr, FormulaError> {
        let base = self.parse_primary()?;
        if self.check(&TokenKind::StarStar) {
            let col = self.advance().col;
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary {
                op: BinOp::Pow,
                lhs: Box::new(base),
                rhs: Box::new(exponent),
                col,
            });
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, FormulaError> {
        let t = self.advance();
        match t.kind {
            TokenKind::Number(n) => Ok(Expr::Number(n)),
            TokenKind::Ident(name) => {
                if self.check(&TokenKind::LParen) {
                    self.advance();
                    let args = self.parse_args()?;
                    Ok(Expr::Call {
                        name,
                        args,
                        col: t.col,
                    })
                } else {
                    Ok(Expr::Var { name, col: t.col })
                }
            }
            TokenKind::LParen => {
                let inner = self.parse_additive()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            other => Err(FormulaError::parse(
                format!("expected a value, found {}", other.describe()),
                self.source,
                t.col,
            )),
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, FormulaError> {
        let mut args = Vec::new();
        if self.check(&TokenKind::RParen) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_additive()?);
            if self.check(&TokenKind::Comma) {
                self.advance();
                continue;
            }
            self.expect(TokenKind::RParen)?;
            return Ok(args);
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let t = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, FormulaError> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            let t = self.peek();
            Err(FormulaError::parse(
                format!("expected {}, found {}", kind.describe(), t.kind.describe()),
                self.source,
                t.col,
            ))
        }
    }
}
