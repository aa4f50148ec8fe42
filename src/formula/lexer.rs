//! Lexer for formula text.
//!
//! Converts an expression such as `x/10%100` into a stream of [`Token`]s.
//! Identifier boundaries come from the character classes, not from whitespace,
//! so compact formulas tokenize the same as spaced ones.

use super::error::FormulaError;
use super::token::{Token, TokenKind};

pub struct Lexer<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, FormulaError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();

            if self.is_at_end() {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    col: self.col(),
                });
                break;
            }

            let ch = self.peek();
            let token = match ch {
                '+' => self.single_char(TokenKind::Plus),
                '-' => self.single_char(TokenKind::Minus),
                '/' => self.single_char(TokenKind::Slash),
                '%' => self.single_char(TokenKind::Percent),
                '(' => self.single_char(TokenKind::LParen),
                ')' => self.single_char(TokenKind::RParen),
                ',' => self.single_char(TokenKind::Comma),
                '*' => {
                    let col = self.col();
                    self.advance();
                    if !self.is_at_end() && self.peek() == '*' {
                        self.advance();
                        Token {
                            kind: TokenKind::StarStar,
                            col,
                        }
                    } else {
                        Token {
                            kind: TokenKind::Star,
                            col,
                        }
                    }
                }
                '.' if self.peek_next().is_some_and(|c| c.is_ascii_digit()) => self.lex_number()?,
                '0'..='9' => self.lex_number()?,
                'a'..='z' | 'A'..='Z' | '_' => self.lex_ident(),
                _ => {
                    return Err(FormulaError::lex(
                        format!("unexpected character: '{ch}'"),
                        self.source,
                        self.col(),
                    ));
                }
            };

            tokens.push(token);
        }

        Ok(tokens)
    }

    fn peek(&self) -> char {
        self.chars[self.pos]
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        ch
    }

    fn col(&self) -> usize {
        self.pos + 1
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.peek().is_whitespace() {
            self.advance();
        }
    }

    fn single_char(&mut self, kind: TokenKind) -> Token {
        let col = self.col();
        self.advance();
        Token { kind, col }
    }

    fn lex_number(&mut self) -> Result<Token, FormulaError> {
        let col = self.col();
        let mut text = String::new();

        while !self.is_at_end() && self.peek().is_ascii_digit() {
            text.push(self.advance());
        }
        if !self.is_at_end() && self.peek() == '.' {
            text.push(self.advance());
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                text.push(self.advance());
            }
        }

        // Exponent only when digits follow, so `2e` stays `2` then identifier `e`.
        if !self.is_at_end() && matches!(self.peek(), 'e' | 'E') {
            let sign = self.peek_next();
            let digit_at = match sign {
                Some('+') | Some('-') => self.chars.get(self.pos + 2).copied(),
                other => other,
            };
            if digit_at.is_some_and(|c| c.is_ascii_digit()) {
                text.push(self.advance());
                if matches!(self.peek(), '+' | '-') {
                    text.push(self.advance());
                }
                while !self.is_at_end() && self.peek().is_ascii_digit() {
                    text.push(self.advance());
                }
            }
        }

        let value: f64 = text.parse().map_err(|_| {
            FormulaError::lex(format!("invalid number: '{text}'"), self.source, col)
        })?;

        Ok(Token {
            kind: TokenKind::Number(value),
            col,
        })
    }

    /// Identifiers may carry dotted segments (`t0.rhythm`) for namespaced bindings.
    fn lex_ident(&mut self) -> Token {
        let col = self.col();
        let mut name = String::new();

        loop {
            while !self.is_at_end() && (self.peek().is_ascii_alphanumeric() || self.peek() == '_') {
                name.push(self.advance());
            }
            let continues = !self.is_at_end()
                && self.peek() == '.'
                && self
                    .peek_next()
                    .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
            if !continues {
                break;
            }
            name.push(self.advance());
        }

        Token {
            kind: TokenKind::Ident(name),
            col,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn compact_expression_splits_on_operators() {
        assert_eq!(
            kinds("x/10%100"),
            vec![
                TokenKind::Ident("x".into()),
                TokenKind::Slash,
                TokenKind::Number(10.0),
                TokenKind::Percent,
                TokenKind::Number(100.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn power_operator() {
        assert_eq!(
            kinds("2**3"),
            vec![
                TokenKind::Number(2.0),
                TokenKind::StarStar,
                TokenKind::Number(3.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn number_forms() {
        assert_eq!(kinds(".5")[0], TokenKind::Number(0.5));
        assert_eq!(kinds("1.25")[0], TokenKind::Number(1.25));
        assert_eq!(kinds("1e-3")[0], TokenKind::Number(0.001));
        assert_eq!(kinds("3.")[0], TokenKind::Number(3.0));
    }

    #[test]
    fn exponent_needs_digits() {
        assert_eq!(
            kinds("2e"),
            vec![
                TokenKind::Number(2.0),
                TokenKind::Ident("e".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn namespaced_identifier() {
        assert_eq!(kinds("t0.rhythm * 2")[0], TokenKind::Ident("t0.rhythm".into()));
    }

    #[test]
    fn trailing_dot_is_not_part_of_identifier() {
        let err = Lexer::new("x.").tokenize().unwrap_err();
        assert_eq!(err.col, 2);
    }

    #[test]
    fn columns_are_one_based() {
        let tokens = Lexer::new("  x + 1").tokenize().unwrap();
        assert_eq!(tokens[0].col, 3);
        assert_eq!(tokens[1].col, 5);
        assert_eq!(tokens[2].col, 7);
    }

    #[test]
    fn rejects_unknown_character() {
        let err = Lexer::new("x ^ 2").tokenize().unwrap_err();
        assert_eq!(err.kind, super::super::error::ErrorKind::LexError);
        assert_eq!(err.col, 3);
    }
}
