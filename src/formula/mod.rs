//! Formula engine: text → tokens → AST → number, plus dependency ordering,
//! memoization, and per-timestamp evaluation contexts.

pub mod ast;
pub mod cache;
pub mod context;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod token;

pub use cache::{CachePolicy, FormulaCache};
pub use context::{namespaced, ContextBuilder, ContextMode, EvaluationContext};
pub use error::{ErrorKind, FormulaError};
pub use eval::Bindings;
pub use resolver::{references, resolve_order};

use ast::Expr;
use eval::Evaluator;
use lexer::Lexer;
use parser::Parser;

/// The reserved time variable, bound to elapsed seconds.
pub const TIME_VAR: &str = "x";

/// A formula parsed once and evaluated many times.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    text: String,
    expr: Expr,
}

impl Formula {
    /// Parse formula text.
    pub fn parse(text: &str) -> Result<Self, FormulaError> {
        let tokens = Lexer::new(text).tokenize()?;
        let expr = Parser::new(text, tokens).parse()?;
        Ok(Self {
            text: text.to_string(),
            expr,
        })
    }

    /// The source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Evaluate against the given bindings.
    pub fn eval<B: Bindings + ?Sized>(&self, bindings: &B) -> Result<f64, FormulaError> {
        Evaluator::new(&self.text, bindings).eval(&self.expr)
    }
}

/// Parse and evaluate `expression` in one step.
pub fn evaluate<B: Bindings + ?Sized>(expression: &str, bindings: &B) -> Result<f64, FormulaError> {
    Formula::parse(expression)?.eval(bindings)
}

/// The identifier a parameter is referenced by inside other formulas.
///
/// Parameter names may contain spaces (`grain start`); formulas refer to them
/// with underscores (`grain_start`).
pub fn binding_name(param: &str) -> String {
    param.trim().replace(' ', "_")
}

/// An ordered set of named formulas belonging to one track.
///
/// Order is insertion order; replacing a formula keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormulaSet {
    entries: Vec<(String, String)>,
}

impl FormulaSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the formula for `name`.
    pub fn set(&mut self, name: impl Into<String>, text: impl Into<String>) {
        let name = name.into();
        let text = text.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = text,
            None => self.entries.push((name, text)),
        }
    }

    /// Formula text for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t.as_str())
    }

    /// Remove a formula, returning its text.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    /// Iterate `(name, text)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>, T: Into<String>> FromIterator<(N, T)> for FormulaSet {
    fn from_iter<I: IntoIterator<Item = (N, T)>>(iter: I) -> Self {
        let mut set = FormulaSet::new();
        for (name, text) in iter {
            set.set(name, text);
        }
        set
    }
}
