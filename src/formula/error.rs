//! Error types for formula lexing, parsing, resolution, and evaluation.

use std::fmt;

/// An error raised while turning a formula into a number.
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaError {
    pub message: String,
    /// The formula text (or parameter name, for resolution errors) that failed.
    pub expression: String,
    /// 1-based column in `expression`, 0 when not tied to a position.
    pub col: usize,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    LexError,
    ParseError,
    /// An identifier that is not in the binding set.
    UnboundIdentifier(String),
    /// A call to a function outside the allow-list, or with the wrong arity.
    UnknownFunction(String),
    /// Division by zero, zero stretch, or a non-finite result.
    Domain,
    /// The named formulas reference each other in a loop.
    CyclicDependency(Vec<String>),
    /// A parameter name the track kind does not recognize.
    UnknownParameter(String),
}

impl FormulaError {
    pub fn lex(message: impl Into<String>, expression: &str, col: usize) -> Self {
        Self {
            message: message.into(),
            expression: expression.to_string(),
            col,
            kind: ErrorKind::LexError,
        }
    }

    pub fn parse(message: impl Into<String>, expression: &str, col: usize) -> Self {
        Self {
            message: message.into(),
            expression: expression.to_string(),
            col,
            kind: ErrorKind::ParseError,
        }
    }

    pub fn unbound(name: &str, expression: &str, col: usize) -> Self {
        Self {
            message: format!("unbound identifier '{name}'"),
            expression: expression.to_string(),
            col,
            kind: ErrorKind::UnboundIdentifier(name.to_string()),
        }
    }

    pub fn unknown_function(
        name: &str,
        message: impl Into<String>,
        expression: &str,
        col: usize,
    ) -> Self {
        Self {
            message: message.into(),
            expression: expression.to_string(),
            col,
            kind: ErrorKind::UnknownFunction(name.to_string()),
        }
    }

    pub fn domain(message: impl Into<String>, expression: &str, col: usize) -> Self {
        Self {
            message: message.into(),
            expression: expression.to_string(),
            col,
            kind: ErrorKind::Domain,
        }
    }

    pub fn cyclic(cycle: Vec<String>) -> Self {
        Self {
            message: format!("cyclic dependency: {}", cycle.join(" -> ")),
            expression: cycle.first().cloned().unwrap_or_default(),
            col: 0,
            kind: ErrorKind::CyclicDependency(cycle),
        }
    }

    pub fn unknown_parameter(name: &str) -> Self {
        Self {
            message: format!("unknown parameter '{name}'"),
            expression: name.to_string(),
            col: 0,
            kind: ErrorKind::UnknownParameter(name.to_string()),
        }
    }

    /// Whether this error came from a dependency cycle.
    pub fn is_cyclic(&self) -> bool {
        matches!(self.kind, ErrorKind::CyclicDependency(_))
    }
}

impl fmt::Display for FormulaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.col > 0 {
            write!(f, "'{}' [col {}]: {}", self.expression, self.col, self.message)
        } else {
            write!(f, "'{}': {}", self.expression, self.message)
        }
    }
}

impl std::error::Error for FormulaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_column_when_known() {
        let err = FormulaError::unbound("y", "x + y", 5);
        assert_eq!(err.to_string(), "'x + y' [col 5]: unbound identifier 'y'");
    }

    #[test]
    fn display_omits_zero_column() {
        let err = FormulaError::unknown_parameter("tempo");
        assert_eq!(err.to_string(), "'tempo': unknown parameter 'tempo'");
    }

    #[test]
    fn cyclic_lists_path() {
        let err = FormulaError::cyclic(vec!["a".into(), "b".into(), "a".into()]);
        assert!(err.is_cyclic());
        assert!(err.message.contains("a -> b -> a"));
    }
}
