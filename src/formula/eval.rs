//! Evaluation of a parsed formula against a closed set of bindings.

use std::collections::HashMap;

use super::ast::{BinOp, Expr};
use super::error::FormulaError;

/// A read-only name → value lookup consumed by the evaluator.
pub trait Bindings {
    fn lookup(&self, name: &str) -> Option<f64>;
}

impl Bindings for HashMap<String, f64> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl Bindings for [(&str, f64)] {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }
}

impl<const N: usize> Bindings for [(&str, f64); N] {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.as_slice().lookup(name)
    }
}

/// Names of the allow-listed functions, for diagnostics.
pub const FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "asin", "acos", "atan", "atan2", "sinh", "cosh", "tanh", "sqrt", "abs",
    "floor", "ceil", "round", "trunc", "exp", "ln", "log", "log10", "log2", "pow", "min", "max",
    "clamp", "sign", "hypot",
];

/// Constants resolve only when the bindings do not define the same name.
fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "tau" => Some(std::f64::consts::TAU),
        "e" => Some(std::f64::consts::E),
        _ => None,
    }
}

/// Floored modulo, matching the sign convention of the divisor.
pub fn floored_mod(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) {
        r + b
    } else {
        r
    }
}

pub struct Evaluator<'a, B: Bindings + ?Sized> {
    source: &'a str,
    bindings: &'a B,
}

impl<'a, B: Bindings + ?Sized> Evaluator<'a, B> {
    pub fn new(source: &'a str, bindings: &'a B) -> Self {
        Self { source, bindings }
    }

    pub fn eval(&self, expr: &Expr) -> Result<f64, FormulaError> {
        match expr {
            Expr::Number(n) => Ok(*n),
            Expr::Var { name, col } => self
                .bindings
                .lookup(name)
                .or_else(|| constant(name))
                .ok_or_else(|| FormulaError::unbound(name, self.source, *col)),
            Expr::Neg(inner) => Ok(-self.eval(inner)?),
            Expr::Binary { op, lhs, rhs, col } => {
                let a = self.eval(lhs)?;
                let b = self.eval(rhs)?;
                self.binary(*op, a, b, *col)
            }
            Expr::Call { name, args, col } => {
                let values = args
                    .iter()
                    .map(|a| self.eval(a))
                    .collect::<Result<Vec<f64>, _>>()?;
                self.call(name, &values, *col)
            }
        }
    }

    fn binary(&self, op: BinOp, a: f64, b: f64, col: usize) -> Result<f64, FormulaError> {
        let value = match op {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => {
                if b == 0.0 {
                    return Err(FormulaError::domain("division by zero", self.source, col));
                }
                a / b
            }
            BinOp::Mod => {
                if b == 0.0 {
                    return Err(FormulaError::domain("modulo by zero", self.source, col));
                }
                floored_mod(a, b)
            }
            BinOp::Pow => {
                if a == 0.0 && b < 0.0 {
                    return Err(FormulaError::domain(
                        "zero raised to a negative power",
                        self.source,
                        col,
                    ));
                }
                a.powf(b)
            }
        };
        self.finite(value, col)
    }

    fn call(&self, name: &str, args: &[f64], col: usize) -> Result<f64, FormulaError> {
        let value = match (name, args) {
            ("sin", [a]) => a.sin(),
            ("cos", [a]) => a.cos(),
            ("tan", [a]) => a.tan(),
            ("asin", [a]) => a.asin(),
            ("acos", [a]) => a.acos(),
            ("atan", [a]) => a.atan(),
            ("atan2", [y, x]) => y.atan2(*x),
            ("sinh", [a]) => a.sinh(),
            ("cosh", [a]) => a.cosh(),
            ("tanh", [a]) => a.tanh(),
            ("sqrt", [a]) => a.sqrt(),
            ("abs", [a]) => a.abs(),
            ("floor", [a]) => a.floor(),
            ("ceil", [a]) => a.ceil(),
            ("round", [a]) => a.round(),
            ("trunc", [a]) => a.trunc(),
            ("exp", [a]) => a.exp(),
            ("ln", [a]) | ("log", [a]) => a.ln(),
            ("log", [a, base]) => a.log(*base),
            ("log10", [a]) => a.log10(),
            ("log2", [a]) => a.log2(),
            ("pow", [a, b]) => return self.binary(BinOp::Pow, *a, *b, col),
            ("hypot", [a, b]) => a.hypot(*b),
            ("sign", [a]) => {
                if *a == 0.0 {
                    0.0
                } else {
                    a.signum()
                }
            }
            ("clamp", [v, lo, hi]) => {
                if lo.is_nan() || hi.is_nan() || lo > hi {
                    return Err(FormulaError::domain(
                        "clamp lower bound exceeds upper bound",
                        self.source,
                        col,
                    ));
                }
                v.clamp(*lo, *hi)
            }
            ("min", [first, rest @ ..]) => rest.iter().fold(*first, |m, v| m.min(*v)),
            ("max", [first, rest @ ..]) => rest.iter().fold(*first, |m, v| m.max(*v)),
            _ if FUNCTIONS.contains(&name) => {
                return Err(FormulaError::unknown_function(
                    name,
                    format!("wrong number of arguments to '{name}': {}", args.len()),
                    self.source,
                    col,
                ));
            }
            _ => {
                return Err(FormulaError::unknown_function(
                    name,
                    format!("unknown function '{name}'"),
                    self.source,
                    col,
                ));
            }
        };
        self.finite(value, col)
    }

    fn finite(&self, value: f64, col: usize) -> Result<f64, FormulaError> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(FormulaError::domain(
                "result is not a real number",
                self.source,
                col,
            ))
        }
    }
}
