//! AST for parsed formulas.

/// A binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    /// Floored modulo: the result takes the sign of the divisor.
    Mod,
    Pow,
}

/// A parsed expression node. `col` fields point back into the formula text.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Var {
        name: String,
        col: usize,
    },
    Neg(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        col: usize,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        col: usize,
    },
}
