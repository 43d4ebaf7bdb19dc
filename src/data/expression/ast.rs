// Distributed under the OSI-approved BSD 2-Clause License.
// See accompanying file LICENSE for details.

use crate::data::expression::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprVar {
    Rank,
    Rand,
    /// A positional parameter; `$1` is index 1.
    Param(usize),
    Named(String),
}

impl ExprVar {
    pub fn from_name(name: &str) -> Self {
        match name {
            "rank" => ExprVar::Rank,
            "rand" => ExprVar::Rand,
            _ => {
                name.parse::<usize>()
                    .ok()
                    .filter(|&index| index > 0)
                    .map_or_else(|| ExprVar::Named(name.into()), ExprVar::Param)
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
}

impl UnaryOp {
    pub fn eval(self, v: Value) -> Value {
        match self {
            UnaryOp::Negate => -v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub fn eval(self, l: Value, r: Value) -> Value {
        match self {
            BinaryOp::Add => l + r,
            BinaryOp::Sub => l - r,
            BinaryOp::Mul => l * r,
            BinaryOp::Div => l / r,
            BinaryOp::Mod => l % r,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Float(Value),
    Var(ExprVar),
}

impl Expr {
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn unary(op: UnaryOp, expr: Expr) -> Self {
        Expr::Unary {
            op,
            expr: Box::new(expr),
        }
    }

    /// Fold a left-associative chain of operations.
    pub fn chain<I>(first: Expr, rest: I) -> Self
    where
        I: IntoIterator<Item = (BinaryOp, Expr)>,
    {
        rest.into_iter()
            .fold(first, |lhs, (op, rhs)| Expr::binary(op, lhs, rhs))
    }

    /// Evaluate operations on literals ahead of time.
    pub fn constant_fold(self) -> Self {
        match self {
            Expr::Unary {
                op,
                expr,
            } => {
                match expr.constant_fold() {
                    Expr::Float(f) => Expr::Float(op.eval(f)),
                    expr => Expr::unary(op, expr),
                }
            },
            Expr::Binary {
                op,
                lhs,
                rhs,
            } => {
                match (lhs.constant_fold(), rhs.constant_fold()) {
                    (Expr::Float(l), Expr::Float(r)) => Expr::Float(op.eval(l, r)),
                    (lhs, rhs) => Expr::binary(op, lhs, rhs),
                }
            },
            expr => expr,
        }
    }
}
