// Distributed under the OSI-approved BSD 2-Clause License.
// See accompanying LICENSE file for details.

use thiserror::Error;

mod ast;
mod grammar;

use self::ast::{Expr, ExprVar};

/// An error when evaluating an expression.
#[derive(Debug, Error)]
pub enum ExpressionError {
    /// Failed to parse an expression.
    #[error("failed to parse expression")]
    ParseFailure {
        /// The parser error.
        #[from]
        source: peg::error::ParseError<peg::str::LineCol>,
    },
    /// Reference to an undefined variable.
    #[error("undefined variable `{}`", name)]
    UndefinedVariable {
        /// The name of the variable.
        name: String,
    },
    /// Reference to a parameter which was not passed.
    #[error("unbound parameter `${}`", index)]
    MissingParameter {
        /// The index of the parameter.
        index: usize,
    },
}

impl ExpressionError {
    fn undefined_variable<N>(name: N) -> Self
    where
        N: Into<String>,
    {
        Self::UndefinedVariable {
            name: name.into(),
        }
    }
}

/// The value of an expression.
pub type Value = f32;

/// The context in which to execute an expression.
///
/// This provides values for variables referenced in expressions.
pub trait ExpressionContext {
    /// Get the value of a positional parameter (`$1` is index 1).
    fn param(&self, index: usize) -> Option<Value>;
    /// Get a random value in `[0, 1)`.
    fn rand(&mut self) -> Value;
    /// Get the difficulty of the entity using the expression.
    fn rank(&self) -> Value;
}

/// An expression which may be evaluated to compute a value.
#[derive(Debug, Clone)]
pub struct Expression {
    expr: Expr,
}

impl Expression {
    /// Parse an expression from a string.
    ///
    /// Blank text is the constant `0`.
    pub fn parse<E>(expr: E) -> Result<Self, ExpressionError>
    where
        E: AsRef<str>,
    {
        let expr = expr.as_ref();
        if expr.trim().is_empty() {
            return Ok(Expression {
                expr: Expr::Float(0.),
            });
        }

        Ok(grammar::expression(expr).map(|expr| {
            Expression {
                expr: expr.constant_fold(),
            }
        })?)
    }

    /// Parse and evaluate an expression in one go.
    pub fn evaluate<E>(expr: E, ctx: &mut dyn ExpressionContext) -> Result<Value, ExpressionError>
    where
        E: AsRef<str>,
    {
        Self::parse(expr)?.eval(ctx)
    }

    /// The value of the expression if it does not depend on its context.
    pub fn constant(&self) -> Option<Value> {
        if let Expr::Float(f) = self.expr {
            Some(f)
        } else {
            None
        }
    }

    /// Evaluate the expression with a given context.
    pub fn eval(&self, ctx: &mut dyn ExpressionContext) -> Result<Value, ExpressionError> {
        Self::eval_expr(&self.expr, ctx)
    }

    fn eval_expr(expr: &Expr, ctx: &mut dyn ExpressionContext) -> Result<Value, ExpressionError> {
        match *expr {
            Expr::Unary {
                op: o,
                expr: ref e,
            } => Self::eval_expr(e.as_ref(), ctx).map(|r| o.eval(r)),
            Expr::Binary {
                op: o,
                lhs: ref l,
                rhs: ref r,
            } => {
                let lr = Self::eval_expr(l.as_ref(), ctx)?;
                Self::eval_expr(r.as_ref(), ctx).map(|rr| o.eval(lr, rr))
            },
            Expr::Float(f) => Ok(f),
            Expr::Var(ref v) => {
                match *v {
                    ExprVar::Rank => Ok(ctx.rank()),
                    ExprVar::Rand => Ok(ctx.rand()),
                    ExprVar::Param(index) => {
                        ctx.param(index)
                            .ok_or(ExpressionError::MissingParameter {
                                index,
                            })
                    },
                    ExprVar::Named(ref n) => Err(ExpressionError::undefined_variable(n.as_str())),
                }
            },
        }
    }
}
