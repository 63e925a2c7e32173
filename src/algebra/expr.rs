use crate::algebra::{ops, Rational};
use smol_str::SmolStr;
use std::{
    fmt::{self, Display, Formatter},
    ops::{Add, Div, Mul, Neg, Sub},
};

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A named unknown.
    Parameter(Parameter),
    Constant(f64),
    /// An expression involving two operands.
    Binary {
        left: Box<Expression>,
        right: Box<Expression>,
        op: BinaryOperation,
    },
    /// Negate the expression.
    Negate(Box<Expression>),
}

impl Expression {
    pub fn zero() -> Self { Expression::Constant(0.0) }

    pub fn one() -> Self { Expression::Constant(1.0) }

    /// Create an [`Expression`] referring to a named [`Parameter`].
    pub fn parameter<S: Into<SmolStr>>(name: S) -> Self {
        Expression::Parameter(Parameter::named(name))
    }

    pub fn is_constant(&self) -> bool {
        match self {
            Expression::Constant(_) => true,
            _ => false,
        }
    }

    /// Get the value of this expression, if it is a plain constant.
    pub fn as_constant(&self) -> Option<f64> {
        match self {
            Expression::Constant(value) => Some(*value),
            _ => None,
        }
    }

    /// Expand the expression into the canonical [`Rational`] form.
    ///
    /// Two expressions denote the same value exactly when their expansions
    /// compare equal, regardless of how their trees were built.
    pub fn expand(&self) -> Rational { ops::expand(self) }

    /// Check whether two expressions are algebraically equal.
    pub fn is_equivalent(&self, other: &Expression) -> bool {
        self.expand() == other.expand()
    }

    fn is_compound(&self) -> bool {
        match self {
            Expression::Parameter(_)
            | Expression::Constant(_)
            | Expression::Negate(_) => false,
            Expression::Binary { .. } => true,
        }
    }
}

impl Default for Expression {
    fn default() -> Self { Expression::zero() }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self { Expression::Constant(value) }
}

impl From<Parameter> for Expression {
    fn from(param: Parameter) -> Self { Expression::Parameter(param) }
}

/// A named unknown which may appear in an [`Expression`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Parameter {
    name: SmolStr,
}

impl Parameter {
    pub fn named<S: Into<SmolStr>>(name: S) -> Self {
        Parameter { name: name.into() }
    }

    pub fn name(&self) -> &str { &self.name }
}

impl Display for Parameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// An operation that can be applied to two arguments.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum BinaryOperation {
    Plus,
    Minus,
    Times,
    Divide,
}

// define some operator overloads to make constructing an expression easier.

impl Add for Expression {
    type Output = Expression;

    fn add(self, rhs: Expression) -> Expression {
        Expression::Binary {
            left: Box::new(self),
            right: Box::new(rhs),
            op: BinaryOperation::Plus,
        }
    }
}

impl Sub for Expression {
    type Output = Expression;

    fn sub(self, rhs: Expression) -> Expression {
        Expression::Binary {
            left: Box::new(self),
            right: Box::new(rhs),
            op: BinaryOperation::Minus,
        }
    }
}

impl Mul for Expression {
    type Output = Expression;

    fn mul(self, rhs: Expression) -> Expression {
        Expression::Binary {
            left: Box::new(self),
            right: Box::new(rhs),
            op: BinaryOperation::Times,
        }
    }
}

impl Div for Expression {
    type Output = Expression;

    fn div(self, rhs: Expression) -> Expression {
        Expression::Binary {
            left: Box::new(self),
            right: Box::new(rhs),
            op: BinaryOperation::Divide,
        }
    }
}

impl Neg for Expression {
    type Output = Expression;

    fn neg(self) -> Self::Output { Expression::Negate(Box::new(self)) }
}

impl BinaryOperation {
    fn precedence(self) -> u8 {
        match self {
            BinaryOperation::Plus | BinaryOperation::Minus => 1,
            BinaryOperation::Times | BinaryOperation::Divide => 2,
        }
    }

    /// Is `a op (b op c)` different from `(a op b) op c`?
    fn is_left_associative_only(self) -> bool {
        match self {
            BinaryOperation::Minus | BinaryOperation::Divide => true,
            BinaryOperation::Plus | BinaryOperation::Times => false,
        }
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Parameter(p) => write!(f, "{}", p),
            Expression::Constant(value) => write!(f, "{}", value),
            Expression::Binary { left, right, op } => {
                write_operand(left, *op, false, f)?;

                let symbol = match op {
                    BinaryOperation::Plus => " + ",
                    BinaryOperation::Minus => " - ",
                    BinaryOperation::Times => "*",
                    BinaryOperation::Divide => "/",
                };
                write!(f, "{}", symbol)?;

                write_operand(right, *op, true, f)
            },
            Expression::Negate(inner) => {
                if inner.is_compound() {
                    write!(f, "-({})", inner)
                } else {
                    write!(f, "-{}", inner)
                }
            },
        }
    }
}

fn write_operand(
    operand: &Expression,
    parent: BinaryOperation,
    is_right: bool,
    f: &mut Formatter<'_>,
) -> fmt::Result {
    let needs_parens = match operand {
        Expression::Binary { op, .. } => {
            op.precedence() < parent.precedence()
                || (is_right
                    && op.precedence() == parent.precedence()
                    && parent.is_left_associative_only())
        },
        _ => false,
    };

    if needs_parens {
        write!(f, "({})", operand)
    } else {
        write!(f, "{}", operand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let inputs = vec![
            (Expression::Constant(3.0), "3"),
            (Expression::parameter("u"), "u"),
            (
                Expression::Negate(Box::new(Expression::Constant(5.0))),
                "-5",
            ),
            (
                Expression::Negate(Box::new(Expression::parameter("x"))),
                "-x",
            ),
            (Expression::Constant(1.0) + Expression::Constant(1.0), "1 + 1"),
            (Expression::Constant(1.0) - Expression::Constant(1.0), "1 - 1"),
            (Expression::Constant(1.0) * Expression::Constant(1.0), "1*1"),
            (Expression::Constant(1.0) / Expression::Constant(1.0), "1/1"),
            (
                (Expression::Constant(1.0) + Expression::Constant(2.0))
                    / Expression::Constant(3.0),
                "(1 + 2)/3",
            ),
            (
                Expression::parameter("u")
                    - (Expression::parameter("v") + Expression::parameter("w")),
                "u - (v + w)",
            ),
            (
                Expression::parameter("u") * Expression::parameter("v")
                    + Expression::parameter("w"),
                "u*v + w",
            ),
            (
                -(Expression::parameter("u") + Expression::parameter("v")),
                "-(u + v)",
            ),
        ];

        for (expr, should_be) in inputs {
            let got = expr.to_string();
            assert_eq!(got, should_be);
        }
    }

    #[test]
    fn differently_shaped_trees_can_be_equivalent() {
        let left: Expression = "(u + v)*(u - v)".parse().unwrap();
        let right: Expression = "u*u - v*v".parse().unwrap();

        assert_ne!(left, right);
        assert!(left.is_equivalent(&right));
        assert!(!left.is_equivalent(&"u*u + v*v".parse().unwrap()));
    }
}
