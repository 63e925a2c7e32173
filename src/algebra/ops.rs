//! [`Expression`] operations.

use crate::algebra::{BinaryOperation, Expression, Polynomial, Rational};

/// Simplify an expression by evaluating all constant operations.
///
/// Identities like `x + 0` and `1 * x` are removed. Constant `+`, `-` and
/// `*` are evaluated with ordinary `f64` arithmetic, while a constant
/// quotient is only evaluated when it is exact (`6/3` but not `1/3`).
pub fn fold_constants(expr: &Expression) -> Expression {
    match expr {
        Expression::Binary { left, right, op } => {
            fold_binary_op(left, right, *op)
        },
        Expression::Negate(expr) => match fold_constants(expr) {
            Expression::Constant(value) => Expression::Constant(-value),
            // double negative
            Expression::Negate(inner) => *inner,
            other => Expression::Negate(Box::new(other)),
        },
        _ => expr.clone(),
    }
}

fn fold_binary_op(
    left: &Expression,
    right: &Expression,
    op: BinaryOperation,
) -> Expression {
    let left = fold_constants(left);
    let right = fold_constants(right);

    // If our operands contain constants, we can use arithmetic's identity laws
    // to simplify things
    match (left, right, op) {
        (
            Expression::Parameter(p_left),
            Expression::Parameter(p_right),
            BinaryOperation::Minus,
        ) if p_left == p_right => Expression::zero(),

        // x + 0 = x
        (Expression::Constant(l), right, BinaryOperation::Plus) if l == 0.0 => {
            right
        },
        (left, Expression::Constant(r), BinaryOperation::Plus) if r == 0.0 => {
            left
        },

        // 0 * x = 0
        (Expression::Constant(l), _, BinaryOperation::Times) if l == 0.0 => {
            Expression::zero()
        },
        (_, Expression::Constant(r), BinaryOperation::Times) if r == 0.0 => {
            Expression::zero()
        },

        // 1 * x = x
        (Expression::Constant(l), right, BinaryOperation::Times) if l == 1.0 => {
            right
        },
        (left, Expression::Constant(r), BinaryOperation::Times) if r == 1.0 => {
            left
        },

        // x / 1 = x
        (left, Expression::Constant(r), BinaryOperation::Divide)
            if r == 1.0 =>
        {
            left
        },

        // 0 - x = -x
        (Expression::Constant(l), right, BinaryOperation::Minus)
            if l == 0.0 =>
        {
            -right
        },

        // x - 0 = x
        (left, Expression::Constant(r), BinaryOperation::Minus)
            if r == 0.0 =>
        {
            left
        },

        // Evaluate in-place, leaving inexact quotients for later expansion
        (Expression::Constant(l), Expression::Constant(r), op)
            if op != BinaryOperation::Divide || is_exact_quotient(l, r) =>
        {
            Expression::Constant(apply(op, l, r))
        },

        // Oh well, we tried
        (left, right, op) => Expression::Binary {
            left: Box::new(left),
            right: Box::new(right),
            op,
        },
    }
}

fn apply(op: BinaryOperation, l: f64, r: f64) -> f64 {
    match op {
        BinaryOperation::Plus => l + r,
        BinaryOperation::Minus => l - r,
        BinaryOperation::Times => l * r,
        BinaryOperation::Divide => l / r,
    }
}

fn is_exact_quotient(l: f64, r: f64) -> bool {
    // the fused multiply-add leaves no remainder only if q*r == l exactly
    r != 0.0 && (l / r).mul_add(r, -l) == 0.0
}

/// Expand an [`Expression`] into its canonical [`Rational`] form.
pub fn expand(expr: &Expression) -> Rational {
    match expr {
        Expression::Parameter(p) => {
            Rational::from(Polynomial::parameter(p.clone()))
        },
        Expression::Constant(value) => {
            Rational::from(Polynomial::constant(*value))
        },
        Expression::Binary { left, right, op } => {
            let left = expand(left);
            let right = expand(right);

            match op {
                BinaryOperation::Plus => left + right,
                BinaryOperation::Minus => left - right,
                BinaryOperation::Times => left * right,
                BinaryOperation::Divide => left / right,
            }
        },
        Expression::Negate(inner) => -expand(inner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_fold_simple_arithmetic() {
        let inputs = vec![
            ("1", 1.0),
            ("1 + 1.5", 1.0 + 1.5),
            ("1 - 1.5", 1.0 - 1.5),
            ("2 * 3", 2.0 * 3.0),
            ("4 / 2", 4.0 / 2.0),
            ("-(1 + 2)", -(1.0 + 2.0)),
            ("0 * x", 0.0),
            ("x - x", 0.0),
            ("(10 - 3*3)/1", 1.0),
        ];

        for (src, should_be) in inputs {
            let expr: Expression = src.parse().unwrap();
            let got = fold_constants(&expr);

            match got {
                Expression::Constant(value) => assert_eq!(
                    value, should_be,
                    "{} -> {} != {}",
                    expr, value, should_be
                ),
                other => panic!(
                    "Expected a constant expression, but got \"{}\"",
                    other
                ),
            }
        }
    }

    #[test]
    fn constant_folding_leaves_unknowns_unevaluated() {
        let inputs = vec![
            ("x", "x"),
            ("-(2 * 3 + x)", "-(6 + x)"),
            ("x + 5", "x + 5"),
            ("x + 5*2", "x + 10"),
            ("0 + x", "x"),
            ("x + 0", "x"),
            ("1 * x", "x"),
            ("x * 1", "x"),
            ("x - 0", "x"),
            ("0 - x", "-x"),
            ("x / 1", "x"),
            ("--x", "x"),
            ("1/3", "1/3"),
        ];

        for (src, should_be) in inputs {
            let expr: Expression = src.parse().unwrap();

            let got = fold_constants(&expr);

            let should_be: Expression = should_be.parse().unwrap();

            assert_eq!(got, should_be, "{} != {}", got, should_be);
        }
    }

    #[test]
    fn expansion_is_insensitive_to_tree_shape() {
        let inputs = vec![
            ("(u + 1)*(u - 1)", "u*u - 1"),
            ("u*(v + w)", "w*u + v*u"),
            ("(u/v)*v", "u"),
            ("1/(1/u)", "u"),
            ("u/2 + u/2", "u"),
            ("-(u - v)", "v - u"),
            ("(10*u - 3*v)/1", "-3*v + 10*u"),
        ];

        for (src, should_be) in inputs {
            let got = expand(&src.parse().unwrap());
            let should_be = expand(&should_be.parse().unwrap());

            assert_eq!(got, should_be, "{} != {}", src, should_be);
        }
    }
}
