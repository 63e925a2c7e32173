//! Dual numbers for forward-mode automatic differentiation.
//!
//! A [`Dual`] pairs a value with the partial derivatives of that value
//! with respect to some shared set of independent variables, `z_0..z_n`.
//! Arithmetic follows the usual rules:
//!
//! - `(a + ∇a) + (b + ∇b) = (a+b) + (∇a+∇b)`
//! - `(a + ∇a) * (b + ∇b) = ab + (b∇a + a∇b)`
//! - `(a + ∇a) / (b + ∇b) = a/b + (b∇a - a∇b)/b²`
//!
//! The derivative vector may be empty, meaning "no sensitivity was
//! recorded". An empty vector behaves exactly like a vector of zeros of
//! whatever length the other operand has.
//!
//! # Example
//!
//! ```
//! use linear_solve::Dual;
//!
//! // f(x, y) = x*y + x at (3, 4)
//! let x = Dual::variable(3.0, 0, 2);
//! let y = Dual::variable(4.0, 1, 2);
//!
//! let f = &x * &y + x;
//!
//! assert_eq!(f.value(), 15.0);
//! assert_eq!(f.derivatives().as_slice(), &[5.0, 3.0]);
//! ```

use crate::{
    error::{Extent, Operand, Result, SolveError},
    gradients,
};
use approx::{AbsDiffEq, RelativeEq};
use nalgebra::{DMatrix, DVector};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A value and its partial derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct Dual {
    value: f64,
    derivatives: DVector<f64>,
}

impl Dual {
    pub fn new(value: f64, derivatives: DVector<f64>) -> Self {
        Dual { value, derivatives }
    }

    /// Create a [`Dual`] from a value and a slice of derivatives.
    pub fn from_slice(value: f64, derivatives: &[f64]) -> Self {
        Dual::new(value, DVector::from_column_slice(derivatives))
    }

    /// A value with no recorded derivatives.
    pub fn constant(value: f64) -> Self {
        Dual::new(value, DVector::zeros(0))
    }

    /// The `index`'th of `count` independent variables.
    ///
    /// # Panics
    ///
    /// Panics if `index >= count`.
    pub fn variable(value: f64, index: usize, count: usize) -> Self {
        assert!(
            index < count,
            "Variable index {} out of bounds for {} variables",
            index,
            count
        );

        let mut derivatives = DVector::zeros(count);
        derivatives[index] = 1.0;
        Dual::new(value, derivatives)
    }

    pub fn value(&self) -> f64 { self.value }

    pub fn derivatives(&self) -> &DVector<f64> { &self.derivatives }

    /// How many derivatives are stored (possibly zero).
    pub fn num_derivatives(&self) -> usize { self.derivatives.len() }

    /// The partial derivative with respect to the `k`'th variable, treating
    /// an empty derivative vector as all zeros.
    pub fn derivative(&self, k: usize) -> f64 {
        if self.derivatives.is_empty() {
            0.0
        } else {
            self.derivatives[k]
        }
    }

    pub fn into_parts(self) -> (f64, DVector<f64>) {
        (self.value, self.derivatives)
    }

    /// Combine the derivatives of two operands, `left_scale * ∇left +
    /// right_scale * ∇right`.
    ///
    /// # Panics
    ///
    /// Panics if both operands have derivatives but the vectors have
    /// different lengths. Use [`crate::solve()`] on whole matrices to get
    /// this reported as an error instead.
    fn combine(
        left: &Dual,
        left_scale: f64,
        right: &Dual,
        right_scale: f64,
    ) -> DVector<f64> {
        match (left.derivatives.is_empty(), right.derivatives.is_empty()) {
            (true, true) => DVector::zeros(0),
            (false, true) => &left.derivatives * left_scale,
            (true, false) => &right.derivatives * right_scale,
            (false, false) => {
                assert_eq!(
                    left.derivatives.len(),
                    right.derivatives.len(),
                    "Both operands must be differentiated with respect to the same variables"
                );
                &left.derivatives * left_scale
                    + &right.derivatives * right_scale
            },
        }
    }
}

impl From<f64> for Dual {
    fn from(value: f64) -> Self { Dual::constant(value) }
}

impl<'a> Add for &'a Dual {
    type Output = Dual;

    fn add(self, rhs: &'a Dual) -> Dual {
        Dual::new(self.value + rhs.value, Dual::combine(self, 1.0, rhs, 1.0))
    }
}

impl<'a> Sub for &'a Dual {
    type Output = Dual;

    fn sub(self, rhs: &'a Dual) -> Dual {
        Dual::new(self.value - rhs.value, Dual::combine(self, 1.0, rhs, -1.0))
    }
}

impl<'a> Mul for &'a Dual {
    type Output = Dual;

    fn mul(self, rhs: &'a Dual) -> Dual {
        // product rule
        Dual::new(
            self.value * rhs.value,
            Dual::combine(self, rhs.value, rhs, self.value),
        )
    }
}

impl<'a> Div for &'a Dual {
    type Output = Dual;

    fn div(self, rhs: &'a Dual) -> Dual {
        // quotient rule
        let denominator = rhs.value * rhs.value;
        Dual::new(
            self.value / rhs.value,
            Dual::combine(
                self,
                rhs.value / denominator,
                rhs,
                -self.value / denominator,
            ),
        )
    }
}

macro_rules! forward_owned_binop {
    ($($trait:ident :: $method:ident),* $(,)?) => {
        $(
            impl $trait for Dual {
                type Output = Dual;

                fn $method(self, rhs: Dual) -> Dual { (&self).$method(&rhs) }
            }
        )*
    };
}

forward_owned_binop!(Add::add, Sub::sub, Mul::mul, Div::div);

impl Neg for Dual {
    type Output = Dual;

    fn neg(self) -> Dual { Dual::new(-self.value, -self.derivatives) }
}

impl AbsDiffEq for Dual {
    type Epsilon = f64;

    fn default_epsilon() -> f64 { f64::default_epsilon() }

    fn abs_diff_eq(&self, other: &Dual, epsilon: f64) -> bool {
        self.value.abs_diff_eq(&other.value, epsilon)
            && derivatives_match(self, other, |l, r| {
                l.abs_diff_eq(&r, epsilon)
            })
    }
}

impl RelativeEq for Dual {
    fn default_max_relative() -> f64 { f64::default_max_relative() }

    fn relative_eq(
        &self,
        other: &Dual,
        epsilon: f64,
        max_relative: f64,
    ) -> bool {
        self.value.relative_eq(&other.value, epsilon, max_relative)
            && derivatives_match(self, other, |l, r| {
                l.relative_eq(&r, epsilon, max_relative)
            })
    }
}

fn derivatives_match<F>(left: &Dual, right: &Dual, mut eq: F) -> bool
where
    F: FnMut(f64, f64) -> bool,
{
    let len = left.num_derivatives().max(right.num_derivatives());
    let lengths_compatible = left.derivatives.is_empty()
        || right.derivatives.is_empty()
        || left.num_derivatives() == right.num_derivatives();

    lengths_compatible
        && (0..len).all(|k| eq(left.derivative(k), right.derivative(k)))
}

/// Project a dual matrix onto its values.
pub fn values(matrix: &DMatrix<Dual>) -> DMatrix<f64> {
    DMatrix::from_fn(matrix.nrows(), matrix.ncols(), |row, column| {
        matrix[(row, column)].value
    })
}

/// The entrywise partial derivative of a dual matrix with respect to the
/// `k`'th variable, `∂M/∂z_k`. Entries without derivatives contribute 0.
pub fn derivatives(matrix: &DMatrix<Dual>, k: usize) -> DMatrix<f64> {
    DMatrix::from_fn(matrix.nrows(), matrix.ncols(), |row, column| {
        matrix[(row, column)].derivative(k)
    })
}

/// Get the gradient matrix of a dual matrix.
///
/// Entries are taken in column-major order, so row `i` of the result holds
/// the derivatives of the `i`'th entry and the result has one column per
/// variable. Entries with no derivatives give a row of zeros, and a
/// [`SolveError::GradientSizeMismatch`] names `operand`.
pub fn gradient_matrix(
    matrix: &DMatrix<Dual>,
    operand: Operand,
) -> Result<DMatrix<f64>> {
    let variables = gradients::derivative_count(matrix, operand)?;

    Ok(DMatrix::from_fn(matrix.len(), variables, |entry, k| {
        matrix[entry].derivative(k)
    }))
}

/// Create a dual matrix from its values and a gradient matrix laid out as
/// in [`gradient_matrix()`].
pub fn with_gradient(
    values: &DMatrix<f64>,
    gradient: &DMatrix<f64>,
) -> Result<DMatrix<Dual>> {
    if gradient.nrows() != values.len() {
        return Err(SolveError::DimensionMismatch {
            expected: Extent::new(values.len(), gradient.ncols()),
            found: Extent::new(gradient.nrows(), gradient.ncols()),
        });
    }

    let rows = values.nrows();

    Ok(DMatrix::from_fn(rows, values.ncols(), |row, column| {
        let entry = column * rows + row;
        Dual::new(
            values[(row, column)],
            gradient.row(entry).transpose(),
        )
    }))
}

/// Promote a real matrix to a dual one with no recorded derivatives.
pub fn constant_matrix(matrix: &DMatrix<f64>) -> DMatrix<Dual> {
    DMatrix::from_fn(matrix.nrows(), matrix.ncols(), |row, column| {
        Dual::constant(matrix[(row, column)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn arithmetic_follows_the_chain_rule() {
        let x = Dual::from_slice(3.0, &[1.0, 0.0]);
        let y = Dual::from_slice(4.0, &[0.0, 1.0]);

        let product = &x * &y;
        let quotient = &x / &y;
        let difference = &x - &y;

        assert_eq!(product, Dual::from_slice(12.0, &[4.0, 3.0]));
        assert_relative_eq!(
            quotient,
            Dual::from_slice(0.75, &[0.25, -3.0 / 16.0])
        );
        assert_eq!(difference, Dual::from_slice(-1.0, &[1.0, -1.0]));
        assert_eq!(-x, Dual::from_slice(-3.0, &[-1.0, -0.0]));
    }

    #[test]
    fn empty_derivatives_act_like_zeros() {
        let x = Dual::from_slice(2.0, &[1.0, 2.0, 3.0]);
        let c = Dual::constant(5.0);

        assert_eq!(&x * &c, Dual::from_slice(10.0, &[5.0, 10.0, 15.0]));
        assert_eq!(&c + &x, Dual::from_slice(7.0, &[1.0, 2.0, 3.0]));
        assert_eq!(&c * &c, Dual::constant(25.0));
        assert_eq!(c.derivative(2), 0.0);
    }

    #[test]
    fn empty_and_zero_derivatives_are_approximately_equal() {
        let zeros = Dual::from_slice(1.0, &[0.0, 0.0]);
        let empty = Dual::constant(1.0);

        assert_relative_eq!(zeros, empty);
        assert!(!Dual::from_slice(1.0, &[0.0]).relative_eq(
            &zeros,
            1e-12,
            1e-12
        ));
    }

    #[test]
    #[should_panic(expected = "same variables")]
    fn mismatched_derivatives_are_a_bug() {
        let _ = Dual::from_slice(1.0, &[1.0, 2.0]) + Dual::from_slice(1.0, &[1.0]);
    }

    #[test]
    fn variables_are_unit_vectors() {
        let y = Dual::variable(4.0, 1, 3);

        assert_eq!(y.value(), 4.0);
        assert_eq!(y.derivatives().as_slice(), &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn gradient_matrix_round_trips_through_with_gradient() {
        let values = DMatrix::from_row_slice(2, 1, &[3.0, 5.0]);
        let gradient =
            DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let duals = with_gradient(&values, &gradient).unwrap();

        assert_eq!(duals[(1, 0)], Dual::from_slice(5.0, &[4.0, 5.0, 6.0]));
        assert_eq!(super::values(&duals), values);
        assert_eq!(gradient_matrix(&duals, Operand::B).unwrap(), gradient);
    }

    #[test]
    fn gradient_matrix_reports_the_operand_it_was_given() {
        let duals = DMatrix::from_row_slice(2, 1, &[
            Dual::from_slice(1.0, &[1.0]),
            Dual::from_slice(2.0, &[1.0, 0.0]),
        ]);

        let got = gradient_matrix(&duals, Operand::B).unwrap_err();

        assert_eq!(
            got,
            SolveError::GradientSizeMismatch {
                matrix: Operand::B,
                first: 2,
                second: 1,
            }
        );
    }

    #[test]
    fn gradient_must_have_a_row_per_entry() {
        let values = DMatrix::from_row_slice(2, 1, &[3.0, 5.0]);
        let gradient = DMatrix::zeros(3, 2);

        let got = with_gradient(&values, &gradient).unwrap_err();

        assert_eq!(
            got,
            SolveError::DimensionMismatch {
                expected: Extent::new(2, 2),
                found: Extent::new(3, 2),
            }
        );
    }

    #[test]
    fn partial_derivatives_fill_in_zeros() {
        let matrix = DMatrix::from_row_slice(
            1,
            2,
            &[Dual::from_slice(1.0, &[7.0, 8.0]), Dual::constant(2.0)],
        );

        assert_eq!(derivatives(&matrix, 1), DMatrix::from_row_slice(1, 2, &[8.0, 0.0]));
        assert_eq!(values(&matrix), DMatrix::from_row_slice(1, 2, &[1.0, 2.0]));
    }
}
