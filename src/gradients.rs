//! Checks that the derivatives recorded in `A` and `b` line up before any
//! derivative is propagated.

use crate::{
    dual::Dual,
    error::{Operand, Result, SolveError},
};
use nalgebra::DMatrix;

/// The number of variables `A` and `b` were each differentiated with
/// respect to (0 when a side has no derivatives at all).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Variables {
    pub a: usize,
    pub b: usize,
}

impl Variables {
    /// The number of derivatives each entry of `x` will have.
    pub fn count(self) -> usize { self.a.max(self.b) }
}

/// Find the common derivative-vector length shared by every entry which
/// has derivatives, or 0 if none of them do.
pub fn derivative_count(
    matrix: &DMatrix<Dual>,
    operand: Operand,
) -> Result<usize> {
    let mut count = None;

    for entry in matrix.iter() {
        let size = entry.num_derivatives();

        if size == 0 {
            continue;
        }

        match count {
            None => count = Some(size),
            Some(previous) if previous != size => {
                return Err(SolveError::GradientSizeMismatch {
                    matrix: operand,
                    first: size,
                    second: previous,
                });
            },
            Some(_) => {},
        }
    }

    Ok(count.unwrap_or(0))
}

/// Make sure the derivatives in `A` and `b` are consistent with each
/// other.
///
/// Entries with empty derivative vectors are ignored; every other entry
/// within a matrix must have the same number of derivatives, and when both
/// `A` and `b` have derivatives they must agree on the variable count.
pub fn check(a: &DMatrix<Dual>, b: &DMatrix<Dual>) -> Result<Variables> {
    let variables = Variables {
        a: derivative_count(a, Operand::A)?,
        b: derivative_count(b, Operand::B)?,
    };

    if variables.a != 0 && variables.b != 0 && variables.a != variables.b {
        return Err(SolveError::VariableCountMismatch {
            a: variables.a,
            b: variables.b,
        });
    }

    log::debug!(
        "A has derivatives for {} variables and b has {}",
        variables.a,
        variables.b
    );

    Ok(variables)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duals(rows: usize, columns: usize, sizes: &[usize]) -> DMatrix<Dual> {
        let entries: Vec<_> = sizes
            .iter()
            .map(|&size| Dual::from_slice(1.0, &vec![1.0; size]))
            .collect();
        DMatrix::from_row_slice(rows, columns, &entries)
    }

    #[test]
    fn consistent_sizes() {
        let a = duals(2, 2, &[3, 3, 0, 3]);
        let b = duals(2, 1, &[3, 3]);

        let got = check(&a, &b).unwrap();

        assert_eq!(got, Variables { a: 3, b: 3 });
        assert_eq!(got.count(), 3);
    }

    #[test]
    fn one_side_without_derivatives() {
        let a = duals(2, 2, &[0, 0, 0, 0]);
        let b = duals(2, 1, &[4, 0]);

        let got = check(&a, &b).unwrap();

        assert_eq!(got, Variables { a: 0, b: 4 });
        assert_eq!(got.count(), 4);
    }

    #[test]
    fn nothing_to_differentiate() {
        let a = duals(1, 1, &[0]);
        let b = duals(1, 1, &[0]);

        assert_eq!(check(&a, &b).unwrap().count(), 0);
    }

    #[test]
    fn inconsistent_sizes_within_a() {
        // column-major order means (1, 0) is visited before (0, 1)
        let a = duals(2, 2, &[3, 2, 3, 3]);
        let b = duals(2, 1, &[3, 3]);

        let got = check(&a, &b).unwrap_err();

        assert_eq!(
            got,
            SolveError::GradientSizeMismatch {
                matrix: Operand::A,
                first: 2,
                second: 3,
            }
        );
    }

    #[test]
    fn inconsistent_sizes_within_b() {
        let a = duals(2, 2, &[3, 3, 3, 3]);
        let b = duals(2, 1, &[3, 2]);

        let got = check(&a, &b).unwrap_err();

        assert_eq!(
            got,
            SolveError::GradientSizeMismatch {
                matrix: Operand::B,
                first: 2,
                second: 3,
            }
        );
    }

    #[test]
    fn a_and_b_disagree_on_variable_count() {
        let a = duals(2, 2, &[3, 3, 3, 3]);
        let b = duals(2, 1, &[4, 4]);

        let got = check(&a, &b).unwrap_err();

        assert_eq!(got, SolveError::VariableCountMismatch { a: 3, b: 4 });
    }
}
