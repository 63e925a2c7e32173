use crate::{decompose::Algorithm, matrix::ScalarKind};
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

/// A specialised [`Result`] type for solving linear systems.
pub type Result<T, E = SolveError> = std::result::Result<T, E>;

/// The ways solving `A.x = b` can fail.
///
/// Every error is fatal to the call that produced it. Kind resolution and
/// gradient checks run before any factorization, so the cheap failures are
/// reported first.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    /// The decomposition couldn't factorize `A` (or its values), e.g. a
    /// Cholesky factorization of a matrix which isn't positive definite.
    #[error("The matrix is singular or not suitable for the {algorithm} decomposition")]
    SingularMatrix { algorithm: Algorithm },
    /// Two entries of the same matrix carry different numbers of
    /// derivatives.
    #[error("An entry of {matrix} has {first} derivatives, while another entry has {second}")]
    GradientSizeMismatch {
        matrix: Operand,
        first: usize,
        second: usize,
    },
    /// `A` and `b` were differentiated with respect to a different number
    /// of variables.
    #[error("A contains derivatives for {a} variables, while b contains derivatives for {b} variables")]
    VariableCountMismatch { a: usize, b: usize },
    /// There is no common output kind for `A` and `b`.
    #[error("Unable to solve a system where A is {a} and b is {b}")]
    UnsupportedCombination { a: ScalarKind, b: ScalarKind },
    /// The algorithm can't be used with this kind of scalar.
    #[error("The {algorithm} decomposition doesn't support {kind} matrices")]
    UnsupportedAlgorithm {
        algorithm: Algorithm,
        kind: ScalarKind,
    },
    /// The matrices don't have compatible extents.
    #[error("Expected {expected}, but found {found}")]
    DimensionMismatch { expected: Extent, found: Extent },
}

/// Which side of `A.x = b` an error refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operand {
    A,
    B,
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Operand::A => write!(f, "A"),
            Operand::B => write!(f, "b"),
        }
    }
}

/// The number of rows and columns in a matrix.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Extent {
    pub rows: usize,
    pub columns: usize,
}

impl Extent {
    pub fn new(rows: usize, columns: usize) -> Self { Extent { rows, columns } }
}

impl Display for Extent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "a {}x{} matrix", self.rows, self.columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_conflicting_sizes() {
        let inputs = vec![
            (
                SolveError::GradientSizeMismatch {
                    matrix: Operand::A,
                    first: 2,
                    second: 3,
                },
                "An entry of A has 2 derivatives, while another entry has 3",
            ),
            (
                SolveError::VariableCountMismatch { a: 3, b: 4 },
                "A contains derivatives for 3 variables, while b contains derivatives for 4 variables",
            ),
            (
                SolveError::SingularMatrix {
                    algorithm: Algorithm::Cholesky,
                },
                "The matrix is singular or not suitable for the Cholesky decomposition",
            ),
            (
                SolveError::DimensionMismatch {
                    expected: Extent::new(2, 2),
                    found: Extent::new(3, 2),
                },
                "Expected a 2x2 matrix, but found a 3x2 matrix",
            ),
        ];

        for (error, should_be) in inputs {
            assert_eq!(error.to_string(), should_be);
        }
    }
}
