use crate::{
    algebra::Expression,
    dual::{self, Dual},
    error::{Extent, Result, SolveError},
};
use nalgebra::{DMatrix, DVector, Scalar};
use std::{
    borrow::Cow,
    fmt::{self, Display, Formatter},
};

/// The kind of scalar stored in a [`Matrix`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Real,
    Dual,
    Symbolic,
}

impl ScalarKind {
    /// Work out which kind of matrix solving `A.x = b` produces when `A`
    /// and `b` have the given kinds.
    ///
    /// Reals are promoted to duals with no derivatives. Symbolic matrices
    /// can only be combined with other symbolic matrices.
    pub fn promote(a: ScalarKind, b: ScalarKind) -> Result<ScalarKind> {
        match (a, b) {
            (ScalarKind::Real, ScalarKind::Real) => Ok(ScalarKind::Real),
            (ScalarKind::Dual, ScalarKind::Dual)
            | (ScalarKind::Dual, ScalarKind::Real)
            | (ScalarKind::Real, ScalarKind::Dual) => Ok(ScalarKind::Dual),
            (ScalarKind::Symbolic, ScalarKind::Symbolic) => {
                Ok(ScalarKind::Symbolic)
            },
            (a, b) => Err(SolveError::UnsupportedCombination { a, b }),
        }
    }
}

impl Display for ScalarKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::Real => write!(f, "real"),
            ScalarKind::Dual => write!(f, "dual"),
            ScalarKind::Symbolic => write!(f, "symbolic"),
        }
    }
}

/// A dense matrix where every entry has the same [`ScalarKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum Matrix {
    Real(DMatrix<f64>),
    Dual(DMatrix<Dual>),
    Symbolic(DMatrix<Expression>),
}

impl Matrix {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Matrix::Real(_) => ScalarKind::Real,
            Matrix::Dual(_) => ScalarKind::Dual,
            Matrix::Symbolic(_) => ScalarKind::Symbolic,
        }
    }

    pub fn nrows(&self) -> usize {
        match self {
            Matrix::Real(m) => m.nrows(),
            Matrix::Dual(m) => m.nrows(),
            Matrix::Symbolic(m) => m.nrows(),
        }
    }

    pub fn ncols(&self) -> usize {
        match self {
            Matrix::Real(m) => m.ncols(),
            Matrix::Dual(m) => m.ncols(),
            Matrix::Symbolic(m) => m.ncols(),
        }
    }

    pub fn extent(&self) -> Extent { Extent::new(self.nrows(), self.ncols()) }

    /// Get the real-valued matrix containing each entry's value.
    ///
    /// Symbolic matrices have no numeric value, so they give `None`.
    pub fn values(&self) -> Option<Cow<'_, DMatrix<f64>>> {
        match self {
            Matrix::Real(m) => Some(Cow::Borrowed(m)),
            Matrix::Dual(m) => Some(Cow::Owned(dual::values(m))),
            Matrix::Symbolic(_) => None,
        }
    }

    /// View this matrix as a dual matrix, treating real entries as duals
    /// with no derivatives.
    pub fn to_dual(&self) -> Option<Cow<'_, DMatrix<Dual>>> {
        match self {
            Matrix::Real(m) => Some(Cow::Owned(dual::constant_matrix(m))),
            Matrix::Dual(m) => Some(Cow::Borrowed(m)),
            Matrix::Symbolic(_) => None,
        }
    }

    pub fn as_real(&self) -> Option<&DMatrix<f64>> {
        match self {
            Matrix::Real(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_dual(&self) -> Option<&DMatrix<Dual>> {
        match self {
            Matrix::Dual(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_symbolic(&self) -> Option<&DMatrix<Expression>> {
        match self {
            Matrix::Symbolic(m) => Some(m),
            _ => None,
        }
    }

    pub fn into_real(self) -> Option<DMatrix<f64>> {
        match self {
            Matrix::Real(m) => Some(m),
            _ => None,
        }
    }

    pub fn into_dual(self) -> Option<DMatrix<Dual>> {
        match self {
            Matrix::Dual(m) => Some(m),
            _ => None,
        }
    }

    pub fn into_symbolic(self) -> Option<DMatrix<Expression>> {
        match self {
            Matrix::Symbolic(m) => Some(m),
            _ => None,
        }
    }
}

impl From<DMatrix<f64>> for Matrix {
    fn from(m: DMatrix<f64>) -> Self { Matrix::Real(m) }
}

impl From<DMatrix<Dual>> for Matrix {
    fn from(m: DMatrix<Dual>) -> Self { Matrix::Dual(m) }
}

impl From<DMatrix<Expression>> for Matrix {
    fn from(m: DMatrix<Expression>) -> Self { Matrix::Symbolic(m) }
}

impl From<DVector<f64>> for Matrix {
    fn from(v: DVector<f64>) -> Self { Matrix::Real(column(v)) }
}

impl From<DVector<Dual>> for Matrix {
    fn from(v: DVector<Dual>) -> Self { Matrix::Dual(column(v)) }
}

impl From<DVector<Expression>> for Matrix {
    fn from(v: DVector<Expression>) -> Self { Matrix::Symbolic(column(v)) }
}

fn column<T: Scalar>(v: DVector<T>) -> DMatrix<T> {
    let rows = v.nrows();
    DMatrix::from_iterator(rows, 1, v.iter().cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotion_rules() {
        let inputs = vec![
            (ScalarKind::Real, ScalarKind::Real, ScalarKind::Real),
            (ScalarKind::Real, ScalarKind::Dual, ScalarKind::Dual),
            (ScalarKind::Dual, ScalarKind::Real, ScalarKind::Dual),
            (ScalarKind::Dual, ScalarKind::Dual, ScalarKind::Dual),
            (ScalarKind::Symbolic, ScalarKind::Symbolic, ScalarKind::Symbolic),
        ];

        for (a, b, should_be) in inputs {
            let got = ScalarKind::promote(a, b).unwrap();
            assert_eq!(got, should_be, "{} with {}", a, b);
        }
    }

    #[test]
    fn symbolic_does_not_mix_with_numbers() {
        let inputs = vec![
            (ScalarKind::Symbolic, ScalarKind::Real),
            (ScalarKind::Symbolic, ScalarKind::Dual),
            (ScalarKind::Real, ScalarKind::Symbolic),
            (ScalarKind::Dual, ScalarKind::Symbolic),
        ];

        for (a, b) in inputs {
            let got = ScalarKind::promote(a, b).unwrap_err();
            assert_eq!(got, SolveError::UnsupportedCombination { a, b });
        }
    }

    #[test]
    fn project_dual_values() {
        let m = Matrix::from(DMatrix::from_row_slice(
            1,
            2,
            &[Dual::from_slice(1.5, &[1.0]), Dual::constant(-2.0)],
        ));

        let got = m.values().unwrap();

        assert_eq!(got.into_owned(), DMatrix::from_row_slice(1, 2, &[1.5, -2.0]));
        assert_eq!(m.extent(), Extent::new(1, 2));
    }

    #[test]
    fn real_values_are_borrowed() {
        let m = Matrix::from(DVector::from_column_slice(&[1.0, 2.0]));

        assert!(matches!(m.values(), Some(Cow::Borrowed(_))));
        assert_eq!(m.extent(), Extent::new(2, 1));
        assert!(Matrix::from(DMatrix::from_element(1, 1, Expression::one()))
            .values()
            .is_none());
    }

    #[test]
    fn reals_promote_to_duals_without_derivatives() {
        let m = Matrix::from(DMatrix::from_element(2, 2, 3.0));

        let got = m.to_dual().unwrap();

        assert!(got.iter().all(|d| d.value() == 3.0 && d.num_derivatives() == 0));
    }
}
