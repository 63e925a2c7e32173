//! Adapters which make the choice of decomposition algorithm a parameter.
//!
//! Each [`Algorithm`] knows how to [`Algorithm::decompose()`] a real
//! matrix into a [`Decomposition`], a handle which can then be reused to
//! solve for any number of right-hand sides. The [`LinearSolver`] returned
//! by [`get_solver()`] wraps that handle (or its symbolic counterpart) and
//! remembers the extent of the matrix it was built from.

use crate::{
    algebra::{ops, Expression},
    dual,
    error::{Extent, Result, SolveError},
    matrix::{Matrix, ScalarKind},
};
use faer::{
    linalg::solvers::{Lblt, Solve},
    Mat, Side,
};
use nalgebra::{
    linalg::{Cholesky, ColPivQR, LU},
    DMatrix, Dyn,
};
use smol_str::SmolStr;
use std::{
    fmt::{self, Debug, Display, Formatter},
    str::FromStr,
};
use thiserror::Error;

/// The algorithms a matrix may be decomposed with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// The `LLᵀ` Cholesky decomposition, for symmetric positive definite
    /// matrices.
    Cholesky,
    /// A robust `PᵀLDLᵀP` Cholesky decomposition with symmetric pivoting.
    PivotedLdlt,
    /// Householder QR with column pivoting.
    ColPivQr,
    /// LU with partial (row) pivoting.
    PartialPivLu,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::Cholesky,
        Algorithm::PivotedLdlt,
        Algorithm::ColPivQr,
        Algorithm::PartialPivLu,
    ];

    /// Factorize a real, square matrix.
    pub fn decompose(
        self,
        matrix: DMatrix<f64>,
    ) -> Result<Box<dyn Decomposition>> {
        ensure_square(Extent::new(matrix.nrows(), matrix.ncols()))?;
        log::debug!(
            "Factorizing a {}x{} matrix using {}",
            matrix.nrows(),
            matrix.ncols(),
            self
        );

        Ok(match self {
            Algorithm::Cholesky => Box::new(Llt::new(matrix)?),
            Algorithm::PivotedLdlt => Box::new(BunchKaufman::new(matrix)?),
            Algorithm::ColPivQr => Box::new(Qr::new(matrix)?),
            Algorithm::PartialPivLu => Box::new(Lu::new(matrix)?),
        })
    }

    fn singular(self) -> SolveError {
        SolveError::SingularMatrix { algorithm: self }
    }
}

impl Default for Algorithm {
    fn default() -> Self { Algorithm::Cholesky }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Cholesky => write!(f, "Cholesky"),
            Algorithm::PivotedLdlt => write!(f, "pivoted LDLT"),
            Algorithm::ColPivQr => write!(f, "column-pivoting QR"),
            Algorithm::PartialPivLu => write!(f, "partial-pivoting LU"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Unknown decomposition algorithm, \"{name}\"")]
pub struct UnknownAlgorithm {
    pub name: SmolStr,
}

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "llt" | "cholesky" => Ok(Algorithm::Cholesky),
            "ldlt" | "pivoted-ldlt" => Ok(Algorithm::PivotedLdlt),
            "qr" | "col-piv-qr" => Ok(Algorithm::ColPivQr),
            "lu" | "partial-piv-lu" => Ok(Algorithm::PartialPivLu),
            _ => Err(UnknownAlgorithm { name: s.into() }),
        }
    }
}

/// A factorized real matrix, ready to solve `A.x = b` for any `b`.
///
/// Implementations own their factorization and never mutate it, so one
/// handle can be shared between threads and reused for many right-hand
/// sides.
pub trait Decomposition: Debug + Send + Sync {
    fn algorithm(&self) -> Algorithm;

    /// Solve for `x`, one column of `rhs` at a time.
    fn solve(&self, rhs: &DMatrix<f64>) -> Result<DMatrix<f64>>;
}

#[derive(Debug, Clone)]
struct Llt(Cholesky<f64, Dyn>);

impl Llt {
    fn new(matrix: DMatrix<f64>) -> Result<Self> {
        Cholesky::new(matrix)
            .map(Llt)
            .ok_or_else(|| Algorithm::Cholesky.singular())
    }
}

impl Decomposition for Llt {
    fn algorithm(&self) -> Algorithm { Algorithm::Cholesky }

    fn solve(&self, rhs: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        Ok(self.0.solve(rhs))
    }
}

#[derive(Debug, Clone)]
struct Qr(ColPivQR<f64, Dyn, Dyn>);

impl Qr {
    fn new(matrix: DMatrix<f64>) -> Result<Self> {
        let qr = ColPivQR::new(matrix);

        if is_rank_deficient(qr.r().diagonal().as_slice()) {
            return Err(Algorithm::ColPivQr.singular());
        }

        Ok(Qr(qr))
    }
}

impl Decomposition for Qr {
    fn algorithm(&self) -> Algorithm { Algorithm::ColPivQr }

    fn solve(&self, rhs: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        self.0
            .solve(rhs)
            .ok_or_else(|| Algorithm::ColPivQr.singular())
    }
}

#[derive(Debug, Clone)]
struct Lu(LU<f64, Dyn, Dyn>);

impl Lu {
    fn new(matrix: DMatrix<f64>) -> Result<Self> {
        let lu = LU::new(matrix);

        if !lu.is_invertible()
            || is_rank_deficient(lu.u().diagonal().as_slice())
        {
            return Err(Algorithm::PartialPivLu.singular());
        }

        Ok(Lu(lu))
    }
}

impl Decomposition for Lu {
    fn algorithm(&self) -> Algorithm { Algorithm::PartialPivLu }

    fn solve(&self, rhs: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        self.0
            .solve(rhs)
            .ok_or_else(|| Algorithm::PartialPivLu.singular())
    }
}

/// Treat a triangular factor as singular when one of its pivots is
/// negligible compared to the largest.
fn is_rank_deficient(pivots: &[f64]) -> bool {
    let largest = pivots.iter().fold(0.0_f64, |acc, p| acc.max(p.abs()));
    let threshold = largest * pivots.len() as f64 * f64::EPSILON;

    pivots.iter().any(|p| !p.is_finite() || p.abs() <= threshold)
}

/// `PAPᵀ = LBLᵀ` with Bunch-Kaufman pivoting, where `B` is block diagonal
/// with 1x1 and 2x2 blocks, so symmetric indefinite matrices such as
/// `[[0, 1], [1, 0]]` can be factorized too.
///
/// Only the lower triangle of the input is read.
struct BunchKaufman {
    lblt: Lblt<f64>,
    size: usize,
}

impl BunchKaufman {
    fn new(matrix: DMatrix<f64>) -> Result<Self> {
        let size = matrix.nrows();
        let a = Mat::from_fn(size, size, |row, column| matrix[(row, column)]);
        let lblt = Lblt::new(a.as_ref(), Side::Lower);

        let diagonal: Vec<f64> =
            lblt.B_diag().column_vector().iter().copied().collect();
        let subdiagonal: Vec<f64> =
            lblt.B_subdiag().column_vector().iter().copied().collect();

        if is_rank_deficient(&block_pivots(&diagonal, &subdiagonal)) {
            return Err(Algorithm::PivotedLdlt.singular());
        }

        Ok(BunchKaufman { lblt, size })
    }
}

/// The magnitude of each pivot in `B`, where a 2x2 block contributes the
/// square root of its determinant once per row.
fn block_pivots(diagonal: &[f64], subdiagonal: &[f64]) -> Vec<f64> {
    let mut pivots = Vec::with_capacity(diagonal.len());
    let mut i = 0;

    while i < diagonal.len() {
        let off_diagonal = subdiagonal.get(i).copied().unwrap_or(0.0);

        if i + 1 < diagonal.len() && off_diagonal != 0.0 {
            let determinant =
                diagonal[i] * diagonal[i + 1] - off_diagonal * off_diagonal;
            let magnitude = determinant.abs().sqrt();
            pivots.extend_from_slice(&[magnitude, magnitude]);
            i += 2;
        } else {
            pivots.push(diagonal[i]);
            i += 1;
        }
    }

    pivots
}

impl Debug for BunchKaufman {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("BunchKaufman")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl Decomposition for BunchKaufman {
    fn algorithm(&self) -> Algorithm { Algorithm::PivotedLdlt }

    fn solve(&self, rhs: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        let b = Mat::from_fn(rhs.nrows(), rhs.ncols(), |row, column| {
            rhs[(row, column)]
        });

        let x: Mat<f64> = self.lblt.solve(&b);

        Ok(DMatrix::from_fn(x.nrows(), x.ncols(), |row, column| {
            x[(row, column)]
        }))
    }
}

/// The square-root free Cholesky decomposition, `A = LDLᵀ`, computed
/// exactly over [`Expression`]s.
///
/// Eliminates in the same order as [`Algorithm::Cholesky`] without ever
/// taking a square root, so the solution only involves `+ - * /`.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolicLdlt {
    /// Unit lower triangular, only entries below the diagonal are used.
    lower: DMatrix<Expression>,
    diagonal: Vec<Expression>,
}

impl SymbolicLdlt {
    pub fn new(a: &DMatrix<Expression>) -> Result<Self> {
        ensure_square(Extent::new(a.nrows(), a.ncols()))?;

        let n = a.nrows();
        let mut lower = DMatrix::from_element(n, n, Expression::zero());
        let mut diagonal: Vec<Expression> = Vec::with_capacity(n);

        for j in 0..n {
            let mut d_j = a[(j, j)].clone();
            for k in 0..j {
                d_j = d_j
                    - lower[(j, k)].clone()
                        * lower[(j, k)].clone()
                        * diagonal[k].clone();
            }
            let d_j = ops::fold_constants(&d_j);

            // zero pivots can hide behind parameters, e.g. v*v/u - v*v/u
            if d_j.expand().is_zero() {
                return Err(Algorithm::Cholesky.singular());
            }

            for i in (j + 1)..n {
                let mut l_ij = a[(i, j)].clone();
                for k in 0..j {
                    l_ij = l_ij
                        - lower[(i, k)].clone()
                            * lower[(j, k)].clone()
                            * diagonal[k].clone();
                }
                lower[(i, j)] = ops::fold_constants(&(l_ij / d_j.clone()));
            }

            diagonal.push(d_j);
        }

        Ok(SymbolicLdlt { lower, diagonal })
    }

    pub fn solve(
        &self,
        rhs: &DMatrix<Expression>,
    ) -> Result<DMatrix<Expression>> {
        let n = self.diagonal.len();
        let l = &self.lower;
        let mut x = rhs.clone();

        for column in 0..rhs.ncols() {
            // L z = b
            for i in 0..n {
                let mut z_i = x[(i, column)].clone();
                for k in 0..i {
                    z_i = z_i - l[(i, k)].clone() * x[(k, column)].clone();
                }
                x[(i, column)] = ops::fold_constants(&z_i);
            }

            // D y = z, then Lᵀ x = y
            for i in (0..n).rev() {
                let mut x_i = x[(i, column)].clone() / self.diagonal[i].clone();
                for k in (i + 1)..n {
                    x_i = x_i - l[(k, i)].clone() * x[(k, column)].clone();
                }
                x[(i, column)] = ops::fold_constants(&x_i);
            }
        }

        Ok(x)
    }
}

#[derive(Debug)]
enum Factorization {
    Real(Box<dyn Decomposition>),
    Symbolic(SymbolicLdlt),
}

/// A decomposition of `A` (or its values) which can be reused to solve
/// for many right-hand sides.
///
/// Dual matrices are decomposed using only their values, so the handle for
/// a dual `A` is bound to a real matrix.
#[derive(Debug)]
pub struct LinearSolver {
    algorithm: Algorithm,
    size: usize,
    factorization: Factorization,
}

impl LinearSolver {
    pub fn algorithm(&self) -> Algorithm { self.algorithm }

    /// The kind of matrix the decomposition was computed from.
    pub fn kind(&self) -> ScalarKind {
        match self.factorization {
            Factorization::Real(_) => ScalarKind::Real,
            Factorization::Symbolic(_) => ScalarKind::Symbolic,
        }
    }

    pub fn nrows(&self) -> usize { self.size }

    pub fn ncols(&self) -> usize { self.size }

    pub fn extent(&self) -> Extent { Extent::new(self.size, self.size) }

    /// Solve `A.x = b` for a real `b`.
    pub fn solve_real(&self, rhs: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        self.check_rows(rhs.nrows(), rhs.ncols())?;

        match &self.factorization {
            Factorization::Real(decomposition) => decomposition.solve(rhs),
            Factorization::Symbolic(_) => {
                Err(SolveError::UnsupportedCombination {
                    a: ScalarKind::Symbolic,
                    b: ScalarKind::Real,
                })
            },
        }
    }

    /// Solve `A.x = b` exactly for a symbolic `b`.
    pub fn solve_symbolic(
        &self,
        rhs: &DMatrix<Expression>,
    ) -> Result<DMatrix<Expression>> {
        self.check_rows(rhs.nrows(), rhs.ncols())?;

        match &self.factorization {
            Factorization::Symbolic(ldlt) => ldlt.solve(rhs),
            Factorization::Real(_) => Err(SolveError::UnsupportedCombination {
                a: ScalarKind::Real,
                b: ScalarKind::Symbolic,
            }),
        }
    }

    fn check_rows(&self, rows: usize, columns: usize) -> Result<()> {
        if rows == self.size {
            Ok(())
        } else {
            Err(SolveError::DimensionMismatch {
                expected: Extent::new(self.size, columns),
                found: Extent::new(rows, columns),
            })
        }
    }
}

/// Decompose `A` with a particular algorithm so it can be used to solve
/// `A.x = b` for many `b`.
///
/// Real and dual matrices are decomposed using their values. Symbolic
/// matrices are decomposed exactly, which is only supported for
/// [`Algorithm::Cholesky`].
pub fn get_solver(algorithm: Algorithm, a: &Matrix) -> Result<LinearSolver> {
    ensure_square(a.extent())?;

    let factorization = match a {
        Matrix::Symbolic(m) => {
            if algorithm != Algorithm::Cholesky {
                return Err(SolveError::UnsupportedAlgorithm {
                    algorithm,
                    kind: ScalarKind::Symbolic,
                });
            }

            log::debug!(
                "Symbolically factorizing a {}x{} matrix",
                m.nrows(),
                m.ncols()
            );
            Factorization::Symbolic(SymbolicLdlt::new(m)?)
        },
        Matrix::Real(m) => {
            Factorization::Real(algorithm.decompose(m.clone())?)
        },
        Matrix::Dual(m) => {
            Factorization::Real(algorithm.decompose(dual::values(m))?)
        },
    };

    Ok(LinearSolver {
        algorithm,
        size: a.nrows(),
        factorization,
    })
}

fn ensure_square(extent: Extent) -> Result<()> {
    if extent.rows == extent.columns {
        Ok(())
    } else {
        Err(SolveError::DimensionMismatch {
            expected: Extent::new(extent.rows, extent.rows),
            found: extent,
        })
    }
}
