//! Solve the linear system `A.x = b` where `A` and `b` may contain plain
//! reals, [`Dual`] numbers or symbolic [`Expression`]s.
//!
//! Derivatives recorded in `A` and `b` are carried through to `x` by
//! implicitly differentiating the solve, so only one factorization is ever
//! needed. Symbolic systems are solved exactly.
//!
//! ```rust
//! use linear_solve::{Algorithm, Matrix};
//! use nalgebra::{DMatrix, DVector};
//!
//! let a = Matrix::from(DMatrix::from_row_slice(2, 2, &[1.0, 3.0, 3.0, 10.0]));
//! let b = Matrix::from(DVector::from_column_slice(&[3.0, 5.0]));
//!
//! let x = linear_solve::solve(Algorithm::Cholesky, &a, &b).unwrap();
//!
//! let x = x.into_real().unwrap();
//! assert!((x[0] - 15.0).abs() < 1e-10);
//! assert!((x[1] + 4.0).abs() < 1e-10);
//! ```

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

pub mod algebra;
mod decompose;
pub mod dual;
mod error;
mod gradients;
mod matrix;
mod solve;

pub use algebra::{Expression, Parameter};
pub use decompose::{
    get_solver, Algorithm, Decomposition, LinearSolver, SymbolicLdlt,
    UnknownAlgorithm,
};
pub use dual::Dual;
pub use error::{Extent, Operand, Result, SolveError};
pub use gradients::{check as check_gradients, derivative_count, Variables};
pub use matrix::{Matrix, ScalarKind};
pub use solve::{solve, solve_with};
