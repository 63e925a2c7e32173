use crate::{
    decompose::{get_solver, Algorithm, LinearSolver},
    dual::{self, Dual},
    error::{Extent, Result, SolveError},
    gradients::{self, Variables},
    matrix::{Matrix, ScalarKind},
};
use nalgebra::{DMatrix, DVector};

/// Solve `A.x = b`, propagating derivatives through the solve when either
/// side carries them.
///
/// The kind of `x` follows [`ScalarKind::promote()`]. When `x` is dual its
/// derivatives come from implicitly differentiating `A.x = b`,
///
/// ```text
/// A.∂x/∂z = ∂b/∂z - ∂A/∂z.x
/// ```
///
/// which needs one extra solve per variable, all of them reusing the
/// factorization of `A`'s values.
///
/// # Examples
///
/// ```rust
/// use linear_solve::{Algorithm, Dual, Matrix};
/// use nalgebra::DMatrix;
///
/// // A = [t], b = [4], so x = 4/t and dx/dt = -4/t² = -1 at t = 2
/// let a = Matrix::from(DMatrix::from_element(1, 1, Dual::variable(2.0, 0, 1)));
/// let b = Matrix::from(DMatrix::from_element(1, 1, 4.0));
///
/// let x = linear_solve::solve(Algorithm::PartialPivLu, &a, &b).unwrap();
///
/// let x = x.into_dual().unwrap();
/// assert_eq!(x[(0, 0)], Dual::from_slice(2.0, &[-1.0]));
/// ```
pub fn solve(algorithm: Algorithm, a: &Matrix, b: &Matrix) -> Result<Matrix> {
    let plan = Plan::new(a, b)?;
    let solver = get_solver(algorithm, a)?;

    plan.execute(&solver, a, b)
}

/// Solve `A.x = b` using a decomposition of `A` from an earlier call to
/// [`get_solver()`].
///
/// `A` is still needed for its derivatives, and must be the matrix the
/// solver was created from.
pub fn solve_with(solver: &LinearSolver, a: &Matrix, b: &Matrix) -> Result<Matrix> {
    let plan = Plan::new(a, b)?;

    if solver.extent() != a.extent() {
        return Err(SolveError::DimensionMismatch {
            expected: solver.extent(),
            found: a.extent(),
        });
    }

    plan.execute(solver, a, b)
}

/// Everything we can check about a system before any factorization.
#[derive(Debug, Copy, Clone, PartialEq)]
struct Plan {
    output: ScalarKind,
    /// Only known for a dual output.
    variables: Option<Variables>,
}

impl Plan {
    fn new(a: &Matrix, b: &Matrix) -> Result<Self> {
        let output = ScalarKind::promote(a.kind(), b.kind())?;

        if a.nrows() != a.ncols() {
            return Err(SolveError::DimensionMismatch {
                expected: Extent::new(a.nrows(), a.nrows()),
                found: a.extent(),
            });
        }
        if b.nrows() != a.nrows() {
            return Err(SolveError::DimensionMismatch {
                expected: Extent::new(a.nrows(), b.ncols()),
                found: b.extent(),
            });
        }

        let variables = match output {
            ScalarKind::Dual => match (a.to_dual(), b.to_dual()) {
                (Some(a), Some(b)) => Some(gradients::check(&a, &b)?),
                _ => None,
            },
            _ => None,
        };

        log::debug!(
            "Solving with A as {} and b as {} ({} right-hand sides), giving a {} x",
            a.extent(),
            b.extent(),
            b.ncols(),
            output
        );

        Ok(Plan { output, variables })
    }

    fn execute(
        self,
        solver: &LinearSolver,
        a: &Matrix,
        b: &Matrix,
    ) -> Result<Matrix> {
        match (self.output, a, b) {
            (ScalarKind::Symbolic, _, Matrix::Symbolic(b)) => {
                solver.solve_symbolic(b).map(Matrix::Symbolic)
            },
            (ScalarKind::Real, _, Matrix::Real(b)) => {
                solver.solve_real(b).map(Matrix::Real)
            },
            (ScalarKind::Dual, _, _) => {
                let variables = self.variables.unwrap_or(Variables { a: 0, b: 0 });
                solve_dual(solver, a, b, variables).map(Matrix::Dual)
            },
            (_, a, b) => Err(SolveError::UnsupportedCombination {
                a: a.kind(),
                b: b.kind(),
            }),
        }
    }
}

fn solve_dual(
    solver: &LinearSolver,
    a: &Matrix,
    b: &Matrix,
    variables: Variables,
) -> Result<DMatrix<Dual>> {
    let unsupported = || SolveError::UnsupportedCombination {
        a: a.kind(),
        b: b.kind(),
    };
    let a_dual = a.to_dual().ok_or_else(unsupported)?;
    let b_dual = b.to_dual().ok_or_else(unsupported)?;
    let b_values = b.values().ok_or_else(unsupported)?;

    let x = solver.solve_real(&b_values)?;
    let count = variables.count();
    let mut gradients = Vec::with_capacity(count);

    for k in 0..count {
        log::trace!("Propagating derivatives for variable {} of {}", k + 1, count);

        let mut rhs = if variables.b > 0 {
            dual::derivatives(&b_dual, k)
        } else {
            DMatrix::zeros(x.nrows(), x.ncols())
        };

        if variables.a > 0 {
            rhs -= dual::derivatives(&a_dual, k) * &x;
        }

        gradients.push(solver.solve_real(&rhs)?);
    }

    Ok(DMatrix::from_fn(x.nrows(), x.ncols(), |row, column| {
        let derivatives =
            DVector::from_iterator(count, gradients.iter().map(|dx| dx[(row, column)]));
        Dual::new(x[(row, column)], derivatives)
    }))
}
