//! Read `A` and `b` from stdin and solve `A.x = b`.
//!
//! Each line is one row, with entries separated by whitespace, and a blank
//! line separates `A` from `b`. Entries may be numbers or expressions with
//! no spaces (`2*u+v`), in which case the system is solved symbolically.
//!
//! ```console
//! $ printf '1 3\n3 10\n\n3\n5\n' | cargo run --example cli -- ldlt
//! ```

use linear_solve::{algebra::ops, Algorithm, Expression, Matrix};
use nalgebra::DMatrix;
use std::io::{BufRead, BufReader};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let algorithm: Algorithm = match std::env::args().nth(1) {
        Some(name) => name.parse()?,
        None => Algorithm::default(),
    };

    let stdin = std::io::stdin();
    let mut a_rows = Vec::new();
    let mut b_rows = Vec::new();
    let mut reading_b = false;

    for line in BufReader::new(stdin.lock()).lines() {
        let line = line?;

        if line.trim().is_empty() {
            reading_b = !a_rows.is_empty();
            continue;
        }

        let row = line
            .split_whitespace()
            .map(|entry| entry.parse().map(|e| ops::fold_constants(&e)))
            .collect::<Result<Vec<Expression>, _>>()?;

        if reading_b {
            b_rows.push(row);
        } else {
            a_rows.push(row);
        }
    }

    let (a, b) = to_system(&a_rows, &b_rows)?;
    println!("Solving with the {} decomposition", algorithm);

    let x = linear_solve::solve(algorithm, &a, &b)?;

    println!("Found:");
    match x {
        Matrix::Real(x) => println!("{}", x),
        Matrix::Symbolic(x) => {
            for (row, entries) in x.row_iter().enumerate() {
                let entries: Vec<_> =
                    entries.iter().map(ToString::to_string).collect();
                println!("  x[{}] = [{}]", row, entries.join(", "));
            }
        },
        Matrix::Dual(x) => println!("{:?}", x),
    }

    Ok(())
}

/// Numbers give a real system. If either side contains a parameter, both
/// sides are kept symbolic so the solver never sees a mix of kinds.
fn to_system(
    a_rows: &[Vec<Expression>],
    b_rows: &[Vec<Expression>],
) -> Result<(Matrix, Matrix), Box<dyn std::error::Error>> {
    let a = to_expressions(a_rows)?;
    let b = to_expressions(b_rows)?;

    if a.iter().chain(b.iter()).all(Expression::is_constant) {
        let real = |m: DMatrix<Expression>| {
            Matrix::from(m.map(|e| e.as_constant().unwrap_or_default()))
        };
        Ok((real(a), real(b)))
    } else {
        Ok((Matrix::from(a), Matrix::from(b)))
    }
}

fn to_expressions(
    rows: &[Vec<Expression>],
) -> Result<DMatrix<Expression>, Box<dyn std::error::Error>> {
    let columns = rows.first().map(Vec::len).unwrap_or(0);

    if rows.iter().any(|row| row.len() != columns) {
        return Err("Every row must have the same number of entries".into());
    }

    let entries: Vec<Expression> = rows.iter().flatten().cloned().collect();

    Ok(DMatrix::from_row_slice(rows.len(), columns, &entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use linear_solve::ScalarKind;

    fn rows(text: &[&[&str]]) -> Vec<Vec<Expression>> {
        text.iter()
            .map(|row| row.iter().map(|e| e.parse().unwrap()).collect())
            .collect()
    }

    #[test]
    fn numbers_give_a_real_system() {
        let (a, b) =
            to_system(&rows(&[&["1", "3"], &["3", "10"]]), &rows(&[&["3"], &["5"]]))
                .unwrap();

        assert_eq!(a.kind(), ScalarKind::Real);
        assert_eq!(b.kind(), ScalarKind::Real);
    }

    #[test]
    fn a_parameter_on_either_side_makes_both_symbolic() {
        let (a, b) =
            to_system(&rows(&[&["1", "3"], &["3", "10"]]), &rows(&[&["u"], &["5"]]))
                .unwrap();

        assert_eq!(a.kind(), ScalarKind::Symbolic);
        assert_eq!(b.kind(), ScalarKind::Symbolic);

        let x = linear_solve::solve(Algorithm::Cholesky, &a, &b).unwrap();
        assert_eq!(x.kind(), ScalarKind::Symbolic);
    }
}
