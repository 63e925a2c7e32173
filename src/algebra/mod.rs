//! The symbolic algebra system.
//!
//! Symbolic matrices are built from [`Expression`]s, which can be created
//! with the usual arithmetic operators or parsed from text. Equality of
//! two expressions is decided on their [`Expression::expand()`]ed form
//! rather than their tree structure.

mod expr;
pub mod ops;
mod parse;
mod polynomial;

pub use expr::{BinaryOperation, Expression, Parameter};
pub use parse::{parse, ParseError, TokenKind};
pub use polynomial::{Monomial, Polynomial, Rational};
