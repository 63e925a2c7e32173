//! Canonical forms used when comparing [`Expression`]s for algebraic
//! equality.
//!
//! Every [`Expression`] built from `+`, `-`, `*` and `/` expands to a
//! [`Rational`], a quotient of two [`Polynomial`]s. Polynomials keep their
//! terms in a sorted map with zero coefficients removed, so structurally
//! equal polynomials are equal values. Coefficient arithmetic only ever adds,
//! subtracts and multiplies, which keeps integer-valued inputs exact.
//!
//! [`Expression`]: crate::algebra::Expression

use crate::algebra::Parameter;
use std::{
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
    ops::{Add, Div, Mul, Neg, Sub},
};

/// A product of [`Parameter`]s, each raised to a positive power.
#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Monomial {
    // sorted by parameter, no zero exponents
    factors: Vec<(Parameter, u32)>,
}

impl Monomial {
    /// The empty product.
    pub fn unit() -> Self { Monomial::default() }

    pub fn parameter(param: Parameter) -> Self {
        Monomial {
            factors: vec![(param, 1)],
        }
    }

    pub fn is_unit(&self) -> bool { self.factors.is_empty() }

    fn product(&self, other: &Monomial) -> Monomial {
        let mut exponents: BTreeMap<Parameter, u32> =
            self.factors.iter().cloned().collect();

        for (param, exponent) in &other.factors {
            *exponents.entry(param.clone()).or_insert(0) += exponent;
        }

        Monomial {
            factors: exponents.into_iter().collect(),
        }
    }
}

impl Display for Monomial {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, (param, exponent)) in self.factors.iter().enumerate() {
            if i > 0 {
                write!(f, "*")?;
            }

            if *exponent == 1 {
                write!(f, "{}", param)?;
            } else {
                write!(f, "{}^{}", param, exponent)?;
            }
        }

        Ok(())
    }
}

/// A sum of [`Monomial`]s with real coefficients.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Polynomial {
    terms: BTreeMap<Monomial, f64>,
}

impl Polynomial {
    pub fn zero() -> Self { Polynomial::default() }

    pub fn one() -> Self { Polynomial::constant(1.0) }

    pub fn constant(value: f64) -> Self {
        let mut poly = Polynomial::zero();
        poly.add_term(Monomial::unit(), value);
        poly
    }

    pub fn parameter(param: Parameter) -> Self {
        let mut poly = Polynomial::zero();
        poly.add_term(Monomial::parameter(param), 1.0);
        poly
    }

    pub fn is_zero(&self) -> bool { self.terms.is_empty() }

    /// Get the polynomial's value if it doesn't depend on any parameters.
    pub fn as_constant(&self) -> Option<f64> {
        match self.terms.len() {
            0 => Some(0.0),
            1 => self
                .terms
                .get(&Monomial::unit())
                .copied(),
            _ => None,
        }
    }

    /// Iterate over the non-zero terms, ordered by [`Monomial`].
    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, f64)> + '_ {
        self.terms.iter().map(|(monomial, coefficient)| (monomial, *coefficient))
    }

    fn add_term(&mut self, monomial: Monomial, coefficient: f64) {
        let sum = self.terms.get(&monomial).copied().unwrap_or(0.0) + coefficient;

        if sum == 0.0 {
            self.terms.remove(&monomial);
        } else {
            self.terms.insert(monomial, sum);
        }
    }
}

impl<'a> Add for &'a Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: &'a Polynomial) -> Polynomial {
        let mut sum = self.clone();

        for (monomial, coefficient) in rhs.terms() {
            sum.add_term(monomial.clone(), coefficient);
        }

        sum
    }
}

impl<'a> Sub for &'a Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: &'a Polynomial) -> Polynomial {
        let mut difference = self.clone();

        for (monomial, coefficient) in rhs.terms() {
            difference.add_term(monomial.clone(), -coefficient);
        }

        difference
    }
}

impl<'a> Mul for &'a Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: &'a Polynomial) -> Polynomial {
        let mut product = Polynomial::zero();

        for (left, left_coefficient) in self.terms() {
            for (right, right_coefficient) in rhs.terms() {
                product.add_term(
                    left.product(right),
                    left_coefficient * right_coefficient,
                );
            }
        }

        product
    }
}

impl Neg for Polynomial {
    type Output = Polynomial;

    fn neg(mut self) -> Polynomial {
        for coefficient in self.terms.values_mut() {
            *coefficient = -*coefficient;
        }

        self
    }
}

impl Display for Polynomial {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }

        for (i, (monomial, coefficient)) in self.terms().enumerate() {
            let magnitude = if i == 0 {
                if coefficient < 0.0 {
                    write!(f, "-")?;
                }
                coefficient.abs()
            } else {
                let sign = if coefficient < 0.0 { " - " } else { " + " };
                write!(f, "{}", sign)?;
                coefficient.abs()
            };

            match (monomial.is_unit(), magnitude == 1.0) {
                (true, _) => write!(f, "{}", magnitude)?,
                (false, true) => write!(f, "{}", monomial)?,
                (false, false) => write!(f, "{}*{}", magnitude, monomial)?,
            }
        }

        Ok(())
    }
}

/// A quotient of two [`Polynomial`]s.
///
/// Equality is decided by cross-multiplication, so `u/2 + u/2` and `u`
/// compare equal even though their numerators differ.
#[derive(Debug, Clone)]
pub struct Rational {
    numerator: Polynomial,
    denominator: Polynomial,
}

impl Rational {
    pub fn new(numerator: Polynomial, denominator: Polynomial) -> Self {
        Rational {
            numerator,
            denominator,
        }
        .normalized()
    }

    pub fn numerator(&self) -> &Polynomial { &self.numerator }

    pub fn denominator(&self) -> &Polynomial { &self.denominator }

    pub fn is_zero(&self) -> bool { self.numerator.is_zero() }

    /// Get the value if the quotient doesn't depend on any parameters.
    pub fn as_constant(&self) -> Option<f64> {
        let numerator = self.numerator.as_constant()?;
        let denominator = self.denominator.as_constant()?;
        Some(numerator / denominator)
    }

    fn normalized(self) -> Self {
        if self.numerator.is_zero() {
            Rational::from(Polynomial::zero())
        } else if self.numerator == self.denominator {
            Rational::from(Polynomial::one())
        } else {
            self
        }
    }
}

impl From<Polynomial> for Rational {
    fn from(numerator: Polynomial) -> Self {
        Rational {
            numerator,
            denominator: Polynomial::one(),
        }
    }
}

impl PartialEq for Rational {
    fn eq(&self, other: &Rational) -> bool {
        &self.numerator * &other.denominator
            == &other.numerator * &self.denominator
    }
}

impl Add for Rational {
    type Output = Rational;

    fn add(self, rhs: Rational) -> Rational {
        if self.denominator == rhs.denominator {
            let numerator = &self.numerator + &rhs.numerator;
            return Rational::new(numerator, self.denominator);
        }

        let numerator = &(&self.numerator * &rhs.denominator)
            + &(&rhs.numerator * &self.denominator);
        let denominator = &self.denominator * &rhs.denominator;
        Rational::new(numerator, denominator)
    }
}

impl Sub for Rational {
    type Output = Rational;

    fn sub(self, rhs: Rational) -> Rational { self + -rhs }
}

impl Mul for Rational {
    type Output = Rational;

    fn mul(self, rhs: Rational) -> Rational {
        Rational::new(
            &self.numerator * &rhs.numerator,
            &self.denominator * &rhs.denominator,
        )
    }
}

impl Div for Rational {
    type Output = Rational;

    fn div(self, rhs: Rational) -> Rational {
        Rational::new(
            &self.numerator * &rhs.denominator,
            &self.denominator * &rhs.numerator,
        )
    }
}

impl Neg for Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        Rational {
            numerator: -self.numerator,
            denominator: self.denominator,
        }
    }
}

impl Display for Rational {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.denominator == Polynomial::one() {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "({})/({})", self.numerator, self.denominator)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u() -> Polynomial { Polynomial::parameter(Parameter::named("u")) }

    fn v() -> Polynomial { Polynomial::parameter(Parameter::named("v")) }

    #[test]
    fn like_terms_are_collected() {
        let got = &(&u() + &v()) + &u();

        let mut should_be = Polynomial::parameter(Parameter::named("v"));
        should_be.add_term(Monomial::parameter(Parameter::named("u")), 2.0);
        assert_eq!(got, should_be);
        assert_eq!(got.to_string(), "2*u + v");
    }

    #[test]
    fn cancelling_terms_disappear() {
        let got = &(&u() + &v()) - &u();

        assert_eq!(got, v());
        assert!((&u() - &u()).is_zero());
    }

    #[test]
    fn multiplication_merges_exponents() {
        let u_plus_v = &u() + &v();

        let got = &u_plus_v * &u_plus_v;

        // monomials sort by their factors, so u*v comes before u^2
        assert_eq!(got.to_string(), "2*u*v + u^2 + v^2");
    }

    #[test]
    fn constants_are_recognised() {
        assert_eq!(Polynomial::zero().as_constant(), Some(0.0));
        assert_eq!(Polynomial::constant(-3.0).as_constant(), Some(-3.0));
        assert_eq!((&u() + &Polynomial::one()).as_constant(), None);
        assert_eq!(Polynomial::constant(-3.0).to_string(), "-3");
    }

    #[test]
    fn rationals_compare_by_cross_multiplication() {
        let half_u = Rational::new(u(), Polynomial::constant(2.0));
        let twice = half_u.clone() + half_u;

        assert_eq!(twice, Rational::from(u()));
        assert_ne!(twice, Rational::from(v()));
    }

    #[test]
    fn division_then_multiplication_cancels() {
        let u = Rational::from(u());
        let v = Rational::from(v());

        let got = u.clone() / v.clone() * v;

        assert_eq!(got, u);
        assert_eq!((u.clone() - u).as_constant(), Some(0.0));
    }
}
