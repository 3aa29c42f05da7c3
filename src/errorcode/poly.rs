//! Polynomials over GF(256).
//!
//! Coefficients are stored highest degree first. Leading zeros are stripped
//! on construction, the zero polynomial is a single zero coefficient.
use alloc::{vec, vec::Vec};
use core::ops::{Add, Mul};

use super::galois::GF;
use super::ErrorDecodingError;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Poly(Vec<GF>);

impl Poly {
    pub fn new(mut coefficients: Vec<GF>) -> Self {
        let first_non_zero = coefficients
            .iter()
            .position(|c| !c.is_zero())
            .unwrap_or(coefficients.len().saturating_sub(1));
        coefficients.drain(..first_non_zero);
        if coefficients.is_empty() {
            coefficients.push(GF::ZERO);
        }
        Self(coefficients)
    }

    pub fn zero() -> Self {
        Self(vec![GF::ZERO])
    }

    pub fn one() -> Self {
        Self(vec![GF::ONE])
    }

    /// `coefficient * x^degree`
    pub fn monomial(degree: usize, coefficient: GF) -> Self {
        if coefficient.is_zero() {
            return Self::zero();
        }
        let mut c = vec![GF::ZERO; degree + 1];
        c[0] = coefficient;
        Self(c)
    }

    pub fn degree(&self) -> usize {
        self.0.len() - 1
    }

    pub fn is_zero(&self) -> bool {
        self.0[0].is_zero()
    }

    /// Coefficient of `x^degree`.
    pub fn coefficient(&self, degree: usize) -> GF {
        if degree > self.degree() {
            GF::ZERO
        } else {
            self.0[self.degree() - degree]
        }
    }

    fn leading(&self) -> GF {
        self.0[0]
    }

    /// Evaluate with Horner's method.
    pub fn evaluate(&self, x: GF) -> GF {
        if x.is_zero() {
            return self.coefficient(0);
        }
        self.0.iter().fold(GF::ZERO, |acc, c| acc * x + *c)
    }

    pub fn scale(&self, factor: GF) -> Self {
        if factor.is_zero() {
            return Self::zero();
        }
        Self(self.0.iter().map(|c| *c * factor).collect())
    }

    /// Multiply by `coefficient * x^degree`.
    pub fn mul_monomial(&self, degree: usize, coefficient: GF) -> Self {
        if coefficient.is_zero() || self.is_zero() {
            return Self::zero();
        }
        let mut c: Vec<GF> = self.0.iter().map(|a| *a * coefficient).collect();
        c.resize(c.len() + degree, GF::ZERO);
        Self(c)
    }

    /// The formal derivative. In characteristic two only odd powers survive.
    pub fn derivative(&self) -> Self {
        let n = self.degree();
        if n == 0 {
            return Self::zero();
        }
        let c = self.0[..n]
            .iter()
            .enumerate()
            .map(|(i, c)| if (n - i) % 2 == 1 { *c } else { GF::ZERO })
            .collect();
        Self::new(c)
    }
}

impl<'a> Add<&'a Poly> for &'a Poly {
    type Output = Poly;

    fn add(self, rhs: &Poly) -> Poly {
        let (long, short) = if self.0.len() >= rhs.0.len() {
            (&self.0, &rhs.0)
        } else {
            (&rhs.0, &self.0)
        };
        let offset = long.len() - short.len();
        let mut sum = long.clone();
        for (s, c) in sum[offset..].iter_mut().zip(short) {
            *s += *c;
        }
        Poly::new(sum)
    }
}

impl<'a> Mul<&'a Poly> for &'a Poly {
    type Output = Poly;

    fn mul(self, rhs: &Poly) -> Poly {
        if self.is_zero() || rhs.is_zero() {
            return Poly::zero();
        }
        let mut product = vec![GF::ZERO; self.0.len() + rhs.0.len() - 1];
        for (i, a) in self.0.iter().enumerate() {
            for (j, b) in rhs.0.iter().enumerate() {
                product[i + j] += *a * *b;
            }
        }
        Poly::new(product)
    }
}

/// Run the extended Euclidean algorithm on `a` and `b` until the remainder
/// has degree less than `bound`.
///
/// Returns `(sigma, omega)` where `sigma` is the Bézout factor of `b`
/// (the error locator when `b` is the syndrome polynomial and `a = x^(2t)`)
/// and `omega` the final remainder (the error evaluator). Both are scaled so
/// that `sigma(0) = 1`.
pub fn divide_extended(a: &Poly, b: &Poly, bound: usize) -> Result<(Poly, Poly), ErrorDecodingError> {
    let (mut r_last, mut r) = if a.degree() < b.degree() {
        (b.clone(), a.clone())
    } else {
        (a.clone(), b.clone())
    };
    let mut t_last = Poly::zero();
    let mut t = Poly::one();

    while !r.is_zero() && r.degree() >= bound {
        let r_last_last = r_last;
        let t_last_last = t_last;
        r_last = r;
        t_last = t;

        // divide r_last_last by r_last
        r = r_last_last;
        let mut q = Poly::zero();
        let lead_inverse = r_last.leading().inverse()?;
        while !r.is_zero() && r.degree() >= r_last.degree() {
            let degree_diff = r.degree() - r_last.degree();
            let scale = r.leading() * lead_inverse;
            q = &q + &Poly::monomial(degree_diff, scale);
            r = &r + &r_last.mul_monomial(degree_diff, scale);
        }

        t = &(&q * &t_last) + &t_last_last;
    }

    let sigma_at_zero = t.coefficient(0);
    if sigma_at_zero.is_zero() {
        return Err(ErrorDecodingError::NoSolution);
    }
    let inverse = sigma_at_zero.inverse()?;
    Ok((t.scale(inverse), r.scale(inverse)))
}

#[cfg(test)]
use pretty_assertions::assert_eq;

#[cfg(test)]
fn p(c: &[u8]) -> Poly {
    Poly::new(c.iter().map(|x| GF(*x)).collect())
}

#[test]
fn test_degree_skips_leading_zeros() {
    assert_eq!(p(&[0, 0, 3, 1]).degree(), 1);
    assert_eq!(p(&[0, 0, 0]).degree(), 0);
    assert!(p(&[0, 0]).is_zero());
    assert_eq!(p(&[5, 0, 1]).coefficient(2), GF(5));
    assert_eq!(p(&[5, 0, 1]).coefficient(7), GF(0));
}

#[test]
fn test_evaluate() {
    // x^2 + 3x + 2 = (x + 1)(x + 2)
    let f = p(&[1, 3, 2]);
    assert_eq!(f.evaluate(GF(1)), GF(0));
    assert_eq!(f.evaluate(GF(2)), GF(0));
    assert_eq!(f.evaluate(GF(0)), GF(2));
    assert_eq!(f.evaluate(GF(3)), GF(3) * GF(3) + GF(3) * GF(3) + GF(2));
}

#[test]
fn test_add_mul() {
    let a = p(&[1, 1]);
    let b = p(&[1, 2]);
    assert_eq!(&a * &b, p(&[1, 3, 2]));
    assert_eq!(&a + &a, Poly::zero());
    assert_eq!(&a + &p(&[7, 0, 0]), p(&[7, 1, 1]));
    assert_eq!(a.mul_monomial(2, GF(2)), p(&[2, 2, 0, 0]));
}

#[test]
fn test_derivative() {
    // d/dx (x^3 + 5x^2 + 7x + 1) = 3x^2 + 10x + 7 = x^2 + 7
    assert_eq!(p(&[1, 5, 7, 1]).derivative(), p(&[1, 0, 7]));
    assert_eq!(p(&[9]).derivative(), Poly::zero());
}

#[test]
fn test_divide_extended_normalizes() {
    let a = Poly::monomial(4, GF::ONE);
    let b = p(&[3, 17, 200, 9]);
    let (sigma, omega) = divide_extended(&a, &b, 2).unwrap();
    assert_eq!(sigma.coefficient(0), GF::ONE);
    assert!(omega.degree() < 2);
    // omega = sigma * b mod x^4
    let check = &sigma * &b;
    for d in 0..4 {
        assert_eq!(check.coefficient(d), omega.coefficient(d));
    }
}
