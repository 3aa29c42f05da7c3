//! Arithmetic in GF(256), the field the Reed-Solomon codes work in.
//!
//! An element is stored as an u8 whose bits are the coefficients of a
//! polynomial of degree at most 7, the least significant bit being the
//! coefficient of 1:
//!
//! > 29 = 0b00011101 = x^4 + x^3 + x^2 + 1.
//!
//! Addition is done coefficient by coefficient, which is a XOR. Multiplication
//! is polynomial multiplication modulo the primitive polynomial
//! x^8 + x^4 + x^3 + x^2 + 1 (0x11D).
//!
//! Because the polynomial is primitive, the element x (the value 2, called
//! α below) generates all non-zero elements: 1, α, α^2, ..., α^254.
//! Every non-zero element is identified with its exponent, so
//! a * b = α^i * α^j = α^(i + j). The two tables used for the
//! lookups are LOG and ANTI_LOG.
use core::iter::Sum;
use core::ops::{Add, AddAssign, Mul, MulAssign, Sub};

use super::GaloisError;

/// Compute the exponent and logarithm tables.
const fn compute_alog_log() -> ([u8; 255], [u8; 256]) {
    let mut alog = [0u8; 255];
    let mut log = [0u8; 256];
    let mut p: u16 = 1;
    let mut i: u8 = 0;
    while i < 255 {
        alog[i as usize] = p as u8;
        log[p as usize] = i;

        // multiply by α and reduce modulo 0x11D
        p <<= 1;
        if p >= 256 {
            p ^= 0x11D;
        }

        i += 1;
    }
    (alog, log)
}

/// α^i for i in 0..255.
const ANTI_LOG: [u8; 255] = compute_alog_log().0;

/// Inverse of [ANTI_LOG], the entry for 0 is meaningless.
const LOG: [u8; 256] = compute_alog_log().1;

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct GF(pub u8);

impl GF {
    pub const ZERO: GF = GF(0);
    pub const ONE: GF = GF(1);

    /// Get α^i, the exponent is taken modulo 255.
    pub fn primitive_power(i: usize) -> Self {
        GF(ANTI_LOG[i % 255])
    }

    /// Iterator over 1, α, α^2, ... (repeating after 255 elements).
    pub fn primitive_powers() -> impl Iterator<Item = Self> {
        ANTI_LOG.iter().map(|x| GF(*x)).cycle()
    }

    /// Discrete logarithm to the base α.
    pub fn log(self) -> Result<usize, GaloisError> {
        if self.0 == 0 {
            return Err(GaloisError::DivisionByZero);
        }
        Ok(LOG[self.0 as usize] as usize)
    }

    /// The multiplicative inverse, α^(255 - log(self)).
    pub fn inverse(self) -> Result<Self, GaloisError> {
        let i = self.log()?;
        Ok(GF(ANTI_LOG[(255 - i) % 255]))
    }

    pub fn checked_div(self, rhs: Self) -> Result<Self, GaloisError> {
        Ok(self * rhs.inverse()?)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl core::fmt::Debug for GF {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_fmt(format_args!("{}₂₅₆", self.0))
    }
}

impl Add<GF> for GF {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        GF(self.0 ^ rhs.0)
    }
}

impl AddAssign<GF> for GF {
    fn add_assign(&mut self, rhs: GF) {
        *self = *self + rhs;
    }
}

impl Sub<GF> for GF {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self + rhs
    }
}

impl Mul<GF> for GF {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        if self.0 == 0 || rhs.0 == 0 {
            return GF(0);
        }
        let ia = LOG[self.0 as usize] as usize;
        let ib = LOG[rhs.0 as usize] as usize;
        GF(ANTI_LOG[(ia + ib) % 255])
    }
}

impl MulAssign<GF> for GF {
    fn mul_assign(&mut self, rhs: GF) {
        *self = *self * rhs;
    }
}

impl From<GF> for u8 {
    fn from(a: GF) -> u8 {
        a.0
    }
}

impl From<u8> for GF {
    fn from(i: u8) -> Self {
        GF(i)
    }
}

impl Sum for GF {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(GF(0), |a, b| a + b)
    }
}

#[cfg(test)]
use pretty_assertions::assert_eq;

#[test]
fn sanity_check_tables() {
    use alloc::collections::BTreeSet;

    let anti_log: BTreeSet<u8> = ANTI_LOG.iter().cloned().collect();
    assert_eq!(anti_log.len(), ANTI_LOG.len());

    let log: BTreeSet<u8> = LOG[1..].iter().cloned().collect();
    assert_eq!(log.len(), LOG.len() - 1);

    for i in 0..255 {
        assert_eq!(i, LOG[ANTI_LOG[i] as usize] as usize);
        assert_eq!(i + 1, ANTI_LOG[LOG[i + 1] as usize] as usize);
    }
}

#[test]
fn gf256_mul() {
    assert_eq!(GF(123) * GF(1), GF(123));
    assert_eq!(GF(234) * GF(0), GF(0));
    assert_eq!(GF(0) * GF(23), GF(0));
    assert_eq!(GF(2) * GF(4), GF(8));
    assert_eq!(GF(2) * GF(4) * GF(8) * GF(16) * GF(32), GF(38));
    // α^8 wraps around the reduction polynomial
    assert_eq!(GF::primitive_power(8), GF(0x1D));
}

#[test]
fn field_laws() {
    for a in 0..=255u8 {
        let a = GF(a);
        assert_eq!(a + GF::ZERO, a);
        assert_eq!(a * GF::ONE, a);
        assert_eq!(a + a, GF::ZERO);
    }
    let samples = [0u8, 1, 2, 3, 29, 87, 128, 200, 254, 255];
    for a in samples {
        for b in samples {
            for c in samples {
                let (a, b, c) = (GF(a), GF(b), GF(c));
                assert_eq!((a * b) * c, a * (b * c));
                assert_eq!(a * (b + c), a * b + a * c);
            }
        }
    }
}

#[test]
fn inverse() {
    for a in 1..=255 {
        let a = GF(a);
        assert_eq!(a * a.inverse().unwrap(), GF::ONE);
    }
    assert_eq!(GF(0).inverse(), Err(GaloisError::DivisionByZero));
    assert_eq!(GF(5).checked_div(GF(0)), Err(GaloisError::DivisionByZero));
    assert_eq!(GF(0).log(), Err(GaloisError::DivisionByZero));
}

#[test]
fn div_mul() {
    for a in 0..=255 {
        for b in 1..=255 {
            let a_div_b = GF(a).checked_div(GF(b)).unwrap();
            assert_eq!(a_div_b * GF(b), GF(a));
        }
    }
}

#[test]
fn test_power_iterator() {
    let powers: alloc::vec::Vec<GF> = GF::primitive_powers().take(500).collect();
    let mut a = GF(1);
    for (i, p) in powers.into_iter().enumerate() {
        assert_eq!(p, a);
        assert_eq!(GF::primitive_power(i), a);
        a *= GF(2);
    }
}
