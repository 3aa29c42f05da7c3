use core::cmp::{Ord, Ordering, PartialOrd};
use core::convert::From;
use core::fmt::{Debug, Error, Formatter};
use core::ops::{Add, AddAssign};

pub(super) type C = u32;

/// Numeric mode uses 10/3 bits per digit, Alphanumeric 11/2 bits per character.
const DENUM: C = 6;

/// Bit count with a fixed denominator.
#[derive(Copy, Clone, PartialEq, Eq)]
pub(super) struct Frac(C);

impl Debug for Frac {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        let (i, a) = (self.0 / DENUM, self.0 % DENUM);
        if a == 0 {
            f.write_fmt(format_args!("{}", i))
        } else if i == 0 {
            f.write_fmt(format_args!("{}/{}", a, DENUM))
        } else {
            f.write_fmt(format_args!("{} + {}/{}", i, a, DENUM))
        }
    }
}

impl Frac {
    pub const ZERO: Self = Self(0);

    #[inline]
    pub fn new(num: C, denum: C) -> Self {
        debug_assert!(denum > 0 && DENUM % denum == 0);
        Self(num * (DENUM / denum))
    }

    /// Round up to a whole number of bits.
    #[inline]
    pub fn ceil(mut self) -> Self {
        let rest = self.0 % DENUM;
        if rest != 0 {
            self.0 += DENUM - rest;
        }
        self
    }
}

impl From<C> for Frac {
    fn from(c: C) -> Frac {
        Frac::new(c, 1)
    }
}

impl AddAssign<C> for Frac {
    fn add_assign(&mut self, rhs: C) {
        self.0 += rhs * DENUM;
    }
}

impl AddAssign for Frac {
    fn add_assign(&mut self, rhs: Frac) {
        self.0 += rhs.0;
    }
}

impl Add<C> for Frac {
    type Output = Self;

    fn add(mut self, rhs: C) -> Self {
        self += rhs;
        self
    }
}

impl Add for Frac {
    type Output = Self;

    fn add(mut self, rhs: Frac) -> Self {
        self += rhs;
        self
    }
}

impl PartialOrd for Frac {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frac {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

#[test]
fn test_order() {
    assert!(Frac::new(0, 1) < Frac::new(1, 1));
    assert!(Frac::new(1, 2) > Frac::new(1, 3));
}

#[test]
fn test_add() {
    assert_eq!(Frac::new(1, 2) + 1, Frac::new(3, 2));
    assert_eq!(Frac::new(10, 3) + Frac::new(11, 2), Frac::new(53, 6));
}

#[test]
fn test_ceil() {
    // one digit costs 4 bits, two digits 7 bits
    assert_eq!(Frac::new(10, 3).ceil(), Frac::from(4));
    assert_eq!(Frac::new(20, 3).ceil(), Frac::from(7));
    assert_eq!(Frac::new(11, 2).ceil(), Frac::from(6));
    assert_eq!(Frac::from(8).ceil(), Frac::from(8));
}

#[test]
fn test_debug() {
    assert_eq!(format!("{:?}", Frac::new(4, 3)), "1 + 2/6");
    assert_eq!(format!("{:?}", Frac::new(3, 3)), "1");
    assert_eq!(format!("{:?}", Frac::new(1, 2)), "3/6");
}
