//! Coefficient Fields
//!
//! The reducer is generic over the field its columns live in. A field is a
//! small value carrying whatever it needs to do arithmetic (nothing for
//! Z/2Z, the modulus for Z/pZ); matrices hold one and pass it to every
//! column operation.
//!
//! Only fields with exact arithmetic are accepted. Requests for rationals or
//! reals fail at construction with `UnsupportedCoefficient`.

use std::fmt::Debug;

use crate::config::Coefficients;
use crate::error::{Result, VineyardError};

/// Largest modulus accepted for Z/pZ (products stay well inside u64)
pub const MAX_PRIME: u32 = 1 << 16;

/// Exact field arithmetic used by sparse columns
pub trait Field: Clone + Debug {
    type Elem: Copy + Eq + Debug;

    /// Build the field described by a configuration, or explain why not
    fn from_coefficients(coefficients: &Coefficients) -> Result<Self>;

    fn characteristic(&self) -> u32;

    fn zero(&self) -> Self::Elem;
    fn one(&self) -> Self::Elem;
    fn add(&self, a: Self::Elem, b: Self::Elem) -> Self::Elem;
    fn neg(&self, a: Self::Elem) -> Self::Elem;
    fn mul(&self, a: Self::Elem, b: Self::Elem) -> Self::Elem;

    /// Multiplicative inverse of a nonzero element
    fn inv(&self, a: Self::Elem) -> Self::Elem;

    fn is_zero(&self, a: Self::Elem) -> bool {
        a == self.zero()
    }

    fn sub(&self, a: Self::Elem, b: Self::Elem) -> Self::Elem {
        self.add(a, self.neg(b))
    }

    fn div(&self, a: Self::Elem, b: Self::Elem) -> Self::Elem {
        self.mul(a, self.inv(b))
    }

    /// Orientation sign of the k-th face in a boundary: (-1)^k
    fn sign(&self, k: usize) -> Self::Elem {
        if k % 2 == 0 {
            self.one()
        } else {
            self.neg(self.one())
        }
    }
}

/// Z/2Z with XOR arithmetic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinaryField;

impl Field for BinaryField {
    type Elem = bool;

    fn from_coefficients(coefficients: &Coefficients) -> Result<Self> {
        match coefficients {
            Coefficients::Binary | Coefficients::Prime(2) => Ok(BinaryField),
            other => Err(VineyardError::UnsupportedCoefficient(format!(
                "{other:?} requested for a binary reducer"
            ))),
        }
    }

    fn characteristic(&self) -> u32 {
        2
    }

    fn zero(&self) -> bool {
        false
    }

    fn one(&self) -> bool {
        true
    }

    fn add(&self, a: bool, b: bool) -> bool {
        a ^ b
    }

    fn neg(&self, a: bool) -> bool {
        a
    }

    fn mul(&self, a: bool, b: bool) -> bool {
        a & b
    }

    fn inv(&self, a: bool) -> bool {
        debug_assert!(a, "zero has no inverse");
        a
    }
}

/// Z/pZ for a prime p below `MAX_PRIME`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimeField {
    p: u32,
}

impl PrimeField {
    pub fn new(p: u32) -> Result<Self> {
        if p >= MAX_PRIME {
            return Err(VineyardError::UnsupportedCoefficient(format!(
                "modulus {p} exceeds {MAX_PRIME}"
            )));
        }
        if !is_prime(p) {
            return Err(VineyardError::UnsupportedCoefficient(format!(
                "{p} is not prime, Z/{p}Z is not a field"
            )));
        }
        Ok(Self { p })
    }

    pub fn modulus(&self) -> u32 {
        self.p
    }

    /// Embed an integer
    pub fn element(&self, a: i64) -> u32 {
        a.rem_euclid(self.p as i64) as u32
    }
}

impl Field for PrimeField {
    type Elem = u32;

    fn from_coefficients(coefficients: &Coefficients) -> Result<Self> {
        match *coefficients {
            Coefficients::Binary => PrimeField::new(2),
            Coefficients::Prime(p) => PrimeField::new(p),
            Coefficients::Rational | Coefficients::Real => {
                Err(VineyardError::UnsupportedCoefficient(format!(
                    "{coefficients:?} has no exact finite arithmetic"
                )))
            }
        }
    }

    fn characteristic(&self) -> u32 {
        self.p
    }

    fn zero(&self) -> u32 {
        0
    }

    fn one(&self) -> u32 {
        1
    }

    fn add(&self, a: u32, b: u32) -> u32 {
        ((a as u64 + b as u64) % self.p as u64) as u32
    }

    fn neg(&self, a: u32) -> u32 {
        if a == 0 {
            0
        } else {
            self.p - a
        }
    }

    fn mul(&self, a: u32, b: u32) -> u32 {
        ((a as u64 * b as u64) % self.p as u64) as u32
    }

    fn inv(&self, a: u32) -> u32 {
        debug_assert!(a != 0, "zero has no inverse");
        // Extended Euclid on (a, p)
        let (mut r0, mut r1) = (self.p as i64, a as i64);
        let (mut t0, mut t1) = (0i64, 1i64);
        while r1 != 0 {
            let q = r0 / r1;
            (r0, r1) = (r1, r0 - q * r1);
            (t0, t1) = (t1, t0 - q * t1);
        }
        self.element(t0)
    }
}

fn is_prime(p: u32) -> bool {
    if p < 2 {
        return false;
    }
    let mut d = 2u32;
    while d * d <= p {
        if p % d == 0 {
            return false;
        }
        d += 1;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_arithmetic() {
        let f = BinaryField;
        assert!(!f.add(true, true));
        assert!(f.sub(false, true));
        assert!(f.sign(1));
        assert!(f.div(true, true));
    }

    #[test]
    fn test_prime_inverses() {
        let f = PrimeField::new(7).unwrap();
        for a in 1..7 {
            assert_eq!(f.mul(a, f.inv(a)), 1, "inverse of {a}");
        }
        assert_eq!(f.neg(3), 4);
        assert_eq!(f.sign(3), 6);
        assert_eq!(f.element(-1), 6);
    }

    #[test]
    fn test_unsupported_fields() {
        assert!(matches!(
            PrimeField::new(9),
            Err(VineyardError::UnsupportedCoefficient(_))
        ));
        assert!(PrimeField::new(1).is_err());
        assert!(PrimeField::new(65537).is_err());
        assert!(PrimeField::from_coefficients(&Coefficients::Rational).is_err());
        assert!(BinaryField::from_coefficients(&Coefficients::Prime(3)).is_err());
        assert!(BinaryField::from_coefficients(&Coefficients::Real).is_err());
        assert_eq!(
            PrimeField::from_coefficients(&Coefficients::Binary).unwrap().modulus(),
            2
        );
    }
}
