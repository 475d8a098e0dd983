//! Exact rationals backed by [`num_rational::BigRational`].
//!
//! Every finite double is a dyadic rational, so sums and products of doubles
//! stay dyadic and convert back to [`BigFloat`] without loss. General rationals
//! (from [`Rational::from_ratio`] or [`Rational::reciprocal`]) round only in
//! [`ExactValue::to_f64`].

use std::fmt::{self, Debug};
use std::ops::{Add, Mul, Neg, Sub};

use num_bigint::{BigInt, BigUint, Sign};
use num_rational::BigRational;
use num_traits::{One, Zero};

use crate::error::{Error, Result};
use crate::exact::converter::round_quotient;
use crate::exact::{BigFloat, ExactValue};

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rational(BigRational);

impl Rational {
    /// Builds `numer / denom` in lowest terms.
    ///
    /// # Errors
    ///
    /// [`Error::Domain`] when `denom` is zero.
    pub fn from_ratio(numer: impl Into<BigInt>, denom: impl Into<BigInt>) -> Result<Self> {
        let denom = denom.into();
        if denom.is_zero() {
            return Err(Error::Domain("rational with a zero denominator".into()));
        }
        Ok(Self(BigRational::new(numer.into(), denom)))
    }

    /// `numer / denom` for a denominator already known to be non-zero.
    pub(crate) fn from_positive(numer: BigInt, denom: BigUint) -> Self {
        debug_assert!(!denom.is_zero());
        Self(BigRational::new(numer, BigInt::from(denom)))
    }

    pub fn numer(&self) -> &BigInt {
        self.0.numer()
    }

    /// Always positive.
    pub fn denom(&self) -> &BigInt {
        self.0.denom()
    }

    /// # Errors
    ///
    /// [`Error::Domain`] for the reciprocal of zero.
    pub fn reciprocal(&self) -> Result<Self> {
        if self.0.is_zero() {
            return Err(Error::Domain("reciprocal of zero".into()));
        }
        Ok(Self(self.0.recip()))
    }

    pub fn as_ratio(&self) -> &BigRational {
        &self.0
    }
}

impl Debug for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rational({}/{})", self.numer(), self.denom())
    }
}

impl From<BigInt> for Rational {
    fn from(value: BigInt) -> Self {
        Self(BigRational::from_integer(value))
    }
}

impl From<&BigFloat> for Rational {
    fn from(value: &BigFloat) -> Self {
        let signed = value.signed();
        let exponent = value.exponent();
        if exponent >= 0 {
            Self(BigRational::from_integer(signed << exponent as u64))
        } else {
            let denom = BigInt::one() << exponent.unsigned_abs();
            Self(BigRational::new(signed, denom))
        }
    }
}

impl TryFrom<&Rational> for BigFloat {
    type Error = Error;

    /// Succeeds exactly when the denominator is a power of two.
    fn try_from(value: &Rational) -> Result<Self> {
        let denom = value.denom().magnitude();
        let power = denom.bits() - 1;
        if denom.trailing_zeros() != Some(power) {
            return Err(Error::Domain(format!("{value:?} is not a dyadic rational")));
        }
        Ok(BigFloat::from_signed(value.numer().clone(), -(power as i64)))
    }
}

impl ExactValue for Rational {
    const NAME: &'static str = "rational";

    fn zero() -> Self {
        Self(BigRational::zero())
    }

    fn one() -> Self {
        Self(BigRational::one())
    }

    fn from_f64(value: f64) -> Result<Self> {
        Ok(Self::from(&BigFloat::from_f64(value)?))
    }

    fn to_f64(&self) -> f64 {
        let numer = self.numer();
        round_quotient(
            numer.sign() == Sign::Minus,
            numer.magnitude(),
            self.denom().magnitude(),
            0,
        )
    }

    fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    fn plus(&self, other: &Self) -> Self {
        Self(&self.0 + &other.0)
    }

    fn times(&self, other: &Self) -> Self {
        Self(&self.0 * &other.0)
    }

    fn negated(&self) -> Self {
        Self(-&self.0)
    }

    fn minus(&self, other: &Self) -> Self {
        Self(&self.0 - &other.0)
    }
}

macro_rules! impl_binary_op {
    ($op:ident, $method:ident) => {
        impl $op<&Rational> for &Rational {
            type Output = Rational;

            fn $method(self, rhs: &Rational) -> Rational {
                Rational((&self.0).$method(&rhs.0))
            }
        }

        impl $op for Rational {
            type Output = Rational;

            fn $method(self, rhs: Rational) -> Rational {
                Rational(self.0.$method(rhs.0))
            }
        }
    };
}

impl_binary_op!(Add, add);
impl_binary_op!(Sub, sub);
impl_binary_op!(Mul, mul);

impl Neg for Rational {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Neg for &Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        Rational(-&self.0)
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;
    use rstest::rstest;

    use super::*;
    use crate::tests::*;

    #[rstest]
    fn test_round_trip(mut rng: impl Rng, n_experiments: usize) {
        for value in [0.0, 1.0, -1.0, f64::MAX, f64::MIN, f64::from_bits(1), f64::MIN_POSITIVE] {
            assert_eq!(Rational::from_f64(value).unwrap().to_f64(), value);
        }
        for _ in 0..n_experiments {
            let value = random_f64(&mut rng);
            let exact = Rational::from_f64(value).unwrap();
            assert_eq!(exact.to_f64().to_bits(), value.to_bits());
            assert_eq!(BigFloat::try_from(&exact).unwrap().to_f64(), value);
        }
    }

    #[rstest]
    fn test_from_ratio() {
        let third = Rational::from_ratio(1, 3).unwrap();
        assert_eq!(third.to_f64(), 1.0 / 3.0);
        assert_eq!(Rational::from_ratio(-2, 4).unwrap().to_f64(), -0.5);
        assert!(matches!(Rational::from_ratio(1, 0), Err(Error::Domain(_))));
        assert!(BigFloat::try_from(&third).is_err());
        assert_eq!(third.times(&Rational::from_ratio(3, 1).unwrap()), Rational::one());
    }

    #[rstest]
    fn test_operators_and_sign() {
        let a = Rational::from_ratio(3, 4).unwrap();
        let b = Rational::from_ratio(-1, 4).unwrap();
        assert_eq!(&a + &b, Rational::from_ratio(1, 2).unwrap());
        assert_eq!(&a - &b, Rational::one());
        assert_eq!(a.clone() * b.clone(), Rational::from_ratio(-3, 16).unwrap());
        assert_eq!(-&b, Rational::from_ratio(1, 4).unwrap());
        assert_eq!(b.signum(), -1);
        assert_eq!(Rational::zero().signum(), 0);
        assert_eq!(b.abs(), -b);
    }

    #[rstest]
    fn test_reciprocal() {
        let value = Rational::from_ratio(-3, 7).unwrap();
        let inverse = value.reciprocal().unwrap();
        assert_eq!(inverse, Rational::from_ratio(7, -3).unwrap());
        assert_eq!(value.times(&inverse), Rational::one());
        assert!(Rational::zero().reciprocal().is_err());
    }

    #[rstest]
    fn test_agrees_with_big_float(mut rng: impl Rng, n_experiments: usize) {
        for _ in 0..n_experiments / 10 {
            let a = random_f64(&mut rng);
            let b = random_f64(&mut rng);
            let c = random_f64(&mut rng);
            let rational = Rational::from_f64(a)
                .unwrap()
                .mul_add(&Rational::from_f64(b).unwrap(), &Rational::from_f64(c).unwrap());
            let big_float = BigFloat::from_f64(a)
                .unwrap()
                .mul_add(&BigFloat::from_f64(b).unwrap(), &BigFloat::from_f64(c).unwrap());
            assert_eq!(rational.to_f64().to_bits(), big_float.to_f64().to_bits());
            assert_eq!(BigFloat::try_from(&rational).unwrap(), big_float);
        }
    }
}
