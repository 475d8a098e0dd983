use std::ops::{Add, Mul, Neg, Sub};

use num_bigint::BigInt;
use num_traits::Zero;

use crate::exact::{BigFloat, ExactValue};

/// Exact sum: both significands are aligned to the smaller exponent first.
pub(crate) fn add(lhs: &BigFloat, rhs: &BigFloat) -> BigFloat {
    if lhs.significand.is_zero() {
        return rhs.clone();
    }
    if rhs.significand.is_zero() {
        return lhs.clone();
    }

    let exponent = lhs.exponent.min(rhs.exponent);
    BigFloat::from_signed(aligned(lhs, exponent) + aligned(rhs, exponent), exponent)
}

pub(crate) fn mul(lhs: &BigFloat, rhs: &BigFloat) -> BigFloat {
    BigFloat::from_parts(
        lhs.sign != rhs.sign,
        &lhs.significand * &rhs.significand,
        lhs.exponent + rhs.exponent,
    )
}

pub(crate) fn neg(value: &BigFloat) -> BigFloat {
    if value.significand.is_zero() {
        return value.clone();
    }
    BigFloat {
        sign: !value.sign,
        significand: value.significand.clone(),
        exponent: value.exponent,
    }
}

fn aligned(value: &BigFloat, exponent: i64) -> BigInt {
    value.signed() << (value.exponent - exponent) as u64
}

impl BigFloat {
    pub fn abs(&self) -> Self {
        Self {
            sign: false,
            significand: self.significand.clone(),
            exponent: self.exponent,
        }
    }
}

macro_rules! impl_binary_op {
    ($op:ident, $method:ident, $exact:ident) => {
        impl $op<&BigFloat> for &BigFloat {
            type Output = BigFloat;

            fn $method(self, rhs: &BigFloat) -> BigFloat {
                ExactValue::$exact(self, rhs)
            }
        }

        impl $op for BigFloat {
            type Output = BigFloat;

            fn $method(self, rhs: BigFloat) -> BigFloat {
                ExactValue::$exact(&self, &rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, plus);
impl_binary_op!(Sub, sub, minus);
impl_binary_op!(Mul, mul, times);

impl Neg for BigFloat {
    type Output = Self;

    fn neg(self) -> Self::Output {
        neg(&self)
    }
}

impl Neg for &BigFloat {
    type Output = BigFloat;

    fn neg(self) -> Self::Output {
        neg(self)
    }
}

#[cfg(test)]
mod tests {
    use num_bigint::BigUint;
    use rand::Rng;
    use rstest::rstest;

    use super::*;
    use crate::tests::*;

    fn exact(value: f64) -> BigFloat {
        BigFloat::from_f64(value).unwrap()
    }

    #[rstest]
    fn test_add_is_exact(mut rng: impl Rng, n_experiments: usize) {
        assert_eq!((exact(1e300) + exact(1e-300) - exact(1e300)), exact(1e-300));

        for _ in 0..n_experiments {
            let a = random_f64(&mut rng);
            let b = random_f64(&mut rng);
            let sum = exact(a) + exact(b);
            // Native addition is the correctly rounded image of the exact sum
            assert_eq!(sum.to_f64(), a + b, "{a:e} + {b:e}");
            assert_eq!(&sum - &exact(b), exact(a));
        }
    }

    #[rstest]
    fn test_mul_add_matches_native_fma(mut rng: impl Rng, n_experiments: usize) {
        for _ in 0..n_experiments {
            let a: f64 = rng.random_range(-1e100..1e100);
            let b: f64 = rng.random_range(-1e100..1e100);
            let c = random_f64(&mut rng);
            let fused = exact(a).mul_add(&exact(b), &exact(c));
            assert_eq!(fused.to_f64(), a.mul_add(b, c), "fma({a:e}, {b:e}, {c:e})");
            assert_eq!((exact(a) * exact(b)).to_f64(), a * b);
        }
    }

    #[rstest]
    fn test_neg() {
        let value = exact(2.5);
        assert_eq!((-&value).to_f64(), -2.5);
        assert_eq!(-(-value.clone()), value);
        assert_eq!(-BigFloat::new_zero(), BigFloat::new_zero());
        assert_eq!(exact(-7.0).abs(), exact(7.0));
    }

    #[rstest]
    fn test_width_grows() {
        let big = BigFloat::from_parts(false, BigUint::from(1u8), 5000);
        let small = BigFloat::from_parts(false, BigUint::from(1u8), -5000);
        let sum = &big + &small;
        assert_eq!(sum.significand().bits(), 10001);
        assert_eq!(sum.exponent(), -5000);
        assert_eq!(&sum - &big, small);
    }
}
