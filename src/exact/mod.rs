//! # Exact values
//!
//! Arbitrary-precision numbers used as ground truth for every accumulator and
//! evaluator in the crate. Nothing in this module rounds except the final
//! conversion back to `f64`.
//!
//! Two representations are provided:
//! - [`BigFloat`]: `sign × significand × 2^exponent` with an unbounded significand
//! - [`Rational`]: an unbounded numerator/denominator pair
//!
//! Both implement [`ExactValue`], so accumulators and polynomial evaluators can be
//! written once and instantiated over either.
//!
//! ```rust
//! use exactsum::prelude::*;
//!
//! let a = BigFloat::from_f64(f64::MAX).unwrap();
//! let b = a.plus(&a).minus(&a);
//! assert_eq!(b.to_f64(), f64::MAX);
//! ```

use std::cmp::Ordering;
use std::fmt::{self, Debug};

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};

use crate::error::Result;

pub mod arithmetic;
pub mod cmp;
pub mod converter;
pub mod rational;

pub use rational::Rational;

/// Exact numeric operations shared by all ground-truth representations.
///
/// Implementations never round: `plus`, `times` and `mul_add` return values whose
/// width grows with their operands. Only [`ExactValue::to_f64`] rounds, half to even.
pub trait ExactValue: Clone + Debug + Ord {
    /// Family name used in reports and error messages.
    const NAME: &'static str;

    fn zero() -> Self;

    fn one() -> Self;

    /// Exact conversion of a finite double; NaN and infinities are a domain error.
    fn from_f64(value: f64) -> Result<Self>;

    /// Nearest double, ties to even, overflowing to a signed infinity.
    fn to_f64(&self) -> f64;

    fn is_zero(&self) -> bool;

    fn plus(&self, other: &Self) -> Self;

    fn times(&self, other: &Self) -> Self;

    fn negated(&self) -> Self;

    fn minus(&self, other: &Self) -> Self {
        self.plus(&other.negated())
    }

    /// `self * b + c` without intermediate rounding.
    fn mul_add(&self, b: &Self, c: &Self) -> Self {
        self.times(b).plus(c)
    }

    /// `-1`, `0` or `1`.
    fn signum(&self) -> i8 {
        match self.cmp(&Self::zero()) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }
    }

    fn abs(&self) -> Self {
        if self.signum() < 0 { self.negated() } else { self.clone() }
    }
}

/// Exact binary floating-point number `(-1)^sign × significand × 2^exponent`.
///
/// The significand is kept odd (or zero, with a cleared sign and a zero exponent),
/// so two values are equal exactly when their representations are equal.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BigFloat {
    sign: bool,
    significand: BigUint,
    exponent: i64,
}

impl BigFloat {
    pub fn from_parts(sign: bool, significand: BigUint, exponent: i64) -> Self {
        match significand.trailing_zeros() {
            None => Self::new_zero(),
            Some(0) => Self {
                sign,
                significand,
                exponent,
            },
            Some(shift) => Self {
                sign,
                significand: significand >> shift,
                exponent: exponent + shift as i64,
            },
        }
    }

    pub(crate) fn from_signed(value: BigInt, exponent: i64) -> Self {
        let (sign, magnitude) = value.into_parts();
        Self::from_parts(sign == Sign::Minus, magnitude, exponent)
    }

    pub fn new_zero() -> Self {
        Self {
            sign: false,
            significand: BigUint::zero(),
            exponent: 0,
        }
    }

    pub fn new_one() -> Self {
        Self {
            sign: false,
            significand: BigUint::one(),
            exponent: 0,
        }
    }

    pub fn is_negative(&self) -> bool {
        self.sign
    }

    pub fn significand(&self) -> &BigUint {
        &self.significand
    }

    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    /// Signed significand, `significand` negated when the sign is set.
    pub(crate) fn signed(&self) -> BigInt {
        let sign = if self.sign { Sign::Minus } else { Sign::Plus };
        BigInt::from_biguint(sign, self.significand.clone())
    }
}

impl Default for BigFloat {
    fn default() -> Self {
        Self::new_zero()
    }
}

impl Debug for BigFloat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BigFloat")
            .field("sign", if self.sign { &'-' } else { &'+' })
            .field("significand", &self.significand)
            .field("exponent", &self.exponent)
            .finish()
    }
}

impl ExactValue for BigFloat {
    const NAME: &'static str = "big-float";

    fn zero() -> Self {
        Self::new_zero()
    }

    fn one() -> Self {
        Self::new_one()
    }

    fn from_f64(value: f64) -> Result<Self> {
        BigFloat::from_f64(value)
    }

    fn to_f64(&self) -> f64 {
        BigFloat::to_f64(self)
    }

    fn is_zero(&self) -> bool {
        self.significand.is_zero()
    }

    fn plus(&self, other: &Self) -> Self {
        arithmetic::add(self, other)
    }

    fn times(&self, other: &Self) -> Self {
        arithmetic::mul(self, other)
    }

    fn negated(&self) -> Self {
        arithmetic::neg(self)
    }
}
