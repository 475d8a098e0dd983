//! # Conversion Utilities
//!
//! Conversion between [`BigFloat`] and IEEE 754 double-precision floats.
//!
//! ## IEEE 754 Layout
//!
//! ```text
//! [Sign: 1 bit][Exponent: 11 bits][Fraction: 52 bits]
//! Bit:  63      62           52   51            0
//! ```
//!
//! Reading a double is exact for every finite value, subnormals included.
//! Writing one rounds half to even at the 53-bit (or subnormal) boundary and
//! overflows to a signed infinity past `f64::MAX + ulp/2`, exactly like native
//! arithmetic does.
//!
//! ```rust
//! use exactsum::BigFloat;
//!
//! let original = 3.141592653589793;
//! let exact = BigFloat::from_f64(original).unwrap();
//! assert_eq!(exact.to_f64(), original);
//! assert!(BigFloat::from_f64(f64::NAN).is_err());
//! ```

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};

use crate::error::{Error, Result};
use crate::exact::BigFloat;

const FRACTION_BITS: u32 = 52;
const FRACTION_MASK: u64 = (1 << FRACTION_BITS) - 1;
const EXPONENT_MASK: u64 = 0x7ff;
/// Unbiased exponent of `f64::MAX`.
const MAX_EXPONENT: i64 = 1023;
/// Weight of the least significant bit of a subnormal.
const MIN_LSB_EXPONENT: i64 = -1074;
const EXPONENT_BIAS: i64 = 1075;

impl BigFloat {
    /// Creates a BigFloat holding exactly the value of an IEEE 754 double.
    ///
    /// # Errors
    ///
    /// [`Error::Domain`] when `value` is NaN or infinite.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use exactsum::BigFloat;
    ///
    /// let exact = BigFloat::from_f64(2.5).unwrap();
    /// assert_eq!(exact.exponent(), -1);
    /// assert_eq!(exact.significand(), &5u8.into());
    /// ```
    pub fn from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(Error::non_finite("BigFloat::from_f64", value));
        }
        Ok(Self::from_finite(value))
    }

    /// Decodes a double already known to be finite.
    pub(crate) fn from_finite(value: f64) -> Self {
        debug_assert!(value.is_finite());
        let bits = value.to_bits();
        let sign = bits >> 63 == 1;
        let biased = ((bits >> FRACTION_BITS) & EXPONENT_MASK) as i64;
        let fraction = bits & FRACTION_MASK;

        let (significand, exponent) = if biased == 0 {
            (fraction, MIN_LSB_EXPONENT)
        } else {
            (fraction | (1 << FRACTION_BITS), biased - EXPONENT_BIAS)
        };
        Self::from_parts(sign, BigUint::from(significand), exponent)
    }

    /// Rounds this value to the nearest double, ties to even.
    pub fn to_f64(&self) -> f64 {
        round_quotient(
            self.is_negative(),
            self.significand(),
            &BigUint::one(),
            self.exponent(),
        )
    }
}

impl TryFrom<f64> for BigFloat {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self> {
        Self::from_f64(value)
    }
}

impl From<&BigFloat> for f64 {
    fn from(value: &BigFloat) -> Self {
        value.to_f64()
    }
}

impl From<BigFloat> for f64 {
    fn from(value: BigFloat) -> Self {
        value.to_f64()
    }
}

/// Rounds `±(numer / denom) × 2^exponent` to the nearest double, ties to even.
///
/// `denom` must be non-zero. An exactly zero quotient is `+0.0`; a non-zero
/// quotient too small for the subnormal range keeps its sign.
pub(crate) fn round_quotient(
    negative: bool,
    numer: &BigUint,
    denom: &BigUint,
    exponent: i64,
) -> f64 {
    if numer.is_zero() {
        return 0.0;
    }

    // Position of the leading bit: 2^lead <= numer/denom * 2^exponent < 2^(lead+1)
    let shift = numer.bits() as i64 - denom.bits() as i64;
    let reaches = if shift >= 0 {
        *numer >= denom << shift as u64
    } else {
        numer << shift.unsigned_abs() >= *denom
    };
    let lead = exponent + shift - i64::from(!reaches);

    if lead > MAX_EXPONENT {
        return signed(negative, f64::INFINITY);
    }
    // Below half of the smallest subnormal
    if lead < MIN_LSB_EXPONENT - 1 {
        return signed(negative, 0.0);
    }

    let lsb = (lead - FRACTION_BITS as i64).max(MIN_LSB_EXPONENT);
    let scale = exponent - lsb;
    let (scaled_numer, scaled_denom) = if scale >= 0 {
        (numer << scale as u64, denom.clone())
    } else {
        (numer.clone(), denom << scale.unsigned_abs())
    };

    let (mut quotient, remainder) = scaled_numer.div_rem(&scaled_denom);
    let twice = remainder << 1u8;
    if twice > scaled_denom || (twice == scaled_denom && quotient.bit(0)) {
        quotient += 1u8;
    }

    // The quotient holds at most 54 bits, so its low digit is the whole value
    let mantissa = quotient.iter_u64_digits().next().unwrap_or(0);
    compose(negative, mantissa, lsb)
}

fn compose(negative: bool, mut mantissa: u64, mut lsb: i64) -> f64 {
    if mantissa == 1 << (FRACTION_BITS + 1) {
        mantissa >>= 1;
        lsb += 1;
    }
    if lsb + FRACTION_BITS as i64 > MAX_EXPONENT {
        return signed(negative, f64::INFINITY);
    }

    let bits = if mantissa < 1 << FRACTION_BITS {
        // Subnormal: lsb is the minimum exponent and the biased field is zero
        mantissa
    } else {
        ((lsb + EXPONENT_BIAS) as u64) << FRACTION_BITS | (mantissa & FRACTION_MASK)
    };
    signed(negative, f64::from_bits(bits))
}

fn signed(negative: bool, magnitude: f64) -> f64 {
    if negative { -magnitude } else { magnitude }
}
