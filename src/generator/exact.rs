//! Generators of exact values for algebraic-law sampling.
//!
//! Values have a random bit width up to a bound, so small and large operands
//! are both common. With the configured edge-case probability a curated
//! boundary value is returned instead.

use num_bigint::{BigInt, BigUint, Sign};
use rand::Rng;
use rand_chacha::ChaCha20Rng;
use tracing::debug;

use crate::error::{Error, Result};
use crate::exact::{BigFloat, Rational};
use crate::generator::{Generator, SeedBank, Stream};

const EDGE_INTEGERS: [i32; 7] = [0, 1, -1, 2, -2, 10, -10];
const EDGE_FRACTIONS: [(i32, u32); 3] = [(1, 2), (-1, 2), (1, 10)];

/// Magnitude of a random width in `1..=max_bits`.
fn random_magnitude(rng: &mut ChaCha20Rng, max_bits: u64) -> BigUint {
    let bits = rng.random_range(1..=max_bits);
    let mut words: Vec<u32> = (0..bits.div_ceil(32)).map(|_| rng.random()).collect();
    let spare = (words.len() as u64 * 32 - bits) as u32;
    if let Some(top) = words.last_mut() {
        *top >>= spare;
    }
    BigUint::new(words)
}

fn random_sign(rng: &mut ChaCha20Rng) -> Sign {
    if rng.random::<bool>() { Sign::Minus } else { Sign::Plus }
}

fn check_bits(max_bits: u64) -> Result<u64> {
    if max_bits == 0 {
        return Err(Error::Domain("bit width bound must be positive".into()));
    }
    Ok(max_bits)
}

/// Shared edge-case switch.
#[derive(Debug, Clone)]
struct EdgeCases {
    probability: f64,
}

impl EdgeCases {
    fn new(bank: &SeedBank) -> Self {
        Self {
            probability: bank.edge_case_probability(),
        }
    }

    fn integer(&self, rng: &mut ChaCha20Rng) -> Option<BigInt> {
        rng.random_bool(self.probability)
            .then(|| BigInt::from(EDGE_INTEGERS[rng.random_range(0..EDGE_INTEGERS.len())]))
    }
}

/// Signed integers of at most `max_bits` bits.
#[derive(Debug, Clone)]
pub struct IntegerGenerator {
    rng: ChaCha20Rng,
    max_bits: u64,
    edges: EdgeCases,
}

impl IntegerGenerator {
    /// # Errors
    ///
    /// [`Error::Domain`] when `max_bits` is zero, or any error from
    /// [`SeedBank::next_rng`].
    pub fn new(bank: &mut SeedBank, max_bits: u64) -> Result<Self> {
        let max_bits = check_bits(max_bits)?;
        debug!(max_bits, "created integer generator");
        Ok(Self {
            rng: bank.next_rng()?,
            max_bits,
            edges: EdgeCases::new(bank),
        })
    }
}

impl Stream for IntegerGenerator {
    fn rng(&mut self) -> &mut ChaCha20Rng {
        &mut self.rng
    }
}

impl Generator for IntegerGenerator {
    type Output = BigInt;

    fn name(&self) -> &str {
        "integer"
    }

    fn sample(&mut self) -> BigInt {
        if let Some(edge) = self.edges.integer(&mut self.rng) {
            return edge;
        }
        let sign = random_sign(&mut self.rng);
        BigInt::from_biguint(sign, random_magnitude(&mut self.rng, self.max_bits))
    }

}

/// Rationals whose numerator and denominator have at most `max_bits` bits.
#[derive(Debug, Clone)]
pub struct RationalGenerator {
    rng: ChaCha20Rng,
    max_bits: u64,
    edges: EdgeCases,
}

impl RationalGenerator {
    /// # Errors
    ///
    /// [`Error::Domain`] when `max_bits` is zero, or any error from
    /// [`SeedBank::next_rng`].
    pub fn new(bank: &mut SeedBank, max_bits: u64) -> Result<Self> {
        let max_bits = check_bits(max_bits)?;
        debug!(max_bits, "created rational generator");
        Ok(Self {
            rng: bank.next_rng()?,
            max_bits,
            edges: EdgeCases::new(bank),
        })
    }

    fn edge(&mut self) -> Option<Rational> {
        if !self.rng.random_bool(self.edges.probability) {
            return None;
        }
        let index = self
            .rng
            .random_range(0..EDGE_INTEGERS.len() + EDGE_FRACTIONS.len());
        let (numer, denom) = match EDGE_INTEGERS.get(index) {
            Some(&integer) => (integer, 1),
            None => EDGE_FRACTIONS[index - EDGE_INTEGERS.len()],
        };
        Some(Rational::from_positive(BigInt::from(numer), BigUint::from(denom)))
    }
}

impl Stream for RationalGenerator {
    fn rng(&mut self) -> &mut ChaCha20Rng {
        &mut self.rng
    }
}

impl Generator for RationalGenerator {
    type Output = Rational;

    fn name(&self) -> &str {
        "rational"
    }

    fn sample(&mut self) -> Rational {
        if let Some(edge) = self.edge() {
            return edge;
        }
        let sign = random_sign(&mut self.rng);
        let numer = BigInt::from_biguint(sign, random_magnitude(&mut self.rng, self.max_bits));
        let denom = random_magnitude(&mut self.rng, self.max_bits);
        let denom = if denom.bits() == 0 { BigUint::from(1u8) } else { denom };
        Rational::from_positive(numer, denom)
    }

}

/// BigFloats with a significand of at most `max_bits` bits and an exponent in
/// `[-max_exponent, max_exponent]`.
#[derive(Debug, Clone)]
pub struct BigFloatGenerator {
    rng: ChaCha20Rng,
    max_bits: u64,
    max_exponent: i64,
    edges: EdgeCases,
}

impl BigFloatGenerator {
    /// # Errors
    ///
    /// [`Error::Domain`] when `max_bits` is zero or `max_exponent` is negative,
    /// or any error from [`SeedBank::next_rng`].
    pub fn new(bank: &mut SeedBank, max_bits: u64, max_exponent: i64) -> Result<Self> {
        let max_bits = check_bits(max_bits)?;
        if max_exponent < 0 {
            return Err(Error::Domain(format!(
                "exponent bound must be non-negative, got {max_exponent}"
            )));
        }
        debug!(max_bits, max_exponent, "created big-float generator");
        Ok(Self {
            rng: bank.next_rng()?,
            max_bits,
            max_exponent,
            edges: EdgeCases::new(bank),
        })
    }
}

impl Stream for BigFloatGenerator {
    fn rng(&mut self) -> &mut ChaCha20Rng {
        &mut self.rng
    }
}

impl Generator for BigFloatGenerator {
    type Output = BigFloat;

    fn name(&self) -> &str {
        "big-float"
    }

    fn sample(&mut self) -> BigFloat {
        if let Some(edge) = self.edges.integer(&mut self.rng) {
            return BigFloat::from_signed(edge, 0);
        }
        let sign = random_sign(&mut self.rng) == Sign::Minus;
        let significand = random_magnitude(&mut self.rng, self.max_bits);
        let exponent = self.rng.random_range(-self.max_exponent..=self.max_exponent);
        BigFloat::from_parts(sign, significand, exponent)
    }

}
