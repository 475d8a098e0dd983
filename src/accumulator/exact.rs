use crate::accumulator::{Accumulator, ExactAccumulator};
use crate::error::{Error, Result};
use crate::exact::{BigFloat, ExactValue, Rational};

/// Lossless running sum over any [`ExactValue`].
///
/// Every input is converted exactly and every product is formed exactly, so the
/// only rounding happens in [`Accumulator::double_value`].
#[derive(Debug, Clone)]
pub struct ExactSum<N: ExactValue> {
    total: N,
}

pub type BigFloatAccumulator = ExactSum<BigFloat>;
pub type RationalAccumulator = ExactSum<Rational>;

impl<N: ExactValue> ExactSum<N> {
    pub fn new() -> Self {
        Self { total: N::zero() }
    }

    /// Adds an exact value directly, skipping the double conversion.
    pub fn add_value(&mut self, value: &N) -> &mut Self {
        self.total = self.total.plus(value);
        self
    }

    fn lift(operation: &str, value: f64) -> Result<N> {
        if value.is_finite() {
            N::from_f64(value)
        } else {
            Err(Error::non_finite(operation, value))
        }
    }
}

impl<N: ExactValue> Default for ExactSum<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: ExactValue> Accumulator for ExactSum<N> {
    fn name(&self) -> &'static str {
        N::NAME
    }

    fn is_exact(&self) -> bool {
        true
    }

    fn no_overflow(&self) -> bool {
        true
    }

    fn clear(&mut self) -> &mut Self {
        self.total = N::zero();
        self
    }

    fn add(&mut self, value: f64) -> Result<&mut Self> {
        let value = Self::lift("add", value)?;
        Ok(self.add_value(&value))
    }

    fn add_product(&mut self, x: f64, y: f64) -> Result<&mut Self> {
        let x = Self::lift("add_product", x)?;
        let y = Self::lift("add_product", y)?;
        self.total = x.mul_add(&y, &self.total);
        Ok(self)
    }

    fn double_value(&self) -> f64 {
        self.total.to_f64()
    }
}

impl<N: ExactValue> ExactAccumulator for ExactSum<N> {
    type Value = N;

    fn value(&self) -> N {
        self.total.clone()
    }
}
