use crate::accumulator::Accumulator;
use crate::error::Result;

/// Kahan–Babuška–Neumaier compensated sum.
///
/// A running correction collects the low-order bits lost by each addition and is
/// folded back in by [`Accumulator::double_value`]. Products are split into a
/// rounded product and its exact error with one fused multiply-add, and both
/// halves are compensated.
///
/// Once the running sum saturates, the correction is meaningless and the sum
/// alone is reported, so `{MAX, MAX}` yields `+inf` rather than NaN.
#[derive(Debug, Clone, Default)]
pub struct KahanAccumulator {
    sum: f64,
    compensation: f64,
}

impl KahanAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    fn accumulate(&mut self, value: f64) {
        let total = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - total) + value;
        } else {
            self.compensation += (value - total) + self.sum;
        }
        self.sum = total;
    }
}

impl Accumulator for KahanAccumulator {
    fn name(&self) -> &'static str {
        "kahan"
    }

    fn is_exact(&self) -> bool {
        false
    }

    fn no_overflow(&self) -> bool {
        false
    }

    fn clear(&mut self) -> &mut Self {
        self.sum = 0.0;
        self.compensation = 0.0;
        self
    }

    fn add(&mut self, value: f64) -> Result<&mut Self> {
        self.accumulate(value);
        Ok(self)
    }

    fn add_product(&mut self, x: f64, y: f64) -> Result<&mut Self> {
        let product = x * y;
        self.accumulate(product);
        if product.is_finite() {
            self.accumulate(x.mul_add(y, -product));
        }
        Ok(self)
    }

    fn double_value(&self) -> f64 {
        if self.sum.is_finite() {
            self.sum + self.compensation
        } else {
            self.sum
        }
    }
}
