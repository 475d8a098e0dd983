use crate::accumulator::Accumulator;
use crate::error::Result;

/// Plain running sum: every add and product is one rounded double operation.
#[derive(Debug, Clone, Default)]
pub struct DoubleAccumulator {
    sum: f64,
}

impl DoubleAccumulator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Accumulator for DoubleAccumulator {
    fn name(&self) -> &'static str {
        "double"
    }

    fn is_exact(&self) -> bool {
        false
    }

    fn no_overflow(&self) -> bool {
        false
    }

    fn clear(&mut self) -> &mut Self {
        self.sum = 0.0;
        self
    }

    fn add(&mut self, value: f64) -> Result<&mut Self> {
        self.sum += value;
        Ok(self)
    }

    fn add_product(&mut self, x: f64, y: f64) -> Result<&mut Self> {
        self.sum += x * y;
        Ok(self)
    }

    fn double_value(&self) -> f64 {
        self.sum
    }
}

/// Running sum whose products are folded in with a single fused multiply-add,
/// saving the rounding of the product.
#[derive(Debug, Clone, Default)]
pub struct DoubleFmaAccumulator {
    sum: f64,
}

impl DoubleFmaAccumulator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Accumulator for DoubleFmaAccumulator {
    fn name(&self) -> &'static str {
        "double-fma"
    }

    fn is_exact(&self) -> bool {
        false
    }

    fn no_overflow(&self) -> bool {
        false
    }

    fn clear(&mut self) -> &mut Self {
        self.sum = 0.0;
        self
    }

    fn add(&mut self, value: f64) -> Result<&mut Self> {
        self.sum += value;
        Ok(self)
    }

    fn add_product(&mut self, x: f64, y: f64) -> Result<&mut Self> {
        self.sum = x.mul_add(y, self.sum);
        Ok(self)
    }

    fn double_value(&self) -> f64 {
        self.sum
    }
}
