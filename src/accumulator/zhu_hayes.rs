//! Bounded-width exact accumulation.
//!
//! The running total is an *expansion*: a short list of non-overlapping doubles,
//! ordered by increasing magnitude, whose exact sum is the true total. New terms
//! are merged with error-free two-sum transformations, and products are split
//! with an FMA two-product, so no bit is ever dropped while the total fits.
//!
//! The expansion gives up and promotes to a [`BigFloat`] when it can no longer
//! represent the total:
//! - a two-sum or two-product overflows;
//! - a product is too small for its rounding error to be a double;
//! - more than [`CAPACITY`] components would be needed.
//!
//! After promotion every operation is performed on the [`BigFloat`] until the
//! accumulator is cleared.

use tracing::trace;

use crate::accumulator::{Accumulator, ExactAccumulator};
use crate::error::{Error, Result};
use crate::exact::{BigFloat, ExactValue};

/// Largest number of components kept before promoting.
pub const CAPACITY: usize = 16;

/// Smallest product magnitude whose FMA error term is still exact (2^-960).
const TWO_PRODUCT_FLOOR: f64 = f64::from_bits(63 << 52);

/// Error-free sum: `s + e == a + b` exactly, with `s = fl(a + b)`.
#[inline]
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let bv = s - a;
    let av = s - bv;
    (s, (a - av) + (b - bv))
}

#[derive(Debug, Clone, Default)]
pub struct ZhuHayesAccumulator {
    components: Vec<f64>,
    scratch: Vec<f64>,
    fallback: Option<BigFloat>,
}

impl ZhuHayesAccumulator {
    pub fn new() -> Self {
        Self {
            components: Vec::with_capacity(CAPACITY + 1),
            scratch: Vec::with_capacity(CAPACITY + 1),
            fallback: None,
        }
    }

    /// Whether the accumulator has fallen back to unbounded precision.
    pub fn is_promoted(&self) -> bool {
        self.fallback.is_some()
    }

    /// Current expansion, smallest magnitude first. Empty once promoted.
    pub fn components(&self) -> &[f64] {
        &self.components
    }

    fn expansion_sum(&self) -> BigFloat {
        self.components
            .iter()
            .fold(BigFloat::new_zero(), |acc, &c| acc.plus(&BigFloat::from_finite(c)))
    }

    fn promote(&mut self, reason: &'static str) -> &mut BigFloat {
        if self.fallback.is_none() {
            trace!(reason, components = self.components.len(), "promoting to big-float");
            let total = self.expansion_sum();
            self.components.clear();
            self.fallback = Some(total);
        }
        self.fallback.get_or_insert_with(BigFloat::new_zero)
    }

    /// Merges a finite value into the expansion.
    fn push(&mut self, value: f64) {
        if value == 0.0 {
            return;
        }
        if let Some(total) = &mut self.fallback {
            *total = total.plus(&BigFloat::from_finite(value));
            return;
        }

        self.scratch.clear();
        let mut q = value;
        let mut overflow = false;
        for &component in &self.components {
            let (s, e) = two_sum(q, component);
            if !s.is_finite() {
                overflow = true;
                break;
            }
            if e != 0.0 {
                self.scratch.push(e);
            }
            q = s;
        }
        if q != 0.0 {
            self.scratch.push(q);
        }

        if overflow || self.scratch.len() > CAPACITY {
            self.promote(if overflow { "two-sum overflow" } else { "capacity exceeded" });
            return self.push(value);
        }
        std::mem::swap(&mut self.components, &mut self.scratch);
    }
}

impl Accumulator for ZhuHayesAccumulator {
    fn name(&self) -> &'static str {
        "zhu-hayes"
    }

    fn is_exact(&self) -> bool {
        true
    }

    fn no_overflow(&self) -> bool {
        true
    }

    fn clear(&mut self) -> &mut Self {
        self.components.clear();
        self.fallback = None;
        self
    }

    fn add(&mut self, value: f64) -> Result<&mut Self> {
        if !value.is_finite() {
            return Err(Error::non_finite("add", value));
        }
        self.push(value);
        Ok(self)
    }

    fn add_product(&mut self, x: f64, y: f64) -> Result<&mut Self> {
        if !x.is_finite() || !y.is_finite() {
            return Err(Error::non_finite("add_product", if x.is_finite() { y } else { x }));
        }
        if x == 0.0 || y == 0.0 {
            return Ok(self);
        }

        let product = x * y;
        if self.fallback.is_none() && product.is_finite() && product.abs() >= TWO_PRODUCT_FLOOR {
            self.push(product);
            self.push(x.mul_add(y, -product));
        } else {
            let reason = if product.is_finite() {
                "two-product underflow"
            } else {
                "two-product overflow"
            };
            let exact = BigFloat::from_finite(x).times(&BigFloat::from_finite(y));
            let total = self.promote(reason);
            *total = total.plus(&exact);
        }
        Ok(self)
    }

    fn double_value(&self) -> f64 {
        match (&self.fallback, self.components.as_slice()) {
            (Some(total), _) => total.to_f64(),
            (None, []) => 0.0,
            (None, [single]) => *single,
            (None, _) => self.expansion_sum().to_f64(),
        }
    }
}

impl ExactAccumulator for ZhuHayesAccumulator {
    type Value = BigFloat;

    fn value(&self) -> BigFloat {
        match &self.fallback {
            Some(total) => total.clone(),
            None => self.expansion_sum(),
        }
    }
}
