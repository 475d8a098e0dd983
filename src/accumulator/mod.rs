//! # Accumulators
//!
//! Mutable running sums and dot products behind one contract. Each family
//! declares two fixed capabilities:
//!
//! | family | exact | no overflow |
//! |---|---|---|
//! | [`DoubleAccumulator`] | no | no |
//! | [`DoubleFmaAccumulator`] | no | no |
//! | [`KahanAccumulator`] | no | no |
//! | [`BigFloatAccumulator`] | yes | yes |
//! | [`RationalAccumulator`] | yes | yes |
//! | [`ZhuHayesAccumulator`] | yes | yes |
//!
//! Accumulators are meant to be created once and reused: `clear` resets them to
//! the additive identity without giving up their allocations.
//!
//! ```rust
//! use exactsum::prelude::*;
//!
//! let mut acc = ZhuHayesAccumulator::new();
//! let total = acc.clear().add_products(&[1e308, 3.0], &[10.0, -1.0]).unwrap().double_value();
//! assert_eq!(total, f64::INFINITY);
//! assert_eq!(acc.clear().add_all(&[0.1, 0.2, -0.3]).unwrap().double_value(), 2.0f64.powi(-55));
//! ```

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::exact::{BigFloat, ExactValue};

pub mod double;
pub mod exact;
pub mod kahan;
pub mod zhu_hayes;

pub use double::{DoubleAccumulator, DoubleFmaAccumulator};
pub use exact::{BigFloatAccumulator, ExactSum, RationalAccumulator};
pub use kahan::KahanAccumulator;
pub use zhu_hayes::ZhuHayesAccumulator;

/// Running sum and dot-product contract shared by every family.
///
/// Mutating operations return the accumulator so calls chain:
/// `acc.clear().add_all(&xs)?.double_value()`.
pub trait Accumulator {
    /// Stable family name, used in reports.
    fn name(&self) -> &'static str;

    /// Whether [`Accumulator::double_value`] is the once-rounded exact total.
    fn is_exact(&self) -> bool;

    /// Whether transient totals beyond the finite double range are carried exactly.
    fn no_overflow(&self) -> bool;

    /// Resets to the additive identity.
    fn clear(&mut self) -> &mut Self;

    /// Adds one value.
    ///
    /// # Errors
    ///
    /// Exact families return [`Error::Domain`] for NaN and infinities; double
    /// families follow IEEE 754 and never fail.
    fn add(&mut self, value: f64) -> Result<&mut Self>;

    /// Adds `x * y`.
    ///
    /// # Errors
    ///
    /// Same domain rules as [`Accumulator::add`].
    fn add_product(&mut self, x: f64, y: f64) -> Result<&mut Self>;

    /// Current total rounded to the nearest double.
    fn double_value(&self) -> f64;

    /// Adds `values` in sequence order.
    fn add_all(&mut self, values: &[f64]) -> Result<&mut Self> {
        for &value in values {
            self.add(value)?;
        }
        Ok(self)
    }

    /// Adds the dot product of `xs` and `ys`.
    ///
    /// # Errors
    ///
    /// [`Error::SizeMismatch`] when the lengths differ, before anything is added.
    fn add_products(&mut self, xs: &[f64], ys: &[f64]) -> Result<&mut Self> {
        Error::check_sizes(xs.len(), ys.len())?;
        for (&x, &y) in xs.iter().zip(ys) {
            self.add_product(x, y)?;
        }
        Ok(self)
    }
}

/// Accumulators whose running total is available as an exact value.
pub trait ExactAccumulator: Accumulator {
    type Value: ExactValue;

    fn value(&self) -> Self::Value;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccumulatorFamily {
    Double,
    DoubleFma,
    Kahan,
    BigFloat,
    Rational,
    ZhuHayes,
}

impl AccumulatorFamily {
    pub const ALL: [Self; 6] = [
        Self::Double,
        Self::DoubleFma,
        Self::Kahan,
        Self::BigFloat,
        Self::Rational,
        Self::ZhuHayes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::DoubleFma => "double-fma",
            Self::Kahan => "kahan",
            Self::BigFloat => "big-float",
            Self::Rational => "rational",
            Self::ZhuHayes => "zhu-hayes",
        }
    }

    pub fn create(self) -> AnyAccumulator {
        match self {
            Self::Double => AnyAccumulator::Double(DoubleAccumulator::new()),
            Self::DoubleFma => AnyAccumulator::DoubleFma(DoubleFmaAccumulator::new()),
            Self::Kahan => AnyAccumulator::Kahan(KahanAccumulator::new()),
            Self::BigFloat => AnyAccumulator::BigFloat(BigFloatAccumulator::new()),
            Self::Rational => AnyAccumulator::Rational(RationalAccumulator::new()),
            Self::ZhuHayes => AnyAccumulator::ZhuHayes(ZhuHayesAccumulator::new()),
        }
    }
}

impl Display for AccumulatorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AccumulatorFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|family| family.name() == s)
            .ok_or_else(|| Error::Domain(format!("unknown accumulator family `{s}`")))
    }
}

/// Any accumulator family, for heterogeneous collections such as a comparator's
/// candidate list.
#[derive(Debug, Clone)]
pub enum AnyAccumulator {
    Double(DoubleAccumulator),
    DoubleFma(DoubleFmaAccumulator),
    Kahan(KahanAccumulator),
    BigFloat(BigFloatAccumulator),
    Rational(RationalAccumulator),
    ZhuHayes(ZhuHayesAccumulator),
}

macro_rules! dispatch {
    ($self:expr, $acc:ident => $body:expr) => {
        match $self {
            AnyAccumulator::Double($acc) => $body,
            AnyAccumulator::DoubleFma($acc) => $body,
            AnyAccumulator::Kahan($acc) => $body,
            AnyAccumulator::BigFloat($acc) => $body,
            AnyAccumulator::Rational($acc) => $body,
            AnyAccumulator::ZhuHayes($acc) => $body,
        }
    };
}

impl AnyAccumulator {
    pub fn family(&self) -> AccumulatorFamily {
        match self {
            Self::Double(_) => AccumulatorFamily::Double,
            Self::DoubleFma(_) => AccumulatorFamily::DoubleFma,
            Self::Kahan(_) => AccumulatorFamily::Kahan,
            Self::BigFloat(_) => AccumulatorFamily::BigFloat,
            Self::Rational(_) => AccumulatorFamily::Rational,
            Self::ZhuHayes(_) => AccumulatorFamily::ZhuHayes,
        }
    }

    /// Exact running total.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedOperation`] for families that are not exact.
    pub fn exact_value(&self) -> Result<BigFloat> {
        match self {
            Self::BigFloat(acc) => Ok(acc.value()),
            Self::Rational(acc) => BigFloat::try_from(&acc.value()),
            Self::ZhuHayes(acc) => Ok(acc.value()),
            other => Err(Error::UnsupportedOperation {
                operation: "exact_value",
                family: other.name(),
            }),
        }
    }
}

impl From<AccumulatorFamily> for AnyAccumulator {
    fn from(family: AccumulatorFamily) -> Self {
        family.create()
    }
}

impl Accumulator for AnyAccumulator {
    fn name(&self) -> &'static str {
        dispatch!(self, acc => acc.name())
    }

    fn is_exact(&self) -> bool {
        dispatch!(self, acc => acc.is_exact())
    }

    fn no_overflow(&self) -> bool {
        dispatch!(self, acc => acc.no_overflow())
    }

    fn clear(&mut self) -> &mut Self {
        dispatch!(&mut *self, acc => {
            acc.clear();
        });
        self
    }

    fn add(&mut self, value: f64) -> Result<&mut Self> {
        dispatch!(&mut *self, acc => {
            acc.add(value)?;
        });
        Ok(self)
    }

    fn add_product(&mut self, x: f64, y: f64) -> Result<&mut Self> {
        dispatch!(&mut *self, acc => {
            acc.add_product(x, y)?;
        });
        Ok(self)
    }

    fn double_value(&self) -> f64 {
        dispatch!(self, acc => acc.double_value())
    }

    fn add_all(&mut self, values: &[f64]) -> Result<&mut Self> {
        dispatch!(&mut *self, acc => {
            acc.add_all(values)?;
        });
        Ok(self)
    }

    fn add_products(&mut self, xs: &[f64], ys: &[f64]) -> Result<&mut Self> {
        dispatch!(&mut *self, acc => {
            acc.add_products(xs, ys)?;
        });
        Ok(self)
    }
}
