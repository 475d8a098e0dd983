//! # exactsum
//!
//! A correctness-verification toolkit for floating-point summation, dot products
//! and polynomial evaluation. It answers one question: how far is a fast
//! approximate accumulation from the mathematically exact result?
//!
//! ## Overview
//!
//! The crate is built around interchangeable strategies that share one contract:
//! - **Exact values**: [`BigFloat`] and [`Rational`] never lose a bit and round
//!   only when converted back to `f64`
//! - **Accumulators**: naive, FMA, compensated, exact and Zhu–Hayes style running
//!   sums behind the [`Accumulator`] trait
//! - **Evaluators**: axpy and Horner polynomial evaluation, generic over native
//!   fused multiply-add or an exact value type
//! - **Generators**: reproducible random doubles, arrays, integers and rationals,
//!   seeded from versioned resource files and biased toward overflow-prone
//!   exponent ranges
//! - **Comparator**: runs accumulators against an exact reference and reports
//!   absolute and relative errors
//!
//! ## Quick Start
//!
//! ```rust
//! use exactsum::prelude::*;
//!
//! let xs = [f64::MAX, f64::MAX, 1.0, -f64::MAX, -f64::MAX];
//!
//! let mut exact = BigFloatAccumulator::new();
//! assert_eq!(exact.add_all(&xs).unwrap().double_value(), 1.0);
//!
//! let mut naive = DoubleAccumulator::new();
//! assert_eq!(naive.add_all(&xs).unwrap().double_value(), f64::INFINITY);
//! ```
//!
//! ## Capabilities
//!
//! Every accumulator reports two fixed flags:
//! - `is_exact`: the result is the once-rounded value of the exact sum
//! - `no_overflow`: intermediate magnitudes beyond `f64::MAX` never saturate
//!
//! Exact-only operations live on extension traits ([`ExactAccumulator`],
//! [`ExactPolynomial`]) so they cannot be called on inexact families.

pub mod accumulator;
pub mod comparator;
pub mod error;
pub mod exact;
pub mod generator;
pub mod polynomial;

pub use accumulator::{
    Accumulator, AccumulatorFamily, AnyAccumulator, BigFloatAccumulator, DoubleAccumulator,
    DoubleFmaAccumulator, ExactAccumulator, ExactSum, KahanAccumulator, RationalAccumulator,
    ZhuHayesAccumulator,
};
pub use comparator::{Comparator, Measurement, Report};
pub use error::{Error, Result};
pub use exact::{BigFloat, ExactValue, Rational};
pub use generator::{Generator, GeneratorConfig, SeedBank};
pub use polynomial::{AnyPolynomial, ExactPolynomial, Polynomial};

pub mod prelude {
    //! Prelude module for exactsum.
    //!
    //! Re-exports the traits needed to call accumulator, evaluator and generator
    //! methods, along with the concrete types most callers construct.

    pub use crate::accumulator::*;
    pub use crate::error::{Error, Result};
    pub use crate::exact::{BigFloat, ExactValue, Rational};
    pub use crate::generator::{Generator, GeneratorConfig, SeedBank};
    pub use crate::polynomial::{
        AnyPolynomial, Arithmetic, Axpy, Cubic, Exact, ExactPolynomial, Fma, Monomial, Polynomial,
        Quadratic, daxpy,
    };
}
