//! # Axpy and polynomial evaluation
//!
//! Stateless calculators for `a * x + y` and Horner evaluation, generic over an
//! [`Arithmetic`] strategy:
//! - [`Fma`]: native doubles, one fused multiply-add per step
//! - [`Exact<N>`]: any [`ExactValue`], rounded once at the end
//!
//! Exact results are only reachable through [`ExactPolynomial`] and
//! [`Axpy::value`], which exist solely for exact strategies.
//!
//! ```rust
//! use exactsum::prelude::*;
//!
//! // (x - 1)^3 expanded, evaluated next to its root
//! let coefficients = [-1.0, 3.0, -3.0, 1.0];
//! let x = 1.0 + 2.0f64.powi(-20);
//!
//! let exact = Monomial::<Exact<BigFloat>>::new(&coefficients).unwrap();
//! assert_eq!(exact.double_value(x).unwrap(), 2.0f64.powi(-60));
//! ```

use std::fmt::Debug;
use std::marker::PhantomData;

use crate::error::Result;
use crate::exact::ExactValue;

pub mod horner;

pub use horner::{AnyPolynomial, Cubic, Monomial, Quadratic};

/// Arithmetic used by evaluators at each Horner step.
pub trait Arithmetic {
    type Value: Clone + Debug;

    /// Whether results are exact before the final rounding.
    const EXACT: bool;

    const NAME: &'static str;

    /// Converts an input double.
    ///
    /// # Errors
    ///
    /// Exact strategies return [`crate::Error::Domain`] for NaN and infinities.
    fn lift(value: f64) -> Result<Self::Value>;

    fn zero() -> Self::Value;

    /// `a * x + y`.
    fn axpy(a: &Self::Value, x: &Self::Value, y: &Self::Value) -> Self::Value;

    fn round(value: &Self::Value) -> f64;
}

/// Native doubles, every step rounded once by a fused multiply-add.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fma;

impl Arithmetic for Fma {
    type Value = f64;

    const EXACT: bool = false;
    const NAME: &'static str = "fma";

    fn lift(value: f64) -> Result<f64> {
        Ok(value)
    }

    fn zero() -> f64 {
        0.0
    }

    fn axpy(a: &f64, x: &f64, y: &f64) -> f64 {
        a.mul_add(*x, *y)
    }

    fn round(value: &f64) -> f64 {
        *value
    }
}

/// Exact arithmetic over `N`.
#[derive(Debug)]
pub struct Exact<N>(PhantomData<fn() -> N>);

// Markers carry no `N`, so none of these need bounds on it
impl<N> Clone for Exact<N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N> Copy for Exact<N> {}

impl<N> Default for Exact<N> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<N: ExactValue> Arithmetic for Exact<N> {
    type Value = N;

    const EXACT: bool = true;
    const NAME: &'static str = N::NAME;

    fn lift(value: f64) -> Result<N> {
        N::from_f64(value)
    }

    fn zero() -> N {
        N::zero()
    }

    fn axpy(a: &N, x: &N, y: &N) -> N {
        a.mul_add(x, y)
    }

    fn round(value: &N) -> f64 {
        value.to_f64()
    }
}

/// `a * x + y` with a single rounding.
#[inline]
pub fn daxpy(a: f64, x: f64, y: f64) -> f64 {
    a.mul_add(x, y)
}

/// Stateless `a * x + y` calculator.
#[derive(Debug)]
pub struct Axpy<A>(PhantomData<fn() -> A>);

impl<A> Clone for Axpy<A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for Axpy<A> {}

impl<A> Default for Axpy<A> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<A: Arithmetic> Axpy<A> {
    pub fn new() -> Self {
        Self(PhantomData)
    }

    pub fn is_exact(&self) -> bool {
        A::EXACT
    }

    /// Rounded `a * x + y`.
    ///
    /// # Errors
    ///
    /// Exact strategies reject non-finite arguments with [`crate::Error::Domain`].
    pub fn double_value(&self, a: f64, x: f64, y: f64) -> Result<f64> {
        let result = A::axpy(&A::lift(a)?, &A::lift(x)?, &A::lift(y)?);
        Ok(A::round(&result))
    }
}

impl<N: ExactValue> Axpy<Exact<N>> {
    /// Exact `a * x + y`.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Domain`] for non-finite arguments.
    pub fn value(&self, a: f64, x: f64, y: f64) -> Result<N> {
        Ok(N::from_f64(a)?.mul_add(&N::from_f64(x)?, &N::from_f64(y)?))
    }
}

/// Polynomial in one variable, coefficients lowest degree first.
pub trait Polynomial {
    /// Degree after stripping, `None` for the zero polynomial.
    fn degree(&self) -> Option<usize>;

    fn coefficients(&self) -> &[f64];

    fn is_exact(&self) -> bool;

    /// Horner evaluation rounded to a double.
    ///
    /// # Errors
    ///
    /// Exact strategies reject a non-finite `x` with [`crate::Error::Domain`].
    fn double_value(&self, x: f64) -> Result<f64>;
}

/// Polynomials whose value is available before rounding.
pub trait ExactPolynomial: Polynomial {
    type Value: ExactValue;

    /// # Errors
    ///
    /// [`crate::Error::Domain`] for a non-finite `x`.
    fn value(&self, x: f64) -> Result<Self::Value>;
}
