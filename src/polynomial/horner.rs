//! Horner evaluators of fixed and open degree.

use crate::error::{Error, Result};
use crate::exact::{BigFloat, ExactValue, Rational};
use crate::polynomial::{Arithmetic, Exact, ExactPolynomial, Fma, Polynomial};

/// `((an * x + a(n-1)) * x + ...) * x + a0`, one strategy axpy per step.
fn horner<A: Arithmetic>(lifted: &[A::Value], x: &A::Value) -> A::Value {
    let mut iter = lifted.iter().rev();
    match iter.next() {
        Some(leading) => iter.fold(leading.clone(), |acc, c| A::axpy(&acc, x, c)),
        None => A::zero(),
    }
}

fn lift_all<A: Arithmetic>(coefficients: &[f64]) -> Result<Vec<A::Value>> {
    coefficients.iter().map(|&c| A::lift(c)).collect()
}

macro_rules! impl_polynomial {
    ($name:ident) => {
        impl<A: Arithmetic> Polynomial for $name<A> {
            fn degree(&self) -> Option<usize> {
                self.degree
            }

            fn coefficients(&self) -> &[f64] {
                &self.coefficients
            }

            fn is_exact(&self) -> bool {
                A::EXACT
            }

            fn double_value(&self, x: f64) -> Result<f64> {
                Ok(A::round(&horner::<A>(&self.lifted, &A::lift(x)?)))
            }
        }

        impl<N: ExactValue> ExactPolynomial for $name<Exact<N>> {
            type Value = N;

            fn value(&self, x: f64) -> Result<N> {
                Ok(horner::<Exact<N>>(&self.lifted, &N::from_f64(x)?))
            }
        }
    };
}

/// `a0 + a1 x + a2 x^2`.
#[derive(Debug, Clone)]
pub struct Quadratic<A: Arithmetic> {
    coefficients: [f64; 3],
    lifted: Vec<A::Value>,
    degree: Option<usize>,
}

impl<A: Arithmetic> Quadratic<A> {
    /// # Errors
    ///
    /// Exact strategies reject non-finite coefficients with [`Error::Domain`].
    pub fn new(a0: f64, a1: f64, a2: f64) -> Result<Self> {
        let coefficients = [a0, a1, a2];
        Ok(Self {
            lifted: lift_all::<A>(&coefficients)?,
            coefficients,
            degree: Some(2),
        })
    }
}

/// `a0 + a1 x + a2 x^2 + a3 x^3`.
#[derive(Debug, Clone)]
pub struct Cubic<A: Arithmetic> {
    coefficients: [f64; 4],
    lifted: Vec<A::Value>,
    degree: Option<usize>,
}

impl<A: Arithmetic> Cubic<A> {
    /// # Errors
    ///
    /// Exact strategies reject non-finite coefficients with [`Error::Domain`].
    pub fn new(a0: f64, a1: f64, a2: f64, a3: f64) -> Result<Self> {
        let coefficients = [a0, a1, a2, a3];
        Ok(Self {
            lifted: lift_all::<A>(&coefficients)?,
            coefficients,
            degree: Some(3),
        })
    }
}

/// Polynomial of any degree.
///
/// Trailing zero coefficients are dropped on construction, so the degree is that
/// of the highest non-zero coefficient. With no non-zero coefficient at all the
/// polynomial is the zero polynomial: `degree()` is `None` and every evaluation
/// is the additive identity.
#[derive(Debug, Clone)]
pub struct Monomial<A: Arithmetic> {
    coefficients: Vec<f64>,
    lifted: Vec<A::Value>,
    degree: Option<usize>,
}

impl<A: Arithmetic> Monomial<A> {
    /// # Errors
    ///
    /// Exact strategies reject non-finite coefficients with [`Error::Domain`].
    pub fn new(coefficients: &[f64]) -> Result<Self> {
        let len = coefficients
            .iter()
            .rposition(|&c| c != 0.0)
            .map_or(0, |last| last + 1);
        let coefficients = coefficients[..len].to_vec();
        Ok(Self {
            lifted: lift_all::<A>(&coefficients)?,
            degree: len.checked_sub(1),
            coefficients,
        })
    }
}

impl_polynomial!(Quadratic);
impl_polynomial!(Cubic);
impl_polynomial!(Monomial);

/// An open-degree polynomial in any strategy, chosen at run time.
#[derive(Debug, Clone)]
pub enum AnyPolynomial {
    Fma(Monomial<Fma>),
    BigFloat(Monomial<Exact<BigFloat>>),
    Rational(Monomial<Exact<Rational>>),
}

macro_rules! dispatch {
    ($self:expr, $poly:ident => $body:expr) => {
        match $self {
            AnyPolynomial::Fma($poly) => $body,
            AnyPolynomial::BigFloat($poly) => $body,
            AnyPolynomial::Rational($poly) => $body,
        }
    };
}

impl AnyPolynomial {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fma(_) => Fma::NAME,
            Self::BigFloat(_) => BigFloat::NAME,
            Self::Rational(_) => Rational::NAME,
        }
    }

    /// Exact value at `x`.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedOperation`] for the native strategy, and
    /// [`Error::Domain`] for a non-finite `x`.
    pub fn value(&self, x: f64) -> Result<BigFloat> {
        match self {
            Self::Fma(_) => Err(Error::UnsupportedOperation {
                operation: "value",
                family: self.name(),
            }),
            Self::BigFloat(poly) => poly.value(x),
            Self::Rational(poly) => BigFloat::try_from(&poly.value(x)?),
        }
    }
}

impl Polynomial for AnyPolynomial {
    fn degree(&self) -> Option<usize> {
        dispatch!(self, poly => poly.degree())
    }

    fn coefficients(&self) -> &[f64] {
        dispatch!(self, poly => poly.coefficients())
    }

    fn is_exact(&self) -> bool {
        dispatch!(self, poly => poly.is_exact())
    }

    fn double_value(&self, x: f64) -> Result<f64> {
        dispatch!(self, poly => poly.double_value(x))
    }
}

impl From<Monomial<Fma>> for AnyPolynomial {
    fn from(poly: Monomial<Fma>) -> Self {
        Self::Fma(poly)
    }
}

impl From<Monomial<Exact<BigFloat>>> for AnyPolynomial {
    fn from(poly: Monomial<Exact<BigFloat>>) -> Self {
        Self::BigFloat(poly)
    }
}

impl From<Monomial<Exact<Rational>>> for AnyPolynomial {
    fn from(poly: Monomial<Exact<Rational>>) -> Self {
        Self::Rational(poly)
    }
}
