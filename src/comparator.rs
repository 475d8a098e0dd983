//! # Comparator
//!
//! Runs candidate accumulators against an exact reference and records how far
//! each one lands from the truth.
//!
//! ```rust
//! use exactsum::prelude::*;
//! use exactsum::{AccumulatorFamily, Comparator};
//!
//! let mut comparator = Comparator::with_families(
//!     AccumulatorFamily::Rational,
//!     &[AccumulatorFamily::Double, AccumulatorFamily::ZhuHayes],
//! )
//! .unwrap();
//! let measurements = comparator.compare("cancellation", &[1.0, 1e100, 1.0, -1e100]).unwrap();
//! assert_eq!(measurements[0].prediction, 0.0);
//! assert_eq!(measurements[0].absolute_error, 2.0);
//! assert_eq!(measurements[1].absolute_error, 0.0);
//! ```

use serde::Serialize;
use tracing::{debug, warn};

use crate::accumulator::{Accumulator, AccumulatorFamily, AnyAccumulator};
use crate::error::{Error, Result};
use crate::generator::Generator;

/// One candidate's result on one input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub generator: String,
    pub accumulator: &'static str,
    pub exact: bool,
    pub truth: f64,
    pub prediction: f64,
    /// `|truth - prediction|`, zero when both are equal (equal infinities
    /// included) and infinite when the prediction is NaN.
    pub absolute_error: f64,
    /// `absolute_error / max(1, |truth|)`.
    pub relative_error: f64,
}

impl Measurement {
    fn new(generator: &str, candidate: &AnyAccumulator, truth: f64, prediction: f64) -> Self {
        let absolute_error = if truth == prediction {
            0.0
        } else if prediction.is_nan() {
            f64::INFINITY
        } else {
            (truth - prediction).abs()
        };
        let relative_error = if absolute_error.is_finite() {
            absolute_error / truth.abs().max(1.0)
        } else {
            f64::INFINITY
        };
        Self {
            generator: generator.to_owned(),
            accumulator: candidate.name(),
            exact: candidate.is_exact(),
            truth,
            prediction,
            absolute_error,
            relative_error,
        }
    }

    /// An exact candidate that did not reproduce the truth.
    pub fn is_exactness_violation(&self) -> bool {
        self.exact && self.absolute_error != 0.0
    }
}

/// Every measurement of a [`Comparator::run`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    measurements: Vec<Measurement>,
}

impl Report {
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// Worst relative error of the named accumulator, `None` if it was never measured.
    pub fn max_relative_error(&self, accumulator: &str) -> Option<f64> {
        self.errors_of(accumulator)
            .map(|m| m.relative_error)
            .reduce(f64::max)
    }

    pub fn max_absolute_error(&self, accumulator: &str) -> Option<f64> {
        self.errors_of(accumulator)
            .map(|m| m.absolute_error)
            .reduce(f64::max)
    }

    pub fn exactness_violations(&self) -> Vec<&Measurement> {
        self.measurements
            .iter()
            .filter(|m| m.is_exactness_violation())
            .collect()
    }

    fn errors_of<'a>(&'a self, accumulator: &'a str) -> impl Iterator<Item = &'a Measurement> {
        self.measurements
            .iter()
            .filter(move |m| m.accumulator == accumulator)
    }
}

impl Extend<Measurement> for Report {
    fn extend<I: IntoIterator<Item = Measurement>>(&mut self, iter: I) {
        self.measurements.extend(iter);
    }
}

/// An exact reference accumulator and the candidates measured against it.
#[derive(Debug, Clone)]
pub struct Comparator {
    reference: AnyAccumulator,
    candidates: Vec<AnyAccumulator>,
}

impl Comparator {
    /// # Errors
    ///
    /// [`Error::UnsupportedOperation`] when the reference is not exact.
    pub fn new(reference: AnyAccumulator, candidates: Vec<AnyAccumulator>) -> Result<Self> {
        if !reference.is_exact() {
            return Err(Error::UnsupportedOperation {
                operation: "comparator reference",
                family: reference.name(),
            });
        }
        Ok(Self {
            reference,
            candidates,
        })
    }

    /// Same as [`Comparator::new`], built from families such as those read from configuration.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedOperation`] when the reference is not exact.
    pub fn with_families(
        reference: AccumulatorFamily,
        candidates: &[AccumulatorFamily],
    ) -> Result<Self> {
        Self::new(
            reference.create(),
            candidates.iter().map(|family| family.create()).collect(),
        )
    }

    pub fn reference(&self) -> &AnyAccumulator {
        &self.reference
    }

    pub fn candidates(&self) -> &[AnyAccumulator] {
        &self.candidates
    }

    /// Measures every candidate's sum of `input`.
    ///
    /// # Errors
    ///
    /// [`Error::Domain`] when `input` holds a non-finite value.
    pub fn compare(&mut self, generator: &str, input: &[f64]) -> Result<Vec<Measurement>> {
        let truth = self.reference.clear().add_all(input)?.double_value();
        self.measure(generator, truth, |candidate| {
            Ok(candidate.clear().add_all(input)?.double_value())
        })
    }

    /// Measures every candidate's dot product of `xs` and `ys`.
    ///
    /// # Errors
    ///
    /// [`Error::SizeMismatch`] for inputs of different lengths and
    /// [`Error::Domain`] for non-finite values.
    pub fn compare_products(
        &mut self,
        generator: &str,
        xs: &[f64],
        ys: &[f64],
    ) -> Result<Vec<Measurement>> {
        let truth = self.reference.clear().add_products(xs, ys)?.double_value();
        self.measure(generator, truth, |candidate| {
            Ok(candidate.clear().add_products(xs, ys)?.double_value())
        })
    }

    /// Sums `trials` samples of every generator.
    ///
    /// # Errors
    ///
    /// Any error from [`Comparator::compare`].
    pub fn run<G>(&mut self, generators: &mut [G], trials: usize) -> Result<Report>
    where
        G: Generator<Output = Vec<f64>>,
    {
        self.run_with(generators, trials, "sum", |comparator, name, input| {
            comparator.compare(name, input)
        })
    }

    /// Sums the squares of `trials` samples of every generator, as the dot
    /// product of each sample with itself. Pair with generators bounded by
    /// [`sum_of_squares_exponent`](crate::generator::sum_of_squares_exponent).
    ///
    /// # Errors
    ///
    /// Any error from [`Comparator::compare_products`].
    pub fn run_products<G>(&mut self, generators: &mut [G], trials: usize) -> Result<Report>
    where
        G: Generator<Output = Vec<f64>>,
    {
        self.run_with(generators, trials, "sum of squares", |comparator, name, input| {
            comparator.compare_products(name, input, input)
        })
    }

    fn run_with<G, F>(
        &mut self,
        generators: &mut [G],
        trials: usize,
        kind: &str,
        mut measure: F,
    ) -> Result<Report>
    where
        G: Generator<Output = Vec<f64>>,
        F: FnMut(&mut Self, &str, &[f64]) -> Result<Vec<Measurement>>,
    {
        debug!(
            kind,
            reference = self.reference.name(),
            candidates = self.candidates.len(),
            generators = generators.len(),
            trials,
            "starting comparison run"
        );
        let mut report = Report::default();
        for generator in generators.iter_mut() {
            for _ in 0..trials {
                let input = generator.sample();
                report.extend(measure(self, generator.name(), &input)?);
            }
        }
        debug!(
            kind,
            measurements = report.measurements.len(),
            violations = report.exactness_violations().len(),
            "finished comparison run"
        );
        Ok(report)
    }

    fn measure<F>(
        &mut self,
        generator: &str,
        truth: f64,
        mut predict: F,
    ) -> Result<Vec<Measurement>>
    where
        F: FnMut(&mut AnyAccumulator) -> Result<f64>,
    {
        let mut measurements = Vec::with_capacity(self.candidates.len());
        for candidate in &mut self.candidates {
            let prediction = predict(candidate)?;
            let measurement = Measurement::new(generator, candidate, truth, prediction);
            if measurement.is_exactness_violation() {
                warn!(
                    generator,
                    accumulator = measurement.accumulator,
                    truth,
                    prediction,
                    "exact accumulator disagrees with the reference"
                );
            }
            measurements.push(measurement);
        }
        Ok(measurements)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::generator::{
        ArrayGenerator, Derived, Distribution, DoubleGenerator, SeedBank,
        standard_array_generators, standard_square_generators,
    };
    use crate::tests::*;

    const MAX: f64 = f64::MAX;

    fn all_candidates() -> Comparator {
        Comparator::with_families(AccumulatorFamily::BigFloat, &AccumulatorFamily::ALL).unwrap()
    }

    #[rstest]
    fn test_reference_must_be_exact() {
        for family in [AccumulatorFamily::Double, AccumulatorFamily::Kahan] {
            let result = Comparator::with_families(family, &[AccumulatorFamily::ZhuHayes]);
            assert!(matches!(
                result,
                Err(Error::UnsupportedOperation { family: name, .. }) if name == family.name()
            ));
        }
        assert!(Comparator::with_families(AccumulatorFamily::ZhuHayes, &[]).is_ok());
    }

    #[rstest]
    fn test_transient_overflow_errors() {
        let mut comparator = all_candidates();
        let measurements = comparator.compare("overflow", &[MAX, MAX, 1.0, -MAX, -MAX]).unwrap();
        assert_eq!(measurements.len(), AccumulatorFamily::ALL.len());
        for m in &measurements {
            assert_eq!(m.truth, 1.0);
            if m.exact {
                assert_eq!(m.prediction, 1.0, "{}", m.accumulator);
                assert_eq!(m.relative_error, 0.0);
            } else {
                assert_eq!(m.absolute_error, f64::INFINITY, "{}", m.accumulator);
                assert_eq!(m.relative_error, f64::INFINITY);
            }
        }
    }

    #[rstest]
    fn test_equal_infinities_have_no_error() {
        let mut comparator = all_candidates();
        for m in comparator.compare("saturated", &[MAX, MAX]).unwrap() {
            assert_eq!(m.truth, f64::INFINITY);
            assert_eq!(m.absolute_error, 0.0, "{}", m.accumulator);
            assert!(!m.is_exactness_violation());
        }
    }

    #[rstest]
    fn test_relative_error_scale() {
        let mut comparator =
            Comparator::with_families(AccumulatorFamily::Rational, &[AccumulatorFamily::Double])
                .unwrap();
        // Below one the error is not scaled up
        let input = [1e-3, 1e100, -1e100];
        let [small] = comparator.compare("small", &input).unwrap().try_into().unwrap();
        assert_eq!(small.prediction, 0.0);
        assert_eq!(small.absolute_error, 1e-3);
        assert_eq!(small.relative_error, 1e-3);

        let input = [1e20, 3e4, -1e20, 1e5];
        let [large] = comparator.compare("large", &input).unwrap().try_into().unwrap();
        assert_eq!(large.truth, 130_000.0);
        assert_eq!(large.prediction, 132_768.0);
        assert_eq!(large.relative_error, 2_768.0 / 130_000.0);
    }

    #[rstest]
    fn test_compare_products() {
        let mut comparator = all_candidates();
        let x = 1.0 + f64::EPSILON;
        let y = 1.0 - f64::EPSILON;
        let measurements = comparator.compare_products("fma", &[-1.0, x], &[1.0, y]).unwrap();
        let truth = -(f64::EPSILON * f64::EPSILON);
        for m in &measurements {
            assert_eq!(m.truth, truth);
            match m.accumulator {
                "double" => assert_eq!(m.prediction, 0.0),
                _ => assert_eq!(m.prediction, truth, "{}", m.accumulator),
            }
        }

        let result = comparator.compare_products("mismatch", &[1.0], &[]);
        assert!(matches!(result, Err(Error::SizeMismatch { left: 1, right: 0 })));
        assert!(comparator.compare("nan", &[f64::NAN]).is_err());
    }

    #[rstest]
    fn test_run_standard_suite(mut seed_bank: SeedBank) {
        let mut generators = standard_array_generators(&mut seed_bank, 64).unwrap();
        let mut comparator = all_candidates();
        let trials = 4;
        let report = comparator.run(&mut generators, trials).unwrap();

        assert_eq!(
            report.measurements().len(),
            generators.len() * trials * AccumulatorFamily::ALL.len()
        );
        assert!(report.exactness_violations().is_empty());
        for family in AccumulatorFamily::ALL {
            let worst = report.max_relative_error(family.name()).unwrap();
            if family.create().is_exact() {
                assert_eq!(worst, 0.0, "{family}");
            } else {
                assert!(worst.is_finite(), "{family}: {worst}");
            }
        }
        assert_eq!(report.max_relative_error("quad-double"), None);

        let json = serde_json::to_value(&report).unwrap();
        let first = &json["measurements"][0];
        assert_eq!(first["generator"], "uniform");
        assert_eq!(first["accumulator"], "double");
        assert!(first["relative_error"].is_number());
    }

    #[rstest]
    fn test_run_square_suite(mut seed_bank: SeedBank, #[values(1, 64, 1000)] dim: usize) {
        let mut generators = standard_square_generators(&mut seed_bank, dim).unwrap();
        let mut comparator = all_candidates();
        let trials = 3;
        let report = comparator.run_products(&mut generators, trials).unwrap();

        assert_eq!(
            report.measurements().len(),
            generators.len() * trials * AccumulatorFamily::ALL.len()
        );
        for m in report.measurements() {
            assert!(m.truth.is_finite(), "{}: {}", m.generator, m.truth);
            assert!(m.truth >= 0.0);
            if m.exact {
                assert_eq!(m.absolute_error, 0.0, "{} on {}", m.accumulator, m.generator);
            }
        }
        assert!(report.exactness_violations().is_empty());
    }

    /// Sums of arrays and their negations stay within `n * eps * sum(|x|)` of
    /// zero for every inexact family.
    #[rstest]
    fn test_zero_sum_error_bound(
        mut seed_bank: SeedBank,
        #[values(Distribution::Uniform, Distribution::Gaussian, Distribution::Finite)]
        distribution: Distribution,
        #[values(0, 40)] max_exponent: i32,
    ) {
        let base = DoubleGenerator::new(&mut seed_bank, distribution, max_exponent).unwrap();
        let mut generator = Derived::zero_sum(ArrayGenerator::new(base, 64));
        let mut comparator = Comparator::with_families(
            AccumulatorFamily::BigFloat,
            &[
                AccumulatorFamily::Double,
                AccumulatorFamily::DoubleFma,
                AccumulatorFamily::Kahan,
            ],
        )
        .unwrap();

        for _ in 0..50 {
            let input = generator.sample();
            let magnitude: f64 = input.iter().map(|x| x.abs()).sum();
            let bound = input.len() as f64 * f64::EPSILON * magnitude;
            for m in comparator.compare(generator.name(), &input).unwrap() {
                assert_eq!(m.truth, 0.0);
                assert!(
                    m.absolute_error <= bound,
                    "{}: {:e} > {bound:e}",
                    m.accumulator,
                    m.absolute_error
                );
                // A zero truth leaves the error unscaled
                assert_eq!(m.relative_error, m.absolute_error);
            }
        }
    }

    #[rstest]
    fn test_violations_are_reported() {
        let mut report = Report::default();
        assert!(report.is_empty());
        let truth = 1.0;
        let exact = AccumulatorFamily::ZhuHayes.create();
        let inexact = AccumulatorFamily::Double.create();
        report.extend([
            Measurement::new("manual", &exact, truth, 1.0),
            Measurement::new("manual", &exact, truth, 1.5),
            Measurement::new("manual", &inexact, truth, f64::NAN),
        ]);
        let violations = report.exactness_violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].prediction, 1.5);
        assert_eq!(report.max_relative_error("zhu-hayes"), Some(0.5));
        assert_eq!(report.max_absolute_error("double"), Some(f64::INFINITY));
    }
}
