use std::f64::consts::PI;
use std::fmt::{self, Display};

use rand::Rng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::generator::{Generator, SeedBank, Stream};

/// Largest unbiased exponent of a finite double.
const MAX_EXPONENT: i32 = 1023;
/// Smallest unbiased exponent of a normal double.
const MIN_EXPONENT: i32 = -1022;
/// Exponent of the smallest subnormal.
const MIN_SUBNORMAL_EXPONENT: i32 = -1074;

/// `2^exponent`, saturating at `2^1023` and flushing to zero below the subnormals.
fn pow2(exponent: i32) -> f64 {
    if exponent >= MIN_EXPONENT {
        let biased = exponent.min(MAX_EXPONENT) + MAX_EXPONENT;
        f64::from_bits((biased as u64) << 52)
    } else if exponent >= MIN_SUBNORMAL_EXPONENT {
        f64::from_bits(1 << (exponent - MIN_SUBNORMAL_EXPONENT))
    } else {
        0.0
    }
}

fn ceil_log2(dim: usize) -> i32 {
    dim.max(1).next_power_of_two().trailing_zeros() as i32
}

/// Largest exponent such that `dim` values of magnitude below `2^e` cannot
/// overflow when summed.
pub fn sum_exponent(dim: usize) -> i32 {
    MAX_EXPONENT - ceil_log2(dim)
}

/// Same bound for sums of `dim` squares.
pub fn sum_of_squares_exponent(dim: usize) -> i32 {
    sum_exponent(dim) / 2
}

/// Scalar distributions, each scaled by a maximum exponent `e`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Distribution {
    /// Uniform on `[-2^e, 2^e)`.
    Uniform,
    /// Normal with standard deviation `2^(e-4)`.
    Gaussian,
    /// Non-negative exponential with scale `2^(e-6)`.
    Exponential,
    /// Signed exponential with scale `2^(e-6)`.
    Laplace,
    /// Uniform over the bit patterns of finite doubles with exponent at most `e`.
    Finite,
}

impl Distribution {
    pub const ALL: [Self; 5] = [
        Self::Uniform,
        Self::Gaussian,
        Self::Exponential,
        Self::Laplace,
        Self::Finite,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Uniform => "uniform",
            Self::Gaussian => "gaussian",
            Self::Exponential => "exponential",
            Self::Laplace => "laplace",
            Self::Finite => "finite",
        }
    }

    /// Draws one value. Every result is finite and below `2^(e+1)` in magnitude.
    pub fn sample<R: Rng + ?Sized>(self, rng: &mut R, max_exponent: i32) -> f64 {
        let e = max_exponent.clamp(MIN_EXPONENT, MAX_EXPONENT);
        match self {
            Self::Uniform => (rng.random::<f64>() * 2.0 - 1.0) * pow2(e),
            Self::Gaussian => {
                // Box-Muller, u1 in (0, 1] so the logarithm is finite
                let u1 = 1.0 - rng.random::<f64>();
                let u2 = rng.random::<f64>();
                let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
                z * pow2(e - 4)
            }
            Self::Exponential => exponential(rng) * pow2(e - 6),
            Self::Laplace => {
                let magnitude = exponential(rng) * pow2(e - 6);
                if rng.random::<bool>() { magnitude } else { -magnitude }
            }
            Self::Finite => {
                let max_biased = (e + MAX_EXPONENT).clamp(0, 2046) as u64;
                let biased = rng.random_range(0..=max_biased);
                let fraction = rng.random::<u64>() & ((1 << 52) - 1);
                let sign = u64::from(rng.random::<bool>()) << 63;
                f64::from_bits(sign | biased << 52 | fraction)
            }
        }
    }
}

impl Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unit-scale exponential deviate, below 64 for any 53-bit uniform.
fn exponential<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    -(1.0 - rng.random::<f64>()).ln()
}

/// Scalar doubles from one [`Distribution`].
#[derive(Debug, Clone)]
pub struct DoubleGenerator {
    distribution: Distribution,
    max_exponent: i32,
    rng: ChaCha20Rng,
}

impl DoubleGenerator {
    /// # Errors
    ///
    /// Any error from [`SeedBank::next_rng`].
    pub fn new(bank: &mut SeedBank, distribution: Distribution, max_exponent: i32) -> Result<Self> {
        Ok(Self::from_rng(bank.next_rng()?, distribution, max_exponent))
    }

    pub fn from_rng(rng: ChaCha20Rng, distribution: Distribution, max_exponent: i32) -> Self {
        debug!(%distribution, max_exponent, "created double generator");
        Self {
            distribution,
            max_exponent: max_exponent.clamp(MIN_EXPONENT, MAX_EXPONENT),
            rng,
        }
    }

    pub fn distribution(&self) -> Distribution {
        self.distribution
    }

    pub fn max_exponent(&self) -> i32 {
        self.max_exponent
    }
}

impl Generator for DoubleGenerator {
    type Output = f64;

    fn name(&self) -> &str {
        self.distribution.name()
    }

    fn sample(&mut self) -> f64 {
        self.distribution.sample(&mut self.rng, self.max_exponent)
    }
}

impl Stream for DoubleGenerator {
    fn rng(&mut self) -> &mut ChaCha20Rng {
        &mut self.rng
    }
}

/// `dim` scalar samples per call, drawn from the base's stream.
#[derive(Debug, Clone)]
pub struct ArrayGenerator<G> {
    base: G,
    dim: usize,
}

impl<G: Generator<Output = f64>> ArrayGenerator<G> {
    pub fn new(base: G, dim: usize) -> Self {
        Self { base, dim }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
}

impl<G: Generator<Output = f64>> Generator for ArrayGenerator<G> {
    type Output = Vec<f64>;

    fn name(&self) -> &str {
        self.base.name()
    }

    fn sample(&mut self) -> Vec<f64> {
        (0..self.dim).map(|_| self.base.sample()).collect()
    }
}

impl<G: Generator<Output = f64>> Stream for ArrayGenerator<G> {
    fn rng(&mut self) -> &mut ChaCha20Rng {
        self.base.rng()
    }
}

/// Transform applied by the named [`Derived`] constructors.
pub type Transform = fn(Vec<f64>, &mut ChaCha20Rng) -> Vec<f64>;

/// Array generator built from a base and a transform of its samples.
///
/// The transform may draw from the base's stream; it always runs right after the
/// base sample it receives, so the stream is consumed in strict call order.
pub struct Derived<G, F> {
    name: String,
    base: G,
    transform: F,
}

impl<G, F> Derived<G, F>
where
    G: Generator<Output = Vec<f64>>,
    F: FnMut(Vec<f64>, &mut ChaCha20Rng) -> Vec<f64>,
{
    pub fn new(name: impl Into<String>, base: G, transform: F) -> Self {
        Self {
            name: name.into(),
            base,
            transform,
        }
    }

    pub fn base(&self) -> &G {
        &self.base
    }
}

impl<G: Generator<Output = Vec<f64>>> Derived<G, Transform> {
    /// Appends the negation of every sample, so the exact sum is zero.
    pub fn zero_sum(base: G) -> Self {
        let name = format!("zero-sum-{}", base.name());
        Self::new(name, base, |mut values, _| {
            values.extend_from_within(..);
            let half = values.len() / 2;
            for value in &mut values[half..] {
                *value = -*value;
            }
            values
        })
    }

    /// A random permutation of each sample.
    pub fn shuffled(base: G) -> Self {
        let name = format!("shuffled-{}", base.name());
        Self::new(name, base, |mut values, rng| {
            values.shuffle(rng);
            values
        })
    }
}

impl<G, F> Generator for Derived<G, F>
where
    G: Generator<Output = Vec<f64>>,
    F: FnMut(Vec<f64>, &mut ChaCha20Rng) -> Vec<f64>,
{
    type Output = Vec<f64>;

    fn name(&self) -> &str {
        &self.name
    }

    fn sample(&mut self) -> Vec<f64> {
        let values = self.base.sample();
        (self.transform)(values, self.base.rng())
    }
}

impl<G, F> Stream for Derived<G, F>
where
    G: Generator<Output = Vec<f64>>,
    F: FnMut(Vec<f64>, &mut ChaCha20Rng) -> Vec<f64>,
{
    fn rng(&mut self) -> &mut ChaCha20Rng {
        self.base.rng()
    }
}

impl<G: fmt::Debug, F> fmt::Debug for Derived<G, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Derived")
            .field("name", &self.name)
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

pub type ArrayGenerators = Vec<Box<dyn Generator<Output = Vec<f64>>>>;

/// The canonical comparator suite for arrays of length `dim`:
/// - one array generator per [`Distribution`], bounded by [`sum_exponent`]
/// - zero-sum arrays over the uniform and finite distributions
/// - shuffled arrays over the gaussian distribution
///
/// # Errors
///
/// Any error from [`SeedBank::next_rng`].
pub fn standard_array_generators(bank: &mut SeedBank, dim: usize) -> Result<ArrayGenerators> {
    let exponent = sum_exponent(dim);
    let mut generators: ArrayGenerators = Vec::new();
    for distribution in Distribution::ALL {
        let base = DoubleGenerator::new(bank, distribution, exponent)?;
        generators.push(Box::new(ArrayGenerator::new(base, dim)));
    }

    // Zero-sum arrays hold twice as many values
    let exponent = sum_exponent(2 * dim);
    for distribution in [Distribution::Uniform, Distribution::Finite] {
        let base = DoubleGenerator::new(bank, distribution, exponent)?;
        generators.push(Box::new(Derived::zero_sum(ArrayGenerator::new(base, dim))));
    }

    let base = DoubleGenerator::new(bank, Distribution::Gaussian, sum_exponent(dim))?;
    generators.push(Box::new(Derived::shuffled(ArrayGenerator::new(base, dim))));

    debug!(count = generators.len(), dim, "created standard array generators");
    Ok(generators)
}

/// Arrays of length `dim` whose sums of squares stay finite, for dot-product
/// runs: one array generator per [`Distribution`] bounded by
/// [`sum_of_squares_exponent`], plus shuffled gaussian arrays.
///
/// # Errors
///
/// Any error from [`SeedBank::next_rng`].
pub fn standard_square_generators(bank: &mut SeedBank, dim: usize) -> Result<ArrayGenerators> {
    let exponent = sum_of_squares_exponent(dim);
    let mut generators: ArrayGenerators = Vec::new();
    for distribution in Distribution::ALL {
        // Finite samples reach 2^(e+1), the others stay below 2^e
        let exponent = match distribution {
            Distribution::Finite => exponent - 1,
            _ => exponent,
        };
        let base = DoubleGenerator::new(bank, distribution, exponent)?;
        generators.push(Box::new(ArrayGenerator::new(base, dim)));
    }

    let base = DoubleGenerator::new(bank, Distribution::Gaussian, exponent)?;
    generators.push(Box::new(Derived::shuffled(ArrayGenerator::new(base, dim))));

    debug!(count = generators.len(), dim, "created standard square generators");
    Ok(generators)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::accumulator::{Accumulator, BigFloatAccumulator};
    use crate::tests::*;

    #[rstest]
    fn test_exponent_bounds() {
        assert_eq!(sum_exponent(0), 1023);
        assert_eq!(sum_exponent(1), 1023);
        assert_eq!(sum_exponent(2), 1022);
        assert_eq!(sum_exponent(1000), 1013);
        assert_eq!(sum_exponent(1024), 1013);
        assert_eq!(sum_exponent(1025), 1012);
        assert_eq!(sum_of_squares_exponent(1000), 506);
    }

    #[rstest]
    fn test_samples_are_bounded(
        mut seed_bank: SeedBank,
        n_experiments: usize,
        #[values(
            Distribution::Uniform,
            Distribution::Gaussian,
            Distribution::Exponential,
            Distribution::Laplace,
            Distribution::Finite
        )]
        distribution: Distribution,
        #[values(-1074, -40, 0, 52, 1023)] max_exponent: i32,
    ) {
        let mut generator =
            DoubleGenerator::new(&mut seed_bank, distribution, max_exponent).unwrap();
        let bound = pow2(max_exponent.clamp(MIN_EXPONENT, MAX_EXPONENT)) * 2.0;
        for _ in 0..n_experiments {
            let value = generator.sample();
            assert!(value.is_finite(), "{distribution}: {value}");
            assert!(value.abs() < bound, "{distribution}: {value:e} >= {bound:e}");
            if distribution == Distribution::Exponential {
                assert!(value >= 0.0);
            }
        }
    }

    #[rstest]
    fn test_uniform_covers_both_signs(mut seed_bank: SeedBank, n_experiments: usize) {
        let mut generator = DoubleGenerator::new(&mut seed_bank, Distribution::Uniform, 3).unwrap();
        let samples: Vec<f64> = (0..n_experiments).map(|_| generator.sample()).collect();
        assert!(samples.iter().any(|&v| v < -4.0));
        assert!(samples.iter().any(|&v| v > 4.0));
        assert!(samples.iter().all(|&v| (-8.0..8.0).contains(&v)));
    }

    #[rstest]
    fn test_same_seed_same_samples() {
        let mut first = SeedBank::new(Default::default()).unwrap();
        let mut second = SeedBank::new(Default::default()).unwrap();
        let mut a = standard_array_generators(&mut first, 16).unwrap();
        let mut b = standard_array_generators(&mut second, 16).unwrap();
        for (left, right) in a.iter_mut().zip(&mut b) {
            assert_eq!(left.name(), right.name());
            for _ in 0..8 {
                let (x, y) = (left.sample(), right.sample());
                assert_eq!(
                    x.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
                    y.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
                );
            }
        }
    }

    #[rstest]
    fn test_standard_suite(mut seed_bank: SeedBank) {
        let mut generators = standard_array_generators(&mut seed_bank, 50).unwrap();
        let names: Vec<&str> = generators.iter().map(|g| g.name()).collect();
        assert_eq!(
            names,
            [
                "uniform",
                "gaussian",
                "exponential",
                "laplace",
                "finite",
                "zero-sum-uniform",
                "zero-sum-finite",
                "shuffled-gaussian"
            ]
        );
        for generator in &mut generators {
            let values = generator.sample();
            let expected = if generator.name().starts_with("zero-sum") { 100 } else { 50 };
            assert_eq!(values.len(), expected);
            assert!(values.iter().all(|v| v.is_finite()));
        }
    }

    #[rstest]
    fn test_zero_sum_is_exact(mut seed_bank: SeedBank, n_experiments: usize) {
        let base =
            DoubleGenerator::new(&mut seed_bank, Distribution::Finite, sum_exponent(64)).unwrap();
        let mut generator = Derived::zero_sum(ArrayGenerator::new(base, 32));
        let mut exact = BigFloatAccumulator::new();
        for _ in 0..n_experiments / 10 {
            let values = generator.sample();
            assert_eq!(values[0], -values[32]);
            assert_eq!(exact.clear().add_all(&values).unwrap().double_value(), 0.0);
        }
    }

    #[rstest]
    fn test_shuffled_is_permutation(mut seed_bank: SeedBank) {
        let rng = seed_bank.next_rng().unwrap();
        let mut plain = ArrayGenerator::new(
            DoubleGenerator::from_rng(rng.clone(), Distribution::Gaussian, 10),
            64,
        );
        let mut shuffled = Derived::shuffled(ArrayGenerator::new(
            DoubleGenerator::from_rng(rng, Distribution::Gaussian, 10),
            64,
        ));

        let mut expected = plain.sample();
        let mut actual = shuffled.sample();
        assert_ne!(expected, actual);
        expected.sort_by(f64::total_cmp);
        actual.sort_by(f64::total_cmp);
        assert_eq!(expected, actual);
    }

    #[rstest]
    fn test_derived_draws_after_its_base(mut seed_bank: SeedBank) {
        let rng = seed_bank.next_rng().unwrap();
        let mut manual = rng.clone();
        let base = ArrayGenerator::new(DoubleGenerator::from_rng(rng, Distribution::Uniform, 0), 3);
        let tag = |mut values: Vec<f64>, rng: &mut ChaCha20Rng| {
            values.push(rng.random::<f64>());
            values
        };
        let mut tagged = Derived::new("tagged", base, tag);
        for _ in 0..4 {
            let mut expected: Vec<f64> = (0..3)
                .map(|_| Distribution::Uniform.sample(&mut manual, 0))
                .collect();
            expected.push(manual.random::<f64>());
            assert_eq!(tagged.sample(), expected);
        }
    }

    #[rstest]
    fn test_square_suite(mut seed_bank: SeedBank, #[values(1, 64, 1000)] dim: usize) {
        let mut generators = standard_square_generators(&mut seed_bank, dim).unwrap();
        let names: Vec<&str> = generators.iter().map(|g| g.name()).collect();
        assert_eq!(
            names,
            ["uniform", "gaussian", "exponential", "laplace", "finite", "shuffled-gaussian"]
        );
        let mut exact = BigFloatAccumulator::new();
        for generator in &mut generators {
            for _ in 0..20 {
                let values = generator.sample();
                assert_eq!(values.len(), dim);
                let squares = exact.clear().add_products(&values, &values).unwrap().double_value();
                assert!(squares.is_finite(), "{}: {squares:e}", generator.name());
            }
        }
    }

    #[rstest]
    fn test_custom_transform(mut seed_bank: SeedBank) {
        let base = DoubleGenerator::new(&mut seed_bank, Distribution::Exponential, 0).unwrap();
        let double = |values: Vec<f64>, _: &mut ChaCha20Rng| values.iter().map(|v| v * 2.0).collect();
        let mut doubled = Derived::new("doubled", ArrayGenerator::new(base, 4), double);
        assert_eq!(doubled.name(), "doubled");
        assert_eq!(doubled.base().dim(), 4);
        assert!(doubled.sample().iter().all(|&v| v >= 0.0 && v < 4.0));
    }
}
