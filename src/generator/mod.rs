//! # Generators
//!
//! Deterministic producers of test inputs. Every generator owns one
//! [`ChaCha20Rng`] keyed from a versioned seed file, so two runs with the same
//! [`GeneratorConfig`] see byte-for-byte the same samples.
//!
//! Seed files live in [`GeneratorConfig::seed_directory`] and are named
//! `seed-00.txt`, `seed-01.txt`, ... A [`SeedBank`] hands them out in order.
//!
//! ```rust
//! use exactsum::prelude::*;
//! use exactsum::generator::{ArrayGenerator, Derived, Distribution, DoubleGenerator};
//!
//! let mut bank = SeedBank::new(GeneratorConfig::default()).unwrap();
//! let uniform = DoubleGenerator::new(&mut bank, Distribution::Uniform, 10).unwrap();
//! let mut zero_sum = Derived::zero_sum(ArrayGenerator::new(uniform, 100));
//!
//! let values = zero_sum.sample();
//! assert_eq!(values.len(), 200);
//! let mut exact = BigFloatAccumulator::new();
//! assert_eq!(exact.add_all(&values).unwrap().double_value(), 0.0);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

pub mod double;
pub mod exact;

pub use double::{
    ArrayGenerator, ArrayGenerators, Derived, Distribution, DoubleGenerator, Transform,
    standard_array_generators, standard_square_generators, sum_exponent, sum_of_squares_exponent,
};
pub use exact::{BigFloatGenerator, IntegerGenerator, RationalGenerator};

/// Number of 32-bit words in a ChaCha20 key.
pub const SEED_WORDS: usize = 8;

/// Where seeds come from and how often edge cases are injected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub seed_directory: PathBuf,
    /// Probability that exact-value generators return a curated edge case.
    pub edge_case_probability: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed_directory: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/seeds")),
            edge_case_probability: 0.01,
        }
    }
}

/// Hands out generator streams from the configured seed files, one file per stream.
#[derive(Debug, Clone)]
pub struct SeedBank {
    config: GeneratorConfig,
    next: usize,
}

impl SeedBank {
    /// # Errors
    ///
    /// [`Error::Domain`] when the edge-case probability is outside `[0, 1]`.
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        if !(0.0..=1.0).contains(&config.edge_case_probability) {
            return Err(Error::Domain(format!(
                "edge case probability must lie in [0, 1], got {}",
                config.edge_case_probability
            )));
        }
        Ok(Self { config, next: 0 })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn edge_case_probability(&self) -> f64 {
        self.config.edge_case_probability
    }

    pub fn seed_path(&self, index: usize) -> PathBuf {
        self.config.seed_directory.join(format!("seed-{index:02}.txt"))
    }

    /// Stream keyed by seed file `index`, independent of the bank's cursor.
    ///
    /// # Errors
    ///
    /// [`Error::SeedResource`] when the file cannot be read and [`Error::Domain`]
    /// when its contents are malformed.
    pub fn rng(&self, index: usize) -> Result<ChaCha20Rng> {
        let path = self.seed_path(index);
        let words = read_seed(&path)?;
        debug!(index, path = %path.display(), "loaded generator seed");

        let mut key = [0u8; 32];
        for (chunk, word) in key.chunks_exact_mut(4).zip(words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        Ok(ChaCha20Rng::from_seed(key))
    }

    /// Stream keyed by the next unused seed file.
    ///
    /// # Errors
    ///
    /// Same as [`SeedBank::rng`]; a failed load does not advance the cursor.
    pub fn next_rng(&mut self) -> Result<ChaCha20Rng> {
        let rng = self.rng(self.next)?;
        self.next += 1;
        Ok(rng)
    }
}

fn read_seed(path: &Path) -> Result<[u32; SEED_WORDS]> {
    let text = fs::read_to_string(path).map_err(|source| Error::SeedResource {
        path: path.to_path_buf(),
        source,
    })?;
    parse_seed(&text).map_err(|err| match err {
        Error::Domain(message) => Error::Domain(format!("{}: {message}", path.display())),
        other => other,
    })
}

/// Parses the eight base-10 key words of a seed file.
///
/// Words lie in `[-2^31, 2^32)`; negative words are read as two's complement.
/// Blank lines are ignored.
///
/// # Errors
///
/// [`Error::Domain`] for a wrong word count or an unparsable or out-of-range word.
pub fn parse_seed(text: &str) -> Result<[u32; SEED_WORDS]> {
    let mut words = [0u32; SEED_WORDS];
    let mut count = 0;
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: i64 = line
            .parse()
            .map_err(|_| Error::Domain(format!("line {}: `{line}` is not an integer", number + 1)))?;
        if !(-(1i64 << 31)..(1i64 << 32)).contains(&value) {
            return Err(Error::Domain(format!(
                "line {}: {value} does not fit in 32 bits",
                number + 1
            )));
        }
        if count == SEED_WORDS {
            return Err(Error::Domain(format!("more than {SEED_WORDS} seed words")));
        }
        words[count] = value as u32;
        count += 1;
    }
    if count != SEED_WORDS {
        return Err(Error::Domain(format!(
            "expected {SEED_WORDS} seed words, found {count}"
        )));
    }
    Ok(words)
}

mod sealed {
    use rand_chacha::ChaCha20Rng;

    /// The stream behind a generator. Only reachable inside the crate, so a
    /// stream is driven by its own generator or by a derived one wrapping it.
    pub trait Stream {
        fn rng(&mut self) -> &mut ChaCha20Rng;
    }
}

pub(crate) use sealed::Stream;

/// Deterministic producer of samples over one owned stream.
///
/// The trait is sealed. Derived generators reach the underlying stream, but
/// callers cannot draw from it out of sequence:
///
/// ```compile_fail
/// use exactsum::prelude::*;
/// use exactsum::generator::{Distribution, DoubleGenerator};
///
/// let mut bank = SeedBank::new(GeneratorConfig::default()).unwrap();
/// let mut generator = DoubleGenerator::new(&mut bank, Distribution::Uniform, 0).unwrap();
/// let _ = generator.rng();
/// ```
pub trait Generator: sealed::Stream {
    type Output;

    fn name(&self) -> &str;

    fn sample(&mut self) -> Self::Output;
}

impl<G: Generator + ?Sized> Stream for Box<G> {
    fn rng(&mut self) -> &mut ChaCha20Rng {
        (**self).rng()
    }
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    type Output = G::Output;

    fn name(&self) -> &str {
        (**self).name()
    }

    fn sample(&mut self) -> G::Output {
        (**self).sample()
    }
}
