use std::path::PathBuf;

/// Errors raised by exact arithmetic, accumulators, evaluators and generators.
///
/// Every variant is signaled at the call that violates the precondition and is
/// never recovered internally.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Non-finite input to an exact-only operation, or a malformed resource.
    #[error("domain error: {0}")]
    Domain(String),
    /// Paired inputs of different lengths.
    #[error("size mismatch: {left} values against {right}")]
    SizeMismatch { left: usize, right: usize },
    /// Capability-flagged operation invoked on a family that does not have it.
    #[error("unsupported operation: {operation} is not available for {family}")]
    UnsupportedOperation {
        operation: &'static str,
        family: &'static str,
    },
    #[error("cannot read seed resource {}: {source}", path.display())]
    SeedResource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn non_finite(operation: &str, value: f64) -> Self {
        Self::Domain(format!("{operation} requires a finite value, got {value}"))
    }

    pub(crate) fn check_sizes(left: usize, right: usize) -> Result<()> {
        if left == right {
            Ok(())
        } else {
            Err(Self::SizeMismatch { left, right })
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
