//! Error types for operator comparison
//!
//! Every failure is surfaced to the caller; nothing is retried and no default
//! value is ever substituted, since a silently corrupted loss inside a
//! gradient-based training loop is worse than an aborted evaluation.

use thiserror::Error;

/// Result type alias for operator comparison operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A batch element does not match the declared basis-set size
    #[error("{what}[{index}]: expected a {expected}x{expected} matrix, got {rows}x{cols}")]
    Shape {
        what: &'static str,
        index: usize,
        expected: usize,
        rows: usize,
        cols: usize,
    },

    /// A batch vector does not match the declared basis-set size
    #[error("{what}[{index}]: expected a vector of length {expected}, got {len}")]
    VectorShape {
        what: &'static str,
        index: usize,
        expected: usize,
        len: usize,
    },

    /// Batch slices with implicit index correspondence have unequal lengths
    #[error("{what}: expected {expected} batch elements, got {got}")]
    BatchMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// Loss evaluation over an empty batch is undefined
    #[error("loss evaluated over an empty batch")]
    EmptyBatch,

    /// The overlap matrix is not positive-definite
    #[error("overlap matrix is not positive-definite (eigenvalue {eigenvalue:.6e} at index {index})")]
    NotPositiveDefinite { index: usize, eigenvalue: f64 },

    /// The symmetric eigensolver exhausted its iteration budget
    #[error("symmetric eigendecomposition failed to converge")]
    EigenConvergence,

    /// The density-matrix projection measure is too close to zero to invert
    #[error(
        "projection measure {value:.6e} for batch element {index} is below the guard threshold {guard:.6e}"
    )]
    DegenerateProjection {
        index: usize,
        value: f64,
        guard: f64,
    },

    /// A loss kind was dispatched without a batch input it requires
    #[error("loss '{kind}' requires the '{input}' batch input")]
    MissingInput {
        kind: &'static str,
        input: &'static str,
    },

    /// Unknown loss name in configuration
    #[error("unknown loss: {0}")]
    UnknownLoss(String),
}
