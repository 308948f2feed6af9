//! Error types for environment computations.

use thiserror::Error;

use crate::backend::Device;

/// Error type for CTMRG runs.
///
/// Configuration and device problems are surfaced before the sweep loop
/// starts. Rank deficiency is recoverable: the caller reduces the effective
/// bond dimension for the affected move and continues. Numerical failures
/// abort the run.
#[derive(Debug, Error)]
pub enum CtmError {
    /// Inconsistent run configuration (chi, bondim, dtype, tolerances).
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The requested compute device cannot back this run.
    #[error("device {device:?} unavailable: {reason}")]
    Device { device: Device, reason: String },

    /// The enlarged bond carries fewer significant singular values than
    /// requested. Recoverable by truncating to the available rank.
    #[error("enlarged bond has {available} significant singular values, {requested} requested")]
    RankDeficiency { requested: usize, available: usize },

    /// Non-finite or collapsed spectrum; the run cannot proceed.
    #[error("numerical failure: {0}")]
    Numerical(String),
}

/// Result type for environment computations.
pub type Result<T> = std::result::Result<T, CtmError>;
