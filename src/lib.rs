//! # ctmrg
//!
//! Corner transfer matrix renormalization group (CTMRG) environments for
//! translationally invariant infinite PEPS.
//!
//! The environment of a PEPS site — four corner matrices and four edge
//! tensors truncated to a bond dimension χ — approximates the infinite
//! lattice surrounding it, so that expectation values on the infinite
//! system reduce to finite contractions. This crate computes that
//! environment by fixed-point iteration: directional absorption moves,
//! SVD-based truncation projectors, and convergence detection on the
//! corner singular-value spectra.
//!
//! ## Quick Start
//!
//! ```rust
//! use ctmrg::backend::Cpu;
//! use ctmrg::config::CtmConfig;
//! use ctmrg::ctm::{CtmDriver, SiteTensor};
//!
//! let config = CtmConfig::new(8, 2).with_conv_tol(1e-8).with_max_iter(30);
//! let driver = CtmDriver::<f64, Cpu>::new(config).unwrap();
//!
//! let site = SiteTensor::random(2, 2, 42, driver.backend().clone());
//! let report = driver.run(&site).unwrap();
//!
//! println!("{:?} after {} sweeps", report.termination, report.sweeps);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      CtmDriver                          │
//! │   run sweeps until converged / budget / failure         │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │              moves (N, E, S, W absorption)              │
//! │   enlarge corners → ProjectorBuilder → renormalize      │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │          Tensor / linalg over Scalar × Backend          │
//! │   contraction via GEMM, thin SVD, spectra (faer)        │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod backend;
pub mod config;
pub mod ctm;
pub mod error;
pub mod linalg;
pub mod scalar;
pub mod tensor;

// Re-exports
pub use backend::{Backend, Cpu, Device, Storage};
pub use config::{CtmConfig, EnvInit};
pub use ctm::{
    absorb, sweep, ConvergenceMonitor, Corner, CtmDriver, Direction, Environment, MoveOutcome,
    ProjectorBuilder, ProjectorPair, RunReport, SiteTensor, Termination,
};
pub use error::{CtmError, Result};
pub use scalar::{DType, Scalar};
pub use tensor::Tensor;
