//! Run configuration.

use crate::backend::Device;
use crate::error::{CtmError, Result};
use crate::scalar::DType;

/// How the initial environment is seeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvInit {
    /// Partial trace of the double-layer site tensor over its outward legs.
    SiteReduction,
    /// Uniform random tensors from a seeded generator.
    Random { seed: u64 },
}

/// Immutable configuration for one CTMRG run.
///
/// Built once, validated at driver construction, and never mutated while a
/// run is in flight.
///
/// # Example
///
/// ```rust
/// use ctmrg::config::CtmConfig;
///
/// let cfg = CtmConfig::new(16, 2).with_conv_tol(1e-10).with_max_iter(100);
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct CtmConfig {
    /// Target environment bond dimension.
    pub chi: usize,
    /// PEPS virtual bond dimension; must match the supplied site tensor.
    pub bondim: usize,
    /// Convergence threshold on the corner spectrum distance. Exactly zero
    /// means "never converge early": the run always uses its full iteration
    /// budget.
    pub conv_tol: f64,
    /// Hard cap on the number of sweeps.
    pub max_iter: usize,
    /// Numeric dtype for every tensor of the run.
    pub dtype: DType,
    /// Compute placement for every tensor of the run.
    pub device: Device,
    /// Environment seeding strategy.
    pub init: EnvInit,
}

impl CtmConfig {
    /// Configuration with defaults for everything but the bond dimensions.
    pub fn new(chi: usize, bondim: usize) -> Self {
        Self {
            chi,
            bondim,
            conv_tol: 1e-8,
            max_iter: 50,
            dtype: DType::Real64,
            device: Device::Cpu,
            init: EnvInit::SiteReduction,
        }
    }

    /// Set the convergence tolerance.
    #[must_use]
    pub fn with_conv_tol(mut self, tol: f64) -> Self {
        self.conv_tol = tol;
        self
    }

    /// Set the sweep budget.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the numeric dtype.
    #[must_use]
    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self
    }

    /// Set the compute device.
    #[must_use]
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Set the environment seeding strategy.
    #[must_use]
    pub fn with_init(mut self, init: EnvInit) -> Self {
        self.init = init;
        self
    }

    /// Check internal consistency. Called by the driver before any tensor
    /// work; exposed for callers that build configurations programmatically.
    pub fn validate(&self) -> Result<()> {
        if self.chi == 0 {
            return Err(CtmError::Configuration("chi must be at least 1".to_string()));
        }
        if self.bondim == 0 {
            return Err(CtmError::Configuration(
                "bondim must be at least 1".to_string(),
            ));
        }
        if self.max_iter == 0 {
            return Err(CtmError::Configuration(
                "max_iter must be at least 1".to_string(),
            ));
        }
        if !self.conv_tol.is_finite() || self.conv_tol < 0.0 {
            return Err(CtmError::Configuration(format!(
                "conv_tol must be finite and non-negative, got {}",
                self.conv_tol
            )));
        }
        Ok(())
    }
}
