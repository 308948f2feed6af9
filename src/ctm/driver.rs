//! The outer fixed-point loop.

use std::marker::PhantomData;

use crate::backend::Backend;
use crate::config::{CtmConfig, EnvInit};
use crate::ctm::convergence::ConvergenceMonitor;
use crate::ctm::env::Environment;
use crate::ctm::moves;
use crate::ctm::site::SiteTensor;
use crate::error::{CtmError, Result};
use crate::scalar::Scalar;

/// How a run ended.
#[derive(Debug)]
pub enum Termination {
    /// Spectrum distance dropped to the configured tolerance.
    Converged,
    /// The sweep budget was exhausted without meeting the tolerance.
    MaxIterReached,
    /// A move or factorization failed beyond recovery.
    Failed(CtmError),
}

impl Termination {
    pub fn is_converged(&self) -> bool {
        matches!(self, Termination::Converged)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Termination::Failed(_))
    }
}

/// Outcome of a run.
///
/// The environment is returned in every case — on failure it is the partial
/// state at the point of the error, kept for diagnosis. Callers escalating χ
/// typically inspect `distance` to decide whether a restart is worthwhile.
pub struct RunReport<T: Scalar, B: Backend> {
    /// Final (or partial, on failure) environment.
    pub env: Environment<T, B>,
    /// Terminal state of the run.
    pub termination: Termination,
    /// Sweeps actually completed.
    pub sweeps: usize,
    /// Last computed spectrum distance; `None` if fewer than two sweeps
    /// finished.
    pub distance: Option<f64>,
}

/// Drives CTMRG sweeps to a fixed point.
///
/// Construction validates the configuration and claims the compute device;
/// both fail fast, before any tensor work. A driver is immutable and can run
/// any number of site tensors sequentially.
///
/// # Example
///
/// ```rust,ignore
/// use ctmrg::backend::Cpu;
/// use ctmrg::config::CtmConfig;
/// use ctmrg::ctm::{CtmDriver, SiteTensor};
///
/// let config = CtmConfig::new(16, 2).with_conv_tol(1e-8);
/// let driver = CtmDriver::<f64, Cpu>::new(config)?;
/// let site = SiteTensor::random(2, 2, 42, driver.backend().clone());
/// let report = driver.run(&site)?;
/// ```
pub struct CtmDriver<T: Scalar, B: Backend> {
    config: CtmConfig,
    backend: B,
    _dtype: PhantomData<T>,
}

impl<T: Scalar, B: Backend> CtmDriver<T, B> {
    /// Validate the configuration and claim the device.
    pub fn new(config: CtmConfig) -> Result<Self> {
        config.validate()?;
        if T::DTYPE != config.dtype {
            return Err(CtmError::Configuration(format!(
                "configured dtype {:?} does not match scalar type {:?}",
                config.dtype,
                T::DTYPE
            )));
        }
        let backend = B::try_from_device(&config.device)?;
        Ok(Self {
            config,
            backend,
            _dtype: PhantomData,
        })
    }

    /// The run configuration.
    pub fn config(&self) -> &CtmConfig {
        &self.config
    }

    /// The backend claimed at construction; site tensors for
    /// [`run`](Self::run) should be built on it.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run sweeps until convergence, budget exhaustion, or failure.
    ///
    /// The site tensor is checked against the configured bond dimension
    /// before any tensor operation. Unrecoverable numerical failures do not
    /// surface as `Err`: they terminate the run with
    /// [`Termination::Failed`], carrying the partial environment.
    pub fn run(&self, site: &SiteTensor<T, B>) -> Result<RunReport<T, B>> {
        if site.bond_dim() != self.config.bondim {
            return Err(CtmError::Configuration(format!(
                "site tensor bond dimension {} does not match configured bondim {}",
                site.bond_dim(),
                self.config.bondim
            )));
        }

        let chi = self.config.chi;
        let a2 = site.double_layer();
        let mut env = match self.config.init {
            EnvInit::SiteReduction => Environment::from_site_reduction(&a2, chi),
            EnvInit::Random { seed } => {
                let d2 = self.config.bondim * self.config.bondim;
                Environment::random(chi, d2, seed, self.backend.clone())
            }
        };

        let mut monitor = ConvergenceMonitor::new(self.config.conv_tol);
        let mut last_distance = None;

        for sweep_idx in 1..=self.config.max_iter {
            env = match moves::sweep(&env, &a2, chi) {
                Ok(next) => next,
                Err(err) => {
                    return Ok(RunReport {
                        env,
                        termination: Termination::Failed(err),
                        sweeps: sweep_idx - 1,
                        distance: last_distance,
                    })
                }
            };

            let spectra = match env.corner_spectra() {
                Ok(s) => s,
                Err(err) => {
                    return Ok(RunReport {
                        env,
                        termination: Termination::Failed(err),
                        sweeps: sweep_idx,
                        distance: last_distance,
                    })
                }
            };

            if let Some(distance) = monitor.observe(spectra) {
                last_distance = Some(distance);
                log::debug!("sweep {}: spectrum distance {:.3e}", sweep_idx, distance);

                if monitor.is_converged(distance) {
                    return Ok(RunReport {
                        env,
                        termination: Termination::Converged,
                        sweeps: sweep_idx,
                        distance: Some(distance),
                    });
                }
            }
        }

        Ok(RunReport {
            env,
            termination: Termination::MaxIterReached,
            sweeps: self.config.max_iter,
            distance: last_distance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Cpu, Device};
    use crate::scalar::DType;

    #[test]
    fn test_dtype_mismatch_fails_fast() {
        let config = CtmConfig::new(8, 2).with_dtype(DType::Complex128);
        assert!(matches!(
            CtmDriver::<f64, Cpu>::new(config),
            Err(CtmError::Configuration(_))
        ));
    }

    #[test]
    fn test_unavailable_device_fails_fast() {
        let config = CtmConfig::new(8, 2).with_device(Device::Accelerator(0));
        assert!(matches!(
            CtmDriver::<f64, Cpu>::new(config),
            Err(CtmError::Device { .. })
        ));
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let config = CtmConfig::new(0, 2);
        assert!(CtmDriver::<f64, Cpu>::new(config).is_err());
    }
}
