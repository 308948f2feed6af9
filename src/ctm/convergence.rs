//! Convergence detection on corner spectra.

/// Tracks corner singular-value spectra across sweeps and decides
/// convergence.
///
/// The distance between two sweeps is the sum over the four corners of the
/// absolute differences of rank-aligned, normalized singular values,
/// truncated to the shorter spectrum where ranks differ. Spectra are
/// gauge-invariant, so this comparison is stable under the gauge freedom of
/// the environment tensors.
///
/// Only the most recent spectrum is retained.
pub struct ConvergenceMonitor {
    tol: f64,
    previous: Option<[Vec<f64>; 4]>,
}

impl ConvergenceMonitor {
    /// Monitor with the given tolerance. A tolerance of exactly zero means
    /// convergence is never declared; the run exhausts its sweep budget.
    pub fn new(tol: f64) -> Self {
        Self {
            tol,
            previous: None,
        }
    }

    /// Record the spectra of a completed sweep.
    ///
    /// Returns the distance to the previous sweep, or `None` on the first
    /// sweep (no predecessor: the convergence check is skipped, so a run
    /// never converges on sweep one).
    pub fn observe(&mut self, spectra: [Vec<f64>; 4]) -> Option<f64> {
        let distance = self
            .previous
            .as_ref()
            .map(|prev| Self::distance(prev, &spectra));
        self.previous = Some(spectra);
        distance
    }

    /// Whether a distance meets the tolerance.
    pub fn is_converged(&self, distance: f64) -> bool {
        self.tol > 0.0 && distance <= self.tol
    }

    /// Sum of rank-aligned absolute spectrum differences over the corners.
    pub fn distance(prev: &[Vec<f64>; 4], current: &[Vec<f64>; 4]) -> f64 {
        prev.iter()
            .zip(current.iter())
            .map(|(p, c)| {
                p.iter()
                    .zip(c.iter())
                    .map(|(a, b)| (a - b).abs())
                    .sum::<f64>()
            })
            .sum()
    }
}
