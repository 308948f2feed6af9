//! Matrix factorization helpers over [`Tensor`].
//!
//! CTMRG needs two things from dense linear algebra: thin SVDs of
//! half-environment matrices (to build truncation isometries) and
//! singular-value spectra of corner matrices (to monitor convergence). Both
//! go through the backend's SVD kernel; results carrying NaN or Inf are
//! rejected here so callers never see a poisoned spectrum.

use crate::backend::Backend;
use crate::error::{CtmError, Result};
use crate::scalar::Scalar;
use crate::tensor::Tensor;

/// Thin SVD `A = U diag(S) Vᴴ` of a 2D tensor.
///
/// `S` is real and descending for both dtypes. Factors are kept as flat
/// column-major buffers so that truncation to the leading `k` columns is a
/// prefix slice.
pub struct Svd<T: Scalar, B: Backend> {
    u: Vec<T>,
    s: Vec<f64>,
    v: Vec<T>,
    nrows: usize,
    ncols: usize,
    k: usize,
    backend: B,
}

impl<T: Scalar, B: Backend> Svd<T, B> {
    /// All `min(nrows, ncols)` singular values, descending.
    pub fn values(&self) -> &[f64] {
        &self.s
    }

    /// Number of columns in the thin factors.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Count of singular values above the machine-precision floor
    /// `σ_max · ε · max(nrows, ncols)`.
    ///
    /// Zero for an identically zero matrix.
    pub fn significant_rank(&self) -> usize {
        let smax = match self.s.first() {
            Some(&s0) if s0 > 0.0 => s0,
            _ => return 0,
        };
        let floor = smax * f64::EPSILON * self.nrows.max(self.ncols) as f64;
        self.s.iter().take_while(|&&sv| sv > floor).count()
    }

    /// Leading `k` left singular vectors as an `(nrows, k)` isometry.
    pub fn left_isometry(&self, k: usize) -> Tensor<T, B> {
        assert!(k <= self.k, "requested {} columns, only {} available", k, self.k);
        Tensor::from_data_with_backend(&self.u[..self.nrows * k], &[self.nrows, k], self.backend.clone())
    }

    /// Leading `k` right singular vectors as an `(ncols, k)` isometry.
    pub fn right_isometry(&self, k: usize) -> Tensor<T, B> {
        assert!(k <= self.k, "requested {} columns, only {} available", k, self.k);
        Tensor::from_data_with_backend(&self.v[..self.ncols * k], &[self.ncols, k], self.backend.clone())
    }
}

/// Thin SVD of a 2D tensor.
///
/// Fails with [`CtmError::Numerical`] if any singular value is NaN or Inf.
pub fn thin_svd<T: Scalar, B: Backend>(t: &Tensor<T, B>) -> Result<Svd<T, B>> {
    assert_eq!(t.ndim(), 2, "thin_svd requires a 2D tensor, got {}D", t.ndim());
    let m = t.shape()[0];
    let n = t.shape()[1];

    let c = t.contiguous();
    let factors = t
        .backend()
        .svd(c.storage().expect("contiguous tensor has storage"), m, n);

    if factors.s.iter().any(|sv| !sv.is_finite()) {
        return Err(CtmError::Numerical(format!(
            "non-finite singular value in {}x{} factorization",
            m, n
        )));
    }

    Ok(Svd {
        u: factors.u,
        s: factors.s,
        v: factors.v,
        nrows: m,
        ncols: n,
        k: factors.k,
        backend: t.backend().clone(),
    })
}

/// Singular values of a 2D tensor, normalized by the largest.
///
/// Fails with [`CtmError::Numerical`] for a NaN-poisoned or identically zero
/// matrix; both mean the environment has degenerated beyond repair.
pub fn normalized_spectrum<T: Scalar, B: Backend>(t: &Tensor<T, B>) -> Result<Vec<f64>> {
    let svd = thin_svd(t)?;
    let s = svd.values();
    match s.first() {
        Some(&s0) if s0 > 0.0 => Ok(s.iter().map(|sv| sv / s0).collect()),
        _ => Err(CtmError::Numerical(
            "corner spectrum is identically zero".to_string(),
        )),
    }
}
