//! Truncation projectors from half-system factorizations.

use crate::backend::Backend;
use crate::error::{CtmError, Result};
use crate::linalg::{self, Svd};
use crate::scalar::Scalar;
use crate::tensor::Tensor;

/// A pair of column-orthonormal isometries truncating the two enlarged
/// vertical cuts of an absorption move down to `chi_eff`.
///
/// `lower` spans the cut below the absorbed cell, `upper` the cut above it;
/// both have shape `(χ·bondim², chi_eff)`. Projectors live for one move and
/// are dropped afterwards.
pub struct ProjectorPair<T: Scalar, B: Backend> {
    pub lower: Tensor<T, B>,
    pub upper: Tensor<T, B>,
    pub chi_eff: usize,
}

/// Builds truncation isometries for one absorption move.
///
/// Input are the two half-system matrices adjacent to the absorbed layer,
/// each the contraction of two adjacent enlarged corners (corner + its two
/// edges + the double-layer site) over their shared bond. The halves are
/// joined over the cuts facing away from the absorbed column and the
/// resulting matrix is factorized once; its left singular vectors span the
/// cut below the absorbed cell, the right singular vectors the cut above.
/// Isometry extraction at any rank is then a column slice, so a caller that
/// hits rank deficiency can degrade without refactorizing.
pub struct ProjectorBuilder<T: Scalar, B: Backend> {
    svd: Svd<T, B>,
}

impl<T: Scalar, B: Backend> ProjectorBuilder<T, B> {
    /// Join the two half-system matrices and factorize the result.
    ///
    /// `upper` and `lower` are matrices whose row index is the cut being
    /// truncated (below and above the absorbed cell, respectively) and
    /// whose column index is the cut shared between the halves.
    pub fn from_halves(upper: &Tensor<T, B>, lower: &Tensor<T, B>) -> Result<Self> {
        assert_eq!(upper.ndim(), 2, "half-system tensor must be a matrix");
        assert_eq!(lower.ndim(), 2, "half-system tensor must be a matrix");
        if upper.shape()[1] != lower.shape()[1] {
            return Err(CtmError::Numerical(format!(
                "half-system tensors have incompatible shared cuts: {} vs {}",
                upper.shape()[1],
                lower.shape()[1]
            )));
        }

        let joined = upper.contract(lower, &[0, 1], &[2, 1], &[0, 2]);
        let svd = linalg::thin_svd(&joined)?;
        Ok(Self { svd })
    }

    /// Singular values of the joined half-systems, descending.
    pub fn values(&self) -> &[f64] {
        self.svd.values()
    }

    /// Number of singular values above the machine-precision floor.
    pub fn available_rank(&self) -> usize {
        self.svd.significant_rank()
    }

    /// Extract the isometry pair at target bond dimension `chi`.
    ///
    /// Keeps `min(chi, matrix rank)` columns; dimensional shortfall (an
    /// enlarged bond smaller than χ) is ordinary truncation. If fewer
    /// significant singular values than that survive the precision floor,
    /// this fails with [`CtmError::RankDeficiency`] and the caller should
    /// retry at [`available_rank`](Self::available_rank).
    pub fn isometries(&self, chi: usize) -> Result<ProjectorPair<T, B>> {
        let keep = chi.min(self.svd.k());
        let available = self.available_rank();

        if available == 0 {
            return Err(CtmError::Numerical(
                "half-system spectrum is identically zero".to_string(),
            ));
        }
        if available < keep {
            return Err(CtmError::RankDeficiency {
                requested: keep,
                available,
            });
        }

        Ok(ProjectorPair {
            lower: self.svd.left_isometry(keep),
            upper: self.svd.right_isometry(keep),
            chi_eff: keep,
        })
    }
}
