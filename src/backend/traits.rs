//! Backend trait definitions.

use crate::error::Result;
use crate::scalar::{Scalar, SvdFactors};

/// Compute placement for all tensors of a run.
///
/// Chosen once at driver construction and fixed for the lifetime of the run;
/// tensors never migrate devices mid-run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Device {
    /// Host CPU.
    Cpu,
    /// Accelerator by ordinal index.
    Accelerator(usize),
}

/// Storage trait for tensor data.
///
/// Abstracts over different storage backends (CPU memory, device memory).
pub trait Storage<T: Scalar>: Clone + Send + Sync + Sized {
    /// Number of elements in storage.
    fn len(&self) -> usize;

    /// Check if storage is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get element at index (may be slow for device memory).
    fn get(&self, index: usize) -> T;

    /// Set element at index (may be slow for device memory).
    fn set(&mut self, index: usize, value: T);

    /// Copy all data to a Vec (downloads from the device if needed).
    fn to_vec(&self) -> Vec<T>;

    /// Create storage from slice.
    fn from_slice(data: &[T]) -> Self;
}

/// Backend trait for tensor execution.
///
/// Defines how contraction and factorization kernels run. The sweep loop is
/// written against this trait and never inspects the placement itself.
pub trait Backend: Clone + Send + Sync + 'static {
    /// Storage type for this backend.
    type Storage<T: Scalar>: Storage<T>;

    /// Backend name for debugging.
    fn name() -> &'static str;

    /// Construct the backend for the requested device, or fail with
    /// [`CtmError::Device`](crate::error::CtmError::Device) if this backend
    /// cannot serve it.
    fn try_from_device(device: &Device) -> Result<Self>;

    /// Allocate zero-initialized storage.
    fn alloc<T: Scalar>(&self, len: usize) -> Self::Storage<T>;

    /// Create storage from slice.
    #[allow(clippy::wrong_self_convention)]
    fn from_slice<T: Scalar>(&self, data: &[T]) -> Self::Storage<T>;

    /// Copy strided data to contiguous storage.
    ///
    /// This is the core operation for making non-contiguous tensors
    /// contiguous.
    fn copy_strided<T: Scalar>(
        &self,
        src: &Self::Storage<T>,
        shape: &[usize],
        strides: &[usize],
        offset: usize,
    ) -> Self::Storage<T>;

    /// Dense matrix product `C = A·B` with `A` m×k and `B` k×n, both
    /// contiguous column-major.
    fn gemm<T: Scalar>(
        &self,
        a: &Self::Storage<T>,
        m: usize,
        k: usize,
        b: &Self::Storage<T>,
        n: usize,
    ) -> Self::Storage<T>;

    /// Thin SVD of a contiguous column-major m×n matrix.
    ///
    /// Factors are returned on the host; singular values are real for both
    /// supported dtypes.
    fn svd<T: Scalar>(&self, a: &Self::Storage<T>, m: usize, n: usize) -> SvdFactors<T>;
}
