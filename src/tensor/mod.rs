//! Stride-based tensor type with zero-copy views.
//!
//! The [`Tensor`] type supports:
//! - Zero-copy `permute` and `reshape` operations
//! - Automatic contiguous copy when needed for GEMM
//! - Generic over scalar dtype and backend

mod ops;

use std::sync::Arc;

use crate::backend::{Backend, Storage};
use crate::scalar::Scalar;

/// A multi-dimensional tensor with stride-based layout.
///
/// Tensors support zero-copy view operations (permute, reshape) and
/// automatically make data contiguous when needed for operations like GEMM.
/// Data is stored in column-major (Fortran) order.
///
/// # Type Parameters
///
/// * `T` - The scalar element type (f64, Complex64)
/// * `B` - The backend type
#[derive(Clone)]
pub struct Tensor<T: Scalar, B: Backend> {
    /// Shared storage (reference counted)
    storage: Arc<B::Storage<T>>,

    /// Shape of this view
    shape: Vec<usize>,

    /// Strides for each dimension (in elements)
    strides: Vec<usize>,

    /// Offset into storage
    offset: usize,

    /// Backend instance
    backend: B,
}

impl<T: Scalar, B: Backend> Tensor<T, B> {
    /// Create a tensor from data with the given shape.
    ///
    /// Data is assumed to be in column-major (Fortran) order.
    pub fn from_data(data: &[T], shape: &[usize]) -> Self
    where
        B: Default,
    {
        Self::from_data_with_backend(data, shape, B::default())
    }

    /// Create a tensor from data with explicit backend.
    pub fn from_data_with_backend(data: &[T], shape: &[usize], backend: B) -> Self {
        let numel: usize = shape.iter().product();
        assert_eq!(
            data.len(),
            numel,
            "Data length {} doesn't match shape {:?} (expected {})",
            data.len(),
            shape,
            numel
        );

        let storage = backend.from_slice(data);
        let strides = compute_contiguous_strides(shape);

        Self {
            storage: Arc::new(storage),
            shape: shape.to_vec(),
            strides,
            offset: 0,
            backend,
        }
    }

    /// Create a zero-filled tensor.
    pub fn zeros(shape: &[usize]) -> Self
    where
        B: Default,
    {
        Self::zeros_with_backend(shape, B::default())
    }

    /// Create a zero-filled tensor with explicit backend.
    pub fn zeros_with_backend(shape: &[usize], backend: B) -> Self {
        let numel: usize = shape.iter().product();
        let storage = backend.alloc(numel);
        let strides = compute_contiguous_strides(shape);

        Self {
            storage: Arc::new(storage),
            shape: shape.to_vec(),
            strides,
            offset: 0,
            backend,
        }
    }

    /// Create from raw storage (internal use).
    pub(crate) fn from_raw(
        storage: B::Storage<T>,
        shape: Vec<usize>,
        strides: Vec<usize>,
        offset: usize,
        backend: B,
    ) -> Self {
        Self {
            storage: Arc::new(storage),
            shape,
            strides,
            offset,
            backend,
        }
    }

    /// Get a reference to the underlying storage.
    ///
    /// Returns `Some(&storage)` only if the tensor is contiguous and has no
    /// offset. For non-contiguous tensors, call `contiguous()` first.
    pub fn storage(&self) -> Option<&B::Storage<T>> {
        if self.is_contiguous() {
            Some(self.storage.as_ref())
        } else {
            None
        }
    }

    /// Get the shape of the tensor.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the strides of the tensor.
    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Get the number of dimensions.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Get the total number of elements.
    #[inline]
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Get the backend.
    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Check if the tensor is contiguous in memory.
    pub fn is_contiguous(&self) -> bool {
        if self.offset != 0 {
            return false;
        }
        let expected = compute_contiguous_strides(&self.shape);
        self.strides == expected
    }

    /// Copy all data to a Vec.
    pub fn to_vec(&self) -> Vec<T> {
        if self.is_contiguous() {
            self.storage.to_vec()
        } else {
            self.contiguous().storage.to_vec()
        }
    }

    /// Permute dimensions (zero-copy).
    pub fn permute(&self, axes: &[usize]) -> Self {
        assert_eq!(
            axes.len(),
            self.ndim(),
            "Permutation axes length {} doesn't match ndim {}",
            axes.len(),
            self.ndim()
        );

        // Check axes are valid and unique
        let mut seen = vec![false; self.ndim()];
        for &ax in axes {
            assert!(ax < self.ndim(), "Axis {} out of range for ndim {}", ax, self.ndim());
            assert!(!seen[ax], "Duplicate axis {} in permutation", ax);
            seen[ax] = true;
        }

        let new_shape: Vec<usize> = axes.iter().map(|&i| self.shape[i]).collect();
        let new_strides: Vec<usize> = axes.iter().map(|&i| self.strides[i]).collect();

        Self {
            storage: Arc::clone(&self.storage),
            shape: new_shape,
            strides: new_strides,
            offset: self.offset,
            backend: self.backend.clone(),
        }
    }

    /// Transpose (2D shorthand for permute).
    pub fn t(&self) -> Self {
        assert_eq!(self.ndim(), 2, "transpose requires 2D tensor, got {}D", self.ndim());
        self.permute(&[1, 0])
    }

    /// Reshape to a new shape (zero-copy if contiguous).
    pub fn reshape(&self, new_shape: &[usize]) -> Self {
        let old_numel: usize = self.shape.iter().product();
        let new_numel: usize = new_shape.iter().product();
        assert_eq!(
            old_numel, new_numel,
            "Cannot reshape from {:?} ({} elements) to {:?} ({} elements)",
            self.shape, old_numel, new_shape, new_numel
        );

        if self.is_contiguous() {
            // Fast path: just update shape and strides
            Self {
                storage: Arc::clone(&self.storage),
                shape: new_shape.to_vec(),
                strides: compute_contiguous_strides(new_shape),
                offset: self.offset,
                backend: self.backend.clone(),
            }
        } else {
            // Must make contiguous first
            self.contiguous().reshape(new_shape)
        }
    }

    /// Make tensor contiguous in memory.
    ///
    /// If already contiguous, returns a clone (shared storage).
    /// Otherwise, copies data to a new contiguous buffer.
    pub fn contiguous(&self) -> Self {
        if self.is_contiguous() {
            self.clone()
        } else {
            let storage = self.backend.copy_strided(
                &self.storage,
                &self.shape,
                &self.strides,
                self.offset,
            );
            Self {
                storage: Arc::new(storage),
                shape: self.shape.clone(),
                strides: compute_contiguous_strides(&self.shape),
                offset: 0,
                backend: self.backend.clone(),
            }
        }
    }

    /// Elementwise complex conjugate (identity for real dtype).
    pub fn conj(&self) -> Self {
        let data: Vec<T> = self.to_vec().into_iter().map(|v| v.conj()).collect();
        Self::from_data_with_backend(&data, &self.shape, self.backend.clone())
    }

    /// Multiply every element by a real factor.
    pub fn scale(&self, factor: f64) -> Self {
        let data: Vec<T> = self.to_vec().into_iter().map(|v| v.scale(factor)).collect();
        Self::from_data_with_backend(&data, &self.shape, self.backend.clone())
    }

    /// Largest element magnitude, or 0 for an empty tensor.
    ///
    /// NaN entries propagate (the result is NaN), so a finiteness check on
    /// the result covers the whole tensor.
    pub fn max_abs(&self) -> f64 {
        self.to_vec()
            .into_iter()
            .map(|v| v.abs())
            .fold(0.0f64, |acc, x| if x > acc || x.is_nan() { x } else { acc })
    }

    /// Sum over one axis. The result has one fewer dimension.
    pub fn sum_axis(&self, axis: usize) -> Self {
        assert!(axis < self.ndim(), "Axis {} out of bounds for {}D tensor", axis, self.ndim());

        let mut new_shape: Vec<usize> = self.shape.clone();
        new_shape.remove(axis);

        let data = self.to_vec();
        let output_strides = compute_contiguous_strides(&new_shape);
        let output_numel: usize = new_shape.iter().product::<usize>().max(1);
        let mut result = vec![T::zero(); output_numel];

        let mut coords = vec![0usize; self.ndim()];
        for &val in &data {
            let mut out_flat = 0;
            let mut out_dim = 0;
            for (dim, &c) in coords.iter().enumerate() {
                if dim != axis {
                    out_flat += c * output_strides[out_dim];
                    out_dim += 1;
                }
            }
            result[out_flat] = result[out_flat] + val;

            // Advance column-major coordinates
            for dim in 0..self.ndim() {
                coords[dim] += 1;
                if coords[dim] < self.shape[dim] {
                    break;
                }
                coords[dim] = 0;
            }
        }

        if new_shape.is_empty() {
            Self::from_data_with_backend(&result, &[1], self.backend.clone())
        } else {
            Self::from_data_with_backend(&result, &new_shape, self.backend.clone())
        }
    }
}

/// Compute contiguous strides for column-major (Fortran) layout.
///
/// For shape [m, n], returns strides [1, m] (first dimension is contiguous).
pub fn compute_contiguous_strides(shape: &[usize]) -> Vec<usize> {
    if shape.is_empty() {
        return vec![];
    }

    let mut strides = vec![1; shape.len()];
    for i in 1..shape.len() {
        strides[i] = strides[i - 1] * shape[i - 1];
    }
    strides
}

impl<T: Scalar, B: Backend> std::fmt::Debug for Tensor<T, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape)
            .field("strides", &self.strides)
            .field("offset", &self.offset)
            .field("contiguous", &self.is_contiguous())
            .field("backend", &B::name())
            .finish()
    }
}
