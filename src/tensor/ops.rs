//! Pairwise tensor contraction via reshape-to-GEMM.

use super::{compute_contiguous_strides, Tensor};
use crate::backend::Backend;
use crate::scalar::Scalar;

impl<T: Scalar, B: Backend> Tensor<T, B> {
    /// Dense matrix product `C = self · other`.
    pub fn gemm(&self, other: &Self) -> Self {
        assert_eq!(self.ndim(), 2, "gemm requires 2D tensors");
        assert_eq!(other.ndim(), 2, "gemm requires 2D tensors");
        assert_eq!(
            self.shape()[1],
            other.shape()[0],
            "gemm dimension mismatch: [{}, {}] × [{}, {}]",
            self.shape()[0],
            self.shape()[1],
            other.shape()[0],
            other.shape()[1]
        );

        let m = self.shape()[0];
        let k = self.shape()[1];
        let n = other.shape()[1];

        // Ensure inputs are contiguous
        let a = self.contiguous();
        let b = other.contiguous();

        let c_storage = self.backend().gemm(
            a.storage().expect("contiguous tensor has storage"),
            m,
            k,
            b.storage().expect("contiguous tensor has storage"),
            n,
        );

        Self::from_raw(
            c_storage,
            vec![m, n],
            compute_contiguous_strides(&[m, n]),
            0,
            self.backend().clone(),
        )
    }

    /// Pairwise tensor contraction using the reshape-to-GEMM strategy.
    ///
    /// `ia` and `ib` assign an integer label to each dimension of `self` and
    /// `other`; labels appearing in both inputs but not in `iy` are summed
    /// over. Every output label must come from exactly one input (no batch
    /// labels, no traces).
    ///
    /// # Example
    ///
    /// ```rust
    /// use ctmrg::backend::Cpu;
    /// use ctmrg::tensor::Tensor;
    ///
    /// // A[i,j,k] × B[j,k,l] → C[i,l]
    /// let a = Tensor::<f64, Cpu>::from_data(&(0..24).map(|x| x as f64).collect::<Vec<_>>(), &[2, 3, 4]);
    /// let b = Tensor::<f64, Cpu>::from_data(&(0..60).map(|x| x as f64).collect::<Vec<_>>(), &[3, 4, 5]);
    /// let c = a.contract(&b, &[0, 1, 2], &[1, 2, 3], &[0, 3]);
    /// assert_eq!(c.shape(), &[2, 5]);
    /// ```
    pub fn contract(&self, other: &Self, ia: &[usize], ib: &[usize], iy: &[usize]) -> Self {
        assert_eq!(ia.len(), self.ndim(), "ia length must match self.ndim()");
        assert_eq!(ib.len(), other.ndim(), "ib length must match other.ndim()");

        let (left, right, contracted) = classify_indices(ia, ib, iy);

        let left_size: usize = left
            .iter()
            .map(|&i| self.shape()[index_of(ia, i)])
            .product::<usize>()
            .max(1);
        let right_size: usize = right
            .iter()
            .map(|&i| other.shape()[index_of(ib, i)])
            .product::<usize>()
            .max(1);
        let contract_size: usize = contracted
            .iter()
            .map(|&i| self.shape()[index_of(ia, i)])
            .product::<usize>()
            .max(1);

        for &i in &contracted {
            assert_eq!(
                self.shape()[index_of(ia, i)],
                other.shape()[index_of(ib, i)],
                "contracted index {} has mismatched dimensions",
                i
            );
        }

        // Permute A to [left, contracted] and B to [contracted, right]
        let a_perm = compute_permutation(ia, &left, &contracted);
        let a_matrix = self.permute(&a_perm).reshape(&[left_size, contract_size]);

        let b_perm = compute_permutation(ib, &contracted, &right);
        let b_matrix = other.permute(&b_perm).reshape(&[contract_size, right_size]);

        let c_matrix = a_matrix.gemm(&b_matrix);

        // Output shape in [left..., right...] order
        let mut shape_map = std::collections::HashMap::new();
        for (idx, &i) in ia.iter().enumerate() {
            shape_map.insert(i, self.shape()[idx]);
        }
        for (idx, &i) in ib.iter().enumerate() {
            shape_map.insert(i, other.shape()[idx]);
        }

        let mut out_shape = Vec::new();
        for &i in iy {
            out_shape.push(*shape_map.get(&i).expect("Output index not found"));
        }

        let current_order: Vec<usize> = left.iter().chain(right.iter()).copied().collect();
        let current_shape: Vec<usize> = current_order.iter().map(|i| shape_map[i]).collect();
        let c_shaped = c_matrix.reshape(&current_shape);

        if current_order == iy {
            c_shaped
        } else {
            let out_perm: Vec<usize> = iy
                .iter()
                .map(|i| current_order.iter().position(|x| x == i).unwrap())
                .collect();
            c_shaped.permute(&out_perm).contiguous()
        }
    }
}

/// Classify indices into left-only, right-only, and contracted.
///
/// A label shared by both inputs must be contracted (not kept in the
/// output), and every input label must appear exactly once in its tensor.
fn classify_indices(
    ia: &[usize],
    ib: &[usize],
    iy: &[usize],
) -> (Vec<usize>, Vec<usize>, Vec<usize>) {
    let ia_set: std::collections::HashSet<_> = ia.iter().copied().collect();
    let ib_set: std::collections::HashSet<_> = ib.iter().copied().collect();
    let iy_set: std::collections::HashSet<_> = iy.iter().copied().collect();

    assert_eq!(ia_set.len(), ia.len(), "Repeated label within ia");
    assert_eq!(ib_set.len(), ib.len(), "Repeated label within ib");

    let mut left = Vec::new();
    let mut contracted = Vec::new();

    for &i in ia {
        if ib_set.contains(&i) {
            assert!(
                !iy_set.contains(&i),
                "Label {} shared by both inputs cannot appear in the output",
                i
            );
            contracted.push(i);
        } else {
            left.push(i);
        }
    }

    let right: Vec<usize> = ib.iter().filter(|i| !ia_set.contains(i)).copied().collect();

    for &i in iy {
        assert!(
            (ia_set.contains(&i) || ib_set.contains(&i)) && !contracted.contains(&i),
            "Output label {} not produced by the contraction",
            i
        );
    }

    (left, right, contracted)
}

/// Find index of value in slice.
fn index_of(slice: &[usize], value: usize) -> usize {
    slice
        .iter()
        .position(|&x| x == value)
        .expect("Index not found")
}

/// Compute permutation to reorder labels into [first..., second...].
fn compute_permutation(current: &[usize], first: &[usize], second: &[usize]) -> Vec<usize> {
    first
        .iter()
        .chain(second.iter())
        .map(|i| {
            current
                .iter()
                .position(|x| x == i)
                .expect("Index not found")
        })
        .collect()
}
