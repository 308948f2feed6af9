//! Scalar types supported by the tensor machinery.
//!
//! CTMRG runs either in `f64` (real transfer matrices) or
//! [`Complex64`] (non-Hermitian transfer matrices or states carrying a
//! phase). All environment code is generic over [`Scalar`] and only touches
//! dtype-specific behavior through conjugation and the dense kernels below.

use std::fmt::Debug;
use std::ops::{Add, Mul};

use faer::Mat;
use num_complex::Complex64;
use num_traits::{One, Zero};
use rand::Rng;

/// Numeric dtype of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    /// IEEE-754 double precision.
    Real64,
    /// Double-precision complex.
    Complex128,
}

/// Thin-SVD factors in column-major layout: `A = U diag(S) Vᴴ`.
///
/// `u` is `nrows × k`, `v` is `ncols × k`, `s` holds the `k = min(nrows,
/// ncols)` singular values in descending order. Singular values are real for
/// both dtypes.
pub struct SvdFactors<T> {
    pub u: Vec<T>,
    pub s: Vec<f64>,
    pub v: Vec<T>,
    pub nrows: usize,
    pub ncols: usize,
    pub k: usize,
}

/// Marker + capability trait for scalar types usable in tensors.
///
/// The GEMM and SVD kernels take column-major data; implementations go
/// through faer.
pub trait Scalar:
    Copy
    + Clone
    + Send
    + Sync
    + Default
    + Debug
    + PartialEq
    + 'static
    + bytemuck::Pod
    + Zero
    + One
    + Add<Output = Self>
    + Mul<Output = Self>
{
    /// The runtime dtype tag matching this type.
    const DTYPE: DType;

    /// Embed a real number.
    fn from_re(x: f64) -> Self;

    /// Complex conjugate (identity for reals).
    fn conj(self) -> Self;

    /// Magnitude.
    fn abs(self) -> f64;

    /// Multiply by a real factor.
    fn scale(self, factor: f64) -> Self;

    /// Sample uniformly from the unit box (each component in `[-1, 1)`).
    fn sample_uniform<R: Rng>(rng: &mut R) -> Self;

    /// Dense matrix product `C = A·B` with `A` m×k and `B` k×n.
    fn gemm(a: &[Self], m: usize, k: usize, b: &[Self], n: usize) -> Vec<Self>;

    /// Thin SVD of an m×n matrix.
    fn svd(a: &[Self], m: usize, n: usize) -> SvdFactors<Self>;
}

impl Scalar for f64 {
    const DTYPE: DType = DType::Real64;

    #[inline]
    fn from_re(x: f64) -> Self {
        x
    }

    #[inline]
    fn conj(self) -> Self {
        self
    }

    #[inline]
    fn abs(self) -> f64 {
        f64::abs(self)
    }

    #[inline]
    fn scale(self, factor: f64) -> Self {
        self * factor
    }

    fn sample_uniform<R: Rng>(rng: &mut R) -> Self {
        rng.gen_range(-1.0..1.0)
    }

    fn gemm(a: &[Self], m: usize, k: usize, b: &[Self], n: usize) -> Vec<Self> {
        let a_mat = Mat::from_fn(m, k, |i, j| a[j * m + i]);
        let b_mat = Mat::from_fn(k, n, |i, j| b[j * k + i]);
        let c_mat = &a_mat * &b_mat;

        let mut c = vec![0.0f64; m * n];
        for j in 0..n {
            for i in 0..m {
                c[j * m + i] = c_mat.read(i, j);
            }
        }
        c
    }

    fn svd(a: &[Self], m: usize, n: usize) -> SvdFactors<Self> {
        let mat = Mat::from_fn(m, n, |i, j| a[j * m + i]);
        let svd = mat.thin_svd();
        let k = m.min(n);

        let s_diag = svd.s_diagonal();
        let mut s = Vec::with_capacity(k);
        for i in 0..k {
            s.push(s_diag.read(i));
        }

        let u_ref = svd.u();
        let mut u = vec![0.0f64; m * k];
        for j in 0..k {
            for i in 0..m {
                u[j * m + i] = u_ref.read(i, j);
            }
        }

        let v_ref = svd.v();
        let mut v = vec![0.0f64; n * k];
        for j in 0..k {
            for i in 0..n {
                v[j * n + i] = v_ref.read(i, j);
            }
        }

        SvdFactors {
            u,
            s,
            v,
            nrows: m,
            ncols: n,
            k,
        }
    }
}

impl Scalar for Complex64 {
    const DTYPE: DType = DType::Complex128;

    #[inline]
    fn from_re(x: f64) -> Self {
        Complex64::new(x, 0.0)
    }

    #[inline]
    fn conj(self) -> Self {
        Complex64::conj(&self)
    }

    #[inline]
    fn abs(self) -> f64 {
        self.norm()
    }

    #[inline]
    fn scale(self, factor: f64) -> Self {
        Complex64::new(self.re * factor, self.im * factor)
    }

    fn sample_uniform<R: Rng>(rng: &mut R) -> Self {
        Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
    }

    fn gemm(a: &[Self], m: usize, k: usize, b: &[Self], n: usize) -> Vec<Self> {
        let a_mat = Mat::from_fn(m, k, |i, j| a[j * m + i]);
        let b_mat = Mat::from_fn(k, n, |i, j| b[j * k + i]);
        let c_mat = &a_mat * &b_mat;

        let mut c = vec![Complex64::new(0.0, 0.0); m * n];
        for j in 0..n {
            for i in 0..m {
                c[j * m + i] = c_mat.read(i, j);
            }
        }
        c
    }

    fn svd(a: &[Self], m: usize, n: usize) -> SvdFactors<Self> {
        let mat = Mat::from_fn(m, n, |i, j| a[j * m + i]);
        let svd = mat.thin_svd();
        let k = m.min(n);

        // Singular values of a complex matrix are real; faer stores them on
        // the diagonal with zero imaginary part.
        let s_diag = svd.s_diagonal();
        let mut s = Vec::with_capacity(k);
        for i in 0..k {
            s.push(s_diag.read(i).re);
        }

        let u_ref = svd.u();
        let mut u = vec![Complex64::new(0.0, 0.0); m * k];
        for j in 0..k {
            for i in 0..m {
                u[j * m + i] = u_ref.read(i, j);
            }
        }

        let v_ref = svd.v();
        let mut v = vec![Complex64::new(0.0, 0.0); n * k];
        for j in 0..k {
            for i in 0..n {
                v[j * n + i] = v_ref.read(i, j);
            }
        }

        SvdFactors {
            u,
            s,
            v,
            nrows: m,
            ncols: n,
            k,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_conj_is_identity() {
        assert_eq!(Scalar::conj(2.5f64), 2.5);
        assert_eq!(Scalar::abs(-3.0f64), 3.0);
    }

    #[test]
    fn test_complex_conj_and_abs() {
        let z = Complex64::new(3.0, -4.0);
        assert_eq!(Scalar::conj(z), Complex64::new(3.0, 4.0));
        assert!((Scalar::abs(z) - 5.0).abs() < 1e-14);
    }

    #[test]
    fn test_from_re_embeds_reals() {
        assert_eq!(<f64 as Scalar>::from_re(2.5), 2.5);
        assert_eq!(<Complex64 as Scalar>::from_re(2.5), Complex64::new(2.5, 0.0));
    }

    #[test]
    fn test_gemm_f64() {
        // [1 3] [1 3]   [7  15]
        // [2 4] [2 4] = [10 22]   (column-major data)
        let a = vec![1.0, 2.0, 3.0, 4.0];
        let b = vec![1.0, 2.0, 3.0, 4.0];
        let c = <f64 as Scalar>::gemm(&a, 2, 2, &b, 2);
        assert_eq!(c, vec![7.0, 10.0, 15.0, 22.0]);
    }

    #[test]
    fn test_gemm_complex() {
        // (i·I) · (i·I) = -I
        let i = Complex64::new(0.0, 1.0);
        let z = Complex64::new(0.0, 0.0);
        let a = vec![i, z, z, i];
        let c = <Complex64 as Scalar>::gemm(&a, 2, 2, &a, 2);
        assert!((c[0] - Complex64::new(-1.0, 0.0)).norm() < 1e-14);
        assert!(c[1].norm() < 1e-14);
        assert!((c[3] - Complex64::new(-1.0, 0.0)).norm() < 1e-14);
    }

    #[test]
    fn test_svd_diagonal_f64() {
        // diag(3, 1): singular values [3, 1] in descending order
        let a = vec![3.0, 0.0, 0.0, 1.0];
        let fac = <f64 as Scalar>::svd(&a, 2, 2);
        assert_eq!(fac.k, 2);
        assert!((fac.s[0] - 3.0).abs() < 1e-12);
        assert!((fac.s[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_svd_reconstruction_f64() {
        let a = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]; // 2x3, column-major
        let fac = <f64 as Scalar>::svd(&a, 2, 3);
        assert_eq!(fac.k, 2);

        // A[i,j] = sum_t U[i,t] s[t] conj(V[j,t])
        for j in 0..3 {
            for i in 0..2 {
                let mut acc = 0.0;
                for t in 0..fac.k {
                    acc += fac.u[t * 2 + i] * fac.s[t] * fac.v[t * 3 + j];
                }
                assert!(
                    (acc - a[j * 2 + i]).abs() < 1e-10,
                    "mismatch at ({}, {}): {} vs {}",
                    i,
                    j,
                    acc,
                    a[j * 2 + i]
                );
            }
        }
    }

    #[test]
    fn test_svd_unitary_columns_complex() {
        let a: Vec<Complex64> = (0..9)
            .map(|x| Complex64::new(x as f64, (x % 3) as f64 - 1.0))
            .collect();
        let fac = <Complex64 as Scalar>::svd(&a, 3, 3);

        // Columns of U are orthonormal
        for c1 in 0..fac.k {
            for c2 in 0..fac.k {
                let mut acc = Complex64::new(0.0, 0.0);
                for i in 0..3 {
                    acc += Scalar::conj(fac.u[c1 * 3 + i]) * fac.u[c2 * 3 + i];
                }
                let expect = if c1 == c2 { 1.0 } else { 0.0 };
                assert!((acc - Complex64::new(expect, 0.0)).norm() < 1e-10);
            }
        }
    }
}
