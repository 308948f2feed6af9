//! PEPS site tensors.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::backend::Backend;
use crate::error::{CtmError, Result};
use crate::scalar::Scalar;
use crate::tensor::Tensor;

/// One PEPS lattice site: rank-5, indexed `[phys, up, left, down, right]`
/// with all four virtual bonds of equal dimension.
///
/// Immutable input to the environment computation; one instance describes a
/// translationally invariant lattice.
#[derive(Debug, Clone)]
pub struct SiteTensor<T: Scalar, B: Backend> {
    data: Tensor<T, B>,
}

impl<T: Scalar, B: Backend> SiteTensor<T, B> {
    /// Wrap a rank-5 tensor, checking the index layout.
    pub fn new(data: Tensor<T, B>) -> Result<Self> {
        if data.ndim() != 5 {
            return Err(CtmError::Configuration(format!(
                "site tensor must be rank 5 [phys, up, left, down, right], got rank {}",
                data.ndim()
            )));
        }
        let shape = data.shape();
        if shape[0] == 0 {
            return Err(CtmError::Configuration(
                "site tensor physical dimension must be at least 1".to_string(),
            ));
        }
        let bond = shape[1];
        if bond == 0 || shape[2] != bond || shape[3] != bond || shape[4] != bond {
            return Err(CtmError::Configuration(format!(
                "site tensor virtual bonds must be equal and nonzero, got {:?}",
                &shape[1..]
            )));
        }
        Ok(Self { data })
    }

    /// Build from column-major data.
    pub fn from_data(data: &[T], phys: usize, bond: usize, backend: B) -> Result<Self> {
        let shape = [phys, bond, bond, bond, bond];
        if data.len() != shape.iter().product::<usize>() {
            return Err(CtmError::Configuration(format!(
                "site tensor data has {} elements, shape {:?} needs {}",
                data.len(),
                shape,
                shape.iter().product::<usize>()
            )));
        }
        Self::new(Tensor::from_data_with_backend(data, &shape, backend))
    }

    /// Uniform random site tensor normalized by its largest element.
    pub fn random(phys: usize, bond: usize, seed: u64, backend: B) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let numel = phys * bond * bond * bond * bond;
        let data: Vec<T> = (0..numel).map(|_| T::sample_uniform(&mut rng)).collect();
        let t = Tensor::from_data_with_backend(&data, &[phys, bond, bond, bond, bond], backend);
        let norm = t.max_abs();
        let t = if norm > 0.0 { t.scale(1.0 / norm) } else { t };
        Self { data: t }
    }

    /// Product state: bond dimension 1, physical amplitudes given.
    pub fn product_state(amplitudes: &[T], backend: B) -> Result<Self> {
        Self::from_data(amplitudes, amplitudes.len(), 1, backend)
    }

    /// Physical index dimension.
    pub fn phys_dim(&self) -> usize {
        self.data.shape()[0]
    }

    /// Virtual bond dimension.
    pub fn bond_dim(&self) -> usize {
        self.data.shape()[1]
    }

    /// The underlying rank-5 tensor.
    pub fn tensor(&self) -> &Tensor<T, B> {
        &self.data
    }

    /// Double-layer transfer tensor `A[u, l, d, r]`.
    ///
    /// Contracts the site with its own conjugate over the physical index and
    /// fuses each ket/bra bond pair, so every index has dimension
    /// `bond_dim²`. This is the only object the environment ever sees.
    pub fn double_layer(&self) -> Tensor<T, B> {
        let d = self.bond_dim();
        let d2 = d * d;
        let bra = self.data.conj();

        // a[p,u,l,d,r] · conj(a)[p,u',l',d',r'] with ket/bra legs interleaved
        let dl = self.data.contract(
            &bra,
            &[0, 1, 2, 3, 4],
            &[0, 5, 6, 7, 8],
            &[1, 5, 2, 6, 3, 7, 4, 8],
        );
        dl.reshape(&[d2, d2, d2, d2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Cpu;
    use num_complex::Complex64;

    #[test]
    fn test_rejects_wrong_rank() {
        let t = Tensor::<f64, Cpu>::zeros(&[2, 2, 2, 2]);
        assert!(SiteTensor::new(t).is_err());
    }

    #[test]
    fn test_rejects_unequal_bonds() {
        let t = Tensor::<f64, Cpu>::zeros(&[2, 2, 2, 3, 2]);
        assert!(SiteTensor::new(t).is_err());
    }

    #[test]
    fn test_product_state_double_layer() {
        // |v|² collapses to a single number for bond dimension 1
        let site = SiteTensor::<f64, Cpu>::product_state(&[0.6, 0.8], Cpu).unwrap();
        assert_eq!(site.bond_dim(), 1);
        assert_eq!(site.phys_dim(), 2);

        let dl = site.double_layer();
        assert_eq!(dl.shape(), &[1, 1, 1, 1]);
        assert!((dl.to_vec()[0] - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_double_layer_shape() {
        let site = SiteTensor::<f64, Cpu>::random(2, 3, 7, Cpu);
        let dl = site.double_layer();
        assert_eq!(dl.shape(), &[9, 9, 9, 9]);
    }

    #[test]
    fn test_double_layer_real_for_complex_site() {
        // Fused diagonal entries of a ket/bra pairing are |a|² sums
        let site = SiteTensor::<Complex64, Cpu>::random(2, 2, 11, Cpu);
        let dl = site.double_layer();
        let v = dl.to_vec();

        // Entry with every fused index on its diagonal (ket == bra): index
        // (0,0) fused on all four legs is flat index 0.
        assert!(v[0].im.abs() < 1e-14);
        assert!(v[0].re >= 0.0);
    }

    #[test]
    fn test_random_is_deterministic() {
        let a = SiteTensor::<f64, Cpu>::random(2, 2, 42, Cpu);
        let b = SiteTensor::<f64, Cpu>::random(2, 2, 42, Cpu);
        assert_eq!(a.tensor().to_vec(), b.tensor().to_vec());
    }
}
