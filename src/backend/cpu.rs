//! CPU backend implementation.

use super::traits::{Backend, Device, Storage};
use crate::error::Result;
use crate::scalar::{Scalar, SvdFactors};

/// CPU backend using Vec storage.
#[derive(Clone, Debug, Default)]
pub struct Cpu;

impl<T: Scalar> Storage<T> for Vec<T> {
    #[inline]
    fn len(&self) -> usize {
        Vec::len(self)
    }

    #[inline]
    fn get(&self, index: usize) -> T {
        self[index]
    }

    #[inline]
    fn set(&mut self, index: usize, value: T) {
        self[index] = value;
    }

    #[inline]
    fn to_vec(&self) -> Vec<T> {
        self.clone()
    }

    #[inline]
    fn from_slice(data: &[T]) -> Self {
        data.to_vec()
    }
}

impl Backend for Cpu {
    type Storage<T: Scalar> = Vec<T>;

    fn name() -> &'static str {
        "cpu"
    }

    fn try_from_device(device: &Device) -> Result<Self> {
        match device {
            Device::Cpu => Ok(Cpu),
            Device::Accelerator(_) => Err(crate::error::CtmError::Device {
                device: device.clone(),
                reason: "no accelerator backend compiled into this build".to_string(),
            }),
        }
    }

    fn alloc<T: Scalar>(&self, len: usize) -> Vec<T> {
        vec![T::default(); len]
    }

    fn from_slice<T: Scalar>(&self, data: &[T]) -> Vec<T> {
        data.to_vec()
    }

    fn copy_strided<T: Scalar>(
        &self,
        src: &Vec<T>,
        shape: &[usize],
        strides: &[usize],
        offset: usize,
    ) -> Vec<T> {
        let numel: usize = shape.iter().product();
        let mut dst = vec![T::default(); numel];

        // Iterate over all indices and copy
        let mut indices = vec![0usize; shape.len()];
        for dst_elem in dst.iter_mut() {
            // Compute source offset using strides
            let src_offset: usize = offset
                + indices
                    .iter()
                    .zip(strides.iter())
                    .map(|(i, s)| i * s)
                    .sum::<usize>();

            *dst_elem = src[src_offset];

            // Increment indices (column-major order: first dimension first)
            for dim in 0..shape.len() {
                indices[dim] += 1;
                if indices[dim] < shape[dim] {
                    break;
                }
                indices[dim] = 0;
            }
        }

        dst
    }

    fn gemm<T: Scalar>(&self, a: &Vec<T>, m: usize, k: usize, b: &Vec<T>, n: usize) -> Vec<T> {
        T::gemm(a, m, k, b, n)
    }

    fn svd<T: Scalar>(&self, a: &Vec<T>, m: usize, n: usize) -> SvdFactors<T> {
        T::svd(a, m, n)
    }
}
