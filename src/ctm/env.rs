//! The CTMRG environment: four corners and four edges.
//!
//! Index conventions follow the clockwise boundary walk
//! `C_nw → T_n → C_ne → T_e → C_se → T_s → C_sw → T_w → C_nw`: every corner
//! is `[prev, next]`, every edge is `[prev, bulk, next]` with the bulk leg
//! facing the lattice center. With this convention a 90° lattice rotation is
//! pure relabeling, so all four directional moves reduce to one canonical
//! absorption.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::backend::Backend;
use crate::error::Result;
use crate::linalg;
use crate::scalar::Scalar;
use crate::tensor::Tensor;

/// Lattice corner positions, clockwise from north-west.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    NorthWest = 0,
    NorthEast = 1,
    SouthEast = 2,
    SouthWest = 3,
}

/// Lattice edge directions, clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Direction {
    /// Sweep order for a full absorption pass.
    pub const SWEEP: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];
}

/// The χ-truncated boundary of the infinite lattice around one site.
///
/// Corner tensors are rank 2 with dimensions at most `(χ, χ)`; edge tensors
/// are rank 3 with dimensions at most `(χ, bondim², χ)`. Dimensions below χ
/// are carried as-is, never zero-padded.
#[derive(Debug, Clone)]
pub struct Environment<T: Scalar, B: Backend> {
    pub(crate) chi: usize,
    /// Corners in [NW, NE, SE, SW] order.
    pub(crate) corners: [Tensor<T, B>; 4],
    /// Edges in [N, E, S, W] order.
    pub(crate) edges: [Tensor<T, B>; 4],
}

impl<T: Scalar, B: Backend> Environment<T, B> {
    /// Seed the environment by partially tracing the double-layer tensor
    /// over its outward legs, one reduction per corner and edge.
    ///
    /// The seeded tensors have dimension `bondim²` on every boundary bond;
    /// the first sweep truncates them toward χ.
    pub fn from_site_reduction(a2: &Tensor<T, B>, chi: usize) -> Self {
        // a2 axes are [u, l, d, r]
        let c_nw = a2.sum_axis(0).sum_axis(0); // [d, r]
        let t_n = a2.sum_axis(0); // [l, d, r]
        let c_ne = a2.sum_axis(0).sum_axis(2); // [l, d]
        let t_e = a2.sum_axis(3); // [u, l, d]
        let c_se = a2.sum_axis(2).sum_axis(2); // [u, l]
        let t_s = a2.sum_axis(2).permute(&[2, 0, 1]); // [r, u, l]
        let c_sw = a2.sum_axis(1).sum_axis(1).permute(&[1, 0]); // [r, u]
        let t_w = a2.sum_axis(1).permute(&[1, 2, 0]); // [d, r, u]

        Self {
            chi,
            corners: [
                rescaled(c_nw),
                rescaled(c_ne),
                rescaled(c_se),
                rescaled(c_sw),
            ],
            edges: [rescaled(t_n), rescaled(t_e), rescaled(t_s), rescaled(t_w)],
        }
    }

    /// Seed the environment with uniform random tensors at bond dimension χ.
    pub fn random(chi: usize, bond_sq: usize, seed: u64, backend: B) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut sample = |shape: &[usize]| {
            let numel: usize = shape.iter().product();
            let data: Vec<T> = (0..numel).map(|_| T::sample_uniform(&mut rng)).collect();
            rescaled(Tensor::from_data_with_backend(&data, shape, backend.clone()))
        };

        let corners = [
            sample(&[chi, chi]),
            sample(&[chi, chi]),
            sample(&[chi, chi]),
            sample(&[chi, chi]),
        ];
        let edges = [
            sample(&[chi, bond_sq, chi]),
            sample(&[chi, bond_sq, chi]),
            sample(&[chi, bond_sq, chi]),
            sample(&[chi, bond_sq, chi]),
        ];

        Self { chi, corners, edges }
    }

    /// Target bond dimension.
    pub fn chi(&self) -> usize {
        self.chi
    }

    /// Corner tensor at the given position.
    pub fn corner(&self, which: Corner) -> &Tensor<T, B> {
        &self.corners[which as usize]
    }

    /// Edge tensor for the given direction.
    pub fn edge(&self, which: Direction) -> &Tensor<T, B> {
        &self.edges[which as usize]
    }

    /// Relabel the environment under a 90° counterclockwise lattice
    /// rotation (north maps to west). Zero-copy.
    pub(crate) fn rotated(&self) -> Self {
        let c = &self.corners;
        let e = &self.edges;
        Self {
            chi: self.chi,
            // new [NW, NE, SE, SW] = old [NE, SE, SW, NW]
            corners: [c[1].clone(), c[2].clone(), c[3].clone(), c[0].clone()],
            // new [N, E, S, W] = old [E, S, W, N]
            edges: [e[1].clone(), e[2].clone(), e[3].clone(), e[0].clone()],
        }
    }

    /// Normalized singular-value spectrum of each corner, in
    /// [NW, NE, SE, SW] order. The four factorizations are independent and
    /// run in parallel.
    pub fn corner_spectra(&self) -> Result<[Vec<f64>; 4]> {
        let spectra: Result<Vec<Vec<f64>>> = self
            .corners
            .par_iter()
            .map(linalg::normalized_spectrum)
            .collect();
        let spectra = spectra?;
        Ok(spectra
            .try_into()
            .expect("four corners yield four spectra"))
    }
}

/// Normalize a freshly built environment tensor by its largest element.
///
/// Leaves zero tensors untouched; the callers that care about collapse check
/// for it explicitly.
fn rescaled<T: Scalar, B: Backend>(t: Tensor<T, B>) -> Tensor<T, B> {
    let norm = t.max_abs();
    if norm > 0.0 && norm.is_finite() {
        t.scale(1.0 / norm)
    } else {
        t
    }
}
