//! Directional absorption moves.
//!
//! All four moves are one canonical absorption: the environment is rotated
//! until the target direction sits at west, a column of the double-layer
//! tensor is absorbed into `C_nw`, `T_w`, `C_sw`, and the result is rotated
//! back. Within a sweep the moves run in the fixed order N, E, S, W, each
//! consuming the previous move's output.

use crate::backend::Backend;
use crate::ctm::env::{Direction, Environment};
use crate::ctm::projector::ProjectorBuilder;
use crate::error::{CtmError, Result};
use crate::scalar::Scalar;
use crate::tensor::Tensor;

/// Result of one directional move.
pub struct MoveOutcome<T: Scalar, B: Backend> {
    /// The environment with the three absorbed tensors replaced.
    pub env: Environment<T, B>,
    /// Bond dimension actually kept on the truncated cuts.
    pub chi_eff: usize,
}

/// Absorb one layer of the double-layer tensor `a2` into the environment
/// along `direction`.
///
/// Pure function over its inputs: the caller decides whether to commit the
/// returned environment.
pub fn absorb<T: Scalar, B: Backend>(
    direction: Direction,
    env: &Environment<T, B>,
    a2: &Tensor<T, B>,
    chi: usize,
) -> Result<MoveOutcome<T, B>> {
    // Rotate so the target direction sits at west, absorb, rotate back.
    let turns = match direction {
        Direction::West => 0,
        Direction::North => 1,
        Direction::East => 2,
        Direction::South => 3,
    };

    let mut frame = env.clone();
    let mut a2_frame = a2.clone();
    for _ in 0..turns {
        frame = frame.rotated();
        a2_frame = rotate_double_layer(&a2_frame);
    }

    let (mut updated, chi_eff) = absorb_west(&frame, &a2_frame, chi)?;
    for _ in 0..(4 - turns) % 4 {
        updated = updated.rotated();
    }

    Ok(MoveOutcome {
        env: updated,
        chi_eff,
    })
}

/// One full sweep: N, E, S, W in sequence.
pub fn sweep<T: Scalar, B: Backend>(
    env: &Environment<T, B>,
    a2: &Tensor<T, B>,
    chi: usize,
) -> Result<Environment<T, B>> {
    let mut current = env.clone();
    for direction in Direction::SWEEP {
        current = absorb(direction, &current, a2, chi)?.env;
    }
    Ok(current)
}

/// Relabel the double layer `[u, l, d, r]` under a 90° counterclockwise
/// lattice rotation, matching [`Environment::rotated`].
fn rotate_double_layer<T: Scalar, B: Backend>(a2: &Tensor<T, B>) -> Tensor<T, B> {
    // new [u, l, d, r] = old [r, u, l, d]
    a2.permute(&[3, 0, 1, 2])
}

/// The canonical west absorption.
///
/// Inserts one column of `a2` next to the west edge, builds the projector
/// pair from the upper and lower half-systems, and renormalizes `C_nw`,
/// `T_w`, `C_sw` back to at most `chi`.
fn absorb_west<T: Scalar, B: Backend>(
    env: &Environment<T, B>,
    a2: &Tensor<T, B>,
    chi: usize,
) -> Result<(Environment<T, B>, usize)> {
    let [c_nw, c_ne, c_se, c_sw] = &env.corners;
    let [t_n, t_e, t_s, t_w] = &env.edges;

    let d2 = a2.shape()[0];
    let lo = t_w.shape()[0]; // toward C_sw
    let up = t_w.shape()[2]; // toward C_nw
    let n_r = t_n.shape()[2];
    let n_l = t_n.shape()[0];
    let s_r = t_s.shape()[0];
    let s_l = t_s.shape()[2];
    let e_u = t_e.shape()[0];
    let e_d = t_e.shape()[2];

    // Enlarged north-west corner:
    //   rows (T_w.d ⊗ A.d) face the cut below the absorbed cell,
    //   cols (T_n.r ⊗ A.r) face the north-east quadrant.
    let q_nw = t_w.contract(c_nw, &[0, 1, 2], &[2, 3], &[0, 1, 3]);
    let q_nw = q_nw.contract(t_n, &[0, 1, 2], &[2, 4, 5], &[0, 1, 4, 5]);
    let q_nw = q_nw.contract(a2, &[0, 1, 2, 3], &[2, 1, 4, 5], &[0, 4, 3, 5]);
    let q_nw = q_nw.reshape(&[lo * d2, n_r * d2]);

    // Enlarged north-east corner: rows (T_n.l ⊗ A.l), cols (T_e.d ⊗ A.d).
    let q_ne = t_n.contract(c_ne, &[0, 1, 2], &[2, 3], &[0, 1, 3]);
    let q_ne = q_ne.contract(t_e, &[0, 1, 2], &[2, 4, 5], &[0, 1, 4, 5]);
    let q_ne = q_ne.contract(a2, &[0, 1, 2, 3], &[1, 4, 5, 2], &[0, 4, 3, 5]);
    let q_ne = q_ne.reshape(&[n_l * d2, e_d * d2]);

    // Enlarged south-west corner: rows (T_w.u ⊗ A.u), cols (T_s.r ⊗ A.r).
    let q_sw = t_w.contract(c_sw, &[0, 1, 2], &[3, 0], &[3, 1, 2]);
    let q_sw = q_sw.contract(t_s, &[0, 1, 2], &[4, 5, 0], &[4, 5, 1, 2]);
    let q_sw = q_sw.contract(a2, &[0, 1, 2, 3], &[4, 2, 1, 5], &[3, 4, 0, 5]);
    let q_sw = q_sw.reshape(&[up * d2, s_r * d2]);

    // Enlarged south-east corner: rows (T_e.u ⊗ A.u), cols (T_s.l ⊗ A.l).
    let q_se = t_e.contract(c_se, &[0, 1, 2], &[2, 3], &[0, 1, 3]);
    let q_se = q_se.contract(t_s, &[0, 1, 2], &[2, 4, 5], &[0, 1, 4, 5]);
    let q_se = q_se.contract(a2, &[0, 1, 2, 3], &[4, 5, 2, 1], &[0, 4, 3, 5]);
    let q_se = q_se.reshape(&[e_u * d2, s_l * d2]);

    // Upper half (NW·NE over the shared north bond) and lower half
    // (SW·SE over the shared south bond). The halves expose the two west
    // cuts being truncated plus the shared east cut.
    let h_up = q_nw.contract(&q_ne, &[0, 1], &[1, 2], &[0, 2]);
    let h_bot = q_sw.contract(&q_se, &[0, 1], &[2, 1], &[0, 2]);

    let builder = ProjectorBuilder::from_halves(&h_up, &h_bot)?;
    let pair = match builder.isometries(chi) {
        Ok(pair) => pair,
        Err(CtmError::RankDeficiency {
            requested,
            available,
        }) => {
            log::warn!(
                "enlarged west bond carries {} significant singular values ({} requested); \
                 truncating to the available rank",
                available,
                requested
            );
            builder.isometries(available)?
        }
        Err(other) => return Err(other),
    };

    // Absorb the column: the corners eat the adjacent edge piece, the west
    // edge eats the site. Each enlarged cut is closed with one isometry of
    // the pair, conjugated on the edge side.
    let c_nw_new = c_nw
        .contract(t_n, &[0, 1], &[1, 2, 3], &[0, 2, 3])
        .reshape(&[up * d2, n_r])
        .contract(&pair.upper, &[0, 1], &[0, 2], &[2, 1]);

    let c_sw_new = c_sw
        .contract(t_s, &[0, 1], &[2, 3, 0], &[2, 1, 3])
        .reshape(&[s_r, lo * d2])
        .contract(&pair.lower, &[0, 1], &[1, 2], &[0, 2]);

    let t_w_new = t_w
        .contract(a2, &[0, 1, 2], &[3, 1, 4, 5], &[0, 4, 5, 2, 3])
        .reshape(&[lo * d2, d2, up * d2])
        .contract(&pair.lower.conj(), &[0, 1, 2], &[0, 3], &[1, 2, 3])
        .contract(&pair.upper.conj(), &[0, 1, 2], &[1, 3], &[2, 0, 3]);

    let mut updated = env.clone();
    updated.corners[0] = renormalized(c_nw_new, "north-west corner")?;
    updated.corners[3] = renormalized(c_sw_new, "south-west corner")?;
    updated.edges[3] = renormalized(t_w_new, "west edge")?;

    Ok((updated, pair.chi_eff))
}

/// Scale a freshly absorbed tensor by its largest element, rejecting
/// collapsed or non-finite results.
fn renormalized<T: Scalar, B: Backend>(t: Tensor<T, B>, what: &str) -> Result<Tensor<T, B>> {
    let norm = t.max_abs();
    if !norm.is_finite() {
        return Err(CtmError::Numerical(format!(
            "{} became non-finite during absorption",
            what
        )));
    }
    if norm == 0.0 {
        return Err(CtmError::Numerical(format!(
            "{} vanished during absorption",
            what
        )));
    }
    Ok(t.scale(1.0 / norm))
}
