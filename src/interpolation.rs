//! Spherical-spline spatial interpolation (Perrin et al. 1989).
//!
//! Algorithm:
//!   1. Project sensor positions onto the unit sphere.
//!   2. G[i, j] = g(cos ∠(pᵢ, pⱼ)) with g a truncated Legendre series
//!      (stiffness m = 4, 50 terms).
//!   3. Regularize the reference block (G += 1e-5·I) and border it with a
//!      constant term so constant fields are reproduced exactly.
//!   4. Pseudo-invert the bordered system; the weight matrix maps reference
//!      signals to estimates at the target positions.
//!
//! The weights depend on geometry only, so one matrix is reused across all
//! trials of an epoch set.
use std::f64::consts::PI;

use nalgebra::DMatrix;
use ndarray::{Array2, ArrayView2, Axis};

use crate::error::{RansacError, Result};

/// Geometric minimum: a spherical spline needs 3 non-collinear reference
/// positions.
pub const MIN_REFERENCE_POSITIONS: usize = 3;

const STIFFNESS: i32 = 4;
const N_LEGENDRE_TERMS: usize = 50;
/// Diagonal loading of the reference Gram block.
const REGULARIZATION: f64 = 1e-5;
/// Singular values below this are dropped in the pseudo-inverse.
const PINV_EPS: f64 = 1e-10;

/// Build the interpolation weight matrix `[n_to, n_from]` estimating each
/// target channel's signal as a weighted combination of the reference
/// channels' signals.
///
/// `pos_from` / `pos_to` are `[n, 3]` sensor positions. `stage` names the
/// calling pipeline stage for error context.
///
/// Pure function of geometry: no signal values are involved, so the result
/// can be applied to any number of trials.
pub fn interpolation_matrix(
    pos_from: ArrayView2<'_, f32>,
    pos_to: ArrayView2<'_, f32>,
    stage: &'static str,
) -> Result<Array2<f64>> {
    let from = unit_rows(pos_from, stage, "reference")?;
    let to = unit_rows(pos_to, stage, "target")?;
    check_spanning(&from, stage)?;

    let n_from = from.len();
    let n_to = to.len();

    let g_from = DMatrix::from_fn(n_from, n_from, |i, j| {
        g_kernel(dot(&from[i], &from[j])) + if i == j { REGULARIZATION } else { 0.0 }
    });
    let g_to_from =
        DMatrix::from_fn(n_to, n_from, |i, j| g_kernel(dot(&to[i], &from[j])));

    // Bordered system: [[G, 1], [1ᵀ, 0]]. The constant column absorbs the
    // mean so constant fields interpolate exactly.
    let c = DMatrix::from_fn(n_from + 1, n_from + 1, |i, j| {
        if i < n_from && j < n_from {
            g_from[(i, j)]
        } else if i == n_from && j == n_from {
            0.0
        } else {
            1.0
        }
    });
    let c_inv = c.pseudo_inverse(PINV_EPS).map_err(|e| RansacError::Geometry {
        stage,
        reason: format!("interpolation system is not solvable: {e}"),
    })?;

    let lhs = DMatrix::from_fn(n_to, n_from + 1, |i, j| {
        if j < n_from { g_to_from[(i, j)] } else { 1.0 }
    });
    let weights = lhs * c_inv.columns(0, n_from).into_owned();

    Ok(Array2::from_shape_fn((n_to, n_from), |(i, j)| weights[(i, j)]))
}

/// Apply a weight matrix to reference signals: `[n_to, n_from] · [n_from, T]`.
pub fn apply_weights(weights: &Array2<f64>, reference: ArrayView2<'_, f32>) -> Array2<f64> {
    let reference = reference.mapv(|v| v as f64);
    weights.dot(&reference)
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn unit_rows(
    pos: ArrayView2<'_, f32>,
    stage: &'static str,
    what: &str,
) -> Result<Vec<[f64; 3]>> {
    pos.axis_iter(Axis(0))
        .enumerate()
        .map(|(i, row)| {
            let v = [row[0] as f64, row[1] as f64, row[2] as f64];
            let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            if !norm.is_finite() || norm < 1e-12 {
                return Err(RansacError::Geometry {
                    stage,
                    reason: format!("{what} position {i} has zero length"),
                });
            }
            Ok([v[0] / norm, v[1] / norm, v[2] / norm])
        })
        .collect()
}

/// At least 3 positions spanning a plane through the sphere: the largest
/// cross product of difference vectors must not vanish.
fn check_spanning(from: &[[f64; 3]], stage: &'static str) -> Result<()> {
    if from.len() < MIN_REFERENCE_POSITIONS {
        return Err(RansacError::Geometry {
            stage,
            reason: format!(
                "{} reference positions, need at least {MIN_REFERENCE_POSITIONS}",
                from.len()
            ),
        });
    }
    let a = from[0];
    let mut max_cross = 0.0_f64;
    for i in 1..from.len() {
        for j in (i + 1)..from.len() {
            let u = sub(&from[i], &a);
            let v = sub(&from[j], &a);
            let cx = u[1] * v[2] - u[2] * v[1];
            let cy = u[2] * v[0] - u[0] * v[2];
            let cz = u[0] * v[1] - u[1] * v[0];
            max_cross = max_cross.max((cx * cx + cy * cy + cz * cz).sqrt());
        }
    }
    if max_cross < 1e-9 {
        return Err(RansacError::Geometry {
            stage,
            reason: "reference positions are collinear".into(),
        });
    }
    Ok(())
}

fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn sub(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Legendre-series kernel g(x) = Σₙ (2n+1) / (nᵐ (n+1)ᵐ 4π) · Pₙ(x),
/// n = 1..=50, m = 4. Pₙ via the three-term recurrence.
fn g_kernel(cosang: f64) -> f64 {
    let x = cosang.clamp(-1.0, 1.0);
    let mut acc = 0.0;
    let mut p_prev = 1.0; // P₀
    let mut p_cur = x; // P₁
    for n in 1..=N_LEGENDRE_TERMS {
        let nf = n as f64;
        let factor =
            (2.0 * nf + 1.0) / (nf.powi(STIFFNESS) * (nf + 1.0).powi(STIFFNESS) * 4.0 * PI);
        acc += factor * p_cur;
        let p_next = ((2.0 * nf + 1.0) * x * p_cur - nf * p_prev) / (nf + 1.0);
        p_prev = p_cur;
        p_cur = p_next;
    }
    acc
}
