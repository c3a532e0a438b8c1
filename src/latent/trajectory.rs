//! Interpolation schemes between latent states.
//!
//! All schemes are pure: they take endpoints by reference and return freshly allocated states
//! that keep the first endpoint's `sample_shape`.

use std::f64::consts::TAU;

use crate::foundation::error::{InrError, InrResult};
use crate::foundation::math::{dot, l2_norm, linspace, unit_rescale};
use crate::latent::state::{LatentState, Trajectory};

/// Below this, `sin(theta)` is treated as zero and slerp refuses the endpoints.
const SLERP_MIN_SIN: f64 = 1e-6;

fn check_same_shape(z1: &LatentState, z2: &LatentState) -> InrResult<()> {
    if z1.sample_shape() != z2.sample_shape() {
        return Err(InrError::precondition(format!(
            "latent endpoints differ in shape: {:?} vs {:?}",
            z1.sample_shape(),
            z2.sample_shape()
        )));
    }
    Ok(())
}

/// Linear interpolation: `n + 2` states, `z1` first and `z2` last, evenly spaced in between.
pub fn lerp(z1: &LatentState, z2: &LatentState, n: usize) -> InrResult<Trajectory> {
    check_same_shape(z1, z2)?;
    let steps = (n + 1) as f64;
    let mut out = Vec::with_capacity(n + 2);
    out.push(z1.clone());
    for i in 1..=n {
        let t = i as f64 / steps;
        let sample = z1
            .sample()
            .iter()
            .zip(z2.sample())
            .map(|(&a, &b)| (f64::from(a) + (f64::from(b) - f64::from(a)) * t) as f32)
            .collect();
        out.push(z1.with_sample(sample));
    }
    out.push(z1.with_sample(z2.sample().to_vec()));
    Ok(out)
}

/// Spherical interpolation on the unit hypersphere.
///
/// Unlike textbook slerp, the `n` output angles sweep a full turn `[0, 2*pi)` in the plane spanned
/// by the normalized endpoints instead of the `[0, theta]` arc. The result is a closed loop that
/// starts at `normalize(z1)`, passes `normalize(z2)`, and returns near its start: use it for
/// cyclical animations, not endpoint-to-endpoint paths.
///
/// Each row of the last axis is normalized and rotated independently. Endpoints that are
/// (anti)parallel leave the rotation plane undefined and are rejected.
pub fn slerp(z1: &LatentState, z2: &LatentState, n: usize) -> InrResult<Trajectory> {
    check_same_shape(z1, z2)?;

    struct RowPlane {
        a: Vec<f64>,
        b: Vec<f64>,
        theta: f64,
        sin_theta: f64,
    }

    let mut planes = Vec::new();
    for (r1, r2) in z1.rows().zip(z2.rows()) {
        let a: Vec<f64> = r1.iter().map(|&v| f64::from(v)).collect();
        let b: Vec<f64> = r2.iter().map(|&v| f64::from(v)).collect();
        let (na, nb) = (l2_norm(&a), l2_norm(&b));
        if na == 0.0 || nb == 0.0 {
            return Err(InrError::precondition("slerp endpoints must be non-zero"));
        }
        let a: Vec<f64> = a.iter().map(|v| v / na).collect();
        let b: Vec<f64> = b.iter().map(|v| v / nb).collect();
        let theta = dot(&a, &b).clamp(-1.0, 1.0).acos();
        let sin_theta = theta.sin();
        if sin_theta.abs() < SLERP_MIN_SIN {
            return Err(InrError::precondition(
                "slerp endpoints are (anti)parallel; the interpolation angle is degenerate",
            ));
        }
        planes.push(RowPlane {
            a,
            b,
            theta,
            sin_theta,
        });
    }

    let mut angles = linspace(0.0, TAU, n + 1);
    angles.pop();

    let out = angles
        .into_iter()
        .map(|angle| {
            let mut sample = Vec::with_capacity(z1.sample().len());
            for p in &planes {
                let alpha = (p.theta - angle).sin() / p.sin_theta;
                let beta = angle.sin() / p.sin_theta;
                sample.extend(
                    p.a.iter()
                        .zip(&p.b)
                        .map(|(x, y)| (alpha * x + beta * y) as f32),
                );
            }
            z1.with_sample(sample)
        })
        .collect();
    Ok(out)
}

/// One lemniscate sample, kept as two real-valued latents.
///
/// `x` and `y` are the curve's two axes, each rescaled onto the `[z1, z2]` segment. A figure-eight
/// needs both axes, so they are not folded into one latent; callers either render both or pick
/// one with [`PlanarState::axis`].
#[derive(Clone, Debug, PartialEq)]
pub struct PlanarState {
    pub x: LatentState,
    pub y: LatentState,
}

/// Which axis of a [`PlanarState`] to take.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanarAxis {
    X,
    Y,
}

impl PlanarState {
    pub fn axis(&self, axis: PlanarAxis) -> &LatentState {
        match axis {
            PlanarAxis::X => &self.x,
            PlanarAxis::Y => &self.y,
        }
    }
}

/// Project a lemniscate trajectory onto one axis, giving a drop-in real trajectory.
pub fn planar_axis(states: &[PlanarState], axis: PlanarAxis) -> Trajectory {
    states.iter().map(|s| s.axis(axis).clone()).collect()
}

/// Figure-eight (lemniscate of Bernoulli) over `n + 2` samples of `t in [0, 2*pi]`.
///
/// Both curve axes are min-max normalized to `[0, 1]` and mapped affinely onto `z1 -> z2`.
pub fn lemniscate(
    z1: &LatentState,
    z2: &LatentState,
    n: usize,
    a: f64,
) -> InrResult<Vec<PlanarState>> {
    check_same_shape(z1, z2)?;
    let t = linspace(0.0, TAU, n + 2);
    let mut xs: Vec<f64> = t
        .iter()
        .map(|&t| a * t.cos() / (1.0 + t.sin().powi(2)))
        .collect();
    let mut ys: Vec<f64> = t
        .iter()
        .map(|&t| a * t.cos() * t.sin() / (1.0 + t.sin().powi(2)))
        .collect();
    unit_rescale(&mut xs);
    unit_rescale(&mut ys);

    let along = |w: f64| {
        let sample = z1
            .sample()
            .iter()
            .zip(z2.sample())
            .map(|(&p, &q)| (f64::from(p) + (f64::from(q) - f64::from(p)) * w) as f32)
            .collect();
        z1.with_sample(sample)
    };

    Ok(xs
        .into_iter()
        .zip(ys)
        .map(|(wx, wy)| PlanarState {
            x: along(wx),
            y: along(wy),
        })
        .collect())
}

#[cfg(test)]
#[path = "../../tests/unit/latent/trajectory.rs"]
mod tests;
