//! Closed (periodic) B-spline trajectories through latent control points.

use crate::foundation::error::{InrError, InrResult};
use crate::foundation::math::{linspace, solve_dense};
use crate::latent::state::{LatentState, Trajectory};

/// Cardinal uniform B-spline of `degree`, supported on `[0, degree + 1)`.
fn cardinal_bspline(x: f64, degree: usize) -> f64 {
    if degree == 0 {
        return if (0.0..1.0).contains(&x) { 1.0 } else { 0.0 };
    }
    let d = degree as f64;
    (x * cardinal_bspline(x, degree - 1) + (d + 1.0 - x) * cardinal_bspline(x - 1.0, degree - 1))
        / d
}

/// Basis value of a control point at parameter offset `x`, wrapped with period `m`.
fn periodic_basis(x: f64, degree: usize, m: usize) -> f64 {
    let period = m as f64;
    let base = x.rem_euclid(period);
    let wraps = (degree + 1).div_ceil(m);
    (0..=wraps)
        .map(|k| cardinal_bspline(base + k as f64 * period, degree))
        .sum()
}

/// Closed spline through `z_points`, resampled at `n` parameters spanning one full loop.
///
/// The loop is closed: the first and last resampled states coincide with the first control point.
/// The spline degree is `min(degree, z_points.len() - 1)` so few control points stay well-posed.
/// Control points of any shape are flattened for fitting and restored on output, so bracketed
/// `(1, 1, dim)` latents behave like flat vectors.
pub fn rspline(z_points: &[LatentState], n: usize, degree: usize) -> InrResult<Trajectory> {
    let Some(first) = z_points.first() else {
        return Err(InrError::precondition("rspline needs at least 2 control points"));
    };
    let m = z_points.len();
    if m < 2 {
        return Err(InrError::precondition("rspline needs at least 2 control points"));
    }
    if let Some(bad) = z_points
        .iter()
        .find(|z| z.sample_shape() != first.sample_shape())
    {
        return Err(InrError::precondition(format!(
            "rspline control points differ in shape: {:?} vs {:?}",
            first.sample_shape(),
            bad.sample_shape()
        )));
    }
    let degree = degree.min(m - 1).max(1);
    let dims = first.sample().len();

    // Data point i sits at the peak of its basis function.
    let shift = (degree + 1) as f64 / 2.0;
    let mut basis = vec![0.0; m * m];
    for i in 0..m {
        for j in 0..m {
            basis[i * m + j] = periodic_basis(i as f64 + shift - j as f64, degree, m);
        }
    }

    let mut coeffs = vec![0.0f64; m * dims];
    for d in 0..dims {
        let mut a = basis.clone();
        let mut b: Vec<f64> = z_points
            .iter()
            .map(|z| f64::from(z.sample()[d]))
            .collect();
        solve_dense(&mut a, &mut b, m).ok_or_else(|| {
            InrError::precondition("rspline control points give a singular interpolation system")
        })?;
        for (j, v) in b.into_iter().enumerate() {
            coeffs[j * dims + d] = v;
        }
    }

    let out = linspace(0.0, 1.0, n)
        .into_iter()
        .map(|u| {
            let t = shift + u * m as f64;
            let mut sample = vec![0.0f64; dims];
            for j in 0..m {
                let w = periodic_basis(t - j as f64, degree, m);
                if w == 0.0 {
                    continue;
                }
                for (acc, c) in sample.iter_mut().zip(&coeffs[j * dims..(j + 1) * dims]) {
                    *acc += w * c;
                }
            }
            first.with_sample(sample.into_iter().map(|v| v as f32).collect())
        })
        .collect();
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/latent/spline.rs"]
mod tests;
