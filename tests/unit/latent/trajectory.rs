use super::*;

fn row(v: &[f32]) -> LatentState {
    LatentState::row(v.to_vec())
}

fn norm32(v: &[f32]) -> f64 {
    v.iter().map(|&x| f64::from(x) * f64::from(x)).sum::<f64>().sqrt()
}

#[test]
fn lerp_returns_n_plus_two_with_exact_endpoints() {
    let z1 = row(&[0.1, -0.7, 0.3]);
    let z2 = row(&[0.9, 0.2, -0.4]);
    let states = lerp(&z1, &z2, 5).unwrap();
    assert_eq!(states.len(), 7);
    assert_eq!(states[0].sample(), z1.sample());
    assert_eq!(states[6].sample(), z2.sample());
    for s in &states {
        assert_eq!(s.sample_shape(), z1.sample_shape());
    }
}

#[test]
fn lerp_is_evenly_spaced() {
    let z1 = row(&[0.0, 10.0]);
    let z2 = row(&[4.0, 2.0]);
    let states = lerp(&z1, &z2, 3).unwrap();
    for w in states.windows(2) {
        let d0 = w[1].sample()[0] - w[0].sample()[0];
        let d1 = w[1].sample()[1] - w[0].sample()[1];
        assert!((d0 - 1.0).abs() < 1e-6);
        assert!((d1 + 2.0).abs() < 1e-6);
    }
}

#[test]
fn lerp_rejects_shape_mismatch() {
    assert!(lerp(&row(&[0.0, 1.0]), &row(&[0.0, 1.0, 2.0]), 2).is_err());
}

#[test]
fn slerp_states_are_unit_norm_with_constant_step() {
    let z1 = row(&[1.0, 0.5, -0.25, 2.0]);
    let z2 = row(&[-0.3, 1.2, 0.8, 0.1]);
    let states = slerp(&z1, &z2, 12).unwrap();
    assert_eq!(states.len(), 12);
    for s in &states {
        assert!((norm32(s.sample()) - 1.0).abs() < 1e-5);
        assert_eq!(s.sample_shape(), &[1, 4]);
    }

    let angle = |a: &LatentState, b: &LatentState| {
        let d: f64 = a
            .sample()
            .iter()
            .zip(b.sample())
            .map(|(&x, &y)| f64::from(x) * f64::from(y))
            .sum();
        d.clamp(-1.0, 1.0).acos()
    };
    let first = angle(&states[0], &states[1]);
    assert!((first - std::f64::consts::TAU / 12.0).abs() < 1e-4);
    for w in states.windows(2) {
        assert!((angle(&w[0], &w[1]) - first).abs() < 1e-4);
    }
}

#[test]
fn slerp_starts_at_normalized_first_endpoint() {
    let z1 = row(&[3.0, 4.0]);
    let z2 = row(&[0.0, 1.0]);
    let states = slerp(&z1, &z2, 4).unwrap();
    assert!((states[0].sample()[0] - 0.6).abs() < 1e-6);
    assert!((states[0].sample()[1] - 0.8).abs() < 1e-6);
}

#[test]
fn slerp_rejects_parallel_endpoints() {
    let z1 = row(&[1.0, 2.0]);
    let z2 = row(&[2.0, 4.0]);
    assert!(slerp(&z1, &z2, 8).is_err());
}

#[test]
fn lemniscate_axes_stay_within_endpoints() {
    let z1 = row(&[-1.0, 0.0]);
    let z2 = row(&[1.0, 2.0]);
    let states = lemniscate(&z1, &z2, 30, 1.0).unwrap();
    assert_eq!(states.len(), 32);
    for s in &states {
        for st in [&s.x, &s.y] {
            assert_eq!(st.sample_shape(), z1.sample_shape());
            assert!(st.sample()[0] >= -1.0 - 1e-6 && st.sample()[0] <= 1.0 + 1e-6);
            assert!(st.sample()[1] >= -1e-6 && st.sample()[1] <= 2.0 + 1e-6);
        }
    }
    // t = 0 is the rightmost point of the curve: x axis at z2.
    assert!((states[0].x.sample()[0] - 1.0).abs() < 1e-6);

    let xs = planar_axis(&states, PlanarAxis::X);
    assert_eq!(xs.len(), 32);
    assert_eq!(xs[3], states[3].x);
}

#[test]
fn lemniscate_with_no_interior_points_is_finite() {
    let z1 = row(&[0.0]);
    let z2 = row(&[1.0]);
    let states = lemniscate(&z1, &z2, 0, 1.0).unwrap();
    assert_eq!(states.len(), 2);
    assert!(states.iter().all(|s| s.x.sample()[0].is_finite()));
}
