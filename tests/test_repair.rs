mod common;

use common::{epoch_set, inject_noise_channel, smooth_epochs, sphere_positions};
use exg_ransac::{repair, EpochSet, Ransac, RansacConfig, RansacError};
use ndarray::{Array2, Array3};

/// An empty bad set passes the input through unchanged.
#[test]
fn no_bad_channels_is_a_passthrough() {
    let positions = sphere_positions(12);
    let epochs = epoch_set(smooth_epochs(4, 64, &positions), &positions);

    let out = repair(&epochs, &[]).unwrap();
    assert_eq!(out, epochs);
}

/// Repairing an already-repaired set with the same bad channels changes
/// nothing beyond floating-point noise.
#[test]
fn repair_is_idempotent() {
    let positions = sphere_positions(20);
    let mut data = smooth_epochs(6, 80, &positions);
    inject_noise_channel(&mut data, 5, 11);
    let epochs = epoch_set(data, &positions);

    let mut ransac = Ransac::new(RansacConfig {
        sample_fraction: 0.3,
        ..RansacConfig::default()
    })
    .unwrap();
    let once = ransac.fit_transform(&epochs).unwrap();
    let twice = ransac.transform(&once).unwrap();

    let max_diff = once
        .data()
        .iter()
        .zip(twice.data().iter())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0_f32, f32::max);
    assert!(max_diff < 1e-4, "second repair moved the data by {max_diff}");
}

/// A directly repaired channel tracks the smooth field its neighbors
/// define.
#[test]
fn repaired_channel_matches_neighbors() {
    let positions = sphere_positions(20);
    let truth = smooth_epochs(5, 100, &positions);
    let mut data = truth.clone();
    inject_noise_channel(&mut data, 8, 3);
    let epochs = epoch_set(data, &positions);

    let out = repair(&epochs, &["ch08".to_string()]).unwrap();
    let repaired = common::concat_channel(out.data(), 8);
    let reference = common::concat_channel(&truth, 8);
    let r = common::pearson(&repaired, &reference);
    assert!(r > 0.8, "repaired channel correlates only {r:.3}");

    // Good channels are untouched.
    for c in [0, 3, 15] {
        assert_eq!(
            common::concat_channel(out.data(), c),
            common::concat_channel(epochs.data(), c)
        );
    }
}

#[test]
fn too_few_good_channels_is_a_geometry_error() {
    let positions = sphere_positions(20);
    let epochs = epoch_set(smooth_epochs(2, 32, &positions), &positions);

    let bad: Vec<String> = (0..18).map(|i| format!("ch{i:02}")).collect();
    let err = repair(&epochs, &bad).unwrap_err();
    assert!(matches!(err, RansacError::Geometry { .. }), "got {err:?}");
}

#[test]
fn collinear_good_channels_are_a_geometry_error() {
    // All sensors on one axis: no plane to interpolate over.
    let n = 6;
    let positions = Array2::from_shape_fn((n, 3), |(c, d)| {
        if d == 0 { (c + 1) as f32 } else { 0.0 }
    });
    let names: Vec<String> = (0..n).map(|i| format!("ch{i:02}")).collect();
    let epochs = EpochSet::new(
        Array3::from_shape_fn((2, n, 32), |(e, c, t)| (e + c + t) as f32 * 0.01),
        names,
        positions,
    )
    .unwrap();

    let err = repair(&epochs, &["ch02".to_string()]).unwrap_err();
    assert!(matches!(err, RansacError::Geometry { .. }), "got {err:?}");
}

#[test]
fn unknown_bad_channel_is_a_config_error() {
    let positions = sphere_positions(8);
    let epochs = epoch_set(smooth_epochs(2, 32, &positions), &positions);
    let err = repair(&epochs, &["nope".to_string()]).unwrap_err();
    assert!(matches!(err, RansacError::Config(_)));
}
