/// Shared helpers: synthetic epoched recordings with a known spatial
/// structure, so bad channels and repair quality can be verified against
/// ground truth.
use std::f64::consts::PI;

use exg_ransac::EpochSet;
use ndarray::{Array2, Array3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[allow(unused)]
pub fn channel_names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("ch{i:02}")).collect()
}

#[allow(unused)]
/// Fibonacci-spiral sensor layout on the unit sphere.
pub fn sphere_positions(n: usize) -> Array2<f32> {
    let golden = PI * (3.0 - 5.0_f64.sqrt());
    Array2::from_shape_fn((n, 3), |(i, d)| {
        let y = 1.0 - 2.0 * (i as f64 + 0.5) / n as f64;
        let r = (1.0 - y * y).sqrt();
        let theta = golden * i as f64;
        let v = match d {
            0 => r * theta.cos(),
            1 => y,
            _ => r * theta.sin(),
        };
        v as f32
    })
}

#[allow(unused)]
/// Spatially smooth epochs: every channel mixes three latent oscillations
/// with weights given by its position, so any channel is predictable from
/// its neighbors. Phases vary per trial.
pub fn smooth_epochs(
    n_trials: usize,
    n_samples: usize,
    positions: &Array2<f32>,
) -> Array3<f32> {
    let n_channels = positions.nrows();
    Array3::from_shape_fn((n_trials, n_channels, n_samples), |(e, c, t)| {
        let x = positions[[c, 0]] as f64;
        let y = positions[[c, 1]] as f64;
        let z = positions[[c, 2]] as f64;
        let tt = t as f64 / n_samples as f64;
        let p1 = e as f64 * 0.7 + 0.3;
        let p2 = e as f64 * 1.1 + 0.9;
        let p3 = e as f64 * 1.9 + 1.4;
        let v = x * (2.0 * PI * 3.0 * tt + p1).sin()
            + y * (2.0 * PI * 7.0 * tt + p2).sin()
            + z * (2.0 * PI * 11.0 * tt + p3).sin();
        v as f32
    })
}

#[allow(unused)]
/// Replace one channel, in every trial, with uniform noise uncorrelated
/// with its neighbors.
pub fn inject_noise_channel(data: &mut Array3<f32>, channel: usize, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let (n_trials, _, n_samples) = data.dim();
    for e in 0..n_trials {
        for t in 0..n_samples {
            data[[e, channel, t]] = rng.random_range(-0.5_f32..0.5);
        }
    }
}

#[allow(unused)]
pub fn epoch_set(data: Array3<f32>, positions: &Array2<f32>) -> EpochSet {
    let n_channels = data.dim().1;
    EpochSet::new(data, channel_names(n_channels), positions.clone()).unwrap()
}

#[allow(unused)]
/// One channel's samples concatenated across all trials, as f64.
pub fn concat_channel(data: &Array3<f32>, channel: usize) -> Vec<f64> {
    let (n_trials, _, n_samples) = data.dim();
    let mut out = Vec::with_capacity(n_trials * n_samples);
    for e in 0..n_trials {
        for t in 0..n_samples {
            out.push(data[[e, channel, t]] as f64);
        }
    }
    out
}

#[allow(unused)]
/// Pearson correlation between two equal-length sequences.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let ma = a.iter().sum::<f64>() / n;
    let mb = b.iter().sum::<f64>() / n;
    let mut sab = 0.0;
    let mut saa = 0.0;
    let mut sbb = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        sab += (x - ma) * (y - mb);
        saa += (x - ma) * (x - ma);
        sbb += (y - mb) * (y - mb);
    }
    sab / (saa.sqrt() * sbb.sqrt())
}
