//! Consensus scoring across sub-sample rounds.
//!
//! Each round treats its subset as "good", predicts every other channel by
//! spatial interpolation, and votes per (trial, channel) on whether the
//! prediction agrees with the observed signal. Rounds only read shared
//! immutable inputs and write private integer accumulators, so they run on
//! a worker pool and merge by plain summation; the worker count never
//! changes the result.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ndarray::{Array2, ArrayView1, Axis};
use rayon::prelude::*;

use crate::epoch::EpochSet;
use crate::error::{RansacError, Result};
use crate::interpolation;

/// Variance below this (per sample, after mean centering) counts as a flat
/// segment: automatic disagreement.
const VARIANCE_FLOOR: f64 = 1e-18;

struct RoundCounts {
    predicted: Array2<u32>,
    agreed: Array2<u32>,
}

/// Consensus score matrix `[E, C]`: for every (trial, channel) pair, the
/// fraction of predicting rounds whose correlation with the observed signal
/// exceeded `correlation_threshold`.
///
/// `cancel` aborts rounds that have not yet started; a cancelled fit
/// returns [`RansacError::Cancelled`] and no partial scores.
pub fn consensus_scores(
    epochs: &EpochSet,
    subsets: &[Vec<usize>],
    correlation_threshold: f64,
    n_workers: usize,
    cancel: &Arc<AtomicBool>,
) -> Result<Array2<f64>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(n_workers)
        .build()
        .map_err(|e| RansacError::Config(format!("cannot build worker pool: {e}")))?;

    let partials: Result<Vec<RoundCounts>> = pool.install(|| {
        subsets
            .par_iter()
            .map(|subset| {
                if cancel.load(Ordering::Relaxed) {
                    return Err(RansacError::Cancelled);
                }
                score_round(epochs, subset, correlation_threshold)
            })
            .collect()
    });
    let partials = partials?;

    let (n_trials, n_channels) = (epochs.n_trials(), epochs.n_channels());
    let mut predicted = Array2::<u32>::zeros((n_trials, n_channels));
    let mut agreed = Array2::<u32>::zeros((n_trials, n_channels));
    for counts in &partials {
        predicted += &counts.predicted;
        agreed += &counts.agreed;
    }

    let mut scores = Array2::<f64>::zeros((n_trials, n_channels));
    for ((e, c), &n_pred) in predicted.indexed_iter() {
        if n_pred == 0 {
            // The pre-scoring coverage check makes this unreachable for a
            // validated config; surface it rather than divide by zero.
            return Err(RansacError::InsufficientCoverage {
                name: epochs.ch_names()[c].clone(),
                index: c,
            });
        }
        scores[[e, c]] = agreed[[e, c]] as f64 / n_pred as f64;
    }
    Ok(scores)
}

/// One consensus round: interpolate all non-subset channels from the subset
/// and vote on every trial.
fn score_round(
    epochs: &EpochSet,
    subset: &[usize],
    correlation_threshold: f64,
) -> Result<RoundCounts> {
    let n_channels = epochs.n_channels();
    let n_trials = epochs.n_trials();

    let mut member = vec![false; n_channels];
    for &i in subset {
        member[i] = true;
    }
    let targets: Vec<usize> = (0..n_channels).filter(|&c| !member[c]).collect();

    let positions = epochs.positions();
    let pos_from = positions.select(Axis(0), subset);
    let pos_to = positions.select(Axis(0), &targets);
    let weights = interpolation::interpolation_matrix(pos_from.view(), pos_to.view(), "scoring")?;

    let mut predicted = Array2::<u32>::zeros((n_trials, n_channels));
    let mut agreed = Array2::<u32>::zeros((n_trials, n_channels));
    for e in 0..n_trials {
        let trial = epochs.trial(e);
        let reference = trial.select(Axis(0), subset);
        let estimate = interpolation::apply_weights(&weights, reference.view());
        for (i, &c) in targets.iter().enumerate() {
            predicted[[e, c]] += 1;
            if let Some(r) = pearson(estimate.row(i), trial.row(c)) {
                if r > correlation_threshold {
                    agreed[[e, c]] += 1;
                }
            }
        }
    }
    Ok(RoundCounts { predicted, agreed })
}

/// Pearson correlation over the time axis, computed on mean-centered
/// signals. `None` when either side is numerically flat.
fn pearson(prediction: ArrayView1<'_, f64>, observed: ArrayView1<'_, f32>) -> Option<f64> {
    let n = prediction.len() as f64;
    let mean_p = prediction.sum() / n;
    let mean_o = observed.iter().map(|&v| v as f64).sum::<f64>() / n;

    let mut spo = 0.0;
    let mut spp = 0.0;
    let mut soo = 0.0;
    for (&p, &o) in prediction.iter().zip(observed.iter()) {
        let dp = p - mean_p;
        let dobs = o as f64 - mean_o;
        spo += dp * dobs;
        spp += dp * dp;
        soo += dobs * dobs;
    }
    if spp / n <= VARIANCE_FLOOR || soo / n <= VARIANCE_FLOOR {
        return None;
    }
    let r = spo / (spp.sqrt() * soo.sqrt());
    r.is_finite().then_some(r)
}
