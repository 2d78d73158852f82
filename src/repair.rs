//! Repair: overwrite globally bad channels with spatial interpolation from
//! the remaining good channels.
use ndarray::{s, Axis};
use tracing::debug;

use crate::epoch::EpochSet;
use crate::error::{RansacError, Result};
use crate::interpolation::{self, MIN_REFERENCE_POSITIONS};

/// Produce a copy of `epochs` with every channel in `bad_channels`
/// replaced, in all trials, by its spherical-spline estimate from the good
/// channels. The input is never mutated.
///
/// An empty bad set returns the input unchanged (as a clone). Fails with a
/// geometry error when fewer than 3 good channels remain.
pub fn repair(epochs: &EpochSet, bad_channels: &[String]) -> Result<EpochSet> {
    let mut bad_idx = Vec::with_capacity(bad_channels.len());
    for name in bad_channels {
        match epochs.channel_index(name) {
            Some(i) => bad_idx.push(i),
            None => {
                return Err(RansacError::Config(format!(
                    "bad channel {name:?} not present in the epoch set"
                )))
            }
        }
    }

    if bad_idx.is_empty() {
        return Ok(epochs.clone());
    }
    bad_idx.sort_unstable();

    let good_idx: Vec<usize> =
        (0..epochs.n_channels()).filter(|c| !bad_idx.contains(c)).collect();
    if good_idx.len() < MIN_REFERENCE_POSITIONS {
        return Err(RansacError::Geometry {
            stage: "repair",
            reason: format!(
                "{} good channels remain, need at least {MIN_REFERENCE_POSITIONS}",
                good_idx.len()
            ),
        });
    }

    let positions = epochs.positions();
    let pos_from = positions.select(Axis(0), &good_idx);
    let pos_to = positions.select(Axis(0), &bad_idx);
    let weights = interpolation::interpolation_matrix(pos_from.view(), pos_to.view(), "repair")?;
    debug!(
        n_bad = bad_idx.len(),
        n_good = good_idx.len(),
        "interpolating bad channels"
    );

    let mut data = epochs.data().clone();
    for e in 0..epochs.n_trials() {
        let reference = epochs.trial(e).select(Axis(0), &good_idx);
        let estimate = interpolation::apply_weights(&weights, reference.view());
        for (i, &c) in bad_idx.iter().enumerate() {
            let row = estimate.row(i).mapv(|v| v as f32);
            data.slice_mut(s![e, c, ..]).assign(&row);
        }
    }

    EpochSet::new(data, epochs.ch_names().to_vec(), positions.clone())
}
