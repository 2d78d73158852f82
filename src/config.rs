//! RANSAC configuration.
//!
//! [`RansacConfig`] holds every tunable parameter of the consensus pipeline.
//! All fields have defaults matching the reference PREP/autoreject settings.

use crate::error::{RansacError, Result};
use crate::interpolation::MIN_REFERENCE_POSITIONS;

/// Configuration for the full RANSAC detection + repair pipeline.
///
/// All fields are `pub` so you can construct one with struct-update syntax:
///
/// ```
/// use exg_ransac::RansacConfig;
///
/// let cfg = RansacConfig {
///     n_resample: 100,        // more consensus rounds
///     sample_fraction: 0.3,   // larger reference subsets
///     ..RansacConfig::default()
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RansacConfig {
    /// Number of random sub-sample rounds.
    ///
    /// Each round draws a fresh reference subset, predicts every channel
    /// outside it, and contributes one vote per (trial, channel) pair.
    /// More rounds give smoother consensus scores at linear cost.
    ///
    /// Default: `50`.
    pub n_resample: usize,

    /// Fraction of channels drawn into each reference subset.
    ///
    /// The subset size is `floor(sample_fraction × n_channels)`; it must
    /// come out at least 3 (the geometric minimum for spatial
    /// interpolation) and strictly below the channel count, otherwise
    /// `fit` fails before any sampling occurs.
    ///
    /// Default: `0.25`.
    pub sample_fraction: f64,

    /// Per-round agreement cutoff on the Pearson correlation between the
    /// interpolated prediction and the observed signal.
    ///
    /// A round votes "agree" for a (trial, channel) pair only when the
    /// correlation over the time axis exceeds this value. Raising it never
    /// decreases the number of segments classified bad.
    ///
    /// Default: `0.75`.
    pub correlation_threshold: f64,

    /// Consensus score below which a single (trial, channel) segment is
    /// marked bad in the reject log.
    ///
    /// The score is the fraction of rounds that agreed, so `0.5` means
    /// "the majority of predicting rounds disagreed with this segment".
    ///
    /// Default: `0.5`.
    pub bad_segment_threshold: f64,

    /// Policy for promoting a channel from "bad in some trials" to
    /// globally bad. See [`BadChannelPolicy`].
    ///
    /// Default: `RobustZscore { cutoff: 3.0 }`.
    pub bad_channel_policy: BadChannelPolicy,

    /// Seed for the sub-sample generator. Identical seeds (with identical
    /// data and config) reproduce the run bit-for-bit.
    ///
    /// Default: `435656`.
    pub seed: u64,

    /// Worker threads for the consensus rounds. `0` uses all available
    /// execution units. The merge of per-round accumulators is an integer
    /// sum, so the worker count never changes the result.
    ///
    /// Default: `0`.
    pub n_workers: usize,
}

/// How per-channel consensus scores are thresholded into globally bad
/// channels.
#[derive(Debug, Clone, PartialEq)]
pub enum BadChannelPolicy {
    /// Flag channels whose mean score across trials is a low outlier under
    /// a robust z-score: `(median − score) / max(1.4826·MAD, 0.05) > cutoff`.
    ///
    /// The absolute floor on the scale keeps near-ties from being flagged
    /// when more than half the channels score identically (MAD = 0).
    RobustZscore { cutoff: f64 },

    /// Flag channels that are bad (score below `bad_segment_threshold`) in
    /// more than `max_bad_fraction` of trials. With `0.4` this reproduces
    /// the PREP `unbroken_time` rule.
    FractionBadTrials { max_bad_fraction: f64 },
}

impl Default for RansacConfig {
    /// Returns the reference settings: 50 rounds, 0.25 sample fraction,
    /// 0.75 correlation cutoff, robust z-score channel policy.
    fn default() -> Self {
        Self {
            n_resample: 50,
            sample_fraction: 0.25,
            correlation_threshold: 0.75,
            bad_segment_threshold: 0.5,
            bad_channel_policy: BadChannelPolicy::RobustZscore { cutoff: 3.0 },
            seed: 435656,
            n_workers: 0,
        }
    }
}

impl RansacConfig {
    /// Check every threshold and count for validity.
    ///
    /// Called by `Ransac::new`, so an invalid configuration never starts
    /// the pipeline.
    pub fn validate(&self) -> Result<()> {
        if self.n_resample == 0 {
            return Err(RansacError::Config("n_resample must be at least 1".into()));
        }
        if !(self.sample_fraction > 0.0 && self.sample_fraction < 1.0) {
            return Err(RansacError::Config(format!(
                "sample_fraction must lie in (0, 1), got {}",
                self.sample_fraction
            )));
        }
        if !(self.correlation_threshold > 0.0 && self.correlation_threshold < 1.0) {
            return Err(RansacError::Config(format!(
                "correlation_threshold must lie in (0, 1), got {}",
                self.correlation_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.bad_segment_threshold) {
            return Err(RansacError::Config(format!(
                "bad_segment_threshold must lie in [0, 1], got {}",
                self.bad_segment_threshold
            )));
        }
        match self.bad_channel_policy {
            BadChannelPolicy::RobustZscore { cutoff } => {
                if cutoff <= 0.0 {
                    return Err(RansacError::Config(format!(
                        "robust z-score cutoff must be positive, got {cutoff}"
                    )));
                }
            }
            BadChannelPolicy::FractionBadTrials { max_bad_fraction } => {
                if !(max_bad_fraction > 0.0 && max_bad_fraction < 1.0) {
                    return Err(RansacError::Config(format!(
                        "max_bad_fraction must lie in (0, 1), got {max_bad_fraction}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Reference-subset size for a recording with `n_channels` channels:
    /// `floor(sample_fraction × n_channels)`.
    ///
    /// Fails when the result is below the geometric minimum (3) or not
    /// strictly below the channel count.
    pub fn subset_size(&self, n_channels: usize) -> Result<usize> {
        let k = (self.sample_fraction * n_channels as f64).floor() as usize;
        if k < MIN_REFERENCE_POSITIONS {
            return Err(RansacError::Config(format!(
                "sample_fraction {} of {} channels gives subset size {}, \
                 need at least {} reference channels",
                self.sample_fraction, n_channels, k, MIN_REFERENCE_POSITIONS
            )));
        }
        if k >= n_channels {
            return Err(RansacError::Config(format!(
                "subset size {k} must be strictly below the channel count {n_channels}"
            )));
        }
        Ok(k)
    }
}
