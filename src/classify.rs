//! Bad-channel / bad-segment classification and the reject log.
//!
//! Consumes the `[E, C]` consensus score matrix and produces a
//! [`RejectLog`]: per-(trial, channel) badness plus the list of globally
//! bad channels under the configured [`BadChannelPolicy`].
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::config::BadChannelPolicy;

/// Absolute floor on the robust scale, so a degenerate MAD (more than half
/// the channels scoring identically) cannot flag near-ties.
const MIN_ROBUST_SCALE: f64 = 0.05;

/// Structured record of which trials/channels were judged bad.
///
/// Serializable as a plain mapping for the caller to persist or plot:
///
/// ```
/// # use exg_ransac::RejectLog;
/// # use ndarray::Array2;
/// let log = RejectLog {
///     ch_names: vec!["ch00".into(), "ch01".into()],
///     bad_channels: vec!["ch01".into()],
///     bad_segments: Array2::from_elem((3, 2), false),
///     scores: Array2::from_elem((3, 2), 1.0),
/// };
/// let json = serde_json::to_string(&log).unwrap();
/// let back: RejectLog = serde_json::from_str(&json).unwrap();
/// assert_eq!(back.bad_channels, log.bad_channels);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectLog {
    /// Channel names, in data order.
    pub ch_names: Vec<String>,
    /// Globally bad channels, in data order.
    pub bad_channels: Vec<String>,
    /// `[E, C]`: segment marked bad (score below the segment threshold).
    pub bad_segments: Array2<bool>,
    /// `[E, C]` consensus scores in [0, 1].
    pub scores: Array2<f64>,
}

impl RejectLog {
    /// Whether the given (trial, channel) segment was marked bad.
    pub fn is_bad(&self, trial: usize, channel: usize) -> bool {
        self.bad_segments[[trial, channel]]
    }

    /// Total number of bad (trial, channel) segments.
    pub fn n_bad_segments(&self) -> usize {
        self.bad_segments.iter().filter(|&&b| b).count()
    }

    /// Fraction of trials in which `channel` was marked bad.
    pub fn bad_fraction(&self, channel: usize) -> f64 {
        let n_trials = self.bad_segments.nrows();
        let bad = self
            .bad_segments
            .column(channel)
            .iter()
            .filter(|&&b| b)
            .count();
        bad as f64 / n_trials as f64
    }
}

/// Threshold the score matrix into a [`RejectLog`].
///
/// Deterministic given fixed scores and thresholds; consumes the scores and
/// stores them in the log for reporting.
pub fn classify(
    scores: Array2<f64>,
    ch_names: &[String],
    policy: &BadChannelPolicy,
    bad_segment_threshold: f64,
) -> RejectLog {
    let bad_segments = scores.mapv(|s| s < bad_segment_threshold);

    let channel_means: Vec<f64> = scores
        .mean_axis(Axis(0))
        .map(|m| m.to_vec())
        .unwrap_or_default();

    let channel_bad: Vec<bool> = match *policy {
        BadChannelPolicy::RobustZscore { cutoff } => {
            robust_low_outliers(&channel_means, cutoff)
        }
        BadChannelPolicy::FractionBadTrials { max_bad_fraction } => {
            let n_trials = bad_segments.nrows() as f64;
            bad_segments
                .axis_iter(Axis(1))
                .map(|col| {
                    let bad = col.iter().filter(|&&b| b).count() as f64;
                    bad / n_trials > max_bad_fraction
                })
                .collect()
        }
    };

    let bad_channels = ch_names
        .iter()
        .zip(&channel_bad)
        .filter(|(_, &bad)| bad)
        .map(|(name, _)| name.clone())
        .collect();

    RejectLog {
        ch_names: ch_names.to_vec(),
        bad_channels,
        bad_segments,
        scores,
    }
}

/// Low outliers under a robust z-score:
/// `(median − x) / max(1.4826·MAD, MIN_ROBUST_SCALE) > cutoff`.
fn robust_low_outliers(values: &[f64], cutoff: f64) -> Vec<bool> {
    let med = median(values);
    let deviations: Vec<f64> = values.iter().map(|&v| (v - med).abs()).collect();
    let mad = median(&deviations);
    let scale = (1.4826 * mad).max(MIN_ROBUST_SCALE);
    values.iter().map(|&v| (med - v) / scale > cutoff).collect()
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        0.5 * (sorted[n / 2 - 1] + sorted[n / 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("ch{i:02}")).collect()
    }

    #[test]
    fn low_outlier_flagged_by_robust_zscore() {
        // Channel 2 scores 0.0 while the rest sit near 1.0.
        let scores = arr2(&[
            [1.0, 0.98, 0.0, 0.96],
            [0.98, 1.0, 0.02, 1.0],
            [1.0, 0.96, 0.0, 0.98],
        ]);
        let log = classify(
            scores,
            &names(4),
            &BadChannelPolicy::RobustZscore { cutoff: 3.0 },
            0.5,
        );
        assert_eq!(log.bad_channels, vec!["ch02".to_string()]);
        assert!(log.is_bad(0, 2) && log.is_bad(1, 2) && log.is_bad(2, 2));
        assert_eq!(log.n_bad_segments(), 3);
        approx::assert_abs_diff_eq!(log.bad_fraction(2), 1.0);
        approx::assert_abs_diff_eq!(log.bad_fraction(0), 0.0);
    }

    #[test]
    fn near_ties_survive_degenerate_mad() {
        // More than half the channels score exactly 1.0 → MAD = 0; the
        // scale floor keeps the 0.97 channel from being flagged.
        let scores = arr2(&[[1.0, 1.0, 1.0, 0.97], [1.0, 1.0, 1.0, 0.97]]);
        let log = classify(
            scores,
            &names(4),
            &BadChannelPolicy::RobustZscore { cutoff: 3.0 },
            0.5,
        );
        assert!(log.bad_channels.is_empty());
    }

    #[test]
    fn fraction_policy_counts_bad_trials() {
        // Channel 1 is bad in 3 of 4 trials, channel 0 in 1 of 4.
        let scores = arr2(&[
            [1.0, 0.1],
            [0.2, 0.1],
            [1.0, 0.1],
            [1.0, 1.0],
        ]);
        let log = classify(
            scores,
            &names(2),
            &BadChannelPolicy::FractionBadTrials { max_bad_fraction: 0.4 },
            0.5,
        );
        assert_eq!(log.bad_channels, vec!["ch01".to_string()]);
    }

    #[test]
    fn uniform_scores_flag_nothing() {
        let scores = Array2::from_elem((5, 8), 1.0);
        let log = classify(
            scores,
            &names(8),
            &BadChannelPolicy::RobustZscore { cutoff: 3.0 },
            0.5,
        );
        assert!(log.bad_channels.is_empty());
        assert_eq!(log.n_bad_segments(), 0);
    }
}
