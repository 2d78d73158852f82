//! Random channel sub-sampling.
//!
//! All randomness flows through one explicitly seeded generator, so a run
//! is reproducible from `(data, config)` alone.
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use crate::error::{RansacError, Result};

/// Draw `n_resample` subsets of `subset_size` channel indices, each sampled
/// without replacement from `0..n_channels`. Subsets are independent draws
/// and may overlap across rounds. Indices come back sorted.
pub fn draw_subsets(
    n_channels: usize,
    subset_size: usize,
    n_resample: usize,
    seed: u64,
) -> Vec<Vec<usize>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n_resample)
        .map(|_| {
            let mut idx = index::sample(&mut rng, n_channels, subset_size).into_vec();
            idx.sort_unstable();
            idx
        })
        .collect()
}

/// Every channel must be left out of at least one subset, otherwise no
/// round ever predicts it and its consensus score is undefined. Checked
/// before scoring starts.
pub fn check_coverage(
    subsets: &[Vec<usize>],
    n_channels: usize,
    ch_names: &[String],
) -> Result<()> {
    let mut predicted = vec![false; n_channels];
    for subset in subsets {
        let mut member = vec![false; n_channels];
        for &i in subset {
            member[i] = true;
        }
        for (c, m) in member.iter().enumerate() {
            if !m {
                predicted[c] = true;
            }
        }
    }
    if let Some(index) = predicted.iter().position(|&p| !p) {
        return Err(RansacError::InsufficientCoverage {
            name: ch_names[index].clone(),
            index,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_subsets() {
        let a = draw_subsets(20, 6, 50, 42);
        let b = draw_subsets(20, 6, 50, 42);
        assert_eq!(a, b);
        let c = draw_subsets(20, 6, 50, 43);
        assert_ne!(a, c);
    }

    #[test]
    fn subsets_are_without_replacement() {
        for subset in draw_subsets(12, 5, 30, 7) {
            assert_eq!(subset.len(), 5);
            for w in subset.windows(2) {
                assert!(w[0] < w[1], "duplicate or unsorted index in {subset:?}");
            }
            assert!(*subset.last().unwrap() < 12);
        }
    }

    #[test]
    fn uncovered_channel_detected() {
        let names: Vec<String> = (0..4).map(|i| format!("ch{i:02}")).collect();
        // One subset of 3 out of 4 channels: the members are never predicted.
        let subsets = vec![vec![0, 1, 2]];
        let err = check_coverage(&subsets, 4, &names);
        match err {
            Err(RansacError::InsufficientCoverage { index, .. }) => assert_eq!(index, 0),
            other => panic!("expected coverage error, got {other:?}"),
        }

        // A second subset leaving out the rest fixes coverage.
        let subsets = vec![vec![0, 1, 2], vec![1, 2, 3]];
        assert!(check_coverage(&subsets, 4, &names).is_ok());
    }
}
