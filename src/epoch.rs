//! Epoched multichannel data container.
//!
//! An [`EpochSet`] bundles a `[E, C, T]` signal tensor with the channel
//! names and 3-D sensor positions the spatial stages need. All trials share
//! the same channel count, ordering and sample count by construction.
use ndarray::{s, Array2, Array3, ArrayView2};

use crate::error::{RansacError, Result};

/// Epoched recording: `E` trials × `C` channels × `T` time samples, plus
/// per-channel names and positions (`[C, 3]`, metres).
///
/// The pipeline never mutates an `EpochSet`; repair produces a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochSet {
    data: Array3<f32>,
    ch_names: Vec<String>,
    positions: Array2<f32>,
}

impl EpochSet {
    /// Build an epoch set, validating the shape invariants:
    /// matching channel counts everywhere, unique channel names, at least
    /// two time samples (a correlation needs that many), finite positions.
    pub fn new(
        data: Array3<f32>,
        ch_names: Vec<String>,
        positions: Array2<f32>,
    ) -> Result<Self> {
        let (n_trials, n_channels, n_samples) = data.dim();
        if n_trials == 0 || n_channels == 0 {
            return Err(RansacError::Config(format!(
                "epoch data must be non-empty, got [{n_trials}, {n_channels}, {n_samples}]"
            )));
        }
        if n_samples < 2 {
            return Err(RansacError::Config(format!(
                "each trial needs at least 2 time samples, got {n_samples}"
            )));
        }
        if ch_names.len() != n_channels {
            return Err(RansacError::Config(format!(
                "{} channel names for {} channels",
                ch_names.len(),
                n_channels
            )));
        }
        for (i, name) in ch_names.iter().enumerate() {
            if ch_names[..i].contains(name) {
                return Err(RansacError::Config(format!(
                    "duplicate channel name {name:?}"
                )));
            }
        }
        if positions.dim() != (n_channels, 3) {
            return Err(RansacError::Config(format!(
                "positions must be [{n_channels}, 3], got {:?}",
                positions.dim()
            )));
        }
        if positions.iter().any(|v| !v.is_finite()) {
            return Err(RansacError::Config(
                "channel positions must be finite".into(),
            ));
        }
        Ok(Self { data, ch_names, positions })
    }

    pub fn n_trials(&self) -> usize {
        self.data.dim().0
    }

    pub fn n_channels(&self) -> usize {
        self.data.dim().1
    }

    pub fn n_samples(&self) -> usize {
        self.data.dim().2
    }

    /// The full `[E, C, T]` tensor.
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn ch_names(&self) -> &[String] {
        &self.ch_names
    }

    /// Channel positions `[C, 3]` in metres.
    pub fn positions(&self) -> &Array2<f32> {
        &self.positions
    }

    /// One trial as a `[C, T]` view.
    pub fn trial(&self, e: usize) -> ArrayView2<'_, f32> {
        self.data.slice(s![e, .., ..])
    }

    /// Index of a channel by name.
    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.ch_names.iter().position(|n| n == name)
    }
}
