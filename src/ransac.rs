//! The RANSAC pipeline: fit → transform.
//!
//! Stages run strictly in order — sub-sampling, scoring, classification,
//! repair — each consuming the previous stage's output. A failure at any
//! stage aborts the run with that stage's error; no partial repaired output
//! is ever returned.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::classify::{classify, RejectLog};
use crate::config::RansacConfig;
use crate::epoch::EpochSet;
use crate::error::{RansacError, Result};
use crate::repair::repair;
use crate::score::consensus_scores;
use crate::subsample::{check_coverage, draw_subsets};

/// Handle for aborting a running fit. Rounds that have not started when
/// the flag flips are skipped; the fit returns [`RansacError::Cancelled`].
///
/// The flag is sticky: a cancelled [`Ransac`] stays cancelled, so build a
/// fresh one to fit again.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Consensus-based bad-channel detector and repairer.
///
/// ```no_run
/// use exg_ransac::{EpochSet, Ransac, RansacConfig};
/// use ndarray::{Array2, Array3};
///
/// let epochs = EpochSet::new(
///     Array3::zeros((10, 20, 100)),
///     (0..20).map(|i| format!("ch{i:02}")).collect(),
///     Array2::from_elem((20, 3), 0.1),
/// ).unwrap();
///
/// let mut ransac = Ransac::new(RansacConfig::default()).unwrap();
/// let cleaned = ransac.fit_transform(&epochs).unwrap();
/// for name in ransac.bad_channels().unwrap() {
///     println!("{name}");
/// }
/// # let _ = cleaned;
/// ```
#[derive(Debug)]
pub struct Ransac {
    config: RansacConfig,
    cancel: Arc<AtomicBool>,
    reject_log: Option<RejectLog>,
}

impl Ransac {
    /// Validate `config` and build a detector. Invalid thresholds or sample
    /// sizes are rejected here, before any data is touched.
    pub fn new(config: RansacConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: Arc::new(AtomicBool::new(false)),
            reject_log: None,
        })
    }

    pub fn config(&self) -> &RansacConfig {
        &self.config
    }

    /// Handle for aborting a fit from another thread.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(Arc::clone(&self.cancel))
    }

    /// Run sub-sampling, scoring and classification on `epochs`.
    ///
    /// On success the reject log (bad segments + globally bad channels) is
    /// stored for [`transform`](Self::transform) and returned.
    pub fn fit(&mut self, epochs: &EpochSet) -> Result<&RejectLog> {
        let n_channels = epochs.n_channels();
        let subset_size = self.config.subset_size(n_channels)?;
        debug!(
            n_trials = epochs.n_trials(),
            n_channels,
            n_samples = epochs.n_samples(),
            subset_size,
            n_resample = self.config.n_resample,
            "drawing channel sub-samples"
        );

        let subsets = draw_subsets(
            n_channels,
            subset_size,
            self.config.n_resample,
            self.config.seed,
        );
        check_coverage(&subsets, n_channels, epochs.ch_names())?;

        debug!("scoring consensus rounds");
        let scores = consensus_scores(
            epochs,
            &subsets,
            self.config.correlation_threshold,
            self.config.n_workers,
            &self.cancel,
        )?;

        let log = classify(
            scores,
            epochs.ch_names(),
            &self.config.bad_channel_policy,
            self.config.bad_segment_threshold,
        );
        info!(
            n_bad_channels = log.bad_channels.len(),
            n_bad_segments = log.n_bad_segments(),
            "classification complete"
        );
        Ok(&*self.reject_log.insert(log))
    }

    /// Interpolate the fitted bad channels out of `epochs`, returning a new
    /// epoch set. Requires a prior successful [`fit`](Self::fit) and the
    /// same channel layout.
    pub fn transform(&self, epochs: &EpochSet) -> Result<EpochSet> {
        let log = self.reject_log.as_ref().ok_or(RansacError::NotFitted)?;
        if epochs.ch_names() != log.ch_names.as_slice() {
            return Err(RansacError::Config(
                "channel layout differs from the fitted epoch set".into(),
            ));
        }
        repair(epochs, &log.bad_channels)
    }

    /// [`fit`](Self::fit) followed by [`transform`](Self::transform).
    pub fn fit_transform(&mut self, epochs: &EpochSet) -> Result<EpochSet> {
        self.fit(epochs)?;
        self.transform(epochs)
    }

    /// Globally bad channel names from the last fit.
    pub fn bad_channels(&self) -> Option<&[String]> {
        self.reject_log.as_ref().map(|log| log.bad_channels.as_slice())
    }

    /// Full reject log from the last fit.
    pub fn reject_log(&self) -> Option<&RejectLog> {
        self.reject_log.as_ref()
    }
}
