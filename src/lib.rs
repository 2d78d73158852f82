//! # exg-ransac — RANSAC bad-sensor detection and repair for EEG/MEG epochs
//!
//! `exg-ransac` implements the consensus-based bad-channel detector of the
//! PREP pipeline: many rounds of random channel sub-sampling, each building
//! a spherical-spline spatial predictor, vote on whether every channel's
//! signal agrees with what its neighbors say it should look like. Channels
//! the consensus rejects are repaired by interpolation from the good ones.
//!
//! ## Pipeline overview
//!
//! ```text
//! epochs [E, C, T] + positions [C, 3]
//!   │
//!   ├─ subsample    n_resample random channel subsets (seeded, size k)
//!   ├─ score        per round: spline-predict non-subset channels,
//!   │               correlate with observed signal per trial
//!   │               → consensus score [E, C] = agreeing / predicting rounds
//!   ├─ classify     score < bad_segment_threshold → bad segment;
//!   │               channel policy (robust z-score) → globally bad channels
//!   └─ repair       bad channels ← spline estimate from good channels
//!        │
//!        └─→ RejectLog + repaired EpochSet (inputs never mutated)
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use exg_ransac::{EpochSet, Ransac, RansacConfig};
//! use ndarray::{Array2, Array3};
//!
//! // Epoched data from your acquisition pipeline: [trials, channels, samples]
//! let data: Array3<f32> = Array3::zeros((10, 20, 100));
//! let ch_names: Vec<String> = (0..20).map(|i| format!("ch{i:02}")).collect();
//! let positions: Array2<f32> = Array2::from_elem((20, 3), 0.1); // [C, 3] metres
//!
//! let epochs = EpochSet::new(data, ch_names, positions).unwrap();
//!
//! let mut ransac = Ransac::new(RansacConfig::default()).unwrap();
//! let cleaned = ransac.fit_transform(&epochs).unwrap();
//!
//! for name in ransac.bad_channels().unwrap() {
//!     println!("bad: {name}");
//! }
//! println!("repaired {} trials", cleaned.n_trials());
//! ```
//!
//! ## Determinism
//!
//! Runs are reproducible bit-for-bit from `(epochs, config)`: randomness is
//! confined to one seeded generator, consensus accumulators are integers,
//! and the worker-pool merge is a plain sum in round order, so `n_workers`
//! never changes the result.

pub mod classify;
pub mod config;
pub mod epoch;
pub mod error;
pub mod interpolation;
pub mod io;
pub mod ransac;
pub mod repair;
pub mod score;
pub mod subsample;

// ── Crate-root re-exports ─────────────────────────────────────────────────
//
// Everything a downstream user is likely to need is available directly as
// `exg_ransac::Foo` without having to know the internal module layout.

pub use classify::{classify, RejectLog};
pub use config::{BadChannelPolicy, RansacConfig};
pub use epoch::EpochSet;
pub use error::{RansacError, Result};
pub use interpolation::{apply_weights, interpolation_matrix, MIN_REFERENCE_POSITIONS};
pub use ransac::{CancelHandle, Ransac};
pub use repair::repair;
pub use score::consensus_scores;
pub use subsample::{check_coverage, draw_subsets};
