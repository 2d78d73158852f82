//! Error types for the RANSAC channel-consensus pipeline.
//!
//! Every variant is deterministic given the inputs: there is no I/O inside
//! the pipeline, so nothing here is transient or retryable.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RansacError>;

#[derive(Error, Debug)]
pub enum RansacError {
    /// Invalid configuration or input shape. Surfaced before any stage runs.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Too few, collinear, or degenerate spatial reference positions to
    /// build an interpolator. `stage` names the pipeline stage that needed
    /// the geometry.
    #[error("bad sensor geometry during {stage}: {reason}")]
    Geometry {
        stage: &'static str,
        reason: String,
    },

    /// A channel was a member of every sub-sample, so no round ever
    /// predicted it. Increase `n_resample` or decrease `sample_fraction`.
    #[error("channel {name:?} (index {index}) was never predicted by any sub-sample round; \
             increase n_resample or decrease sample_fraction")]
    InsufficientCoverage {
        name: String,
        index: usize,
    },

    /// `transform` was called on an unfitted instance.
    #[error("transform called before fit")]
    NotFitted,

    /// The caller cancelled the fit before all rounds completed.
    #[error("fit cancelled before all consensus rounds completed")]
    Cancelled,
}
