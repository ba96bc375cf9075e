//! Error types for hbc-train

use std::path::PathBuf;

use thiserror::Error;

/// Training pipeline errors
///
/// Per-sample problems never appear here; they are recorded as
/// [`crate::dataset::SkipReason`] values and the run continues.
#[derive(Debug, Error)]
pub enum TrainError {
    /// Manifest file missing, unreadable, or lacking required columns
    #[error("Manifest error ({}): {message}", path.display())]
    Manifest { path: PathBuf, message: String },

    /// Every manifest row was skipped
    #[error("No valid data found for training.")]
    NoValidData,

    /// Too few samples to leave a non-empty training partition
    #[error("Not enough samples to split: {samples} sample(s) with test fraction {test_fraction}")]
    InsufficientData { samples: usize, test_fraction: f64 },

    /// Feature, model or I/O error from hbc-common
    #[error(transparent)]
    Common(#[from] hbc_common::Error),
}

/// Result type for training operations
pub type TrainResult<T> = Result<T, TrainError>;
