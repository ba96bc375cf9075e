//! Heartbeat classifier training pipeline
//!
//! Reads labeled manifests, extracts MFCC features, fits a random forest,
//! prints a held-out evaluation and writes the model artifact used by
//! `hbc-serve`.

pub mod dataset;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod report;
pub mod split;

pub use error::{TrainError, TrainResult};
pub use pipeline::{run, TrainingOutcome, TrainingPlan};
