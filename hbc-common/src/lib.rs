//! # Heartbeat Classifier Common Library
//!
//! Shared code for the training pipeline and the inference service:
//! - Audio decoding (native sample rate, mono downmix)
//! - MFCC feature extraction
//! - Random-forest classifier and model artifact persistence
//! - Configuration loading
//! - Common error types

pub mod audio;
pub mod config;
pub mod error;
pub mod features;
pub mod model;

pub use error::{Error, Result};
pub use features::{FeatureExtractor, FeatureVector, FEATURE_DIM};
pub use model::{Classifier, Prediction};
