//! hbc-serve library interface
//!
//! Router and shared state for the heartbeat classification service,
//! exposed for integration testing.

pub mod api;
pub mod error;
pub mod suggestions;

pub use crate::error::{ApiError, ApiResult};

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use hbc_common::config::DEFAULT_MAX_UPLOAD_BYTES;
use hbc_common::{Classifier, FeatureExtractor};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
///
/// The classifier is loaded once before the server starts and is only read
/// afterwards.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<Classifier>,
    pub extractor: Arc<FeatureExtractor>,
    /// Directory for temporary upload files
    pub upload_dir: PathBuf,
    /// Request body limit applied to every route
    pub max_upload_bytes: usize,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            classifier: Arc::new(classifier),
            extractor: Arc::new(FeatureExtractor::new()),
            upload_dir: std::env::temp_dir(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            startup_time: Utc::now(),
        }
    }

    pub fn with_upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = dir.into();
        self
    }

    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }
}

/// Build application router
///
/// CORS allows any origin with credentials (the request origin is
/// mirrored back).
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .merge(api::predict_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
