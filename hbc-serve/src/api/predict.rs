//! Audio classification endpoint
//!
//! `POST /predict` takes a multipart form whose `file` part holds a
//! recording. The upload is written to a temporary `.wav` file, analysed on
//! the blocking pool and deleted when the analysis returns, whatever the
//! outcome.

use std::io::Write;
use std::path::Path;

use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    routing::post,
    Json, Router,
};
use hbc_common::{Classifier, FeatureExtractor, Prediction};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::suggestions::suggestion_for;
use crate::AppState;

/// Multipart field carrying the recording
pub const FILE_FIELD: &str = "file";

/// Successful classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    /// Predicted label
    pub result: String,
    /// Probability of the predicted label, in [0, 1]
    pub confidence: f64,
    /// Canned advice for the label, empty if none is known
    pub suggestion: String,
}

impl From<Prediction> for PredictResponse {
    fn from(prediction: Prediction) -> Self {
        Self {
            suggestion: suggestion_for(&prediction.label).to_string(),
            result: prediction.label,
            confidence: prediction.confidence,
        }
    }
}

/// POST /predict
pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<PredictResponse>> {
    let mut multipart = multipart.map_err(|e| {
        warn!("Rejected upload: {}", e);
        ApiError::NoFile
    })?;
    let data = read_file_field(&mut multipart).await?;
    debug!(bytes = data.len(), "Upload received");

    let classifier = state.classifier.clone();
    let extractor = state.extractor.clone();
    let upload_dir = state.upload_dir.clone();

    let outcome = tokio::task::spawn_blocking(move || {
        analyze_upload(&upload_dir, &data, &extractor, &classifier)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Analysis task failed: {}", e)))?;

    match outcome {
        Ok(prediction) => {
            info!(
                result = %prediction.label,
                confidence = prediction.confidence,
                "Prediction complete"
            );
            Ok(Json(PredictResponse::from(prediction)))
        }
        Err(e) => {
            error!("Error processing audio: {}", e);
            Err(e)
        }
    }
}

/// Bytes of the first `file` part that carries a filename
///
/// A plain form field named `file` is not an upload.
async fn read_file_field(multipart: &mut Multipart) -> ApiResult<Bytes> {
    let upload_error = |e: MultipartError| {
        warn!("Failed to read upload: {}", e);
        ApiError::Upload(e.to_string())
    };

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() == Some(FILE_FIELD) && field.file_name().is_some() {
            return field.bytes().await.map_err(upload_error);
        }
    }
    Err(ApiError::NoFile)
}

/// Write the upload to a temporary file and classify it
///
/// The temporary file is removed when this returns.
fn analyze_upload(
    upload_dir: &Path,
    data: &[u8],
    extractor: &FeatureExtractor,
    classifier: &Classifier,
) -> ApiResult<Prediction> {
    let mut upload = tempfile::Builder::new()
        .prefix("hbc-upload-")
        .suffix(".wav")
        .tempfile_in(upload_dir)?;
    upload.write_all(data)?;
    upload.flush()?;

    let analysis_error = |e: hbc_common::Error| ApiError::Analysis(e.to_string());
    let features = extractor.extract_file(upload.path()).map_err(analysis_error)?;
    classifier
        .predict_batch(&features.as_batch())
        .map_err(analysis_error)?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Internal("Model returned no prediction".to_string()))
}

/// Build prediction routes
pub fn predict_routes() -> Router<AppState> {
    Router::new().route("/predict", post(predict))
}
