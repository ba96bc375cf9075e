//! HTTP Server & Routing Integration Tests
//!
//! Drives the router in-process with a small model trained on generated
//! recordings.

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use hbc_serve::api::{HealthResponse, PredictResponse};
use hbc_serve::suggestions::suggestion_for;
use hbc_serve::{build_router, AppState};
use helpers::{form_field_request, generate_test_wav, noise_config, predict_request, tone_config};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    /// Generated recordings and the model's training data
    fixtures: TempDir,
    /// Upload directory handed to the service
    uploads: TempDir,
}

fn test_app() -> TestApp {
    let fixtures = tempfile::tempdir().unwrap();
    let uploads = tempfile::tempdir().unwrap();
    let classifier = helpers::train_test_classifier(fixtures.path());
    let state = AppState::new(classifier).with_upload_dir(uploads.path());
    TestApp {
        router: build_router(state),
        fixtures,
        uploads,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn upload_count(app: &TestApp) -> usize {
    std::fs::read_dir(app.uploads.path()).unwrap().count()
}

#[tokio::test]
async fn test_predict_without_file_field_is_400() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(predict_request("recording", "beat.wav", b"RIFF"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No file uploaded");
}

#[tokio::test]
async fn test_predict_plain_form_field_is_not_a_file() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(form_field_request("file", "hello"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No file uploaded");
    assert_eq!(upload_count(&app), 0);
}

#[tokio::test]
async fn test_predict_non_multipart_is_400() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/predict")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No file uploaded");
}

#[tokio::test]
async fn test_predict_non_audio_is_400_and_cleans_up() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(predict_request("file", "notes.wav", b"this is not a recording"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    let message = body["error"].as_str().unwrap();
    assert!(
        message.starts_with("Failed to analyze audio: "),
        "unexpected error: {}",
        message
    );
    assert_eq!(upload_count(&app), 0, "temporary upload should be deleted");
}

#[tokio::test]
async fn test_predict_valid_recording() {
    let app = test_app();
    let wav = generate_test_wav(&app.fixtures.path().join("upload.wav"), &tone_config(55.0))
        .unwrap();
    let data = std::fs::read(&wav).unwrap();

    let response = app
        .router
        .clone()
        .oneshot(predict_request("file", "upload.wav", &data))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let prediction: PredictResponse = serde_json::from_slice(&bytes).unwrap();

    assert!(["normal", "murmur"].contains(&prediction.result.as_str()));
    assert!((0.0..=1.0).contains(&prediction.confidence));
    assert_eq!(prediction.suggestion, suggestion_for(&prediction.result));
    assert_eq!(upload_count(&app), 0);
}

#[tokio::test]
async fn test_concurrent_identical_requests_agree() {
    let app = test_app();
    let wav = generate_test_wav(&app.fixtures.path().join("upload.wav"), &noise_config(99))
        .unwrap();
    let data = std::fs::read(&wav).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let router = app.router.clone();
            let request = predict_request("file", "upload.wav", &data);
            tokio::spawn(async move {
                let response = router.oneshot(request).await.unwrap();
                assert_eq!(response.status(), StatusCode::OK);
                response.into_body().collect().await.unwrap().to_bytes()
            })
        })
        .collect();

    let mut bodies = Vec::new();
    for handle in handles {
        bodies.push(handle.await.unwrap());
    }

    assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(upload_count(&app), 0);
}

#[tokio::test]
async fn test_health_reports_model_classes() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let health: HealthResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.module, "hbc-serve");
    assert_eq!(health.classes, vec!["murmur", "normal"]);
}

#[tokio::test]
async fn test_cors_mirrors_origin_with_credentials() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/predict")
                .header("origin", "http://localhost:5173")
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap(),
        "http://localhost:5173"
    );
    assert_eq!(
        headers.get("access-control-allow-credentials").unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_oversize_upload_is_rejected_with_json() {
    let fixtures = tempfile::tempdir().unwrap();
    let uploads = tempfile::tempdir().unwrap();
    let classifier = helpers::train_test_classifier(fixtures.path());
    let state = AppState::new(classifier)
        .with_upload_dir(uploads.path())
        .with_max_upload_bytes(1024);
    let router = build_router(state);

    let response = router
        .oneshot(predict_request("file", "big.wav", &vec![0u8; 64 * 1024]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().starts_with("Failed to read upload"));
    assert_eq!(std::fs::read_dir(uploads.path()).unwrap().count(), 0);
}
