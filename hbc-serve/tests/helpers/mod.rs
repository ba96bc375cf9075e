//! Test Helper Utilities
//!
//! Shared utilities for hbc-serve integration tests

#![allow(dead_code)]

use std::path::Path;

use axum::body::Body;
use axum::http::Request;
use hbc_common::model::ForestParams;
use hbc_common::{Classifier, FeatureExtractor};

pub use hbc_testkit::{generate_test_wav, noise_config, tone_config};

pub const BOUNDARY: &str = "hbc-test-boundary";

/// Train a small forest on generated tones ("normal") and noise ("murmur")
pub fn train_test_classifier(dir: &Path) -> Classifier {
    let extractor = FeatureExtractor::new();
    let mut rows = Vec::new();
    let mut labels = Vec::new();

    for i in 0..4u64 {
        let tone = generate_test_wav(
            &dir.join(format!("normal_{}.wav", i)),
            &tone_config(50.0 + 10.0 * i as f32),
        )
        .unwrap();
        rows.push(extractor.extract_file(&tone).unwrap().into_inner());
        labels.push("normal".to_string());

        let noise =
            generate_test_wav(&dir.join(format!("murmur_{}.wav", i)), &noise_config(i)).unwrap();
        rows.push(extractor.extract_file(&noise).unwrap().into_inner());
        labels.push("murmur".to_string());
    }

    let views: Vec<&[f64]> = rows.iter().map(|r| r.as_slice()).collect();
    let params = ForestParams {
        n_trees: 10,
        ..ForestParams::default()
    };
    Classifier::train(&views, &labels, &params).unwrap()
}

/// Multipart body with one part; `filename: None` makes it a plain form field
pub fn multipart_body(field: &str, filename: Option<&str>, data: &[u8]) -> Vec<u8> {
    let disposition = match filename {
        Some(filename) => format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        ),
        None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", field),
    };

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(disposition.as_bytes());
    if filename.is_some() {
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n");
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// POST /predict with one file part
pub fn predict_request(field: &str, filename: &str, data: &[u8]) -> Request<Body> {
    multipart_request(multipart_body(field, Some(filename), data))
}

/// POST /predict with one plain (non-file) form field
pub fn form_field_request(field: &str, value: &str) -> Request<Body> {
    multipart_request(multipart_body(field, None, value.as_bytes()))
}
