//! HTTP API handlers

pub mod health;
pub mod predict;

pub use health::{health_check, health_routes, HealthResponse};
pub use predict::{predict, predict_routes, PredictResponse, FILE_FIELD};
