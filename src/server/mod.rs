//! HTTP surface: thin JSON boundary over the prediction pipeline.
//!
//! Endpoints:
//! - `POST /predict` — run the pipeline on a listing record
//! - `GET /health` — liveness probe
//!
//! Status mapping follows the error taxonomy: validation failures are 400
//! with the full field → message set, a missing model artifact is 503,
//! and everything else is an opaque 500 with the detail kept server-side.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::adapters::{artifact, mean_std, ArtifactError};
use crate::application::PredictionService;
use crate::domain::{EncodingVariant, Outcome, Prediction, RawListing, StandardizedIndices};
use crate::BidcastError;

/// Build the service router.
#[must_use]
pub fn router() -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Boundary response for a successful prediction.
#[derive(Debug, Serialize)]
struct PredictResponse {
    result: Outcome,
    percentage: f64,
    #[serde(flatten)]
    indices: StandardizedIndices,
}

impl From<Prediction> for PredictResponse {
    fn from(prediction: Prediction) -> Self {
        Self {
            result: prediction.result,
            percentage: prediction.percentage,
            indices: prediction.indices,
        }
    }
}

async fn predict(Json(raw): Json<RawListing>) -> Response {
    // Artifacts load lazily on the first request and stay cached,
    // including a failed load, for the process lifetime.
    let classifier = match artifact::global() {
        Ok(model) => model,
        Err(e) => return artifact_failure(&e),
    };
    let table = match mean_std::global() {
        Ok(table) => table,
        Err(e) => {
            tracing::error!("Standardization table unavailable: {e}");
            return internal_error();
        }
    };

    let service = PredictionService::new(classifier, table, EncodingVariant::from_env());
    match service.predict(&raw) {
        Ok(prediction) => {
            (StatusCode::OK, Json(PredictResponse::from(prediction))).into_response()
        }
        Err(BidcastError::Validation(errors)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Validation failed",
                "details": errors,
            })),
        )
            .into_response(),
        Err(BidcastError::Artifact(e)) => artifact_failure(&e),
        Err(e) => {
            tracing::error!("Unexpected prediction failure: {e}");
            internal_error()
        }
    }
}

fn artifact_failure(error: &ArtifactError) -> Response {
    match error {
        ArtifactError::NotFound(path) => {
            tracing::error!("Model artifact not found at {:?}", path);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": "Model not found",
                    "message": "Prediction model is not available",
                })),
            )
                .into_response()
        }
        other => {
            tracing::error!("Model artifact failed to load: {other}");
            internal_error()
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    // Router tests use the repo model fixture at models/model.json via
    // the process-wide artifact cache (cargo test runs from the crate
    // root); no standardization table resolves, so the bypass applies.

    async fn send(body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/predict")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("Should build request"),
            )
            .await
            .expect("Should route");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Should read body");
        let value = serde_json::from_slice(&bytes).expect("Body should be JSON");
        (status, value)
    }

    #[tokio::test]
    async fn test_predict_ok() {
        let (status, body) = send(serde_json::json!({
            "type": 1,
            "genre": 3,
            "e1": 111,
            "b1": 111,
            "p1": 10000,
            "e2": 222,
            "b2": 222,
            "p2": 20000,
            "channel": 1
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(matches!(body["result"].as_str(), Some("up" | "down")));
        let percentage = body["percentage"].as_f64().expect("percentage");
        assert!((0.0..=100.0).contains(&percentage));
        // Bypass: the echoed indices equal the raw input.
        assert_eq!(body["e1"].as_f64(), Some(111.0));
        assert_eq!(body["p2"].as_f64(), Some(20000.0));
    }

    #[tokio::test]
    async fn test_predict_validation_failure() {
        let (status, body) = send(serde_json::json!({
            "type": 5,
            "genre": 3,
            "e1": 111,
            "p1": 10000,
            "e2": 222,
            "b2": 222,
            "p2": 20000,
            "channel": 1
        }))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Validation failed");
        assert!(body["details"]["type"].is_string());
        // b1 is missing and must be reported in the same response.
        assert!(body["details"]["b1"].is_string());
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("Should build request"),
            )
            .await
            .expect("Should route");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
