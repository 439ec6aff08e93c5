use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use capsule_core::decision::{scenario_router, ScenarioController};
use capsule_core::encapsulation::{AlgorithmRegistry, DatasetKind};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub(crate) struct AlgorithmView {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) supported_kinds: Vec<DatasetKind>,
}

pub(crate) fn with_decision_routes(
    controller: Arc<ScenarioController>,
    registry: Arc<AlgorithmRegistry>,
) -> Router {
    scenario_router(controller, Arc::clone(&registry))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/algorithms", get(algorithms_endpoint))
        .layer(Extension(registry))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn algorithms_endpoint(
    Extension(registry): Extension<Arc<AlgorithmRegistry>>,
) -> Json<Vec<AlgorithmView>> {
    Json(
        registry
            .algorithms()
            .iter()
            .map(|algorithm| AlgorithmView {
                id: algorithm.id().to_string(),
                name: algorithm.name().to_string(),
                supported_kinds: algorithm.supported_kinds().to_vec(),
            })
            .collect(),
    )
}
