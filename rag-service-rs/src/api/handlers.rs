use axum::{
    extract::{rejection::JsonRejection, State},
    Extension,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

use super::dto::{AskBody, HealthResponse, ReadyResponse, MAX_QUERY_CHARS, MIN_QUERY_CHARS};
use super::error::ApiError;
use super::middleware::RequestId;
use super::state::AppState;
use crate::pipeline::AnswerEnvelope;

/// POST /ask - Answer a question from the indexed documents
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(correlation_id)): Extension<RequestId>,
    payload: Result<Json<AskBody>, JsonRejection>,
) -> Result<Json<AnswerEnvelope>, ApiError> {
    let Json(body) = payload.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;

    if let Err(chars) = body.validate() {
        return Err(ApiError::Validation(format!(
            "query must be between {} and {} characters, got {}",
            MIN_QUERY_CHARS, MAX_QUERY_CHARS, chars
        )));
    }

    let envelope = state.pipeline.ask(&body.query, &correlation_id).await?;
    Ok(Json(envelope))
}

/// GET / - Redirect to the endpoint index
pub async fn root() -> impl IntoResponse {
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, "/docs")])
}

/// GET /docs - Endpoint index
pub async fn docs() -> impl IntoResponse {
    Json(json!({
        "service": "Azure RAG Service",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "GET /healthz",
            "GET /readyz",
            "POST /ask",
            "GET /metrics"
        ]
    }))
}

/// GET /healthz - Liveness
pub async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// GET /readyz - Readiness; required settings were validated at startup
pub async fn readyz() -> Json<ReadyResponse> {
    Json(ReadyResponse {
        status: "ready",
        missing: Vec::new(),
    })
}

/// GET /metrics - Prometheus exposition
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
