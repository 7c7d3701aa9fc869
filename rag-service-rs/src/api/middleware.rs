//! Request id propagation, access logging and panic recovery

use std::any::Any;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tool_sdk::util::generate_request_id;

use crate::instrumentation::{MetricsSink, PrometheusSink};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_SECONDS: &str = "http_request_duration_seconds";

/// Correlation id of the current request, available to handlers as an extension
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Set on responses produced by [`panic_response`]
#[derive(Debug, Clone, Copy)]
struct Panicked;

/// Honour or mint `x-request-id`, echo it back and log the request
pub async fn request_context(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(generate_request_id);

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    request.extensions_mut().insert(RequestId(request_id.clone()));

    let started = Instant::now();
    let mut response = next.run(request).await;

    if response.extensions().get::<Panicked>().is_some() {
        tracing::error!(request_id = %request_id, path = %path, "unhandled_error");
        response = (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "internal_error", "request_id": request_id})),
        )
            .into_response();
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let status = response.status().as_u16().to_string();
    let labels = [("method", method.as_str()), ("path", route.as_str()), ("status", status.as_str())];
    PrometheusSink.increment(HTTP_REQUESTS_TOTAL, &labels, 1);
    PrometheusSink.observe(HTTP_REQUEST_SECONDS, &labels[..2], started.elapsed().as_secs_f64());

    tracing::info!("{} {} -> {} request_id={}", method, path, status, request_id);

    response
}

/// Turn a handler panic into a marked 500, finished by [`request_context`]
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %detail, "Handler panicked");

    let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
    response.extensions_mut().insert(Panicked);
    response
}
