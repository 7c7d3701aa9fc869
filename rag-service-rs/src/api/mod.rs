mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

pub use dto::{AskBody, MAX_QUERY_CHARS};
pub use error::ApiError;
pub use middleware::{RequestId, REQUEST_ID_HEADER};
pub use state::AppState;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/docs", get(handlers::docs))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .route("/ask", post(handlers::ask))
        .route("/metrics", get(handlers::metrics))
        .layer(CatchPanicLayer::custom(middleware::panic_response))
        .layer(axum_middleware::from_fn(middleware::request_context))
        .with_state(state)
}
