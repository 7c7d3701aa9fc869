//! Error mapping for service-specific APIs
//!
//! This module converts Azure OpenAI and Azure AI Search error responses
//! to our normalized ServiceError type.

use reqwest::StatusCode;
use serde_json::Value;

use super::{ErrorContext, ServiceError};
use crate::util::truncate_string;

/// Service name used in error contexts for the chat/embeddings backend
pub const AZURE_OPENAI_SERVICE: &str = "azure_openai";

/// Service name used in error contexts for the vector store backend
pub const AZURE_SEARCH_SERVICE: &str = "azure_search";

/// Pick the error category for an HTTP status
fn error_for_status(status: StatusCode, message: impl Into<String>) -> ServiceError {
    let message = message.into();
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ServiceError::validation(message),
        StatusCode::UNAUTHORIZED => ServiceError::authentication(message),
        StatusCode::FORBIDDEN => ServiceError::authorization(message),
        StatusCode::NOT_FOUND => ServiceError::not_found(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ServiceError::timeout(message),
        StatusCode::TOO_MANY_REQUESTS => ServiceError::rate_limit(message),
        s if s.is_server_error() => ServiceError::service(message),
        _ => ServiceError::external_service(message),
    }
}

/// Map an Azure OpenAI error body to a ServiceError
///
/// Azure OpenAI uses the OpenAI error envelope:
/// `{"error": {"code": "...", "message": "...", "type": "..."}}`.
/// Content-filter rejections arrive as 400 with code `content_filter`.
pub fn map_azure_openai_error(
    status: StatusCode,
    json: &Value,
    context: &mut ErrorContext,
) -> ServiceError {
    context.service = AZURE_OPENAI_SERVICE.to_string();

    let error = json.get("error").unwrap_or(json);

    if let Some(error_type) = error.get("type").and_then(|t| t.as_str()) {
        context.add("error_type", error_type);
    }

    // Azure sometimes sends the code as a number
    match error.get("code") {
        Some(Value::String(code)) => context.error_code = Some(code.clone()),
        Some(Value::Number(code)) => context.error_code = Some(code.to_string()),
        _ => {}
    }

    let message = error
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("Unknown Azure OpenAI error");

    error_for_status(status, message)
}

/// Map an Azure AI Search error body to a ServiceError
///
/// Search errors look like `{"error": {"code": "", "message": "..."}}`.
pub fn map_search_error(
    status: StatusCode,
    json: &Value,
    context: &mut ErrorContext,
) -> ServiceError {
    context.service = AZURE_SEARCH_SERVICE.to_string();

    let error = json.get("error").unwrap_or(json);

    if let Some(code) = error.get("code").and_then(|c| c.as_str()).filter(|c| !c.is_empty()) {
        context.error_code = Some(code.to_string());
    }

    let message = error
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("Unknown Azure AI Search error");

    match status {
        StatusCode::NOT_FOUND => ServiceError::not_found(format!("Index not found: {}", message)),
        _ => error_for_status(status, message),
    }
}

/// Map a generic HTTP error to a ServiceError
pub fn map_http_error(
    status: StatusCode,
    body: &str,
    context: &mut ErrorContext,
) -> ServiceError {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        match context.service.as_str() {
            AZURE_OPENAI_SERVICE => return map_azure_openai_error(status, &json, context),
            AZURE_SEARCH_SERVICE => return map_search_error(status, &json, context),
            _ => {
                let message = json
                    .get("message")
                    .or_else(|| json.get("error"))
                    .and_then(|m| m.as_str())
                    .unwrap_or(body);

                return error_for_status(status, message);
            }
        }
    }

    // Fallback to status-based mapping
    let message = if body.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, truncate_string(body, 100))
    };

    error_for_status(status, message)
}

/// Helper function to classify HTTP errors by category
pub fn classify_http_error(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 | 422 => "validation",
        401 => "authentication",
        403 => "authorization",
        404 => "not_found",
        408 | 504 => "timeout",
        429 => "rate_limit",
        500..=599 => "server",
        _ => "unknown",
    }
}

/// Determine if an HTTP status code indicates a retryable error
pub fn is_retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 408 | 429 | 500 | 502 | 503 | 504)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_azure_openai_rate_limit() {
        let mut context = ErrorContext::new();
        let body = json!({
            "error": {
                "code": "429",
                "message": "Requests to the ChatCompletions_Create Operation have exceeded call rate limit."
            }
        });

        let err = map_azure_openai_error(StatusCode::TOO_MANY_REQUESTS, &body, &mut context);
        assert!(matches!(err, ServiceError::RateLimit(_)));
        assert_eq!(context.service, AZURE_OPENAI_SERVICE);
        assert_eq!(context.error_code.as_deref(), Some("429"));
    }

    #[test]
    fn test_azure_openai_content_filter_is_validation() {
        let mut context = ErrorContext::new();
        let body = json!({
            "error": {"code": "content_filter", "message": "The response was filtered", "type": null}
        });

        let err = map_azure_openai_error(StatusCode::BAD_REQUEST, &body, &mut context);
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(context.error_code.as_deref(), Some("content_filter"));
    }

    #[test]
    fn test_search_index_not_found() {
        let mut context = ErrorContext::new();
        let body = json!({"error": {"code": "", "message": "The index 'docs' was not found."}});

        let err = map_search_error(StatusCode::NOT_FOUND, &body, &mut context);
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(context.error_code.is_none());
    }

    #[test]
    fn test_map_http_error_non_json_body() {
        let mut context = ErrorContext::for_service(AZURE_OPENAI_SERVICE);
        let err = map_http_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>", &mut context);
        assert!(matches!(err, ServiceError::Service(_)));
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_gateway_timeout_maps_to_timeout() {
        let mut context = ErrorContext::for_service("other");
        let err = map_http_error(StatusCode::GATEWAY_TIMEOUT, "", &mut context);
        assert!(matches!(err, ServiceError::Timeout(_)));
    }

    #[test]
    fn test_retryable_status() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
        assert_eq!(classify_http_error(StatusCode::GATEWAY_TIMEOUT), "timeout");
    }
}
