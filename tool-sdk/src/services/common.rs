//! Common utilities for service clients
//!
//! This module provides shared HTTP plumbing for the Azure clients.

use std::fmt;
use std::time::Duration;

use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;

use crate::error::mapping::{classify_http_error, is_retryable_status, map_http_error};
use crate::error::{ErrorContext, Result, ServiceError};
use crate::util::{sanitize_for_logging, truncate_string};

/// UserAgent structure for identifying the client to upstream services
#[derive(Debug, Clone)]
pub struct UserAgent {
    pub app_name: String,
    pub version: String,
    pub extra: Option<String>,
}

impl Default for UserAgent {
    fn default() -> Self {
        Self {
            app_name: "rag-service".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            extra: Some("tool-sdk".to_string()),
        }
    }
}

impl UserAgent {
    /// Default agent tagged with a component name
    pub fn for_component(component: &str) -> Self {
        Self {
            extra: Some(component.to_string()),
            ..Self::default()
        }
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app_name, self.version)?;

        if let Some(ref extra) = self.extra {
            write!(f, " ({})", extra)?;
        }

        Ok(())
    }
}

/// Build a standard HTTP client with default settings
///
/// No connection is opened here; the pool fills on first request.
pub fn build_http_client(user_agent: Option<UserAgent>, timeout: Option<Duration>) -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    let ua = user_agent.unwrap_or_default().to_string();

    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_str(&ua)
            .map_err(|e| ServiceError::configuration(format!("Invalid user agent: {}", e)))?,
    );

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout.unwrap_or_else(|| Duration::from_secs(30)))
        .gzip(true)
        .build()
        .map_err(|e| ServiceError::configuration(format!("Failed to build HTTP client: {}", e)))
}

/// Create error context for HTTP requests
pub fn create_error_context(service_name: &str, response: &Response) -> ErrorContext {
    let mut context = ErrorContext::for_service(service_name)
        .status_code(response.status().as_u16())
        .endpoint(response.url().path());

    let request_id = ["apim-request-id", "x-ms-request-id", "request-id"]
        .iter()
        .find_map(|name| response.headers().get(*name))
        .and_then(|v| v.to_str().ok());

    if let Some(id) = request_id {
        context = context.request_id(id);
    }

    context
}

/// Parse error response from HTTP response
pub async fn parse_error_response(service_name: &str, response: Response) -> ServiceError {
    let status = response.status();
    let mut context = create_error_context(service_name, &response);

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => format!("Failed to read error response: {}", e),
    };

    log::debug!(
        "{} returned {} ({}, retryable: {}): {}",
        service_name,
        status,
        classify_http_error(status),
        is_retryable_status(status),
        sanitize_for_logging(&truncate_string(&body, 500))
    );

    map_http_error(status, &body, &mut context).with_context(context)
}

/// Read a successful response body and decode it as JSON
///
/// Timeouts while the body is streaming surface as `ServiceError::Timeout`.
pub async fn read_json<R: DeserializeOwned>(service_name: &str, response: Response) -> Result<R> {
    let bytes = response.bytes().await?;
    serde_json::from_slice::<R>(&bytes).map_err(|e| {
        ServiceError::parsing(format!("Failed to parse {} response: {}", service_name, e))
            .with_context(ErrorContext::for_service(service_name))
    })
}
