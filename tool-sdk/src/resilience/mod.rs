//! Resilience patterns for service clients
//!
//! Only bounded retry with exponential backoff is provided. Callers decide
//! which failures are worth another attempt by passing a predicate.

pub mod retry;

pub use retry::{RetryConfig, RetryExecutor};
