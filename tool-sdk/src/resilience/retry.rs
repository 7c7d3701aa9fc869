//! Retry with exponential backoff for recoverable errors
//!
//! This module provides a bounded retry loop with configurable exponential
//! backoff. The caller supplies the predicate that decides whether a failed
//! attempt is worth repeating; once attempts run out the last error is
//! returned unchanged.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use backoff::{backoff::Backoff, ExponentialBackoff};

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,

    /// Delay before the second attempt
    pub initial_interval: Duration,

    /// Lower bound on any single delay
    pub min_interval: Duration,

    /// Upper bound on any single delay
    pub max_interval: Duration,

    /// Growth factor between consecutive delays
    pub multiplier: f64,

    /// Jitter applied to each delay (0.0 disables it)
    pub randomization_factor: f64,
}

impl Default for RetryConfig {
    /// Three attempts, waiting 0.5s then 1s, never more than 4s
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_interval: Duration::from_millis(500),
            min_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(4),
            multiplier: 2.0,
            randomization_factor: 0.0,
        }
    }
}

impl fmt::Display for RetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RetryConfig {{ max_attempts: {}, initial_interval: {:?}, min_interval: {:?}, max_interval: {:?}, multiplier: {}, randomization_factor: {} }}",
            self.max_attempts,
            self.initial_interval,
            self.min_interval,
            self.max_interval,
            self.multiplier,
            self.randomization_factor
        )
    }
}

impl RetryConfig {
    /// A fresh backoff schedule for one retry loop
    pub fn backoff(&self) -> ExponentialBackoff {
        let mut backoff = ExponentialBackoff {
            current_interval: self.initial_interval,
            initial_interval: self.initial_interval,
            max_interval: self.max_interval,
            multiplier: self.multiplier,
            randomization_factor: self.randomization_factor,
            max_elapsed_time: None,
            ..ExponentialBackoff::default()
        };
        backoff.reset();
        backoff
    }

    /// The delays the executor would sleep between attempts, in order
    pub fn delays(&self) -> Vec<Duration> {
        let mut backoff = self.backoff();
        (1..self.max_attempts)
            .filter_map(|_| backoff.next_backoff())
            .map(|d| self.clamp(d))
            .collect()
    }

    fn clamp(&self, delay: Duration) -> Duration {
        delay.max(self.min_interval).min(self.max_interval)
    }
}

/// Executor for retry operations with exponential backoff
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    /// Create a new retry executor with the specified configuration
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Run `operation` until it succeeds, fails with an error for which
    /// `is_retryable` is false, or `max_attempts` is reached.
    ///
    /// The error of the final attempt is returned as-is.
    pub async fn execute_when<F, Fut, T, E, P>(&self, mut operation: F, is_retryable: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
        P: Fn(&E) -> bool,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut backoff = self.config.backoff();
        let mut attempt = 1;

        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if attempt >= max_attempts || !is_retryable(&err) {
                if attempt > 1 {
                    log::warn!("Giving up after {} attempt(s): {}", attempt, err);
                }
                return Err(err);
            }

            let delay = match backoff.next_backoff() {
                Some(delay) => self.config.clamp(delay),
                None => return Err(err),
            };

            log::warn!(
                "Attempt {}/{} failed with retryable error, retrying in {:?}: {}",
                attempt,
                max_attempts,
                delay,
                err
            );

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Get the current retry configuration
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}
