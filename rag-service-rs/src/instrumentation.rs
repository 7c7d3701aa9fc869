//! Call instrumentation for model requests
//!
//! A [`CallTimer`] wraps one logical generation call (all of its retries) and
//! reports outcome counters, token usage, optional cost and latency through
//! an injected [`MetricsSink`]. The production sink forwards to the `metrics`
//! facade, rendered by the Prometheus exporter at `/metrics`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tool_sdk::openai::TokenUsage;

pub const LLM_REQUESTS_TOTAL: &str = "llm_requests_total";
pub const LLM_TOKENS_TOTAL: &str = "llm_tokens_total";
pub const LLM_ERRORS_TOTAL: &str = "llm_errors_total";
pub const LLM_REQUEST_SECONDS: &str = "llm_request_seconds";
pub const LLM_COST_USD_MICROS_TOTAL: &str = "llm_cost_usd_micros_total";

/// Histogram buckets for `llm_request_seconds`
pub const LATENCY_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0];

/// Destination for counters and observations
pub trait MetricsSink: Send + Sync {
    fn increment(&self, name: &str, labels: &[(&str, &str)], value: u64);
    fn observe(&self, name: &str, labels: &[(&str, &str)], value: f64);
}

fn to_labels(labels: &[(&str, &str)]) -> Vec<metrics::Label> {
    labels
        .iter()
        .map(|(k, v)| metrics::Label::new(k.to_string(), v.to_string()))
        .collect()
}

/// Sink backed by the global `metrics` recorder
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusSink;

impl MetricsSink for PrometheusSink {
    fn increment(&self, name: &str, labels: &[(&str, &str)], value: u64) {
        metrics::counter!(name.to_string(), value, to_labels(labels));
    }

    fn observe(&self, name: &str, labels: &[(&str, &str)], value: f64) {
        metrics::histogram!(name.to_string(), value, to_labels(labels));
    }
}

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

fn prometheus_builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new().set_buckets_for_metric(Matcher::Full(LLM_REQUEST_SECONDS.to_string()), LATENCY_BUCKETS)
}

/// Install the Prometheus recorder as the global `metrics` recorder
///
/// Safe to call repeatedly; the recorder is installed on the first call and
/// the same handle is returned afterwards.
pub fn install_prometheus_recorder() -> Result<PrometheusHandle, BuildError> {
    PROMETHEUS_HANDLE
        .get_or_try_init(|| prometheus_builder()?.install_recorder())
        .cloned()
}

/// A render handle for a recorder that is not installed globally
pub fn detached_prometheus_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}

type SeriesKey = (String, Vec<(String, String)>);

fn series_key(name: &str, labels: &[(&str, &str)]) -> SeriesKey {
    let mut labels: Vec<(String, String)> = labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    labels.sort();
    (name.to_string(), labels)
}

/// Sink that keeps everything in memory, for tests and diagnostics
#[derive(Debug, Default)]
pub struct InMemorySink {
    counters: Mutex<HashMap<SeriesKey, u64>>,
    observations: Mutex<HashMap<SeriesKey, Vec<f64>>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of one counter series
    pub fn counter(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        self.counters
            .lock()
            .map(|c| c.get(&series_key(name, labels)).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Sum of a counter over every label set
    pub fn counter_total(&self, name: &str) -> u64 {
        self.counters
            .lock()
            .map(|c| c.iter().filter(|((n, _), _)| n == name).map(|(_, v)| *v).sum())
            .unwrap_or(0)
    }

    /// Every value observed for a histogram, across label sets
    pub fn observations(&self, name: &str) -> Vec<f64> {
        self.observations
            .lock()
            .map(|o| {
                o.iter()
                    .filter(|((n, _), _)| n == name)
                    .flat_map(|(_, values)| values.iter().copied())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl MetricsSink for InMemorySink {
    fn increment(&self, name: &str, labels: &[(&str, &str)], value: u64) {
        if let Ok(mut counters) = self.counters.lock() {
            *counters.entry(series_key(name, labels)).or_insert(0) += value;
        }
    }

    fn observe(&self, name: &str, labels: &[(&str, &str)], value: f64) {
        if let Ok(mut observations) = self.observations.lock() {
            observations.entry(series_key(name, labels)).or_default().push(value);
        }
    }
}

/// USD price per 1000 tokens; zero disables cost accounting
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pricing {
    pub prompt_per_1k: f64,
    pub completion_per_1k: f64,
}

impl Pricing {
    pub fn is_enabled(&self) -> bool {
        self.prompt_per_1k > 0.0 || self.completion_per_1k > 0.0
    }

    /// Cost of a call in micro-dollars, rounded to the nearest unit
    pub fn cost_micros(&self, usage: TokenUsage) -> u64 {
        let usd = usage.prompt_tokens as f64 / 1000.0 * self.prompt_per_1k
            + usage.completion_tokens as f64 / 1000.0 * self.completion_per_1k;
        (usd * 1_000_000.0).round().max(0.0) as u64
    }
}

/// Scoped timer for one model call
///
/// Consume it with [`record_success`](Self::record_success) or
/// [`record_error`](Self::record_error). Latency is observed exactly once:
/// by whichever of those runs, or on drop if neither did.
pub struct CallTimer {
    sink: Arc<dyn MetricsSink>,
    provider: String,
    model: String,
    pricing: Pricing,
    started: Instant,
    finished: bool,
}

impl CallTimer {
    pub fn start(sink: Arc<dyn MetricsSink>, provider: impl Into<String>, model: impl Into<String>, pricing: Pricing) -> Self {
        Self {
            sink,
            provider: provider.into(),
            model: model.into(),
            pricing,
            started: Instant::now(),
            finished: false,
        }
    }

    pub fn record_success(mut self, usage: TokenUsage) {
        let (provider, model) = (self.provider.as_str(), self.model.as_str());

        self.sink.increment(
            LLM_REQUESTS_TOTAL,
            &[("provider", provider), ("model", model), ("status", "success")],
            1,
        );
        self.sink.increment(
            LLM_TOKENS_TOTAL,
            &[("provider", provider), ("model", model), ("role", "prompt")],
            usage.prompt_tokens,
        );
        self.sink.increment(
            LLM_TOKENS_TOTAL,
            &[("provider", provider), ("model", model), ("role", "completion")],
            usage.completion_tokens,
        );

        if self.pricing.is_enabled() {
            self.sink.increment(
                LLM_COST_USD_MICROS_TOTAL,
                &[("provider", provider), ("model", model)],
                self.pricing.cost_micros(usage),
            );
        }

        self.finish();
    }

    pub fn record_error(mut self, error_type: &str) {
        let (provider, model) = (self.provider.as_str(), self.model.as_str());

        self.sink.increment(
            LLM_REQUESTS_TOTAL,
            &[("provider", provider), ("model", model), ("status", "error")],
            1,
        );
        self.sink.increment(
            LLM_ERRORS_TOTAL,
            &[("provider", provider), ("model", model), ("error_type", error_type)],
            1,
        );

        self.finish();
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.sink.observe(
            LLM_REQUEST_SECONDS,
            &[("provider", self.provider.as_str()), ("model", self.model.as_str())],
            self.started.elapsed().as_secs_f64(),
        );
    }
}

impl Drop for CallTimer {
    fn drop(&mut self) {
        self.finish();
    }
}
