use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use crate::pipeline::RagPipeline;

/// Shared state for all handlers
pub struct AppState {
    pub pipeline: Arc<RagPipeline>,

    /// Renders the recorder backing `/metrics`
    pub metrics: PrometheusHandle,
}

impl AppState {
    pub fn new(pipeline: Arc<RagPipeline>, metrics: PrometheusHandle) -> Arc<Self> {
        Arc::new(Self { pipeline, metrics })
    }
}
