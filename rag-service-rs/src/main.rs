use std::sync::Arc;

use anyhow::Context;
use rag_service::api::{self, AppState};
use rag_service::clients::ClientRegistry;
use rag_service::instrumentation::{install_prometheus_recorder, PrometheusSink};
use rag_service::logging::init_logging;
use rag_service::{RagPipeline, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env().context("Invalid configuration")?;

    // Keep the guard alive so buffered file output is flushed on exit
    let _log_guard = init_logging(&settings.logging)?;

    let metrics_handle = install_prometheus_recorder().context("Failed to install Prometheus recorder")?;

    let clients = Arc::new(ClientRegistry::new(settings.openai.clone(), settings.search.clone()));
    if settings.eager_init {
        clients.warm_up().context("Failed to initialize backend clients")?;
        tracing::info!("Backend clients initialized at startup");
    }

    let pipeline = Arc::new(RagPipeline::from_settings(
        &settings,
        clients.clone(),
        clients,
        Arc::new(PrometheusSink),
    ));

    let app = api::router(AppState::new(pipeline, metrics_handle));

    let addr = config_rs::get_bind_address("RAG", 8000);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        addr = %addr,
        top_k = settings.top_k,
        deployment = %settings.openai.chat_deployment,
        index = %settings.search.index_name,
        "RAG service listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("RAG service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
