//! # Structured Logging
//!
//! Sets up the global `tracing` subscriber: JSON or human-readable output on
//! stdout, plus an optional daily-rotated file. Records emitted through the
//! `log` facade (the SDK clients) are captured as well.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use tool_sdk::config::{ConfigProvider, ConfigProviderExt};
use tool_sdk::error::{Result as ConfigResult, ServiceError};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

static LOGGING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Configuration for the logging system
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,

    /// Used as the log file name
    pub service_name: String,

    pub json_format: bool,

    /// Write a daily-rotated file here as well as to stdout
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            service_name: config_rs::get_formatted_service_name("RAG"),
            json_format: false,
            log_dir: None,
        }
    }
}

impl LoggingConfig {
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> ConfigResult<Self> {
        let defaults = Self::default();

        let json_format = match provider.get_string_or("log_format", "text").to_lowercase().as_str() {
            "json" => true,
            "text" | "pretty" => false,
            other => {
                return Err(ServiceError::configuration(format!(
                    "LOG_FORMAT must be json or text, got {}",
                    other
                )))
            }
        };

        Ok(Self {
            level: provider.get_string_or("log_level", &defaults.level),
            service_name: defaults.service_name,
            json_format,
            log_dir: provider.get_string("log_dir").ok().filter(|d| !d.is_empty()).map(PathBuf::from),
        })
    }
}

/// Initializes the structured logging system
///
/// Returns the file writer guard when file output is enabled; keep it alive
/// for the lifetime of the process or buffered lines are lost. Calling this
/// more than once is a no-op.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    if LOGGING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(None);
    }

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)?,
    };

    let json_layer = config.json_format.then(|| {
        fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_target(true)
    });

    let text_layer = (!config.json_format).then(|| fmt::layer().with_target(true));

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, format!("{}.log", config.service_name));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .try_init()?;

    tracing::info!(
        service = %config.service_name,
        level = %config.level,
        json = config.json_format,
        "Structured logging initialized"
    );

    Ok(guard)
}
