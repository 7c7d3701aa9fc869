//! Service settings
//!
//! Loaded once at startup from the process environment (after `.env`) and
//! validated eagerly, so a misconfigured deployment fails before it serves.

use std::time::Duration;

use tool_sdk::config::{AzureOpenAIConfig, ConfigProvider, ConfigProviderExt, SearchConfig, DEFAULT_PROVIDER};
use tool_sdk::error::{Result, ServiceError};

use crate::instrumentation::Pricing;
use crate::logging::LoggingConfig;

/// Everything the service needs to run
#[derive(Debug, Clone)]
pub struct Settings {
    pub openai: AzureOpenAIConfig,
    pub search: SearchConfig,

    /// Passages retrieved per query
    pub top_k: usize,

    /// Bound on each generation attempt
    pub llm_timeout: Duration,

    /// Construct backend clients at startup instead of on first request
    pub eager_init: bool,

    pub pricing: Pricing,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Load `.env`, then read settings from the environment
    pub fn from_env() -> Result<Self> {
        config_rs::load_env();
        Self::from_provider(&**DEFAULT_PROVIDER)
    }

    /// Read settings from any provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let openai = AzureOpenAIConfig::from_provider(provider)?;
        let search = SearchConfig::from_provider(provider)?;

        let top_k = provider.get_int_or("top_k", 5)?;
        if top_k < 1 {
            return Err(ServiceError::configuration(format!("TOP_K must be at least 1, got {}", top_k)));
        }

        let pricing = Pricing {
            prompt_per_1k: provider.get_float_or("llm_prompt_cost_per_1k", 0.0)?,
            completion_per_1k: provider.get_float_or("llm_completion_cost_per_1k", 0.0)?,
        };
        if pricing.prompt_per_1k < 0.0 || pricing.completion_per_1k < 0.0 {
            return Err(ServiceError::configuration("Token prices must not be negative"));
        }

        Ok(Self {
            llm_timeout: Duration::from_secs_f64(openai.timeout_seconds),
            top_k: top_k as usize,
            eager_init: provider.get_bool_or("eager_init", false)?,
            pricing,
            logging: LoggingConfig::from_provider(provider)?,
            openai,
            search,
        })
    }
}
