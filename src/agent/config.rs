//! Agent configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.
//! Credentials are read from the process environment at startup only; there
//! is no configuration file.

use std::time::Duration;

use crate::error::AgentError;

/// Default maximum dispatch/revise rounds after the initial draft.
const DEFAULT_MAX_ITERATIONS: usize = 2;
/// Default search results per query.
const DEFAULT_MAX_RESULTS: usize = 5;
/// Default retries for a model call that fails schema validation.
const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default maximum concurrent search invocations per dispatch round.
const DEFAULT_MAX_CONCURRENCY: usize = 8;
/// Default per-invocation search timeout in seconds.
const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 30;
/// Default maximum tokens per model response.
const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Configuration for the reflexion agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// LLM provider name (e.g., "openai").
    pub provider: String,
    /// API key for the model provider.
    pub api_key: String,
    /// Optional base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// Model used for both draft and revision turns.
    pub model: String,
    /// API key for the search backend.
    pub search_api_key: String,
    /// Maximum dispatch/revise rounds after the initial draft.
    pub max_iterations: usize,
    /// Search results requested per query.
    pub max_results: usize,
    /// Retries for a model call whose output fails schema validation.
    pub max_retries: u32,
    /// Maximum concurrent search invocations within one dispatch round.
    pub max_concurrency: usize,
    /// Per-invocation search timeout. Bounds a hung query; there is no
    /// round-level or session-level timeout.
    pub search_timeout: Duration,
    /// Sampling temperature for model calls.
    pub temperature: f32,
    /// Maximum tokens per model response.
    pub max_tokens: u32,
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if the model or search API key
    /// is not found.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    search_api_key: Option<String>,
    max_iterations: Option<usize>,
    max_results: Option<usize>,
    max_retries: Option<u32>,
    max_concurrency: Option<usize>,
    search_timeout: Option<Duration>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.provider.is_none() {
            self.provider = std::env::var("REFLEXION_PROVIDER").ok();
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var("OPENAI_API_KEY")
                .or_else(|_| std::env::var("REFLEXION_API_KEY"))
                .ok();
        }
        if self.base_url.is_none() {
            self.base_url = std::env::var("OPENAI_BASE_URL")
                .or_else(|_| std::env::var("REFLEXION_BASE_URL"))
                .ok();
        }
        if self.model.is_none() {
            self.model = std::env::var("REFLEXION_MODEL").ok();
        }
        if self.search_api_key.is_none() {
            self.search_api_key = std::env::var("TAVILY_API_KEY").ok();
        }
        if self.max_iterations.is_none() {
            self.max_iterations = std::env::var("REFLEXION_MAX_ITERATIONS")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.max_results.is_none() {
            self.max_results = std::env::var("REFLEXION_MAX_RESULTS")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the model API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model identifier.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the search backend API key.
    #[must_use]
    pub fn search_api_key(mut self, key: impl Into<String>) -> Self {
        self.search_api_key = Some(key.into());
        self
    }

    /// Sets the maximum dispatch/revise rounds.
    #[must_use]
    pub const fn max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = Some(n);
        self
    }

    /// Sets the search results per query.
    #[must_use]
    pub const fn max_results(mut self, n: usize) -> Self {
        self.max_results = Some(n);
        self
    }

    /// Sets the schema-violation retry budget.
    #[must_use]
    pub const fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = Some(n);
        self
    }

    /// Sets the maximum concurrent search invocations.
    #[must_use]
    pub const fn max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = Some(n);
        self
    }

    /// Sets the per-invocation search timeout.
    #[must_use]
    pub const fn search_timeout(mut self, duration: Duration) -> Self {
        self.search_timeout = Some(duration);
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }

    /// Sets the maximum tokens per model response.
    #[must_use]
    pub const fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = Some(n);
        self
    }

    /// Builds the [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if the model or search API key
    /// was not set.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let api_key = self.api_key.ok_or_else(|| AgentError::ApiKeyMissing {
            var: "OPENAI_API_KEY".to_string(),
        })?;
        let search_api_key = self
            .search_api_key
            .ok_or_else(|| AgentError::ApiKeyMissing {
                var: "TAVILY_API_KEY".to_string(),
            })?;

        Ok(AgentConfig {
            provider: self.provider.unwrap_or_else(|| "openai".to_string()),
            api_key,
            base_url: self.base_url,
            model: self
                .model
                .unwrap_or_else(|| "gpt-5.2-2025-12-11".to_string()),
            search_api_key,
            max_iterations: self.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS),
            max_results: self.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            max_concurrency: self.max_concurrency.unwrap_or(DEFAULT_MAX_CONCURRENCY),
            search_timeout: self
                .search_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_SEARCH_TIMEOUT_SECS)),
            temperature: self.temperature.unwrap_or(0.0),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        })
    }
}
