//! Web search collaborator: trait and Tavily implementation.
//!
//! The dispatcher treats the backend as unreliable: any error here is an
//! [`AgentError::ToolInvocation`] that drops only the failing query from
//! its round, never the round itself.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::config::AgentConfig;
use crate::error::AgentError;

/// A single ranked search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Result title.
    pub title: String,
    /// Source URL.
    pub url: String,
    /// Snippet or extracted page content.
    pub content: String,
}

/// Trait for web search backends.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Backend name (e.g., `"tavily"`).
    fn name(&self) -> &'static str;

    /// Runs one search query, returning up to `max_results` ranked results.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ToolInvocation`] on transport or API failures.
    async fn search(&self, query: &str, max_results: usize)
    -> Result<Vec<SearchResult>, AgentError>;
}

/// Tavily search API endpoint.
const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// Search backend backed by the Tavily HTTP API.
pub struct TavilySearch {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl TavilySearch {
    /// Creates a new Tavily client from agent configuration.
    ///
    /// The per-request timeout comes from `config.search_timeout`; a hung
    /// query is bounded here rather than cancelled by the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Orchestration`] if the HTTP client cannot be built.
    pub fn new(config: &AgentConfig) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(config.search_timeout)
            .build()
            .map_err(|e| AgentError::Orchestration {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key: config.search_api_key.clone(),
            endpoint: TAVILY_ENDPOINT.to_string(),
        })
    }

    /// Overrides the API endpoint (for proxies and tests).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl std::fmt::Debug for TavilySearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TavilySearch")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    fn name(&self) -> &'static str {
        "tavily"
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, AgentError> {
        let body = TavilyRequest {
            api_key: &self.api_key,
            query,
            max_results,
        };

        let invocation_err = |message: String| AgentError::ToolInvocation {
            query: query.to_string(),
            message,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| invocation_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(invocation_err(format!("HTTP {status}: {detail}")));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| invocation_err(format!("invalid response body: {e}")))?;

        Ok(parsed.results)
    }
}
