//! SearXNG API Client for Web Search
//!
//! Talks to a SearXNG instance's JSON API and adapts its results into
//! `WebResult` records for the external pipeline.

use anyhow::{Context, Result};
use askroute_common::{SourceKind, WebResult, WebSearchConfig};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::sources::{SourceAdapter, SourceBatch};

/// SearXNG search result as returned by the API.
///
/// Every field may be absent; records lacking a URL, title or snippet are
/// dropped during normalization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResult {
    /// Target URL of the search result
    #[serde(default)]
    pub url: Option<String>,

    /// Page title
    #[serde(default)]
    pub title: Option<String>,

    /// Content snippet/description
    #[serde(default)]
    pub content: Option<String>,

    /// Search engine that provided this result
    #[serde(default)]
    pub engine: Option<String>,

    /// Result score/ranking (if available)
    #[serde(default)]
    pub score: Option<f32>,
}

impl SearchResult {
    /// Normalize into a `WebResult`, `None` when a required field is missing or blank
    pub fn into_record(self) -> Option<WebResult> {
        let url = non_blank(self.url)?;
        let title = non_blank(self.title)?;
        let description = non_blank(self.content)?;
        Some(WebResult {
            title,
            url,
            description,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// SearXNG API response structure
#[derive(Debug, Deserialize)]
struct SearXNGResponse {
    #[serde(default)]
    number_of_results: usize,

    #[serde(default)]
    results: Vec<SearchResult>,
}

/// SearXNG HTTP client with connection pooling and error handling
#[derive(Debug, Clone)]
pub struct SearXNGClient {
    /// Base URL of the SearXNG instance (e.g., "http://localhost:8888")
    endpoint: String,

    /// HTTP client with connection pooling
    client: Client,

    /// Maximum results to return per query
    max_results: usize,

    /// Preferred search engines (e.g., ["google", "duckduckgo"])
    engines: Vec<String>,
}

impl SearXNGClient {
    /// Create a new SearXNG client
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Base URL of SearXNG instance (e.g., "http://localhost:8888")
    /// * `timeout_secs` - Request timeout in seconds
    /// * `max_results` - Maximum number of records the adapter surfaces
    /// * `engines` - Preferred search engines to use
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    #[instrument(skip_all, fields(endpoint = %endpoint))]
    pub fn new(
        endpoint: String,
        timeout_secs: u64,
        max_results: usize,
        engines: Vec<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .context("Failed to build HTTP client")?;

        let instance = Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
            max_results,
            engines,
        };

        info!(
            "Initialized SearXNG client: endpoint={}, timeout={}s, max_results={}",
            instance.endpoint, timeout_secs, max_results
        );

        Ok(instance)
    }

    pub fn from_config(config: &WebSearchConfig, max_results: usize) -> Result<Self> {
        Self::new(
            config.endpoint.clone(),
            config.timeout_secs,
            max_results,
            config.preferred_engines.clone(),
        )
    }

    /// Perform a web search query
    ///
    /// Returns the provider's results unfiltered and in provider order.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - SearXNG is unreachable
    /// - Request times out
    /// - Response parsing fails
    #[instrument(skip(self), fields(query_len = query.len(), endpoint = %self.endpoint))]
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let url = format!("{}/search", self.endpoint);

        let mut params = vec![("q", query.to_string()), ("format", "json".to_string())];

        if !self.engines.is_empty() {
            params.push(("engines", self.engines.join(",")));
        }

        debug!("Sending SearXNG request: params={:?}", params);

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .context("Failed to send request to SearXNG")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("SearXNG returned error status {}: {}", status, error_text);
        }

        let search_response: SearXNGResponse = response
            .json()
            .await
            .context("Failed to parse SearXNG JSON response")?;

        debug!(
            reported = search_response.number_of_results,
            received = search_response.results.len(),
            "SearXNG search completed"
        );

        Ok(search_response.results)
    }

    /// Perform a health check on the SearXNG instance
    ///
    /// Validates that SearXNG is reachable and responding correctly.
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn health_check(&self) -> Result<()> {
        let url = format!("{}/", self.endpoint);

        debug!("Performing SearXNG health check at {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .context("SearXNG health check failed: instance unreachable")?;

        if !response.status().is_success() {
            anyhow::bail!("SearXNG health check failed: status {}", response.status());
        }

        info!("SearXNG health check passed");
        Ok(())
    }

    /// Extract and deduplicate URLs from search results, keeping first occurrence order
    pub fn extract_urls(results: &[SearchResult]) -> Vec<String> {
        let mut seen = HashSet::new();
        results
            .iter()
            .filter_map(|r| r.url.as_ref())
            .filter(|url| seen.insert(url.as_str()))
            .cloned()
            .collect()
    }

    /// Drop invalid records and duplicate URLs, then cap at `max_results`
    pub fn normalize(&self, results: Vec<SearchResult>) -> Vec<WebResult> {
        let mut seen = HashSet::new();
        results
            .into_iter()
            .filter_map(SearchResult::into_record)
            .filter(|record| seen.insert(record.url.clone()))
            .take(self.max_results)
            .collect()
    }
}

#[async_trait]
impl SourceAdapter for SearXNGClient {
    fn kind(&self) -> SourceKind {
        SourceKind::Web
    }

    async fn search(&self, query: &str) -> SourceBatch {
        match SearXNGClient::search(self, query).await {
            Ok(results) => {
                let records = self.normalize(results);
                info!(count = records.len(), "Web search returned results");
                SourceBatch::Web(records)
            }
            Err(e) => {
                warn!("Web search failed, continuing without web results: {:#}", e);
                SourceBatch::Web(Vec::new())
            }
        }
    }
}
