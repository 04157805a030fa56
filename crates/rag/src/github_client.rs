//! GitHub REST client for repository and code search
//!
//! Only technology-flavoured queries reach GitHub. Each search is preceded by
//! a `/rate_limit` probe so an exhausted search quota is waited out (bounded)
//! instead of burning a request.

use anyhow::{Context, Result};
use askroute_common::{AssistantError, CodeResult, GitHubConfig, RepositoryResult, SourceKind};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::sources::{matching_terms, query_terms, SourceAdapter, SourceBatch};

/// Terms that mark a query as worth a code-host search
pub const TECH_KEYWORDS: &[&str] = &[
    "python", "javascript", "java", "c++", "c#", "go", "rust", "php", "ruby", "swift",
    "react", "angular", "vue", "node", "django", "flask", "spring", "laravel",
    "api", "library", "framework", "tool", "script", "bot", "automation",
    "algorithm", "data structure", "machine learning", "ai", "ml", "neural",
    "database", "sql", "nosql", "redis", "mongodb", "postgresql",
    "docker", "kubernetes", "aws", "azure", "gcp", "cloud",
    "git", "github", "gitlab", "ci/cd", "deployment", "devops",
    "mobile", "android", "ios", "flutter", "react native",
    "web", "frontend", "backend", "fullstack", "microservices",
];

/// True when the query mentions any term of [`TECH_KEYWORDS`] (substring, case-insensitive)
pub fn is_technical_query(query: &str) -> bool {
    let lowered = query.to_lowercase();
    TECH_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

#[derive(Debug, Deserialize)]
struct RateLimitResponse {
    #[serde(default)]
    resources: Option<RateLimitResources>,
}

#[derive(Debug, Deserialize)]
struct RateLimitResources {
    #[serde(default)]
    search: Option<SearchQuota>,
}

/// Search quota reported by `/rate_limit`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SearchQuota {
    #[serde(default)]
    pub remaining: Option<u64>,
    /// Epoch seconds at which the quota resets
    #[serde(default)]
    pub reset: Option<i64>,
}

/// What to do before searching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    Proceed,
    WaitThenProceed(Duration),
    GiveUp { wait_secs: u64 },
}

impl SearchQuota {
    pub fn decide(&self, now: i64, buffer_secs: u64, max_wait_secs: u64) -> QuotaDecision {
        match (self.remaining, self.reset) {
            (Some(0), Some(reset)) => {
                let wait_secs = reset.saturating_sub(now).max(0) as u64 + buffer_secs;
                if wait_secs > max_wait_secs {
                    QuotaDecision::GiveUp { wait_secs }
                } else {
                    QuotaDecision::WaitThenProceed(Duration::from_secs(wait_secs))
                }
            }
            _ => QuotaDecision::Proceed,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

/// Repository item from `/search/repositories`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepositoryItem {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Code item from `/search/code`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodeItem {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub repository: Option<CodeRepository>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodeRepository {
    #[serde(default)]
    pub full_name: Option<String>,
}

impl RepositoryItem {
    /// Normalize and score; `None` for partial records or zero relevance
    pub fn into_record(self, terms: &[String]) -> Option<RepositoryResult> {
        let repository = self.full_name.filter(|n| !n.is_empty())?;
        let url = self.html_url.filter(|u| !u.is_empty())?;
        let description = self.description.unwrap_or_default();
        let relevance = matching_terms(terms, &[repository.as_str(), description.as_str()]);
        (relevance > 0).then_some(RepositoryResult {
            repository,
            description,
            stars: self.stargazers_count,
            url,
            relevance,
        })
    }
}

impl CodeItem {
    pub fn into_record(self, terms: &[String]) -> Option<CodeResult> {
        let file = self.path.filter(|p| !p.is_empty())?;
        let url = self.html_url.filter(|u| !u.is_empty())?;
        let repository = self
            .repository
            .and_then(|r| r.full_name)
            .filter(|n| !n.is_empty())?;
        let relevance = matching_terms(terms, &[file.as_str(), repository.as_str()]);
        (relevance > 0).then_some(CodeResult {
            file,
            repository,
            url,
            relevance,
        })
    }
}

#[derive(Debug, Clone)]
pub struct GitHubClient {
    endpoint: String,
    token: Option<String>,
    client: Client,
    max_results: usize,
    code_search: bool,
    rate_limit_buffer_secs: u64,
    max_rate_limit_wait_secs: u64,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig, max_results: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("askroute/", env!("CARGO_PKG_VERSION")))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .context("Failed to build HTTP client")?;

        info!(
            "Initialized GitHub client: endpoint={}, token_configured={}, code_search={}",
            config.endpoint,
            config.token.is_some(),
            config.code_search
        );

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            client,
            max_results,
            code_search: config.code_search,
            rate_limit_buffer_secs: config.rate_limit_buffer_secs,
            max_rate_limit_wait_secs: config.max_rate_limit_wait_secs,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let mut builder = self
            .client
            .get(format!("{}{}", self.endpoint, path))
            .header("Accept", "application/vnd.github+json")
            .query(params);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("Failed to send GitHub request to {}", path))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("GitHub {} returned error status {}: {}", path, status, error_text);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse GitHub {} response", path))
    }

    /// Current search quota, `None` when GitHub does not report one
    #[instrument(skip(self))]
    pub async fn search_quota(&self) -> Result<Option<SearchQuota>> {
        let response: RateLimitResponse = self.get_json("/rate_limit", &[]).await?;
        Ok(response.resources.and_then(|r| r.search))
    }

    /// Probe the quota and wait it out if the wait is within bounds
    async fn await_search_quota(&self) -> askroute_common::Result<()> {
        let quota = match self.search_quota().await {
            Ok(Some(quota)) => quota,
            Ok(None) => {
                debug!("No search quota reported, proceeding");
                return Ok(());
            }
            Err(e) => {
                debug!("Rate limit probe failed, proceeding: {:#}", e);
                return Ok(());
            }
        };

        match quota.decide(
            Utc::now().timestamp(),
            self.rate_limit_buffer_secs,
            self.max_rate_limit_wait_secs,
        ) {
            QuotaDecision::Proceed => Ok(()),
            QuotaDecision::WaitThenProceed(wait) => {
                info!(wait_secs = wait.as_secs(), "GitHub search quota exhausted, waiting for reset");
                tokio::time::sleep(wait).await;
                Ok(())
            }
            QuotaDecision::GiveUp { wait_secs } => Err(AssistantError::RateLimited {
                provider: SourceKind::Repository.to_string(),
                wait_secs,
            }),
        }
    }

    /// Repositories matching `query`, most starred first
    #[instrument(skip(self), fields(query_len = query.len()))]
    pub async fn search_repositories(&self, query: &str) -> Result<Vec<RepositoryItem>> {
        let response: SearchResponse<RepositoryItem> = self
            .get_json(
                "/search/repositories",
                &[
                    ("q", query.to_string()),
                    ("sort", "stars".to_string()),
                    ("order", "desc".to_string()),
                    ("per_page", self.max_results.to_string()),
                ],
            )
            .await?;
        debug!(count = response.items.len(), "GitHub repository search completed");
        Ok(response.items)
    }

    #[instrument(skip(self), fields(query_len = query.len()))]
    pub async fn search_code(&self, query: &str) -> Result<Vec<CodeItem>> {
        let response: SearchResponse<CodeItem> = self
            .get_json(
                "/search/code",
                &[
                    ("q", query.to_string()),
                    ("per_page", self.max_results.to_string()),
                ],
            )
            .await?;
        debug!(count = response.items.len(), "GitHub code search completed");
        Ok(response.items)
    }

    /// Score and deduplicate repositories, keeping popularity order
    pub fn normalize_repositories(&self, query: &str, items: Vec<RepositoryItem>) -> Vec<RepositoryResult> {
        let terms = query_terms(query);
        let mut seen = HashSet::new();
        items
            .into_iter()
            .take(self.max_results)
            .filter_map(|item| item.into_record(&terms))
            .filter(|record| seen.insert(record.repository.clone()))
            .collect()
    }

    pub fn normalize_code(&self, query: &str, items: Vec<CodeItem>) -> Vec<CodeResult> {
        let terms = query_terms(query);
        let mut seen = HashSet::new();
        items
            .into_iter()
            .take(self.max_results)
            .filter_map(|item| item.into_record(&terms))
            .filter(|record| seen.insert(record.url.clone()))
            .collect()
    }
}

#[async_trait]
impl SourceAdapter for GitHubClient {
    fn kind(&self) -> SourceKind {
        SourceKind::Repository
    }

    async fn search(&self, query: &str) -> SourceBatch {
        let empty = SourceBatch::empty(SourceKind::Repository);

        if !self.is_configured() {
            debug!("GitHub token not configured, skipping code-host search");
            return empty;
        }
        if !is_technical_query(query) {
            debug!("Query has no technology keyword, skipping code-host search");
            return empty;
        }
        if let Err(e) = self.await_search_quota().await {
            warn!(
                max_wait_secs = self.max_rate_limit_wait_secs,
                "Skipping code-host search: {}", e
            );
            return empty;
        }

        let repositories = match self.search_repositories(query).await {
            Ok(items) => self.normalize_repositories(query, items),
            Err(e) => {
                warn!("Repository search failed: {:#}", e);
                Vec::new()
            }
        };

        let code = if self.code_search {
            match self.search_code(query).await {
                Ok(items) => self.normalize_code(query, items),
                Err(e) => {
                    warn!("Code search failed: {:#}", e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        info!(
            repositories = repositories.len(),
            code = code.len(),
            "Code-host search returned results"
        );
        SourceBatch::CodeHost { repositories, code }
    }
}
