use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{AssistantError, Result};
use crate::types::Role;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
    pub web: WebSearchConfig,
    pub youtube: YouTubeConfig,
    pub github: GitHubConfig,
    pub vector: VectorConfig,
    pub prompts: PromptConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// OpenAI-compatible chat completion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
            temperature: 0.0,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Maximum records requested from each source
    pub max_results: usize,
    /// Character budget of the composed context
    pub max_context_length: usize,
    /// Minimum score an internal document needs to reach the model
    pub relevance_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_results: 5,
            max_context_length: 4000,
            relevance_threshold: 0.4,
        }
    }
}

/// SearXNG instance used for generic web search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSearchConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub timeout_secs: u64,
    pub preferred_engines: Vec<String>,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://localhost:8888".to_string(),
            timeout_secs: 10,
            preferred_engines: vec!["duckduckgo".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YouTubeConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://www.googleapis.com/youtube/v3".to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub endpoint: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
    /// Also search code, requires a token
    pub code_search: bool,
    /// Added to the reset time before searching again
    pub rate_limit_buffer_secs: u64,
    /// Give up instead of sleeping longer than this
    pub max_rate_limit_wait_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.github.com".to_string(),
            token: None,
            timeout_secs: 10,
            code_search: true,
            rate_limit_buffer_secs: 60,
            max_rate_limit_wait_secs: 300,
        }
    }
}

/// Qdrant collection holding the internal knowledge base
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub collection: String,
    pub top_k: usize,
    pub embedding_model: String,
    pub vector_size: usize,
    pub timeout_secs: u64,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            collection: "knowledge_base".to_string(),
            top_k: 5,
            embedding_model: "all-minilm-l6-v2".to_string(),
            vector_size: 384,
            timeout_secs: 10,
        }
    }
}

/// Prompt text, treated as opaque configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub learner: String,
    pub trainer: String,
    pub admin: String,
    pub external_instructions: String,
    pub internal_instructions: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            learner: "You are a helpful learning assistant for students.".to_string(),
            trainer: "You are a knowledgeable trainer assistant.".to_string(),
            admin: "You are an admin assistant with oversight capabilities.".to_string(),
            external_instructions: "Answer the user's question using the web, YouTube and GitHub \
                results provided as context. Cite the results you rely on by including them in the \
                matching result lists. If the context does not contain relevant information, give a \
                general answer and leave the lists empty."
                .to_string(),
            internal_instructions: "Answer the user's question using only the internal documents \
                provided as context. Include the documents you rely on, a confidence score between \
                0 and 1, and related topics. If the documents do not answer the question, say so."
                .to_string(),
        }
    }
}

impl PromptConfig {
    pub fn for_role(&self, role: Role) -> &str {
        match role {
            Role::Learner => &self.learner,
            Role::Trainer => &self.trainer,
            Role::Admin => &self.admin,
        }
    }
}

impl SystemConfig {
    /// Load, apply environment overrides and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file and validate it
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: SystemConfig = toml::from_str(&content)?;
        config.validate()?;
        debug!(path = %path.as_ref().display(), "Configuration loaded");
        Ok(config)
    }

    /// Credentials and endpoints supplied through the environment win over the file
    pub fn apply_env_overrides(&mut self) {
        if let Some(key) = env_var("LLM_API_KEY").or_else(|| env_var("GEMINI_API_KEY")) {
            self.llm.api_key = Some(key);
        }
        if let Some(token) = env_var("GITHUB_TOKEN") {
            self.github.token = Some(token);
        }
        if let Some(key) = env_var("YOUTUBE_API_KEY") {
            self.youtube.api_key = Some(key);
        }
        if let Some(key) = env_var("QDRANT_API_KEY") {
            self.vector.api_key = Some(key);
        }
        if let Some(url) = env_var("QDRANT_URL") {
            self.vector.url = Some(url);
        }
        if let Some(url) = env_var("SEARXNG_URL") {
            self.web.endpoint = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.retrieval.max_results == 0 {
            return Err(AssistantError::validation(
                "retrieval.max_results",
                "must be greater than 0",
            ));
        }
        if self.retrieval.max_context_length == 0 {
            return Err(AssistantError::validation(
                "retrieval.max_context_length",
                "must be greater than 0",
            ));
        }
        if !(0.0..=1.0).contains(&self.retrieval.relevance_threshold) {
            return Err(AssistantError::validation(
                "retrieval.relevance_threshold",
                format!("{} is outside [0, 1]", self.retrieval.relevance_threshold),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(AssistantError::validation(
                "llm.temperature",
                format!("{} is outside [0, 2]", self.llm.temperature),
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(AssistantError::validation("llm.model", "must not be empty"));
        }
        if self.vector.top_k == 0 {
            return Err(AssistantError::validation("vector.top_k", "must be greater than 0"));
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}
