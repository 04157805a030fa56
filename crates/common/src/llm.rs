//! Model collaborator contract and an OpenAI-compatible chat client.

use anyhow::{Context, Result};
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::config::LlmConfig;
use crate::error::AssistantError;

/// One model invocation
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    /// Ask the provider for a JSON object reply
    pub json_output: bool,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            json_output: false,
        }
    }

    pub fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }
}

/// Single call taking a prompt and returning raw text
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

/// Client for any `/chat/completions` endpoint (Gemini, OpenAI, Ollama)
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiCompatibleClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .context("Failed to build HTTP client")?;

        let mut openai_config =
            OpenAIConfig::new().with_api_base(config.endpoint.trim_end_matches('/'));
        if let Some(key) = &config.api_key {
            openai_config = openai_config.with_api_key(key);
        }

        // The synthesizer owns the only retry (its schema-free fallback call)
        let no_retry = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();

        let client = Client::with_config(openai_config)
            .with_http_client(http_client)
            .with_backoff(no_retry);

        info!(
            "Initialized chat client: endpoint={}, model={}",
            config.endpoint, config.model
        );

        Ok(Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    fn build_request(
        &self,
        request: &CompletionRequest,
    ) -> std::result::Result<CreateChatCompletionRequest, OpenAIError> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system.as_str())
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.user.as_str())
                .build()?
                .into(),
        ];

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.as_str())
            .temperature(self.temperature)
            .messages(messages);
        if request.json_output {
            args.response_format(ResponseFormat::JsonObject);
        }
        args.build()
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatibleClient {
    #[instrument(skip(self, request), fields(model = %self.model, json_output = request.json_output))]
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let body = self
            .build_request(&request)
            .map_err(|e| AssistantError::llm(format!("invalid completion request: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(body)
            .await
            .map_err(|e| AssistantError::llm(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AssistantError::llm("chat completion returned no content"))?;

        debug!(reply_len = content.len(), "Chat completion received");
        Ok(content)
    }
}
