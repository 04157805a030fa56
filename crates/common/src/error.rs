use thiserror::Error;

/// Core error type shared by every crate in the workspace
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AssistantError {
    #[error("Configuration validation failed: {field}: {reason}")]
    ConfigValidation { field: String, reason: String },

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Rate limited by {provider}, resets in {wait_secs}s")]
    RateLimited { provider: String, wait_secs: u64 },

    #[error("Schema parse error: {0}")]
    SchemaParse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML deserialization error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl AssistantError {
    /// Create a validation error for a single config field
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an LLM error
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Create a schema parse error
    pub fn schema_parse(msg: impl Into<String>) -> Self {
        Self::SchemaParse(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AssistantError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_field() {
        let err = AssistantError::validation("retrieval.max_results", "must be greater than 0");
        assert!(err.to_string().contains("retrieval.max_results"));
    }

    #[test]
    fn test_rate_limited_message() {
        let err = AssistantError::RateLimited {
            provider: "github".to_string(),
            wait_secs: 30,
        };
        assert_eq!(err.to_string(), "Rate limited by github, resets in 30s");
    }
}
