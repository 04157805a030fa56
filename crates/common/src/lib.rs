//! Common types and utilities shared across all crates

pub mod config;
pub mod error;
pub mod llm;
pub mod telemetry;
pub mod types;

pub use config::*;
pub use error::{AssistantError, Result};
pub use llm::{ChatModel, CompletionRequest, OpenAiCompatibleClient};
pub use telemetry::*;
pub use types::*;
