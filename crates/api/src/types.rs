use askroute_common::{Mode, QueryState, Role};
use askroute_orchestrator::SynthesisOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /chat`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub role: Role,
    pub mode: Mode,
    pub query: String,
}

impl ChatRequest {
    pub fn into_state(self) -> QueryState {
        QueryState::new(self.role, self.mode, self.query)
    }
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: SynthesisOutcome,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Machine-readable error code
    pub code: Option<String>,

    /// Timestamp of error
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: &str) -> Self {
        Self {
            error: error.into(),
            code: Some(code.to_string()),
            timestamp: Utc::now(),
        }
    }
}
