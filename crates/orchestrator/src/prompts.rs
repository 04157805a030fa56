//! Prompt assembly for the structured and fallback model calls.

use askroute_common::{
    ExternalResponse, InternalResponse, Mode, PromptConfig, QueryState,
};
use askroute_rag::ComposedContext;
use schemars::schema_for;

/// Builds the system and user messages for one request
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    prompts: PromptConfig,
}

impl PromptBuilder {
    pub fn new(prompts: PromptConfig) -> Self {
        Self { prompts }
    }

    /// Role prompt followed by the mode's instructions
    pub fn system_prompt(&self, state: &QueryState) -> String {
        let instructions = match state.mode() {
            Mode::External => &self.prompts.external_instructions,
            Mode::Internal => &self.prompts.internal_instructions,
        };
        format!("{}\n\n{}", self.prompts.for_role(state.role()), instructions)
    }

    /// Query, context and the JSON format instructions for the mode
    pub fn structured_user_prompt(&self, state: &QueryState, context: &ComposedContext) -> String {
        format!(
            "{}\n\n{}",
            self.fallback_user_prompt(state, context),
            format_instructions(state.mode())
        )
    }

    /// Query and context only
    pub fn fallback_user_prompt(&self, state: &QueryState, context: &ComposedContext) -> String {
        let context_label = match state.mode() {
            Mode::External => "Context from web sources:",
            Mode::Internal => "Context from the internal knowledge base:",
        };
        format!(
            "User Query: {}\n\n{}\n{}\n\nPlease provide a comprehensive answer based on the context above.",
            state.query(),
            context_label,
            context
        )
    }
}

/// JSON Schema of the structured response for `mode`
pub fn response_schema(mode: Mode) -> String {
    let schema = match mode {
        Mode::External => schema_for!(ExternalResponse),
        Mode::Internal => schema_for!(InternalResponse),
    };
    // RootSchema always serializes
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

pub fn format_instructions(mode: Mode) -> String {
    format!(
        "The output should be formatted as a JSON instance that conforms to the JSON schema below.\n\
         Respond with the JSON object only, without commentary.\n\n\
         Here is the output schema:\n```json\n{}\n```",
        response_schema(mode)
    )
}
