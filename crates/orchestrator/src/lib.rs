//! Query orchestration: greeting handling, prompt assembly, model output
//! parsing and the per-mode response pipelines.

pub mod greeting;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod synthesizer;

pub use greeting::{classify, GreetingCategory, GreetingPool, Intent};
pub use pipeline::Assistant;
pub use synthesizer::{
    DegradedResponse, ErrorPayload, ResponseSynthesizer, RetrievedLists, SynthesisOutcome,
    NO_INTERNAL_MATCH_ANSWER,
};
