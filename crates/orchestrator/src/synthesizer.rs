//! Model call, strict parse and the degraded/error fallbacks.
//!
//! `synthesize` never fails: every path ends in a [`SynthesisOutcome`].

use askroute_common::{
    ChatModel, CodeResult, CompletionRequest, ExternalResponse, InternalDocument,
    InternalResponse, Mode, QueryState, RepositoryResult, ResultBundle, SourceKind,
    StructuredResponse, VideoResult, WebResult,
};
use askroute_rag::{summarize, ComposedContext, ContextComposer};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::parser::parse_structured;
use crate::prompts::PromptBuilder;

pub const NO_INTERNAL_MATCH_ANSWER: &str =
    "I couldn't find any relevant information in the internal knowledge base for your question.";

pub const FAILURE_MESSAGE: &str = "I'm sorry, I wasn't able to generate a response right now. \
    Please check that the model API key and configuration are correct, then try again.";

const ERROR_CONTEXT_LIMIT: usize = 1000;

/// Record lists carried by degraded and error payloads
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetrievedLists {
    pub web_results: Vec<WebResult>,
    pub youtube_results: Vec<VideoResult>,
    pub github_repositories: Vec<RepositoryResult>,
    pub github_code: Vec<CodeResult>,
    pub internal_documents: Vec<InternalDocument>,
    pub sources_used: Vec<String>,
}

impl RetrievedLists {
    pub fn from_bundle(bundle: &ResultBundle) -> Self {
        Self {
            web_results: bundle.web_results.clone(),
            youtube_results: bundle.youtube_results.clone(),
            github_repositories: bundle.github_repositories.clone(),
            github_code: bundle.github_code.clone(),
            internal_documents: bundle.internal_documents.clone(),
            sources_used: bundle.source_labels(),
        }
    }

    fn strip_code_host_results(&mut self) {
        let code_host = [SourceKind::Repository.to_string(), SourceKind::Code.to_string()];
        self.github_repositories.clear();
        self.github_code.clear();
        self.sources_used.retain(|label| !code_host.contains(label));
    }
}

/// Raw model text used when the structured parse failed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DegradedResponse {
    pub answer: String,
    pub degraded: bool,
    #[serde(flatten)]
    pub lists: RetrievedLists,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_topics: Vec<String>,
}

/// Terminal failure with whatever was retrieved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorPayload {
    pub error: bool,
    pub message: String,
    pub context: String,
    #[serde(flatten)]
    pub lists: RetrievedLists,
    pub error_detail: String,
}

/// Final shape of a request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SynthesisOutcome {
    Structured(StructuredResponse),
    Degraded(DegradedResponse),
    Failed(ErrorPayload),
}

impl SynthesisOutcome {
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Answer text, or the apology for an error payload
    pub fn answer(&self) -> &str {
        match self {
            Self::Structured(response) => response.answer(),
            Self::Degraded(response) => &response.answer,
            Self::Failed(payload) => &payload.message,
        }
    }

    pub fn prefix_answer(&mut self, prefix: &str) {
        match self {
            Self::Structured(response) => response.prefix_answer(prefix),
            Self::Degraded(response) => response.answer.insert_str(0, prefix),
            Self::Failed(_) => {}
        }
    }

    /// Empty the GitHub lists and drop `github` from the sources
    pub fn strip_code_host_results(&mut self) {
        match self {
            Self::Structured(StructuredResponse::External(response)) => {
                response.strip_code_host_results()
            }
            Self::Structured(StructuredResponse::Internal(_)) => {}
            Self::Degraded(response) => response.lists.strip_code_host_results(),
            Self::Failed(payload) => payload.lists.strip_code_host_results(),
        }
    }
}

/// Structured response with empty lists, shaped for `mode`
pub fn plain_answer(mode: Mode, answer: impl Into<String>) -> SynthesisOutcome {
    SynthesisOutcome::Structured(match mode {
        Mode::External => StructuredResponse::External(ExternalResponse::empty(answer)),
        Mode::Internal => StructuredResponse::Internal(InternalResponse::empty(answer)),
    })
}

pub struct ResponseSynthesizer {
    model: Arc<dyn ChatModel>,
    prompts: PromptBuilder,
    composer: ContextComposer,
    relevance_threshold: f32,
}

impl ResponseSynthesizer {
    pub fn new(
        model: Arc<dyn ChatModel>,
        prompts: PromptBuilder,
        composer: ContextComposer,
        relevance_threshold: f32,
    ) -> Self {
        Self {
            model,
            prompts,
            composer,
            relevance_threshold,
        }
    }

    #[instrument(skip(self, state, bundle), fields(mode = %state.mode(), role = %state.role()))]
    pub async fn synthesize(&self, state: &QueryState, mut bundle: ResultBundle) -> SynthesisOutcome {
        if state.mode() == Mode::Internal {
            let before = bundle.internal_documents.len();
            bundle
                .internal_documents
                .retain(|doc| doc.relevance_score >= self.relevance_threshold);
            debug!(
                retained = bundle.internal_documents.len(),
                dropped = before - bundle.internal_documents.len(),
                threshold = self.relevance_threshold,
                "Applied relevance gate"
            );
            if bundle.internal_documents.is_empty() {
                info!("No internal document passed the relevance gate");
                return plain_answer(Mode::Internal, NO_INTERNAL_MATCH_ANSWER);
            }
            regate_summary(&mut bundle);
        }

        let context = self.composer.compose(&bundle);
        let mut outcome = self.call_model(state, &bundle, &context).await;

        if state.mode() == Mode::External {
            outcome.strip_code_host_results();
        }
        outcome
    }

    async fn call_model(
        &self,
        state: &QueryState,
        bundle: &ResultBundle,
        context: &ComposedContext,
    ) -> SynthesisOutcome {
        let system = self.prompts.system_prompt(state);
        let structured = CompletionRequest::new(
            system.clone(),
            self.prompts.structured_user_prompt(state, context),
        )
        .with_json_output();

        let parse_failure = match self.model.complete(structured).await {
            Ok(raw) => match parse_structured(&raw, state.mode()) {
                Ok(response) => {
                    info!("Structured response parsed");
                    return SynthesisOutcome::Structured(complete_structured(response, bundle));
                }
                Err(e) => e.to_string(),
            },
            Err(e) => format!("{:#}", e),
        };
        warn!("Structured response unavailable, retrying without schema: {}", parse_failure);

        let simple = CompletionRequest::new(system, self.prompts.fallback_user_prompt(state, context));
        match self.model.complete(simple).await {
            Ok(text) => SynthesisOutcome::Degraded(DegradedResponse {
                answer: text,
                degraded: true,
                lists: RetrievedLists::from_bundle(bundle),
                confidence_score: bundle.confidence_score,
                related_topics: bundle.related_topics.clone(),
            }),
            Err(e) => {
                error!("Fallback model call failed: {:#}", e);
                SynthesisOutcome::Failed(ErrorPayload {
                    error: true,
                    message: FAILURE_MESSAGE.to_string(),
                    context: context.as_str().chars().take(ERROR_CONTEXT_LIMIT).collect(),
                    lists: RetrievedLists::from_bundle(bundle),
                    error_detail: format!("{:#}", e),
                })
            }
        }
    }
}

/// Confidence and topics describe only the documents that survived the gate
fn regate_summary(bundle: &mut ResultBundle) {
    let retrieval = summarize(std::mem::take(&mut bundle.internal_documents));
    bundle.internal_documents = retrieval.documents;
    bundle.confidence_score = Some(retrieval.confidence_score);
    bundle.related_topics = retrieval.related_topics;
}

/// Pin documents to the gated bundle, fill empty fields from it and set `source`
fn complete_structured(response: StructuredResponse, bundle: &ResultBundle) -> StructuredResponse {
    match response {
        StructuredResponse::External(external) => StructuredResponse::External(external),
        StructuredResponse::Internal(mut internal) => {
            internal.internal_documents = bundle.internal_documents.clone();
            if internal.related_topics.is_empty() {
                internal.related_topics = bundle.related_topics.clone();
            }
            if internal.sources_used.is_empty() {
                internal.sources_used = bundle.source_labels();
            }
            internal.source = bundle
                .internal_documents
                .iter()
                .max_by(|a, b| a.relevance_score.total_cmp(&b.relevance_score))
                .map(|doc| doc.source.clone());
            StructuredResponse::Internal(internal)
        }
    }
}
