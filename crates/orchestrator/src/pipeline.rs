//! Request entry point: greeting short-circuit, retrieval for the mode's
//! sources, then synthesis.

use anyhow::Result;
use askroute_common::{ChatModel, OpenAiCompatibleClient, QueryState, SystemConfig};
use askroute_rag::{build_retriever, ContextComposer, MultiSourceRetriever};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::greeting::{classify, GreetingPool, Intent};
use crate::prompts::PromptBuilder;
use crate::synthesizer::{plain_answer, ResponseSynthesizer, SynthesisOutcome};

/// Holds every long-lived collaborator; build once and share behind `Arc`
pub struct Assistant {
    retriever: MultiSourceRetriever,
    synthesizer: ResponseSynthesizer,
    greetings: GreetingPool,
}

impl Assistant {
    pub fn new(
        retriever: MultiSourceRetriever,
        model: Arc<dyn ChatModel>,
        config: &SystemConfig,
        greetings: GreetingPool,
    ) -> Self {
        let synthesizer = ResponseSynthesizer::new(
            model,
            PromptBuilder::new(config.prompts.clone()),
            ContextComposer::new(config.retrieval.max_context_length),
            config.retrieval.relevance_threshold,
        );
        Self {
            retriever,
            synthesizer,
            greetings,
        }
    }

    /// Build provider clients, the embedder and the model client from config
    pub async fn from_config(config: &SystemConfig) -> Result<Self> {
        let retriever = build_retriever(config).await?;
        let model: Arc<dyn ChatModel> = Arc::new(OpenAiCompatibleClient::new(&config.llm)?);
        info!(model = %config.llm.model, "Assistant initialized");
        Ok(Self::new(retriever, model, config, GreetingPool::new()))
    }

    #[instrument(skip(self, state), fields(role = %state.role(), mode = %state.mode()))]
    pub async fn handle(&self, state: &QueryState) -> SynthesisOutcome {
        match classify(state.query()) {
            Intent::Greeting(category) => {
                info!(?category, "Answering greeting from the reply pool");
                plain_answer(state.mode(), self.greetings.reply(category))
            }
            Intent::GreetingWithQuestion(_) => {
                let mut outcome = self.answer(state).await;
                outcome.prefix_answer(self.greetings.prefix());
                outcome
            }
            Intent::Query => self.answer(state).await,
        }
    }

    async fn answer(&self, state: &QueryState) -> SynthesisOutcome {
        let bundle = self
            .retriever
            .aggregate(state.query(), state.mode().sources())
            .await;
        self.synthesizer.synthesize(state, bundle).await
    }
}
