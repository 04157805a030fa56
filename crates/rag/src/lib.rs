//! Multi-source retrieval: provider adapters, concurrent aggregation and
//! context composition.

pub mod context_composer;
pub mod github_client;
pub mod knowledge_base;
pub mod retriever;
pub mod searxng_client;
pub mod sources;
pub mod youtube_client;

use anyhow::Result;
use askroute_common::SystemConfig;
use std::sync::Arc;
use tracing::{info, warn};

pub use context_composer::{ComposedContext, ContextComposer, NO_RELEVANT_INFORMATION};
pub use github_client::GitHubClient;
pub use knowledge_base::{
    summarize, Embedder, IndexMatch, KnowledgeBase, NewDocument, QdrantIndex, VectorIndex,
};
pub use retriever::MultiSourceRetriever;
pub use searxng_client::SearXNGClient;
pub use sources::{DocumentRetrieval, SourceAdapter, SourceBatch};
pub use youtube_client::YouTubeClient;

/// Build every configured adapter once; the clients are shared for the process lifetime
pub async fn build_retriever(config: &SystemConfig) -> Result<MultiSourceRetriever> {
    let max_results = config.retrieval.max_results;
    let mut retriever = MultiSourceRetriever::default();

    if config.web.enabled {
        let web = SearXNGClient::from_config(&config.web, max_results)?;
        if let Err(e) = web.health_check().await {
            warn!("SearXNG is not reachable, web search will return nothing: {:#}", e);
        }
        retriever = retriever.with_source(Arc::new(web));
    }

    retriever = retriever
        .with_source(Arc::new(YouTubeClient::new(&config.youtube, max_results)?))
        .with_source(Arc::new(GitHubClient::new(&config.github, max_results)?))
        .with_source(Arc::new(KnowledgeBase::from_config(&config.vector)));

    info!(sources = ?retriever.source_kinds(), "Retriever ready");
    Ok(retriever)
}
