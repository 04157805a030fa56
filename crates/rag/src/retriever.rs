//! Concurrent fan-out over source adapters and merge into a `ResultBundle`.

use askroute_common::{ResultBundle, SourceKind};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::sources::{SourceAdapter, SourceBatch};

/// Runs the adapters selected for a query and merges their batches
#[derive(Clone, Default)]
pub struct MultiSourceRetriever {
    sources: Vec<Arc<dyn SourceAdapter>>,
}

impl MultiSourceRetriever {
    pub fn new(sources: Vec<Arc<dyn SourceAdapter>>) -> Self {
        Self { sources }
    }

    pub fn with_source(mut self, source: Arc<dyn SourceAdapter>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn source_kinds(&self) -> Vec<SourceKind> {
        self.sources.iter().map(|s| s.kind()).collect()
    }

    /// Query every registered adapter whose kind is in `kinds`, each on its own task.
    ///
    /// A failing or panicking adapter contributes nothing.
    #[instrument(skip(self, kinds), fields(query_len = query.len()))]
    pub async fn aggregate(&self, query: &str, kinds: &[SourceKind]) -> ResultBundle {
        let selected: Vec<Arc<dyn SourceAdapter>> = self
            .sources
            .iter()
            .filter(|source| {
                let kind = source.kind();
                kinds.contains(&kind) || (kind.is_code_host() && kinds.iter().any(SourceKind::is_code_host))
            })
            .cloned()
            .collect();

        debug!(selected = selected.len(), "Dispatching source adapters");

        let handles = selected.into_iter().map(|source| {
            let query = query.to_string();
            let kind = source.kind();
            let handle = tokio::spawn(async move { source.search(&query).await });
            async move { (kind, handle.await) }
        });

        let mut bundle = ResultBundle::new();
        for (kind, joined) in join_all(handles).await {
            match joined {
                Ok(batch) => {
                    debug!(source = %kind, records = batch.len(), "Source adapter finished");
                    merge(&mut bundle, batch);
                }
                Err(e) => warn!(source = %kind, "Source adapter task failed: {}", e),
            }
        }

        info!(
            records = bundle.record_count(),
            sources = ?bundle.source_labels(),
            "Aggregation completed"
        );
        bundle
    }
}

/// Append a batch, skipping records already present and marking the source used
/// only when something new arrived
pub fn merge(bundle: &mut ResultBundle, batch: SourceBatch) {
    match batch {
        SourceBatch::Web(records) => {
            let mut seen: HashSet<String> = bundle.web_results.iter().map(|r| r.url.clone()).collect();
            let before = bundle.web_results.len();
            bundle
                .web_results
                .extend(records.into_iter().filter(|r| seen.insert(r.url.clone())));
            if bundle.web_results.len() > before {
                bundle.sources_used.insert(SourceKind::Web);
            }
        }
        SourceBatch::Video(records) => {
            let mut seen: HashSet<String> =
                bundle.youtube_results.iter().map(|r| r.url.clone()).collect();
            let before = bundle.youtube_results.len();
            bundle
                .youtube_results
                .extend(records.into_iter().filter(|r| seen.insert(r.url.clone())));
            if bundle.youtube_results.len() > before {
                bundle.sources_used.insert(SourceKind::Video);
            }
        }
        SourceBatch::CodeHost { repositories, code } => {
            let mut seen: HashSet<String> = bundle
                .github_repositories
                .iter()
                .map(|r| r.repository.clone())
                .collect();
            let before = bundle.github_repositories.len();
            bundle
                .github_repositories
                .extend(repositories.into_iter().filter(|r| seen.insert(r.repository.clone())));
            if bundle.github_repositories.len() > before {
                bundle.sources_used.insert(SourceKind::Repository);
            }

            let mut seen: HashSet<String> = bundle.github_code.iter().map(|r| r.url.clone()).collect();
            let before = bundle.github_code.len();
            bundle
                .github_code
                .extend(code.into_iter().filter(|r| seen.insert(r.url.clone())));
            if bundle.github_code.len() > before {
                bundle.sources_used.insert(SourceKind::Repository);
            }
        }
        SourceBatch::Documents(retrieval) => {
            if retrieval.documents.is_empty() {
                if bundle.confidence_score.is_none() {
                    bundle.confidence_score = Some(retrieval.confidence_score);
                }
                return;
            }
            bundle.sources_used.insert(if retrieval.fallback {
                SourceKind::Fallback
            } else {
                SourceKind::KnowledgeBase
            });
            bundle.internal_documents.extend(retrieval.documents);
            bundle.confidence_score = Some(retrieval.confidence_score);
            for topic in retrieval.related_topics {
                if !bundle.related_topics.contains(&topic) {
                    bundle.related_topics.push(topic);
                }
            }
        }
    }
}
