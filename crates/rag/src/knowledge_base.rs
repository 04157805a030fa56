//! Internal knowledge base: query embedding plus a Qdrant collection.
//!
//! When the index is unconfigured or unreachable the adapter answers with a
//! single labelled placeholder document instead of nothing, so internal mode
//! can tell "index down" apart from "no match".

use anyhow::{Context, Result};
use askroute_common::{DocumentMetadata, InternalDocument, SourceKind, VectorConfig};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::sources::{DocumentRetrieval, SourceAdapter, SourceBatch};

/// Label carried by the placeholder document
pub const FALLBACK_SOURCE: &str = "fallback";
const FALLBACK_RELEVANCE: f32 = 0.5;
const FALLBACK_CONFIDENCE: f32 = 0.3;
const RELATED_TOPIC_LIMIT: usize = 5;

/// Text to dense vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Nearest neighbour returned by a [`VectorIndex`]
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMatch {
    pub id: String,
    pub score: f32,
    pub metadata: Map<String, Value>,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn query(&self, vector: Vec<f32>, top_k: usize) -> Result<Vec<IndexMatch>>;

    async fn upsert(&self, id: &str, vector: Vec<f32>, metadata: Map<String, Value>) -> Result<()>;
}

#[cfg(feature = "fastembed")]
pub use local::FastEmbedder;

#[cfg(feature = "fastembed")]
mod local {
    use super::*;
    use std::sync::Mutex;

    fn model_for(name: &str) -> Result<fastembed::EmbeddingModel> {
        match name {
            "all-minilm-l6-v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
            "bge-small-en-v1.5" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
            "bge-base-en-v1.5" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
            other => anyhow::bail!(
                "Unknown local embedding model: '{}'. Supported models: \
                 all-minilm-l6-v2, bge-small-en-v1.5, bge-base-en-v1.5",
                other
            ),
        }
    }

    /// ONNX sentence embedder, loaded once and shared
    pub struct FastEmbedder {
        model: Arc<Mutex<fastembed::TextEmbedding>>,
        dimensions: usize,
    }

    impl FastEmbedder {
        pub fn new(model_name: &str, dimensions: usize) -> Result<Self> {
            let model = fastembed::TextEmbedding::try_new(
                fastembed::InitOptions::new(model_for(model_name)?)
                    .with_show_download_progress(false),
            )
            .map_err(|e| anyhow::anyhow!("Failed to initialize local embedding model: {}", e))?;

            info!(model = model_name, dimensions, "Loaded local embedding model");
            Ok(Self {
                model: Arc::new(Mutex::new(model)),
                dimensions,
            })
        }
    }

    #[async_trait]
    impl Embedder for FastEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let model = Arc::clone(&self.model);
            let texts = vec![text.to_string()];

            let embeddings = tokio::task::spawn_blocking(move || {
                #[allow(unused_mut)]
                let mut model = model
                    .lock()
                    .map_err(|_| anyhow::anyhow!("Embedding model lock poisoned"))?;
                model
                    .embed(texts, None)
                    .map_err(|e| anyhow::anyhow!("Local embedding failed: {}", e))
            })
            .await
            .context("Embedding task panicked")??;

            let vector = embeddings
                .into_iter()
                .next()
                .context("Embedding model returned no vector")?;
            if vector.len() != self.dimensions {
                anyhow::bail!(
                    "Embedding has {} dimensions but the index expects {}",
                    vector.len(),
                    self.dimensions
                );
            }
            Ok(vector)
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchPointsBody<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct SearchPointsResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    id: Value,
    score: f32,
    #[serde(default)]
    payload: Option<Map<String, Value>>,
}

/// Qdrant collection accessed over its REST API
#[derive(Debug, Clone)]
pub struct QdrantIndex {
    url: String,
    api_key: Option<String>,
    collection: String,
    client: Client,
}

impl QdrantIndex {
    pub fn new(url: &str, api_key: Option<String>, collection: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .context("Failed to build HTTP client")?;

        info!("Initialized Qdrant index: url={}, collection={}", url, collection);

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            api_key,
            collection: collection.to_string(),
            client,
        })
    }

    /// `None` when no URL is configured
    pub fn from_config(config: &VectorConfig) -> Result<Option<Self>> {
        config
            .url
            .as_deref()
            .map(|url| Self::new(url, config.api_key.clone(), &config.collection, config.timeout_secs))
            .transpose()
    }

    fn points_url(&self, suffix: &str) -> String {
        format!("{}/collections/{}/points{}", self.url, self.collection, suffix)
    }

    fn with_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }
}

/// Point ids must be unsigned integers or UUIDs, so string ids map to a stable v5 UUID
pub fn point_id(id: &str) -> String {
    match Uuid::parse_str(id) {
        Ok(uuid) => uuid.to_string(),
        Err(_) => Uuid::new_v5(&Uuid::NAMESPACE_OID, id.as_bytes()).to_string(),
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    #[instrument(skip(self, vector), fields(collection = %self.collection))]
    async fn query(&self, vector: Vec<f32>, top_k: usize) -> Result<Vec<IndexMatch>> {
        let body = SearchPointsBody {
            vector: &vector,
            limit: top_k,
            with_payload: true,
        };

        let response = self
            .with_auth(self.client.post(self.points_url("/search")).json(&body))
            .send()
            .await
            .context("Failed to send Qdrant search request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Qdrant search returned error status {}: {}", status, error_text);
        }

        let parsed: SearchPointsResponse = response
            .json()
            .await
            .context("Failed to parse Qdrant search response")?;

        debug!(matches = parsed.result.len(), "Qdrant search completed");

        Ok(parsed
            .result
            .into_iter()
            .map(|point| IndexMatch {
                id: match point.id {
                    Value::String(s) => s,
                    other => other.to_string(),
                },
                score: point.score,
                metadata: point.payload.unwrap_or_default(),
            })
            .collect())
    }

    #[instrument(skip(self, vector, metadata), fields(collection = %self.collection))]
    async fn upsert(&self, id: &str, vector: Vec<f32>, mut metadata: Map<String, Value>) -> Result<()> {
        metadata
            .entry("doc_id")
            .or_insert_with(|| Value::String(id.to_string()));

        let body = json!({
            "points": [{
                "id": point_id(id),
                "vector": vector,
                "payload": metadata,
            }]
        });

        let response = self
            .with_auth(self.client.put(self.points_url("?wait=true")).json(&body))
            .send()
            .await
            .context("Failed to send Qdrant upsert request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Qdrant upsert returned error status {}: {}", status, error_text);
        }

        debug!(id, "Upserted document");
        Ok(())
    }
}

/// Document to be added to the index
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub id: String,
    pub title: String,
    pub content: String,
    pub source: String,
    pub category: String,
    pub tags: Vec<String>,
}

impl NewDocument {
    fn payload(&self) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert("doc_id".into(), json!(self.id));
        payload.insert("title".into(), json!(self.title));
        payload.insert("content".into(), json!(self.content));
        payload.insert("source".into(), json!(self.source));
        payload.insert("category".into(), json!(self.category));
        payload.insert("tags".into(), json!(self.tags));
        payload
    }
}

fn payload_str(payload: &Map<String, Value>, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

impl IndexMatch {
    /// Document view of the match; `None` if title, content or source is missing
    pub fn into_document(self) -> Option<InternalDocument> {
        let title = payload_str(&self.metadata, "title")?;
        let content = payload_str(&self.metadata, "content")?;
        let source = payload_str(&self.metadata, "source")?;
        let metadata = DocumentMetadata {
            id: payload_str(&self.metadata, "doc_id").or(Some(self.id)),
            category: payload_str(&self.metadata, "category")
                .unwrap_or_else(|| DocumentMetadata::default().category),
            tags: self
                .metadata
                .get("tags")
                .and_then(Value::as_array)
                .map(|tags| {
                    tags.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        };

        Some(InternalDocument {
            title,
            content,
            source,
            relevance_score: self.score,
            metadata,
        })
    }
}

/// Vector-backed adapter for internal mode
pub struct KnowledgeBase {
    embedder: Option<Arc<dyn Embedder>>,
    index: Option<Arc<dyn VectorIndex>>,
    top_k: usize,
}

impl KnowledgeBase {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, top_k: usize) -> Self {
        Self {
            embedder: Some(embedder),
            index: Some(index),
            top_k,
        }
    }

    /// Knowledge base that always answers with the placeholder document
    pub fn unavailable(top_k: usize) -> Self {
        Self {
            embedder: None,
            index: None,
            top_k,
        }
    }

    /// Build the embedder and index from config, degrading to [`KnowledgeBase::unavailable`]
    pub fn from_config(config: &VectorConfig) -> Self {
        let index = match QdrantIndex::from_config(config) {
            Ok(Some(index)) => index,
            Ok(None) => {
                warn!("No vector index URL configured, internal mode will use the fallback document");
                return Self::unavailable(config.top_k);
            }
            Err(e) => {
                warn!("Failed to initialize vector index: {:#}", e);
                return Self::unavailable(config.top_k);
            }
        };

        match build_embedder(config) {
            Ok(embedder) => Self::new(embedder, Arc::new(index), config.top_k),
            Err(e) => {
                warn!("Failed to initialize embedder: {:#}", e);
                Self::unavailable(config.top_k)
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.embedder.is_some() && self.index.is_some()
    }

    /// Placeholder retrieval used whenever the index cannot be consulted
    pub fn fallback() -> DocumentRetrieval {
        DocumentRetrieval {
            documents: vec![InternalDocument {
                title: "Knowledge base unavailable".to_string(),
                content: "The internal knowledge base could not be reached. This is a sample \
                    placeholder document; check the vector index configuration."
                    .to_string(),
                source: FALLBACK_SOURCE.to_string(),
                relevance_score: FALLBACK_RELEVANCE,
                metadata: DocumentMetadata {
                    id: None,
                    category: "sample".to_string(),
                    tags: vec!["sample".to_string(), "configuration".to_string()],
                },
            }],
            confidence_score: FALLBACK_CONFIDENCE,
            related_topics: vec!["sample".to_string(), "configuration".to_string()],
            fallback: true,
        }
    }

    #[instrument(skip(self), fields(query_len = query.len(), top_k = self.top_k))]
    pub async fn retrieve(&self, query: &str) -> DocumentRetrieval {
        let (Some(embedder), Some(index)) = (&self.embedder, &self.index) else {
            debug!("Knowledge base not configured, returning fallback document");
            return Self::fallback();
        };

        let vector = match embedder.embed(query).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!("Query embedding failed, returning fallback document: {:#}", e);
                return Self::fallback();
            }
        };

        let matches = match index.query(vector, self.top_k).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!("Vector index query failed, returning fallback document: {:#}", e);
                return Self::fallback();
            }
        };

        let documents: Vec<InternalDocument> = matches
            .into_iter()
            .filter_map(IndexMatch::into_document)
            .collect();

        let retrieval = summarize(documents);
        info!(
            documents = retrieval.documents.len(),
            confidence = retrieval.confidence_score,
            "Knowledge base retrieval completed"
        );
        retrieval
    }

    /// Embed `document.content` and upsert it with its metadata
    #[instrument(skip(self, document), fields(id = %document.id))]
    pub async fn add_document(&self, document: NewDocument) -> Result<()> {
        let (Some(embedder), Some(index)) = (&self.embedder, &self.index) else {
            anyhow::bail!("Knowledge base is not configured");
        };

        let vector = embedder
            .embed(&document.content)
            .await
            .context("Failed to embed document")?;
        index
            .upsert(&document.id, vector, document.payload())
            .await
            .with_context(|| format!("Failed to upsert document {}", document.id))?;

        info!("Added document to knowledge base");
        Ok(())
    }
}

#[cfg(feature = "fastembed")]
fn build_embedder(config: &VectorConfig) -> Result<Arc<dyn Embedder>> {
    Ok(Arc::new(FastEmbedder::new(&config.embedding_model, config.vector_size)?))
}

#[cfg(not(feature = "fastembed"))]
fn build_embedder(_config: &VectorConfig) -> Result<Arc<dyn Embedder>> {
    anyhow::bail!("Local embeddings require the `fastembed` feature")
}

/// Confidence is the mean score capped at 1.0; topics are the first distinct tags
pub fn summarize(documents: Vec<InternalDocument>) -> DocumentRetrieval {
    if documents.is_empty() {
        return DocumentRetrieval::default();
    }

    let mean = documents.iter().map(|d| d.relevance_score).sum::<f32>() / documents.len() as f32;

    let mut seen = HashSet::new();
    let related_topics = documents
        .iter()
        .flat_map(|d| d.metadata.tags.iter())
        .filter(|tag| seen.insert(tag.as_str()))
        .take(RELATED_TOPIC_LIMIT)
        .cloned()
        .collect();

    DocumentRetrieval {
        confidence_score: mean.min(1.0),
        related_topics,
        documents,
        fallback: false,
    }
}

#[async_trait]
impl SourceAdapter for KnowledgeBase {
    fn kind(&self) -> SourceKind {
        SourceKind::KnowledgeBase
    }

    async fn search(&self, query: &str) -> SourceBatch {
        SourceBatch::Documents(self.retrieve(query).await)
    }
}
