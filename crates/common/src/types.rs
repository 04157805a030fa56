use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum_macros::{Display, EnumString};

/// User role, selects the system-prompt variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    Learner,
    Trainer,
    Admin,
}

/// Query mode, selects the response pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Mode {
    /// Vector knowledge store
    Internal,
    /// Live web, video and code search
    External,
}

impl Mode {
    /// Source kinds queried by this mode's pipeline
    pub fn sources(&self) -> &'static [SourceKind] {
        match self {
            Self::External => &[SourceKind::Web, SourceKind::Video, SourceKind::Repository],
            Self::Internal => &[SourceKind::KnowledgeBase],
        }
    }
}

/// Immutable per-request context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    role: Role,
    mode: Mode,
    query: String,
}

impl QueryState {
    pub fn new(role: Role, mode: Mode, query: impl Into<String>) -> Self {
        Self {
            role,
            mode,
            query: query.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

/// Kind of data source a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display)]
pub enum SourceKind {
    #[serde(rename = "web")]
    #[strum(serialize = "web")]
    Web,
    #[serde(rename = "youtube")]
    #[strum(serialize = "youtube")]
    Video,
    #[serde(rename = "github")]
    #[strum(serialize = "github")]
    Repository,
    #[serde(rename = "github_code")]
    #[strum(serialize = "github_code")]
    Code,
    #[serde(rename = "knowledge_base")]
    #[strum(serialize = "knowledge_base")]
    KnowledgeBase,
    #[serde(rename = "fallback")]
    #[strum(serialize = "fallback")]
    Fallback,
}

impl SourceKind {
    /// Repository and code results are both served by the code host
    pub fn is_code_host(&self) -> bool {
        matches!(self, Self::Repository | Self::Code)
    }
}

/// Web search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WebResult {
    /// Title of the web result
    pub title: String,
    /// URL of the web result
    pub url: String,
    /// Description or snippet of the web result
    pub description: String,
}

/// YouTube video result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoResult {
    /// Title of the YouTube video
    pub title: String,
    /// Channel name
    pub channel: String,
    /// Duration of the video, e.g. "1h 5m"
    pub duration: String,
    /// YouTube video URL
    pub url: String,
    /// Video description
    pub description: String,
    /// Number of views
    pub views: String,
    /// Publication date
    pub published: String,
}

/// GitHub repository result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RepositoryResult {
    /// Repository full name
    pub repository: String,
    /// Repository description
    pub description: String,
    /// Number of stars
    pub stars: u64,
    /// GitHub repository URL
    pub url: String,
    /// Number of query terms matching name or description
    pub relevance: u32,
}

/// GitHub code search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CodeResult {
    /// File path in repository
    pub file: String,
    /// Repository full name
    pub repository: String,
    /// GitHub file URL
    pub url: String,
    /// Number of query terms matching path or repository
    pub relevance: u32,
}

/// Metadata attached to an internal document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DocumentMetadata {
    /// Index identifier of the document
    #[serde(default)]
    pub id: Option<String>,
    /// Document category
    #[serde(default = "default_category")]
    pub category: String,
    /// Topic tags
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            id: None,
            category: default_category(),
            tags: Vec::new(),
        }
    }
}

fn default_category() -> String {
    "general".to_string()
}

/// Internal knowledge-base document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InternalDocument {
    /// Title of the internal document
    pub title: String,
    /// Content or snippet of the document
    pub content: String,
    /// Source of the document (e.g., knowledge_base, training_material)
    pub source: String,
    /// Relevance score (0-1)
    pub relevance_score: f32,
    /// Additional metadata
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

/// Per-query aggregate of normalized records across all invoked sources
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultBundle {
    pub web_results: Vec<WebResult>,
    pub youtube_results: Vec<VideoResult>,
    pub github_repositories: Vec<RepositoryResult>,
    pub github_code: Vec<CodeResult>,
    pub internal_documents: Vec<InternalDocument>,
    pub confidence_score: Option<f32>,
    pub related_topics: Vec<String>,
    pub sources_used: BTreeSet<SourceKind>,
}

impl ResultBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no source produced a record
    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }

    pub fn record_count(&self) -> usize {
        self.web_results.len()
            + self.youtube_results.len()
            + self.github_repositories.len()
            + self.github_code.len()
            + self.internal_documents.len()
    }

    /// Source labels in their serialized form
    pub fn source_labels(&self) -> Vec<String> {
        self.sources_used.iter().map(|kind| kind.to_string()).collect()
    }
}

/// Structured answer for the external pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExternalResponse {
    /// Comprehensive answer to the user query
    pub answer: String,
    /// List of web search results
    #[serde(default)]
    pub web_results: Vec<WebResult>,
    /// List of YouTube video results
    #[serde(default)]
    pub youtube_results: Vec<VideoResult>,
    /// List of GitHub repository results
    #[serde(default)]
    pub github_repositories: Vec<RepositoryResult>,
    /// List of GitHub code results
    #[serde(default)]
    pub github_code: Vec<CodeResult>,
    /// List of sources used (web, youtube, github)
    #[serde(default)]
    pub sources_used: Vec<String>,
}

impl ExternalResponse {
    /// Answer with every list empty
    pub fn empty(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            web_results: Vec::new(),
            youtube_results: Vec::new(),
            github_repositories: Vec::new(),
            github_code: Vec::new(),
            sources_used: Vec::new(),
        }
    }

    pub fn strip_code_host_results(&mut self) {
        let code_host = [SourceKind::Repository.to_string(), SourceKind::Code.to_string()];
        self.github_repositories.clear();
        self.github_code.clear();
        self.sources_used.retain(|label| !code_host.contains(label));
    }
}

/// Structured answer for the internal pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InternalResponse {
    /// Comprehensive answer based on internal knowledge
    pub answer: String,
    /// List of relevant internal documents
    #[serde(default)]
    pub internal_documents: Vec<InternalDocument>,
    /// Confidence score of the response (0-1)
    pub confidence_score: f32,
    /// List of related topics or concepts
    #[serde(default)]
    pub related_topics: Vec<String>,
    /// List of internal sources used
    #[serde(default)]
    pub sources_used: Vec<String>,
    /// Source label of the top-ranked document, set after parsing
    #[serde(default)]
    #[schemars(skip)]
    pub source: Option<String>,
}

impl InternalResponse {
    pub fn empty(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            internal_documents: Vec::new(),
            confidence_score: 0.0,
            related_topics: Vec::new(),
            sources_used: Vec::new(),
            source: None,
        }
    }
}

/// Mode-specific structured response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StructuredResponse {
    External(ExternalResponse),
    Internal(InternalResponse),
}

impl StructuredResponse {
    pub fn answer(&self) -> &str {
        match self {
            Self::External(r) => &r.answer,
            Self::Internal(r) => &r.answer,
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            Self::External(_) => Mode::External,
            Self::Internal(_) => Mode::Internal,
        }
    }

    /// Prepend text to the answer
    pub fn prefix_answer(&mut self, prefix: &str) {
        let answer = match self {
            Self::External(r) => &mut r.answer,
            Self::Internal(r) => &mut r.answer,
        };
        answer.insert_str(0, prefix);
    }
}
