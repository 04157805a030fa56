//! Source adapter seam shared by every retrieval backend.

use askroute_common::{
    CodeResult, InternalDocument, RepositoryResult, SourceKind, VideoResult, WebResult,
};
use async_trait::async_trait;

/// Records returned by one adapter invocation
#[derive(Debug, Clone, PartialEq)]
pub enum SourceBatch {
    Web(Vec<WebResult>),
    Video(Vec<VideoResult>),
    CodeHost {
        repositories: Vec<RepositoryResult>,
        code: Vec<CodeResult>,
    },
    Documents(DocumentRetrieval),
}

impl SourceBatch {
    /// Empty batch of the shape produced by `kind`
    pub fn empty(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Web => Self::Web(Vec::new()),
            SourceKind::Video => Self::Video(Vec::new()),
            SourceKind::Repository | SourceKind::Code => Self::CodeHost {
                repositories: Vec::new(),
                code: Vec::new(),
            },
            SourceKind::KnowledgeBase | SourceKind::Fallback => {
                Self::Documents(DocumentRetrieval::default())
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Web(records) => records.len(),
            Self::Video(records) => records.len(),
            Self::CodeHost { repositories, code } => repositories.len() + code.len(),
            Self::Documents(retrieval) => retrieval.documents.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Knowledge-base matches plus the scores derived from them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentRetrieval {
    pub documents: Vec<InternalDocument>,
    pub confidence_score: f32,
    pub related_topics: Vec<String>,
    /// Set when the placeholder document stands in for an unavailable index
    pub fallback: bool,
}

/// A retrieval backend wrapped with normalization and error containment.
///
/// `search` never fails: provider errors are logged and surface as an empty batch.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn kind(&self) -> SourceKind;

    async fn search(&self, query: &str) -> SourceBatch;
}

/// Cut `text` to `max_chars` characters and append `...` when it was longer
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Lowercase whitespace-split terms of a query
pub fn query_terms(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Number of terms appearing as a substring of any haystack (case-insensitive)
pub fn matching_terms(terms: &[String], haystacks: &[&str]) -> u32 {
    let haystacks: Vec<String> = haystacks.iter().map(|h| h.to_lowercase()).collect();
    terms
        .iter()
        .filter(|term| haystacks.iter().any(|h| h.contains(term.as_str())))
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate_with_ellipsis("short", 200), "short");
        assert_eq!(truncate_with_ellipsis("exact", 5), "exact");
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        let text = "é".repeat(10);
        let cut = truncate_with_ellipsis(&text, 4);
        assert_eq!(cut, "éééé...");
        assert_eq!(cut.chars().count(), 7);
    }

    #[test]
    fn test_matching_terms_counts_each_term_once() {
        let terms = query_terms("Python machine learning");
        let score = matching_terms(&terms, &["scikit-learn/scikit-learn", "Machine Learning in Python"]);
        assert_eq!(score, 3);
        assert_eq!(matching_terms(&terms, &["torvalds/linux", "Linux kernel"]), 0);
    }

    #[test]
    fn test_empty_batch_shape_follows_kind() {
        assert!(matches!(SourceBatch::empty(SourceKind::Code), SourceBatch::CodeHost { .. }));
        assert!(SourceBatch::empty(SourceKind::KnowledgeBase).is_empty());
    }
}
