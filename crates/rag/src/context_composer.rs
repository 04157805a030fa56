//! Renders a `ResultBundle` into the bounded text block handed to the model.

use askroute_common::{
    CodeResult, InternalDocument, RepositoryResult, ResultBundle, VideoResult, WebResult,
};
use std::fmt::Write;

/// Returned instead of an empty string when the bundle has no records
pub const NO_RELEVANT_INFORMATION: &str = "No relevant information found.";
pub const TRUNCATION_MARKER: &str = "...";

/// Composed context text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedContext {
    text: String,
    truncated: bool,
}

impl ComposedContext {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// True when the text is the no-information sentinel
    pub fn is_empty(&self) -> bool {
        self.text == NO_RELEVANT_INFORMATION
    }

    pub fn was_truncated(&self) -> bool {
        self.truncated
    }

    /// Character count
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }
}

impl std::fmt::Display for ComposedContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ContextComposer {
    max_length: usize,
}

impl ContextComposer {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    pub fn compose(&self, bundle: &ResultBundle) -> ComposedContext {
        let mut sections = Vec::new();

        if !bundle.web_results.is_empty() {
            sections.push(section("Web Search Results:", bundle.web_results.iter().map(render_web)));
        }
        if !bundle.youtube_results.is_empty() {
            sections.push(section(
                "YouTube Results:",
                bundle.youtube_results.iter().map(render_video),
            ));
        }
        if !bundle.github_repositories.is_empty() || !bundle.github_code.is_empty() {
            let mut blocks = Vec::new();
            if !bundle.github_repositories.is_empty() {
                blocks.push(section(
                    "Top Repositories:",
                    bundle.github_repositories.iter().map(render_repository),
                ));
            }
            if !bundle.github_code.is_empty() {
                blocks.push(section("Code Results:", bundle.github_code.iter().map(render_code)));
            }
            sections.push(format!("GitHub Results:\n{}", blocks.join("\n\n")));
        }
        if !bundle.internal_documents.is_empty() {
            sections.push(section(
                "Internal Documents:",
                bundle.internal_documents.iter().map(render_document),
            ));
        }

        if sections.is_empty() {
            return ComposedContext {
                text: NO_RELEVANT_INFORMATION.to_string(),
                truncated: false,
            };
        }

        let text = sections.join("\n\n");
        match text.char_indices().nth(self.max_length) {
            Some((cut, _)) => ComposedContext {
                text: format!("{}{}", &text[..cut], TRUNCATION_MARKER),
                truncated: true,
            },
            None => ComposedContext {
                text,
                truncated: false,
            },
        }
    }
}

fn section(label: &str, entries: impl Iterator<Item = String>) -> String {
    let entries: Vec<String> = entries.collect();
    format!("{}\n{}", label, entries.join("\n"))
}

fn render_web(result: &WebResult) -> String {
    format!(
        "Title: {}\nURL: {}\nDescription: {}\n",
        result.title, result.url, result.description
    )
}

fn render_video(video: &VideoResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Title: {}", video.title);
    let _ = writeln!(out, "Channel: {}", video.channel);
    let _ = writeln!(out, "Duration: {}", video.duration);
    let _ = writeln!(out, "URL: {}", video.url);
    let _ = writeln!(out, "Description: {}", video.description);
    let _ = writeln!(out, "Views: {}", video.views);
    let _ = writeln!(out, "Published: {}", video.published);
    out
}

fn render_repository(repo: &RepositoryResult) -> String {
    format!(
        "Repository: {}\nDescription: {}\nStars: {}\nURL: {}\nRelevance: {} matching terms\n",
        repo.repository, repo.description, repo.stars, repo.url, repo.relevance
    )
}

fn render_code(code: &CodeResult) -> String {
    format!(
        "File: {}\nRepository: {}\nURL: {}\nRelevance: {} matching terms\n",
        code.file, code.repository, code.url, code.relevance
    )
}

fn render_document(doc: &InternalDocument) -> String {
    format!(
        "Title: {}\nSource: {}\nRelevance: {:.2}\nContent: {}\n",
        doc.title, doc.source, doc.relevance_score, doc.content
    )
}
