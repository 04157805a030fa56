use askroute_common::types::*;
use std::str::FromStr;

fn sample_repository() -> RepositoryResult {
    RepositoryResult {
        repository: "rust-lang/rust".to_string(),
        description: "Empowering everyone to build reliable software".to_string(),
        stars: 100_000,
        url: "https://github.com/rust-lang/rust".to_string(),
        relevance: 1,
    }
}

#[test]
fn test_role_and_mode_parse_case_insensitively() {
    assert_eq!(Role::from_str("Learner").unwrap(), Role::Learner);
    assert_eq!(Mode::from_str("EXTERNAL").unwrap(), Mode::External);
    assert!(Role::from_str("guest").is_err());
}

#[test]
fn test_mode_serde_is_lowercase() {
    let mode: Mode = serde_json::from_str("\"internal\"").unwrap();
    assert_eq!(mode, Mode::Internal);
    assert_eq!(serde_json::to_string(&Role::Trainer).unwrap(), "\"trainer\"");
}

#[test]
fn test_mode_sources() {
    assert_eq!(Mode::Internal.sources(), &[SourceKind::KnowledgeBase]);
    assert!(Mode::External.sources().contains(&SourceKind::Repository));
    assert!(!Mode::External.sources().contains(&SourceKind::KnowledgeBase));
}

#[test]
fn test_source_kind_labels() {
    assert_eq!(SourceKind::Video.to_string(), "youtube");
    assert_eq!(SourceKind::Repository.to_string(), "github");
    assert_eq!(
        serde_json::to_string(&SourceKind::KnowledgeBase).unwrap(),
        "\"knowledge_base\""
    );
}

#[test]
fn test_bundle_counts_and_labels() {
    let mut bundle = ResultBundle::new();
    assert!(bundle.is_empty());

    bundle.github_repositories.push(sample_repository());
    bundle.web_results.push(WebResult {
        title: "Rust".to_string(),
        url: "https://www.rust-lang.org".to_string(),
        description: "A language".to_string(),
    });
    bundle.sources_used.insert(SourceKind::Web);
    bundle.sources_used.insert(SourceKind::Repository);

    assert_eq!(bundle.record_count(), 2);
    assert_eq!(bundle.source_labels(), vec!["web".to_string(), "github".to_string()]);
}

#[test]
fn test_external_response_defaults_missing_lists() {
    let parsed: ExternalResponse = serde_json::from_str(r#"{"answer": "Use cargo."}"#).unwrap();
    assert_eq!(parsed.answer, "Use cargo.");
    assert!(parsed.web_results.is_empty());
    assert!(parsed.sources_used.is_empty());
}

#[test]
fn test_internal_response_requires_confidence() {
    let missing = serde_json::from_str::<InternalResponse>(r#"{"answer": "x"}"#);
    assert!(missing.is_err());

    let parsed: InternalResponse =
        serde_json::from_str(r#"{"answer": "x", "confidence_score": 0.7}"#).unwrap();
    assert!(parsed.source.is_none());
}

#[test]
fn test_internal_document_metadata_defaults() {
    let document: InternalDocument = serde_json::from_str(
        r#"{"title": "Python Best Practices", "content": "Use virtual environments.", "source": "training_material", "relevance_score": 0.82}"#,
    )
    .unwrap();

    assert_eq!(document.metadata.category, "general");
    assert!(document.metadata.tags.is_empty());
    assert!(InternalResponse::empty("answer").source.is_none());
}

#[test]
fn test_structured_response_prefix_and_untagged_serialization() {
    let mut response = StructuredResponse::External(ExternalResponse::empty("Here is the answer."));
    response.prefix_answer("Hello! ");

    assert_eq!(response.answer(), "Hello! Here is the answer.");
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["answer"], "Hello! Here is the answer.");
    assert!(value["github_code"].as_array().unwrap().is_empty());
}
