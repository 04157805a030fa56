//! SearXNG web adapter tests against a mocked instance

mod common;

use anyhow::Result;
use askroute_common::SourceKind;
use askroute_rag::searxng_client::SearXNGClient;
use askroute_rag::sources::{SourceAdapter, SourceBatch};
use common::init_test_logging;
use common::mock_providers::{searxng_result, MockProviders};
use serde_json::json;

fn client(base_url: &str, max_results: usize) -> Result<SearXNGClient> {
    SearXNGClient::new(base_url.to_string(), 5, max_results, vec!["duckduckgo".to_string()])
}

// ============================================================================
// Provider-native search
// ============================================================================

#[tokio::test]
async fn test_search_returns_provider_results() -> Result<()> {
    init_test_logging();
    let providers = MockProviders::start().await;
    providers
        .setup_searxng(
            json!([
                searxng_result("https://doc.rust-lang.org/book/", "The Rust Book", "Learn Rust"),
                {"title": "No url here", "content": "dropped later"}
            ]),
            1,
        )
        .await;

    let results = client(&providers.base_url(), 5)?.search("rust book").await?;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].url.as_deref(), Some("https://doc.rust-lang.org/book/"));
    assert!(results[1].url.is_none());
    Ok(())
}

#[tokio::test]
async fn test_search_error_status_is_reported() -> Result<()> {
    init_test_logging();
    let providers = MockProviders::start().await;
    providers.setup_searxng_error(503).await;

    let err = client(&providers.base_url(), 5)?
        .search("rust")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("503"));
    Ok(())
}

#[tokio::test]
async fn test_health_check() -> Result<()> {
    init_test_logging();
    let providers = MockProviders::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path("/"))
        .respond_with(wiremock::ResponseTemplate::new(200))
        .expect(1)
        .mount(providers.server())
        .await;

    client(&providers.base_url(), 5)?.health_check().await?;

    let unreachable = client("http://127.0.0.1:9", 5)?;
    assert!(unreachable.health_check().await.is_err());
    Ok(())
}

// ============================================================================
// Adapter behaviour
// ============================================================================

#[tokio::test]
async fn test_adapter_drops_partial_and_duplicate_records() -> Result<()> {
    init_test_logging();
    let providers = MockProviders::start().await;
    providers
        .setup_searxng(
            json!([
                searxng_result("https://a.dev", "A", "first"),
                {"url": "https://b.dev", "title": "B"},
                {"url": "https://c.dev", "content": "no title"},
                searxng_result("https://a.dev", "A mirror", "duplicate"),
                searxng_result("https://d.dev", "D", "second")
            ]),
            1,
        )
        .await;

    let adapter = client(&providers.base_url(), 5)?;
    assert_eq!(adapter.kind(), SourceKind::Web);

    let SourceBatch::Web(records) = SourceAdapter::search(&adapter, "anything").await else {
        panic!("web adapter returned a non-web batch");
    };
    let urls: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, vec!["https://a.dev", "https://d.dev"]);
    assert!(records
        .iter()
        .all(|r| !r.title.is_empty() && !r.description.is_empty()));
    Ok(())
}

#[tokio::test]
async fn test_adapter_caps_at_max_results() -> Result<()> {
    init_test_logging();
    let providers = MockProviders::start().await;
    let many: Vec<_> = (0..8)
        .map(|i| searxng_result(&format!("https://site{}.dev", i), "Site", "snippet"))
        .collect();
    providers.setup_searxng(json!(many), 1).await;

    let adapter = client(&providers.base_url(), 3)?;
    let batch = SourceAdapter::search(&adapter, "sites").await;
    assert_eq!(batch.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_adapter_contains_provider_failure() -> Result<()> {
    init_test_logging();
    let providers = MockProviders::start().await;
    providers.setup_searxng_error(500).await;

    let adapter = client(&providers.base_url(), 5)?;
    let batch = SourceAdapter::search(&adapter, "rust").await;
    assert_eq!(batch, SourceBatch::Web(Vec::new()));
    Ok(())
}

#[tokio::test]
async fn test_adapter_contains_malformed_json() -> Result<()> {
    init_test_logging();
    let providers = MockProviders::start().await;
    wiremock::Mock::given(wiremock::matchers::path("/search"))
        .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(providers.server())
        .await;

    let adapter = client(&providers.base_url(), 5)?;
    assert!(SourceAdapter::search(&adapter, "rust").await.is_empty());
    Ok(())
}
