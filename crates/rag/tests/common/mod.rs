//! Common test utilities for retrieval testing

#![allow(dead_code)]

pub mod mock_providers;

use askroute_common::{GitHubConfig, SystemConfig, VectorConfig, YouTubeConfig};
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging for tests
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = askroute_common::init_tracing_with_level("debug");
    });
}

/// Default config with every provider pointed at `base_url`
pub fn create_test_config(base_url: &str) -> SystemConfig {
    let mut config = SystemConfig::default();
    config.web.endpoint = base_url.to_string();
    config.youtube = youtube_config(base_url, Some("yt-test-key"));
    config.github = github_config(base_url, Some("gh-test-token"));
    config.vector = vector_config(base_url);
    config
}

pub fn youtube_config(base_url: &str, api_key: Option<&str>) -> YouTubeConfig {
    YouTubeConfig {
        endpoint: base_url.to_string(),
        api_key: api_key.map(str::to_string),
        timeout_secs: 5,
    }
}

pub fn github_config(base_url: &str, token: Option<&str>) -> GitHubConfig {
    GitHubConfig {
        endpoint: base_url.to_string(),
        token: token.map(str::to_string),
        timeout_secs: 5,
        code_search: true,
        rate_limit_buffer_secs: 0,
        max_rate_limit_wait_secs: 300,
    }
}

pub fn vector_config(base_url: &str) -> VectorConfig {
    VectorConfig {
        url: Some(base_url.to_string()),
        api_key: Some("qdrant-test-key".to_string()),
        ..VectorConfig::default()
    }
}

/// Fixed 384-dimension vector
pub fn create_test_embedding() -> Vec<f32> {
    (0..384).map(|i| (i as f32) / 384.0).collect()
}
