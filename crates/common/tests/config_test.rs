use askroute_common::config::SystemConfig;
use askroute_common::Role;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_config_load_from_toml() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("test_config.toml");

    let config_content = r#"
[server]
host = "127.0.0.1"
port = 9090

[llm]
endpoint = "http://localhost:11434/v1"
model = "qwen2.5:7b"
temperature = 0.2

[retrieval]
max_results = 3
max_context_length = 2000
relevance_threshold = 0.5

[web]
endpoint = "http://localhost:8888"
preferred_engines = ["duckduckgo", "bing"]

[github]
rate_limit_buffer_secs = 10
code_search = false

[vector]
url = "http://localhost:6333"
collection = "training"
top_k = 8

[prompts]
learner = "You tutor students."
"#;

    fs::write(&config_path, config_content).unwrap();

    let config = SystemConfig::from_file(&config_path).unwrap();

    assert_eq!(config.server.port, 9090);
    assert_eq!(config.llm.model, "qwen2.5:7b");
    assert_eq!(config.retrieval.max_results, 3);
    assert_eq!(config.retrieval.max_context_length, 2000);
    assert_eq!(config.web.preferred_engines.len(), 2);
    assert!(!config.github.code_search);
    assert_eq!(config.github.rate_limit_buffer_secs, 10);
    assert_eq!(config.vector.url.as_deref(), Some("http://localhost:6333"));
    assert_eq!(config.vector.top_k, 8);
    assert_eq!(config.prompts.for_role(Role::Learner), "You tutor students.");
    // untouched fields keep their defaults
    assert_eq!(
        config.prompts.for_role(Role::Admin),
        "You are an admin assistant with oversight capabilities."
    );
}

#[test]
fn test_empty_config_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("empty.toml");
    fs::write(&config_path, "").unwrap();

    let config = SystemConfig::from_file(&config_path).unwrap();

    assert_eq!(config.retrieval.max_results, 5);
    assert_eq!(config.retrieval.max_context_length, 4000);
    assert!((config.retrieval.relevance_threshold - 0.4).abs() < f32::EPSILON);
    assert_eq!(config.vector.top_k, 5);
    assert_eq!(config.github.rate_limit_buffer_secs, 60);
    assert!(config.vector.url.is_none());
}

#[test]
fn test_config_validation_invalid_max_results() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("invalid_config.toml");

    fs::write(&config_path, "[retrieval]\nmax_results = 0\n").unwrap();

    let result = SystemConfig::from_file(&config_path);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("max_results"));
}

#[test]
fn test_config_validation_invalid_threshold() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("invalid_threshold.toml");

    fs::write(&config_path, "[retrieval]\nrelevance_threshold = 1.5\n").unwrap();

    let result = SystemConfig::from_file(&config_path);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("relevance_threshold"));
}

#[test]
fn test_config_validation_invalid_temperature() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("invalid_temp.toml");

    fs::write(&config_path, "[llm]\ntemperature = 3.0\n").unwrap();

    let result = SystemConfig::from_file(&config_path);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("temperature"));
}

#[test]
fn test_missing_file_is_an_error() {
    let result = SystemConfig::from_file("/definitely/not/here.toml");
    assert!(result.is_err());
}
