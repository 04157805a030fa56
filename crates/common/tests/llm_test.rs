use askroute_common::config::LlmConfig;
use askroute_common::AssistantError;
use askroute_common::llm::{ChatModel, CompletionRequest, OpenAiCompatibleClient};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(choices: serde_json::Value) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "test-model",
        "choices": choices
    })
}

fn config_for(server: &MockServer) -> LlmConfig {
    LlmConfig {
        endpoint: server.uri(),
        model: "test-model".to_string(),
        api_key: Some("secret".to_string()),
        temperature: 0.0,
        timeout_secs: 5,
    }
}

#[tokio::test]
async fn test_completion_returns_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer secret"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "response_format": {"type": "json_object"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(json!([{
            "index": 0,
            "message": {"role": "assistant", "content": "{\"answer\": \"hi\"}"},
            "finish_reason": "stop"
        }]))))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiCompatibleClient::new(&config_for(&server)).unwrap();
    let reply = client
        .complete(CompletionRequest::new("system", "user").with_json_output())
        .await
        .unwrap();

    assert_eq!(reply, "{\"answer\": \"hi\"}");
}

#[tokio::test]
async fn test_completion_error_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "message": "Incorrect API key provided",
                "type": "invalid_request_error",
                "param": null,
                "code": "invalid_api_key"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiCompatibleClient::new(&config_for(&server)).unwrap();
    let err = client
        .complete(CompletionRequest::new("system", "user"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Incorrect API key provided"));
    assert!(err.downcast_ref::<AssistantError>().is_some());
}

#[tokio::test]
async fn test_completion_without_choices_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(json!([]))))
        .mount(&server)
        .await;

    let client = OpenAiCompatibleClient::new(&config_for(&server)).unwrap();
    assert!(client
        .complete(CompletionRequest::new("system", "user"))
        .await
        .is_err());
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"messages": [
            {"role": "system", "content": "system"},
            {"role": "user", "content": "user"}
        ]})))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiCompatibleClient::new(&config_for(&server)).unwrap();
    assert!(client
        .complete(CompletionRequest::new("system", "user"))
        .await
        .is_err());
}
