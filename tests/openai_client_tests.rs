use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use warfare_counselor::config::AppConfig;
use warfare_counselor::error::CounselorError;
use warfare_counselor::llm::{ChatMessage, CompletionProvider, CompletionRequest, OpenAiClient};

fn client_for(server: &MockServer) -> OpenAiClient {
    let mut config = AppConfig::default().openai;
    config.api_key = "sk-wiremock".to_string();
    config.base_url = server.uri();
    config.model = "gpt-test".to_string();
    OpenAiClient::new(&config).unwrap()
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn test_completion_returns_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-wiremock"))
        .and(body_partial_json(json!({
            "model": "gpt-test",
            "messages": [
                { "role": "system", "content": "be brief" },
                { "role": "user", "content": "hello" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Report in.")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server)
        .complete(CompletionRequest::new(vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("hello"),
        ]))
        .await
        .unwrap();

    assert_eq!(reply, "Report in.");
}

#[tokio::test]
async fn test_json_mode_sets_response_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "response_format": { "type": "json_object" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("{}")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server)
        .complete(CompletionRequest::new(vec![ChatMessage::user("analyze")]).json())
        .await
        .unwrap();
    assert_eq!(reply, "{}");
}

#[tokio::test]
async fn test_upstream_error_message_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "message": "context length exceeded", "type": "invalid_request_error" }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .complete(CompletionRequest::new(vec![ChatMessage::user("hello")]))
        .await
        .unwrap_err();

    match err {
        CounselorError::LlmError(message) => assert!(message.contains("context length exceeded")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_rejected_key_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("nope"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .complete(CompletionRequest::new(vec![ChatMessage::user("hello")]))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("API key"));
}
