//! OpenAI provider wire format tests.

use std::time::Duration;

use serde_json::json;
use smarttask::providers::openai::{build_request, endpoint_url, parse_response, OpenAiProvider};
use smarttask::providers::{
    CompletionRequest, LlmProvider, Message, ProviderError, ResponseFormat, StopReason,
};

use crate::mock_server::{completion_body, request_body, serve_json_once};

fn simple_request() -> CompletionRequest {
    CompletionRequest {
        messages: vec![Message::user("Call client tomorrow")],
        system: Some("You are a task parsing assistant.".to_owned()),
        max_tokens: Some(150),
        temperature: Some(0.1),
        response_format: ResponseFormat::JsonObject,
    }
}

fn provider(base_url: &str) -> OpenAiProvider {
    match OpenAiProvider::new(
        "gpt-3.5-turbo".to_owned(),
        "sk-test-key".to_owned(),
        base_url,
        Duration::from_secs(5),
    ) {
        Ok(provider) => provider,
        Err(err) => panic!("provider should build: {err}"),
    }
}

#[test]
fn build_request_puts_system_prompt_first() {
    let req = build_request("gpt-3.5-turbo", &simple_request());
    assert_eq!(req.model, "gpt-3.5-turbo");
    assert_eq!(req.max_tokens, Some(150));
    assert_eq!(req.temperature, Some(0.1));
    assert_eq!(req.messages.len(), 2);
    assert_eq!(req.messages[0].role, "system");
    assert_eq!(req.messages[0].content, "You are a task parsing assistant.");
    assert_eq!(req.messages[1].role, "user");
    assert_eq!(req.messages[1].content, "Call client tomorrow");
}

#[test]
fn build_request_serializes_json_object_format() {
    let req = build_request("gpt-3.5-turbo", &simple_request());
    let value = serde_json::to_value(&req).expect("should serialize");
    assert_eq!(value["response_format"], json!({"type": "json_object"}));
}

#[test]
fn build_request_omits_optional_fields() {
    let request = CompletionRequest {
        messages: vec![Message::user("hi")],
        ..CompletionRequest::default()
    };
    let req = build_request("gpt-4o-mini", &request);
    assert_eq!(req.messages.len(), 1);
    assert_eq!(req.max_tokens, Some(200));

    let value = serde_json::to_value(&req).expect("should serialize");
    assert!(value.get("temperature").is_none());
    assert!(value.get("response_format").is_none());
}

#[test]
fn parse_response_text_only() {
    let body = json!({
        "choices": [{
            "message": {"role": "assistant", "content": "{\"title\":\"Call client\"}"},
            "finish_reason": "stop"
        }],
        "model": "gpt-3.5-turbo-0125",
        "usage": {"prompt_tokens": 10, "completion_tokens": 5}
    });

    let resp = parse_response(&body.to_string()).expect("should parse");
    assert_eq!(resp.stop_reason, StopReason::EndTurn);
    assert_eq!(resp.model, "gpt-3.5-turbo-0125");
    assert_eq!(resp.usage.input_tokens, 10);
    assert_eq!(resp.usage.output_tokens, 5);
    assert_eq!(resp.text.as_deref(), Some("{\"title\":\"Call client\"}"));
}

#[test]
fn parse_response_null_content_is_none() {
    let body = json!({
        "choices": [{
            "message": {"role": "assistant", "content": null},
            "finish_reason": "length"
        }],
        "model": "gpt-3.5-turbo"
    });

    let resp = parse_response(&body.to_string()).expect("should parse");
    assert!(resp.text.is_none());
    assert_eq!(resp.stop_reason, StopReason::MaxTokens);
    assert_eq!(resp.usage.input_tokens, 0);
}

#[test]
fn parse_response_content_filter_maps_to_variant() {
    let body = json!({
        "choices": [{
            "message": {"role": "assistant", "content": "I can't help with that."},
            "finish_reason": "content_filter"
        }],
        "model": "gpt-3.5-turbo"
    });

    let resp = parse_response(&body.to_string()).expect("should parse");
    assert_eq!(resp.stop_reason, StopReason::ContentFilter);
}

#[test]
fn parse_response_without_choices_is_error() {
    let body = json!({"choices": [], "model": "gpt-3.5-turbo"});
    assert!(matches!(
        parse_response(&body.to_string()),
        Err(ProviderError::Parse(_))
    ));
}

#[test]
fn parse_response_rejects_non_json() {
    assert!(parse_response("not json at all").is_err());
}

#[test]
fn endpoint_url_accepts_common_base_forms() {
    let expected = "https://api.openai.com/v1/chat/completions";
    assert_eq!(endpoint_url("https://api.openai.com"), expected);
    assert_eq!(endpoint_url("https://api.openai.com/"), expected);
    assert_eq!(endpoint_url("https://api.openai.com/v1"), expected);
    assert_eq!(endpoint_url("https://api.openai.com/v1/"), expected);
}

#[test]
fn empty_api_key_is_unavailable() {
    let result = OpenAiProvider::new(
        "gpt-3.5-turbo".to_owned(),
        "  ".to_owned(),
        "https://api.openai.com",
        Duration::from_secs(5),
    );
    assert!(matches!(result, Err(ProviderError::Unavailable(_))));
}

#[test]
fn debug_output_redacts_api_key() {
    let provider = provider("https://api.openai.com");
    let rendered = format!("{provider:?}");
    assert!(!rendered.contains("sk-test-key"));
    assert!(rendered.contains("__REDACTED__"));
    assert_eq!(provider.model_id(), "gpt-3.5-turbo");
}

#[tokio::test]
async fn complete_posts_bearer_authenticated_request() {
    let server = serve_json_once("200 OK", &completion_body("{\"title\":\"Call client\"}")).await;
    let provider = provider(&server.url);

    let response = match provider.complete(simple_request()).await {
        Ok(response) => response,
        Err(err) => panic!("completion should succeed: {err}"),
    };
    assert_eq!(response.text.as_deref(), Some("{\"title\":\"Call client\"}"));
    assert_eq!(response.usage.input_tokens, 412);

    let request = server.captured_request().await;
    assert!(request.starts_with("POST /v1/chat/completions "));
    assert!(request
        .to_ascii_lowercase()
        .contains("authorization: bearer sk-test-key"));

    let body = request_body(&request);
    assert_eq!(body["model"], "gpt-3.5-turbo");
    assert_eq!(body["response_format"]["type"], "json_object");
    assert_eq!(body["messages"][1]["content"], "Call client tomorrow");
}

#[tokio::test]
async fn complete_maps_error_status() {
    let server = serve_json_once(
        "401 Unauthorized",
        r#"{"error":{"message":"Incorrect API key provided: sk-abcdefghijklmnopqrstuvwxyz"}}"#,
    )
    .await;
    let provider = provider(&server.url);

    match provider.complete(simple_request()).await {
        Err(ProviderError::HttpStatus { status, body }) => {
            assert_eq!(status, 401);
            assert!(body.contains("[REDACTED]"));
        }
        Err(other) => panic!("expected http status error, got: {other}"),
        Ok(_) => panic!("401 should not succeed"),
    }
}
