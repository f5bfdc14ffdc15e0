//! HTTP response sanitization and truncation tests.

use smarttask::providers::{check_http_response, ProviderError};

use crate::mock_server::serve_once;

async fn failing_response(body: &str) -> ProviderError {
    let server = serve_once("500 Internal Server Error", "text/plain", body).await;

    let response = match reqwest::get(format!("{}/", server.url)).await {
        Ok(response) => response,
        Err(err) => panic!("request should complete: {err}"),
    };

    match check_http_response(response).await {
        Ok(_) => panic!("response should fail on non-success status"),
        Err(err) => err,
    }
}

#[tokio::test]
async fn check_http_response_redacts_key_like_values() {
    let raw_key = "sk-abcdefghijklmnopqrstuvwxyz1234";
    let body = format!("Incorrect API key provided: {raw_key}");

    match failing_response(&body).await {
        ProviderError::HttpStatus { status, body } => {
            assert_eq!(status, 500);
            assert!(!body.contains(raw_key));
            assert!(body.contains("[REDACTED]"));
        }
        other => panic!("expected http status error, got: {other}"),
    }
}

#[tokio::test]
async fn check_http_response_truncates_long_error_body() {
    let body = "x".repeat(400);

    match failing_response(&body).await {
        ProviderError::HttpStatus { body, .. } => {
            assert!(body.ends_with("...[truncated]"));
            assert!(body.len() < 400);
        }
        other => panic!("expected http status error, got: {other}"),
    }
}

#[tokio::test]
async fn check_http_response_returns_success_body() {
    let server = serve_once("200 OK", "text/plain", "all good").await;

    let response = match reqwest::get(format!("{}/", server.url)).await {
        Ok(response) => response,
        Err(err) => panic!("request should complete: {err}"),
    };

    match check_http_response(response).await {
        Ok(body) => assert_eq!(body, "all good"),
        Err(err) => panic!("2xx response should pass: {err}"),
    }
}
