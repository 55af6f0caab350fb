//! Structured route integration tests
//!
//! Covers `/gemini/proxy`: prompt validation, payload reshaping, key
//! injection, verbatim relay of upstream statuses, and the transport
//! failure envelope.

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::ResponseTemplate;

use crate::common::{gemini_mocks, TestApp, TEST_API_KEY};

#[tokio::test]
async fn test_valid_prompt_relays_upstream_body_and_status() {
    let app = TestApp::spawn().await;
    let upstream_body = gemini_mocks::candidates_body("A binary search halves the interval.");
    gemini_mocks::mock_generate(
        &app.upstream,
        ResponseTemplate::new(200).set_body_json(&upstream_body),
    )
    .await;

    let response = app
        .server
        .post("/gemini/proxy")
        .json(&json!({"prompt": "explain binary search"}))
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "application/json");
    assert_eq!(response.json::<Value>(), upstream_body);
}

#[tokio::test]
async fn test_upstream_receives_trimmed_prompt_and_key() {
    let app = TestApp::spawn().await;
    gemini_mocks::mock_generate(
        &app.upstream,
        ResponseTemplate::new(200).set_body_json(gemini_mocks::candidates_body("ok")),
    )
    .await;

    app.server
        .post("/gemini/proxy")
        .json(&json!({"prompt": "  explain binary search  "}))
        .await
        .assert_status_ok();

    let requests = app.upstream_requests().await;
    assert_eq!(requests.len(), 1);

    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent["contents"][0]["role"], "user");
    assert_eq!(sent["contents"][0]["parts"][0]["text"], "explain binary search");

    let has_key = requests[0]
        .url
        .query_pairs()
        .any(|(name, value)| name == "key" && value == TEST_API_KEY);
    assert!(has_key, "key query parameter missing from upstream URL");
}

#[tokio::test]
async fn test_missing_prompt_returns_400_without_upstream_call() {
    let app = TestApp::spawn().await;

    let response = app.server.post("/gemini/proxy").json(&json!({})).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        json!({"error": "Missing 'prompt' in request body"})
    );
    assert!(app.upstream_requests().await.is_empty());
}

#[tokio::test]
async fn test_blank_prompt_returns_400_without_upstream_call() {
    let app = TestApp::spawn().await;

    for body in [json!({"prompt": ""}), json!({"prompt": "   \n\t "})] {
        let response = app.server.post("/gemini/proxy").json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>(),
            json!({"error": "Missing 'prompt' in request body"})
        );
    }
    assert!(app.upstream_requests().await.is_empty());
}

#[tokio::test]
async fn test_malformed_json_returns_400() {
    let app = TestApp::spawn().await;

    let response = app.server.post("/gemini/proxy").text("{not json").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        json!({"error": "Invalid JSON in request body"})
    );
    assert!(app.upstream_requests().await.is_empty());
}

#[tokio::test]
async fn test_generation_options_forwarded_upstream() {
    let app = TestApp::spawn().await;
    gemini_mocks::mock_generate(
        &app.upstream,
        ResponseTemplate::new(200).set_body_json(gemini_mocks::candidates_body("ok")),
    )
    .await;

    app.server
        .post("/gemini/proxy")
        .json(&json!({
            "prompt": "hi",
            "systemInstruction": "You are terse.",
            "temperature": 0.7,
            "thinkingBudget": 1024
        }))
        .await
        .assert_status_ok();

    let requests = app.upstream_requests().await;
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        sent["systemInstruction"]["parts"][0]["text"],
        "You are terse."
    );
    assert_eq!(sent["generationConfig"]["temperature"], 0.7);
    assert_eq!(
        sent["generationConfig"]["thinkingConfig"]["thinkingBudget"],
        1024
    );
}

#[tokio::test]
async fn test_out_of_range_temperature_returns_400_without_upstream_call() {
    let app = TestApp::spawn().await;

    let response = app
        .server
        .post("/gemini/proxy")
        .json(&json!({"prompt": "hi", "temperature": 2.5}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("temperature"));
    assert!(app.upstream_requests().await.is_empty());
}

#[tokio::test]
async fn test_upstream_error_status_relayed_verbatim() {
    let app = TestApp::spawn().await;
    let upstream_body = json!({
        "error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}
    });
    gemini_mocks::mock_generate(
        &app.upstream,
        ResponseTemplate::new(429).set_body_json(&upstream_body),
    )
    .await;

    let response = app
        .server
        .post("/gemini/proxy")
        .json(&json!({"prompt": "hi"}))
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.json::<Value>(), upstream_body);
}

#[tokio::test]
async fn test_upstream_timeout_maps_to_500_after_deadline() {
    let app = TestApp::spawn_with(&[("TIMEOUT_MS", "250")]).await;
    gemini_mocks::mock_generate(
        &app.upstream,
        ResponseTemplate::new(200)
            .set_body_json(gemini_mocks::candidates_body("late"))
            .set_delay(Duration::from_secs(5)),
    )
    .await;

    let started = Instant::now();
    let response = app
        .server
        .post("/gemini/proxy")
        .json(&json!({"prompt": "hi"}))
        .await;
    let elapsed = started.elapsed();

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "Proxy failed");
    assert!(body["details"].as_str().is_some());

    assert!(elapsed >= Duration::from_millis(250), "failed before the deadline");
    assert!(elapsed < Duration::from_secs(3), "failed far after the deadline");
}

#[tokio::test]
async fn test_unreachable_upstream_returns_500_without_key_leak() {
    let app = TestApp::spawn_with(&[("GEMINI_API_BASE", "http://127.0.0.1:9")]).await;

    let response = app
        .server
        .post("/gemini/proxy")
        .json(&json!({"prompt": "hi"}))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let text = response.text();
    assert!(text.contains("Proxy failed"));
    assert!(
        !text.contains(TEST_API_KEY),
        "API key leaked into the error envelope"
    );
}
