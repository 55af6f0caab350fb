//! Common test utilities for Courier
//!
//! Provides the shared test harness: an in-process Courier server built
//! from the real router, wired to a wiremock upstream standing in for the
//! generative language API.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum_test::TestServer;
use wiremock::MockServer;

use courier::{routes, AppState, Config};

/// API key injected by the test harness; assertions check it never leaks
pub const TEST_API_KEY: &str = "test-gemini-key";
/// Model the structured routes are configured with
pub const TEST_MODEL: &str = "gemini-test";

/// In-process Courier instance wired to a mock upstream
pub struct TestApp {
    pub server: TestServer,
    pub upstream: MockServer,
}

impl TestApp {
    /// Spawn with default test configuration
    pub async fn spawn() -> Self {
        Self::spawn_with(&[]).await
    }

    /// Spawn with environment overrides applied on top of the defaults
    pub async fn spawn_with(overrides: &[(&str, &str)]) -> Self {
        let upstream = MockServer::start().await;

        let mut vars: HashMap<String, String> = HashMap::from([
            ("GEMINI_API_KEY".to_string(), TEST_API_KEY.to_string()),
            ("GEMINI_API_BASE".to_string(), upstream.uri()),
            ("MODEL_NAME".to_string(), TEST_MODEL.to_string()),
            ("TIMEOUT_MS".to_string(), "2000".to_string()),
        ]);
        for (key, value) in overrides {
            vars.insert((*key).to_string(), (*value).to_string());
        }

        let config =
            Config::from_lookup(|key| vars.get(key).cloned()).expect("Failed to build test config");
        let state = Arc::new(AppState::new(config).expect("Failed to build app state"));
        let server =
            TestServer::new(routes::create_router(state)).expect("Failed to create test server");

        Self { server, upstream }
    }

    /// Requests the mock upstream has received so far
    pub async fn upstream_requests(&self) -> Vec<wiremock::Request> {
        self.upstream.received_requests().await.unwrap_or_default()
    }
}

/// Mock upstream responses in the Gemini wire format
pub mod gemini_mocks {
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{TEST_API_KEY, TEST_MODEL};

    /// A plausible `generateContent` success body
    pub fn candidates_body(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }]
        })
    }

    /// One SSE event in the `streamGenerateContent` format
    pub fn sse_event(text: &str) -> String {
        format!(
            "data: {}\n\n",
            json!({"candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]})
        )
    }

    /// Mount a `generateContent` mock answering with the given template
    pub async fn mock_generate(server: &MockServer, template: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path(format!("/v1beta/models/{TEST_MODEL}:generateContent")))
            .and(query_param("key", TEST_API_KEY))
            .respond_with(template)
            .mount(server)
            .await;
    }

    /// Mount a `streamGenerateContent` mock serving one SSE event per text
    pub async fn mock_stream(server: &MockServer, texts: &[&str]) {
        let body: String = texts.iter().map(|text| sse_event(text)).collect();
        mock_stream_template(
            server,
            ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"),
        )
        .await;
    }

    /// Mount a `streamGenerateContent` mock answering with the given template
    pub async fn mock_stream_template(server: &MockServer, template: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path(format!(
                "/v1beta/models/{TEST_MODEL}:streamGenerateContent"
            )))
            .and(query_param("alt", "sse"))
            .and(query_param("key", TEST_API_KEY))
            .respond_with(template)
            .mount(server)
            .await;
    }
}
