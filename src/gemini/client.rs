//! Gemini upstream caller
//!
//! Issues one outbound POST per inbound request. The API key lives only in
//! this client and is attached to the outbound URL query at send time; it is
//! never copied into request state, logs, or error messages.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::debug;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    gemini::types::GenerateContentRequest,
};

/// Client for the generative language API
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl GeminiClient {
    /// Create a new Gemini client sharing the pooled HTTP client
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.gemini_api_base.clone(),
            api_key: config.gemini_api_key.clone(),
            model: config.model_name.clone(),
            timeout: config.timeout,
        }
    }

    /// Call `generateContent` with the configured model (non-streaming)
    pub async fn generate(&self, payload: &GenerateContentRequest) -> AppResult<reqwest::Response> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        self.post_json(&url, &[("key", self.api_key.as_str())], payload)
            .await
    }

    /// Call `streamGenerateContent` with the configured model (SSE response)
    pub async fn generate_stream(
        &self,
        payload: &GenerateContentRequest,
    ) -> AppResult<reqwest::Response> {
        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent",
            self.base_url, self.model
        );
        self.post_json(
            &url,
            &[("alt", "sse"), ("key", self.api_key.as_str())],
            payload,
        )
        .await
    }

    /// Forward a raw body to `/v1/models/{model}:{operation}` verbatim.
    ///
    /// Model and operation come from the route, not from configuration.
    pub async fn forward_raw(
        &self,
        model: &str,
        operation: &str,
        body: Bytes,
    ) -> AppResult<reqwest::Response> {
        let url = format!("{}/v1/models/{}:{}", self.base_url, model, operation);
        debug!(url = %url, body_len = body.len(), "Sending raw request upstream");

        self.client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.timeout)
            .body(body)
            .send()
            .await
            .map_err(transport_error)
    }

    /// Make a POST request with a JSON payload and the key attached as a
    /// query parameter
    async fn post_json<T: Serialize>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        payload: &T,
    ) -> AppResult<reqwest::Response> {
        debug!(url = %url, "Sending request upstream");

        self.client
            .post(url)
            .query(query)
            .json(payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(transport_error)
    }
}

/// Stringify a transport failure without its URL.
///
/// The outbound URL carries the key in its query, so the URL must never
/// reach logs or error envelopes.
fn transport_error(err: reqwest::Error) -> AppError {
    AppError::Upstream(err.without_url().to_string())
}
