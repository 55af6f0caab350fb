//! Courier - credential-injecting proxy for the Gemini generative language API
//!
//! This library provides the core functionality for the Courier proxy server.
//! Browser clients post a prompt (or a raw Gemini request body), the proxy
//! attaches the server-held API key, makes one outbound call, and relays the
//! response back, buffered or as incrementally flushed text fragments.

pub mod config;
pub mod error;
pub mod gemini;
pub mod routes;
pub mod streaming;

use std::time::Instant;

use anyhow::Result;

pub use crate::config::Config;
pub use crate::error::{AppError, AppResult};
pub use crate::gemini::GeminiClient;

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    pub http_client: reqwest::Client,
    /// Upstream client holding a clone of the pooled HTTP client
    pub gemini: GeminiClient,
    pub start_time: Instant,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Result<Self> {
        // Initialize HTTP client with connection pooling
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(100)
            .build()?;

        let gemini = GeminiClient::new(http_client.clone(), &config);

        Ok(Self {
            config,
            http_client,
            gemini,
            start_time: Instant::now(),
        })
    }
}
