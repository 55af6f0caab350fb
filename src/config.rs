//! Configuration management for Courier
//!
//! Configuration is loaded from environment variables. The Gemini API key
//! is required and its absence is a startup failure, not a per-request error.

use std::env;
use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};

/// Default upstream for the generative language API
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
/// Model used by the structured route when MODEL_NAME is not set
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";
/// Outbound call deadline when TIMEOUT_MS is not set
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

/// Application configuration
#[derive(Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Gemini API key, attached to outbound calls only
    pub gemini_api_key: String,
    /// Base URL of the generative language API
    pub gemini_api_base: String,
    /// Model used by the structured route
    pub model_name: String,
    /// Deadline for the entire outbound call
    pub timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value source.
    ///
    /// `from_env` goes through here; tests supply a closure instead of
    /// mutating process-global environment variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let timeout_ms: u64 = match lookup("TIMEOUT_MS") {
            Some(raw) => raw.parse().context("Invalid TIMEOUT_MS")?,
            None => DEFAULT_TIMEOUT_MS,
        };

        Ok(Self {
            host: lookup("COURIER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("COURIER_PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .context("Invalid COURIER_PORT")?,

            gemini_api_key: lookup("GEMINI_API_KEY")
                .filter(|key| !key.is_empty())
                .context("GEMINI_API_KEY must be set")?,
            gemini_api_base: lookup("GEMINI_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            model_name: lookup("MODEL_NAME").unwrap_or_else(|| DEFAULT_MODEL.to_string()),

            timeout: Duration::from_millis(timeout_ms),
        })
    }
}

// Hand-written so the key can never reach logs through a debug format.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("gemini_api_key", &"<redacted>")
            .field("gemini_api_base", &self.gemini_api_base)
            .field("model_name", &self.model_name)
            .field("timeout", &self.timeout)
            .finish()
    }
}
