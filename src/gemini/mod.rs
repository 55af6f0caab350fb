//! Gemini upstream integration
//!
//! Wire types for the generative language API plus the client that carries
//! requests to it.

pub mod client;
pub mod types;

pub use client::GeminiClient;
