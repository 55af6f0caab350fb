//! Gemini wire types and the structured-mode request translator
//!
//! The structured route accepts a simplified body (`prompt` plus a few
//! recognized generation options) and reshapes it into the upstream
//! `generateContent` schema. Passthrough-mode bodies never come through
//! here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

/// One text fragment of a content turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

/// A single conversation turn in the upstream schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Single-part user turn
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
}

/// Payload sent to `models/{model}:generateContent`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// Recognized options on the structured route.
///
/// Everything else in the inbound body is ignored. Validation happens at
/// construction so an out-of-range value is rejected before any upstream
/// call is made.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    pub system_instruction: Option<String>,
    pub temperature: Option<f64>,
    pub thinking_budget: Option<i64>,
}

impl GenerationOptions {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(AppError::BadRequest(format!(
                    "temperature must be between 0.0 and 2.0, got {temperature}"
                )));
            }
        }
        if let Some(budget) = self.thinking_budget {
            if budget < 0 {
                return Err(AppError::BadRequest(format!(
                    "thinkingBudget must be non-negative, got {budget}"
                )));
            }
        }
        Ok(())
    }
}

impl GenerateContentRequest {
    /// Wrap a prompt into a single user turn, applying validated options.
    pub fn user_prompt(prompt: &str, options: GenerationOptions) -> Result<Self, AppError> {
        options.validate()?;

        let generation_config = if options.temperature.is_some() || options.thinking_budget.is_some()
        {
            Some(GenerationConfig {
                temperature: options.temperature,
                thinking_config: options
                    .thinking_budget
                    .map(|thinking_budget| ThinkingConfig { thinking_budget }),
            })
        } else {
            None
        };

        Ok(Self {
            contents: vec![Content::user_text(prompt)],
            system_instruction: options.system_instruction.map(Content::user_text),
            generation_config,
        })
    }
}

/// Translate a structured-mode body into the upstream payload.
///
/// The `prompt` key is matched case-insensitively; its value must be a
/// string with non-whitespace content, and is trimmed before wrapping.
pub fn build_payload(raw: &[u8]) -> Result<GenerateContentRequest, AppError> {
    let body: Value = serde_json::from_slice(raw).map_err(|_| AppError::InvalidJson)?;

    let prompt = {
        let map = body.as_object().ok_or(AppError::MissingPrompt)?;
        map.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("prompt"))
            .and_then(|(_, value)| value.as_str())
            .map(str::trim)
            .filter(|prompt| !prompt.is_empty())
            .ok_or(AppError::MissingPrompt)?
            .to_string()
    };

    let options: GenerationOptions = serde_json::from_value(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid generation options: {e}")))?;

    GenerateContentRequest::user_prompt(&prompt, options)
}

/// One SSE event from `streamGenerateContent`
#[derive(Debug, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub candidates: Vec<StreamCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct StreamCandidate {
    #[serde(default)]
    pub content: Option<Content>,
}

impl StreamChunk {
    /// Concatenated text of all parts in this event
    pub fn text(&self) -> String {
        self.candidates
            .iter()
            .filter_map(|candidate| candidate.content.as_ref())
            .flat_map(|content| content.parts.iter())
            .map(|part| part.text.as_str())
            .collect()
    }
}
