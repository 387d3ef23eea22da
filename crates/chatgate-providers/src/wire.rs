//! Wire types for the OpenAI-compatible chat completions protocol.
//!
//! All supported providers speak this shape. Unknown fields are ignored on
//! the way in, so provider-specific extras never break decoding.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use chatgate_core::Message;

// ─────────────────────────────────────────────
// Request
// ─────────────────────────────────────────────

/// Request body for `POST .../chat/completions`.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub temperature: f64,
    pub max_tokens: u32,
    pub stream: bool,
}

// ─────────────────────────────────────────────
// Non-streaming response
// ─────────────────────────────────────────────

/// Response body of a non-streaming call.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default, deserialize_with = "lenient")]
    pub usage: Option<Usage>,
}

/// A single choice in a non-streaming response.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<AssistantMessage>,
}

/// The assistant message within a choice.
#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Token usage. Only the total is consumed.
#[derive(Debug, Deserialize)]
pub struct Usage {
    #[serde(default, deserialize_with = "token_count")]
    pub total_tokens: Option<u32>,
}

/// Usage is informational: a malformed value decodes as `None` instead of
/// failing the whole response.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Accepts integers and whole floats (`13.0`) in `u32` range.
fn token_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| {
        if let Some(n) = v.as_u64() {
            return u32::try_from(n).ok();
        }
        v.as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= f64::from(u32::MAX))
            .map(|f| f as u32)
    }))
}

// ─────────────────────────────────────────────
// Streaming chunk
// ─────────────────────────────────────────────

/// Payload of one `data:` line in a streaming response.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

/// A choice within a streaming chunk.
#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Option<ChunkDelta>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Incremental content of a streaming choice.
#[derive(Debug, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    /// Non-empty content delta of the first choice.
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.as_ref())
            .and_then(|d| d.content.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// Finish reason of the first choice, if the provider sent one.
    pub fn finish_reason(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.finish_reason.as_deref())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
