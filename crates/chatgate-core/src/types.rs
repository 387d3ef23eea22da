//! Core types for Chatgate: the provider-neutral data model.
//!
//! These types are what callers hand to the gateway. Provider wire formats
//! live in `chatgate-providers`; nothing here knows about HTTP.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Provider identifier
// ─────────────────────────────────────────────

/// The LLM backend a [`ChatConfiguration`] targets.
///
/// Serialized with the upper-case identifiers used in stored configuration
/// (`"OPENAI"`, `"OPENROUTER"`, `"OLLAMA"`, `"OPENWEBUI"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    /// Any OpenAI-compatible `/v1/chat/completions` endpoint.
    #[serde(rename = "OPENAI", alias = "openai")]
    OpenAi,
    #[serde(rename = "OPENROUTER", alias = "openrouter")]
    OpenRouter,
    #[serde(rename = "OLLAMA", alias = "ollama")]
    Ollama,
    #[serde(rename = "OPENWEBUI", alias = "openwebui")]
    OpenWebUi,
}

impl ProviderKind {
    /// All known providers, in display order.
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::OpenAi,
        ProviderKind::OpenRouter,
        ProviderKind::Ollama,
        ProviderKind::OpenWebUi,
    ];

    /// Stored identifier (e.g. `"OPENROUTER"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI",
            ProviderKind::OpenRouter => "OPENROUTER",
            ProviderKind::Ollama => "OLLAMA",
            ProviderKind::OpenWebUi => "OPENWEBUI",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a provider identifier is not recognised.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown LLM provider '{0}' (expected one of: openai, openrouter, ollama, openwebui)")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    /// Case-insensitive; `-` and `_` are ignored so `"open-webui"` parses.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "openai" | "openaicompatible" => Ok(ProviderKind::OpenAi),
            "openrouter" => Ok(ProviderKind::OpenRouter),
            "ollama" => Ok(ProviderKind::Ollama),
            "openwebui" => Ok(ProviderKind::OpenWebUi),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}

// ─────────────────────────────────────────────
// Chat configuration
// ─────────────────────────────────────────────

/// Which provider to call, where, with which model and credential.
///
/// Owned by the caller and only ever borrowed by the gateway.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatConfiguration {
    pub provider: ProviderKind,
    /// API base URL. May be empty, in which case the provider default is used.
    #[serde(default)]
    pub api_url: String,
    pub model_name: String,
    /// Credential as produced by a [`crate::crypto::CredentialCipher`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_api_key: Option<String>,
}

impl ChatConfiguration {
    /// Create a configuration without a credential.
    pub fn new(
        provider: ProviderKind,
        api_url: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Self {
        ChatConfiguration {
            provider,
            api_url: api_url.into(),
            model_name: model_name.into(),
            encrypted_api_key: None,
        }
    }

    /// Attach an encrypted credential.
    pub fn with_encrypted_api_key(mut self, ciphertext: impl Into<String>) -> Self {
        self.encrypted_api_key = Some(ciphertext.into());
        self
    }
}

impl fmt::Debug for ChatConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfiguration")
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("model_name", &self.model_name)
            .field(
                "encrypted_api_key",
                &self.encrypted_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

// ─────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────

/// Author of a [`Message`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One entry of the conversation context. Order is significant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Message {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Message {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ─────────────────────────────────────────────
// Sampling parameters
// ─────────────────────────────────────────────

/// Default sampling temperature applied by the gateway.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Default completion token limit applied by the gateway.
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Resolved sampling parameters passed to a provider client.
///
/// Callers hand the gateway `Option`s; the gateway fills the gaps from its
/// defaults before anything reaches a provider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplingParameters {
    /// Sampling temperature. Clamped per provider.
    pub temperature: f64,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
}

impl Default for SamplingParameters {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl SamplingParameters {
    /// Fill missing values from `self`.
    pub fn resolve(&self, temperature: Option<f64>, max_tokens: Option<u32>) -> Self {
        Self {
            temperature: temperature.unwrap_or(self.temperature),
            max_tokens: max_tokens.unwrap_or(self.max_tokens),
        }
    }
}

// ─────────────────────────────────────────────
// Response
// ─────────────────────────────────────────────

/// Result of a non-streaming chat call.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatResponse {
    /// Generated text.
    pub content: String,
    /// Total tokens reported by the provider, if any.
    pub tokens_used: Option<u32>,
    /// Model that produced the answer.
    pub model: String,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
