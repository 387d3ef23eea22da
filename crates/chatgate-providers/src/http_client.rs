//! HTTP client for OpenAI-compatible chat completion endpoints.
//!
//! One `HttpChatClient` is registered per [`ProviderSpec`]; the spec supplies
//! the provider-specific endpoint path, headers, and limits while the
//! request/response handling is shared.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, info, warn};

use chatgate_core::utils::truncate_string;
use chatgate_core::{
    ChatConfiguration, ChatResponse, CredentialCipher, Message, ProviderKind, SamplingParameters,
};

use crate::decoder::{StreamDecoder, StreamEvent};
use crate::error::ClientError;
use crate::registry::ProviderSpec;
use crate::traits::{ChunkCallback, ProviderClient};
use crate::wire::{ChatCompletionRequest, ChatCompletionResponse};

/// Default total timeout for non-streaming calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Longest error body kept in a [`ClientError::Status`].
const ERROR_BODY_LIMIT: usize = 500;

// ─────────────────────────────────────────────
// HttpChatClient
// ─────────────────────────────────────────────

/// A provider client that talks to an OpenAI-compatible HTTP API.
pub struct HttpChatClient {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// Decrypts the configuration's credential for each call.
    cipher: Arc<dyn CredentialCipher>,
    /// Static provider spec.
    spec: &'static ProviderSpec,
    /// Total timeout for non-streaming calls. Streams are not time-boxed.
    request_timeout: Duration,
}

impl std::fmt::Debug for HttpChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpChatClient")
            .field("provider", &self.spec.display_name)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl HttpChatClient {
    /// Create a client for one provider spec.
    pub fn new(
        spec: &'static ProviderSpec,
        client: reqwest::Client,
        cipher: Arc<dyn CredentialCipher>,
    ) -> Self {
        HttpChatClient {
            client,
            cipher,
            spec,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Override the non-streaming request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Decrypt the configured credential.
    ///
    /// Returns `None` for providers that accept anonymous calls when no key
    /// is set.
    fn resolve_api_key(
        &self,
        config: &ChatConfiguration,
    ) -> Result<Option<SecretString>, ClientError> {
        let api_key = match config.encrypted_api_key.as_deref() {
            Some(ciphertext) if !ciphertext.is_empty() => Some(self.cipher.decrypt(ciphertext)?),
            _ => None,
        }
        .filter(|key| !key.expose_secret().is_empty());

        if api_key.is_none() && self.spec.requires_api_key {
            return Err(ClientError::Credential {
                message: format!("no API key configured for {}", self.spec.display_name),
                source: None,
            });
        }

        Ok(api_key)
    }

    /// Build the POST request for either call mode.
    fn build_request(
        &self,
        config: &ChatConfiguration,
        messages: &[Message],
        params: &SamplingParameters,
        stream: bool,
    ) -> Result<reqwest::RequestBuilder, ClientError> {
        if config.model_name.trim().is_empty() {
            return Err(ClientError::Configuration(format!(
                "no model name configured for {}",
                self.spec.display_name
            )));
        }

        let url = self.spec.completions_url(&config.api_url)?;
        let api_key = self.resolve_api_key(config)?;

        let temperature = self.spec.clamp_temperature(params.temperature);
        if temperature != params.temperature {
            warn!(
                provider = self.spec.display_name,
                requested = params.temperature,
                applied = temperature,
                "Temperature outside provider range, clamped"
            );
        }

        let body = ChatCompletionRequest {
            model: &config.model_name,
            messages,
            temperature,
            max_tokens: params.max_tokens,
            stream,
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &api_key {
            request = request.bearer_auth(key.expose_secret());
        }
        for (name, value) in self.spec.extra_headers {
            request = request.header(*name, *value);
        }
        request = if stream {
            request.header(ACCEPT, "text/event-stream")
        } else {
            request.timeout(self.request_timeout)
        };

        debug!(
            provider = self.spec.display_name,
            url = %url,
            stream,
            "Built chat completion request"
        );

        Ok(request)
    }

    /// Send a request and reject non-success statuses.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = request.send().await.map_err(|e| {
            error!(provider = self.spec.display_name, error = %e, "HTTP request failed");
            ClientError::transport(
                format!("failed to call {} API", self.spec.display_name),
                e,
            )
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(
                provider = self.spec.display_name,
                status = %status,
                body = %truncate_string(&body, ERROR_BODY_LIMIT),
                "API error"
            );
            return Err(ClientError::Status {
                provider: self.spec.display_name,
                status,
                body: truncate_string(&body, ERROR_BODY_LIMIT),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl ProviderClient for HttpChatClient {
    fn provider(&self) -> ProviderKind {
        self.spec.kind
    }

    fn display_name(&self) -> &str {
        self.spec.display_name
    }

    async fn chat(
        &self,
        config: &ChatConfiguration,
        messages: &[Message],
        params: &SamplingParameters,
    ) -> Result<ChatResponse, ClientError> {
        let started = Instant::now();
        info!(
            provider = self.spec.display_name,
            model = %config.model_name,
            messages = messages.len(),
            "Calling LLM"
        );

        let request = self.build_request(config, messages, params, false)?;
        let response = self.send(request).await?;

        let text = response.text().await.map_err(|e| {
            ClientError::transport(
                format!("failed to read {} response body", self.spec.display_name),
                e,
            )
        })?;
        if text.trim().is_empty() {
            return Err(ClientError::Protocol(format!(
                "{} API returned an empty body",
                self.spec.display_name
            )));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&text).map_err(|e| {
            ClientError::Protocol(format!(
                "invalid JSON from {} API: {e}",
                self.spec.display_name
            ))
        })?;

        let tokens_used = parsed.usage.and_then(|u| u.total_tokens);
        let model = parsed
            .model
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| config.model_name.clone());

        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            ClientError::Protocol(format!(
                "no choices in {} API response",
                self.spec.display_name
            ))
        })?;
        let message = choice.message.ok_or_else(|| {
            ClientError::Protocol(format!(
                "first choice in {} API response has no message",
                self.spec.display_name
            ))
        })?;

        info!(
            provider = self.spec.display_name,
            tokens = ?tokens_used,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "LLM response received"
        );

        Ok(ChatResponse {
            content: message.content.unwrap_or_default(),
            tokens_used,
            model,
        })
    }

    async fn chat_stream(
        &self,
        config: &ChatConfiguration,
        messages: &[Message],
        params: &SamplingParameters,
        on_chunk: ChunkCallback<'_>,
    ) -> Result<(), ClientError> {
        let started = Instant::now();
        info!(
            provider = self.spec.display_name,
            model = %config.model_name,
            messages = messages.len(),
            "Calling LLM (streaming)"
        );

        let request = self.build_request(config, messages, params, true)?;
        let response = self.send(request).await?;

        let mut body = response.bytes_stream();
        let mut decoder = StreamDecoder::new();
        let mut deltas = 0usize;

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| {
                error!(provider = self.spec.display_name, error = %e, "Stream read failed");
                ClientError::transport(
                    format!("{} stream interrupted", self.spec.display_name),
                    e,
                )
            })?;

            for event in decoder.feed(&chunk) {
                if matches!(event, StreamEvent::Delta(_)) {
                    deltas += 1;
                }
                deliver(event, on_chunk);
            }
        }

        if let Some(event) = decoder.finish() {
            debug!(
                provider = self.spec.display_name,
                "Stream closed without terminal event"
            );
            deliver(event, on_chunk);
        }

        info!(
            provider = self.spec.display_name,
            deltas,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "LLM stream completed"
        );

        Ok(())
    }
}

/// Hand one decoded event to the caller's callback.
fn deliver(event: StreamEvent, on_chunk: ChunkCallback<'_>) {
    match event {
        StreamEvent::Delta(text) => on_chunk(&text, false),
        StreamEvent::Done => on_chunk("", true),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
