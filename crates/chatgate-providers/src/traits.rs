//! Provider client trait: the capability contract every backend implements.

use async_trait::async_trait;

use chatgate_core::{ChatConfiguration, ChatResponse, Message, ProviderKind, SamplingParameters};

use crate::error::ClientError;

/// Receives streamed text as `(text, is_last)`.
///
/// Called with `is_last = false` for each content delta, then exactly once
/// with `("", true)`.
pub type ChunkCallback<'a> = &'a mut (dyn FnMut(&str, bool) + Send);

/// Trait that all LLM provider clients must implement.
///
/// Clients hold no per-call state; any number of calls may run concurrently
/// on one instance.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// The provider this client serves.
    fn provider(&self) -> ProviderKind;

    /// Display name for logging.
    fn display_name(&self) -> &str;

    /// Send a chat completion request and wait for the full answer.
    ///
    /// # Arguments
    /// * `config`: Provider, base URL, model, and encrypted credential.
    /// * `messages`: Conversation context, forwarded in order.
    /// * `params`: Resolved temperature and max tokens.
    async fn chat(
        &self,
        config: &ChatConfiguration,
        messages: &[Message],
        params: &SamplingParameters,
    ) -> Result<ChatResponse, ClientError>;

    /// Send a streaming chat completion request, delivering text to
    /// `on_chunk` as it arrives.
    ///
    /// On `Ok(())` the callback has seen exactly one `is_last = true`
    /// invocation. On `Err` no terminal callback is sent; the error itself
    /// ends the stream.
    async fn chat_stream(
        &self,
        config: &ChatConfiguration,
        messages: &[Message],
        params: &SamplingParameters,
        on_chunk: ChunkCallback<'_>,
    ) -> Result<(), ClientError>;
}
