//! Gateway facade: the single entry point for chat calls.
//!
//! Fills in sampling defaults, resolves the client through the
//! [`ClientFactory`], and delegates. Streaming callbacks are passed through
//! untouched.

use std::sync::Arc;

use tracing::{debug, info};

use chatgate_core::config::schema::GatewayConfig;
use chatgate_core::{ChatConfiguration, ChatResponse, CredentialCipher, Message, SamplingParameters};

use crate::error::ClientError;
use crate::factory::ClientFactory;

/// System prompt of the connection health check.
const HEALTH_CHECK_SYSTEM: &str = "LLM connection health check";
/// User prompt of the connection health check.
const HEALTH_CHECK_USER: &str = "Health check ping";
/// Token limit of the connection health check.
const HEALTH_CHECK_MAX_TOKENS: u32 = 16;

/// Entry point for chat calls. Cheap to clone and safe to share.
#[derive(Clone, Debug)]
pub struct GatewayFacade {
    factory: Arc<ClientFactory>,
    defaults: SamplingParameters,
}

impl GatewayFacade {
    /// Create a gateway with the built-in sampling defaults.
    pub fn new(factory: ClientFactory) -> Self {
        GatewayFacade {
            factory: Arc::new(factory),
            defaults: SamplingParameters::default(),
        }
    }

    /// Build a gateway with the default clients from configuration.
    pub fn from_config(
        cipher: Arc<dyn CredentialCipher>,
        gateway: &GatewayConfig,
    ) -> Result<Self, ClientError> {
        let factory = ClientFactory::with_default_clients(cipher, gateway)?;
        Ok(Self::new(factory).with_defaults((&gateway.defaults).into()))
    }

    /// Override the sampling defaults.
    pub fn with_defaults(mut self, defaults: SamplingParameters) -> Self {
        self.defaults = defaults;
        self
    }

    /// Send a chat request and wait for the complete answer.
    pub async fn chat(
        &self,
        config: &ChatConfiguration,
        messages: &[Message],
        temperature: Option<f64>,
        max_tokens: Option<u32>,
    ) -> Result<ChatResponse, ClientError> {
        let client = self.factory.get_client(config)?;
        let params = self.defaults.resolve(temperature, max_tokens);
        debug!(
            provider = %config.provider,
            temperature = params.temperature,
            max_tokens = params.max_tokens,
            "Dispatching chat"
        );
        client.chat(config, messages, &params).await
    }

    /// Send a chat request and stream the answer into `on_chunk`.
    ///
    /// `on_chunk(text, is_last)` sees every delta in arrival order followed
    /// by exactly one `("", true)`, unless an error is returned first.
    /// Dropping the returned future aborts the underlying request.
    pub async fn chat_stream<F>(
        &self,
        config: &ChatConfiguration,
        messages: &[Message],
        temperature: Option<f64>,
        max_tokens: Option<u32>,
        mut on_chunk: F,
    ) -> Result<(), ClientError>
    where
        F: FnMut(&str, bool) + Send,
    {
        let client = self.factory.get_client(config)?;
        let params = self.defaults.resolve(temperature, max_tokens);
        debug!(
            provider = %config.provider,
            temperature = params.temperature,
            max_tokens = params.max_tokens,
            "Dispatching streaming chat"
        );
        client
            .chat_stream(config, messages, &params, &mut on_chunk)
            .await
    }

    /// Check that a configuration can reach its provider.
    pub async fn test_connection(
        &self,
        config: &ChatConfiguration,
    ) -> Result<ChatResponse, ClientError> {
        info!(
            provider = %config.provider,
            model = %config.model_name,
            "Testing LLM connection"
        );
        let messages = [
            Message::system(HEALTH_CHECK_SYSTEM),
            Message::user(HEALTH_CHECK_USER),
        ];
        self.chat(config, &messages, Some(0.0), Some(HEALTH_CHECK_MAX_TOKENS))
            .await
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
