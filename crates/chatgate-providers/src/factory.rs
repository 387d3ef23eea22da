//! Client factory: maps a configuration's provider to its client.
//!
//! The mapping is built once at construction and never mutated, so a
//! factory can be shared across tasks without locking.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use chatgate_core::config::schema::GatewayConfig;
use chatgate_core::{ChatConfiguration, CredentialCipher, ProviderKind};

use crate::error::ClientError;
use crate::http_client::HttpChatClient;
use crate::registry::PROVIDERS;
use crate::traits::ProviderClient;

/// Resolves a [`ChatConfiguration`] to the client for its provider.
#[derive(Clone)]
pub struct ClientFactory {
    clients: HashMap<ProviderKind, Arc<dyn ProviderClient>>,
}

impl std::fmt::Debug for ClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientFactory")
            .field("providers", &self.providers())
            .finish()
    }
}

impl ClientFactory {
    /// Build a factory from an explicit client list.
    ///
    /// When two clients claim the same provider the later one wins.
    pub fn new(clients: Vec<Arc<dyn ProviderClient>>) -> Self {
        let mut map: HashMap<ProviderKind, Arc<dyn ProviderClient>> = HashMap::new();
        for client in clients {
            let kind = client.provider();
            if map.insert(kind, client).is_some() {
                warn!(provider = %kind, "Duplicate client registration, replacing earlier one");
            }
        }
        debug!(count = map.len(), "Client factory initialized");
        ClientFactory { clients: map }
    }

    /// Build a factory with one HTTP client per supported provider.
    ///
    /// All clients share one connection pool.
    pub fn with_default_clients(
        cipher: Arc<dyn CredentialCipher>,
        gateway: &GatewayConfig,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(gateway.connect_timeout_secs))
            .build()
            .map_err(|e| ClientError::transport("failed to build HTTP client", e))?;
        let request_timeout = Duration::from_secs(gateway.request_timeout_secs);

        let clients = PROVIDERS
            .iter()
            .map(|spec| {
                Arc::new(
                    HttpChatClient::new(spec, http.clone(), Arc::clone(&cipher))
                        .with_request_timeout(request_timeout),
                ) as Arc<dyn ProviderClient>
            })
            .collect();

        Ok(Self::new(clients))
    }

    /// Return the client serving `config.provider`.
    pub fn get_client(
        &self,
        config: &ChatConfiguration,
    ) -> Result<Arc<dyn ProviderClient>, ClientError> {
        self.clients
            .get(&config.provider)
            .cloned()
            .ok_or(ClientError::UnsupportedProvider(config.provider))
    }

    /// Providers with a registered client, in display order.
    pub fn providers(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.clients.contains_key(kind))
            .collect()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use chatgate_core::crypto::PassthroughCipher;
    use chatgate_core::{ChatResponse, Message, SamplingParameters};

    /// Client that answers with a fixed tag so dispatch can be observed.
    struct TaggedClient {
        kind: ProviderKind,
        tag: &'static str,
    }

    #[async_trait]
    impl ProviderClient for TaggedClient {
        fn provider(&self) -> ProviderKind {
            self.kind
        }

        fn display_name(&self) -> &str {
            self.tag
        }

        async fn chat(
            &self,
            config: &ChatConfiguration,
            _messages: &[Message],
            _params: &SamplingParameters,
        ) -> Result<ChatResponse, ClientError> {
            Ok(ChatResponse {
                content: self.tag.to_string(),
                tokens_used: None,
                model: config.model_name.clone(),
            })
        }

        async fn chat_stream(
            &self,
            _config: &ChatConfiguration,
            _messages: &[Message],
            _params: &SamplingParameters,
            on_chunk: crate::traits::ChunkCallback<'_>,
        ) -> Result<(), ClientError> {
            on_chunk("", true);
            Ok(())
        }
    }

    fn tagged(kind: ProviderKind, tag: &'static str) -> Arc<dyn ProviderClient> {
        Arc::new(TaggedClient { kind, tag })
    }

    #[tokio::test]
    async fn test_dispatch_by_provider() {
        let factory = ClientFactory::new(vec![
            tagged(ProviderKind::Ollama, "ollama"),
            tagged(ProviderKind::OpenRouter, "openrouter"),
        ]);
        let config = ChatConfiguration::new(ProviderKind::OpenRouter, "", "m");

        let client = factory.get_client(&config).unwrap();
        assert_eq!(client.display_name(), "openrouter");

        let resp = client
            .chat(&config, &[], &SamplingParameters::default())
            .await
            .unwrap();
        assert_eq!(resp.content, "openrouter");
    }

    #[test]
    fn test_unregistered_provider() {
        let factory = ClientFactory::new(vec![tagged(ProviderKind::Ollama, "ollama")]);
        let config = ChatConfiguration::new(ProviderKind::OpenWebUi, "http://x", "m");

        let Err(err) = factory.get_client(&config) else {
            panic!("expected UnsupportedProvider for an unregistered kind");
        };
        assert!(matches!(
            err,
            ClientError::UnsupportedProvider(ProviderKind::OpenWebUi)
        ));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_later_registration_wins() {
        let factory = ClientFactory::new(vec![
            tagged(ProviderKind::Ollama, "first"),
            tagged(ProviderKind::Ollama, "second"),
        ]);
        let config = ChatConfiguration::new(ProviderKind::Ollama, "", "m");

        assert_eq!(factory.get_client(&config).unwrap().display_name(), "second");
        assert_eq!(factory.providers(), vec![ProviderKind::Ollama]);
    }

    #[test]
    fn test_default_clients_cover_all_providers() {
        let factory = ClientFactory::with_default_clients(
            Arc::new(PassthroughCipher),
            &GatewayConfig::default(),
        )
        .unwrap();

        assert_eq!(factory.providers(), ProviderKind::ALL.to_vec());
        for kind in ProviderKind::ALL {
            let config = ChatConfiguration::new(kind, "", "m");
            assert_eq!(factory.get_client(&config).unwrap().provider(), kind);
        }
    }

    #[test]
    fn test_factory_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClientFactory>();
    }
}
