//! LLM provider layer for Chatgate.
//!
//! # Architecture
//!
//! - [`decoder::StreamDecoder`]: turns arbitrarily-chunked `data:` lines into events
//! - [`traits::ProviderClient`]: trait that every provider backend implements
//! - [`registry`]: static specs for the supported providers
//! - [`http_client::HttpChatClient`]: OpenAI-compatible HTTP client, one per spec
//! - [`factory::ClientFactory`]: provider → client dispatch
//! - [`gateway::GatewayFacade`]: the entry point callers use

pub mod decoder;
pub mod error;
pub mod factory;
pub mod gateway;
pub mod http_client;
pub mod registry;
pub mod traits;
pub mod wire;

// Re-export main types for convenience
pub use decoder::{StreamDecoder, StreamEvent};
pub use error::{ClientError, ErrorKind};
pub use factory::ClientFactory;
pub use gateway::GatewayFacade;
pub use http_client::HttpChatClient;
pub use registry::{ProviderSpec, PROVIDERS};
pub use traits::{ChunkCallback, ProviderClient};
