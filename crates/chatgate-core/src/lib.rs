//! Chatgate core: provider-neutral types, configuration, and credential
//! handling shared by the provider layer and the CLI.

pub mod config;
pub mod crypto;
pub mod types;
pub mod utils;

pub use crypto::{CredentialCipher, CryptoError};
pub use secrecy::{ExposeSecret, SecretString};
pub use types::{
    ChatConfiguration, ChatResponse, Message, ProviderKind, Role, SamplingParameters,
};
