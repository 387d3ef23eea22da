//! Client-facing error type for every gateway call.

use chatgate_core::{CryptoError, ProviderKind};

/// Coarse classification of a [`ClientError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unsupported provider or unusable configuration; raised before any I/O.
    Configuration,
    /// The stored credential could not be decrypted.
    Credential,
    /// Connection, timeout, or HTTP-level failure.
    Transport,
    /// A response arrived but lacked the expected fields.
    Protocol,
}

/// Error returned by provider clients and the gateway.
///
/// Nothing is retried internally; retry policy belongs to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("no client registered for provider {0}")]
    UnsupportedProvider(ProviderKind),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("credential error: {message}")]
    Credential {
        message: String,
        #[source]
        source: Option<CryptoError>,
    },

    #[error("{message}: {source}")]
    Transport {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} API returned {status}: {body}")]
    Status {
        provider: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("protocol error: {0}")]
    Protocol(String),
}

impl ClientError {
    /// Wrap a transport failure, keeping the original cause.
    pub fn transport(message: impl Into<String>, source: reqwest::Error) -> Self {
        ClientError::Transport {
            message: message.into(),
            source,
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::UnsupportedProvider(_) | ClientError::Configuration(_) => {
                ErrorKind::Configuration
            }
            ClientError::Credential { .. } => ErrorKind::Credential,
            ClientError::Transport { .. } | ClientError::Status { .. } => ErrorKind::Transport,
            ClientError::Protocol(_) => ErrorKind::Protocol,
        }
    }
}

impl From<CryptoError> for ClientError {
    fn from(e: CryptoError) -> Self {
        ClientError::Credential {
            message: "failed to decrypt API key".to_string(),
            source: Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_kinds() {
        assert_eq!(
            ClientError::UnsupportedProvider(ProviderKind::Ollama).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            ClientError::Configuration("x".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(ClientError::Protocol("x".into()).kind(), ErrorKind::Protocol);
        assert_eq!(
            ClientError::Status {
                provider: "OpenAI",
                status: reqwest::StatusCode::BAD_GATEWAY,
                body: String::new(),
            }
            .kind(),
            ErrorKind::Transport
        );
    }

    #[test]
    fn test_crypto_error_keeps_source() {
        let err: ClientError = CryptoError::Decryption("tag mismatch".into()).into();

        assert_eq!(err.kind(), ErrorKind::Credential);
        assert!(err.to_string().contains("decrypt"));
        assert!(err.source().unwrap().to_string().contains("tag mismatch"));
    }

    #[test]
    fn test_status_message() {
        let err = ClientError::Status {
            provider: "OpenRouter",
            status: reqwest::StatusCode::TOO_MANY_REQUESTS,
            body: "slow down".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("OpenRouter"));
        assert!(msg.contains("429"));
        assert!(msg.contains("slow down"));
    }
}
