//! Configuration schema.
//!
//! Hierarchy: `Config` → `GatewayConfig`, `SecurityConfig`, named model
//! configurations.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{ChatConfiguration, SamplingParameters, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration: loaded from `~/.chatgate/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub security: SecurityConfig,
    /// Named chat configurations (e.g. `"local"`, `"openrouter-llama"`).
    pub models: BTreeMap<String, ChatConfiguration>,
    /// Name of the entry in `models` used when none is requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl Config {
    /// Look up a chat configuration by name, falling back to `default_model`
    /// and then to the only configured entry.
    pub fn resolve_model(&self, name: Option<&str>) -> Option<(&str, &ChatConfiguration)> {
        let wanted = name.or(self.default_model.as_deref());
        match wanted {
            Some(n) => self.models.get_key_value(n).map(|(k, v)| (k.as_str(), v)),
            None if self.models.len() == 1 => {
                self.models.iter().next().map(|(k, v)| (k.as_str(), v))
            }
            None => None,
        }
    }
}

// ─────────────────────────────────────────────
// Gateway
// ─────────────────────────────────────────────

/// Gateway-wide settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayConfig {
    /// Sampling defaults applied when a caller leaves them unset.
    pub defaults: SamplingDefaults,
    /// Total timeout for non-streaming calls, in seconds.
    pub request_timeout_secs: u64,
    /// TCP connect timeout, in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            defaults: SamplingDefaults::default(),
            request_timeout_secs: 120,
            connect_timeout_secs: 10,
        }
    }
}

/// Default sampling parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SamplingDefaults {
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum tokens to generate per response.
    pub max_tokens: u32,
}

impl Default for SamplingDefaults {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl From<&SamplingDefaults> for SamplingParameters {
    fn from(defaults: &SamplingDefaults) -> Self {
        SamplingParameters {
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
        }
    }
}

// ─────────────────────────────────────────────
// Security
// ─────────────────────────────────────────────

/// Credential encryption settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityConfig {
    /// When false, stored API keys are plaintext.
    pub encryption_enabled: bool,
    /// Base64-encoded AES-256 key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_key: Option<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            encryption_enabled: true,
            encryption_key: None,
        }
    }
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("encryption_enabled", &self.encryption_enabled)
            .field("encryption_key", &self.encryption_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProviderKind;

    fn config_with(names: &[&str]) -> Config {
        let mut config = Config::default();
        for name in names {
            config.models.insert(
                name.to_string(),
                ChatConfiguration::new(ProviderKind::Ollama, "", *name),
            );
        }
        config
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.gateway.defaults.temperature, 0.7);
        assert_eq!(config.gateway.defaults.max_tokens, 2000);
        assert_eq!(config.gateway.request_timeout_secs, 120);
        assert!(config.security.encryption_enabled);
        assert!(config.models.is_empty());
    }

    #[test]
    fn test_resolve_model_by_name() {
        let config = config_with(&["a", "b"]);
        let (name, model) = config.resolve_model(Some("b")).unwrap();
        assert_eq!(name, "b");
        assert_eq!(model.model_name, "b");
        assert!(config.resolve_model(Some("missing")).is_none());
    }

    #[test]
    fn test_resolve_model_default() {
        let mut config = config_with(&["a", "b"]);
        assert!(config.resolve_model(None).is_none());

        config.default_model = Some("a".to_string());
        assert_eq!(config.resolve_model(None).unwrap().0, "a");
    }

    #[test]
    fn test_resolve_single_model() {
        let config = config_with(&["only"]);
        assert_eq!(config.resolve_model(None).unwrap().0, "only");
    }

    #[test]
    fn test_sampling_defaults_conversion() {
        let defaults = SamplingDefaults {
            temperature: 0.2,
            max_tokens: 64,
        };
        let params = SamplingParameters::from(&defaults);
        assert_eq!(params.temperature, 0.2);
        assert_eq!(params.max_tokens, 64);
    }

    #[test]
    fn test_security_debug_redacts_key() {
        let security = SecurityConfig {
            encryption_enabled: true,
            encryption_key: Some("c2VjcmV0".to_string()),
        };
        assert!(!format!("{security:?}").contains("c2VjcmV0"));
    }
}
