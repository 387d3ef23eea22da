//! Provider registry: static specs for the supported LLM backends.
//!
//! Each `ProviderSpec` describes how to reach one provider: where its chat
//! completions endpoint lives, whether it needs a key, which extra headers
//! it expects, and which temperatures it accepts.

use chatgate_core::ProviderKind;

use crate::error::ClientError;

// ─────────────────────────────────────────────
// ProviderSpec: static metadata for one provider
// ─────────────────────────────────────────────

/// Static specification describing one LLM provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    /// Which configuration provider this spec serves.
    pub kind: ProviderKind,
    /// Human-readable name for logs. E.g. `"OpenRouter"`.
    pub display_name: &'static str,
    /// Path appended to the base URL. E.g. `"/api/v1/chat/completions"`.
    pub completions_path: &'static str,
    /// Base URL used when the configuration leaves it empty.
    pub default_api_base: Option<&'static str>,
    /// Whether a call without an API key should be refused.
    pub requires_api_key: bool,
    /// Static headers sent with every request.
    pub extra_headers: &'static [(&'static str, &'static str)],
    /// Accepted temperature range (inclusive).
    pub temperature_range: (f64, f64),
}

/// All supported provider specifications.
pub static PROVIDERS: &[ProviderSpec] = &[
    // 1. OpenAI and any OpenAI-compatible server
    ProviderSpec {
        kind: ProviderKind::OpenAi,
        display_name: "OpenAI",
        completions_path: "/v1/chat/completions",
        default_api_base: Some("https://api.openai.com"),
        requires_api_key: true,
        extra_headers: &[],
        temperature_range: (0.0, 2.0),
    },
    // 2. OpenRouter: attribution headers identify the calling app
    ProviderSpec {
        kind: ProviderKind::OpenRouter,
        display_name: "OpenRouter",
        completions_path: "/api/v1/chat/completions",
        default_api_base: Some("https://openrouter.ai"),
        requires_api_key: true,
        extra_headers: &[
            ("HTTP-Referer", "https://github.com/chatgate/chatgate"),
            ("X-Title", "Chatgate"),
        ],
        temperature_range: (0.0, 2.0),
    },
    // 3. Ollama: local, OpenAI-compatible endpoint, no key
    ProviderSpec {
        kind: ProviderKind::Ollama,
        display_name: "Ollama",
        completions_path: "/v1/chat/completions",
        default_api_base: Some("http://localhost:11434"),
        requires_api_key: false,
        extra_headers: &[],
        temperature_range: (0.0, 2.0),
    },
    // 4. Open WebUI: always self-hosted, so no default base
    ProviderSpec {
        kind: ProviderKind::OpenWebUi,
        display_name: "Open WebUI",
        completions_path: "/api/chat/completions",
        default_api_base: None,
        requires_api_key: true,
        extra_headers: &[],
        temperature_range: (0.0, 2.0),
    },
];

/// Find the spec for a provider.
pub fn find_by_kind(kind: ProviderKind) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|spec| spec.kind == kind)
}

impl ProviderSpec {
    /// Build the full completions URL from a configured base URL.
    ///
    /// Trailing slashes are removed, and a base that already ends with this
    /// provider's completions path (a pasted endpoint URL) is cut back to
    /// the base. An empty base falls back to `default_api_base`.
    pub fn completions_url(&self, api_url: &str) -> Result<String, ClientError> {
        let base = normalize_base_url(api_url, self.completions_path);
        let base = if base.is_empty() {
            self.default_api_base.ok_or_else(|| {
                ClientError::Configuration(format!(
                    "{} requires an API URL",
                    self.display_name
                ))
            })?
        } else {
            base
        };

        let lower = base.to_ascii_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(ClientError::Configuration(format!(
                "API URL for {} must start with http:// or https://, got '{}'",
                self.display_name, base
            )));
        }

        Ok(format!("{}{}", base, self.completions_path))
    }

    /// Clamp a temperature into the accepted range.
    pub fn clamp_temperature(&self, temperature: f64) -> f64 {
        let (min, max) = self.temperature_range;
        if temperature.is_nan() {
            return min;
        }
        temperature.clamp(min, max)
    }
}

/// Trim whitespace and trailing slashes, then strip a pasted completions path.
fn normalize_base_url<'a>(api_url: &'a str, completions_path: &str) -> &'a str {
    let trimmed = api_url.trim().trim_end_matches('/');

    let lower = trimmed.to_ascii_lowercase();
    let stripped = if lower.ends_with(completions_path) {
        &trimmed[..trimmed.len() - completions_path.len()]
    } else {
        trimmed
    };

    stripped.trim_end_matches('/')
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
