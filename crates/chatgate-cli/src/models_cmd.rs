//! `chatgate models`: manage named chat configurations.
//!
//! - `chatgate models list`
//! - `chatgate models add NAME -p PROVIDER -m MODEL [-u URL] [-k KEY] [--default]`
//! - `chatgate models remove NAME`
//! - `chatgate models default NAME`

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use colored::Colorize;

use chatgate_core::config::schema::Config;
use chatgate_core::config::{load_config, save_config};
use chatgate_core::crypto::cipher_from_config;
use chatgate_core::{ChatConfiguration, CredentialCipher, ProviderKind};
use chatgate_providers::registry::find_by_kind;

// ─────────────────────────────────────────────
// Subcommand enum
// ─────────────────────────────────────────────

/// Models subcommands.
#[derive(Subcommand)]
pub enum ModelsCommands {
    /// List chat configurations
    List,

    /// Add or replace a chat configuration
    Add {
        /// Name used with `-c NAME`
        name: String,

        /// Provider: openai, openrouter, ollama, openwebui
        #[arg(short, long)]
        provider: ProviderKind,

        /// Model identifier sent to the provider
        #[arg(short, long)]
        model: String,

        /// API base URL (empty for the provider default)
        #[arg(short, long, default_value = "")]
        url: String,

        /// Plaintext API key; stored encrypted
        #[arg(short = 'k', long)]
        api_key: Option<String>,

        /// Make this the default chat configuration
        #[arg(long, default_value_t = false)]
        default: bool,
    },

    /// Remove a chat configuration
    Remove {
        name: String,
    },

    /// Set the default chat configuration
    Default {
        name: String,
    },
}

/// Arguments of `models add`, detached from clap.
#[derive(Debug)]
struct NewModel {
    name: String,
    provider: ProviderKind,
    model: String,
    url: String,
    api_key: Option<String>,
    make_default: bool,
}

// ─────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────

/// Dispatch a models subcommand.
pub fn dispatch(cmd: ModelsCommands, config_path: &Path) -> Result<()> {
    let mut config = load_config(Some(config_path));

    match cmd {
        ModelsCommands::List => {
            list(&config);
            return Ok(());
        }
        ModelsCommands::Add {
            name,
            provider,
            model,
            url,
            api_key,
            default,
        } => {
            let cipher = cipher_from_config(&config.security)
                .context("failed to set up credential cipher")?;
            let new_model = NewModel {
                name,
                provider,
                model,
                url,
                api_key,
                make_default: default,
            };
            let replaced = add_model(&mut config, cipher.as_ref(), &new_model)?;
            println!(
                "  {} {} chat configuration '{}'",
                "✓".green(),
                if replaced { "updated" } else { "added" },
                new_model.name
            );
        }
        ModelsCommands::Remove { name } => {
            remove_model(&mut config, &name)?;
            println!("  {} removed chat configuration '{}'", "✓".green(), name);
        }
        ModelsCommands::Default { name } => {
            set_default(&mut config, &name)?;
            println!("  {} default chat configuration is now '{}'", "✓".green(), name);
        }
    }

    save_config(&config, Some(config_path))
        .with_context(|| format!("failed to write {}", config_path.display()))
}

// ─────────────────────────────────────────────
// Operations
// ─────────────────────────────────────────────

fn list(config: &Config) {
    println!();
    if config.models.is_empty() {
        println!("  {}", "No chat configurations. Run `chatgate init`.".dimmed());
        println!();
        return;
    }
    for (name, model) in &config.models {
        let marker = if config.default_model.as_deref() == Some(name.as_str()) {
            "*".green().to_string()
        } else {
            " ".to_string()
        };
        println!(
            "  {} {:<18} {:<11} {}",
            marker,
            name,
            model.provider.as_str(),
            model.model_name
        );
    }
    println!();
}

/// Insert or replace a configuration. Returns whether one was replaced.
fn add_model(
    config: &mut Config,
    cipher: &dyn CredentialCipher,
    new_model: &NewModel,
) -> Result<bool> {
    if new_model.name.trim().is_empty() {
        bail!("chat configuration name must not be empty");
    }
    if new_model.model.trim().is_empty() {
        bail!("model name must not be empty");
    }

    let spec = find_by_kind(new_model.provider)
        .with_context(|| format!("unsupported provider {}", new_model.provider))?;
    // Reject unusable URLs now rather than on the first call.
    spec.completions_url(&new_model.url)?;

    let api_key = new_model
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty());
    if api_key.is_none() && spec.requires_api_key {
        println!(
            "  {} {} requires an API key; calls will fail until one is added",
            "!".yellow(),
            spec.display_name
        );
    }

    let mut chat_config =
        ChatConfiguration::new(new_model.provider, new_model.url.trim(), new_model.model.trim());
    if let Some(key) = api_key {
        chat_config = chat_config
            .with_encrypted_api_key(cipher.encrypt(key).context("failed to encrypt API key")?);
    }

    let replaced = config
        .models
        .insert(new_model.name.clone(), chat_config)
        .is_some();
    if new_model.make_default || config.default_model.is_none() {
        config.default_model = Some(new_model.name.clone());
    }
    Ok(replaced)
}

fn remove_model(config: &mut Config, name: &str) -> Result<()> {
    if config.models.remove(name).is_none() {
        bail!("no chat configuration named '{name}'");
    }
    if config.default_model.as_deref() == Some(name) {
        config.default_model = None;
    }
    Ok(())
}

fn set_default(config: &mut Config, name: &str) -> Result<()> {
    if !config.models.contains_key(name) {
        bail!("no chat configuration named '{name}'");
    }
    config.default_model = Some(name.to_string());
    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chatgate_core::crypto::{generate_key, AesGcmCipher};
    use chatgate_core::ExposeSecret;

    fn new_model(name: &str, provider: ProviderKind, url: &str, key: Option<&str>) -> NewModel {
        NewModel {
            name: name.to_string(),
            provider,
            model: "some-model".to_string(),
            url: url.to_string(),
            api_key: key.map(str::to_string),
            make_default: false,
        }
    }

    #[test]
    fn add_encrypts_key() {
        let cipher = AesGcmCipher::from_base64(&generate_key()).unwrap();
        let mut config = Config::default();

        let replaced = add_model(
            &mut config,
            &cipher,
            &new_model("remote", ProviderKind::OpenRouter, "", Some("sk-or-secret")),
        )
        .unwrap();

        assert!(!replaced);
        let stored = config.models["remote"].encrypted_api_key.as_deref().unwrap();
        assert_ne!(stored, "sk-or-secret");
        assert_eq!(cipher.decrypt(stored).unwrap().expose_secret(), "sk-or-secret");
        // First entry becomes the default
        assert_eq!(config.default_model.as_deref(), Some("remote"));
    }

    #[test]
    fn add_replaces_and_keeps_default() {
        let cipher = AesGcmCipher::from_base64(&generate_key()).unwrap();
        let mut config = Config::default();
        add_model(&mut config, &cipher, &new_model("a", ProviderKind::Ollama, "", None)).unwrap();
        add_model(&mut config, &cipher, &new_model("b", ProviderKind::Ollama, "", None)).unwrap();

        let replaced =
            add_model(&mut config, &cipher, &new_model("b", ProviderKind::Ollama, "", None))
                .unwrap();

        assert!(replaced);
        assert_eq!(config.default_model.as_deref(), Some("a"));
    }

    #[test]
    fn add_rejects_bad_url() {
        let cipher = AesGcmCipher::from_base64(&generate_key()).unwrap();
        let mut config = Config::default();

        let err = add_model(
            &mut config,
            &cipher,
            &new_model("webui", ProviderKind::OpenWebUi, "", Some("k")),
        )
        .unwrap_err();

        assert!(err.to_string().contains("API URL"));
        assert!(config.models.is_empty());
    }

    #[test]
    fn remove_clears_default() {
        let cipher = AesGcmCipher::from_base64(&generate_key()).unwrap();
        let mut config = Config::default();
        add_model(&mut config, &cipher, &new_model("a", ProviderKind::Ollama, "", None)).unwrap();

        remove_model(&mut config, "a").unwrap();

        assert!(config.models.is_empty());
        assert!(config.default_model.is_none());
        assert!(remove_model(&mut config, "a").is_err());
    }

    #[test]
    fn set_default_requires_existing() {
        let mut config = Config::default();
        assert!(set_default(&mut config, "ghost").is_err());
    }
}
