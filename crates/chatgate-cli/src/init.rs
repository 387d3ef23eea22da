//! `chatgate init`: create a starter configuration.
//!
//! - Creates `~/.chatgate/config.json` with a fresh encryption key
//! - Adds a keyless local Ollama chat configuration as the default

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use chatgate_core::config::schema::Config;
use chatgate_core::config::{load_config, save_config};
use chatgate_core::crypto::generate_key;
use chatgate_core::{ChatConfiguration, ProviderKind};

/// Name of the starter chat configuration.
const STARTER_NAME: &str = "local";
/// Model of the starter chat configuration.
const STARTER_MODEL: &str = "llama3.2";

/// Run the init command.
pub fn run(config_path: &Path) -> Result<()> {
    println!();
    println!("{}", "🦀 Chatgate — Setup".cyan().bold());
    println!();

    if config_path.exists() {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            config_path.display()
        );

        let mut config = load_config(Some(config_path));
        if ensure_encryption_key(&mut config) {
            save_config(&config, Some(config_path))
                .with_context(|| format!("failed to write {}", config_path.display()))?;
            println!("  {} generated missing encryption key", "✓".green());
        }
    } else {
        save_config(&starter_config(), Some(config_path))
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        println!(
            "  {} created config at {}",
            "✓".green(),
            config_path.display()
        );
        println!(
            "  {} added chat configuration '{}' (Ollama · {})",
            "✓".green(),
            STARTER_NAME,
            STARTER_MODEL
        );
    }

    println!();
    println!(
        "{}",
        "  Setup complete! Add a provider with `chatgate models add`, then run `chatgate chat`."
            .green()
    );
    println!();

    Ok(())
}

/// Default config plus a generated key and a local Ollama entry.
fn starter_config() -> Config {
    let mut config = Config::default();
    config.security.encryption_key = Some(generate_key());
    config.models.insert(
        STARTER_NAME.to_string(),
        ChatConfiguration::new(ProviderKind::Ollama, "", STARTER_MODEL),
    );
    config.default_model = Some(STARTER_NAME.to_string());
    config
}

/// Generate a key when encryption is on but unkeyed. Returns whether the
/// config changed.
fn ensure_encryption_key(config: &mut Config) -> bool {
    let missing = config
        .security
        .encryption_key
        .as_deref()
        .map_or(true, |k| k.trim().is_empty());
    if config.security.encryption_enabled && missing {
        config.security.encryption_key = Some(generate_key());
        return true;
    }
    false
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chatgate_core::crypto::AesGcmCipher;

    #[test]
    fn starter_config_is_usable() {
        let config = starter_config();

        let key = config.security.encryption_key.as_deref().unwrap();
        assert!(AesGcmCipher::from_base64(key).is_ok());

        let (name, model) = config.resolve_model(None).unwrap();
        assert_eq!(name, "local");
        assert_eq!(model.provider, ProviderKind::Ollama);
        assert!(model.encrypted_api_key.is_none());
    }

    #[test]
    fn run_creates_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        run(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["defaultModel"], "local");
        assert_eq!(parsed["models"]["local"]["provider"], "OLLAMA");
        assert!(parsed["security"]["encryptionKey"].is_string());
    }

    #[test]
    fn run_keeps_existing_models() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"models": {"mine": {"provider": "OPENAI", "modelName": "gpt-4o"}}}"#,
        )
        .unwrap();

        run(&path).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["models"]["mine"]["modelName"], "gpt-4o");
        assert!(parsed["models"].get("local").is_none());
    }

    #[test]
    fn ensure_key_respects_disabled_encryption() {
        let mut config = Config::default();
        config.security.encryption_enabled = false;
        assert!(!ensure_encryption_key(&mut config));
        assert!(config.security.encryption_key.is_none());

        config.security.encryption_enabled = true;
        assert!(ensure_encryption_key(&mut config));
        assert!(!ensure_encryption_key(&mut config));
    }
}
