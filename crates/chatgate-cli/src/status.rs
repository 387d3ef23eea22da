//! `chatgate status`: show configuration, providers, and chat configurations.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use chatgate_core::config::schema::Config;
use chatgate_providers::PROVIDERS;

/// Run the status command.
pub fn run(config: &Config, config_path: &Path, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&summary(config, config_path))?);
        return Ok(());
    }

    println!();
    println!("{}", "🦀 Chatgate Status".cyan().bold());
    println!();

    // Config
    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_path.exists() {
            "✓".green().to_string()
        } else {
            "(not found)".red().to_string()
        }
    );

    // Encryption
    let encryption = match (
        config.security.encryption_enabled,
        config.security.encryption_key.is_some(),
    ) {
        (false, _) => "disabled (keys stored in plaintext)".yellow().to_string(),
        (true, true) => format!("{} AES-256-GCM", "✓".green()),
        (true, false) => "enabled but no key set".red().to_string(),
    };
    println!("  {:<18} {}", "Encryption:".bold(), encryption);

    // Temperature & tokens
    let defaults = &config.gateway.defaults;
    println!(
        "  {:<18} {} | max_tokens: {}",
        "Parameters:".bold(),
        format!("temp: {}", defaults.temperature).dimmed(),
        format!("{}", defaults.max_tokens).dimmed(),
    );
    println!(
        "  {:<18} {}",
        "Timeouts:".bold(),
        format!(
            "connect {}s | request {}s",
            config.gateway.connect_timeout_secs, config.gateway.request_timeout_secs
        )
        .dimmed()
    );

    // Providers
    println!();
    println!("  {}", "Providers:".bold());
    for spec in PROVIDERS {
        let base = spec.default_api_base.unwrap_or("(API URL required)");
        let key = if spec.requires_api_key {
            "key required"
        } else {
            "no key"
        };
        println!(
            "    {:<20} {} {}",
            spec.display_name,
            base,
            format!("· {key}").dimmed()
        );
    }

    // Chat configurations
    println!();
    println!("  {}", "Chat configurations:".bold());
    if config.models.is_empty() {
        println!("    {}", "· none (run `chatgate init`)".dimmed());
    }
    for (name, model) in &config.models {
        let marker = if config.default_model.as_deref() == Some(name.as_str()) {
            "*".green().to_string()
        } else {
            " ".to_string()
        };
        let url = if model.api_url.is_empty() {
            "(default URL)"
        } else {
            model.api_url.as_str()
        };
        let key = if model.encrypted_api_key.is_some() {
            format!("{} key set", "✓".green())
        } else {
            format!("{}", "· no key".dimmed())
        };
        println!(
            "  {} {:<18} {:<11} {:<28} {} {}",
            marker,
            name,
            model.provider.as_str(),
            model.model_name,
            url,
            key
        );
    }

    println!();

    Ok(())
}

/// Machine-readable status. Never includes credentials.
fn summary(config: &Config, config_path: &Path) -> serde_json::Value {
    let models: Vec<serde_json::Value> = config
        .models
        .iter()
        .map(|(name, model)| {
            serde_json::json!({
                "name": name,
                "provider": model.provider,
                "apiUrl": model.api_url,
                "modelName": model.model_name,
                "hasApiKey": model.encrypted_api_key.is_some(),
                "default": config.default_model.as_deref() == Some(name.as_str()),
            })
        })
        .collect();

    serde_json::json!({
        "configPath": config_path.display().to_string(),
        "configExists": config_path.exists(),
        "encryptionEnabled": config.security.encryption_enabled,
        "encryptionKeySet": config.security.encryption_key.is_some(),
        "defaults": {
            "temperature": config.gateway.defaults.temperature,
            "maxTokens": config.gateway.defaults.max_tokens,
        },
        "providers": PROVIDERS.iter().map(|s| s.kind).collect::<Vec<_>>(),
        "models": models,
    })
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
