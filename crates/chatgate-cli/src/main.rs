//! Chatgate CLI: entry point.
//!
//! # Commands
//!
//! - `chatgate chat [-c NAME] [-m MESSAGE]`: chat (single-shot or streamed REPL)
//! - `chatgate test [-c NAME]`: check that a chat configuration answers
//! - `chatgate init`: create a starter config with a fresh encryption key
//! - `chatgate models ...`: manage chat configurations
//! - `chatgate status`: show configuration and provider status
//! - `chatgate keygen` / `chatgate encrypt-key`: credential helpers

mod helpers;
mod init;
mod models_cmd;
mod repl;
mod status;

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use chatgate_core::config::{get_config_path, load_config};
use chatgate_core::crypto::{cipher_from_config, generate_key};

use crate::helpers::StreamPrinter;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// 🦀 Chatgate: one chat interface for OpenAI, OpenRouter, Ollama, and Open WebUI
#[derive(Parser)]
#[command(name = "chatgate", version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.chatgate/config.json)
    #[arg(long, global = true)]
    config_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with a model (single-shot or interactive REPL)
    Chat {
        /// Chat configuration name. Defaults to `defaultModel`.
        #[arg(short = 'c', long = "config")]
        name: Option<String>,

        /// Single message (non-interactive). Omit for REPL mode.
        #[arg(short, long)]
        message: Option<String>,

        /// System prompt sent before the conversation
        #[arg(short, long)]
        system: Option<String>,

        /// Stream the single-shot answer (the REPL always streams)
        #[arg(long, default_value_t = false)]
        stream: bool,

        /// Sampling temperature (default from config, 0.7)
        #[arg(long)]
        temperature: Option<f64>,

        /// Maximum tokens to generate (default from config, 2000)
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Send a health-check request through a chat configuration
    Test {
        /// Chat configuration name. Defaults to `defaultModel`.
        #[arg(short = 'c', long = "config")]
        name: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Create a starter configuration
    Init,

    /// Manage chat configurations
    Models {
        #[command(subcommand)]
        action: models_cmd::ModelsCommands,
    },

    /// Show configuration and provider status
    Status {
        /// Print machine-readable JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Generate a new base64 AES-256 encryption key
    Keygen,

    /// Encrypt an API key with the configured encryption key
    EncryptKey {
        /// Plaintext API key
        plaintext: String,
    },
}

/// Options of the `chat` command.
struct ChatArgs {
    name: Option<String>,
    message: Option<String>,
    system: Option<String>,
    stream: bool,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config_file
        .as_deref()
        .map(helpers::expand_tilde)
        .unwrap_or_else(get_config_path);

    match cli.command {
        Commands::Chat {
            name,
            message,
            system,
            stream,
            temperature,
            max_tokens,
            logs,
        } => {
            init_logging(logs);
            let args = ChatArgs {
                name,
                message,
                system,
                stream,
                temperature,
                max_tokens,
            };
            run_chat(config_path, args).await
        }
        Commands::Test { name, logs } => {
            init_logging(logs);
            run_test(config_path, name).await
        }
        Commands::Init => init::run(&config_path),
        Commands::Models { action } => {
            init_logging(false);
            models_cmd::dispatch(action, &config_path)
        }
        Commands::Status { json } => {
            let config = load_config(Some(&config_path));
            status::run(&config, &config_path, json)
        }
        Commands::Keygen => {
            run_keygen();
            Ok(())
        }
        Commands::EncryptKey { plaintext } => {
            init_logging(false);
            run_encrypt_key(config_path, &plaintext)
        }
    }
}

// ─────────────────────────────────────────────
// Chat command
// ─────────────────────────────────────────────

async fn run_chat(config_path: PathBuf, args: ChatArgs) -> Result<()> {
    let config = load_config(Some(&config_path));
    let gateway = helpers::build_gateway(&config)?;
    let (name, chat_config) = helpers::resolve_chat_config(&config, args.name.as_deref())?;

    let Some(message) = args.message else {
        let options = repl::ReplOptions {
            system: args.system,
            temperature: args.temperature,
            max_tokens: args.max_tokens,
        };
        return repl::run(&gateway, &name, &chat_config, options).await;
    };

    info!(config = %name, stream = args.stream, "processing single message");
    let messages = helpers::build_messages(args.system.as_deref(), &[], &message);

    if args.stream {
        println!();
        helpers::print_assistant_label(&chat_config.model_name);
        let mut printer = StreamPrinter::new(std::io::stdout());
        let result = gateway
            .chat_stream(
                &chat_config,
                &messages,
                args.temperature,
                args.max_tokens,
                |text: &str, is_last: bool| printer.on_chunk(text, is_last),
            )
            .await;
        if result.is_err() {
            printer.abort();
        }
        result.context("streaming chat failed")?;
        println!();
    } else {
        let response = gateway
            .chat(&chat_config, &messages, args.temperature, args.max_tokens)
            .await
            .context("chat failed")?;
        helpers::print_response(&response);
    }

    Ok(())
}

// ─────────────────────────────────────────────
// Test command
// ─────────────────────────────────────────────

async fn run_test(config_path: PathBuf, name: Option<String>) -> Result<()> {
    let config = load_config(Some(&config_path));
    let gateway = helpers::build_gateway(&config)?;
    let (name, chat_config) = helpers::resolve_chat_config(&config, name.as_deref())?;

    println!();
    print!(
        "  Testing {} ({} · {}) ... ",
        name.bold(),
        chat_config.provider,
        chat_config.model_name
    );
    let _ = std::io::stdout().flush();

    let started = Instant::now();
    match gateway.test_connection(&chat_config).await {
        Ok(response) => {
            println!(
                "{} {}",
                "✓".green(),
                format!(
                    "{} ms, model {}",
                    started.elapsed().as_millis(),
                    response.model
                )
                .dimmed()
            );
            println!();
            Ok(())
        }
        Err(e) => {
            println!("{}", "✗".red());
            println!();
            Err(e).with_context(|| format!("connection test for '{name}' failed"))
        }
    }
}

// ─────────────────────────────────────────────
// Credential helpers
// ─────────────────────────────────────────────

fn run_keygen() {
    println!("{}", generate_key());
    eprintln!(
        "{}",
        "Store it as security.encryptionKey in config.json or export CHATGATE_SECURITY__ENCRYPTION_KEY."
            .dimmed()
    );
}

fn run_encrypt_key(config_path: PathBuf, plaintext: &str) -> Result<()> {
    let config = load_config(Some(&config_path));
    let cipher =
        cipher_from_config(&config.security).context("failed to set up credential cipher")?;
    let ciphertext = cipher
        .encrypt(plaintext)
        .context("failed to encrypt API key")?;
    println!("{ciphertext}");
    Ok(())
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("chatgate=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_chat_flags() {
        let cli = Cli::try_parse_from([
            "chatgate",
            "chat",
            "-c",
            "remote",
            "-m",
            "hi",
            "--stream",
            "--temperature",
            "0.2",
            "--max-tokens",
            "64",
        ])
        .unwrap();

        match cli.command {
            Commands::Chat {
                name,
                message,
                stream,
                temperature,
                max_tokens,
                ..
            } => {
                assert_eq!(name.as_deref(), Some("remote"));
                assert_eq!(message.as_deref(), Some("hi"));
                assert!(stream);
                assert_eq!(temperature, Some(0.2));
                assert_eq!(max_tokens, Some(64));
            }
            _ => panic!("expected chat command"),
        }
    }

    #[test]
    fn parse_models_add_provider() {
        let cli = Cli::try_parse_from([
            "chatgate",
            "--config-file",
            "/tmp/cg.json",
            "models",
            "add",
            "webui",
            "-p",
            "open-webui",
            "-m",
            "llama3",
            "-u",
            "http://localhost:3000",
        ])
        .unwrap();

        assert_eq!(cli.config_file.as_deref(), Some("/tmp/cg.json"));
        match cli.command {
            Commands::Models {
                action: models_cmd::ModelsCommands::Add { provider, .. },
            } => assert_eq!(provider, chatgate_core::ProviderKind::OpenWebUi),
            _ => panic!("expected models add"),
        }
    }

    #[test]
    fn parse_rejects_unknown_provider() {
        let result = Cli::try_parse_from([
            "chatgate", "models", "add", "x", "-p", "anthropic", "-m", "m",
        ]);
        assert!(result.is_err());
    }
}
