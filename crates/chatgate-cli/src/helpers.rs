//! Shared CLI helpers: path expansion, config resolution, response printing.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use colored::Colorize;

use chatgate_core::config::schema::Config;
use chatgate_core::crypto::cipher_from_config;
use chatgate_core::{ChatConfiguration, ChatResponse, Message};
use chatgate_providers::GatewayFacade;

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Build the gateway described by the loaded configuration.
pub fn build_gateway(config: &Config) -> Result<GatewayFacade> {
    let cipher =
        cipher_from_config(&config.security).context("failed to set up credential cipher")?;
    GatewayFacade::from_config(cipher, &config.gateway).context("failed to build gateway")
}

/// Pick the named chat configuration, or the default one.
pub fn resolve_chat_config(
    config: &Config,
    name: Option<&str>,
) -> Result<(String, ChatConfiguration)> {
    if let Some((found, chat_config)) = config.resolve_model(name) {
        return Ok((found.to_string(), chat_config.clone()));
    }

    match name.or(config.default_model.as_deref()) {
        Some(wanted) => bail!(
            "no chat configuration named '{wanted}' (configured: {})",
            configured_names(config)
        ),
        None if config.models.is_empty() => {
            bail!("no chat configurations found; run `chatgate init` to create one")
        }
        None => bail!(
            "several chat configurations exist; pick one with -c NAME or set defaultModel \
             (configured: {})",
            configured_names(config)
        ),
    }
}

fn configured_names(config: &Config) -> String {
    if config.models.is_empty() {
        return "none".to_string();
    }
    config.models.keys().cloned().collect::<Vec<_>>().join(", ")
}

/// Assemble the conversation context for one turn.
///
/// The system prompt (if any) comes first, then prior turns in order, then
/// the new user input.
pub fn build_messages(system: Option<&str>, history: &[Message], input: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    if let Some(system) = system.filter(|s| !s.trim().is_empty()) {
        messages.push(Message::system(system));
    }
    messages.extend_from_slice(history);
    messages.push(Message::user(input));
    messages
}

/// Print a complete chat response to stdout.
pub fn print_response(response: &ChatResponse) {
    println!();
    print_assistant_label(&response.model);
    if response.content.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{}", response.content);
    }
    if let Some(tokens) = response.tokens_used {
        println!("{}", format!("tokens: {tokens}").dimmed());
    }
    println!();
}

/// Print the label preceding an answer.
pub fn print_assistant_label(model: &str) {
    println!("{} {}", "🦀 Chatgate".cyan().bold(), model.dimmed());
}

/// Print the banner shown at REPL start.
pub fn print_banner(name: &str, chat_config: &ChatConfiguration) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "🦀 Chatgate".cyan().bold(), version.dimmed());
    println!(
        "{}",
        format!(
            "Chatting with {} ({} · {})",
            name, chat_config.provider, chat_config.model_name
        )
        .dimmed()
    );
    println!(
        "{}",
        "Type a message, \"/reset\" to clear the conversation, or \"exit\" to quit.".dimmed()
    );
    println!();
}

/// Print a "thinking" placeholder (for non-log mode).
pub fn print_thinking() {
    eprint!("{}", "⠿ thinking...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

// ─────────────────────────────────────────────
// Streaming output
// ─────────────────────────────────────────────

/// Writes streamed deltas as they arrive and keeps the full text.
pub struct StreamPrinter<W: Write> {
    out: W,
    text: String,
    thinking: bool,
    finished: bool,
}

impl<W: Write> StreamPrinter<W> {
    pub fn new(out: W) -> Self {
        StreamPrinter {
            out,
            text: String::new(),
            thinking: false,
            finished: false,
        }
    }

    /// Show the thinking placeholder until the first chunk arrives.
    pub fn with_thinking(mut self) -> Self {
        print_thinking();
        self.thinking = true;
        self
    }

    /// Handle one `(text, is_last)` callback.
    pub fn on_chunk(&mut self, text: &str, is_last: bool) {
        if self.thinking {
            clear_thinking();
            self.thinking = false;
        }
        if !text.is_empty() {
            self.text.push_str(text);
            let _ = write!(self.out, "{text}");
        }
        if is_last {
            self.finished = true;
            let _ = writeln!(self.out);
        }
        let _ = self.out.flush();
    }

    /// Close an interrupted or failed stream.
    pub fn abort(&mut self) {
        if self.thinking {
            clear_thinking();
            self.thinking = false;
        }
        if !self.text.is_empty() && !self.finished {
            let _ = writeln!(self.out);
            let _ = self.out.flush();
        }
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
