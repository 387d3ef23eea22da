//! Interactive REPL: streamed multi-turn chat.
//!
//! Uses `rustyline` for readline-style editing with persistent history. The
//! conversation context grows turn by turn; `/reset` starts over.

use anyhow::Result;
use colored::Colorize;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use chatgate_core::{ChatConfiguration, Message};
use chatgate_providers::GatewayFacade;

use crate::helpers::{self, StreamPrinter};

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// Commands that clear the conversation context.
const RESET_COMMANDS: &[&str] = &["/reset", "/clear"];

/// Per-session options taken from the command line.
#[derive(Debug, Default)]
pub struct ReplOptions {
    pub system: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

/// Run the interactive REPL loop.
pub async fn run(
    gateway: &GatewayFacade,
    name: &str,
    chat_config: &ChatConfiguration,
    options: ReplOptions,
) -> Result<()> {
    helpers::print_banner(name, chat_config);

    let mut editor = create_editor()?;
    let mut history: Vec<Message> = Vec::new();

    loop {
        // Read input
        let input = match editor.readline("You: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => {
                // Ctrl-C at the prompt: exit cleanly
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                // Ctrl-D: exit cleanly
                break;
            }
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_exit_command(trimmed) {
            println!("\nGoodbye! 👋");
            break;
        }

        let _ = editor.add_history_entry(&input);

        if is_reset_command(trimmed) {
            history.clear();
            println!("\nConversation cleared.\n");
            continue;
        }

        let messages = helpers::build_messages(options.system.as_deref(), &history, trimmed);
        debug!(
            config = name,
            turns = history.len() / 2,
            "sending REPL turn"
        );

        println!();
        helpers::print_assistant_label(&chat_config.model_name);
        let mut printer = StreamPrinter::new(std::io::stdout()).with_thinking();

        // Ctrl-C while streaming drops the request and keeps the REPL alive.
        let outcome = tokio::select! {
            result = gateway.chat_stream(
                chat_config,
                &messages,
                options.temperature,
                options.max_tokens,
                |text: &str, is_last: bool| printer.on_chunk(text, is_last),
            ) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        };

        match outcome {
            Some(Ok(())) => {
                history.push(Message::user(trimmed));
                history.push(Message::assistant(printer.into_text()));
                println!();
            }
            Some(Err(e)) => {
                printer.abort();
                eprintln!("\n❌ Error: {e}\n");
            }
            None => {
                printer.abort();
                println!("\n{}\n", "(interrupted)".dimmed());
            }
        }
    }

    save_history(&mut editor);

    Ok(())
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// Path to the history file.
fn history_path() -> std::path::PathBuf {
    chatgate_core::utils::get_data_path()
        .join("history")
        .join("cli_history")
}

/// Check if input is an exit command.
fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

fn is_reset_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    RESET_COMMANDS.contains(&lower.as_str())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
