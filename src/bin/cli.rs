//! FarminAi - farming assistant in the terminal
//!
//! This is the CLI entry point for the farmin-ai tool.
//! Run with: cargo run --bin farmin-ai [question...]

use anyhow::Context;
use farmin_ai::config::KNOWN_MODELS;
use farmin_ai::settings::api_token_from;
use farmin_ai::{AppSettings, ChatSession, ModelClient};
use std::env;
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    // Initialize tracing; logs go to stderr so replies stay clean on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    // Saved settings first, environment on top. Only `saved` is ever written back.
    let mut saved = AppSettings::load();
    let settings = saved.with_env_overrides(|key| env::var(key).ok());

    let api_token = api_token_from(|key| env::var(key).ok()).unwrap_or_default();
    let client = ModelClient::new(settings.model_config(api_token))
        .context("Cannot start FarminAi")?;

    let mut session = ChatSession::from_settings(&settings);

    println!("🌾 FarminAi - Your Farming Assistant");
    println!("================================================");
    println!("Model: {} @ {}", session.model, settings.base_url);
    println!(
        "Sampling: temperature={}, top_p={}, max_tokens={}",
        settings.temperature, settings.top_p, settings.max_tokens
    );
    println!(
        "Retry: max {} attempts, {}ms delay, {}s timeout",
        settings.max_retries, settings.retry_delay_ms, settings.timeout_secs
    );
    println!("================================================\n");

    if args.len() > 1 {
        let question = args[1..].join(" ");
        run_once(&client, &mut session, &question).await
    } else {
        run_interactive(&client, &mut session, &mut saved).await
    }
}

/// Answer a single question passed on the command line.
async fn run_once(
    client: &ModelClient,
    session: &mut ChatSession,
    question: &str,
) -> anyhow::Result<()> {
    if question.trim().is_empty() {
        anyhow::bail!("⚠️ Please enter a question.");
    }

    println!("👨‍🌾 Question: {}\n", question.trim());
    println!("Thinking...");

    match session.ask(client, question).await {
        Ok(reply) => {
            println!("\n💬 FarminAi says:\n{}", reply.content);
            Ok(())
        }
        Err(e) => anyhow::bail!(e.display_message()),
    }
}

/// Interactive conversation loop.
async fn run_interactive(
    client: &ModelClient,
    session: &mut ChatSession,
    saved: &mut AppSettings,
) -> anyhow::Result<()> {
    println!("Ask anything related to agriculture:");
    println!("  🌾 Crop rotation   🌱 Soil health   💧 Irrigation");
    println!("  🐄 Livestock care  🛒 Market tips");
    println!("Type /help for commands, 'quit' or 'exit' to exit.\n");

    let stdin = io::stdin();
    loop {
        print!("👨‍🌾 Ask: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!("\nGoodbye! 👋");
            break;
        }
        let input = line.trim();

        if input.is_empty() {
            println!("⚠️ Please enter a question.\n");
            continue;
        }

        if input == "quit" || input == "exit" {
            println!("Goodbye! 👋");
            break;
        }

        if input.starts_with('/') {
            handle_command(input, session, saved);
            continue;
        }

        println!("Thinking...");
        match session.ask(client, input).await {
            Ok(reply) => println!("\n💬 {}\n", reply.content),
            Err(e) => eprintln!("\n{}\n", e.display_message()),
        }
    }

    Ok(())
}

/// Handle a slash command. Unknown commands print the help text.
///
/// `saved` holds the file settings without environment overrides; `/model`
/// updates it and `/save` writes it.
fn handle_command(input: &str, session: &mut ChatSession, saved: &mut AppSettings) {
    let mut parts = input.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or_default();
    let argument = parts.next().map(str::trim).unwrap_or_default();

    match command {
        "/clear" => {
            session.reset();
            println!("🧹 Conversation cleared.\n");
        }
        "/history" => {
            if session.conversation.is_empty() {
                println!("(no messages yet)\n");
            } else {
                for message in session.conversation.messages() {
                    println!("{}", message.format_display());
                }
                println!();
            }
        }
        "/models" => {
            for model in KNOWN_MODELS {
                let marker = if model == session.model { "*" } else { " " };
                println!(" {} {}", marker, model);
            }
            println!();
        }
        "/model" => {
            if argument.is_empty() {
                println!("Current model: {}\n", session.model);
            } else {
                let model = session.set_model(argument).to_string();
                saved.model = model.clone();
                println!("✅ Switched to {}\n", model);
            }
        }
        "/save" => match saved.save() {
            Ok(path) => println!("💾 Settings saved to {}\n", path.display()),
            Err(e) => eprintln!("❌ Failed to save settings: {}\n", e),
        },
        _ => {
            println!("Commands:");
            println!("  /clear          start a new conversation");
            println!("  /history        show the conversation so far");
            println!("  /models         list known models");
            println!("  /model [name]   show or switch the model (aliases: zephyr, mistral, gemma, falcon)");
            println!("  /save           save current settings");
            println!("  quit | exit     leave FarminAi\n");
        }
    }
}
