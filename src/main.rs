//! synax command-line entry point.

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::style::Color;
use std::path::PathBuf;
use synax::{client, config, context, llm, prompt, session};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "synax")]
#[command(author, version, about = "Chat with a local LLM that can propose shell commands")]
#[command(long_about = "Chat with a local Ollama model.\n\nWhen the model answers with `ACTION: <command>`, synax asks for confirmation before running the command and prints its output.")]
struct Cli {
    /// URL of the Ollama server (default: http://localhost:11434)
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Name of the model (default: first model the server lists)
    #[arg(short = 'm', long, value_name = "NAME")]
    model: Option<String>,

    /// Path to a config file (default: ~/.config/synax/config.toml)
    #[arg(short = 'c', long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let mut config = config::Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = cli.url {
        config.host = url;
    }
    if cli.model.is_some() {
        config.model = cli.model;
    }

    let mut llm = llm::OllamaClient::new(
        config.host.clone(),
        config.model.clone().unwrap_or_else(|| llm::DEFAULT_MODEL.to_string()),
        config.options.clone(),
        config.request_timeout(),
    )
    .context("Failed to create Ollama client")?;

    if config.model.is_none() {
        match llm.detect_model().await {
            Ok(model) => {
                info!("Detected model {}", model);
                llm.set_model(model);
            }
            Err(e) => {
                debug!("Model detection failed: {}", e);
                println!(
                    "{}",
                    client::paint("Could not detect running model, using default", Color::Yellow)
                );
            }
        }
    }

    let executor = config.executor();
    let system = context::SystemContext::gather(executor.shell());
    let pre_prompt = prompt::build_pre_prompt(&system);

    client::banner::print_banner(llm.host(), llm.model(), llm.model() == llm::DEFAULT_MODEL);

    spawn_interrupt_notice();

    let mut session = session::Session::new(
        llm,
        pre_prompt,
        config.gate(),
        executor,
        client::TerminalConfirmer,
    )
    .with_spinner(client::is_interactive());

    session
        .run(&mut client::TerminalInput::new())
        .await
        .context("Failed to read interactive input")
}

/// Log to stderr so diagnostics never mix with the conversation.
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "synax=debug" } else { "synax=warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(level.parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();
    Ok(())
}

/// Turn SIGINT outside raw mode into a notice instead of an exit.
///
/// While a prompt is in raw mode Ctrl-C arrives as a key event instead.
fn spawn_interrupt_notice() {
    tokio::spawn(async {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Could not listen for Ctrl-C: {}", e);
                return;
            }
            println!(
                "{}",
                client::paint(
                    "\n\nInterruption detected. Type \"exit\" to quit properly.",
                    Color::Yellow
                )
            );
        }
    });
}
