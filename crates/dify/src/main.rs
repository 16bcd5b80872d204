//! Dify - command-line client for Dify chat apps and workflows.

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::Style;
use dify_config::ClientConfig;
use tokio_util::sync::CancellationToken;

mod commands;

use commands::{chat, config, conversations, workflow};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Dify - chat with apps and run workflows from the terminal
#[derive(Parser)]
#[command(name = "dify")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Server URL (default: https://api.dify.ai)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// App API key
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// End-user identifier sent with requests
    #[arg(long, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a message to a chat app and stream the answer
    Chat(chat::ChatArgs),

    /// Run a workflow and show node progress
    Workflow(workflow::WorkflowArgs),

    /// List, inspect and rename conversations
    Conversations(conversations::ConversationsArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console on stderr (stdout carries answers) + rotating JSON file
    let filter = if cli.verbose {
        "dify=debug,dify_client=debug,dify_config=debug,info"
    } else {
        "dify=info,dify_client=info,dify_config=info,warn"
    };
    let console_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    let log_dir = dify_config::xdg_config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "dify.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "dify=trace,dify_client=trace,dify_config=trace,info",
                )),
        )
        .init();

    // Layered config: user file, ./dify.toml, DIFY_* env, then flags
    let loaded = dify_config::load_config(None)?;
    for warning in &loaded.warnings {
        eprintln!("{} {}", Style::new().yellow().apply_to("Warning:"), warning);
    }
    let config_path = loaded.primary_path();
    let mut config = loaded.config;
    config.merge(ClientConfig {
        host: cli.host,
        api_key: cli.api_key,
        user: cli.user,
        ..Default::default()
    });

    // Ctrl-C stops the stream before its next line
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::debug!("Interrupted, cancelling");
                cancel.cancel();
            }
        });
    }

    let ctx = commands::Context {
        config,
        config_path,
        json_output: cli.json,
        verbose: cli.verbose,
        cancel,
    };

    // Dispatch to command handlers
    match cli.command {
        Commands::Chat(args) => chat::run(args, &ctx).await,
        Commands::Workflow(args) => workflow::run(args, &ctx).await,
        Commands::Conversations(args) => conversations::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
