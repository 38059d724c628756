//! Recall CLI
//!
//! Main entry point for the recall command-line tool.
//! Answers queries with a hosted chat model and resurfaces related past
//! answers from a local search history.

mod commands;

use clap::{Parser, Subcommand};
use commands::{HistoryCommand, SearchCommand, SuggestCommand};
use recall_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Recall - search answers that remember what you asked before
#[derive(Parser, Debug)]
#[command(name = "recall")]
#[command(about = "Search with a chat model, backed by semantic search history", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "RECALL_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "RECALL_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Chat provider (openrouter, ollama)
    #[arg(short, long, global = true, env = "RECALL_PROVIDER")]
    provider: Option<String>,

    /// Chat model identifier
    #[arg(short, long, global = true, env = "RECALL_MODEL")]
    model: Option<String>,

    /// Embedding provider (openrouter, ollama, mock)
    #[arg(short, long, global = true, env = "RECALL_EMBEDDING_PROVIDER")]
    embedding_provider: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question, reusing or building on past answers
    Search(SearchCommand),

    /// List past searches related to partial input
    Suggest(SuggestCommand),

    /// Search history management
    History(HistoryCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    // Load base configuration from file and environment
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.embedding_provider,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Recall CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {} ({})", config.provider, config.model);
    tracing::debug!("Embedding provider: {}", config.embedding_provider);

    config.ensure_recall_dir()?;

    let command_name = match &cli.command {
        Commands::Search(_) => "search",
        Commands::Suggest(_) => "suggest",
        Commands::History(_) => "history",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Search(cmd) => cmd.execute(&config).await,
        Commands::Suggest(cmd) => cmd.execute(&config).await,
        Commands::History(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
