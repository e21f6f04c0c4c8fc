//! Grounded CLI
//!
//! Main entry point for the grounded command-line tool.
//! Explains generated answers against the evidence they were built from.

mod commands;

use clap::{Parser, Subcommand};
use commands::{ExplainCommand, SentencesCommand};
use grounded_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Grounded - citations, confidence and context graphs for RAG answers
#[derive(Parser, Debug)]
#[command(name = "grounded")]
#[command(about = "Explain and ground RAG answers in their evidence", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "GROUNDED_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "GROUNDED_CONFIG")]
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

    /// Write logs to stderr as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Explain an answer: citations, confidence, entities and context graph
    Explain(ExplainCommand),

    /// Split text into sentences the way the citation matcher does
    Sentences(SentencesCommand),
}

fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Workspace and config file decide which YAML is layered, so they go in first
    let config = AppConfig::load_with(cli.workspace, cli.config)?;

    // Apply CLI overrides
    let config = config.with_overrides(cli.log_level, cli.verbose, cli.no_color, cli.log_json);
    config.validate()?;

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_json)?;

    tracing::info!("Grounded CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Explain settings: {:?}", config.explain);

    let command_name = match &cli.command {
        Commands::Explain(_) => "explain",
        Commands::Sentences(_) => "sentences",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Explain(cmd) => cmd.execute(&config),
        Commands::Sentences(cmd) => cmd.execute(),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
