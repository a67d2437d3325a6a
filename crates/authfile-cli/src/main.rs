use std::fs;

use anyhow::{Context, Result};
use authfile::SingleFileAuthState;
use clap::{Parser, Subcommand};
use tracing::info;

mod commands;
mod config;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "authfile", about = "Inspect and edit a single-file session auth state")]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// Session path (`*.json` file or directory), overrides config
    #[arg(short, long)]
    path: Option<String>,

    /// Serialize concurrent writes, overrides config
    #[arg(long)]
    serialize_writes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the file with fresh credentials if it does not exist yet
    Init,
    /// Print a summary of credentials and stored keys
    Inspect,
    /// Print stored values for the given ids
    Get { category: String, ids: Vec<String> },
    /// Store a JSON value (a falsy value deletes the entry)
    Set {
        category: String,
        id: String,
        value: String,
    },
    /// Remove entries
    Delete { category: String, ids: Vec<String> },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authfile=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Load config
    let mut config = if let Some(config_path) = &args.config {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read config file: {}", config_path))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", config_path))?
    } else {
        CliConfig::default()
    };

    // CLI overrides
    if let Some(path) = args.path {
        config.session_path = path;
    }
    if args.serialize_writes {
        config.store.serialize_writes = true;
    }

    info!(session_path = %config.session_path, "opening auth state");

    let store = SingleFileAuthState::open_with_options(&config.session_path, config.store)
        .await
        .with_context(|| format!("failed to open auth state at {}", config.session_path))?;

    let output = match args.command {
        Command::Init => commands::init(&store).await?,
        Command::Inspect => commands::inspect(&store).await?,
        Command::Get { category, ids } => commands::get(&store, &category, &ids).await?,
        Command::Set {
            category,
            id,
            value,
        } => commands::set(&store, &category, &id, &value).await?,
        Command::Delete { category, ids } => commands::delete(&store, &category, &ids).await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
