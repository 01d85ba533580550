//! Keysync - command-line access to a keysync log store.
//!
//! Opens the configured store through a registry, waits behind its load gate,
//! runs one CRUD verb and prints the outcome as JSON.

mod commands;
mod config;
mod error;

use crate::commands::Command;
use crate::config::{Config, Overrides};
use crate::error::{AppError, Result};
use clap::Parser;
use keysync_engine::{Fixtures, KeyedStore, StoreRegistry, SyncEngine};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "keysync", version, about = "CRUD access to an append-only key-value log")]
struct Cli {
    /// Backing log file (overrides KEYSYNC_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Fixture file for read fallbacks (overrides KEYSYNC_FIXTURES)
    #[arg(long, global = true)]
    fixtures: Option<PathBuf>,

    /// Fail on malformed log lines
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keysync=info,keysync_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env(Overrides {
        db_path: cli.db,
        fixtures: cli.fixtures,
        strict: cli.strict,
    })?;
    tracing::debug!(?config, "configuration loaded");

    let registry = StoreRegistry::with_options(config.store_options());
    let store = registry.get_or_create(&config.db_path);
    store.gate().wait().await;
    if let Some(reason) = store.load_error() {
        return Err(AppError::Load(format!("{}: {}", store.path().display(), reason)));
    }

    let mut engine = SyncEngine::new(store);
    if let Some(path) = &config.fixtures {
        engine = engine.with_fixtures(Fixtures::load(path).await?);
    }

    let outcome = cli.command.run(&engine).await?;
    println!("{}", serde_json::to_string_pretty(&outcome.into_value())?);
    Ok(())
}
