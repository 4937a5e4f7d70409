//! Administrative commands for the datastore
//!
//! Usage:
//!   datastore-admin migrate              # create missing tables, columns and indexes
//!   datastore-admin clean                # drop every declared table
//!   datastore-admin reset                # clean, then migrate
//!   datastore-admin check                # connect and run a health check
//!   datastore-admin short-id --count 5   # print fresh short ids
//!
//! Environment variables:
//!   RUST_LOG                             # Log filter (default: info)
//!   DATASTORE_CONFIG                     # Config path (default: ./datastore.toml)

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use datastore::{FactoryCell, FactoryError, Settings, StoreFactory, generate_short_id};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "datastore-admin", version, about = "Schema maintenance for the datastore")]
struct Cli {
    /// Path to a TOML config file with a [db] table
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging unless RUST_LOG is set
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create missing tables, columns and indexes
    Migrate,
    /// Drop every declared table
    Clean,
    /// Drop and recreate every declared table
    Reset,
    /// Connect and run a health check
    Check,
    /// Print short ids
    ShortId {
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },
}

fn init_tracing(debug: bool) -> Result<()> {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(debug)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
    match path {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Settings::load().context("failed to load config"),
    }
}

async fn run_with_factory(factory: &StoreFactory, command: &Command) -> Result<()> {
    match command {
        Command::Migrate => factory.migrate().await?,
        Command::Clean => factory.clean().await?,
        Command::Reset => factory.reset().await?,
        Command::Check => factory.health_check().await?,
        Command::ShortId { .. } => {}
    }
    info!(?command, "done");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug)?;

    if let Command::ShortId { count } = cli.command {
        for _ in 0..count {
            println!("{}", generate_short_id());
        }
        return Ok(());
    }

    let settings = load_settings(cli.config.as_ref())?;
    let cell = FactoryCell::new();
    let factory = cell.get_or_init(&settings).await?;

    let result = run_with_factory(&factory, &cli.command).await;
    first_error(result, factory.close().await)
}

/// The command's own error wins; a close failure after it is only logged
fn first_error(result: Result<()>, closed: Result<(), FactoryError>) -> Result<()> {
    match (result, closed) {
        (Err(err), Err(close_err)) => {
            error!(error = %close_err, "failed to close connection pool");
            Err(err)
        }
        (Err(err), Ok(())) => Err(err),
        (Ok(()), closed) => closed.map_err(Into::into),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teardown_error() -> FactoryError {
        FactoryError::Teardown(sqlx::Error::PoolTimedOut)
    }

    #[test]
    fn command_error_wins_over_close_error() {
        let err = first_error(Err(anyhow!("migrate failed")), Err(teardown_error())).unwrap_err();
        assert_eq!(err.to_string(), "migrate failed");
    }

    #[test]
    fn close_error_is_returned_after_success() {
        let err = first_error(Ok(()), Err(teardown_error())).unwrap_err();
        assert!(err.to_string().contains("failed to close connection pool"));
    }

    #[test]
    fn clean_shutdown() {
        assert!(first_error(Ok(()), Ok(())).is_ok());
        assert!(first_error(Err(anyhow!("check failed")), Ok(())).is_err());
    }
}
