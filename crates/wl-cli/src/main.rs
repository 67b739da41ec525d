use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wl_cli::commands::{groups, import, people, report, stats};
use wl_cli::{Cli, Commands, Config};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(wl_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = wl_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // try_init: tests may have installed a subscriber already
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match &cli.command {
        Some(Commands::Groups) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            groups::run(&db)?;
        }
        Some(Commands::People { group }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            people::run(&db, group)?;
        }
        Some(Commands::Report {
            selection,
            granularity,
            json,
        }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let granularity = granularity.unwrap_or(config.default_granularity);
            report::run(&db, selection, granularity, *json)?;
        }
        Some(Commands::Stats { selection, json }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            stats::run(&db, selection, *json)?;
        }
        Some(Commands::Import) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            import::run(&mut db)?;
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
