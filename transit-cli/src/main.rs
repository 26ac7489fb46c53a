mod cli;
mod commands;
mod error;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use error::Result;
use std::path::Path;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use transit_auth::{try_load_default_config, AuthConfig};

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {}", "Error:".red(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| log_level.into()))
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Inspect { source } => commands::handle_inspect_command(source, &config, cli.json),
        Commands::Check {
            source,
            kind,
            all,
            any,
            item,
        } => commands::handle_check_command(source, kind, item, any, all, &config, cli.json),
        Commands::Guard {
            source,
            permission,
            any_permission,
            fallback_path,
        } => commands::handle_guard_command(
            source,
            permission,
            any_permission,
            fallback_path,
            &config,
            cli.json,
        ),
    }
}

fn load_config(path: Option<&Path>) -> Result<AuthConfig> {
    debug!(?path, "loading configuration");
    match path {
        Some(path) if path.extension().is_some_and(|ext| ext == "toml") => {
            Ok(AuthConfig::from_toml(path)?)
        }
        Some(path) => Ok(AuthConfig::from_file(path)?),
        None => Ok(try_load_default_config().unwrap_or_default()),
    }
}
