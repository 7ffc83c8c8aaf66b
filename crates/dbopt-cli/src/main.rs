//! dbopt CLI
//!
//! Scheduled cleanup and optimization for CMS databases.

use anyhow::Result;
use clap::Parser;
use dbopt_core::error::exit_codes;
use dbopt_core::{AppConfig, AppContext, DbOptError};

mod app;
mod commands;
mod output;

use app::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            e.downcast_ref::<DbOptError>()
                .map(DbOptError::exit_code)
                .unwrap_or(exit_codes::GENERAL_ERROR)
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    let config = AppConfig::load()?;
    let ctx = AppContext::open(config)?;

    match cli.command {
        Commands::Run => commands::run::run(&ctx, cli.format).await,
        Commands::Activate => commands::schedule::activate(&ctx, cli.format),
        Commands::Deactivate => commands::schedule::deactivate(&ctx, cli.format),
        Commands::Tick => commands::schedule::tick(&ctx, cli.format).await,
        Commands::Daemon(args) => commands::schedule::daemon(&ctx, args, cli.format).await,
        Commands::Logs(args) => commands::logs::run(args, &ctx, cli.format),
        Commands::Status => commands::status::run(&ctx, cli.format),
        Commands::Config(args) => commands::config::run(args, &ctx, cli.format),
        Commands::Notify(args) => commands::notify::run(args, &ctx, cli.format).await,
    }
}
