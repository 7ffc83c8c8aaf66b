//! Schedule lifecycle and timer commands

use crate::app::{DaemonArgs, OutputFormat};
use crate::output::print_run_result;
use anyhow::Result;
use chrono::{DateTime, Utc};
use dbopt_core::error::exit_codes;
use dbopt_core::AppContext;
use std::time::Duration;

fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub fn activate(ctx: &AppContext, format: OutputFormat) -> Result<i32> {
    let next = ctx.on_start(Utc::now())?;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "next_run": next }));
        }
        OutputFormat::Cli => {
            println!("Scheduled next run: {}", format_time(next));
        }
    }
    Ok(exit_codes::SUCCESS)
}

pub fn deactivate(ctx: &AppContext, format: OutputFormat) -> Result<i32> {
    let removed = ctx.on_stop()?;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "removed": removed }));
        }
        OutputFormat::Cli => {
            if removed {
                println!("Schedule removed");
            } else {
                println!("No schedule was registered");
            }
        }
    }
    Ok(exit_codes::SUCCESS)
}

pub async fn tick(ctx: &AppContext, format: OutputFormat) -> Result<i32> {
    let results = ctx.scheduler().tick(Utc::now()).await?;

    if results.is_empty() && format == OutputFormat::Cli {
        println!("Nothing due");
    }
    for result in &results {
        print_run_result(result, format)?;
    }

    Ok(if results.iter().all(|r| r.is_success()) {
        exit_codes::SUCCESS
    } else {
        exit_codes::RUN_FAILED
    })
}

pub async fn daemon(ctx: &AppContext, args: DaemonArgs, format: OutputFormat) -> Result<i32> {
    let next = ctx.on_start(Utc::now())?;
    tracing::info!("Daemon started, next run at {}", format_time(next));

    let scheduler = ctx.scheduler();
    let mut interval = tokio::time::interval(Duration::from_secs(args.interval.max(1)));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match scheduler.tick(Utc::now()).await {
                    Ok(results) => {
                        for result in &results {
                            print_run_result(result, format)?;
                        }
                    }
                    Err(e) => tracing::error!("Timer check failed: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received shutdown signal");
                break;
            }
        }
    }

    Ok(exit_codes::SUCCESS)
}
