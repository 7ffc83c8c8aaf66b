//! Status command

use crate::app::OutputFormat;
use anyhow::Result;
use dbopt_core::error::exit_codes;
use dbopt_core::{format_size, AppContext, StatusReport};

pub fn run(ctx: &AppContext, format: OutputFormat) -> Result<i32> {
    let status = StatusReport {
        next_run: ctx.scheduler().next_run_time()?,
        stats: ctx.db().get_stats()?,
        log_count: ctx.logs().count()?,
        settings: ctx.db().load_maintenance_config()?,
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        OutputFormat::Cli => {
            let next_run = status
                .next_run
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "not scheduled".to_string());

            println!("Next run:        {}", next_run);
            println!("Database size:   {}", format_size(status.stats.size_bytes));
            println!("Tables:          {}", status.stats.table_count);
            for table in &status.stats.tables {
                println!("  {:<24} {:>8} rows", table.name, table.rows);
            }
            println!("Log entries:     {}", status.log_count);
            println!("Keep logs:       {} days", status.settings.keep_logs_days);
        }
    }
    Ok(exit_codes::SUCCESS)
}
