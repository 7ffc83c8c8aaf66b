//! Log commands

use crate::app::{LogsAction, LogsArgs, OutputFormat};
use crate::output::print_log_entries;
use anyhow::Result;
use dbopt_core::error::exit_codes;
use dbopt_core::AppContext;

pub fn run(args: LogsArgs, ctx: &AppContext, format: OutputFormat) -> Result<i32> {
    let logs = ctx.logs();

    match args.action {
        LogsAction::List { page, limit } => {
            let limit = limit.max(1);
            let page = page.max(1);
            let entries = logs.list(limit, (page - 1) * limit)?;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&entries)?);
                }
                OutputFormat::Cli => {
                    if entries.is_empty() {
                        println!("No log entries");
                    } else {
                        print_log_entries(&entries)?;
                        let total = logs.count()?;
                        println!(
                            "\nPage {} of {} ({} entries)",
                            page,
                            total.div_ceil(limit).max(1),
                            total
                        );
                    }
                }
            }
        }
        LogsAction::Clear => {
            let removed = logs.clear_all()?;
            println!("Cleared {} log entries", removed);
        }
        LogsAction::Prune { days } => {
            let days = match days {
                Some(days) => days,
                None => ctx.db().load_maintenance_config()?.keep_logs_days,
            };
            if days == 0 {
                println!("Log retention disabled (keep_logs_days = 0)");
            } else {
                let removed = logs.prune_older_than(days)?;
                println!("Removed {} log entries older than {} days", removed, days);
            }
        }
    }

    Ok(exit_codes::SUCCESS)
}
