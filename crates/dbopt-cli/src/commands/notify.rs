//! Notification commands

use crate::app::{NotifyAction, NotifyArgs, OutputFormat};
use anyhow::Result;
use chrono::Utc;
use dbopt_core::error::exit_codes;
use dbopt_core::AppContext;

pub async fn run(args: NotifyArgs, ctx: &AppContext, format: OutputFormat) -> Result<i32> {
    match args.action {
        NotifyAction::Test => {
            let sent = ctx.scheduler().send_test_notification(Utc::now()).await?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&sent)?),
                OutputFormat::Cli => {
                    if sent.fallback_used {
                        println!(
                            "Test message sent to {} using the fallback transport ({} failed)",
                            sent.recipient, sent.transport
                        );
                    } else {
                        println!("Test message sent to {} via {}", sent.recipient, sent.transport);
                    }
                }
            }
        }
    }
    Ok(exit_codes::SUCCESS)
}
