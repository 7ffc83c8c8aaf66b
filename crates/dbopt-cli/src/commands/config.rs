//! Config commands

use crate::app::{ConfigAction, ConfigArgs, OutputFormat};
use anyhow::Result;
use dbopt_core::error::exit_codes;
use dbopt_core::AppContext;
use serde::Serialize;

#[derive(Serialize)]
struct ConfigView<'a> {
    host: &'a dbopt_core::AppConfig,
    maintenance: dbopt_core::MaintenanceConfig,
}

pub fn run(args: ConfigArgs, ctx: &AppContext, format: OutputFormat) -> Result<i32> {
    match args.action {
        ConfigAction::Show => {
            let mut host = ctx.config().clone();
            if host.admin_secret.is_some() {
                host.admin_secret = Some("********".to_string());
            }
            if host.notifier.api_key.is_some() {
                host.notifier.api_key = Some("********".to_string());
            }
            let view = ConfigView {
                host: &host,
                maintenance: ctx.db().load_maintenance_config()?,
            };

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
                OutputFormat::Cli => {
                    println!("Config file: {}", dbopt_core::AppConfig::default_path().display());
                    println!("Database:    {}", ctx.config().database_path().display());
                    println!();
                    println!("Maintenance settings:");
                    println!("{}", serde_json::to_string_pretty(&view.maintenance)?);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut settings = ctx.db().load_maintenance_config()?;
            settings.set_field(&key, &value)?;
            ctx.db().save_maintenance_config(&settings)?;
            ctx.logs().info(format!("Setting {key} changed"));
            println!("Set {} = {}", key, value);
        }
    }
    Ok(exit_codes::SUCCESS)
}
