//! Per-site maintenance settings stored in the CMS options table

use crate::db::Database;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Option name holding the serialized [`MaintenanceConfig`]
pub const MAINTENANCE_OPTION: &str = "db_optimizer_options";

/// How a failed maintenance step affects the overall run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepFailurePolicy {
    /// Failed steps are logged and counted as zero; status stays `success`
    #[default]
    Isolate,
    /// Failed steps are also reported in `RunResult::errors` and mark the run as `error`
    Escalate,
}

/// Which maintenance steps run, and how results are reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    pub optimize_tables: bool,
    pub repair_tables: bool,
    pub optimize_post_revisions: bool,
    pub optimize_auto_drafts: bool,
    pub optimize_trashed_posts: bool,
    pub optimize_spam_comments: bool,
    pub optimize_trashed_comments: bool,
    pub optimize_expired_transients: bool,

    /// Send a report after every run
    pub send_notification: bool,

    /// Report recipient; empty means the site admin address
    pub notification_email: String,

    /// Days of log history to keep; 0 keeps logs forever
    pub keep_logs_days: u32,

    pub step_failure_policy: StepFailurePolicy,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            optimize_tables: true,
            repair_tables: true,
            optimize_post_revisions: true,
            optimize_auto_drafts: true,
            optimize_trashed_posts: true,
            optimize_spam_comments: true,
            optimize_trashed_comments: true,
            optimize_expired_transients: true,
            send_notification: true,
            notification_email: String::new(),
            keep_logs_days: 30,
            step_failure_policy: StepFailurePolicy::Isolate,
        }
    }
}

impl MaintenanceConfig {
    /// Every step disabled, no notification
    pub fn none() -> Self {
        Self {
            optimize_tables: false,
            repair_tables: false,
            optimize_post_revisions: false,
            optimize_auto_drafts: false,
            optimize_trashed_posts: false,
            optimize_spam_comments: false,
            optimize_trashed_comments: false,
            optimize_expired_transients: false,
            send_notification: false,
            ..Self::default()
        }
    }

    /// Recipient for the run report
    pub fn recipient<'a>(&'a self, admin_email: &'a str) -> &'a str {
        let configured = self.notification_email.trim();
        if configured.is_empty() {
            admin_email
        } else {
            configured
        }
    }

    /// Set a field from its name and a string value (used by `config set`)
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<()> {
        let parse_bool = |v: &str| -> Result<bool> {
            match v {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(crate::DbOptError::InvalidInput(format!(
                    "Expected a boolean for {key}, got {v}"
                ))),
            }
        };

        match key {
            "optimize_tables" => self.optimize_tables = parse_bool(value)?,
            "repair_tables" => self.repair_tables = parse_bool(value)?,
            "optimize_post_revisions" => self.optimize_post_revisions = parse_bool(value)?,
            "optimize_auto_drafts" => self.optimize_auto_drafts = parse_bool(value)?,
            "optimize_trashed_posts" => self.optimize_trashed_posts = parse_bool(value)?,
            "optimize_spam_comments" => self.optimize_spam_comments = parse_bool(value)?,
            "optimize_trashed_comments" => self.optimize_trashed_comments = parse_bool(value)?,
            "optimize_expired_transients" => {
                self.optimize_expired_transients = parse_bool(value)?
            }
            "send_notification" => self.send_notification = parse_bool(value)?,
            "notification_email" => self.notification_email = value.trim().to_string(),
            "keep_logs_days" => {
                self.keep_logs_days = value.parse().map_err(|_| {
                    crate::DbOptError::InvalidInput(format!(
                        "keep_logs_days must be a non-negative integer, got {value}"
                    ))
                })?
            }
            "step_failure_policy" => {
                self.step_failure_policy = serde_json::from_value(serde_json::Value::String(
                    value.to_string(),
                ))
                .map_err(|_| {
                    crate::DbOptError::InvalidInput(format!(
                        "step_failure_policy must be isolate or escalate, got {value}"
                    ))
                })?
            }
            other => {
                return Err(crate::DbOptError::InvalidInput(format!(
                    "Unknown setting: {other}"
                )))
            }
        }
        Ok(())
    }
}

impl Database {
    /// Load the maintenance config, falling back to defaults when none is stored
    pub fn load_maintenance_config(&self) -> Result<MaintenanceConfig> {
        match self.get_option(MAINTENANCE_OPTION)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(MaintenanceConfig::default()),
        }
    }

    /// Persist the maintenance config
    pub fn save_maintenance_config(&self, config: &MaintenanceConfig) -> Result<()> {
        let json = serde_json::to_string(config)?;
        self.set_option(MAINTENANCE_OPTION, &json)
    }
}
