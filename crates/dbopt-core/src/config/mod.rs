//! Configuration management
//!
//! Two layers:
//! - [`AppConfig`]: host settings (database, prefix, schedule, transports),
//!   a YAML file owned by whoever runs the process
//! - [`MaintenanceConfig`]: per-site maintenance toggles, stored in the CMS
//!   database and edited through the admin surface

mod maintenance;

pub use maintenance::{MaintenanceConfig, StepFailurePolicy, MAINTENANCE_OPTION};

use crate::db::SiteInfo;
use crate::error::Result;
use crate::scheduler::Cadence;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Host configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database of the site (defaults to the data directory)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Prefix shared by the CMS tables
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,

    /// Site identity used when the CMS options are missing
    #[serde(default)]
    pub site: SiteConfig,

    /// Recurrence of scheduled runs
    #[serde(default)]
    pub schedule: Cadence,

    /// Report delivery
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Secret for admin action tokens
    #[serde(default)]
    pub admin_secret: Option<String>,

    /// How long a run may hold the run lock
    #[serde(default = "default_run_timeout")]
    pub run_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            table_prefix: default_table_prefix(),
            site: SiteConfig::default(),
            schedule: Cadence::default(),
            notifier: NotifierConfig::default(),
            admin_secret: None,
            run_timeout_secs: default_run_timeout(),
        }
    }
}

fn default_table_prefix() -> String {
    crate::DEFAULT_TABLE_PREFIX.to_string()
}

fn default_run_timeout() -> u64 {
    300
}

/// Site identity fallbacks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_name")]
    pub name: String,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub admin_email: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            url: String::new(),
            admin_email: String::new(),
        }
    }
}

fn default_site_name() -> String {
    "Site".to_string()
}

impl From<&SiteConfig> for SiteInfo {
    fn from(site: &SiteConfig) -> Self {
        SiteInfo {
            name: site.name.clone(),
            url: site.url.clone(),
            admin_email: site.admin_email.clone(),
        }
    }
}

/// Notification transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// HTTP mail relay endpoint; when unset only the spool is used
    #[serde(default)]
    pub relay_url: Option<String>,

    /// API key for the relay (optional)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Sender address
    #[serde(default = "default_from")]
    pub from: String,

    /// Directory receiving one `.eml` file per undelivered or spooled message
    #[serde(default)]
    pub spool_dir: Option<PathBuf>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            relay_url: std::env::var("DBOPT_RELAY_URL").ok(),
            api_key: std::env::var("DBOPT_RELAY_API_KEY").ok(),
            from: default_from(),
            spool_dir: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl NotifierConfig {
    /// Spool directory (falls back to the data directory)
    pub fn spool_dir(&self) -> PathBuf {
        self.spool_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(crate::DATA_DIR_NAME)
                .join("outbox")
        })
    }
}

fn default_from() -> String {
    "dbopt@localhost".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl AppConfig {
    /// Load config from the default path (or `DBOPT_CONFIG`)
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path())
    }

    /// Load config from a path; a missing file gives defaults
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_yaml::from_str::<AppConfig>(&content)?
        } else {
            AppConfig::default()
        };

        if config.admin_secret.is_none() {
            config.admin_secret = std::env::var("DBOPT_ADMIN_SECRET").ok();
        }
        Ok(config)
    }

    /// Save config to a path
    pub fn save_to(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("DBOPT_CONFIG") {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Database path (`DBOPT_DB` overrides the file setting)
    pub fn database_path(&self) -> PathBuf {
        std::env::var("DBOPT_DB")
            .map(PathBuf::from)
            .ok()
            .or_else(|| self.database_path.clone())
            .unwrap_or_else(crate::Database::default_path)
    }
}
