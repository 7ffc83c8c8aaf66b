//! Application context
//!
//! Built once at startup. Owns the database handle, host config and
//! notifier, and hands out the borrowed views everything else works through.

use crate::admin::{AdminSurface, NonceIssuer};
use crate::config::AppConfig;
use crate::db::{Database, SiteInfo};
use crate::engine::Engine;
use crate::error::{DbOptError, Result};
use crate::logs::LogStore;
use crate::notify::{self, Notifier};
use crate::scheduler::{CronTable, Scheduler};
use chrono::{DateTime, Utc};

pub struct AppContext {
    db: Database,
    config: AppConfig,
    notifier: Box<dyn Notifier>,
}

impl AppContext {
    /// Open the configured database and build the notifier stack
    pub fn open(config: AppConfig) -> Result<Self> {
        let path = config.database_path();
        tracing::debug!("Opening database at {}", path.display());
        let db = Database::open(&path)?;
        let notifier = notify::from_config(&config.notifier)?;
        Self::from_parts(db, config, notifier)
    }

    /// Assemble a context from already-built parts
    pub fn from_parts(db: Database, config: AppConfig, notifier: Box<dyn Notifier>) -> Result<Self> {
        let db = db.with_prefix(config.table_prefix.clone());
        db.initialize()?;
        Ok(Self {
            db,
            config,
            notifier,
        })
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    pub fn logs(&self) -> LogStore<'_> {
        LogStore::new(&self.db)
    }

    /// Site identity from the CMS options, with host-config fallbacks
    pub fn site(&self) -> SiteInfo {
        self.db.site_info(&SiteInfo::from(&self.config.site))
    }

    pub fn engine(&self) -> Engine<'_, Database> {
        Engine::new(&self.db, self.logs(), self.notifier(), self.site())
    }

    pub fn scheduler(&self) -> Scheduler<'_> {
        Scheduler::new(&self.db, self.notifier(), SiteInfo::from(&self.config.site))
            .cadence(self.config.schedule)
            .run_timeout(self.config.run_timeout_secs)
    }

    /// Admin surface; requires an admin secret
    pub fn admin(&self) -> Result<AdminSurface<'_, CronTable<'_>>> {
        let secret = self
            .config
            .admin_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                DbOptError::Config(
                    "admin_secret is not set (config file or DBOPT_ADMIN_SECRET)".to_string(),
                )
            })?;
        Ok(AdminSurface::new(
            &self.db,
            self.scheduler(),
            NonceIssuer::new(secret),
        ))
    }

    /// Activation: register the recurring run
    pub fn on_start(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        self.scheduler().schedule(now)
    }

    /// Deactivation: cancel the recurring run
    pub fn on_stop(&self) -> Result<bool> {
        self.scheduler().unschedule()
    }
}
