//! Scheduling and run entry points
//!
//! The [`Scheduler`] owns the lifecycle of the recurring optimization hook
//! and is the only way a run starts: scheduled (from [`Scheduler::tick`]) or
//! manual (from the admin surface or CLI). Both paths load the maintenance
//! config, take the run lock and hand over to the engine.

mod cadence;
mod cron;
mod lock;

pub use cadence::Cadence;
pub use cron::CronTable;
pub use lock::{RunLock, RUN_LOCK};

use crate::config::MaintenanceConfig;
use crate::db::{Database, SiteInfo};
use crate::engine::{Engine, RunError, RunResult};
use crate::error::{DbOptError, Result};
use crate::logs::LogStore;
use crate::notify::{build_test_message, Delivery, Notifier, TestNotification};
use chrono::{DateTime, Utc};

/// Hook name of the recurring optimization
pub const OPTIMIZE_HOOK: &str = "db_optimizer_monthly_event";

/// Longest a run lock may be held before it counts as stale
pub const MAX_RUN_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// A persistent timer that fires named hooks on a cadence
pub trait RecurringTimer {
    /// Register (or replace) a hook
    fn register_recurring(&self, hook: &str, first_run: DateTime<Utc>, cadence: Cadence) -> Result<()>;

    /// Remove a hook, returning whether it existed
    fn cancel_recurring(&self, hook: &str) -> Result<bool>;

    fn next_run(&self, hook: &str) -> Result<Option<DateTime<Utc>>>;

    /// Hooks due at `now`; each is re-armed to its next occurrence
    fn take_due(&self, now: DateTime<Utc>) -> Result<Vec<String>>;
}

/// Schedules runs and executes them
pub struct Scheduler<'a, R: RecurringTimer = CronTable<'a>> {
    db: &'a Database,
    timer: R,
    notifier: &'a dyn Notifier,
    site: SiteInfo,
    cadence: Cadence,
    run_timeout_secs: u64,
}

impl<'a> Scheduler<'a, CronTable<'a>> {
    /// Scheduler using the database-backed timer
    pub fn new(db: &'a Database, notifier: &'a dyn Notifier, site: SiteInfo) -> Self {
        Self::with_timer(db, CronTable::new(db), notifier, site)
    }
}

impl<'a, R: RecurringTimer> Scheduler<'a, R> {
    pub fn with_timer(db: &'a Database, timer: R, notifier: &'a dyn Notifier, site: SiteInfo) -> Self {
        Self {
            db,
            timer,
            notifier,
            site,
            cadence: Cadence::default(),
            run_timeout_secs: 300,
        }
    }

    pub fn cadence(mut self, cadence: Cadence) -> Self {
        self.cadence = cadence;
        self
    }

    /// Lock TTL for a run, capped at [`MAX_RUN_TIMEOUT_SECS`]
    pub fn run_timeout(mut self, secs: u64) -> Self {
        self.run_timeout_secs = secs.min(MAX_RUN_TIMEOUT_SECS);
        self
    }

    fn logs(&self) -> LogStore<'a> {
        LogStore::new(self.db)
    }

    /// Register the recurring hook unless it already exists
    ///
    /// Returns the next run instant, existing or new.
    pub fn schedule(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        if let Some(existing) = self.timer.next_run(OPTIMIZE_HOOK)? {
            return Ok(existing);
        }

        let first = self.cadence.next_after(now);
        self.timer
            .register_recurring(OPTIMIZE_HOOK, first, self.cadence)?;
        self.logs().info(format!(
            "Scheduled database optimization, next run at {}",
            first.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        Ok(first)
    }

    /// Remove the recurring hook; returns whether one was registered
    pub fn unschedule(&self) -> Result<bool> {
        let removed = self.timer.cancel_recurring(OPTIMIZE_HOOK)?;
        if removed {
            self.logs().info("Scheduled database optimization removed");
        }
        Ok(removed)
    }

    pub fn next_run_time(&self) -> Result<Option<DateTime<Utc>>> {
        self.timer.next_run(OPTIMIZE_HOOK)
    }

    /// Run triggered by the timer, followed by log retention
    pub async fn trigger_scheduled(&self) -> RunResult {
        self.logs().info("Scheduled optimization triggered");
        let (result, config) = self.execute("Scheduled").await;

        if let Some(config) = config {
            if let Err(e) = self.logs().prune_older_than(config.keep_logs_days) {
                self.logs().error(format!("Log cleanup failed: {e}"));
            }
        }
        result
    }

    /// Run requested by an operator
    pub async fn trigger_manual(&self) -> RunResult {
        self.logs().info("Manual optimization triggered");
        self.execute("Manual").await.0
    }

    /// Send a test message to the report recipient
    ///
    /// Goes through the same transport stack as run reports, regardless of
    /// whether reports are enabled. Every outcome is logged.
    pub async fn send_test_notification(&self, now: DateTime<Utc>) -> Result<TestNotification> {
        let config = self.db.load_maintenance_config()?;
        let site = self.db.site_info(&self.site);
        let recipient = config.recipient(&site.admin_email).to_string();
        if recipient.is_empty() {
            return Err(DbOptError::InvalidInput(
                "no notification recipient configured".to_string(),
            ));
        }

        let logs = self.logs();
        let transport = self.notifier.transport_name().to_string();
        logs.info(format!("Sending test notification to {recipient} via {transport}"));

        let message = build_test_message(&site, &recipient, now);
        let fallback_used = match self.notifier.send(&message).await {
            Ok(Delivery::Primary) => {
                logs.info(format!("Test notification sent via {transport}"));
                false
            }
            Ok(Delivery::Fallback { primary_error }) => {
                logs.warning(format!(
                    "{transport} failed ({primary_error}); test notification sent via fallback"
                ));
                true
            }
            Err(e) => {
                logs.error(format!("Test notification to {recipient} failed: {e}"));
                return Err(e);
            }
        };

        Ok(TestNotification {
            recipient,
            transport,
            fallback_used,
        })
    }

    /// Dispatch every hook due at `now`
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<Vec<RunResult>> {
        let mut results = Vec::new();
        for hook in self.timer.take_due(now)? {
            if hook == OPTIMIZE_HOOK {
                results.push(self.trigger_scheduled().await);
            } else {
                tracing::warn!("No handler for timer hook {}", hook);
            }
        }
        Ok(results)
    }

    async fn execute(&self, trigger: &str) -> (RunResult, Option<MaintenanceConfig>) {
        let logs = self.logs();

        let config = match self.db.load_maintenance_config() {
            Ok(config) => config,
            Err(e) => {
                let error = RunError::Config(e.to_string());
                logs.error(error.to_string());
                return (RunResult::rejected(error), None);
            }
        };

        let lock = match RunLock::acquire(self.db, self.run_timeout_secs, Utc::now().timestamp()) {
            Ok(Some(lock)) => lock,
            Ok(None) => {
                logs.warning("Optimization skipped: another run is in progress");
                return (RunResult::rejected(RunError::Busy), Some(config));
            }
            Err(e) => {
                let error = RunError::Orchestration(format!("could not take run lock: {e}"));
                logs.error(error.to_string());
                return (RunResult::rejected(error), Some(config));
            }
        };

        let site = self.db.site_info(&self.site);
        let engine = Engine::new(self.db, logs, self.notifier, site);
        let result = engine.run(&config).await;
        drop(lock);

        if result.is_success() {
            logs.info(format!("{trigger} optimization completed successfully"));
        } else {
            logs.warning(format!(
                "{trigger} optimization completed with {} error(s)",
                result.errors.len()
            ));
        }

        (result, Some(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAINTENANCE_OPTION;
    use crate::engine::RunStatus;
    use crate::notify::testing::RecordingNotifier;
    use crate::test_support::{cms_db, insert_comments};
    use chrono::{Duration, TimeZone};

    fn site() -> SiteInfo {
        SiteInfo {
            name: "Blog".to_string(),
            url: String::new(),
            admin_email: "admin@example.com".to_string(),
        }
    }

    fn quiet_config(db: &Database) {
        let config = MaintenanceConfig {
            send_notification: false,
            ..MaintenanceConfig::default()
        };
        db.save_maintenance_config(&config).unwrap();
    }

    #[test]
    fn test_schedule_is_idempotent() {
        let db = cms_db();
        let notifier = RecordingNotifier::ok("spool");
        let scheduler = Scheduler::new(&db, &notifier, site());
        let now = Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap();

        let first = Utc.with_ymd_and_hms(2025, 4, 1, 1, 0, 0).unwrap();

        assert_eq!(scheduler.schedule(now).unwrap(), first);
        // A later activation keeps the existing entry
        assert_eq!(scheduler.schedule(now + Duration::days(1)).unwrap(), first);
        assert_eq!(scheduler.next_run_time().unwrap(), Some(first));

        assert!(scheduler.unschedule().unwrap());
        assert!(!scheduler.unschedule().unwrap());
        assert_eq!(scheduler.next_run_time().unwrap(), None);
    }

    #[tokio::test]
    async fn test_tick_runs_due_hook() {
        let db = cms_db();
        quiet_config(&db);
        insert_comments(&db, "spam", 4);
        let notifier = RecordingNotifier::ok("spool");
        let scheduler = Scheduler::new(&db, &notifier, site()).cadence(Cadence::Every { secs: 60 });
        let now = Utc::now();
        scheduler.schedule(now - Duration::seconds(120)).unwrap();

        let results = scheduler.tick(now).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].items_removed, 4);
        assert!(scheduler.next_run_time().unwrap().unwrap() > now);

        assert!(scheduler.tick(now).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_busy_lock_rejects_run() {
        let db = cms_db();
        quiet_config(&db);
        let notifier = RecordingNotifier::ok("spool");
        let scheduler = Scheduler::new(&db, &notifier, site());

        let _held = RunLock::acquire(&db, 300, Utc::now().timestamp())
            .unwrap()
            .unwrap();
        let result = scheduler.trigger_manual().await;
        assert_eq!(result.status, RunStatus::Error);
        assert_eq!(result.errors, vec![RunError::Busy]);
        assert_eq!(result.tables_optimized, 0);
    }

    #[tokio::test]
    async fn test_lock_released_after_run() {
        let db = cms_db();
        quiet_config(&db);
        let notifier = RecordingNotifier::ok("spool");
        let scheduler = Scheduler::new(&db, &notifier, site());

        assert!(scheduler.trigger_manual().await.is_success());
        assert!(!RunLock::is_held(&db, Utc::now().timestamp()).unwrap());
        assert!(scheduler.trigger_manual().await.is_success());
    }

    #[tokio::test]
    async fn test_unreadable_config_rejects_run() {
        let db = cms_db();
        db.set_option(MAINTENANCE_OPTION, "{not json").unwrap();
        let notifier = RecordingNotifier::ok("spool");
        let scheduler = Scheduler::new(&db, &notifier, site());

        let result = scheduler.trigger_manual().await;
        assert_eq!(result.status, RunStatus::Error);
        assert!(matches!(result.errors[0], RunError::Config(_)));
        assert_eq!(notifier.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_scheduled_run_prunes_logs() {
        let db = cms_db();
        quiet_config(&db);
        LogStore::new(&db)
            .append_at(Utc::now() - Duration::days(90), "ancient", crate::logs::Severity::Info)
            .unwrap();
        let notifier = RecordingNotifier::ok("spool");
        let scheduler = Scheduler::new(&db, &notifier, site());

        scheduler.trigger_scheduled().await;

        let messages: Vec<String> = LogStore::new(&db)
            .list(100, 0)
            .unwrap()
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert!(!messages.contains(&"ancient".to_string()));
        assert_eq!(messages[0], "Log cleanup: 1 log entries removed");
    }

    #[tokio::test]
    async fn test_scheduled_run_with_huge_retention_keeps_logs() {
        let db = cms_db();
        let config = MaintenanceConfig {
            send_notification: false,
            keep_logs_days: 100_000_000,
            ..MaintenanceConfig::default()
        };
        db.save_maintenance_config(&config).unwrap();
        LogStore::new(&db)
            .append_at(Utc::now() - Duration::days(90), "ancient", crate::logs::Severity::Info)
            .unwrap();
        let notifier = RecordingNotifier::ok("spool");
        let scheduler = Scheduler::new(&db, &notifier, site());

        assert!(scheduler.trigger_scheduled().await.is_success());

        let messages: Vec<String> = LogStore::new(&db)
            .list(100, 0)
            .unwrap()
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert!(messages.contains(&"ancient".to_string()));
        assert_eq!(messages[0], "Log cleanup: 0 log entries removed");
    }

    #[tokio::test]
    async fn test_oversized_run_timeout_is_capped() {
        let db = cms_db();
        quiet_config(&db);
        let notifier = RecordingNotifier::ok("spool");
        let scheduler = Scheduler::new(&db, &notifier, site()).run_timeout(u64::MAX);
        assert_eq!(scheduler.run_timeout_secs, MAX_RUN_TIMEOUT_SECS);

        assert!(scheduler.trigger_manual().await.is_success());
    }

    fn latest_message(db: &Database) -> String {
        LogStore::new(db).list(1, 0).unwrap().remove(0).message
    }

    #[tokio::test]
    async fn test_send_test_notification_via_primary() {
        let db = cms_db();
        db.save_maintenance_config(&MaintenanceConfig {
            send_notification: false,
            notification_email: "ops@example.com".to_string(),
            ..MaintenanceConfig::default()
        })
        .unwrap();
        let notifier = RecordingNotifier::ok("relay");
        let scheduler = Scheduler::new(&db, &notifier, site());

        let sent = scheduler.send_test_notification(Utc::now()).await.unwrap();
        assert_eq!(sent.recipient, "ops@example.com");
        assert_eq!(sent.transport, "relay");
        assert!(!sent.fallback_used);

        let messages = notifier.sent.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].subject, "Test Notification - Blog");
        drop(messages);
        assert_eq!(latest_message(&db), "Test notification sent via relay");
    }

    #[tokio::test]
    async fn test_send_test_notification_via_fallback() {
        let db = cms_db();
        let notifier = crate::notify::FallbackNotifier::new(
            Box::new(RecordingNotifier::failing("relay")),
            Box::new(RecordingNotifier::ok("spool")),
        );
        let scheduler = Scheduler::new(&db, &notifier, site());

        let sent = scheduler.send_test_notification(Utc::now()).await.unwrap();
        assert_eq!(sent.recipient, "admin@example.com");
        assert!(sent.fallback_used);

        let entry = LogStore::new(&db).list(1, 0).unwrap().remove(0);
        assert_eq!(entry.severity, crate::logs::Severity::Warning);
        assert!(entry.message.contains("test notification sent via fallback"));
    }

    #[tokio::test]
    async fn test_send_test_notification_all_transports_fail() {
        let db = cms_db();
        let notifier = crate::notify::FallbackNotifier::new(
            Box::new(RecordingNotifier::failing("relay")),
            Box::new(RecordingNotifier::failing("spool")),
        );
        let scheduler = Scheduler::new(&db, &notifier, site());

        let err = scheduler.send_test_notification(Utc::now()).await.unwrap_err();
        assert!(matches!(err, DbOptError::Notification(_)));

        let entry = LogStore::new(&db).list(1, 0).unwrap().remove(0);
        assert_eq!(entry.severity, crate::logs::Severity::Error);
        assert!(entry.message.starts_with("Test notification to admin@example.com failed"));
    }

    #[tokio::test]
    async fn test_send_test_notification_without_recipient() {
        let db = cms_db();
        let notifier = RecordingNotifier::ok("relay");
        let scheduler = Scheduler::new(&db, &notifier, SiteInfo::default());

        let err = scheduler.send_test_notification(Utc::now()).await.unwrap_err();
        assert!(matches!(err, DbOptError::InvalidInput(_)));
        assert_eq!(notifier.sent_count(), 0);
    }
}
