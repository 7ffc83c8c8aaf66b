//! Optimization engine
//!
//! A run executes the enabled steps in a fixed order against a
//! [`MaintenanceTarget`], logging each action to the [`LogStore`], and
//! finishes with an optional report. A failing statement only costs its own
//! step; anything that escapes the steps aborts the rest of the run and is
//! reported as an orchestration error.

mod result;
mod target;

pub use result::{RunError, RunResult, RunStatus};
pub use target::MaintenanceTarget;

use crate::config::{MaintenanceConfig, StepFailurePolicy};
use crate::db::{CleanupKind, SiteInfo};
use crate::logs::LogStore;
use crate::notify::{build_report, Delivery, Notifier};
use chrono::Utc;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// Maximum expired transients removed by one run
pub const TRANSIENT_BATCH_CEILING: usize = 100;

/// A maintenance step, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    OptimizeTables,
    RepairTables,
    Cleanup(CleanupKind),
    ExpiredTransients,
}

impl Step {
    pub const ALL: [Step; 8] = [
        Step::OptimizeTables,
        Step::RepairTables,
        Step::Cleanup(CleanupKind::PostRevisions),
        Step::Cleanup(CleanupKind::AutoDrafts),
        Step::Cleanup(CleanupKind::TrashedPosts),
        Step::Cleanup(CleanupKind::SpamComments),
        Step::Cleanup(CleanupKind::TrashedComments),
        Step::ExpiredTransients,
    ];

    pub fn is_enabled(self, config: &MaintenanceConfig) -> bool {
        match self {
            Step::OptimizeTables => config.optimize_tables,
            Step::RepairTables => config.repair_tables,
            Step::Cleanup(CleanupKind::PostRevisions) => config.optimize_post_revisions,
            Step::Cleanup(CleanupKind::AutoDrafts) => config.optimize_auto_drafts,
            Step::Cleanup(CleanupKind::TrashedPosts) => config.optimize_trashed_posts,
            Step::Cleanup(CleanupKind::SpamComments) => config.optimize_spam_comments,
            Step::Cleanup(CleanupKind::TrashedComments) => config.optimize_trashed_comments,
            Step::ExpiredTransients => config.optimize_expired_transients,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::OptimizeTables => "table optimization",
            Step::RepairTables => "table repair",
            Step::Cleanup(kind) => kind.label(),
            Step::ExpiredTransients => "expired transients",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Counters accumulated while the steps run
#[derive(Debug, Default)]
struct Tally {
    tables_optimized: usize,
    tables_repaired: usize,
    items_removed: usize,
    step_failures: Vec<RunError>,
}

/// Runs maintenance against one target
pub struct Engine<'a, T: MaintenanceTarget + ?Sized> {
    target: &'a T,
    logs: LogStore<'a>,
    notifier: &'a dyn Notifier,
    site: SiteInfo,
}

impl<'a, T: MaintenanceTarget + ?Sized> Engine<'a, T> {
    pub fn new(target: &'a T, logs: LogStore<'a>, notifier: &'a dyn Notifier, site: SiteInfo) -> Self {
        Self {
            target,
            logs,
            notifier,
            site,
        }
    }

    /// Execute one run with the given settings
    pub async fn run(&self, config: &MaintenanceConfig) -> RunResult {
        let started = Instant::now();
        self.logs.info("Database optimization started");

        let mut tally = Tally::default();
        let mut errors = Vec::new();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_steps(config, &mut tally)));
        let aborted = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(payload) => Some(RunError::Orchestration(panic_message(payload.as_ref()))),
        };
        if let Some(error) = aborted {
            self.logs.error(error.to_string());
            errors.push(error);
        }

        if config.step_failure_policy == StepFailurePolicy::Escalate {
            errors.append(&mut tally.step_failures);
        }

        let status = if errors.is_empty() {
            RunStatus::Success
        } else {
            RunStatus::Error
        };

        let result = RunResult {
            status,
            tables_optimized: tally.tables_optimized,
            tables_repaired: tally.tables_repaired,
            items_removed: tally.items_removed,
            errors,
            execution_time: started.elapsed(),
        };

        self.logs.info(format!(
            "Database optimization finished in {:.2} seconds: {} tables optimized, {} tables repaired, {} items removed",
            result.execution_secs(),
            result.tables_optimized,
            result.tables_repaired,
            result.items_removed
        ));

        if config.send_notification {
            self.notify(config, &result).await;
        }

        result
    }

    fn run_steps(&self, config: &MaintenanceConfig, tally: &mut Tally) -> Result<(), RunError> {
        for step in Step::ALL {
            if !step.is_enabled(config) {
                continue;
            }
            match step {
                Step::OptimizeTables => self.optimize_tables(tally)?,
                Step::RepairTables => self.repair_tables(tally)?,
                Step::Cleanup(kind) => self.cleanup(kind, tally),
                Step::ExpiredTransients => self.expired_transients(tally),
            }
        }
        Ok(())
    }

    fn tables(&self) -> Result<Vec<String>, RunError> {
        self.target
            .list_tables()
            .map_err(|e| RunError::Orchestration(format!("could not list tables: {e}")))
    }

    fn optimize_tables(&self, tally: &mut Tally) -> Result<(), RunError> {
        for table in self.tables()? {
            match self.target.optimize_table(&table) {
                Ok(()) => {
                    tally.tables_optimized += 1;
                    self.logs.info(format!("Optimized table {table}"));
                }
                Err(e) => self.step_failed(tally, Step::OptimizeTables, format!("{table}: {e}")),
            }
        }
        Ok(())
    }

    fn repair_tables(&self, tally: &mut Tally) -> Result<(), RunError> {
        for table in self.tables()? {
            match self.target.repair_table(&table) {
                Ok(()) => {
                    tally.tables_repaired += 1;
                    self.logs.info(format!("Repaired table {table}"));
                }
                Err(e) => self.step_failed(tally, Step::RepairTables, format!("{table}: {e}")),
            }
        }
        Ok(())
    }

    fn cleanup(&self, kind: CleanupKind, tally: &mut Tally) {
        let limit = kind.batch_ceiling();
        match self.target.delete_batch(kind, limit) {
            Ok(removed) => {
                let removed = removed.min(limit);
                tally.items_removed += removed;
                self.logs.info(format!("Removed {removed} {}", kind.label()));
            }
            Err(e) => self.step_failed(tally, Step::Cleanup(kind), e.to_string()),
        }
    }

    fn expired_transients(&self, tally: &mut Tally) {
        let now = Utc::now().timestamp();
        let names = match self.target.expired_transients(now, TRANSIENT_BATCH_CEILING) {
            Ok(names) => names,
            Err(e) => {
                self.step_failed(tally, Step::ExpiredTransients, e.to_string());
                return;
            }
        };

        let mut removed = 0;
        for name in names.iter().take(TRANSIENT_BATCH_CEILING) {
            match self.target.delete_transient(name) {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => self.step_failed(tally, Step::ExpiredTransients, format!("{name}: {e}")),
            }
        }

        tally.items_removed += removed;
        self.logs.info(format!("Removed {removed} expired transients"));
    }

    fn step_failed(&self, tally: &mut Tally, step: Step, message: String) {
        let error = RunError::Step { step, message };
        self.logs.error(error.to_string());
        tally.step_failures.push(error);
    }

    async fn notify(&self, config: &MaintenanceConfig, result: &RunResult) {
        let recipient = config.recipient(&self.site.admin_email).to_string();
        if recipient.is_empty() {
            self.logs
                .warning("No notification recipient configured; report not sent");
            return;
        }

        let stats = match self.target.stats() {
            Ok(stats) => Some(stats),
            Err(e) => {
                tracing::warn!("Could not collect database stats for report: {}", e);
                None
            }
        };
        let message = build_report(result, &self.site, &recipient, stats.as_ref(), Utc::now());

        self.logs.info(format!(
            "Sending notification to {recipient} via {}",
            self.notifier.transport_name()
        ));

        match self.notifier.send(&message).await {
            Ok(Delivery::Primary) => {
                self.logs.info(format!("Notification sent to {recipient}"));
            }
            Ok(Delivery::Fallback { primary_error }) => {
                self.logs.warning(format!(
                    "Primary transport failed ({primary_error}); notification to {recipient} sent via fallback"
                ));
            }
            Err(e) => {
                let error = RunError::Notification {
                    recipient,
                    message: e.to_string(),
                };
                self.logs.error(error.to_string());
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected panic".to_string()
    }
}
