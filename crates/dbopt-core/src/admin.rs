//! Admin surface
//!
//! Typed request/response layer behind the settings page: every mutating
//! action checks the caller's capability and a per-action nonce before doing
//! anything, and reports its outcome through a short-lived notice read once
//! after the redirect.

use crate::config::MaintenanceConfig;
use crate::db::{Database, DatabaseStats};
use crate::engine::RunResult;
use crate::error::{DbOptError, Result};
use crate::logs::{LogEntry, LogStore};
use crate::scheduler::{RecurringTimer, Scheduler};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Capability required for every admin action
pub const MANAGE_CAPABILITY: &str = "manage_options";

/// Transient holding the pending notice
pub const NOTICE_TRANSIENT: &str = "db_optimizer_notice";

const NOTICE_TTL_SECS: i64 = 60;
const NONCE_TICK_SECS: i64 = 12 * 60 * 60;
const NONCE_LEN: usize = 10;

/// Location of the log view that actions redirect to
pub const LOG_VIEW: &str = "tools.php?page=db-optimizer&tab=logs";
/// Location of the settings view
pub const SETTINGS_VIEW: &str = "tools.php?page=db-optimizer&tab=settings";

/// A mutating admin action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    RunManualOptimization,
    ClearOptimizerLogs,
    SaveSettings,
    SendTestEmail,
}

impl AdminAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AdminAction::RunManualOptimization => "run_manual_optimization",
            AdminAction::ClearOptimizerLogs => "clear_optimizer_logs",
            AdminAction::SaveSettings => "save_settings",
            AdminAction::SendTestEmail => "send_test_email",
        }
    }
}

/// Issues and checks action tokens
///
/// A nonce is bound to the secret, the action and a 12-hour tick; it stays
/// valid for the tick it was issued in and the one after.
#[derive(Clone)]
pub struct NonceIssuer {
    secret: String,
}

impl NonceIssuer {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn tick(now: DateTime<Utc>) -> i64 {
        now.timestamp().div_euclid(NONCE_TICK_SECS)
    }

    fn compute(&self, action: AdminAction, tick: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b"|");
        hasher.update(action.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(tick.to_string().as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        digest[..NONCE_LEN].to_string()
    }

    pub fn issue(&self, action: AdminAction, now: DateTime<Utc>) -> String {
        self.compute(action, Self::tick(now))
    }

    pub fn verify(&self, action: AdminAction, nonce: &str, now: DateTime<Utc>) -> bool {
        let tick = Self::tick(now);
        [tick, tick - 1]
            .into_iter()
            .any(|t| self.compute(action, t) == nonce)
    }
}

/// The authenticated caller
#[derive(Debug, Clone, Default)]
pub struct Principal {
    pub login: String,
    pub capabilities: Vec<String>,
}

impl Principal {
    pub fn new(login: impl Into<String>, capabilities: &[&str]) -> Self {
        Self {
            login: login.into(),
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn can(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

/// An incoming admin request
#[derive(Debug, Clone)]
pub struct AdminRequest {
    pub action: AdminAction,
    pub nonce: String,
    /// New settings, for [`AdminAction::SaveSettings`]
    pub settings: Option<MaintenanceConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// One-time status message shown after a redirect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// Response of a successful action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub location: &'static str,
}

/// Snapshot shown on the status tab
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub next_run: Option<DateTime<Utc>>,
    pub stats: DatabaseStats,
    pub log_count: usize,
    pub settings: MaintenanceConfig,
}

/// One page of the log view
#[derive(Debug, Clone, Serialize)]
pub struct LogPage {
    pub entries: Vec<LogEntry>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
}

impl LogPage {
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.per_page.max(1))
    }
}

/// Admin request handler
pub struct AdminSurface<'a, R: RecurringTimer> {
    db: &'a Database,
    scheduler: Scheduler<'a, R>,
    nonces: NonceIssuer,
}

impl<'a, R: RecurringTimer> AdminSurface<'a, R> {
    pub fn new(db: &'a Database, scheduler: Scheduler<'a, R>, nonces: NonceIssuer) -> Self {
        Self {
            db,
            scheduler,
            nonces,
        }
    }

    pub fn nonces(&self) -> &NonceIssuer {
        &self.nonces
    }

    fn authorize(&self, principal: &Principal, request: &AdminRequest, now: DateTime<Utc>) -> Result<()> {
        if !principal.can(MANAGE_CAPABILITY) {
            tracing::warn!("{} lacks {}", principal.login, MANAGE_CAPABILITY);
            return Err(DbOptError::AccessDenied);
        }
        if !self.nonces.verify(request.action, &request.nonce, now) {
            tracing::warn!("Invalid nonce for {}", request.action.as_str());
            return Err(DbOptError::AccessDenied);
        }
        Ok(())
    }

    /// Handle a mutating action
    ///
    /// Authorization failures return [`DbOptError::AccessDenied`] before
    /// anything is changed or logged.
    pub async fn handle(
        &self,
        principal: &Principal,
        request: AdminRequest,
        now: DateTime<Utc>,
    ) -> Result<Redirect> {
        self.authorize(principal, &request, now)?;

        match request.action {
            AdminAction::RunManualOptimization => {
                let result = self.scheduler.trigger_manual().await;
                self.set_notice(run_notice(&result), now)?;
                Ok(Redirect { location: LOG_VIEW })
            }
            AdminAction::ClearOptimizerLogs => {
                let notice = match LogStore::new(self.db).clear_all() {
                    Ok(_) => Notice {
                        kind: NoticeKind::Success,
                        message: "All logs have been cleared.".to_string(),
                    },
                    Err(e) => Notice {
                        kind: NoticeKind::Error,
                        message: format!("Logs could not be cleared: {e}"),
                    },
                };
                self.set_notice(notice, now)?;
                Ok(Redirect { location: LOG_VIEW })
            }
            AdminAction::SaveSettings => {
                let settings = request.settings.ok_or_else(|| {
                    DbOptError::InvalidInput("save_settings requires settings".to_string())
                })?;
                self.db.save_maintenance_config(&settings)?;
                LogStore::new(self.db).info(format!("Settings updated by {}", principal.login));
                self.set_notice(
                    Notice {
                        kind: NoticeKind::Success,
                        message: "Settings saved.".to_string(),
                    },
                    now,
                )?;
                Ok(Redirect {
                    location: SETTINGS_VIEW,
                })
            }
            AdminAction::SendTestEmail => {
                let notice = match self.scheduler.send_test_notification(now).await {
                    Ok(sent) if sent.fallback_used => Notice {
                        kind: NoticeKind::Success,
                        message: format!(
                            "Test email sent to {} using the fallback transport.",
                            sent.recipient
                        ),
                    },
                    Ok(sent) => Notice {
                        kind: NoticeKind::Success,
                        message: format!("Test email sent to {}.", sent.recipient),
                    },
                    Err(e) => Notice {
                        kind: NoticeKind::Error,
                        message: format!("Test email could not be sent: {e}"),
                    },
                };
                self.set_notice(notice, now)?;
                Ok(Redirect {
                    location: SETTINGS_VIEW,
                })
            }
        }
    }

    fn set_notice(&self, notice: Notice, now: DateTime<Utc>) -> Result<()> {
        let json = serde_json::to_string(&notice)?;
        self.db
            .set_transient(NOTICE_TRANSIENT, &json, NOTICE_TTL_SECS, now.timestamp())
    }

    /// Read and discard the pending notice
    pub fn take_notice(&self, now: DateTime<Utc>) -> Result<Option<Notice>> {
        let Some(json) = self.db.get_transient(NOTICE_TRANSIENT, now.timestamp())? else {
            return Ok(None);
        };
        self.db.delete_transient(NOTICE_TRANSIENT)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    pub fn status(&self) -> Result<StatusReport> {
        Ok(StatusReport {
            next_run: self.scheduler.next_run_time()?,
            stats: self.db.get_stats()?,
            log_count: LogStore::new(self.db).count()?,
            settings: self.db.load_maintenance_config()?,
        })
    }

    /// Page of log entries, newest first; `page` starts at 1
    pub fn log_page(&self, page: usize, per_page: usize) -> Result<LogPage> {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let logs = LogStore::new(self.db);
        Ok(LogPage {
            entries: logs.list(per_page, (page - 1) * per_page)?,
            page,
            per_page,
            total: logs.count()?,
        })
    }
}

fn run_notice(result: &RunResult) -> Notice {
    if result.is_success() {
        Notice {
            kind: NoticeKind::Success,
            message: format!(
                "Database optimization completed: {} tables optimized, {} items removed.",
                result.tables_optimized, result.items_removed
            ),
        }
    } else {
        let reason = result
            .errors
            .first()
            .map(|e| e.to_string())
            .unwrap_or_default();
        Notice {
            kind: NoticeKind::Error,
            message: format!("Database optimization failed: {reason}"),
        }
    }
}
