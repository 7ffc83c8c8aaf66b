//! dbopt Core Library
//!
//! Scheduled maintenance for CMS databases.
//!
//! # Features
//! - Ordered, fault-isolated maintenance runs (optimize, repair, bounded cleanup)
//! - Persistent recurring timer with monthly or fixed-interval cadence
//! - Append-only audit log with retention pruning
//! - Run reports over an HTTP relay with a local spool fallback
//! - Nonce-protected admin actions

pub mod admin;
pub mod config;
pub mod context;
pub mod db;
pub mod engine;
pub mod error;
pub mod logs;
pub mod notify;
pub mod scheduler;

#[cfg(test)]
mod test_support;

pub use admin::{
    AdminAction, AdminRequest, AdminSurface, LogPage, NonceIssuer, Notice, NoticeKind, Principal,
    Redirect, StatusReport,
};
pub use config::{AppConfig, MaintenanceConfig, NotifierConfig, StepFailurePolicy};
pub use context::AppContext;
pub use db::{format_size, CleanupKind, Database, DatabaseStats, SiteInfo};
pub use engine::{Engine, MaintenanceTarget, RunError, RunResult, RunStatus, Step};
pub use error::{DbOptError, Error, Result};
pub use logs::{LogEntry, LogStore, Severity};
pub use notify::{
    Delivery, FallbackNotifier, HttpNotifier, Notification, Notifier, SpoolNotifier,
    TestNotification,
};
pub use scheduler::{Cadence, CronTable, RecurringTimer, RunLock, Scheduler, OPTIMIZE_HOOK};

/// Default CMS table prefix
pub const DEFAULT_TABLE_PREFIX: &str = "wp_";

/// Default data directory name
pub const DATA_DIR_NAME: &str = "dbopt";

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "dbopt";
