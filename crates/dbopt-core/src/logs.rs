//! Audit log of optimizer activity
//!
//! Entries are append-only. They leave the store only through retention
//! pruning or an explicit clear, and a clear always leaves a single
//! "logs cleared" entry behind so the trail never goes silent.

use crate::db::Database;
use crate::error::{DbOptError, Result};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = DbOptError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            other => Err(DbOptError::InvalidInput(format!("Unknown severity: {other}"))),
        }
    }
}

/// A single audit log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
}

/// Log store backed by the `db_optimizer_logs` table
#[derive(Clone, Copy)]
pub struct LogStore<'a> {
    db: &'a Database,
}

fn format_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl<'a> LogStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Append an entry stamped with the current time
    pub fn append(&self, message: &str, severity: Severity) -> Result<i64> {
        self.append_at(Utc::now(), message, severity)
    }

    /// Append an entry with an explicit timestamp
    pub fn append_at(&self, at: DateTime<Utc>, message: &str, severity: Severity) -> Result<i64> {
        match severity {
            Severity::Info => tracing::info!("{}", message),
            Severity::Warning => tracing::warn!("{}", message),
            Severity::Error => tracing::error!("{}", message),
        }

        self.db.conn.execute(
            "INSERT INTO db_optimizer_logs (log_time, log_type, log_message) VALUES (?1, ?2, ?3)",
            params![format_time(at), severity.as_str(), message],
        )?;
        Ok(self.db.conn.last_insert_rowid())
    }

    /// Best-effort append used on the run path.
    ///
    /// A failed write is reported on the process error channel instead of
    /// being returned, so a run always completes.
    pub fn record(&self, severity: Severity, message: impl AsRef<str>) {
        let message = message.as_ref();
        if let Err(e) = self.append(message, severity) {
            tracing::error!("Failed to persist log entry ({}): {}: {}", severity, message, e);
        }
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.record(Severity::Info, message);
    }

    pub fn warning(&self, message: impl AsRef<str>) {
        self.record(Severity::Warning, message);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.record(Severity::Error, message);
    }

    /// Newest entries first
    pub fn list(&self, limit: usize, offset: usize) -> Result<Vec<LogEntry>> {
        let mut stmt = self.db.conn.prepare(
            "SELECT id, log_time, log_type, log_message FROM db_optimizer_logs
             ORDER BY log_time DESC, id DESC
             LIMIT ?1 OFFSET ?2",
        )?;

        let rows = stmt
            .query_map(params![limit as i64, offset as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, time, kind, message)| {
                let timestamp = DateTime::parse_from_rfc3339(&time)
                    .map_err(|e| DbOptError::InvalidInput(format!("Bad log time {time}: {e}")))?
                    .with_timezone(&Utc);
                Ok(LogEntry {
                    id,
                    timestamp,
                    severity: kind.parse()?,
                    message,
                })
            })
            .collect()
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 =
            self.db
                .conn
                .query_row("SELECT COUNT(*) FROM db_optimizer_logs", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Delete entries older than `retention_days`; 0 keeps everything.
    ///
    /// The summary entry written afterwards is not subject to this pass.
    pub fn prune_older_than(&self, retention_days: u32) -> Result<usize> {
        if retention_days == 0 {
            return Ok(0);
        }

        // A window reaching past the representable range keeps everything
        let window = Duration::days(i64::from(retention_days));
        let deleted = match Utc::now().checked_sub_signed(window) {
            Some(cutoff) => self.db.conn.execute(
                "DELETE FROM db_optimizer_logs WHERE log_time < ?1",
                params![format_time(cutoff)],
            )?,
            None => 0,
        };

        self.append(
            &format!("Log cleanup: {deleted} log entries removed"),
            Severity::Info,
        )?;
        Ok(deleted)
    }

    /// Delete every entry, then record the clear itself
    pub fn clear_all(&self) -> Result<usize> {
        let tx = self.db.conn.unchecked_transaction()?;
        let deleted = tx.execute("DELETE FROM db_optimizer_logs", [])?;
        tx.execute(
            "DELETE FROM sqlite_sequence WHERE name = 'db_optimizer_logs'",
            [],
        )?;
        tx.commit()?;

        self.append("All logs cleared", Severity::Info)?;
        Ok(deleted)
    }
}
