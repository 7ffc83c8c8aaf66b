//! Database schema and initialization

use crate::error::Result;
use rusqlite::{params, Connection};
use std::path::Path;

/// Main database handle
///
/// Wraps the single connection shared by the log store, the recurring timer
/// and the maintenance statements. The table prefix selects which CMS tables
/// the optimizer works on.
pub struct Database {
    pub(crate) conn: Connection,
    prefix: String,
}

const SCHEMA_VERSION: i32 = 1;

const CREATE_TABLES: &str = r#"
-- Audit log of optimizer activity
CREATE TABLE IF NOT EXISTS db_optimizer_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    log_time TEXT NOT NULL,
    log_type TEXT NOT NULL DEFAULT 'info' CHECK (log_type IN ('info', 'warning', 'error')),
    log_message TEXT NOT NULL
);

-- Recurring timer entries (hook -> next run)
CREATE TABLE IF NOT EXISTS db_optimizer_cron (
    hook TEXT PRIMARY KEY,
    next_run TEXT NOT NULL,
    cadence TEXT NOT NULL
);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS db_optimizer_schema_version (
    version INTEGER PRIMARY KEY
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_db_optimizer_logs_time ON db_optimizer_logs(log_time);
"#;

impl Database {
    /// Open database at path, creating if necessary
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Ok(Self {
            conn,
            prefix: crate::DEFAULT_TABLE_PREFIX.to_string(),
        })
    }

    /// Open in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn,
            prefix: crate::DEFAULT_TABLE_PREFIX.to_string(),
        })
    }

    /// Use a different CMS table prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// CMS table prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Prefixed CMS table name, e.g. `posts` -> `wp_posts`
    pub fn table(&self, base: &str) -> String {
        format!("{}{}", self.prefix, base)
    }

    /// Initialize database schema
    pub fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;

        self.conn.execute_batch(CREATE_TABLES)?;

        self.conn.execute(
            "INSERT OR REPLACE INTO db_optimizer_schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;

        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> Result<Option<i32>> {
        let version = self
            .conn
            .query_row(
                "SELECT version FROM db_optimizer_schema_version ORDER BY version DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .ok();
        Ok(version)
    }
}
