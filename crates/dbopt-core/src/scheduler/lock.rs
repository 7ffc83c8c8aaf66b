//! Run lock preventing overlapping optimization runs

use crate::db::Database;
use crate::error::Result;

/// Transient name holding the lock
pub const RUN_LOCK: &str = "db_optimizer_running";

/// Held for the duration of a run; released on drop
///
/// The lock is a transient, so a run that dies without releasing it only
/// blocks others until the TTL passes.
pub struct RunLock<'a> {
    db: &'a Database,
}

impl<'a> RunLock<'a> {
    /// Take the lock, or `None` if another run holds it
    pub fn acquire(db: &'a Database, ttl_secs: u64, now: i64) -> Result<Option<Self>> {
        if db.get_transient(RUN_LOCK, now)?.is_some() {
            return Ok(None);
        }
        let ttl_secs = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        db.set_transient(RUN_LOCK, &now.to_string(), ttl_secs, now)?;
        Ok(Some(Self { db }))
    }

    /// Whether a live lock exists
    pub fn is_held(db: &Database, now: i64) -> Result<bool> {
        Ok(db.get_transient(RUN_LOCK, now)?.is_some())
    }
}

impl Drop for RunLock<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.db.delete_transient(RUN_LOCK) {
            tracing::error!("Failed to release run lock: {}", e);
        }
    }
}
