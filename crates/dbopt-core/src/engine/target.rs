//! The database operations a run needs

use crate::db::{CleanupKind, Database, DatabaseStats};
use crate::error::Result;

/// Maintenance statements the engine issues
///
/// Implemented by [`Database`]; tests wrap it to inject failures.
pub trait MaintenanceTarget {
    /// Tables sharing the CMS prefix
    fn list_tables(&self) -> Result<Vec<String>>;

    fn optimize_table(&self, table: &str) -> Result<()>;

    fn repair_table(&self, table: &str) -> Result<()>;

    /// Remove at most `limit` rows of `kind`
    fn delete_batch(&self, kind: CleanupKind, limit: usize) -> Result<usize>;

    /// Names of transients that expired strictly before `now` (unix seconds)
    fn expired_transients(&self, now: i64, limit: usize) -> Result<Vec<String>>;

    /// Invalidate one transient through the cache path
    fn delete_transient(&self, name: &str) -> Result<bool>;

    fn stats(&self) -> Result<DatabaseStats>;
}

impl MaintenanceTarget for Database {
    fn list_tables(&self) -> Result<Vec<String>> {
        self.list_prefixed_tables()
    }

    fn optimize_table(&self, table: &str) -> Result<()> {
        Database::optimize_table(self, table)
    }

    fn repair_table(&self, table: &str) -> Result<()> {
        Database::repair_table(self, table)
    }

    fn delete_batch(&self, kind: CleanupKind, limit: usize) -> Result<usize> {
        Database::delete_batch(self, kind, limit)
    }

    fn expired_transients(&self, now: i64, limit: usize) -> Result<Vec<String>> {
        Database::expired_transients(self, now, limit)
    }

    fn delete_transient(&self, name: &str) -> Result<bool> {
        Database::delete_transient(self, name)
    }

    fn stats(&self) -> Result<DatabaseStats> {
        self.get_stats()
    }
}
