//! Bounded row deletion for stale CMS content

use super::{quote_ident, Database};
use crate::error::Result;
use rusqlite::params;

/// A category of stale rows removed in bounded batches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CleanupKind {
    PostRevisions,
    AutoDrafts,
    TrashedPosts,
    SpamComments,
    TrashedComments,
}

impl CleanupKind {
    pub const ALL: [CleanupKind; 5] = [
        CleanupKind::PostRevisions,
        CleanupKind::AutoDrafts,
        CleanupKind::TrashedPosts,
        CleanupKind::SpamComments,
        CleanupKind::TrashedComments,
    ];

    /// Maximum rows removed by one invocation
    pub fn batch_ceiling(self) -> usize {
        match self {
            CleanupKind::PostRevisions => 500,
            _ => 100,
        }
    }

    /// Human-readable name used in log messages
    pub fn label(self) -> &'static str {
        match self {
            CleanupKind::PostRevisions => "post revisions",
            CleanupKind::AutoDrafts => "auto-drafts",
            CleanupKind::TrashedPosts => "trashed posts",
            CleanupKind::SpamComments => "spam comments",
            CleanupKind::TrashedComments => "trashed comments",
        }
    }

    /// (unprefixed table, primary key, filter column, filter value)
    fn selector(self) -> (&'static str, &'static str, &'static str, &'static str) {
        match self {
            CleanupKind::PostRevisions => ("posts", "ID", "post_type", "revision"),
            CleanupKind::AutoDrafts => ("posts", "ID", "post_status", "auto-draft"),
            CleanupKind::TrashedPosts => ("posts", "ID", "post_status", "trash"),
            CleanupKind::SpamComments => ("comments", "comment_ID", "comment_approved", "spam"),
            CleanupKind::TrashedComments => {
                ("comments", "comment_ID", "comment_approved", "trash")
            }
        }
    }
}

impl Database {
    /// Delete at most `limit` rows of the given kind, returning the number removed
    pub fn delete_batch(&self, kind: CleanupKind, limit: usize) -> Result<usize> {
        let (base, key, column, value) = kind.selector();
        let table = quote_ident(&self.table(base));
        let key = quote_ident(key);
        let column = quote_ident(column);

        // Bundled SQLite lacks DELETE ... LIMIT, so bound the key set instead
        let sql = format!(
            "DELETE FROM {table} WHERE {key} IN
             (SELECT {key} FROM {table} WHERE {column} = ?1 ORDER BY {key} LIMIT ?2)"
        );
        let rows = self.conn.execute(&sql, params![value, limit as i64])?;
        Ok(rows)
    }

    /// Count rows of the given kind still present
    pub fn count_stale(&self, kind: CleanupKind) -> Result<usize> {
        let (base, _, column, value) = kind.selector();
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?1",
            quote_ident(&self.table(base)),
            quote_ident(column)
        );
        let count: i64 = self.conn.query_row(&sql, params![value], |row| row.get(0))?;
        Ok(count as usize)
    }
}
