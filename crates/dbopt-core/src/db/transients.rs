//! Transient cache entries stored as CMS options
//!
//! A transient `name` is two option rows: `_transient_<name>` holding the
//! value and `_transient_timeout_<name>` holding the expiry as unix seconds.
//! Removal always goes through [`Database::delete_transient`] so both rows
//! disappear together.

use super::{escape_like, quote_ident, Database};
use crate::error::Result;
use rusqlite::params;

pub const TRANSIENT_PREFIX: &str = "_transient_";
pub const TRANSIENT_TIMEOUT_PREFIX: &str = "_transient_timeout_";

impl Database {
    /// Store a transient that expires `ttl_secs` after `now`
    pub fn set_transient(&self, name: &str, value: &str, ttl_secs: i64, now: i64) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        self.set_option(&format!("{TRANSIENT_PREFIX}{name}"), value)?;
        self.set_option(
            &format!("{TRANSIENT_TIMEOUT_PREFIX}{name}"),
            &now.saturating_add(ttl_secs).to_string(),
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Read a transient, treating an expired one as absent
    pub fn get_transient(&self, name: &str, now: i64) -> Result<Option<String>> {
        if let Some(expires) = self.get_option(&format!("{TRANSIENT_TIMEOUT_PREFIX}{name}"))? {
            let expires: i64 = expires.parse().unwrap_or(0);
            if expires < now {
                return Ok(None);
            }
        }
        self.get_option(&format!("{TRANSIENT_PREFIX}{name}"))
    }

    /// Invalidate a transient, returning whether anything was removed
    pub fn delete_transient(&self, name: &str) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let value = self.delete_option(&format!("{TRANSIENT_PREFIX}{name}"))?;
        let timeout = self.delete_option(&format!("{TRANSIENT_TIMEOUT_PREFIX}{name}"))?;
        tx.commit()?;
        Ok(value || timeout)
    }

    /// Names of transients whose expiry is strictly before `now`, oldest first
    pub fn expired_transients(&self, now: i64, limit: usize) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT option_name FROM {}
             WHERE option_name LIKE ?1 ESCAPE '\\'
               AND CAST(option_value AS INTEGER) < ?2
             ORDER BY CAST(option_value AS INTEGER), option_name
             LIMIT ?3",
            quote_ident(&self.table("options"))
        );
        let pattern = format!("{}%", escape_like(TRANSIENT_TIMEOUT_PREFIX));

        let mut stmt = self.conn.prepare(&sql)?;
        let names = stmt
            .query_map(params![pattern, now, limit as i64], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(names
            .into_iter()
            .filter_map(|option| {
                option
                    .strip_prefix(TRANSIENT_TIMEOUT_PREFIX)
                    .map(str::to_string)
            })
            .collect())
    }
}
