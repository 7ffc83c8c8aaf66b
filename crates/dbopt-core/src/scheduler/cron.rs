//! Persistent recurring timer backed by the `db_optimizer_cron` table

use super::{Cadence, RecurringTimer};
use crate::db::Database;
use crate::error::{DbOptError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension};

/// Timer entries stored alongside the site data
///
/// Nothing fires on its own: a host process calls [`RecurringTimer::take_due`]
/// (through `Scheduler::tick`) and dispatches whatever is due.
#[derive(Clone, Copy)]
pub struct CronTable<'a> {
    db: &'a Database,
}

impl<'a> CronTable<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }
}

fn format_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DbOptError::InvalidInput(format!("Bad timer timestamp {value}: {e}")))
}

impl RecurringTimer for CronTable<'_> {
    fn register_recurring(&self, hook: &str, first_run: DateTime<Utc>, cadence: Cadence) -> Result<()> {
        self.db.conn.execute(
            "INSERT INTO db_optimizer_cron (hook, next_run, cadence) VALUES (?1, ?2, ?3)
             ON CONFLICT(hook) DO UPDATE SET next_run = excluded.next_run, cadence = excluded.cadence",
            params![hook, format_time(first_run), serde_json::to_string(&cadence)?],
        )?;
        Ok(())
    }

    fn cancel_recurring(&self, hook: &str) -> Result<bool> {
        let removed = self
            .db
            .conn
            .execute("DELETE FROM db_optimizer_cron WHERE hook = ?1", params![hook])?;
        Ok(removed > 0)
    }

    fn next_run(&self, hook: &str) -> Result<Option<DateTime<Utc>>> {
        let next: Option<String> = self
            .db
            .conn
            .query_row(
                "SELECT next_run FROM db_optimizer_cron WHERE hook = ?1",
                params![hook],
                |row| row.get(0),
            )
            .optional()?;
        next.as_deref().map(parse_time).transpose()
    }

    fn take_due(&self, now: DateTime<Utc>) -> Result<Vec<String>> {
        let tx = self.db.conn.unchecked_transaction()?;

        let due = {
            let mut stmt = tx.prepare(
                "SELECT hook, next_run, cadence FROM db_optimizer_cron
                 WHERE next_run <= ?1 ORDER BY next_run, hook",
            )?;
            let rows = stmt
                .query_map(params![format_time(now)], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        let mut hooks = Vec::with_capacity(due.len());
        for (hook, next_run, cadence) in due {
            let cadence: Cadence = serde_json::from_str(&cadence)?;
            let next = cadence.rearm(parse_time(&next_run)?, now);
            tx.execute(
                "UPDATE db_optimizer_cron SET next_run = ?1 WHERE hook = ?2",
                params![format_time(next), hook],
            )?;
            tracing::debug!("Timer {} due, re-armed for {}", hook, next);
            hooks.push(hook);
        }

        tx.commit()?;
        Ok(hooks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db
    }

    #[test]
    fn test_register_and_cancel() {
        let db = db();
        let cron = CronTable::new(&db);
        let first = Utc.with_ymd_and_hms(2025, 5, 1, 1, 0, 0).unwrap();

        cron.register_recurring("hook", first, Cadence::default())
            .unwrap();
        assert_eq!(cron.next_run("hook").unwrap(), Some(first));

        assert!(cron.cancel_recurring("hook").unwrap());
        assert!(!cron.cancel_recurring("hook").unwrap());
        assert_eq!(cron.next_run("hook").unwrap(), None);
    }

    #[test]
    fn test_take_due_rearms() {
        let db = db();
        let cron = CronTable::new(&db);
        let first = Utc.with_ymd_and_hms(2025, 5, 1, 1, 0, 0).unwrap();
        cron.register_recurring("monthly", first, Cadence::default())
            .unwrap();
        cron.register_recurring("later", first + Duration::days(10), Cadence::default())
            .unwrap();

        assert!(cron.take_due(first - Duration::seconds(1)).unwrap().is_empty());

        let now = first + Duration::minutes(5);
        assert_eq!(cron.take_due(now).unwrap(), vec!["monthly".to_string()]);
        assert_eq!(
            cron.next_run("monthly").unwrap(),
            Some(Utc.with_ymd_and_hms(2025, 6, 1, 1, 0, 0).unwrap())
        );

        // Already re-armed, so nothing is due twice
        assert!(cron.take_due(now).unwrap().is_empty());
    }
}
