//! Recurrence rules

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// How often a recurring hook fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cadence {
    /// First day of each month at `hour`:00 UTC
    Monthly {
        #[serde(default = "default_hour")]
        hour: u32,
    },
    /// Fixed interval in seconds
    Every { secs: u64 },
}

fn default_hour() -> u32 {
    1
}

impl Default for Cadence {
    fn default() -> Self {
        Cadence::Monthly {
            hour: default_hour(),
        }
    }
}

impl Cadence {
    /// First occurrence strictly after `after`
    pub fn next_after(&self, after: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            Cadence::Monthly { hour } => {
                let (year, month) = if after.month() == 12 {
                    (after.year() + 1, 1)
                } else {
                    (after.year(), after.month() + 1)
                };
                NaiveDate::from_ymd_opt(year, month, 1)
                    .and_then(|date| date.and_hms_opt(hour.min(23), 0, 0))
                    .map(|naive| naive.and_utc())
                    .unwrap_or_else(|| after + Duration::days(31))
            }
            Cadence::Every { secs } => after + interval(secs),
        }
    }

    /// Next occurrence for an entry that was due at `scheduled`, given it fired at `now`
    ///
    /// Missed occurrences are skipped, never replayed.
    pub fn rearm(&self, scheduled: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            Cadence::Monthly { .. } => self.next_after(now),
            Cadence::Every { secs } => {
                if scheduled > now {
                    return scheduled;
                }
                let step = interval(secs);
                let behind = (now - scheduled).num_seconds();
                let periods = behind / step.num_seconds() + 1;
                scheduled + Duration::seconds(step.num_seconds() * periods)
            }
        }
    }
}

fn interval(secs: u64) -> Duration {
    Duration::seconds(secs.clamp(1, i32::MAX as u64) as i64)
}
