//! Run outcome types

use super::Step;
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Overall outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Success => f.write_str("success"),
            RunStatus::Error => f.write_str("error"),
        }
    }
}

/// Failure categories of a run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// A single maintenance statement failed; the run continued
    #[error("{step} failed: {message}")]
    Step { step: Step, message: String },

    /// Something outside a step's own guard failed; remaining steps were skipped
    #[error("optimization aborted: {0}")]
    Orchestration(String),

    /// The report could not be delivered
    #[error("notification to {recipient} failed: {message}")]
    Notification { recipient: String, message: String },

    /// The run lock was held by another run
    #[error("another optimization run is already in progress")]
    Busy,

    /// The maintenance config could not be read
    #[error("could not load maintenance config: {0}")]
    Config(String),
}

impl Serialize for RunError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Aggregated result of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub status: RunStatus,
    pub tables_optimized: usize,
    pub tables_repaired: usize,
    pub items_removed: usize,
    pub errors: Vec<RunError>,
    #[serde(serialize_with = "serialize_secs")]
    pub execution_time: Duration,
}

fn serialize_secs<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((value.as_secs_f64() * 100.0).round() / 100.0)
}

impl RunResult {
    /// Result of a run refused before any step executed
    pub fn rejected(error: RunError) -> Self {
        Self {
            status: RunStatus::Error,
            tables_optimized: 0,
            tables_repaired: 0,
            items_removed: 0,
            errors: vec![error],
            execution_time: Duration::ZERO,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }

    pub fn execution_secs(&self) -> f64 {
        self.execution_time.as_secs_f64()
    }
}
