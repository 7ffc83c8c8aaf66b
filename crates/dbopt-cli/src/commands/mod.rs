//! CLI command handlers

pub mod config;
pub mod logs;
pub mod notify;
pub mod run;
pub mod schedule;
pub mod status;
