//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "dbopt")]
#[command(
    author,
    version,
    about = "Scheduled cleanup and optimization for CMS databases"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run an optimization now
    Run,

    /// Register the recurring optimization
    Activate,

    /// Remove the recurring optimization
    Deactivate,

    /// Run the recurring optimization if it is due
    Tick,

    /// Keep running and fire the recurring optimization when due
    Daemon(DaemonArgs),

    /// Inspect or clear the optimizer log
    Logs(LogsArgs),

    /// Show schedule, database and log status
    Status,

    /// Show or change maintenance settings
    Config(ConfigArgs),

    /// Check notification delivery
    Notify(NotifyArgs),
}

#[derive(Args)]
pub struct DaemonArgs {
    /// Seconds between timer checks
    #[arg(long, default_value = "60")]
    pub interval: u64,
}

#[derive(Args)]
pub struct LogsArgs {
    #[command(subcommand)]
    pub action: LogsAction,
}

#[derive(Subcommand)]
pub enum LogsAction {
    /// List log entries, newest first
    #[command(alias = "ls")]
    List {
        /// Page number (starting at 1)
        #[arg(long, default_value = "1")]
        page: usize,

        /// Entries per page
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Delete every log entry
    Clear,
    /// Delete entries older than the retention period
    Prune {
        /// Retention in days (defaults to the keep_logs_days setting)
        #[arg(long)]
        days: Option<u32>,
    },
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show host and maintenance settings
    Show,
    /// Change one maintenance setting
    Set { key: String, value: String },
}

#[derive(Args)]
pub struct NotifyArgs {
    #[command(subcommand)]
    pub action: NotifyAction,
}

#[derive(Subcommand)]
pub enum NotifyAction {
    /// Send a test message to the report recipient
    Test,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Cli,
    Json,
}
