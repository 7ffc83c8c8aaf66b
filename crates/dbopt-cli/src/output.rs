//! Output formatters

use crate::app::OutputFormat;
use anyhow::Result;
use dbopt_core::{LogEntry, RunResult, Severity};
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Print a run result
pub fn print_run_result(result: &RunResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
        OutputFormat::Cli => {
            println!("Optimization finished: {}", result.status);
            println!("  Tables optimized: {}", result.tables_optimized);
            println!("  Tables repaired:  {}", result.tables_repaired);
            println!("  Items removed:    {}", result.items_removed);
            println!("  Duration:         {:.2}s", result.execution_secs());
            for error in &result.errors {
                println!("  Error: {}", error);
            }
        }
    }
    Ok(())
}

fn severity_color(severity: Severity) -> Option<Color> {
    match severity {
        Severity::Info => None,
        Severity::Warning => Some(Color::Yellow),
        Severity::Error => Some(Color::Red),
    }
}

/// Print log entries, colouring the severity column when stdout is a terminal
pub fn print_log_entries(entries: &[LogEntry]) -> Result<()> {
    let choice = if std::io::IsTerminal::is_terminal(&std::io::stdout()) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);

    for entry in entries {
        write!(
            stdout,
            "{}  ",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S")
        )?;
        stdout.set_color(ColorSpec::new().set_fg(severity_color(entry.severity)).set_bold(
            entry.severity == Severity::Error,
        ))?;
        write!(stdout, "{:<7}", entry.severity.as_str())?;
        stdout.reset()?;
        writeln!(stdout, "  {}", entry.message)?;
    }
    Ok(())
}
