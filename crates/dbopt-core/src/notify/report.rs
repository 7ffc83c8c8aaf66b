//! Plaintext run report

use super::Notification;
use crate::db::{format_size, DatabaseStats, SiteInfo};
use crate::engine::RunResult;
use chrono::{DateTime, Utc};

/// Format the report sent after a run
pub fn build_report(
    result: &RunResult,
    site: &SiteInfo,
    to: &str,
    stats: Option<&DatabaseStats>,
    at: DateTime<Utc>,
) -> Notification {
    let mut lines = vec!["=== DATABASE OPTIMIZATION REPORT ===".to_string(), String::new()];
    if site.url.is_empty() {
        lines.push(format!("Site: {}", site.name));
    } else {
        lines.push(format!("Site: {} ({})", site.name, site.url));
    }
    lines.push(format!("Time: {}", at.format("%Y-%m-%d %H:%M:%S UTC")));
    lines.push(format!("Status: {}", result.status));
    lines.push(format!("Duration: {:.2} seconds", result.execution_secs()));
    lines.push(String::new());

    lines.push("--- OPTIMIZATION RESULTS ---".to_string());
    lines.push(format!("Tables optimized: {}", result.tables_optimized));
    lines.push(format!("Tables repaired: {}", result.tables_repaired));
    lines.push(format!("Items removed: {}", result.items_removed));
    lines.push(String::new());

    if let Some(stats) = stats {
        lines.push("--- DATABASE INFORMATION ---".to_string());
        lines.push(format!("Database size: {}", format_size(stats.size_bytes)));
        lines.push(format!("Table count: {}", stats.table_count));
        lines.push(String::new());
    }

    if !result.errors.is_empty() {
        lines.push("--- ERRORS ---".to_string());
        lines.extend(result.errors.iter().map(|error| format!("- {}", error)));
        lines.push(String::new());
    }

    lines.push("This report was generated automatically by dbopt.".to_string());
    let mut body = lines.join("\n");
    body.push('\n');

    Notification {
        to: to.to_string(),
        subject: format!("Database Optimization Report - {}", site.name),
        body,
    }
}

/// Format the message sent to check that delivery works
pub fn build_test_message(site: &SiteInfo, to: &str, at: DateTime<Utc>) -> Notification {
    let body = [
        "This is a test message from dbopt.".to_string(),
        String::new(),
        "If you received it, notifications for this site are delivered correctly.".to_string(),
        String::new(),
        format!("Site: {}", site.name),
        format!("URL: {}", site.url),
        format!("Time: {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
    ]
    .join("\n");

    Notification {
        to: to.to_string(),
        subject: format!("Test Notification - {}", site.name),
        body: body + "\n",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{RunError, RunStatus};
    use chrono::TimeZone;
    use std::time::Duration;

    fn site() -> SiteInfo {
        SiteInfo {
            name: "Blog".to_string(),
            url: "https://blog.example".to_string(),
            admin_email: "admin@blog.example".to_string(),
        }
    }

    #[test]
    fn test_report_contents() {
        let result = RunResult {
            status: RunStatus::Success,
            tables_optimized: 3,
            tables_repaired: 1,
            items_removed: 50,
            errors: vec![],
            execution_time: Duration::from_millis(1234),
        };
        let stats = DatabaseStats {
            size_bytes: 2048,
            table_count: 3,
            tables: vec![],
        };
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 1, 0, 0).unwrap();

        let report = build_report(&result, &site(), "ops@blog.example", Some(&stats), at);
        assert_eq!(report.to, "ops@blog.example");
        assert_eq!(report.subject, "Database Optimization Report - Blog");
        assert!(report.body.contains("Site: Blog (https://blog.example)"));
        assert!(report.body.contains("Time: 2025-03-01 01:00:00 UTC"));
        assert!(report.body.contains("Duration: 1.23 seconds"));
        assert!(report.body.contains("Tables optimized: 3"));
        assert!(report.body.contains("Items removed: 50"));
        assert!(report.body.contains("Database size: 2 KB"));
        assert!(!report.body.contains("--- ERRORS ---"));

        assert!(report
            .body
            .starts_with("=== DATABASE OPTIMIZATION REPORT ===\n\nSite: Blog"));
        assert!(report
            .body
            .contains("Items removed: 50\n\n--- DATABASE INFORMATION ---\n"));
        assert!(report
            .body
            .ends_with("Table count: 3\n\nThis report was generated automatically by dbopt.\n"));
    }

    #[test]
    fn test_report_lists_errors() {
        let result = RunResult {
            status: RunStatus::Error,
            tables_optimized: 0,
            tables_repaired: 0,
            items_removed: 0,
            errors: vec![RunError::Orchestration("table listing failed".to_string())],
            execution_time: Duration::ZERO,
        };
        let report = build_report(&result, &site(), "a@b.c", None, Utc::now());
        assert!(report.body.contains("Status: error"));
        assert!(report.body.contains("--- ERRORS ---"));
        assert!(report.body.contains("- optimization aborted: table listing failed"));
        assert!(!report.body.contains("DATABASE INFORMATION"));
    }

    #[test]
    fn test_test_message_contents() {
        let at = Utc.with_ymd_and_hms(2025, 6, 2, 8, 30, 0).unwrap();
        let message = build_test_message(&site(), "ops@blog.example", at);

        assert_eq!(message.to, "ops@blog.example");
        assert_eq!(message.subject, "Test Notification - Blog");
        assert!(message.body.contains("Site: Blog\n"));
        assert!(message.body.contains("URL: https://blog.example\n"));
        assert!(message.body.ends_with("Time: 2025-06-02 08:30:00 UTC\n"));
    }
}
