//! Database layer for dbopt
//!
//! Provides SQLite-based storage with:
//! - The optimizer's own tables (audit log, recurring timer)
//! - Maintenance statements against the CMS tables sharing the table prefix
//! - Option and transient access on the CMS options table

mod cleanup;
mod options;
mod schema;
mod stats;
mod tables;
mod transients;

pub use cleanup::CleanupKind;
pub use options::SiteInfo;
pub use schema::Database;
pub use stats::{format_size, DatabaseStats, TableInfo};
pub use transients::{TRANSIENT_PREFIX, TRANSIENT_TIMEOUT_PREFIX};
use std::path::PathBuf;

impl Database {
    /// Get the default database path
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::DATA_DIR_NAME)
            .join("site.sqlite")
    }
}

/// Quote an identifier for interpolation into a statement
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Escape `%`, `_` and `\` so the value matches literally in a `LIKE ... ESCAPE '\'`
pub(crate) fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("wp_posts"), "\"wp_posts\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("wp_"), "wp\\_");
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("plain"), "plain");
    }
}
