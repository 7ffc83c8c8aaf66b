//! Database statistics

use super::{quote_ident, Database};
use crate::error::Result;

/// Row count for one CMS table
#[derive(Debug, Clone, serde::Serialize)]
pub struct TableInfo {
    pub name: String,
    pub rows: usize,
}

/// Database stats
#[derive(Debug, Clone, serde::Serialize)]
pub struct DatabaseStats {
    pub size_bytes: u64,
    pub table_count: usize,
    pub tables: Vec<TableInfo>,
}

impl Database {
    /// Get database statistics for the prefixed CMS tables
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let page_count: i64 = self
            .conn
            .query_row("PRAGMA page_count", [], |row| row.get(0))?;
        let page_size: i64 = self
            .conn
            .query_row("PRAGMA page_size", [], |row| row.get(0))?;

        let mut tables = Vec::new();
        for name in self.list_prefixed_tables()? {
            let rows: i64 = self
                .conn
                .query_row(
                    &format!("SELECT COUNT(*) FROM {}", quote_ident(&name)),
                    [],
                    |row| row.get(0),
                )?;
            tables.push(TableInfo {
                name,
                rows: rows as usize,
            });
        }

        Ok(DatabaseStats {
            size_bytes: (page_count * page_size) as u64,
            table_count: tables.len(),
            tables,
        })
    }
}

/// Format a byte count with binary units, e.g. `1536` -> `1.5 KB`
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    let rounded = (size * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{cms_db, insert_posts};

    #[test]
    fn test_get_stats() {
        let db = cms_db();
        insert_posts(&db, "post", "publish", 4);

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.table_count, 3);
        assert!(stats.size_bytes > 0);

        let posts = stats.tables.iter().find(|t| t.name == "wp_posts").unwrap();
        assert_eq!(posts.rows, 4);
    }

    #[test]
    fn test_unreadable_table_fails_stats() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("site.sqlite");
        {
            let db = Database::open(&path).unwrap();
            db.conn
                .execute_batch(
                    "CREATE TABLE wp_posts (ID INTEGER PRIMARY KEY);
                     PRAGMA writable_schema = ON;
                     INSERT INTO sqlite_master (type, name, tbl_name, rootpage, sql)
                         VALUES ('table', 'wp_ghost', 'wp_ghost', 0,
                                 'CREATE VIRTUAL TABLE wp_ghost USING missing_module(x)');
                     PRAGMA writable_schema = OFF;",
                )
                .unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert!(db.get_stats().is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5 MB");
    }
}
