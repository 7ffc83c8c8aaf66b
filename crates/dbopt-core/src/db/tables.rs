//! Table enumeration and table-level maintenance statements

use super::{escape_like, quote_ident, Database};
use crate::error::Result;
use rusqlite::params;

impl Database {
    /// List every table whose name starts with the CMS prefix
    pub fn list_prefixed_tables(&self) -> Result<Vec<String>> {
        let pattern = format!("{}%", escape_like(self.prefix()));
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table'
               AND name LIKE ?1 ESCAPE '\\'
               AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'
             ORDER BY name",
        )?;

        let tables = stmt
            .query_map(params![pattern], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(tables)
    }

    /// Refresh planner statistics for a table
    pub fn optimize_table(&self, table: &str) -> Result<()> {
        self.conn
            .execute_batch(&format!("ANALYZE {}", quote_ident(table)))?;
        Ok(())
    }

    /// Rebuild every index of a table
    pub fn repair_table(&self, table: &str) -> Result<()> {
        self.conn
            .execute_batch(&format!("REINDEX {}", quote_ident(table)))?;
        Ok(())
    }
}
