//! CMS option access

use super::{quote_ident, Database};
use crate::error::Result;
use rusqlite::{params, OptionalExtension};
use serde::Serialize;

/// Site identity used in reports and as the default notification recipient
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SiteInfo {
    pub name: String,
    pub url: String,
    pub admin_email: String,
}

impl Database {
    fn options_table(&self) -> String {
        quote_ident(&self.table("options"))
    }

    /// Read a single option value
    pub fn get_option(&self, name: &str) -> Result<Option<String>> {
        let sql = format!(
            "SELECT option_value FROM {} WHERE option_name = ?1",
            self.options_table()
        );
        let value = self
            .conn
            .query_row(&sql, params![name], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    /// Insert or replace an option value
    pub fn set_option(&self, name: &str, value: &str) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (option_name, option_value, autoload) VALUES (?1, ?2, 'no')
             ON CONFLICT(option_name) DO UPDATE SET option_value = excluded.option_value",
            self.options_table()
        );
        self.conn.execute(&sql, params![name, value])?;
        Ok(())
    }

    /// Delete an option, returning whether it existed
    pub fn delete_option(&self, name: &str) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE option_name = ?1", self.options_table());
        let rows = self.conn.execute(&sql, params![name])?;
        Ok(rows > 0)
    }

    /// Load site identity from the CMS options, falling back to `fallback` per field
    pub fn site_info(&self, fallback: &SiteInfo) -> SiteInfo {
        let read = |name: &str, default: &str| {
            match self.get_option(name) {
                Ok(Some(value)) if !value.is_empty() => value,
                Ok(_) => default.to_string(),
                Err(e) => {
                    tracing::debug!("Could not read option {}: {}", name, e);
                    default.to_string()
                }
            }
        };

        SiteInfo {
            name: read("blogname", &fallback.name),
            url: read("siteurl", &fallback.url),
            admin_email: read("admin_email", &fallback.admin_email),
        }
    }
}
