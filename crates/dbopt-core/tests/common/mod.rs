//! Shared fixtures: a file-backed site database with a minimal CMS schema

#![allow(dead_code)]

use async_trait::async_trait;
use dbopt_core::{Database, DbOptError, Delivery, Notification, Notifier, Result};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

const CMS_SCHEMA: &str = r#"
CREATE TABLE wp_posts (
    ID INTEGER PRIMARY KEY AUTOINCREMENT,
    post_title TEXT NOT NULL DEFAULT '',
    post_type TEXT NOT NULL DEFAULT 'post',
    post_status TEXT NOT NULL DEFAULT 'publish'
);
CREATE TABLE wp_comments (
    comment_ID INTEGER PRIMARY KEY AUTOINCREMENT,
    comment_content TEXT NOT NULL DEFAULT '',
    comment_approved TEXT NOT NULL DEFAULT '1'
);
CREATE TABLE wp_options (
    option_id INTEGER PRIMARY KEY AUTOINCREMENT,
    option_name TEXT NOT NULL UNIQUE,
    option_value TEXT NOT NULL,
    autoload TEXT NOT NULL DEFAULT 'yes'
);
INSERT INTO wp_options (option_name, option_value) VALUES
    ('blogname', 'Test Site'),
    ('siteurl', 'https://test.example'),
    ('admin_email', 'admin@test.example');
"#;

pub struct Site {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl Site {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("site.sqlite");
        Connection::open(&path)
            .unwrap()
            .execute_batch(CMS_SCHEMA)
            .unwrap();
        Self { dir, path }
    }

    pub fn open(&self) -> Database {
        let db = Database::open(&self.path).unwrap();
        db.initialize().unwrap();
        db
    }

    pub fn conn(&self) -> Connection {
        Connection::open(&self.path).unwrap()
    }

    pub fn insert_posts(&self, post_type: &str, status: &str, count: usize) {
        let conn = self.conn();
        let tx = conn.unchecked_transaction().unwrap();
        for i in 0..count {
            tx.execute(
                "INSERT INTO wp_posts (post_title, post_type, post_status) VALUES (?1, ?2, ?3)",
                params![format!("{post_type} {i}"), post_type, status],
            )
            .unwrap();
        }
        tx.commit().unwrap();
    }

    pub fn insert_comments(&self, approved: &str, count: usize) {
        let conn = self.conn();
        let tx = conn.unchecked_transaction().unwrap();
        for i in 0..count {
            tx.execute(
                "INSERT INTO wp_comments (comment_content, comment_approved) VALUES (?1, ?2)",
                params![format!("comment {i}"), approved],
            )
            .unwrap();
        }
        tx.commit().unwrap();
    }

    pub fn count(&self, sql: &str) -> i64 {
        self.conn().query_row(sql, [], |row| row.get(0)).unwrap()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Records every message, or fails every send
pub struct TestNotifier {
    fail: bool,
    pub sent: Mutex<Vec<Notification>>,
}

impl TestNotifier {
    pub fn ok() -> Self {
        Self {
            fail: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for TestNotifier {
    fn transport_name(&self) -> &str {
        "test"
    }

    async fn send(&self, message: &Notification) -> Result<Delivery> {
        if self.fail {
            return Err(DbOptError::Notification("mail server unreachable".to_string()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(Delivery::Primary)
    }
}
