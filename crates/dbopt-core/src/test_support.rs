//! Shared fixtures for unit tests

use crate::Database;

const CMS_SCHEMA: &str = r#"
CREATE TABLE wp_posts (
    ID INTEGER PRIMARY KEY AUTOINCREMENT,
    post_title TEXT NOT NULL DEFAULT '',
    post_type TEXT NOT NULL DEFAULT 'post',
    post_status TEXT NOT NULL DEFAULT 'publish'
);
CREATE INDEX wp_posts_type_status ON wp_posts(post_type, post_status);

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
"#;

/// In-memory database with the optimizer schema and a minimal CMS schema
pub(crate) fn cms_db() -> Database {
    let db = Database::open_in_memory().unwrap();
    db.initialize().unwrap();
    db.conn.execute_batch(CMS_SCHEMA).unwrap();
    db
}

pub(crate) fn insert_posts(db: &Database, post_type: &str, status: &str, count: usize) {
    for i in 0..count {
        db.conn
            .execute(
                "INSERT INTO wp_posts (post_title, post_type, post_status) VALUES (?1, ?2, ?3)",
                rusqlite::params![format!("{post_type} {i}"), post_type, status],
            )
            .unwrap();
    }
}

pub(crate) fn insert_comments(db: &Database, approved: &str, count: usize) {
    for i in 0..count {
        db.conn
            .execute(
                "INSERT INTO wp_comments (comment_content, comment_approved) VALUES (?1, ?2)",
                rusqlite::params![format!("comment {i}"), approved],
            )
            .unwrap();
    }
}
