//! Outbox directory transport

use super::{Delivery, Notification, Notifier};
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

/// Writes each message as an RFC 5322 `.eml` file for pickup by a local MTA
pub struct SpoolNotifier {
    dir: PathBuf,
    from: String,
    seq: AtomicU64,
}

impl SpoolNotifier {
    pub fn new(dir: PathBuf, from: String) -> Self {
        Self {
            dir,
            from,
            seq: AtomicU64::new(0),
        }
    }

    fn render(&self, message: &Notification) -> String {
        format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\nDate: {}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{}",
            self.from,
            message.to,
            message.subject,
            Utc::now().to_rfc2822(),
            message.body.replace('\n', "\r\n")
        )
    }
}

#[async_trait]
impl Notifier for SpoolNotifier {
    fn transport_name(&self) -> &str {
        "spool"
    }

    async fn send(&self, message: &Notification) -> Result<Delivery> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let name = format!("{}-{}-{}.eml", Utc::now().format("%Y%m%dT%H%M%S%.6f"), std::process::id(), seq);
        let path = self.dir.join(name);

        tokio::fs::write(&path, self.render(message)).await?;
        tracing::debug!("Spooled message to {}", path.display());
        Ok(Delivery::Primary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_spool_writes_eml() {
        let dir = TempDir::new().unwrap();
        let notifier = SpoolNotifier::new(dir.path().join("outbox"), "dbopt@example.com".to_string());
        let message = Notification {
            to: "admin@example.com".to_string(),
            subject: "Database Optimization Report - Blog".to_string(),
            body: "line one\nline two".to_string(),
        };

        notifier.send(&message).await.unwrap();
        notifier.send(&message).await.unwrap();

        let files: Vec<_> = std::fs::read_dir(dir.path().join("outbox"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(files.len(), 2);

        let content = std::fs::read_to_string(&files[0]).unwrap();
        assert!(content.contains("To: admin@example.com\r\n"));
        assert!(content.contains("Subject: Database Optimization Report - Blog"));
        assert!(content.ends_with("line one\r\nline two"));
    }
}
