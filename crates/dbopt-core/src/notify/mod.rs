//! Run report delivery
//!
//! The engine formats a [`Notification`] and hands it to a [`Notifier`];
//! transports decide how it leaves the process:
//! - [`HttpNotifier`]: POSTs to an HTTP mail relay
//! - [`SpoolNotifier`]: writes an `.eml` file into an outbox directory
//! - [`FallbackNotifier`]: tries a primary transport, then a secondary one

mod http;
mod report;
mod spool;

pub use http::HttpNotifier;
pub use report::{build_report, build_test_message};
pub use spool::SpoolNotifier;

use crate::config::NotifierConfig;
use crate::error::{DbOptError, Result};
use async_trait::async_trait;
use serde::Serialize;

/// A plaintext message to one recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// How a notification was delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Delivered by the first transport tried
    Primary,
    /// Delivered by a secondary transport after the primary failed
    Fallback { primary_error: String },
}

/// Outcome of a delivered test message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestNotification {
    pub recipient: String,
    pub transport: String,
    /// Whether the secondary transport had to take over
    pub fallback_used: bool,
}

/// Notification transport
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Transport identifier used in log messages
    fn transport_name(&self) -> &str;

    /// Deliver a message
    async fn send(&self, message: &Notification) -> Result<Delivery>;
}

/// Tries `primary`, then `fallback` if the primary transport fails
pub struct FallbackNotifier {
    primary: Box<dyn Notifier>,
    fallback: Box<dyn Notifier>,
}

impl FallbackNotifier {
    pub fn new(primary: Box<dyn Notifier>, fallback: Box<dyn Notifier>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl Notifier for FallbackNotifier {
    fn transport_name(&self) -> &str {
        self.primary.transport_name()
    }

    async fn send(&self, message: &Notification) -> Result<Delivery> {
        let primary_error = match self.primary.send(message).await {
            Ok(delivery) => return Ok(delivery),
            Err(e) => e.to_string(),
        };

        tracing::warn!(
            "{} delivery failed ({}), trying {}",
            self.primary.transport_name(),
            primary_error,
            self.fallback.transport_name()
        );

        match self.fallback.send(message).await {
            Ok(_) => Ok(Delivery::Fallback { primary_error }),
            Err(e) => Err(DbOptError::Notification(format!(
                "{}: {}; {}: {}",
                self.primary.transport_name(),
                primary_error,
                self.fallback.transport_name(),
                e
            ))),
        }
    }
}

/// Build the transport stack described by the host config
pub fn from_config(config: &NotifierConfig) -> Result<Box<dyn Notifier>> {
    let spool = Box::new(SpoolNotifier::new(config.spool_dir(), config.from.clone()));

    match &config.relay_url {
        Some(url) => {
            let http = Box::new(HttpNotifier::new(url.clone(), config)?);
            Ok(Box::new(FallbackNotifier::new(http, spool)))
        }
        None => Ok(spool),
    }
}
