//! HTTP mail relay transport

use super::{Delivery, Notification, Notifier};
use crate::config::NotifierConfig;
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Posts messages as JSON to a mail relay endpoint
pub struct HttpNotifier {
    http_client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    from: String,
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

impl HttpNotifier {
    pub fn new(url: String, config: &NotifierConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            url,
            api_key: config.api_key.clone(),
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    fn transport_name(&self) -> &str {
        "relay"
    }

    async fn send(&self, message: &Notification) -> Result<Delivery> {
        let body = RelayRequest {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            text: &message.body,
        };

        let mut request = self.http_client.post(&self.url).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        request.send().await?.error_for_status()?;
        tracing::debug!("Relay accepted message for {}", message.to);
        Ok(Delivery::Primary)
    }
}
