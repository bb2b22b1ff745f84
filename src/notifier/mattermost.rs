use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::database::TenantConfig;
use crate::error::{NotifierError, Result};
use crate::firing::FiringResult;
use crate::notifier::{message, NotificationSink};

const MAX_ERROR_BODY_BYTES: usize = 500;

#[derive(Debug, Clone)]
pub struct MattermostConfig {
    pub channel: Option<String>,
    pub username: Option<String>,
    pub icon_url: Option<String>,
    pub color: String,
    pub timeout_secs: u64,
}

impl Default for MattermostConfig {
    fn default() -> Self {
        Self {
            channel: None,
            username: None,
            icon_url: None,
            color: "#ff0000".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MattermostMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Serialize)]
pub struct Attachment {
    pub fallback: String,
    pub color: String,
    pub text: String,
}

/// Delivers firing results to the tenant's incoming webhook.
pub struct MattermostNotifier {
    client: Client,
    config: MattermostConfig,
}

impl MattermostNotifier {
    pub fn new(config: MattermostConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NotifierError::Config(format!("Failed to build webhook client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn build_message(&self, text: String) -> MattermostMessage {
        let fallback = text.lines().next().unwrap_or_default().to_string();
        MattermostMessage {
            channel: self.config.channel.clone(),
            username: self.config.username.clone(),
            icon_url: self.config.icon_url.clone(),
            attachments: vec![Attachment {
                fallback,
                color: self.config.color.clone(),
                text,
            }],
        }
    }

    pub async fn post(&self, webhook_url: &str, message: &MattermostMessage) -> Result<()> {
        let response = self.client.post(webhook_url).json(message).send().await?;

        let status = response.status();
        if status.is_success() {
            debug!("Delivered message to webhook ({})", status);
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotifierError::Delivery(format!(
            "webhook returned {}: {}",
            status,
            truncate_bytes(&body, MAX_ERROR_BODY_BYTES)
        )))
    }
}

#[async_trait]
impl NotificationSink for MattermostNotifier {
    async fn notify(&self, result: &FiringResult, tenant: &TenantConfig) -> Result<()> {
        let text = message::render(result, tenant, Utc::now());
        let message = self.build_message(text);
        self.post(&tenant.webhook_url, &message).await
    }
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a char.
fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
