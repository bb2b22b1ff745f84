use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NotifierError, Result};

/// One tenant ("client"): a GitLab group watched with its own token,
/// webhook and detector settings.
///
/// A detector is enabled when its timeout string is non-empty and parses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TenantConfig {
    pub id: i64,
    pub group_id: i64,
    pub gitlab_token: String,
    pub webhook_url: String,
    pub discussion_firing_timeout: String,
    pub merge_request_old_timeout: String,
    pub merge_request_old_mention: String,
    pub merge_request_review_timeout: String,
    pub merge_request_reviewers_count: i64,
    pub merge_request_review_mention: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantConfig {
    pub fn discussion_timeout(&self) -> Result<Option<Duration>> {
        parse_timeout(&self.discussion_firing_timeout)
    }

    pub fn stale_merge_request_timeout(&self) -> Result<Option<Duration>> {
        parse_timeout(&self.merge_request_old_timeout)
    }

    pub fn review_timeout(&self) -> Result<Option<Duration>> {
        parse_timeout(&self.merge_request_review_timeout)
    }

    /// Copy safe to hand out over the API.
    pub fn masked(mut self) -> Self {
        self.gitlab_token = "<MASKED>".to_string();
        self.webhook_url = "<MASKED>".to_string();
        self
    }
}

/// Writable fields of a tenant, as accepted by create and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenantInput {
    pub group_id: i64,
    pub gitlab_token: String,
    pub webhook_url: String,
    #[serde(default)]
    pub discussion_firing_timeout: String,
    #[serde(default)]
    pub merge_request_old_timeout: String,
    #[serde(default)]
    pub merge_request_old_mention: String,
    #[serde(default)]
    pub merge_request_review_timeout: String,
    #[serde(default)]
    pub merge_request_reviewers_count: i64,
    #[serde(default)]
    pub merge_request_review_mention: String,
}

/// Parses a human-readable duration such as `48h`, `30m` or `1h 30m`.
/// An empty (or blank) string means "disabled".
pub fn parse_timeout(raw: &str) -> Result<Option<Duration>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let parsed = humantime::parse_duration(raw)
        .map_err(|e| NotifierError::InvalidDuration(format!("{:?}: {}", raw, e)))?;
    Duration::from_std(parsed)
        .map(Some)
        .map_err(|e| NotifierError::InvalidDuration(format!("{:?}: {}", raw, e)))
}
