//! Delivery of firing results to a chat webhook.

pub mod mattermost;
pub mod message;

use async_trait::async_trait;

use crate::database::TenantConfig;
use crate::error::Result;
use crate::firing::FiringResult;

pub use mattermost::{MattermostConfig, MattermostNotifier};

#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one result to the tenant's webhook.
    async fn notify(&self, result: &FiringResult, tenant: &TenantConfig) -> Result<()>;
}
