//! Remote tracker gateway.
//!
//! The firing detectors only talk to GitLab through [`TrackerGateway`], so
//! tests can substitute an in-memory snapshot for the HTTP client.

pub mod client;
pub mod types;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;

pub use client::{GitLabClient, GitLabClientConfig, GitLabClientFactory};
pub use types::{Discussion, MergeRequest, Note, User};

/// Page size used for every list call against the tracker.
pub const PAGE_SIZE: u32 = 100;

#[async_trait]
pub trait TrackerGateway: Send + Sync {
    /// Open merge requests of a group, first page of [`PAGE_SIZE`] only.
    async fn list_open_merge_requests(&self, group_id: i64) -> Result<Vec<MergeRequest>>;

    /// Full-detail merge request including diff metadata.
    async fn get_merge_request_changes(&self, project_id: i64, mr_iid: i64)
        -> Result<MergeRequest>;

    async fn list_discussions(
        &self,
        project_id: i64,
        mr_iid: i64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Discussion>>;

    async fn list_participants(&self, project_id: i64, mr_iid: i64) -> Result<Vec<User>>;
}

/// Builds a gateway bound to one tenant's access token.
pub trait GatewayFactory: Send + Sync {
    fn make_gateway(&self, token: &str) -> Result<Arc<dyn TrackerGateway>>;
}
