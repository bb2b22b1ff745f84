use chrono::{DateTime, Duration, Utc};
use tracing::{error, info};

use crate::database::TenantConfig;
use crate::error::Result;
use crate::firing::types::FiringResult;
use crate::firing::{discussions, review, stale};
use crate::gitlab::TrackerGateway;
use crate::notifier::NotificationSink;

/// Counts of what one tenant produced in one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantReport {
    pub firing_discussions: usize,
    pub stale_merge_requests: usize,
    pub needs_review: usize,
    pub delivery_failures: usize,
}

impl TenantReport {
    pub fn total(&self) -> usize {
        self.firing_discussions + self.stale_merge_requests + self.needs_review
    }
}

/// Runs the enabled detectors for one tenant and delivers what they find.
///
/// Detectors run in a fixed order: discussions, stale merge requests, then
/// needs-review.
#[derive(Debug, Clone)]
pub struct FiringService {
    discussion_page_limit: u32,
}

impl FiringService {
    pub fn new(discussion_page_limit: u32) -> Self {
        Self {
            discussion_page_limit,
        }
    }

    pub async fn process_tenant(
        &self,
        tenant: &TenantConfig,
        gateway: &dyn TrackerGateway,
        sink: &dyn NotificationSink,
        now: DateTime<Utc>,
    ) -> TenantReport {
        let mut report = TenantReport::default();

        if let Some(timeout) = enabled(tenant.discussion_timeout(), "discussion_firing_timeout") {
            info!("Start processing firing merge request discussions in group {}", tenant.group_id);
            let firing = discussions::find_firing_merge_requests(
                gateway,
                tenant.group_id,
                timeout,
                now,
                self.discussion_page_limit,
            )
            .await;
            if !firing.is_empty() {
                info!("Got {} firing merge requests in group {}", firing.len(), tenant.group_id);
            }
            for result in firing.into_iter().flat_map(|fmr| fmr.into_results()) {
                report.firing_discussions += 1;
                report.delivery_failures += deliver(sink, &result, tenant).await;
            }
        }

        if let Some(timeout) = enabled(tenant.stale_merge_request_timeout(), "merge_request_old_timeout") {
            info!("Start processing old opened merge requests in group {}", tenant.group_id);
            let stale = stale::find_stale_merge_requests(gateway, tenant.group_id, timeout, now).await;
            if !stale.is_empty() {
                info!("Got {} old opened merge requests in group {}", stale.len(), tenant.group_id);
            }
            for merge_request in stale {
                report.stale_merge_requests += 1;
                let result = FiringResult::StaleMergeRequest { merge_request };
                report.delivery_failures += deliver(sink, &result, tenant).await;
            }
        }

        if let Some(timeout) = enabled(tenant.review_timeout(), "merge_request_review_timeout") {
            info!("Start processing needed review merge requests in group {}", tenant.group_id);
            let required = usize::try_from(tenant.merge_request_reviewers_count).unwrap_or(0);
            let waiting = review::find_merge_requests_needing_review(
                gateway,
                tenant.group_id,
                timeout,
                required,
                now,
            )
            .await;
            if !waiting.is_empty() {
                info!("Got {} needed review merge requests in group {}", waiting.len(), tenant.group_id);
            }
            for (merge_request, participants) in waiting {
                report.needs_review += 1;
                let result = FiringResult::NeedsReview {
                    merge_request,
                    participants,
                };
                report.delivery_failures += deliver(sink, &result, tenant).await;
            }
        }

        report
    }
}

/// `None` for a disabled detector; a malformed timeout disables it too.
fn enabled(timeout: Result<Option<Duration>>, field: &str) -> Option<Duration> {
    match timeout {
        Ok(timeout) => timeout,
        Err(e) => {
            error!("Failed to parse {}: {}", field, e);
            None
        }
    }
}

/// Returns the number of failed deliveries (0 or 1). No retry.
async fn deliver(sink: &dyn NotificationSink, result: &FiringResult, tenant: &TenantConfig) -> usize {
    match sink.notify(result, tenant).await {
        Ok(()) => 0,
        Err(e) => {
            let mr = result.merge_request();
            error!(
                "Failed to notify {} for merge request {} in project {}: {}",
                result.kind(),
                mr.iid,
                mr.project_id,
                e
            );
            1
        }
    }
}
