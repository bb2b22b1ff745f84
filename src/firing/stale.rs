//! Stale merge request detector: open, not a draft, and not updated for
//! longer than the timeout.

use chrono::{DateTime, Duration, Utc};

use crate::firing::fetch::{detailed_open_merge_requests, is_timed_out};
use crate::gitlab::{MergeRequest, TrackerGateway};

pub async fn find_stale_merge_requests(
    gateway: &dyn TrackerGateway,
    group_id: i64,
    timeout: Duration,
    now: DateTime<Utc>,
) -> Vec<MergeRequest> {
    let mrs = detailed_open_merge_requests(gateway, group_id).await;
    filter_stale(mrs, timeout, now)
}

pub fn filter_stale(
    mrs: impl IntoIterator<Item = MergeRequest>,
    timeout: Duration,
    now: DateTime<Utc>,
) -> Vec<MergeRequest> {
    mrs.into_iter()
        .filter(|mr| is_stale(mr, timeout, now))
        .collect()
}

pub fn is_stale(mr: &MergeRequest, timeout: Duration, now: DateTime<Utc>) -> bool {
    !mr.is_work_in_progress() && is_timed_out(mr.updated_at, timeout, now)
}
