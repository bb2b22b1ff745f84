//! Needs-review detector: an open, non-draft merge request that has existed
//! longer than the timeout while fewer than the required number of people
//! besides its author took part in it.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::firing::fetch::{detailed_open_merge_requests, is_timed_out, merge_request_participants};
use crate::gitlab::{MergeRequest, TrackerGateway, User};

pub async fn find_merge_requests_needing_review(
    gateway: &dyn TrackerGateway,
    group_id: i64,
    timeout: Duration,
    required_reviewers: usize,
    now: DateTime<Utc>,
) -> Vec<(MergeRequest, Vec<User>)> {
    let mut result = Vec::new();

    for mr in detailed_open_merge_requests(gateway, group_id).await {
        // Participants are only fetched for merge requests past the age check.
        if mr.is_work_in_progress() || !is_timed_out(mr.created_at, timeout, now) {
            continue;
        }

        let Some(participants) = merge_request_participants(gateway, &mr).await else {
            continue;
        };

        if needs_review(&mr, &participants, timeout, required_reviewers, now) {
            debug!(
                "Merge request {} in project {} has {} of {} reviewers",
                mr.iid,
                mr.project_id,
                participants.len(),
                required_reviewers
            );
            result.push((mr, participants));
        }
    }

    result
}

pub fn needs_review(
    mr: &MergeRequest,
    participants: &[User],
    timeout: Duration,
    required_reviewers: usize,
    now: DateTime<Utc>,
) -> bool {
    !mr.is_work_in_progress()
        && is_timed_out(mr.created_at, timeout, now)
        && participants.len() < required_reviewers
}
