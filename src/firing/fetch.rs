//! Fetch helpers shared by the detectors.
//!
//! Every remote failure is logged as a warning and downgraded to an empty
//! result for the affected item; nothing here returns an error.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::gitlab::{Discussion, MergeRequest, TrackerGateway, User, PAGE_SIZE};

/// Strictly after: a timestamp exactly `timeout` old is not timed out yet.
pub fn is_timed_out(at: DateTime<Utc>, timeout: Duration, now: DateTime<Utc>) -> bool {
    now > at + timeout
}

pub async fn open_merge_requests(gateway: &dyn TrackerGateway, group_id: i64) -> Vec<MergeRequest> {
    match gateway.list_open_merge_requests(group_id).await {
        Ok(mrs) => {
            debug!("Received {} merge requests for group {}", mrs.len(), group_id);
            mrs
        }
        Err(e) => {
            warn!("Failed to list merge requests for group {}: {}", group_id, e);
            Vec::new()
        }
    }
}

/// Open merge requests re-fetched through the changes endpoint. A merge
/// request whose detail cannot be fetched is left out.
pub async fn detailed_open_merge_requests(
    gateway: &dyn TrackerGateway,
    group_id: i64,
) -> Vec<MergeRequest> {
    let mut detailed = Vec::new();

    for mr in open_merge_requests(gateway, group_id).await {
        match gateway.get_merge_request_changes(mr.project_id, mr.iid).await {
            Ok(full) => detailed.push(full),
            Err(e) => warn!(
                "Failed to get changes for merge request {} in project {} (group {}): {}",
                mr.iid, mr.project_id, group_id, e
            ),
        }
    }

    detailed
}

/// All discussions of a merge request, paging until a short page.
///
/// A page exactly [`PAGE_SIZE`] long that happens to be the last one costs
/// one extra empty request. Paging also stops on a failed page and after
/// `page_limit` pages.
pub async fn all_discussions(
    gateway: &dyn TrackerGateway,
    mr: &MergeRequest,
    page_limit: u32,
) -> Vec<Discussion> {
    let mut discussions = Vec::new();

    for page in 1..=page_limit {
        match gateway
            .list_discussions(mr.project_id, mr.iid, page, PAGE_SIZE)
            .await
        {
            Ok(batch) => {
                let short_page = batch.len() < PAGE_SIZE as usize;
                discussions.extend(batch);
                if short_page {
                    return discussions;
                }
            }
            Err(e) => {
                warn!(
                    "Failed to get discussions page {} for merge request {} in project {}: {}",
                    page, mr.iid, mr.project_id, e
                );
                return discussions;
            }
        }
    }

    warn!(
        "Stopped paging discussions for merge request {} in project {} after {} pages",
        mr.iid, mr.project_id, page_limit
    );
    discussions
}

/// Participants of a merge request other than its author, or `None` when
/// the list could not be fetched.
pub async fn merge_request_participants(
    gateway: &dyn TrackerGateway,
    mr: &MergeRequest,
) -> Option<Vec<User>> {
    match gateway.list_participants(mr.project_id, mr.iid).await {
        Ok(all) => Some(
            all.into_iter()
                .filter(|user| !mr.is_authored_by(user))
                .collect(),
        ),
        Err(e) => {
            warn!(
                "Failed to get participants for merge request {} in project {}: {}",
                mr.iid, mr.project_id, e
            );
            None
        }
    }
}
