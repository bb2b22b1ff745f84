//! Stale discussion detector.
//!
//! A discussion fires when the reviewer is waiting on the author: the last
//! resolvable note is unresolved, was written by the merge request author,
//! and is older than the timeout.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use tracing::debug;

use crate::firing::fetch::{all_discussions, is_timed_out, open_merge_requests};
use crate::firing::types::FiringMergeRequest;
use crate::gitlab::{Discussion, MergeRequest, TrackerGateway, User};

pub async fn find_firing_merge_requests(
    gateway: &dyn TrackerGateway,
    group_id: i64,
    timeout: Duration,
    now: DateTime<Utc>,
    page_limit: u32,
) -> Vec<FiringMergeRequest> {
    let mut firing = Vec::new();

    for mr in open_merge_requests(gateway, group_id).await {
        let discussions = all_discussions(gateway, &mr, page_limit).await;
        debug!(
            "Got {} discussions for merge request {} in project {}",
            discussions.len(),
            mr.iid,
            mr.project_id
        );

        let firing_discussions = firing_discussions(&mr, discussions, timeout, now);
        if !firing_discussions.is_empty() {
            debug!(
                "Found {} firing discussions in merge request {} of project {}",
                firing_discussions.len(),
                mr.iid,
                mr.project_id
            );
            firing.push(FiringMergeRequest {
                merge_request: mr,
                discussions: firing_discussions,
            });
        }
    }

    firing
}

/// Firing discussions of one merge request, with system notes stripped.
pub fn firing_discussions(
    mr: &MergeRequest,
    discussions: Vec<Discussion>,
    timeout: Duration,
    now: DateTime<Utc>,
) -> Vec<Discussion> {
    discussions
        .into_iter()
        .filter(|discussion| is_discussion_firing(mr, discussion, timeout, now))
        .map(sanitize_notes)
        .collect()
}

pub fn is_discussion_firing(
    mr: &MergeRequest,
    discussion: &Discussion,
    timeout: Duration,
    now: DateTime<Utc>,
) -> bool {
    // Threads opened by the system ("changed this line ...") never fire.
    match discussion.notes.first() {
        Some(first) if first.resolvable => {}
        _ => return false,
    }

    let Some(last) = discussion.notes.iter().rev().find(|note| note.resolvable) else {
        return false;
    };

    !last.is_resolved()
        && mr.is_authored_by(&last.author)
        && is_timed_out(last.created_at, timeout, now)
}

/// Drops notes that are not resolvable, i.e. system notes.
pub fn sanitize_notes(mut discussion: Discussion) -> Discussion {
    discussion.notes.retain(|note| note.resolvable);
    discussion
}

/// Unique note authors other than the merge request author, ordered by id.
pub fn discussion_participants(mr: &MergeRequest, discussion: &Discussion) -> Vec<User> {
    let participants: BTreeMap<i64, &User> = discussion
        .notes
        .iter()
        .map(|note| &note.author)
        .filter(|author| !mr.is_authored_by(author))
        .map(|author| (author.id, author))
        .collect();

    participants.into_values().cloned().collect()
}
