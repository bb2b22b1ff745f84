use crate::gitlab::{Discussion, MergeRequest, User};

/// A merge request together with every discussion in it that is firing.
#[derive(Debug, Clone, PartialEq)]
pub struct FiringMergeRequest {
    pub merge_request: MergeRequest,
    pub discussions: Vec<Discussion>,
}

/// Something stale enough to notify about. One notification is sent per
/// value.
#[derive(Debug, Clone, PartialEq)]
pub enum FiringResult {
    FiringDiscussion {
        merge_request: MergeRequest,
        discussion: Discussion,
    },
    StaleMergeRequest {
        merge_request: MergeRequest,
    },
    NeedsReview {
        merge_request: MergeRequest,
        participants: Vec<User>,
    },
}

impl FiringResult {
    pub fn merge_request(&self) -> &MergeRequest {
        match self {
            FiringResult::FiringDiscussion { merge_request, .. }
            | FiringResult::StaleMergeRequest { merge_request }
            | FiringResult::NeedsReview { merge_request, .. } => merge_request,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FiringResult::FiringDiscussion { .. } => "firing_discussion",
            FiringResult::StaleMergeRequest { .. } => "stale_merge_request",
            FiringResult::NeedsReview { .. } => "needs_review",
        }
    }
}

impl FiringMergeRequest {
    pub fn into_results(self) -> impl Iterator<Item = FiringResult> {
        let merge_request = self.merge_request;
        self.discussions
            .into_iter()
            .map(move |discussion| FiringResult::FiringDiscussion {
                merge_request: merge_request.clone(),
                discussion,
            })
    }
}
