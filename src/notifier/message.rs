//! Message text for each kind of firing result.

use chrono::{DateTime, Duration, Utc};

use crate::database::TenantConfig;
use crate::firing::discussions::discussion_participants;
use crate::firing::FiringResult;
use crate::gitlab::{MergeRequest, User};

const NOTE_EXCERPT_CHARS: usize = 300;

/// Elapsed time limited to its two most significant units, e.g. `2days 3h`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let seconds = elapsed.num_seconds().max(0) as u64;
    let full = humantime::format_duration(std::time::Duration::from_secs(seconds)).to_string();
    full.split_whitespace().take(2).collect::<Vec<_>>().join(" ")
}

pub fn render(result: &FiringResult, tenant: &TenantConfig, now: DateTime<Utc>) -> String {
    match result {
        FiringResult::FiringDiscussion {
            merge_request,
            discussion,
        } => {
            let participants = discussion_participants(merge_request, discussion);
            let (excerpt, waiting) = match discussion.last_note() {
                Some(note) => (
                    excerpt(&note.body),
                    format_elapsed(now - note.created_at),
                ),
                None => (String::new(), String::new()),
            };

            let mut text = format!(
                "#### :fire: Discussion is waiting for {}\n{}\nWaiting for: {}\nParticipants: {}",
                mention(&merge_request.author),
                merge_request_line(merge_request),
                waiting,
                mentions(&participants),
            );
            if !excerpt.is_empty() {
                text.push_str(&format!("\n> {}", excerpt.replace('\n', "\n> ")));
            }
            text
        }
        FiringResult::StaleMergeRequest { merge_request } => {
            let mut text = format!(
                "#### :hourglass: Merge request is not updated\n{}\nAuthor: {}\nCreated: {} ago | Updated: {} ago",
                merge_request_line(merge_request),
                mention(&merge_request.author),
                format_elapsed(now - merge_request.created_at),
                format_elapsed(now - merge_request.updated_at),
            );
            append_mention(&mut text, &tenant.merge_request_old_mention);
            text
        }
        FiringResult::NeedsReview {
            merge_request,
            participants,
        } => {
            let mut text = format!(
                "#### :eyes: Merge request needs review\n{}\nAuthor: {}\nReviewers: {} of {} ({})\nCreated: {} ago | Updated: {} ago",
                merge_request_line(merge_request),
                mention(&merge_request.author),
                participants.len(),
                tenant.merge_request_reviewers_count,
                mentions(participants),
                format_elapsed(now - merge_request.created_at),
                format_elapsed(now - merge_request.updated_at),
            );
            append_mention(&mut text, &tenant.merge_request_review_mention);
            text
        }
    }
}

fn merge_request_line(mr: &MergeRequest) -> String {
    format!("[!{} {}]({})", mr.iid, mr.title, mr.web_url)
}

fn mention(user: &User) -> String {
    format!("@{}", user.username)
}

fn mentions(users: &[User]) -> String {
    if users.is_empty() {
        return "nobody yet".to_string();
    }
    users.iter().map(mention).collect::<Vec<_>>().join(", ")
}

fn append_mention(text: &mut String, mention: &str) {
    if !mention.trim().is_empty() {
        text.push('\n');
        text.push_str(mention.trim());
    }
}

fn excerpt(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= NOTE_EXCERPT_CHARS {
        return body.to_string();
    }
    let cut: String = body.chars().take(NOTE_EXCERPT_CHARS).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitlab::{Discussion, Note};
    use chrono::TimeZone;

    fn user(id: i64, username: &str) -> User {
        User {
            id,
            username: username.to_string(),
            name: username.to_string(),
            avatar_url: None,
            web_url: None,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 6, 10, 0, 0).unwrap()
    }

    fn mr() -> MergeRequest {
        MergeRequest {
            id: 1042,
            iid: 42,
            project_id: 7,
            title: "Add retries".to_string(),
            web_url: "https://gitlab.example.com/g/p/-/merge_requests/42".to_string(),
            state: "opened".to_string(),
            author: user(1, "alice"),
            work_in_progress: false,
            draft: false,
            created_at: t0(),
            updated_at: t0() + Duration::hours(1),
            changes_count: Some("3".to_string()),
        }
    }

    fn tenant() -> TenantConfig {
        TenantConfig {
            id: 1,
            group_id: 5,
            gitlab_token: "token".to_string(),
            webhook_url: "https://chat.example.com/hooks/abc".to_string(),
            discussion_firing_timeout: "2h".to_string(),
            merge_request_old_timeout: "72h".to_string(),
            merge_request_old_mention: "@backend-team".to_string(),
            merge_request_review_timeout: "48h".to_string(),
            merge_request_reviewers_count: 2,
            merge_request_review_mention: String::new(),
            created_at: t0(),
            updated_at: t0(),
        }
    }

    #[test]
    fn test_format_elapsed_two_units() {
        assert_eq!(format_elapsed(Duration::hours(50) + Duration::minutes(7)), "2days 2h");
        assert_eq!(format_elapsed(Duration::minutes(30)), "30m");
        assert_eq!(format_elapsed(Duration::seconds(-5)), "0s");
    }

    #[test]
    fn test_render_discussion() {
        let discussion = Discussion {
            id: "d1".to_string(),
            notes: vec![
                Note {
                    id: 1,
                    body: "Why not retry here?".to_string(),
                    author: user(2, "bob"),
                    created_at: t0(),
                    system: false,
                    resolvable: true,
                    resolved: Some(false),
                },
                Note {
                    id: 2,
                    body: "Will check".to_string(),
                    author: user(1, "alice"),
                    created_at: t0() + Duration::hours(1),
                    system: false,
                    resolvable: true,
                    resolved: Some(false),
                },
            ],
        };
        let result = FiringResult::FiringDiscussion {
            merge_request: mr(),
            discussion,
        };

        let text = render(&result, &tenant(), t0() + Duration::hours(4));
        assert!(text.contains("waiting for @alice"));
        assert!(text.contains("[!42 Add retries]"));
        assert!(text.contains("Waiting for: 3h"));
        assert!(text.contains("Participants: @bob"));
        assert!(text.contains("> Will check"));
    }

    #[test]
    fn test_render_stale_includes_mention() {
        let result = FiringResult::StaleMergeRequest { merge_request: mr() };
        let text = render(&result, &tenant(), t0() + Duration::hours(80));
        assert!(text.contains("not updated"));
        assert!(text.ends_with("@backend-team"));
    }

    #[test]
    fn test_render_needs_review() {
        let result = FiringResult::NeedsReview {
            merge_request: mr(),
            participants: vec![user(2, "bob")],
        };
        let text = render(&result, &tenant(), t0() + Duration::hours(50));
        assert!(text.contains("Reviewers: 1 of 2 (@bob)"));
        assert!(text.contains("Created: 2days 2h ago"));
    }

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        let long = "é".repeat(NOTE_EXCERPT_CHARS + 10);
        let cut = excerpt(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), NOTE_EXCERPT_CHARS + 3);
    }
}
