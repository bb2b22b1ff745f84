#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use review_notifier::database::{Database, TenantConfig, TenantInput};
use review_notifier::firing::{FiringResult, TenantSource};
use review_notifier::gitlab::{
    Discussion, GatewayFactory, MergeRequest, Note, TrackerGateway, User,
};
use review_notifier::{NotifierError, Result};

/// Setup an in-memory SQLite database for testing
pub async fn setup_test_db() -> Database {
    let db = Database::new_in_memory()
        .await
        .expect("Failed to create test database");
    db.run_migrations().await.expect("Failed to run migrations");
    db
}

/// Wednesday 2024-03-06 10:00 UTC
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 6, 10, 0, 0).unwrap()
}

pub fn user(id: i64, username: &str) -> User {
    User {
        id,
        username: username.to_string(),
        name: username.to_string(),
        avatar_url: None,
        web_url: None,
    }
}

pub fn alice() -> User {
    user(1, "alice")
}

pub fn bob() -> User {
    user(2, "bob")
}

pub fn carol() -> User {
    user(3, "carol")
}

pub fn merge_request(project_id: i64, iid: i64, author: User, created_at: DateTime<Utc>) -> MergeRequest {
    MergeRequest {
        id: project_id * 1000 + iid,
        iid,
        project_id,
        title: format!("Merge request {}", iid),
        web_url: format!("https://gitlab.example.com/p/{}/-/merge_requests/{}", project_id, iid),
        state: "opened".to_string(),
        author,
        work_in_progress: false,
        draft: false,
        created_at,
        updated_at: created_at,
        changes_count: None,
    }
}

pub fn note(id: i64, author: User, created_at: DateTime<Utc>) -> Note {
    Note {
        id,
        body: format!("note {}", id),
        author,
        created_at,
        system: false,
        resolvable: true,
        resolved: Some(false),
    }
}

pub fn system_note(id: i64, author: User, created_at: DateTime<Utc>) -> Note {
    Note {
        system: true,
        resolvable: false,
        resolved: None,
        ..note(id, author, created_at)
    }
}

pub fn discussion(id: &str, notes: Vec<Note>) -> Discussion {
    Discussion {
        id: id.to_string(),
        notes,
    }
}

/// The stale-discussion scenario: reviewer asks at t0, author answers at
/// t0+1h, nothing resolved.
pub fn waiting_discussion(id: &str) -> Discussion {
    discussion(
        id,
        vec![note(1, bob(), t0()), note(2, alice(), t0() + Duration::hours(1))],
    )
}

pub fn tenant(id: i64, group_id: i64) -> TenantConfig {
    TenantConfig {
        id,
        group_id,
        gitlab_token: format!("token-{}", id),
        webhook_url: format!("https://chat.example.com/hooks/{}", id),
        discussion_firing_timeout: String::new(),
        merge_request_old_timeout: String::new(),
        merge_request_old_mention: String::new(),
        merge_request_review_timeout: String::new(),
        merge_request_reviewers_count: 0,
        merge_request_review_mention: String::new(),
        created_at: t0(),
        updated_at: t0(),
    }
}

pub fn tenant_input(group_id: i64) -> TenantInput {
    TenantInput {
        group_id,
        gitlab_token: "glpat-secret".to_string(),
        webhook_url: "https://chat.example.com/hooks/secret".to_string(),
        discussion_firing_timeout: "2h".to_string(),
        merge_request_old_timeout: "72h".to_string(),
        merge_request_old_mention: "@team".to_string(),
        merge_request_review_timeout: "48h".to_string(),
        merge_request_reviewers_count: 2,
        merge_request_review_mention: String::new(),
    }
}

/// In-memory GitLab snapshot.
#[derive(Default)]
pub struct FakeTracker {
    pub merge_requests: HashMap<i64, Vec<MergeRequest>>,
    pub discussions: HashMap<(i64, i64), Vec<Discussion>>,
    pub participants: HashMap<(i64, i64), Vec<User>>,
    pub failing_groups: HashSet<i64>,
    pub failing_changes: HashSet<(i64, i64)>,
    /// `(project_id, iid, page)` of discussion pages that fail.
    pub failing_discussion_pages: HashSet<(i64, i64, u32)>,
    pub failing_participants: HashSet<(i64, i64)>,
    pub discussion_requests: AtomicUsize,
    pub participant_requests: AtomicUsize,
}

impl FakeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_merge_request(mut self, group_id: i64, mr: MergeRequest) -> Self {
        self.merge_requests.entry(group_id).or_default().push(mr);
        self
    }

    pub fn with_discussions(mut self, mr: &MergeRequest, discussions: Vec<Discussion>) -> Self {
        self.discussions.insert((mr.project_id, mr.iid), discussions);
        self
    }

    pub fn with_participants(mut self, mr: &MergeRequest, participants: Vec<User>) -> Self {
        self.participants.insert((mr.project_id, mr.iid), participants);
        self
    }

    pub fn discussion_requests(&self) -> usize {
        self.discussion_requests.load(Ordering::SeqCst)
    }

    pub fn participant_requests(&self) -> usize {
        self.participant_requests.load(Ordering::SeqCst)
    }

    fn find(&self, project_id: i64, mr_iid: i64) -> Option<&MergeRequest> {
        self.merge_requests
            .values()
            .flatten()
            .find(|mr| mr.project_id == project_id && mr.iid == mr_iid)
    }
}

fn remote_error(endpoint: &str) -> NotifierError {
    NotifierError::gitlab(500, endpoint, "500 Internal Server Error")
}

#[async_trait]
impl TrackerGateway for FakeTracker {
    async fn list_open_merge_requests(&self, group_id: i64) -> Result<Vec<MergeRequest>> {
        if self.failing_groups.contains(&group_id) {
            return Err(remote_error("merge_requests"));
        }
        Ok(self.merge_requests.get(&group_id).cloned().unwrap_or_default())
    }

    async fn get_merge_request_changes(&self, project_id: i64, mr_iid: i64) -> Result<MergeRequest> {
        if self.failing_changes.contains(&(project_id, mr_iid)) {
            return Err(remote_error("changes"));
        }
        let mut mr = self
            .find(project_id, mr_iid)
            .cloned()
            .ok_or_else(|| NotifierError::gitlab(404, "changes", "404 Not found"))?;
        mr.changes_count = Some("1".to_string());
        Ok(mr)
    }

    async fn list_discussions(
        &self,
        project_id: i64,
        mr_iid: i64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Discussion>> {
        self.discussion_requests.fetch_add(1, Ordering::SeqCst);
        if self.failing_discussion_pages.contains(&(project_id, mr_iid, page)) {
            return Err(remote_error("discussions"));
        }
        let all = self
            .discussions
            .get(&(project_id, mr_iid))
            .cloned()
            .unwrap_or_default();
        let start = ((page - 1) * per_page) as usize;
        Ok(all.into_iter().skip(start).take(per_page as usize).collect())
    }

    async fn list_participants(&self, project_id: i64, mr_iid: i64) -> Result<Vec<User>> {
        self.participant_requests.fetch_add(1, Ordering::SeqCst);
        if self.failing_participants.contains(&(project_id, mr_iid)) {
            return Err(remote_error("participants"));
        }
        Ok(self
            .participants
            .get(&(project_id, mr_iid))
            .cloned()
            .unwrap_or_default())
    }
}

/// Hands out one fake tracker per token; unknown tokens fail.
#[derive(Default)]
pub struct FakeFactory {
    pub trackers: HashMap<String, Arc<FakeTracker>>,
}

impl FakeFactory {
    pub fn with(mut self, token: &str, tracker: Arc<FakeTracker>) -> Self {
        self.trackers.insert(token.to_string(), tracker);
        self
    }
}

impl GatewayFactory for FakeFactory {
    fn make_gateway(&self, token: &str) -> Result<Arc<dyn TrackerGateway>> {
        self.trackers
            .get(token)
            .cloned()
            .map(|tracker| tracker as Arc<dyn TrackerGateway>)
            .ok_or_else(|| NotifierError::Config(format!("unknown token {}", token)))
    }
}

pub struct StaticTenants(pub Vec<TenantConfig>);

#[async_trait]
impl TenantSource for StaticTenants {
    async fn list_tenants(&self) -> Result<Vec<TenantConfig>> {
        Ok(self.0.clone())
    }
}

/// Tenant source whose listing fails while `failing` is set.
pub struct FlakyTenants {
    pub tenants: Vec<TenantConfig>,
    pub failing: AtomicBool,
}

impl FlakyTenants {
    pub fn failing(tenants: Vec<TenantConfig>) -> Self {
        Self {
            tenants,
            failing: AtomicBool::new(true),
        }
    }

    pub fn recover(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl TenantSource for FlakyTenants {
    async fn list_tenants(&self) -> Result<Vec<TenantConfig>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifierError::Database("database is locked".to_string()));
        }
        Ok(self.tenants.clone())
    }
}

/// Records every delivery; fails for webhooks listed in `failing_webhooks`.
#[derive(Default)]
pub struct RecordingSink {
    pub delivered: Mutex<Vec<(i64, FiringResult)>>,
    pub failing_webhooks: HashSet<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<(i64, FiringResult)> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.delivered().iter().map(|(_, result)| result.kind()).collect()
    }
}

#[async_trait]
impl review_notifier::notifier::NotificationSink for RecordingSink {
    async fn notify(&self, result: &FiringResult, tenant: &TenantConfig) -> Result<()> {
        if self.failing_webhooks.contains(&tenant.webhook_url) {
            return Err(NotifierError::Delivery("webhook returned 500".to_string()));
        }
        self.delivered
            .lock()
            .unwrap()
            .push((tenant.id, result.clone()));
        Ok(())
    }
}
