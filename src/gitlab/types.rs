use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeRequest {
    pub id: i64,
    pub iid: i64,
    pub project_id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub web_url: String,
    #[serde(default)]
    pub state: String,
    pub author: User,
    #[serde(default)]
    pub work_in_progress: bool,
    #[serde(default)]
    pub draft: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Only present on the full-detail (`/changes`) representation.
    #[serde(default)]
    pub changes_count: Option<String>,
}

impl MergeRequest {
    /// Legacy `work_in_progress` and the newer `draft` flag both count.
    pub fn is_work_in_progress(&self) -> bool {
        self.work_in_progress || self.draft
    }

    pub fn is_authored_by(&self, user: &User) -> bool {
        self.author.username == user.username
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    #[serde(default)]
    pub body: String,
    pub author: User,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub system: bool,
    #[serde(default)]
    pub resolvable: bool,
    #[serde(default)]
    pub resolved: Option<bool>,
}

impl Note {
    pub fn is_resolved(&self) -> bool {
        self.resolved.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discussion {
    pub id: String,
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl Discussion {
    pub fn last_note(&self) -> Option<&Note> {
        self.notes.last()
    }
}
