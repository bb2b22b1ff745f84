//! GitLab API v4 client.

use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::{NotifierError, Result};
use crate::gitlab::types::{Discussion, MergeRequest, User};
use crate::gitlab::{GatewayFactory, TrackerGateway, PAGE_SIZE};

#[derive(Debug, Clone)]
pub struct GitLabClientConfig {
    /// Base URL of the GitLab instance, e.g. `https://gitlab.com`.
    pub base_url: String,
    pub token: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
struct ListQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a str>,
    page: u32,
    per_page: u32,
}

#[derive(Debug, Clone)]
pub struct GitLabClient {
    client: Client,
    base_url: String,
}

impl GitLabClient {
    pub fn new(config: GitLabClientConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        let token = header::HeaderValue::from_str(&config.token)
            .map_err(|_| NotifierError::Config("invalid GitLab token format".to_string()))?;
        headers.insert("PRIVATE-TOKEN", token);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NotifierError::Config(format!("build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v4{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: Option<&ListQuery<'_>>,
    ) -> Result<T> {
        let mut request = self.client.get(self.api_url(endpoint));
        if let Some(q) = query {
            request = request.query(q);
        }

        debug!("GET {}", endpoint);
        let response = request.send().await?;
        Self::handle_response(response, endpoint).await
    }

    async fn handle_response<T: DeserializeOwned>(response: Response, endpoint: &str) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|e| {
                NotifierError::gitlab(status.as_u16(), endpoint, format!("parse response: {}", e))
            });
        }

        let body = response.text().await.unwrap_or_default();
        // GitLab reports errors as {"message": ...} or {"error": ...}
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("message")
                    .or_else(|| v.get("error"))
                    .map(|m| m.as_str().map_or_else(|| m.to_string(), str::to_string))
            })
            .unwrap_or(body);

        Err(NotifierError::gitlab(status.as_u16(), endpoint, message))
    }
}

#[async_trait]
impl TrackerGateway for GitLabClient {
    async fn list_open_merge_requests(&self, group_id: i64) -> Result<Vec<MergeRequest>> {
        let endpoint = format!("/groups/{}/merge_requests", group_id);
        let query = ListQuery {
            state: Some("opened"),
            page: 1,
            per_page: PAGE_SIZE,
        };
        self.get(&endpoint, Some(&query)).await
    }

    async fn get_merge_request_changes(
        &self,
        project_id: i64,
        mr_iid: i64,
    ) -> Result<MergeRequest> {
        let endpoint = format!("/projects/{}/merge_requests/{}/changes", project_id, mr_iid);
        self.get(&endpoint, None).await
    }

    async fn list_discussions(
        &self,
        project_id: i64,
        mr_iid: i64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Discussion>> {
        let endpoint = format!("/projects/{}/merge_requests/{}/discussions", project_id, mr_iid);
        let query = ListQuery {
            state: None,
            page,
            per_page,
        };
        self.get(&endpoint, Some(&query)).await
    }

    async fn list_participants(&self, project_id: i64, mr_iid: i64) -> Result<Vec<User>> {
        let endpoint = format!("/projects/{}/merge_requests/{}/participants", project_id, mr_iid);
        self.get(&endpoint, None).await
    }
}

/// Makes one [`GitLabClient`] per tenant token against a single instance.
#[derive(Debug, Clone)]
pub struct GitLabClientFactory {
    base_url: String,
    timeout_secs: u64,
}

impl GitLabClientFactory {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs,
        }
    }
}

impl GatewayFactory for GitLabClientFactory {
    fn make_gateway(&self, token: &str) -> Result<Arc<dyn TrackerGateway>> {
        let client = GitLabClient::new(GitLabClientConfig {
            base_url: self.base_url.clone(),
            token: token.to_string(),
            timeout_secs: self.timeout_secs,
        })?;
        Ok(Arc::new(client))
    }
}
