use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::database::models::{TenantConfig, TenantInput};
use crate::error::{NotifierError, Result};
use crate::firing::TenantSource;

const SELECT_CLIENT: &str = r#"
    SELECT id, group_id, gitlab_token, webhook_url,
           discussion_firing_timeout, merge_request_old_timeout, merge_request_old_mention,
           merge_request_review_timeout, merge_request_reviewers_count, merge_request_review_mention,
           created_at, updated_at
    FROM clients
"#;

#[derive(Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64) -> Result<TenantConfig> {
        sqlx::query_as::<_, TenantConfig>(&format!("{} WHERE id = ?", SELECT_CLIENT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| NotifierError::NotFound(format!("client {}", id)))
    }

    pub async fn list(&self) -> Result<Vec<TenantConfig>> {
        let clients = sqlx::query_as::<_, TenantConfig>(&format!("{} ORDER BY id", SELECT_CLIENT))
            .fetch_all(&self.pool)
            .await?;
        Ok(clients)
    }

    pub async fn create(&self, input: &TenantInput) -> Result<TenantConfig> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO clients (
                group_id, gitlab_token, webhook_url,
                discussion_firing_timeout, merge_request_old_timeout, merge_request_old_mention,
                merge_request_review_timeout, merge_request_reviewers_count, merge_request_review_mention,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(input.group_id)
        .bind(&input.gitlab_token)
        .bind(&input.webhook_url)
        .bind(&input.discussion_firing_timeout)
        .bind(&input.merge_request_old_timeout)
        .bind(&input.merge_request_old_mention)
        .bind(&input.merge_request_review_timeout)
        .bind(input.merge_request_reviewers_count)
        .bind(&input.merge_request_review_mention)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get(result.last_insert_rowid()).await
    }

    pub async fn update(&self, id: i64, input: &TenantInput) -> Result<TenantConfig> {
        let result = sqlx::query(
            r#"
            UPDATE clients SET
                group_id = ?,
                gitlab_token = ?,
                webhook_url = ?,
                discussion_firing_timeout = ?,
                merge_request_old_timeout = ?,
                merge_request_old_mention = ?,
                merge_request_review_timeout = ?,
                merge_request_reviewers_count = ?,
                merge_request_review_mention = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(input.group_id)
        .bind(&input.gitlab_token)
        .bind(&input.webhook_url)
        .bind(&input.discussion_firing_timeout)
        .bind(&input.merge_request_old_timeout)
        .bind(&input.merge_request_old_mention)
        .bind(&input.merge_request_review_timeout)
        .bind(input.merge_request_reviewers_count)
        .bind(&input.merge_request_review_mention)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(NotifierError::NotFound(format!("client {}", id)));
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(NotifierError::NotFound(format!("client {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl TenantSource for ClientRepository {
    async fn list_tenants(&self) -> Result<Vec<TenantConfig>> {
        self.list().await
    }
}
