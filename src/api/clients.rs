use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::info;

use crate::api::ApiError;
use crate::database::{models::parse_timeout, Database, TenantConfig, TenantInput};
use crate::error::NotifierError;

type ApiResult<T> = Result<T, ApiError>;

pub async fn list(State(database): State<Database>) -> ApiResult<Json<Vec<TenantConfig>>> {
    let clients = database.clients().list().await?;
    Ok(Json(clients.into_iter().map(TenantConfig::masked).collect()))
}

pub async fn get(
    State(database): State<Database>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TenantConfig>> {
    let client = database.clients().get(id).await?;
    Ok(Json(client.masked()))
}

pub async fn create(
    State(database): State<Database>,
    Json(input): Json<TenantInput>,
) -> ApiResult<(StatusCode, Json<TenantConfig>)> {
    validate(&input)?;
    let client = database.clients().create(&input).await?;
    info!("Created client {} for group {}", client.id, client.group_id);
    Ok((StatusCode::CREATED, Json(client.masked())))
}

pub async fn update(
    State(database): State<Database>,
    Path(id): Path<i64>,
    Json(input): Json<TenantInput>,
) -> ApiResult<Json<TenantConfig>> {
    validate(&input)?;
    let client = database.clients().update(id, &input).await?;
    info!("Updated client {}", id);
    Ok(Json(client.masked()))
}

pub async fn delete(
    State(database): State<Database>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    database.clients().delete(id).await?;
    info!("Deleted client {}", id);
    Ok(StatusCode::NO_CONTENT)
}

fn validate(input: &TenantInput) -> Result<(), NotifierError> {
    if input.gitlab_token.trim().is_empty() {
        return Err(NotifierError::Config("gitlab_token is required".to_string()));
    }
    if input.webhook_url.trim().is_empty() {
        return Err(NotifierError::Config("webhook_url is required".to_string()));
    }
    if input.merge_request_reviewers_count < 0 {
        return Err(NotifierError::Config(
            "merge_request_reviewers_count must not be negative".to_string(),
        ));
    }

    parse_timeout(&input.discussion_firing_timeout)?;
    parse_timeout(&input.merge_request_old_timeout)?;
    parse_timeout(&input.merge_request_review_timeout)?;
    Ok(())
}
