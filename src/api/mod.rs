//! HTTP API for managing tenants ("clients").

pub mod clients;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::database::Database;
use crate::error::NotifierError;

pub fn router(database: Database) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/clients", get(clients::list).post(clients::create))
        .route(
            "/clients/:id",
            get(clients::get).put(clients::update).delete(clients::delete),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .into_inner(),
        )
        .with_state(database)
}

async fn root() -> &'static str {
    "ok"
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "review-notifier",
        "timestamp": chrono::Utc::now()
    }))
}

/// Error returned by API handlers, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError(NotifierError);

impl From<NotifierError> for ApiError {
    fn from(err: NotifierError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            NotifierError::NotFound(_) => StatusCode::NOT_FOUND,
            NotifierError::InvalidDuration(_) | NotifierError::Config(_) => StatusCode::BAD_REQUEST,
            other => {
                error!("API request failed: {}", other);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}
