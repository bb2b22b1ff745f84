use thiserror::Error;

impl From<sqlx::Error> for NotifierError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound("row not found".to_string()),
            other => Self::Database(format!("Database error: {}", other)),
        }
    }
}

impl From<reqwest::Error> for NotifierError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<config::ConfigError> for NotifierError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Schedule error: {0}")]
    Schedule(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("GitLab API error ({status}) at {endpoint}: {message}")]
    GitLab {
        status: u16,
        endpoint: String,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),
}

pub type Result<T> = std::result::Result<T, NotifierError>;

impl NotifierError {
    pub fn gitlab(status: u16, endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GitLab {
            status,
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }
}
