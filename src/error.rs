use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

impl From<serde_json::Error> for CounselorError {
    fn from(err: serde_json::Error) -> Self {
        Self::ValidationError(format!("JSON error: {}", err))
    }
}

impl From<sqlx::Error> for CounselorError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound("Record not found".to_string()),
            other => Self::DatabaseError(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for CounselorError {
    fn from(err: reqwest::Error) -> Self {
        Self::UpstreamError(format!("HTTP request failed: {}", err))
    }
}

#[derive(Error, Debug)]
pub enum CounselorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded, retry in {wait_time_secs}s")]
    RateLimited { wait_time_secs: u64 },

    #[error("Language model error: {0}")]
    LlmError(String),

    #[error("Checkout error: {0}")]
    CheckoutError(String),

    #[error("Upstream error: {0}")]
    UpstreamError(String),
}

pub type CounselorResult<T> = Result<T, CounselorError>;

impl CounselorError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::ConfigError(_)
            | Self::DatabaseError(_)
            | Self::LlmError(_)
            | Self::CheckoutError(_)
            | Self::UpstreamError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn missing_field(field: &str) -> Self {
        Self::ValidationError(format!("Missing required field: {}", field))
    }

    pub fn missing_token() -> Self {
        Self::Unauthorized("Missing bearer token".to_string())
    }
}

impl IntoResponse for CounselorError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        match self {
            Self::RateLimited { wait_time_secs } => {
                let body = serde_json::json!({
                    "error": self.to_string(),
                    "waitTime": wait_time_secs,
                });
                let mut response = (status, Json(body)).into_response();
                response.headers_mut().insert(
                    header::RETRY_AFTER,
                    HeaderValue::from_str(&wait_time_secs.to_string())
                        .unwrap_or_else(|_| HeaderValue::from_static("60")),
                );
                response
            }
            other => (status, Json(serde_json::json!({ "error": other.to_string() })))
                .into_response(),
        }
    }
}
