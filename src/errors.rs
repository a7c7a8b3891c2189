use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{0} must be present in request")]
    MissingField(&'static str),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("token is not valid")]
    Unauthorized,

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Configuration(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::MissingField(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors embed the URL, which never carries credentials here
        AppError::Upstream(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (error_type, code, msg) = match &self {
            AppError::Configuration(e) => {
                tracing::error!("Configuration error: {}", e);
                (
                    "configuration_error",
                    "missing_configuration",
                    "server is not configured for this request".to_string(),
                )
            }
            AppError::MissingField(_) => (
                "invalid_request_error",
                "missing_field",
                self.to_string(),
            ),
            AppError::Validation(e) => ("invalid_request_error", "invalid_payload", e.clone()),
            AppError::Unauthorized => (
                "authentication_error",
                "invalid_token",
                "token is not valid".to_string(),
            ),
            AppError::Upstream(e) => {
                tracing::warn!("Upstream error: {}", e);
                ("upstream_error", "upstream_failed", e.clone())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                (
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (self.status(), body).into_response()
    }
}
