use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by request handlers.
///
/// Client errors (`NotFound`, `BadRequest`, `ValidationError`) map to a bare
/// status code with an empty body. Server-side failures map to a generic
/// JSON body; their details only go to the log.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Service Unavailable")]
    ServiceUnavailable,

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(anyhow::Error::new(err))
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InternalError(_) | AppError::DatabaseError(_) | AppError::ConfigError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
        }

        let status = self.status_code();

        let error = match &self {
            AppError::ValidationError(err) => {
                tracing::debug!(error = %err, "Rejected invalid payload");
                return status.into_response();
            }
            AppError::BadRequest(err) => {
                tracing::debug!(error = %err, "Rejected malformed request");
                return status.into_response();
            }
            AppError::NotFound(err) => {
                tracing::debug!(error = %err, "Resource not found");
                return status.into_response();
            }
            AppError::ServiceUnavailable => "Service unavailable",
            AppError::InternalError(_) => "Internal server error",
            AppError::DatabaseError(_) => "Database error",
            AppError::ConfigError(_) => "Configuration error",
        };

        tracing::error!(error = ?self, "Request failed");

        (status, Json(ErrorResponse { error })).into_response()
    }
}
