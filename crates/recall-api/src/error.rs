use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use recall_db::StoreError;
use serde_json::json;
use thiserror::Error;

use crate::review::SchedulerError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    InvalidQuality(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    AlreadyExists(String),
    /// Safe for the caller to resubmit.
    #[error("{0}")]
    Contention(String),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Machine-readable code sent alongside the message.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::InvalidQuality(_) => "invalid_quality",
            Self::NotFound(_) => "not_found",
            Self::AlreadyExists(_) => "already_exists",
            Self::Contention(_) => "contention",
            Self::Store(_) => "internal",
        }
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidQuality(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyExists(_) | Self::Contention(_) => StatusCode::CONFLICT,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SchedulerError> for ApiError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::InvalidQuality(e) => Self::InvalidQuality(e.to_string()),
            SchedulerError::InvalidTelemetry(_) => Self::Validation(err.to_string()),
            SchedulerError::ItemNotFound | SchedulerError::UnknownOwner => {
                Self::NotFound(err.to_string())
            }
            SchedulerError::AlreadyAssigned => Self::AlreadyExists(err.to_string()),
            SchedulerError::Contention { .. } => Self::Contention(err.to_string()),
            SchedulerError::Store(e) => Self::Store(e),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Store(e) => {
                // Never echo storage details to the caller
                tracing::error!(error = %e, "storage failure");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let mut response = (
            status,
            Json(json!({
                "error": self.code(),
                "message": message,
            })),
        )
            .into_response();

        if matches!(self, Self::Contention(_)) {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        }

        response
    }
}
