use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::publish::PublishError;
use crate::session::SessionError;
use crate::tasks::AutoPublishError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Limit reached: {0}")]
    LimitReached(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(_) => AppError::NotFound(err.to_string()),
            SessionError::InvalidId(_) => AppError::Validation(err.to_string()),
            SessionError::LimitReached(_) => AppError::LimitReached(err.to_string()),
        }
    }
}

impl From<AutoPublishError> for AppError {
    fn from(err: AutoPublishError) -> Self {
        match err {
            AutoPublishError::InvalidRequest(_) => AppError::Validation(err.to_string()),
            AutoPublishError::NotFound(_) => AppError::NotFound(err.to_string()),
            AutoPublishError::LimitReached(_) => AppError::LimitReached(err.to_string()),
            AutoPublishError::Session(e) => e.into(),
        }
    }
}

impl From<PublishError> for AppError {
    fn from(err: PublishError) -> Self {
        match err {
            PublishError::EmptyTopic | PublishError::InvalidQos(_) => {
                AppError::Validation(err.to_string())
            }
            PublishError::SinkClosed(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Check if running in production mode (based on RUN_MODE env var)
fn is_production() -> bool {
    std::env::var("RUN_MODE")
        .map(|m| m == "production" || m == "prod")
        .unwrap_or(false)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, client_message, log_message) = match &self {
            AppError::Config(e) => {
                let log_msg = e.to_string();
                let client_msg = if is_production() {
                    "Configuration error".to_string()
                } else {
                    log_msg.clone()
                };
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR", client_msg, log_msg)
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                msg.clone(),
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                msg.clone(),
                msg.clone(),
            ),
            AppError::LimitReached(msg) => (
                StatusCode::TOO_MANY_REQUESTS,
                "LIMIT_REACHED",
                msg.clone(),
                msg.clone(),
            ),
            AppError::Internal(e) => {
                let log_msg = e.clone();
                let client_msg = if is_production() {
                    "Internal server error".to_string()
                } else {
                    log_msg.clone()
                };
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", client_msg, log_msg)
            }
        };

        if status.is_server_error() {
            tracing::error!(
                code = %code,
                status = %status.as_u16(),
                message = %log_message,
                "API error"
            );
        } else {
            tracing::debug!(
                code = %code,
                status = %status.as_u16(),
                message = %log_message,
                "API request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: client_message,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::LimitReached("x".into()), StatusCode::TOO_MANY_REQUESTS),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_domain_error_conversion() {
        let err: AppError = SessionError::NotFound("s".into()).into();
        assert!(matches!(err, AppError::NotFound(_)));

        let err: AppError = AutoPublishError::LimitReached(3).into();
        assert!(matches!(err, AppError::LimitReached(_)));

        let err: AppError = AutoPublishError::Session(SessionError::InvalidId("x".into())).into();
        assert!(matches!(err, AppError::Validation(_)));

        let err: AppError = PublishError::InvalidQos(7).into();
        assert!(matches!(err, AppError::Validation(_)));

        let err: AppError = PublishError::SinkClosed("gone".into()).into();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
