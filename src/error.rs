use crate::engine::EngineError;
use crate::orchestration::ServiceError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// The ledger refused the transition.
    #[error("Rejected: {0}")]
    Rejected(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::UnauthorizedSettlement => AppError::Forbidden(err.to_string()),
            EngineError::UnknownIssuer(_) | EngineError::UnknownAsset(_) => {
                AppError::NotFound(err.to_string())
            }
            EngineError::Transfer(_) => AppError::Internal(err.to_string()),
            _ => AppError::Rejected(err.to_string()),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Engine(e) => e.into(),
            ServiceError::ForeignEngine(_) => AppError::Rejected(err.to_string()),
            ServiceError::ClockBeforeEpoch(_) => AppError::Internal(err.to_string()),
            ServiceError::Db(e) => e.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Rejected(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
