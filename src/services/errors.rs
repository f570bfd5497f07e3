//! Central application error type and its HTTP envelope.
//!
//! Every service in `services/` returns `AppResult<T>`. Controllers propagate
//! `AppError` with `?` and axum converts it to the JSON envelope via
//! `IntoResponse`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Validation { error_code: String, message: String },

    #[error("{message}")]
    ExternalServiceError { error_code: String, message: String },

    #[error("provider request timed out: {0}")]
    ExternalServiceTimeout(String),

    #[error("database unavailable: {0}")]
    DatabaseUnavailable(String),

    #[error("database error: {0}")]
    DatabaseInternal(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(error_code: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            error_code: error_code.to_string(),
            message: message.into(),
        }
    }

    pub fn external(error_code: &str, message: impl Into<String>) -> Self {
        Self::ExternalServiceError {
            error_code: error_code.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    fn class_name(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NotFound",
            Self::Validation { .. } => "Validation",
            Self::ExternalServiceError { .. } => "ExternalServiceError",
            Self::ExternalServiceTimeout(_) => "ExternalServiceTimeout",
            Self::DatabaseUnavailable(_) => "DatabaseUnavailable",
            Self::DatabaseInternal(_) => "DatabaseInternal",
            Self::Unexpected(_) => "Unexpected",
        }
    }

    fn error_code(&self) -> String {
        match self {
            Self::NotFound(_) => "not_found".to_string(),
            Self::Validation { error_code, .. } => error_code.clone(),
            Self::ExternalServiceError { error_code, .. } => error_code.clone(),
            Self::ExternalServiceTimeout(_) => "external_service_timeout".to_string(),
            Self::DatabaseUnavailable(_) => "database_unavailable".to_string(),
            Self::DatabaseInternal(_) => "database_internal".to_string(),
            Self::Unexpected(_) => "unexpected".to_string(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::ExternalServiceError { .. } => StatusCode::BAD_GATEWAY,
            Self::ExternalServiceTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::DatabaseUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::DatabaseInternal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Attach this error to a trace id and render the wire envelope.
    pub fn to_envelope(&self, trace_id: &str, debug: bool, context: Option<Value>) -> ErrorEnvelope {
        if matches!(self, Self::Unexpected(_)) {
            tracing::error!(error_code = %self.error_code(), trace_id, "unexpected error: {}", self);
        } else {
            tracing::warn!(error_code = %self.error_code(), trace_id, "{}", self);
        }

        ErrorEnvelope {
            success: false,
            error: self.class_name(),
            error_code: self.error_code(),
            message: self.to_string(),
            trace_id: trace_id.to_string(),
            datetime: chrono::Utc::now().to_rfc3339(),
            context: if debug { context } else { None },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: &'static str,
    pub error_code: String,
    pub message: String,
    pub trace_id: String,
    pub datetime: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let trace_id = crate::middleware::trace_id::current_trace_id()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let context = crate::middleware::trace_id::current_context();
        let debug = std::env::var("DEBUG").map(|v| v == "true" || v == "1").unwrap_or(false);
        let status = self.status();
        let envelope = self.to_envelope(&trace_id, debug, context);
        (status, Json(envelope)).into_response()
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::DatabaseInternal(err.to_string())
    }
}

impl From<loco_rs::Error> for AppError {
    fn from(err: loco_rs::Error) -> Self {
        AppError::Unexpected(err.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::DatabaseUnavailable(err.to_string())
    }
}
