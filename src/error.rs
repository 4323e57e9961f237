use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Validation errors (malformed or empty required input)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Inference attempted before both classifier slots are bound
    #[error("Model not ready: {0}")]
    ModelNotReady(String),

    /// Training or evaluation dataset missing
    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    /// Model artifact missing
    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    /// Classifier fitting failed
    #[error("Fit error: {0}")]
    Fit(String),

    /// Artifact persistence failed
    #[error("Persist error: {0}")]
    Persist(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal errors (anything else, wrapped with context)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::ModelNotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DatasetNotFound(_) => StatusCode::NOT_FOUND,
            AppError::ArtifactNotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Fit(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Persist(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::ModelNotReady(_) => "MODEL_NOT_READY",
            AppError::DatasetNotFound(_) => "DATASET_NOT_FOUND",
            AppError::ArtifactNotFound(_) => "ARTIFACT_NOT_FOUND",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Fit(_) => "FIT_FAILURE",
            AppError::Persist(_) => "PERSIST_FAILURE",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        tracing::error!(
            error_code = error_code,
            status_code = status.as_u16(),
            message = %message,
            "Request error"
        );

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
                "status": status.as_u16(),
            }
        }));

        (status, body).into_response()
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::Validation("test".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::ModelNotReady("test".to_string()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::DatasetNotFound("test".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Fit("test".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::ModelNotReady("test".to_string()).error_code(),
            "MODEL_NOT_READY"
        );
        assert_eq!(
            AppError::ArtifactNotFound("test".to_string()).error_code(),
            "ARTIFACT_NOT_FOUND"
        );
        assert_eq!(
            AppError::Persist("test".to_string()).error_code(),
            "PERSIST_FAILURE"
        );
    }
}
