//! Error types for LitGraph
//!
//! One `AppError` covers the engine and the gateway. Every variant maps to a
//! machine-readable `ErrorCode` and an HTTP status; server-side failures are
//! logged at `error`, rejected requests at `warn`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Request (1xxx)
    ValidationError,

    // Graph structure (2xxx)
    DanglingEdge,

    // Storage (3xxx)
    DatabaseError,
    ConnectionError,
    IoError,

    // Upstream services (4xxx)
    SearchIndexError,
    CacheError,

    // Internal (9xxx)
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Numeric form, grouped by the thousands digit
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,
            ErrorCode::DanglingEdge => 2001,
            ErrorCode::DatabaseError => 3001,
            ErrorCode::ConnectionError => 3002,
            ErrorCode::IoError => 3003,
            ErrorCode::SearchIndexError => 4001,
            ErrorCode::CacheError => 4002,
            ErrorCode::ConfigurationError => 9001,
            ErrorCode::SerializationError => 9002,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    /// A request or build parameter is out of range
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// An edge endpoint is missing from the assembled node set
    #[error("Edge in layer '{layer}' references unknown entity '{entity}'")]
    DanglingEdge { layer: String, entity: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    /// Sidecar context files and graph export files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Search index error: {message}")]
    SearchIndex { message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Shorthand for configuration failures
    pub fn config(message: impl Into<String>) -> Self {
        AppError::Configuration {
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::DanglingEdge { .. } => ErrorCode::DanglingEdge,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::Io(_) => ErrorCode::IoError,
            AppError::SearchIndex { .. } => ErrorCode::SearchIndexError,
            AppError::Cache { .. } => ErrorCode::CacheError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,

            AppError::SearchIndex { .. } => StatusCode::BAD_GATEWAY,

            AppError::DatabaseConnection { .. } | AppError::Cache { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            AppError::DanglingEdge { .. }
            | AppError::Database(_)
            | AppError::Io(_)
            | AppError::Configuration { .. }
            | AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// JSON error body returned by the gateway
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        if self.is_server_error() {
            tracing::error!(error = %message, code = ?code, status = status.as_u16(), "Request failed");
        } else {
            tracing::warn!(error = %message, code = ?code, status = status.as_u16(), "Request rejected");
        }

        let field = match self {
            AppError::Validation { field, .. } => field,
            _ => None,
        };

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message,
                field,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Cache {
            message: err.to_string(),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::config(err.to_string())
    }
}
