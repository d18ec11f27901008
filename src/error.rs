//! Error types for the ACI policy group tool

use thiserror::Error;

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("state is {state} but all of the following are missing: {missing}")]
    MissingParameter { state: String, missing: String },

    #[error("invalid lag_type '{0}': expected one of leaf, link, node")]
    InvalidLagType(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// API-specific errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limited - retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Error object returned by the controller inside `imdata`
    #[error("APIC Error {code}: {text}")]
    Apic { status: u16, code: String, text: String },

    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Controller error code and text, when the controller supplied them
    pub fn apic_error(&self) -> Option<(&str, &str)> {
        match self {
            ApiError::Apic { code, text, .. } => Some((code, text)),
            _ => None,
        }
    }
}

/// Result type alias for AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for ApiError
pub type ApiResult<T> = std::result::Result<T, ApiError>;
