/// Domain-specific error types for infoquest
///
/// Only boundary-level failures live here. Provider, parse and upstream failures
/// have their own error types and are recovered inside the pipeline.

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl AppError {
    /// Helper to create validation errors with field names
    ///
    /// Example:
    /// ```
    /// use infoquest::errors::AppError;
    /// let err = AppError::validation("query", "Query is required");
    /// ```
    pub fn validation(field: &str, message: &str) -> Self {
        AppError::Validation {
            message: message.to_string(),
            field: Some(field.to_string()),
        }
    }

    /// Whether the error was caused by bad caller input rather than the service.
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation { .. })
    }
}
