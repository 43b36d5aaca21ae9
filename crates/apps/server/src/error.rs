use axum::http::StatusCode;
use stats::InputError;

use crate::results::StoreError;

/// Every failure a request can end in.
#[derive(Debug)]
pub enum AppError {
    /// Client input was rejected (400).
    Validation(String),
    /// No such route (404).
    NotFound,
    /// The route exists but not for this method (405).
    MethodNotAllowed,
    /// The result could not be saved (500).
    Persistence(StoreError),
    /// Anything else (500).
    Unclassified(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Persistence(_) | AppError::Unclassified(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The message shown to clients. Server-side detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::NotFound => "Not Found".to_string(),
            AppError::MethodNotAllowed => "Method Not Allowed".to_string(),
            AppError::Persistence(_) => "failed to save result".to_string(),
            AppError::Unclassified(_) => "internal server error".to_string(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "validation failed: {msg}"),
            AppError::NotFound => write!(f, "not found"),
            AppError::MethodNotAllowed => write!(f, "method not allowed"),
            AppError::Persistence(err) => write!(f, "persistence failed: {err}"),
            AppError::Unclassified(msg) => write!(f, "unexpected error: {msg}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<InputError> for AppError {
    fn from(err: InputError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Persistence(err)
    }
}
