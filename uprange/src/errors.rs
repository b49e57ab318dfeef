use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

/// Errors that escape a handler as an HTTP status.
///
/// Upload failures are not among them: the upload handler folds those into the rendered page.
/// Only transport-level rejections and broken views reach the client as non-200 responses.
#[derive(ThisError, Debug)]
pub enum Error {
    /// Request body (or one of its parts) exceeds the configured limits
    #[error("{message}")]
    PayloadTooLarge { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// A view template failed to render
    #[error(transparent)]
    Template(#[from] minijinja::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Internal { .. } | Error::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::PayloadTooLarge { message } => message.clone(),
            Error::Internal { .. } | Error::Template(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Internal { .. } | Error::Template(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::PayloadTooLarge { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        (self.status_code(), self.user_message()).into_response()
    }
}

/// Type alias for handler results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_too_large_keeps_message() {
        let err = Error::PayloadTooLarge {
            message: "part 0 exceeds the maximum size of 16 bytes".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.user_message(), "part 0 exceeds the maximum size of 16 bytes");
    }

    #[test]
    fn test_internal_errors_are_masked() {
        let err = Error::Internal {
            operation: "render upload page".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "Internal server error");
        assert_eq!(err.to_string(), "Failed to render upload page");
    }
}
