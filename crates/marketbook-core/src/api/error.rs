use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The API rejected the request with a message meant for the user
    #[error("{message}")]
    Reported { status: StatusCode, message: String },

    #[error("Unauthorized - session is no longer valid")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error payload returned by the API: `{"message": "..."}` or
/// `{"message": ["...", "..."]}` for validation failures
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: ErrorMessage,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    fn reported_message(body: &str) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        let message = match parsed.message {
            ErrorMessage::One(message) => message,
            ErrorMessage::Many(messages) => messages.join("\n"),
        };
        let message = message.trim().to_string();
        (!message.is_empty()).then_some(message)
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        if let Some(message) = Self::reported_message(body) {
            return ApiError::Reported { status, message };
        }

        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            404 => ApiError::NotFound(truncated),
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Reported { status, .. } => Some(*status),
            ApiError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            ApiError::NotFound(_) => Some(StatusCode::NOT_FOUND),
            ApiError::NetworkError(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

/// Message to show the user for a failed action.
///
/// Returns the API-reported message when one is anywhere in the error chain,
/// otherwise the action-specific fallback.
pub fn user_message(error: &anyhow::Error, fallback: &str) -> String {
    error
        .chain()
        .find_map(|cause| match cause.downcast_ref::<ApiError>() {
            Some(ApiError::Reported { message, .. }) => Some(message.clone()),
            _ => None,
        })
        .unwrap_or_else(|| fallback.to_string())
}
