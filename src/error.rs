//! Error handling

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::{error, info, warn};

use crate::constants::HAIKU_LINE_LENGTHS;

/// Everything that can go wrong between the text box and the mug.
#[derive(Debug)]
pub enum HaikuError {
    /// Missing credential, unreadable font or an unusable upstream URL
    Configuration(String),
    /// The upstream service answered with a non-success status
    Upstream {
        /// HTTP status returned upstream
        status: u16,
        /// Status line plus any embedded error message
        message: String,
    },
    /// The upstream service couldn't be reached
    Transport(String),
    /// The model's output couldn't be parsed
    MalformedResponse(String),
    /// Every attempt broke the 5-7-5 contract
    ValidationExhausted {
        /// How many upstream calls were made
        attempts: usize,
    },
    /// When you didn't send the right thing
    BadRequest(String),
    /// When the request body is over the size cap
    PayloadTooLarge(String),
    /// When a requested resource is not found
    NotFound(String),
    /// When an internal server error occurs
    InternalServerError(String),
}

impl HaikuError {
    /// HTTP status used when this error reaches the web boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Upstream { .. }
            | Self::Transport(_)
            | Self::MalformedResponse(_)
            | Self::ValidationExhausted { .. } => StatusCode::BAD_GATEWAY,
            Self::Configuration(_) | Self::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to the person at the other end.
    pub fn public_message(&self) -> String {
        match self {
            Self::InternalServerError(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl std::fmt::Display for HaikuError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(message) => write!(f, "{message}"),
            Self::Upstream { message, .. } => write!(f, "{message}"),
            Self::Transport(message) => write!(f, "Upstream request failed: {message}"),
            Self::MalformedResponse(message) => write!(f, "Invalid OpenAI response: {message}"),
            Self::ValidationExhausted { attempts } => write!(
                f,
                "Generated haiku does not follow the {}-{}-{} character pattern after {attempts} attempts",
                HAIKU_LINE_LENGTHS[0], HAIKU_LINE_LENGTHS[1], HAIKU_LINE_LENGTHS[2]
            ),
            Self::BadRequest(message) => write!(f, "{message}"),
            Self::PayloadTooLarge(message) => write!(f, "Request body too large: {message}"),
            Self::NotFound(what) => write!(f, "Not found: {what}"),
            Self::InternalServerError(message) => write!(f, "Internal server error: {message}"),
        }
    }
}

impl std::error::Error for HaikuError {}

impl From<std::io::Error> for HaikuError {
    fn from(err: std::io::Error) -> Self {
        HaikuError::InternalServerError(err.to_string())
    }
}

impl From<axum::http::Error> for HaikuError {
    fn from(err: axum::http::Error) -> Self {
        HaikuError::InternalServerError(err.to_string())
    }
}

impl From<image::ImageError> for HaikuError {
    fn from(err: image::ImageError) -> Self {
        HaikuError::InternalServerError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for HaikuError {
    fn from(err: tokio::task::JoinError) -> Self {
        HaikuError::InternalServerError(err.to_string())
    }
}

impl IntoResponse for HaikuError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        match &self {
            HaikuError::BadRequest(message) => info!("Bad request received: {}", message),
            HaikuError::NotFound(what) => info!("404 {what}"),
            HaikuError::PayloadTooLarge(message) => info!("413 {message}"),
            HaikuError::Upstream { status, message } => {
                warn!("Upstream error {}: {}", status, message)
            }
            HaikuError::Transport(_)
            | HaikuError::MalformedResponse(_)
            | HaikuError::ValidationExhausted { .. } => warn!("Generation failed: {}", self),
            HaikuError::Configuration(message) => error!("Configuration error: {}", message),
            HaikuError::InternalServerError(message) => {
                error!("Internal server error: {}", message)
            }
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}
