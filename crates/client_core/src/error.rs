use reqwest::StatusCode;
use status_gate::DenialReason;
use thiserror::Error;

/// Shown when a failure carries nothing more specific for the user.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong, please try again";
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired, please sign in again";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Api {
        status: StatusCode,
        message: Option<String>,
    },
    #[error("{0}")]
    Denied(#[from] DenialReason),
    #[error("{0}")]
    Validation(String),
    #[error("not signed in")]
    Unauthenticated,
    #[error("invalid auth token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("invalid api url: {0}")]
    Url(#[from] url::ParseError),
    #[error("local storage failed: {0:#}")]
    Storage(anyhow::Error),
}

impl ClientError {
    pub fn api(status: StatusCode, message: Option<String>) -> Self {
        Self::Api { status, message }
    }

    /// Failures that should send the user back to the login screen.
    pub fn is_auth(&self) -> bool {
        match self {
            ClientError::Unauthenticated | ClientError::InvalidToken(_) => true,
            ClientError::Api { status, .. } => *status == StatusCode::UNAUTHORIZED,
            _ => false,
        }
    }

    /// Raised locally, before anything went over the network.
    pub fn is_local(&self) -> bool {
        matches!(self, ClientError::Denied(_) | ClientError::Validation(_))
    }

    /// Text for the user-facing notice. Server messages are passed through
    /// verbatim; transport and storage details are not shown.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api {
                message: Some(message),
                ..
            } => message.clone(),
            ClientError::Denied(reason) => reason.to_string(),
            ClientError::Validation(message) => message.clone(),
            err if err.is_auth() => SESSION_EXPIRED_MESSAGE.to_string(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
