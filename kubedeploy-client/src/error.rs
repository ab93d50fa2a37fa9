//! Client error types
//!
//! Mirrors the backend's failure categories: remote rejection, authorization
//! denied, transport failure and undecodable payloads.

use thiserror::Error;

/// Remote resource client errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// Backend answered and refused the request
    #[error("API error: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// Backend denied authorization; the session has been torn down
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Network failure or timeout
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Successful envelope without the expected payload
    #[error("Response carried no data")]
    EmptyPayload,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// HTTP status behind the error, when the backend answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::Unauthorized { .. } => Some(401),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Decode(_) | Self::EmptyPayload => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Automatic retries never apply to authorization failures
    pub fn is_retryable(&self) -> bool {
        !self.is_unauthorized()
    }

    /// Message shown to the user: the backend's own error text when it sent
    /// one, otherwise `fallback`
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Rejected { message, .. } | Self::Unauthorized { message }
                if !message.trim().is_empty() =>
            {
                message.clone()
            }
            _ => fallback.to_string(),
        }
    }
}

/// The synchronization layer stopped publishing updates for a view
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Synchronization stopped")]
pub struct SyncClosed;
