//! Error types shared by every operation of the client.

use thiserror::Error;

pub type Result<T, E = VimeoError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum VimeoError {
    /// The HTTP layer failed (connection refused, timeout, TLS, ...).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with an error envelope or a non-success status.
    #[error("Vimeo API error {code}: {message}")]
    RemoteApi {
        code: String,
        message: String,
        explanation: Option<String>,
    },

    #[error("Failed to decode {format} response: {reason}")]
    Decode { format: String, reason: String },

    /// An operation was invoked in an authorization state that forbids it.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Insufficient upload quota: {needed} bytes needed, {available} available")]
    InsufficientQuota { needed: u64, available: u64 },
}

impl VimeoError {
    pub fn remote(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteApi {
            code: code.into(),
            message: message.into(),
            explanation: None,
        }
    }

    pub fn decode(format: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            format: format.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Remote error code, if this error came from the service.
    pub fn remote_code(&self) -> Option<&str> {
        match self {
            Self::RemoteApi { code, .. } => Some(code),
            _ => None,
        }
    }
}
