//! Error types for the gateway client

use ourbusway_core::error::GatewayError;
use thiserror::Error;

/// Errors that can occur when calling the OurBusWay gateway
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// HTTP client could not be built
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// Request never got an answer
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response body could not be decoded
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// Session token missing, expired or invalid
    #[error("Unauthorized - session expired or invalid")]
    Unauthorized,

    /// Authenticated, but not allowed
    #[error("Access denied: insufficient permissions")]
    Forbidden {
        /// Error message from the gateway, if any
        message: Option<String>,
    },

    /// Any other non-success status
    #[error("API error (status {status}): {}", message.as_deref().unwrap_or("no message"))]
    Status {
        /// HTTP status code
        status: u16,
        /// Error message from the gateway, if any
        message: Option<String>,
    },
}

impl ApiError {
    /// HTTP status, when the gateway answered
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::Status { status, .. } => Some(*status),
            Self::InvalidConfig(_) | Self::RequestFailed(_) | Self::ResponseParseFailed(_) => None,
        }
    }

    /// Gateway-provided message, when there is one
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Forbidden { message } | Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Whether the portal should drop the session and send the user to sign in
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

impl From<ApiError> for GatewayError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized => Self::Status {
                status: 401,
                message: None,
            },
            ApiError::Forbidden { message } => Self::Status {
                status: 403,
                message,
            },
            ApiError::Status { status, message } => Self::Status { status, message },
            ApiError::RequestFailed(msg) | ApiError::InvalidConfig(msg) => Self::Transport(msg),
            ApiError::ResponseParseFailed(msg) => Self::Decode(msg),
        }
    }
}
