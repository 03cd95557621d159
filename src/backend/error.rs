//! Error types for messaging backend operations
//!
//! Errors are categorized so the sweeper can tell setup failures (fatal) from
//! failures that only concern one message.

use thiserror::Error;

/// Errors that can occur when talking to a messaging backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Credentials rejected, session revoked, or login could not complete
    #[error("Authentication error: {message}")]
    Authentication { message: String },

    /// The numeric id does not match any chat this account can see
    #[error("Chat {chat_id} not found or not accessible")]
    ChatNotFound { chat_id: i64 },

    /// Connection, transport or DNS failures
    #[error("Network error: {message}")]
    Network { message: String },

    /// The backend asked us to slow down
    #[error("Rate limited, retry after {seconds} seconds")]
    RateLimited { seconds: u32 },

    /// Error returned by the remote API
    #[error("RPC error {code}: {name}")]
    Rpc { code: i32, name: String },

    /// An operation was attempted without an open session
    #[error("Not connected")]
    NotConnected,

    #[error("{message}")]
    Other { message: String },
}

impl BackendError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Short machine-readable kind, used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Authentication { .. } => "authentication",
            Self::ChatNotFound { .. } => "chat_not_found",
            Self::Network { .. } => "network",
            Self::RateLimited { .. } => "rate_limited",
            Self::Rpc { .. } => "rpc",
            Self::NotConnected => "not_connected",
            Self::Other { .. } => "other",
        }
    }
}
