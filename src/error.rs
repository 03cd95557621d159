//! Run-level error types for vidsweep
//!
//! Only setup failures and a broken message search end a run. Failures that
//! concern a single message are recorded in the sweep report instead.

use thiserror::Error;

use crate::backend::BackendError;
use crate::config::ConfigError;

/// Exit code for a completed pass
pub const EXIT_OK: i32 = 0;
/// Exit code for a fatal run error
pub const EXIT_RUN_FAILED: i32 = 1;
/// Exit code for configuration and usage errors
pub const EXIT_CONFIG: i32 = 2;

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication failed: {0}")]
    Authentication(#[source] BackendError),

    #[error("Could not resolve chat {chat_id}: {source}")]
    Resolution {
        chat_id: i64,
        #[source]
        source: BackendError,
    },

    #[error("Message search failed: {0}")]
    Iteration(#[source] BackendError),
}

impl SweepError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => EXIT_CONFIG,
            _ => EXIT_RUN_FAILED,
        }
    }
}
