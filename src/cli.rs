use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::backend::MessagingBackend;
use crate::config;
use crate::error::{EXIT_OK, EXIT_RUN_FAILED, SweepError};
use crate::sweeper::RetentionSweeper;

#[derive(Parser, Debug)]
#[command(name = "vidsweep")]
#[command(about = "Delete stale, unreacted video messages from a Telegram chat")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(after_help = "Settings are read from the environment (or a .env file): \
SESSION_NAME, API_ID, API_HASH, PHONE, CHAT_ID")]
pub struct Cli {
    /// Report eligible messages without deleting them
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Load settings from this file instead of ./.env
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,
}

/// Runs one sweep and returns the process exit code.
pub async fn run(cli: Cli) -> i32 {
    match execute(&cli).await {
        Ok(()) => EXIT_OK,
        Err(e) => {
            let code = e
                .downcast_ref::<SweepError>()
                .map_or(EXIT_RUN_FAILED, SweepError::exit_code);
            tracing::error!(exit_code = code, "{}", e);
            code
        }
    }
}

async fn execute(cli: &Cli) -> Result<()> {
    config::load_env_file(cli.env_file.as_deref()).map_err(SweepError::from)?;
    let config = config::load_config(cli.dry_run).map_err(SweepError::from)?;

    let mut backend = create_backend()?;
    let sweeper = RetentionSweeper::new(config);
    let report = sweeper.run(backend.as_mut()).await?;

    if report.failed > 0 {
        tracing::warn!(failed = report.failed, "Some messages could not be deleted");
    }
    Ok(())
}

#[cfg(feature = "telegram")]
fn create_backend() -> Result<Box<dyn MessagingBackend>> {
    Ok(Box::new(crate::backend::TelegramBackend::new()))
}

#[cfg(not(feature = "telegram"))]
fn create_backend() -> Result<Box<dyn MessagingBackend>> {
    anyhow::bail!("no messaging backend compiled in; rebuild with `--features telegram`")
}
