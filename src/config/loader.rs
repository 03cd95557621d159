use crate::config::schema::{Credentials, DEFAULT_SESSION_NAME, SweepConfig, SweepPolicy};
use std::path::Path;
use thiserror::Error;

pub const ENV_SESSION_NAME: &str = "SESSION_NAME";
pub const ENV_API_ID: &str = "API_ID";
pub const ENV_API_HASH: &str = "API_HASH";
pub const ENV_PHONE: &str = "PHONE";
pub const ENV_CHAT_ID: &str = "CHAT_ID";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting {key}")]
    Missing { key: &'static str },

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("Failed to load env file {path}: {message}")]
    EnvFile { path: String, message: String },
}

/// Loads a `.env` file into the process environment.
///
/// With no explicit path a missing `.env` in the working directory is not an
/// error. Variables already set in the environment are never overridden.
pub fn load_env_file(path: Option<&Path>) -> Result<(), ConfigError> {
    match path {
        Some(path) => {
            dotenvy::from_path(path).map_err(|e| ConfigError::EnvFile {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            tracing::debug!(env_file = %path.display(), "Loaded env file");
        }
        None => match dotenvy::dotenv() {
            Ok(found) => tracing::debug!(env_file = %found.display(), "Loaded env file"),
            Err(e) if e.not_found() => tracing::debug!("No .env file found"),
            Err(e) => {
                return Err(ConfigError::EnvFile {
                    path: ".env".to_string(),
                    message: e.to_string(),
                });
            }
        },
    }
    Ok(())
}

/// Builds the configuration from the process environment.
pub fn load_config(dry_run: bool) -> Result<SweepConfig, ConfigError> {
    tracing::debug!("Loading configuration from environment");
    let mut config = SweepConfig::from_lookup(|key| std::env::var(key).ok())?;
    config.policy.dry_run = dry_run;

    let summary = config.safe_summary();
    tracing::debug!(
        session_name = %summary.session_name,
        api_id = summary.api_id,
        phone_configured = summary.phone_configured,
        chat_id = summary.chat_id,
        dry_run = summary.dry_run,
        "Configuration loaded successfully"
    );

    Ok(config)
}

impl SweepConfig {
    /// Builds and validates a configuration from a key/value lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let session_name = get(ENV_SESSION_NAME).unwrap_or_else(|| DEFAULT_SESSION_NAME.to_string());
        validate_session_name(&session_name)?;

        let api_id = parse_api_id(&get(ENV_API_ID).ok_or(ConfigError::Missing { key: ENV_API_ID })?)?;

        let api_hash = get(ENV_API_HASH).ok_or(ConfigError::Missing { key: ENV_API_HASH })?;
        validate_api_hash(&api_hash)?;

        let phone = get(ENV_PHONE).map(|p| normalize_phone(&p)).transpose()?;

        let chat_id = parse_chat_id(&get(ENV_CHAT_ID).ok_or(ConfigError::Missing { key: ENV_CHAT_ID })?)?;

        Ok(Self {
            credentials: Credentials {
                session_name,
                api_id,
                api_hash,
                phone,
            },
            chat_id,
            policy: SweepPolicy::default(),
        })
    }
}

fn validate_session_name(name: &str) -> Result<(), ConfigError> {
    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(ConfigError::Invalid {
            key: ENV_SESSION_NAME,
            reason: "must be a plain name without path separators".to_string(),
        });
    }
    Ok(())
}

fn parse_api_id(raw: &str) -> Result<i32, ConfigError> {
    match raw.parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        Ok(_) => Err(ConfigError::Invalid {
            key: ENV_API_ID,
            reason: "must be a positive integer".to_string(),
        }),
        Err(e) => Err(ConfigError::Invalid {
            key: ENV_API_ID,
            reason: e.to_string(),
        }),
    }
}

fn validate_api_hash(hash: &str) -> Result<(), ConfigError> {
    if hash.len() != 32 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ConfigError::Invalid {
            key: ENV_API_HASH,
            reason: "must be 32 hexadecimal characters".to_string(),
        });
    }
    Ok(())
}

/// Strips spaces, dashes and parentheses; keeps a leading `+`.
fn normalize_phone(raw: &str) -> Result<String, ConfigError> {
    let (plus, rest) = match raw.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", raw),
    };

    let digits: String = rest
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    if !digits.chars().all(|c| c.is_ascii_digit()) || !(5..=15).contains(&digits.len()) {
        return Err(ConfigError::Invalid {
            key: ENV_PHONE,
            reason: "must contain 5 to 15 digits, optionally prefixed with +".to_string(),
        });
    }

    Ok(format!("{plus}{digits}"))
}

fn parse_chat_id(raw: &str) -> Result<i64, ConfigError> {
    match raw.parse::<i64>() {
        Ok(0) => Err(ConfigError::Invalid {
            key: ENV_CHAT_ID,
            reason: "must be non-zero".to_string(),
        }),
        Ok(id) => Ok(id),
        Err(e) => Err(ConfigError::Invalid {
            key: ENV_CHAT_ID,
            reason: e.to_string(),
        }),
    }
}
