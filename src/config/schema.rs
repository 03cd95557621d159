use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::time::Duration as StdDuration;

/// Session name used when `SESSION_NAME` is not set
pub const DEFAULT_SESSION_NAME: &str = "default_session";

/// Age after which an unreacted video becomes deletable (14 days)
pub const RETENTION_DAYS: i64 = 14;

/// Text the backend uses to pre-filter candidate messages
pub const SEARCH_MARKER: &str = "Видео со звонка";

/// Wait between page requests to the backend
pub const PAGE_WAIT_SECS: u64 = 2;

/// Number of messages the backend returns per page request
pub const PAGE_SIZE: usize = 100;

/// Identity used to open a session with the messaging backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub session_name: String,
    pub api_id: i32,
    pub api_hash: String,
    pub phone: Option<String>,
}

/// What a sweep keeps, what it deletes, and how fast it walks the chat.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPolicy {
    pub retention: Duration,
    pub search_marker: String,
    pub wait_time: StdDuration,
    pub page_size: usize,
    pub dry_run: bool,
}

impl Default for SweepPolicy {
    fn default() -> Self {
        Self {
            retention: Duration::days(RETENTION_DAYS),
            search_marker: SEARCH_MARKER.to_string(),
            wait_time: StdDuration::from_secs(PAGE_WAIT_SECS),
            page_size: PAGE_SIZE,
            dry_run: false,
        }
    }
}

impl SweepPolicy {
    /// Messages strictly older than this instant are past retention
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.retention
    }
}

/// Fully validated run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub credentials: Credentials,
    pub chat_id: i64,
    pub policy: SweepPolicy,
}

/// Redacted view of the configuration, safe to log.
#[derive(Debug, Clone, Serialize)]
pub struct SafeConfigSummary {
    pub session_name: String,
    pub api_id: i32,
    pub api_hash_configured: bool,
    pub phone_configured: bool,
    pub chat_id: i64,
    pub retention_days: i64,
    pub dry_run: bool,
}

impl SweepConfig {
    pub fn safe_summary(&self) -> SafeConfigSummary {
        SafeConfigSummary {
            session_name: self.credentials.session_name.clone(),
            api_id: self.credentials.api_id,
            api_hash_configured: !self.credentials.api_hash.is_empty(),
            phone_configured: self.credentials.phone.is_some(),
            chat_id: self.chat_id,
            retention_days: self.policy.retention.num_days(),
            dry_run: self.policy.dry_run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_default() {
        let policy = SweepPolicy::default();
        assert_eq!(policy.retention, Duration::days(14));
        assert_eq!(policy.search_marker, "Видео со звонка");
        assert_eq!(policy.wait_time, StdDuration::from_secs(2));
        assert_eq!(policy.page_size, 100);
        assert!(!policy.dry_run);
    }

    #[test]
    fn test_cutoff_is_retention_before_now() {
        let policy = SweepPolicy::default();
        let now = Utc::now();
        assert_eq!(now - policy.cutoff(now), Duration::days(14));
    }

    #[test]
    fn test_safe_summary_hides_secrets() {
        let config = SweepConfig {
            credentials: Credentials {
                session_name: "doorbell".to_string(),
                api_id: 12345,
                api_hash: "0123456789abcdef0123456789abcdef".to_string(),
                phone: Some("+15550001111".to_string()),
            },
            chat_id: -1001234567890,
            policy: SweepPolicy::default(),
        };

        let json = serde_json::to_string(&config.safe_summary()).unwrap();
        assert!(json.contains("doorbell"));
        assert!(json.contains("\"api_hash_configured\":true"));
        assert!(!json.contains("0123456789abcdef"));
        assert!(!json.contains("+15550001111"));
    }
}
