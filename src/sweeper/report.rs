use chrono::{DateTime, Utc};
use serde::Serialize;

/// What happened to a message the sweeper acted on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeKind {
    Deleted,
    WouldDelete,
    Failed { detail: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageOutcome {
    pub message_id: i32,
    pub date: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: OutcomeKind,
}

impl MessageOutcome {
    /// Line printed to the console for this outcome
    pub fn console_line(&self) -> String {
        match &self.kind {
            OutcomeKind::Deleted => format!(
                "✅ Deleted message {} from {}",
                self.message_id,
                format_timestamp(self.date)
            ),
            OutcomeKind::WouldDelete => format!(
                "🔎 Would delete message {} from {}",
                self.message_id,
                format_timestamp(self.date)
            ),
            OutcomeKind::Failed { detail } => {
                format!("❌ Error processing message {}: {}", self.message_id, detail)
            }
        }
    }
}

/// `2026-10-02 08:15:00+00:00`
pub fn format_timestamp(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d %H:%M:%S%:z").to_string()
}

/// Summary of one sweep pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub chat_id: i64,
    /// Messages yielded by the backend, duplicates included
    pub scanned: usize,
    pub deleted: usize,
    pub would_delete: usize,
    pub retained: usize,
    pub failed: usize,
    /// Messages the backend yielded more than once
    pub duplicates: usize,
    pub outcomes: Vec<MessageOutcome>,
}

impl SweepReport {
    pub fn new(chat_id: i64) -> Self {
        Self {
            chat_id,
            ..Default::default()
        }
    }

    pub(crate) fn record(&mut self, outcome: MessageOutcome) {
        match outcome.kind {
            OutcomeKind::Deleted => self.deleted += 1,
            OutcomeKind::WouldDelete => self.would_delete += 1,
            OutcomeKind::Failed { .. } => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }

    pub fn deleted_ids(&self) -> Vec<i32> {
        self.outcomes
            .iter()
            .filter(|o| o.kind == OutcomeKind::Deleted)
            .map(|o| o.message_id)
            .collect()
    }

    pub fn failed_ids(&self) -> Vec<i32> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.kind, OutcomeKind::Failed { .. }))
            .map(|o| o.message_id)
            .collect()
    }
}
