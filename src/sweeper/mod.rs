//! Retention sweep over one chat's video messages
//!
//! A sweep opens a session, resolves the chat, walks the backend's filtered
//! search and deletes every video that is past retention and has no
//! reactions. A failed delete is reported and the sweep moves on. The session
//! is released on every exit path.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::backend::{CandidateMessage, ChatHandle, MessagingBackend, SearchQuery};
use crate::config::SweepConfig;
use crate::error::SweepError;

pub mod report;
pub mod verdict;

pub use report::{MessageOutcome, OutcomeKind, SweepReport};
pub use verdict::{Verdict, evaluate};

/// Lifecycle of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPhase {
    NotConnected,
    Connected,
    Resolved,
    Sweeping,
    Disconnected,
}

/// Runs cleanup passes with a fixed configuration
pub struct RetentionSweeper {
    config: SweepConfig,
}

impl RetentionSweeper {
    pub fn new(config: SweepConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Runs one pass against `backend` using the current time.
    pub async fn run<B>(&self, backend: &mut B) -> Result<SweepReport, SweepError>
    where
        B: MessagingBackend + ?Sized,
    {
        self.run_at(backend, Utc::now()).await
    }

    /// Runs one pass with retention measured from `now`.
    pub async fn run_at<B>(
        &self,
        backend: &mut B,
        now: DateTime<Utc>,
    ) -> Result<SweepReport, SweepError>
    where
        B: MessagingBackend + ?Sized,
    {
        let mut phase = SweepPhase::NotConnected;
        let outcome = self.run_phases(backend, now, &mut phase).await;

        if let Err(e) = backend.disconnect().await {
            warn!(backend = backend.name(), error = %e, "Failed to release session cleanly");
        }
        debug!(from = ?phase, to = ?SweepPhase::Disconnected, "Sweep phase change");

        match &outcome {
            Ok(report) => {
                info!(
                    chat_id = report.chat_id,
                    scanned = report.scanned,
                    deleted = report.deleted,
                    would_delete = report.would_delete,
                    retained = report.retained,
                    failed = report.failed,
                    "Sweep complete"
                );
                match serde_json::to_string(report) {
                    Ok(json) => debug!(report = %json, "Sweep report"),
                    Err(e) => debug!(error = %e, "Failed to serialize sweep report"),
                }
            }
            Err(e) => debug!(phase = ?phase, error = %e, "Sweep aborted"),
        }

        outcome
    }

    async fn run_phases<B>(
        &self,
        backend: &mut B,
        now: DateTime<Utc>,
        phase: &mut SweepPhase,
    ) -> Result<SweepReport, SweepError>
    where
        B: MessagingBackend + ?Sized,
    {
        let credentials = &self.config.credentials;
        info!(
            backend = backend.name(),
            session = %credentials.session_name,
            "Connecting to messaging backend"
        );
        backend
            .connect(credentials)
            .await
            .map_err(SweepError::Authentication)?;
        transition(phase, SweepPhase::Connected);

        let chat_id = self.config.chat_id;
        let chat = backend
            .resolve_chat(chat_id)
            .await
            .map_err(|source| SweepError::Resolution { chat_id, source })?;
        transition(phase, SweepPhase::Resolved);
        info!(chat_id = chat.id, title = ?chat.title, "Resolved target chat");

        transition(phase, SweepPhase::Sweeping);
        self.sweep(&*backend, &chat, now).await
    }

    async fn sweep<B>(
        &self,
        backend: &B,
        chat: &ChatHandle,
        now: DateTime<Utc>,
    ) -> Result<SweepReport, SweepError>
    where
        B: MessagingBackend + ?Sized,
    {
        let policy = &self.config.policy;
        let cutoff = policy.cutoff(now);
        let query = SearchQuery::videos(policy.search_marker.clone());
        let page_size = policy.page_size.max(1);

        info!(
            cutoff = %cutoff,
            marker = %query.text,
            dry_run = policy.dry_run,
            "Scanning for expired videos"
        );

        let mut report = SweepReport::new(chat.id);
        let mut seen = HashSet::new();
        let mut messages = backend.search_messages(chat, &query);

        loop {
            // A full page has been consumed, so the next pull hits the backend
            if report.scanned > 0 && report.scanned % page_size == 0 && !policy.wait_time.is_zero() {
                debug!(wait_ms = policy.wait_time.as_millis() as u64, "Pacing before next page");
                tokio::time::sleep(policy.wait_time).await;
            }

            let Some(item) = messages.next().await else {
                break;
            };
            let message = item.map_err(SweepError::Iteration)?;
            report.scanned += 1;

            if seen.insert(message.id) {
                self.process(backend, chat, &message, cutoff, &mut report).await;
            } else {
                report.duplicates += 1;
                debug!(message_id = message.id, "Skipping message yielded twice");
            }
        }

        Ok(report)
    }

    async fn process<B>(
        &self,
        backend: &B,
        chat: &ChatHandle,
        message: &CandidateMessage,
        cutoff: DateTime<Utc>,
        report: &mut SweepReport,
    ) where
        B: MessagingBackend + ?Sized,
    {
        let verdict = evaluate(message, cutoff);
        if !verdict.is_delete() {
            report.retained += 1;
            debug!(message_id = message.id, reason = verdict.reason(), "Keeping message");
            return;
        }

        let kind = if self.config.policy.dry_run {
            OutcomeKind::WouldDelete
        } else {
            match backend.delete_message(chat, message.id).await {
                Ok(()) => OutcomeKind::Deleted,
                Err(e) => {
                    warn!(message_id = message.id, kind = e.kind(), error = %e, "Delete failed");
                    OutcomeKind::Failed {
                        detail: e.to_string(),
                    }
                }
            }
        };

        let outcome = MessageOutcome {
            message_id: message.id,
            date: message.date,
            kind,
        };
        println!("{}", outcome.console_line());
        report.record(outcome);
    }
}

fn transition(phase: &mut SweepPhase, next: SweepPhase) {
    let from = *phase;
    debug!(from = ?from, to = ?next, "Sweep phase change");
    *phase = next;
}
