//! Messaging backend module for vidsweep
//!
//! The sweeper never talks to a messaging service directly. It drives a
//! `MessagingBackend`, which covers exactly what one cleanup pass needs:
//!
//! - opening and releasing an authenticated session
//! - resolving a numeric chat id to a chat handle
//! - a lazy, server-filtered sequence of messages
//! - deleting a single message
//!
//! The Telegram implementation lives in `telegram` behind the `telegram`
//! feature. Tests use the scripted backend in `mock`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::config::Credentials;

pub mod error;
#[cfg(test)]
pub mod mock;
#[cfg(feature = "telegram")]
pub mod telegram;

pub use error::BackendError;
#[cfg(feature = "telegram")]
pub use telegram::TelegramBackend;

/// Resolved handle of the target conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatHandle {
    pub id: i64,
    pub title: Option<String>,
}

impl ChatHandle {
    pub fn new(id: i64) -> Self {
        Self { id, title: None }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// One reaction kind attached to a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub emoji: String,
    pub count: u32,
}

/// A message yielded by the backend's filtered search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMessage {
    pub id: i32,
    pub date: DateTime<Utc>,
    pub has_video: bool,
    /// The backend attached a reactions record, even one with no counts
    pub reactions_present: bool,
    pub reactions: Vec<Reaction>,
}

impl CandidateMessage {
    pub fn new(id: i32, date: DateTime<Utc>) -> Self {
        Self {
            id,
            date,
            has_video: true,
            reactions_present: false,
            reactions: Vec::new(),
        }
    }

    pub fn without_video(mut self) -> Self {
        self.has_video = false;
        self
    }

    pub fn with_reaction(mut self, emoji: impl Into<String>, count: u32) -> Self {
        self.reactions_present = true;
        self.reactions.push(Reaction {
            emoji: emoji.into(),
            count,
        });
        self
    }

    /// Marks a reactions record with no entries attached to the message
    pub fn with_empty_reactions(mut self) -> Self {
        self.reactions_present = true;
        self
    }

    /// True whenever a reactions record exists, whatever its counts
    pub fn has_reactions(&self) -> bool {
        self.reactions_present
    }
}

/// Server-side content filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFilter {
    Video,
}

/// Parameters of a server-side message search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub filter: ContentFilter,
}

impl SearchQuery {
    pub fn videos(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            filter: ContentFilter::Video,
        }
    }
}

/// Lazy, forward-only sequence of search results
pub type MessageStream<'a> = BoxStream<'a, Result<CandidateMessage, BackendError>>;

/// Interface every messaging backend implements
#[async_trait]
pub trait MessagingBackend: Send + Sync {
    /// Backend name used in logs
    fn name(&self) -> &'static str;

    /// Opens an authenticated session
    async fn connect(&mut self, credentials: &Credentials) -> Result<(), BackendError>;

    /// Resolves a numeric chat id to a handle
    async fn resolve_chat(&mut self, chat_id: i64) -> Result<ChatHandle, BackendError>;

    /// Starts a lazy search over the chat's messages
    ///
    /// The stream is not restartable. Results come in backend order,
    /// newest first for Telegram.
    fn search_messages<'a>(
        &'a self,
        chat: &'a ChatHandle,
        query: &'a SearchQuery,
    ) -> MessageStream<'a>;

    /// Deletes one message for everyone in the chat
    async fn delete_message(&self, chat: &ChatHandle, message_id: i32) -> Result<(), BackendError>;

    /// Releases the session. Calling it on a closed session is a no-op.
    async fn disconnect(&mut self) -> Result<(), BackendError>;
}
