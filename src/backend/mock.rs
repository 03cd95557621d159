//! Mock messaging backend for testing
//!
//! Serves a scripted list of messages and lets tests inject failures at every
//! step of a sweep without touching the network.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;

use crate::backend::{
    BackendError, CandidateMessage, ChatHandle, ContentFilter, MessageStream, MessagingBackend,
    SearchQuery,
};
use crate::config::Credentials;

/// Scripted backend recording every call made to it
pub struct MockBackend {
    items: Vec<Result<CandidateMessage, BackendError>>,
    connect_error: Option<BackendError>,
    resolve_error: Option<BackendError>,
    delete_errors: Arc<Mutex<HashMap<i32, BackendError>>>,
    apply_server_filter: bool,
    connected: bool,
    /// Ids passed to delete_message, in call order (failed calls included)
    delete_calls: Arc<Mutex<Vec<i32>>>,
    /// Ids whose deletion succeeded
    deleted: Arc<Mutex<Vec<i32>>>,
    connect_count: usize,
    resolve_count: usize,
    disconnect_count: usize,
    last_query: Arc<Mutex<Option<SearchQuery>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            connect_error: None,
            resolve_error: None,
            delete_errors: Arc::new(Mutex::new(HashMap::new())),
            apply_server_filter: true,
            connected: false,
            delete_calls: Arc::new(Mutex::new(Vec::new())),
            deleted: Arc::new(Mutex::new(Vec::new())),
            connect_count: 0,
            resolve_count: 0,
            disconnect_count: 0,
            last_query: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_messages(messages: Vec<CandidateMessage>) -> Self {
        let mut mock = Self::new();
        mock.items = messages.into_iter().map(Ok).collect();
        mock
    }

    /// Appends an iteration failure after the scripted messages
    pub fn push_stream_error(&mut self, error: BackendError) {
        self.items.push(Err(error));
    }

    pub fn fail_connect(&mut self, error: BackendError) {
        self.connect_error = Some(error);
    }

    pub fn fail_resolve(&mut self, error: BackendError) {
        self.resolve_error = Some(error);
    }

    pub fn fail_delete(&self, message_id: i32, error: BackendError) {
        self.delete_errors.lock().unwrap().insert(message_id, error);
    }

    /// Serve non-video messages too, bypassing the server-side filter
    pub fn disable_server_filter(&mut self) {
        self.apply_server_filter = false;
    }

    pub fn delete_calls(&self) -> Vec<i32> {
        self.delete_calls.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<i32> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn connect_count(&self) -> usize {
        self.connect_count
    }

    pub fn resolve_count(&self) -> usize {
        self.resolve_count
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnect_count
    }

    pub fn last_query(&self) -> Option<SearchQuery> {
        self.last_query.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn connect(&mut self, _credentials: &Credentials) -> Result<(), BackendError> {
        self.connect_count += 1;
        if let Some(error) = self.connect_error.clone() {
            return Err(error);
        }
        self.connected = true;
        Ok(())
    }

    async fn resolve_chat(&mut self, chat_id: i64) -> Result<ChatHandle, BackendError> {
        self.resolve_count += 1;
        if !self.connected {
            return Err(BackendError::NotConnected);
        }
        if let Some(error) = self.resolve_error.clone() {
            return Err(error);
        }
        Ok(ChatHandle::new(chat_id).with_title("Mock chat"))
    }

    fn search_messages<'a>(
        &'a self,
        _chat: &'a ChatHandle,
        query: &'a SearchQuery,
    ) -> MessageStream<'a> {
        *self.last_query.lock().unwrap() = Some(query.clone());

        let filter_videos = self.apply_server_filter && query.filter == ContentFilter::Video;
        let items: Vec<_> = self
            .items
            .iter()
            .filter(|item| match item {
                Ok(msg) => !filter_videos || msg.has_video,
                Err(_) => true,
            })
            .cloned()
            .collect();

        Box::pin(stream::iter(items))
    }

    async fn delete_message(&self, _chat: &ChatHandle, message_id: i32) -> Result<(), BackendError> {
        self.delete_calls.lock().unwrap().push(message_id);
        if !self.connected {
            return Err(BackendError::NotConnected);
        }
        if let Some(error) = self.delete_errors.lock().unwrap().get(&message_id).cloned() {
            return Err(error);
        }
        self.deleted.lock().unwrap().push(message_id);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), BackendError> {
        self.disconnect_count += 1;
        self.connected = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use futures::StreamExt;

    fn credentials() -> Credentials {
        Credentials {
            session_name: "test".to_string(),
            api_id: 1,
            api_hash: "0123456789abcdef0123456789abcdef".to_string(),
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_server_filter_drops_non_video() {
        let mock = MockBackend::with_messages(vec![
            CandidateMessage::new(1, Utc::now()),
            CandidateMessage::new(2, Utc::now()).without_video(),
        ]);
        let chat = ChatHandle::new(1);
        let query = SearchQuery::videos("marker");

        let ids: Vec<i32> = mock
            .search_messages(&chat, &query)
            .map(|item| item.unwrap().id)
            .collect()
            .await;

        assert_eq!(ids, vec![1]);
        assert_eq!(mock.last_query(), Some(query));
    }

    #[tokio::test]
    async fn test_delete_requires_connection() {
        let mut mock = MockBackend::new();
        let chat = ChatHandle::new(1);
        assert_eq!(
            mock.delete_message(&chat, 5).await,
            Err(BackendError::NotConnected)
        );

        mock.connect(&credentials()).await.unwrap();
        mock.delete_message(&chat, 5).await.unwrap();
        assert_eq!(mock.deleted(), vec![5]);
        assert_eq!(mock.delete_calls(), vec![5, 5]);
    }
}
