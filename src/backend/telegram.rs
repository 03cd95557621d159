//! Telegram user-API backend built on grammers (MTProto)
//!
//! Handles:
//! - session persistence in `<SESSION_NAME>.session`
//! - interactive first-time login (code, then 2FA password when required)
//! - chat resolution through the dialog list, accepting marked ids
//! - video search with a text query, newest first
//! - deletion for everyone in the chat

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream;
use grammers_client::types::{Media, Message};
use grammers_client::{Client, Config, InitParams, InvocationError, SignInError};
use grammers_session::{PackedChat, PackedType, Session};
use grammers_tl_types as tl;

use crate::backend::{
    BackendError, CandidateMessage, ChatHandle, ContentFilter, MessageStream, MessagingBackend,
    Reaction, SearchQuery,
};
use crate::config::Credentials;

pub const TELEGRAM_BACKEND_NAME: &str = "telegram";

/// Marked ids of channels and supergroups start with this offset
const CHANNEL_ID_OFFSET: i64 = 1_000_000_000_000;

pub struct TelegramBackend {
    client: Option<Client>,
    session_path: Option<PathBuf>,
    chats: HashMap<i64, PackedChat>,
}

impl TelegramBackend {
    pub fn new() -> Self {
        Self {
            client: None,
            session_path: None,
            chats: HashMap::new(),
        }
    }

    fn client(&self) -> Result<&Client, BackendError> {
        self.client.as_ref().ok_or(BackendError::NotConnected)
    }

    fn packed(&self, chat: &ChatHandle) -> Result<PackedChat, BackendError> {
        self.chats
            .get(&chat.id)
            .copied()
            .ok_or(BackendError::ChatNotFound { chat_id: chat.id })
    }

    async fn sign_in(client: &Client, phone: &str) -> Result<(), BackendError> {
        let token = client
            .request_login_code(phone)
            .await
            .map_err(|e| BackendError::authentication(e.to_string()))?;

        let code = prompt("Enter the login code Telegram sent you:", false).await?;

        match client.sign_in(&token, &code).await {
            Ok(_) => Ok(()),
            Err(SignInError::PasswordRequired(password_token)) => {
                let hint = password_token.hint().unwrap_or("none").to_string();
                let password = prompt(&format!("Two-step verification password (hint: {hint}):"), true).await?;
                client
                    .check_password(password_token, password.trim())
                    .await
                    .map(|_| ())
                    .map_err(|e| BackendError::authentication(e.to_string()))
            }
            Err(e) => Err(BackendError::authentication(e.to_string())),
        }
    }
}

#[async_trait]
impl MessagingBackend for TelegramBackend {
    fn name(&self) -> &'static str {
        TELEGRAM_BACKEND_NAME
    }

    async fn connect(&mut self, credentials: &Credentials) -> Result<(), BackendError> {
        let session_path = PathBuf::from(format!("{}.session", credentials.session_name));
        let session = Session::load_file_or_create(&session_path)
            .map_err(|e| BackendError::Other {
                message: format!("Failed to open session file {}: {e}", session_path.display()),
            })?;

        let client = Client::connect(Config {
            session,
            api_id: credentials.api_id,
            api_hash: credentials.api_hash.clone(),
            params: InitParams::default(),
        })
        .await
        .map_err(|e| BackendError::authentication(e.to_string()))?;

        // Keep the client before any login step so disconnect can persist it
        self.client = Some(client);
        self.session_path = Some(session_path);
        let client = self.client()?;

        let authorized = client.is_authorized().await.map_err(map_invocation_error)?;
        if !authorized {
            let phone = credentials.phone.as_deref().ok_or_else(|| {
                BackendError::authentication("session is not authorized and PHONE is not set")
            })?;
            tracing::info!("Session not authorized, starting login");
            Self::sign_in(client, phone).await?;
            tracing::info!("Signed in to Telegram");
        }

        Ok(())
    }

    async fn resolve_chat(&mut self, chat_id: i64) -> Result<ChatHandle, BackendError> {
        let (kind, bare_id) = parse_marked_id(chat_id);
        let client = self.client()?.clone();

        // User and basic-group ids share numbers, so the kind must match too
        let mut dialogs = client.iter_dialogs();
        while let Some(dialog) = dialogs.next().await.map_err(map_invocation_error)? {
            let chat = dialog.chat();
            let packed = chat.pack();
            if chat.id() == bare_id && kind_of(packed.ty) == kind {
                let handle = ChatHandle::new(chat_id).with_title(chat.name());
                self.chats.insert(chat_id, packed);
                return Ok(handle);
            }
        }

        Err(BackendError::ChatNotFound { chat_id })
    }

    fn search_messages<'a>(
        &'a self,
        chat: &'a ChatHandle,
        query: &'a SearchQuery,
    ) -> MessageStream<'a> {
        let (client, packed) = match (self.client(), self.packed(chat)) {
            (Ok(client), Ok(packed)) => (client, packed),
            (Err(e), _) | (_, Err(e)) => return Box::pin(stream::once(async move { Err(e) })),
        };

        let filter = match query.filter {
            ContentFilter::Video => tl::enums::MessagesFilter::InputMessagesFilterVideo,
        };
        let search = client
            .search_messages(packed)
            .query(&query.text)
            .filter(filter);

        Box::pin(stream::try_unfold(search, |mut search| async move {
            match search.next().await {
                Ok(Some(message)) => Ok(Some((to_candidate(&message), search))),
                Ok(None) => Ok(None),
                Err(e) => Err(map_invocation_error(e)),
            }
        }))
    }

    async fn delete_message(&self, chat: &ChatHandle, message_id: i32) -> Result<(), BackendError> {
        let client = self.client()?;
        let packed = self.packed(chat)?;

        let affected = client
            .delete_messages(packed, &[message_id])
            .await
            .map_err(map_invocation_error)?;

        if affected == 0 {
            return Err(BackendError::Other {
                message: "message was not deleted (already gone or no permission)".to_string(),
            });
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), BackendError> {
        let Some(client) = self.client.take() else {
            return Ok(());
        };
        self.chats.clear();

        let result = match self.session_path.take() {
            Some(path) => client.session().save_to_file(&path).map_err(|e| BackendError::Other {
                message: format!("Failed to save session to {}: {e}", path.display()),
            }),
            None => Ok(()),
        };

        drop(client);
        tracing::debug!("Telegram session released");
        result
    }
}

/// Kind of chat a marked id refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    User,
    Group,
    Channel,
}

/// Splits a marked chat id into its kind and the bare id grammers reports.
///
/// Positive ids are users, `-100…` ids are channels and supergroups, any
/// other negative id is a basic group.
pub fn parse_marked_id(chat_id: i64) -> (ChatKind, i64) {
    if chat_id < -CHANNEL_ID_OFFSET {
        (ChatKind::Channel, -(chat_id + CHANNEL_ID_OFFSET))
    } else if chat_id < 0 {
        (ChatKind::Group, -chat_id)
    } else {
        (ChatKind::User, chat_id)
    }
}

fn kind_of(ty: PackedType) -> ChatKind {
    match ty {
        PackedType::User | PackedType::Bot => ChatKind::User,
        PackedType::Chat => ChatKind::Group,
        PackedType::Megagroup | PackedType::Broadcast | PackedType::Gigagroup => ChatKind::Channel,
    }
}

fn to_candidate(message: &Message) -> CandidateMessage {
    let mime_type = match message.media() {
        Some(Media::Document(document)) => document.mime_type().map(str::to_string),
        _ => None,
    };
    let reactions = match &message.raw.reactions {
        Some(tl::enums::MessageReactions::Reactions(record)) => Some(record.results.as_slice()),
        None => None,
    };

    build_candidate(message.id(), message.date(), mime_type.as_deref(), reactions)
}

/// `reactions` is `None` when the message carries no reactions record at
/// all. A record with no results still marks the message as reacted.
fn build_candidate(
    id: i32,
    date: DateTime<Utc>,
    mime_type: Option<&str>,
    reactions: Option<&[tl::enums::ReactionCount]>,
) -> CandidateMessage {
    CandidateMessage {
        id,
        date,
        has_video: mime_type.is_some_and(|mime| mime.starts_with("video/")),
        reactions_present: reactions.is_some(),
        reactions: reactions.map(reaction_entries).unwrap_or_default(),
    }
}

fn reaction_entries(results: &[tl::enums::ReactionCount]) -> Vec<Reaction> {
    results
        .iter()
        .map(|result| {
            let tl::enums::ReactionCount::Count(count) = result;
            let emoji = match &count.reaction {
                tl::enums::Reaction::Emoji(e) => e.emoticon.clone(),
                tl::enums::Reaction::CustomEmoji(c) => format!("custom:{}", c.document_id),
                _ => "other".to_string(),
            };
            Reaction {
                emoji,
                count: u32::try_from(count.count).unwrap_or(0),
            }
        })
        .collect()
}

fn map_invocation_error(error: InvocationError) -> BackendError {
    match error {
        InvocationError::Rpc(rpc) => map_rpc_error(rpc.code, rpc.name, rpc.value),
        other => BackendError::network(other.to_string()),
    }
}

fn map_rpc_error(code: i32, name: String, value: Option<u32>) -> BackendError {
    if name == "FLOOD_WAIT" {
        BackendError::RateLimited {
            seconds: value.unwrap_or(0),
        }
    } else if name.starts_with("AUTH_") || name.starts_with("SESSION_") {
        BackendError::authentication(name)
    } else {
        BackendError::Rpc { code, name }
    }
}

async fn prompt(message: &str, secret: bool) -> Result<String, BackendError> {
    let message = message.to_string();
    tokio::task::spawn_blocking(move || {
        if secret {
            inquire::Password::new(&message)
                .without_confirmation()
                .prompt()
        } else {
            inquire::Text::new(&message).prompt()
        }
    })
    .await
    .map_err(|e| BackendError::authentication(format!("login prompt failed: {e}")))?
    .map_err(|e| BackendError::authentication(format!("login prompt failed: {e}")))
}
