//! Context and audit-log storage contracts with in-memory implementations.

use std::collections::HashMap;
use std::sync::Mutex;

use pcommon::{BoxFuture, ConversationKey, SessionId};
use pprovider::{ChatContexts, ContentKind};
use serde::{Deserialize, Serialize};

use crate::ChatError;

pub type ChatFuture<'a, T> = BoxFuture<'a, T>;

pub trait ContextStore: Send + Sync {
    fn load<'a>(
        &'a self,
        key: &'a ConversationKey,
    ) -> ChatFuture<'a, Result<Option<ChatContexts>, ChatError>>;

    /// Replaces the whole stored conversation for `key`.
    fn save<'a>(
        &'a self,
        key: &'a ConversationKey,
        contexts: &'a ChatContexts,
    ) -> ChatFuture<'a, Result<(), ChatError>>;
}

/// One audited model round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLogEntry {
    pub user_id: Option<String>,
    pub chat_from: Option<String>,
    pub chat_model: String,
    /// Question summary. File content is never stored.
    pub question: String,
    pub result: String,
    pub question_kind: ContentKind,
    pub result_kind: ContentKind,
    pub external_user_id: String,
    pub session_id: SessionId,
    /// True for the first round of a new conversation.
    pub is_first: bool,
}

pub trait LogStore: Send + Sync {
    /// Stores `entry` and returns its id.
    fn append<'a>(&'a self, entry: ChatLogEntry) -> ChatFuture<'a, Result<i64, ChatError>>;
}

#[derive(Debug, Default)]
pub struct InMemoryContextStore {
    contexts: Mutex<HashMap<ConversationKey, ChatContexts>>,
}

impl InMemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContextStore for InMemoryContextStore {
    fn load<'a>(
        &'a self,
        key: &'a ConversationKey,
    ) -> ChatFuture<'a, Result<Option<ChatContexts>, ChatError>> {
        Box::pin(async move {
            let contexts = self
                .contexts
                .lock()
                .map_err(|_| ChatError::store("context store lock poisoned"))?;

            Ok(contexts.get(key).cloned())
        })
    }

    fn save<'a>(
        &'a self,
        key: &'a ConversationKey,
        contexts: &'a ChatContexts,
    ) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            let mut stored = self
                .contexts
                .lock()
                .map_err(|_| ChatError::store("context store lock poisoned"))?;

            stored.insert(key.clone(), contexts.clone());
            Ok(())
        })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryLogStore {
    entries: Mutex<Vec<ChatLogEntry>>,
}

impl InMemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Result<Vec<ChatLogEntry>, ChatError> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .map_err(|_| ChatError::store("log store lock poisoned"))
    }
}

impl LogStore for InMemoryLogStore {
    fn append<'a>(&'a self, entry: ChatLogEntry) -> ChatFuture<'a, Result<i64, ChatError>> {
        Box::pin(async move {
            let mut entries = self
                .entries
                .lock()
                .map_err(|_| ChatError::store("log store lock poisoned"))?;

            entries.push(entry);
            Ok(entries.len() as i64)
        })
    }
}
