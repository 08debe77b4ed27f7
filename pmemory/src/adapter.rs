//! Adapter that exposes a [`MemoryBackend`] as pchat context and log stores.

use std::sync::Arc;

use pchat::{ChatError, ChatFuture, ChatLogEntry, ChatPhase, ContextStore, LogStore};
use pcommon::ConversationKey;
use pprovider::ChatContexts;

use crate::backend::MemoryBackend;
use crate::error::MemoryError;

#[derive(Clone)]
pub struct MemoryStore {
    backend: Arc<dyn MemoryBackend>,
}

impl MemoryStore {
    pub fn new(backend: Arc<dyn MemoryBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> Arc<dyn MemoryBackend> {
        Arc::clone(&self.backend)
    }
}

impl ContextStore for MemoryStore {
    fn load<'a>(
        &'a self,
        key: &'a ConversationKey,
    ) -> ChatFuture<'a, Result<Option<ChatContexts>, ChatError>> {
        Box::pin(async move {
            self.backend
                .load_context(key)
                .await
                .map_err(|error| memory_error_to_chat_error(error, ChatPhase::PreProcess))
        })
    }

    fn save<'a>(
        &'a self,
        key: &'a ConversationKey,
        contexts: &'a ChatContexts,
    ) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            self.backend
                .save_context(key, contexts)
                .await
                .map_err(|error| memory_error_to_chat_error(error, ChatPhase::Persist))
        })
    }
}

impl LogStore for MemoryStore {
    fn append<'a>(&'a self, entry: ChatLogEntry) -> ChatFuture<'a, Result<i64, ChatError>> {
        Box::pin(async move {
            self.backend
                .append_log(entry)
                .await
                .map_err(|error| memory_error_to_chat_error(error, ChatPhase::Persist))
        })
    }
}

fn memory_error_to_chat_error(error: MemoryError, phase: ChatPhase) -> ChatError {
    tracing::error!(kind = ?error.kind, error = %error.message, "memory backend failure");
    ChatError::from(error).in_phase(phase)
}
