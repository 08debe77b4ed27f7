//! Memory backend trait, backend selection and the in-memory backend.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use pchat::ChatLogEntry;
use pcommon::{BoxFuture, ConversationKey, SessionId};
use pprovider::ChatContexts;

use crate::backends::sqlite::default_sqlite_path;
use crate::error::MemoryError;
use crate::types::LogRecord;

pub use crate::backends::filesystem::FilesystemMemoryBackend;
pub use crate::backends::sqlite::SqliteMemoryBackend;

pub trait MemoryBackend: Send + Sync {
    fn load_context<'a>(
        &'a self,
        key: &'a ConversationKey,
    ) -> BoxFuture<'a, Result<Option<ChatContexts>, MemoryError>>;

    /// Replaces the stored conversation for `key`.
    fn save_context<'a>(
        &'a self,
        key: &'a ConversationKey,
        contexts: &'a ChatContexts,
    ) -> BoxFuture<'a, Result<(), MemoryError>>;

    /// Removes the stored conversation. Returns whether one existed.
    fn delete_context<'a>(
        &'a self,
        key: &'a ConversationKey,
    ) -> BoxFuture<'a, Result<bool, MemoryError>>;

    /// Stores an audit entry and returns its id. Ids start at 1 and increase.
    fn append_log<'a>(&'a self, entry: ChatLogEntry) -> BoxFuture<'a, Result<i64, MemoryError>>;

    /// Audit entries of one conversation session, oldest first.
    fn load_logs<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Vec<LogRecord>, MemoryError>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryBackendConfig {
    Sqlite { path: PathBuf },
    Filesystem { root: PathBuf },
    InMemory,
}

impl Default for MemoryBackendConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

pub fn create_memory_backend(
    config: MemoryBackendConfig,
) -> Result<Arc<dyn MemoryBackend>, MemoryError> {
    match config {
        MemoryBackendConfig::Sqlite { path } => Ok(Arc::new(SqliteMemoryBackend::new(path)?)),
        MemoryBackendConfig::Filesystem { root } => {
            Ok(Arc::new(FilesystemMemoryBackend::new(root)?))
        }
        MemoryBackendConfig::InMemory => Ok(Arc::new(InMemoryMemoryBackend::new())),
    }
}

pub fn create_default_memory_backend() -> Result<Arc<dyn MemoryBackend>, MemoryError> {
    create_memory_backend(MemoryBackendConfig::default())
}

#[derive(Debug, Default)]
pub struct InMemoryMemoryBackend {
    state: Mutex<InMemoryState>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    contexts: HashMap<ConversationKey, ChatContexts>,
    logs: Vec<LogRecord>,
}

impl InMemoryMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<std::sync::MutexGuard<'_, InMemoryState>, MemoryError> {
        self.state
            .lock()
            .map_err(|_| MemoryError::storage("memory backend lock poisoned"))
    }
}

impl MemoryBackend for InMemoryMemoryBackend {
    fn load_context<'a>(
        &'a self,
        key: &'a ConversationKey,
    ) -> BoxFuture<'a, Result<Option<ChatContexts>, MemoryError>> {
        Box::pin(async move { Ok(self.state()?.contexts.get(key).cloned()) })
    }

    fn save_context<'a>(
        &'a self,
        key: &'a ConversationKey,
        contexts: &'a ChatContexts,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            self.state()?.contexts.insert(key.clone(), contexts.clone());
            Ok(())
        })
    }

    fn delete_context<'a>(
        &'a self,
        key: &'a ConversationKey,
    ) -> BoxFuture<'a, Result<bool, MemoryError>> {
        Box::pin(async move { Ok(self.state()?.contexts.remove(key).is_some()) })
    }

    fn append_log<'a>(&'a self, entry: ChatLogEntry) -> BoxFuture<'a, Result<i64, MemoryError>> {
        Box::pin(async move {
            let mut state = self.state()?;
            let id = state.logs.len() as i64 + 1;
            state.logs.push(LogRecord {
                id,
                created_at: SystemTime::now(),
                entry,
            });
            Ok(id)
        })
    }

    fn load_logs<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Vec<LogRecord>, MemoryError>> {
        Box::pin(async move {
            Ok(self
                .state()?
                .logs
                .iter()
                .filter(|record| &record.entry.session_id == session_id)
                .cloned()
                .collect())
        })
    }
}
