//! Durable conversation context and audit-log persistence with pchat store
//! adapters.
//!
//! ```rust
//! use pmemory::{MemoryBackendConfig, create_memory_store};
//!
//! let store = create_memory_store(MemoryBackendConfig::InMemory).expect("in-memory store");
//! let _backend = store.backend();
//! ```

mod adapter;
mod backend;
mod backends;
mod error;
mod types;

pub mod prelude {
    pub use crate::{
        FilesystemMemoryBackend, InMemoryMemoryBackend, LogRecord, MemoryBackend,
        MemoryBackendConfig, MemoryError, MemoryErrorKind, MemoryStore, SqliteMemoryBackend,
        create_default_memory_backend, create_memory_backend, create_memory_store,
    };
}

pub use adapter::MemoryStore;
pub use backend::{
    FilesystemMemoryBackend, InMemoryMemoryBackend, MemoryBackend, MemoryBackendConfig,
    SqliteMemoryBackend, create_default_memory_backend, create_memory_backend,
};
pub use error::{MemoryError, MemoryErrorKind};
pub use types::LogRecord;

/// Builds a backend from `config` and wraps it for use as both
/// `ContextStore` and `LogStore`.
pub fn create_memory_store(config: MemoryBackendConfig) -> Result<MemoryStore, MemoryError> {
    Ok(MemoryStore::new(create_memory_backend(config)?))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pchat::{ChatErrorKind, ChatLogEntry, ContextStore, LogStore};
    use pcommon::{ConversationKey, SessionId};
    use pprovider::{ChatContexts, ChatResult, ContentItem, ContentKind, FunctionCall};

    use crate::{
        FilesystemMemoryBackend, InMemoryMemoryBackend, MemoryBackend, MemoryError,
        MemoryErrorKind, MemoryStore, SqliteMemoryBackend,
    };

    fn temp_dir(prefix: &str) -> std::path::PathBuf {
        let unique = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("pmemory-{prefix}-{unique}"))
    }

    fn sample_contexts() -> ChatContexts {
        let mut contexts = ChatContexts::new().with_system_prompt("Be brief.");
        contexts.add_questions(vec![ContentItem::text("What's the weather in Paris?")]);
        let call = FunctionCall::new("call_1", "get_weather", r#"{"city":"Paris"}"#)
            .with_result(ChatResult::answer("22C sunny"))
            .with_recall(true);
        contexts.add_answer(ContentItem::function_calls(&[call]).expect("serialize calls"));
        contexts.add_answer(ContentItem::text("It's 22°C and sunny in Paris."));
        contexts
    }

    fn log_entry(session_id: &SessionId, result: &str, is_first: bool) -> ChatLogEntry {
        ChatLogEntry {
            user_id: Some("42".to_string()),
            chat_from: None,
            chat_model: "gpt-4o-mini".to_string(),
            question: "What's the weather in Paris?".to_string(),
            result: result.to_string(),
            question_kind: ContentKind::Text,
            result_kind: ContentKind::Text,
            external_user_id: "user-1".to_string(),
            session_id: session_id.clone(),
            is_first,
        }
    }

    async fn exercise_backend(backend: &dyn MemoryBackend) {
        let key = ConversationKey::new("user-1", "chat");
        let other = ConversationKey::new("user-2", "chat");
        assert_eq!(backend.load_context(&key).await.expect("load"), None);

        let contexts = sample_contexts();
        backend
            .save_context(&key, &contexts)
            .await
            .expect("context should save");
        assert_eq!(
            backend.load_context(&key).await.expect("load"),
            Some(contexts.clone())
        );
        assert_eq!(backend.load_context(&other).await.expect("load"), None);

        let mut extended = contexts.clone();
        extended.add_questions(vec![ContentItem::text("And tomorrow?")]);
        backend
            .save_context(&key, &extended)
            .await
            .expect("context should overwrite");
        assert_eq!(
            backend.load_context(&key).await.expect("load"),
            Some(extended)
        );

        let first = backend
            .append_log(log_entry(&contexts.session_id, "first", true))
            .await
            .expect("log should append");
        let second = backend
            .append_log(log_entry(&contexts.session_id, "second", false))
            .await
            .expect("log should append");
        backend
            .append_log(log_entry(&SessionId::from("elsewhere"), "other", true))
            .await
            .expect("log should append");
        assert_eq!(first, 1);
        assert_eq!(second, 2);

        let logs = backend
            .load_logs(&contexts.session_id)
            .await
            .expect("logs should load");
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].entry.result, "first");
        assert!(logs[0].entry.is_first);
        assert_eq!(logs[1].id, 2);
        assert_eq!(logs[1].entry, log_entry(&contexts.session_id, "second", false));

        assert!(backend.delete_context(&key).await.expect("delete"));
        assert!(!backend.delete_context(&key).await.expect("delete"));
        assert_eq!(backend.load_context(&key).await.expect("load"), None);
    }

    #[tokio::test]
    async fn in_memory_backend_round_trips_contexts_and_logs() {
        exercise_backend(&InMemoryMemoryBackend::new()).await;
    }

    #[tokio::test]
    async fn sqlite_backend_round_trips_contexts_and_logs() {
        let backend =
            SqliteMemoryBackend::new_in_memory().expect("sqlite backend should initialize");
        exercise_backend(&backend).await;
    }

    #[tokio::test]
    async fn sqlite_backend_persists_across_reopen() {
        let root = temp_dir("sqlite");
        let path = root.join("parley.sqlite3");
        let key = ConversationKey::new("user-1", "chat");
        let contexts = sample_contexts();

        {
            let backend = SqliteMemoryBackend::new(&path).expect("sqlite backend should open");
            backend
                .save_context(&key, &contexts)
                .await
                .expect("context should save");
        }

        let reopened = SqliteMemoryBackend::new(&path).expect("sqlite backend should reopen");
        assert_eq!(
            reopened.load_context(&key).await.expect("load"),
            Some(contexts)
        );

        std::fs::remove_dir_all(&root).expect("temporary directory should be removable");
    }

    #[tokio::test]
    async fn filesystem_backend_round_trips_contexts_and_logs() {
        let root = temp_dir("filesystem");
        let backend = FilesystemMemoryBackend::new(&root).expect("fs backend should initialize");
        exercise_backend(&backend).await;

        let reopened = FilesystemMemoryBackend::new(&root).expect("fs backend should reopen");
        let id = reopened
            .append_log(log_entry(&SessionId::from("later"), "later", true))
            .await
            .expect("log should append");
        assert_eq!(id, 4);

        std::fs::remove_dir_all(&root).expect("temporary directory should be removable");
    }

    #[tokio::test]
    async fn memory_store_serves_chat_store_contracts() {
        let backend: Arc<dyn MemoryBackend> = Arc::new(InMemoryMemoryBackend::new());
        let store = MemoryStore::new(backend.clone());
        let key = ConversationKey::new("user-1", "chat");
        let contexts = sample_contexts();

        ContextStore::save(&store, &key, &contexts)
            .await
            .expect("save through adapter");
        assert_eq!(
            ContextStore::load(&store, &key).await.expect("load"),
            Some(contexts.clone())
        );

        let id = LogStore::append(&store, log_entry(&contexts.session_id, "ok", true))
            .await
            .expect("append through adapter");
        assert_eq!(id, 1);
        assert_eq!(
            backend
                .load_logs(&contexts.session_id)
                .await
                .expect("logs")
                .len(),
            1
        );
    }

    #[test]
    fn memory_errors_become_store_errors() {
        let error: pchat::ChatError = MemoryError::storage("disk full").into();
        assert_eq!(error.kind, ChatErrorKind::Store);
        assert_eq!(error.message, "disk full");

        let error: MemoryError = serde_json::from_str::<ChatContexts>("{")
            .expect_err("truncated json")
            .into();
        assert_eq!(error.kind, MemoryErrorKind::Serialization);
    }
}
