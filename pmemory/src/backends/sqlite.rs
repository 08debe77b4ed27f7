use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use pchat::ChatLogEntry;
use pcommon::{BoxFuture, ConversationKey, SessionId};
use pprovider::{ChatContexts, ContentKind};
use rusqlite::{Connection, OptionalExtension, params};

use crate::backend::MemoryBackend;
use crate::backends::filesystem::{decode_system_time, encode_system_time};
use crate::error::MemoryError;
use crate::types::LogRecord;

#[derive(Debug)]
pub struct SqliteMemoryBackend {
    connection: Mutex<Connection>,
}

impl SqliteMemoryBackend {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|error| {
                MemoryError::storage(format!(
                    "failed to create sqlite parent directory: {error}"
                ))
            })?;
        }

        let connection = Connection::open(path).map_err(|error| {
            MemoryError::storage(format!("failed to open sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    pub fn new_in_memory() -> Result<Self, MemoryError> {
        let connection = Connection::open_in_memory().map_err(|error| {
            MemoryError::storage(format!("failed to open in-memory sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self, MemoryError> {
        connection
            .busy_timeout(Duration::from_secs(5))
            .map_err(|error| {
                MemoryError::storage(format!("failed to configure sqlite busy timeout: {error}"))
            })?;
        let backend = Self {
            connection: Mutex::new(connection),
        };
        backend.initialize_schema()?;
        Ok(backend)
    }

    fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>, MemoryError> {
        self.connection
            .lock()
            .map_err(|_| MemoryError::storage("sqlite backend lock poisoned"))
    }

    fn initialize_schema(&self) -> Result<(), MemoryError> {
        let conn = self.connection()?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            CREATE TABLE IF NOT EXISTS chat_contexts (
                storage_key TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                contexts_json TEXT NOT NULL,
                updated_at_secs INTEGER NOT NULL,
                updated_at_nanos INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chat_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                user_id TEXT,
                chat_from TEXT,
                chat_model TEXT NOT NULL,
                question TEXT NOT NULL,
                result TEXT NOT NULL,
                question_kind TEXT NOT NULL,
                result_kind TEXT NOT NULL,
                external_user_id TEXT NOT NULL,
                is_first INTEGER NOT NULL,
                created_at_secs INTEGER NOT NULL,
                created_at_nanos INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chat_logs_session_id
            ON chat_logs(session_id, id);
            ",
        )
        .map_err(|error| {
            MemoryError::storage(format!("failed to initialize sqlite schema: {error}"))
        })?;

        Ok(())
    }
}

impl MemoryBackend for SqliteMemoryBackend {
    fn load_context<'a>(
        &'a self,
        key: &'a ConversationKey,
    ) -> BoxFuture<'a, Result<Option<ChatContexts>, MemoryError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            let json = conn
                .query_row(
                    "SELECT contexts_json FROM chat_contexts WHERE storage_key = ?1",
                    params![key.storage_key()],
                    |row| row.get::<_, String>(0),
                )
                .optional()
                .map_err(|error| {
                    MemoryError::storage(format!("failed to query chat context: {error}"))
                })?;

            json.map(|json| {
                serde_json::from_str::<ChatContexts>(&json).map_err(|error| {
                    MemoryError::serialization(format!("failed to deserialize context: {error}"))
                })
            })
            .transpose()
        })
    }

    fn save_context<'a>(
        &'a self,
        key: &'a ConversationKey,
        contexts: &'a ChatContexts,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            let json = serde_json::to_string(contexts).map_err(|error| {
                MemoryError::serialization(format!("failed to serialize context: {error}"))
            })?;
            let (secs, nanos) = encode_system_time(SystemTime::now())?;
            let conn = self.connection()?;
            conn.execute(
                "
                INSERT INTO chat_contexts (
                    storage_key,
                    session_id,
                    contexts_json,
                    updated_at_secs,
                    updated_at_nanos
                )
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(storage_key) DO UPDATE SET
                    session_id = excluded.session_id,
                    contexts_json = excluded.contexts_json,
                    updated_at_secs = excluded.updated_at_secs,
                    updated_at_nanos = excluded.updated_at_nanos
                ",
                params![
                    key.storage_key(),
                    contexts.session_id.as_str(),
                    json,
                    secs,
                    nanos
                ],
            )
            .map_err(|error| MemoryError::storage(format!("failed to upsert chat context: {error}")))?;
            Ok(())
        })
    }

    fn delete_context<'a>(
        &'a self,
        key: &'a ConversationKey,
    ) -> BoxFuture<'a, Result<bool, MemoryError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            let removed = conn
                .execute(
                    "DELETE FROM chat_contexts WHERE storage_key = ?1",
                    params![key.storage_key()],
                )
                .map_err(|error| {
                    MemoryError::storage(format!("failed to delete chat context: {error}"))
                })?;
            Ok(removed > 0)
        })
    }

    fn append_log<'a>(&'a self, entry: ChatLogEntry) -> BoxFuture<'a, Result<i64, MemoryError>> {
        Box::pin(async move {
            let (secs, nanos) = encode_system_time(SystemTime::now())?;
            let conn = self.connection()?;
            conn.execute(
                "
                INSERT INTO chat_logs (
                    session_id,
                    user_id,
                    chat_from,
                    chat_model,
                    question,
                    result,
                    question_kind,
                    result_kind,
                    external_user_id,
                    is_first,
                    created_at_secs,
                    created_at_nanos
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                ",
                params![
                    entry.session_id.as_str(),
                    entry.user_id.as_deref(),
                    entry.chat_from.as_deref(),
                    &entry.chat_model,
                    &entry.question,
                    &entry.result,
                    content_kind_to_string(entry.question_kind)?,
                    content_kind_to_string(entry.result_kind)?,
                    &entry.external_user_id,
                    i64::from(entry.is_first),
                    secs,
                    nanos,
                ],
            )
            .map_err(|error| MemoryError::storage(format!("failed to insert chat log: {error}")))?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn load_logs<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Vec<LogRecord>, MemoryError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            let mut stmt = conn
                .prepare(
                    "
                    SELECT id, user_id, chat_from, chat_model, question, result,
                           question_kind, result_kind, external_user_id, is_first,
                           created_at_secs, created_at_nanos
                    FROM chat_logs
                    WHERE session_id = ?1
                    ORDER BY id ASC
                    ",
                )
                .map_err(|error| {
                    MemoryError::storage(format!("failed to prepare chat log query: {error}"))
                })?;
            let rows = stmt
                .query_map(params![session_id.as_str()], |row| {
                    Ok(LogRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        chat_from: row.get(2)?,
                        chat_model: row.get(3)?,
                        question: row.get(4)?,
                        result: row.get(5)?,
                        question_kind: row.get(6)?,
                        result_kind: row.get(7)?,
                        external_user_id: row.get(8)?,
                        is_first: row.get(9)?,
                        created_at_secs: row.get(10)?,
                        created_at_nanos: row.get(11)?,
                    })
                })
                .map_err(|error| {
                    MemoryError::storage(format!("failed to query chat log rows: {error}"))
                })?;

            let mut records = Vec::new();
            for row in rows {
                let row = row.map_err(|error| {
                    MemoryError::storage(format!("failed to read chat log row: {error}"))
                })?;
                records.push(row.into_record(session_id)?);
            }
            Ok(records)
        })
    }
}

struct LogRow {
    id: i64,
    user_id: Option<String>,
    chat_from: Option<String>,
    chat_model: String,
    question: String,
    result: String,
    question_kind: String,
    result_kind: String,
    external_user_id: String,
    is_first: i64,
    created_at_secs: i64,
    created_at_nanos: i64,
}

impl LogRow {
    fn into_record(self, session_id: &SessionId) -> Result<LogRecord, MemoryError> {
        Ok(LogRecord {
            id: self.id,
            created_at: decode_system_time(self.created_at_secs, self.created_at_nanos)?,
            entry: ChatLogEntry {
                user_id: self.user_id,
                chat_from: self.chat_from,
                chat_model: self.chat_model,
                question: self.question,
                result: self.result,
                question_kind: content_kind_from_str(&self.question_kind)?,
                result_kind: content_kind_from_str(&self.result_kind)?,
                external_user_id: self.external_user_id,
                session_id: session_id.clone(),
                is_first: self.is_first != 0,
            },
        })
    }
}

fn content_kind_to_string(kind: ContentKind) -> Result<String, MemoryError> {
    match serde_json::to_value(kind)? {
        serde_json::Value::String(value) => Ok(value),
        other => Err(MemoryError::serialization(format!(
            "content kind encoded as non-string {other}"
        ))),
    }
}

fn content_kind_from_str(value: &str) -> Result<ContentKind, MemoryError> {
    serde_json::from_value(serde_json::Value::String(value.to_string())).map_err(|_| {
        MemoryError::storage(format!("unknown content kind value '{value}'"))
    })
}

pub(crate) fn default_sqlite_path() -> PathBuf {
    if let Some(explicit) = std::env::var_os("PARLEY_SQLITE_PATH") {
        return PathBuf::from(explicit);
    }

    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        return PathBuf::from(home).join(".parley").join("parley.sqlite3");
    }

    PathBuf::from("parley.sqlite3")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_kinds_use_snake_case_labels() {
        assert_eq!(
            content_kind_to_string(ContentKind::FunctionCall).expect("encode"),
            "function_call"
        );
        assert_eq!(
            content_kind_from_str("prompt_template").expect("decode"),
            ContentKind::PromptTemplate
        );
        assert!(content_kind_from_str("hologram").is_err());
    }
}
