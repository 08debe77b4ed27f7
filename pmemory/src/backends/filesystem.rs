use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use pchat::ChatLogEntry;
use pcommon::{BoxFuture, ConversationKey, SessionId};
use pprovider::ChatContexts;
use serde::{Deserialize, Serialize};

use crate::backend::MemoryBackend;
use crate::error::MemoryError;
use crate::types::LogRecord;

/// Stores each conversation as one JSON file and audit entries as JSON lines
/// grouped by session. File names are hex-encoded so any key is a valid path.
#[derive(Debug)]
pub struct FilesystemMemoryBackend {
    root: PathBuf,
    lock: Mutex<()>,
}

impl FilesystemMemoryBackend {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let root = root.as_ref().to_path_buf();
        for dir in ["contexts", "logs"] {
            fs::create_dir_all(root.join(dir)).map_err(|error| {
                MemoryError::storage(format!("failed to create filesystem backend root: {error}"))
            })?;
        }
        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn context_path(&self, key: &ConversationKey) -> PathBuf {
        self.root
            .join("contexts")
            .join(format!("{}.json", hex_encode(key.storage_key().as_bytes())))
    }

    fn log_path(&self, session_id: &SessionId) -> PathBuf {
        self.root
            .join("logs")
            .join(format!("{}.jsonl", hex_encode(session_id.as_str().as_bytes())))
    }

    fn sequence_path(&self) -> PathBuf {
        self.root.join("logs").join("sequence")
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>, MemoryError> {
        self.lock
            .lock()
            .map_err(|_| MemoryError::storage("filesystem backend lock poisoned"))
    }

    fn next_log_id(&self) -> Result<i64, MemoryError> {
        let path = self.sequence_path();
        let last = if path.exists() {
            let text = fs::read_to_string(&path).map_err(|error| {
                MemoryError::storage(format!("failed to read log sequence: {error}"))
            })?;
            text.trim().parse::<i64>().map_err(|error| {
                MemoryError::storage(format!("corrupt log sequence '{}': {error}", text.trim()))
            })?
        } else {
            0
        };

        let next = last + 1;
        write_atomic(&path, next.to_string().as_bytes())?;
        Ok(next)
    }
}

impl MemoryBackend for FilesystemMemoryBackend {
    fn load_context<'a>(
        &'a self,
        key: &'a ConversationKey,
    ) -> BoxFuture<'a, Result<Option<ChatContexts>, MemoryError>> {
        Box::pin(async move {
            let _guard = self.guard()?;
            let path = self.context_path(key);
            if !path.exists() {
                return Ok(None);
            }
            let bytes = fs::read(&path).map_err(|error| {
                MemoryError::storage(format!("failed to read context file: {error}"))
            })?;
            let persisted = serde_json::from_slice::<PersistedContext>(&bytes).map_err(|error| {
                MemoryError::serialization(format!("failed to deserialize context: {error}"))
            })?;
            Ok(Some(persisted.contexts))
        })
    }

    fn save_context<'a>(
        &'a self,
        key: &'a ConversationKey,
        contexts: &'a ChatContexts,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            let _guard = self.guard()?;
            let persisted = PersistedContext {
                storage_key: key.storage_key(),
                contexts: contexts.clone(),
            };
            let bytes = serde_json::to_vec_pretty(&persisted).map_err(|error| {
                MemoryError::serialization(format!("failed to serialize context: {error}"))
            })?;
            write_atomic(&self.context_path(key), &bytes)
        })
    }

    fn delete_context<'a>(
        &'a self,
        key: &'a ConversationKey,
    ) -> BoxFuture<'a, Result<bool, MemoryError>> {
        Box::pin(async move {
            let _guard = self.guard()?;
            let path = self.context_path(key);
            if !path.exists() {
                return Ok(false);
            }
            fs::remove_file(&path).map_err(|error| {
                MemoryError::storage(format!("failed to remove context file: {error}"))
            })?;
            Ok(true)
        })
    }

    fn append_log<'a>(&'a self, entry: ChatLogEntry) -> BoxFuture<'a, Result<i64, MemoryError>> {
        Box::pin(async move {
            let _guard = self.guard()?;
            let id = self.next_log_id()?;
            let (created_at_secs, created_at_nanos) = encode_system_time(SystemTime::now())?;
            let path = self.log_path(&entry.session_id);
            let record = PersistedLogRecord {
                id,
                created_at_secs,
                created_at_nanos,
                entry,
            };

            let mut line = serde_json::to_vec(&record).map_err(|error| {
                MemoryError::serialization(format!("failed to serialize log entry: {error}"))
            })?;
            line.push(b'\n');

            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|error| {
                    MemoryError::storage(format!("failed to open log file: {error}"))
                })?;
            file.write_all(&line).map_err(|error| {
                MemoryError::storage(format!("failed to append log entry: {error}"))
            })?;
            Ok(id)
        })
    }

    fn load_logs<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Vec<LogRecord>, MemoryError>> {
        Box::pin(async move {
            let _guard = self.guard()?;
            let path = self.log_path(session_id);
            if !path.exists() {
                return Ok(Vec::new());
            }
            let text = fs::read_to_string(&path).map_err(|error| {
                MemoryError::storage(format!("failed to read log file: {error}"))
            })?;

            text.lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| {
                    let record = serde_json::from_str::<PersistedLogRecord>(line).map_err(
                        |error| {
                            MemoryError::serialization(format!(
                                "failed to deserialize log entry: {error}"
                            ))
                        },
                    )?;
                    record.into_record()
                })
                .collect()
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedContext {
    storage_key: String,
    contexts: ChatContexts,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedLogRecord {
    id: i64,
    created_at_secs: i64,
    created_at_nanos: i64,
    entry: ChatLogEntry,
}

impl PersistedLogRecord {
    fn into_record(self) -> Result<LogRecord, MemoryError> {
        Ok(LogRecord {
            id: self.id,
            created_at: decode_system_time(self.created_at_secs, self.created_at_nanos)?,
            entry: self.entry,
        })
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), MemoryError> {
    let Some(parent) = path.parent() else {
        return Err(MemoryError::storage("storage file missing parent directory"));
    };
    fs::create_dir_all(parent).map_err(|error| {
        MemoryError::storage(format!("failed to create parent directory: {error}"))
    })?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).map_err(|error| {
        MemoryError::storage(format!("failed to write temporary file: {error}"))
    })?;

    if path.exists() {
        fs::remove_file(path).map_err(|error| {
            MemoryError::storage(format!("failed to replace existing file: {error}"))
        })?;
    }
    fs::rename(&tmp, path)
        .map_err(|error| MemoryError::storage(format!("failed to finalize file: {error}")))
}

pub(crate) fn encode_system_time(value: SystemTime) -> Result<(i64, i64), MemoryError> {
    let duration = value.duration_since(UNIX_EPOCH).map_err(|error| {
        MemoryError::invalid_request(format!("timestamp predates unix epoch: {error}"))
    })?;
    Ok((
        duration.as_secs() as i64,
        i64::from(duration.subsec_nanos()),
    ))
}

pub(crate) fn decode_system_time(seconds: i64, nanos: i64) -> Result<SystemTime, MemoryError> {
    if seconds < 0 {
        return Err(MemoryError::storage(format!(
            "timestamp seconds must be non-negative, got {seconds}"
        )));
    }
    if !(0..1_000_000_000).contains(&nanos) {
        return Err(MemoryError::storage(format!(
            "timestamp nanos must be in [0, 1_000_000_000), got {nanos}"
        )));
    }
    Ok(UNIX_EPOCH + Duration::new(seconds as u64, nanos as u32))
}

fn hex_encode(input: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut output = String::with_capacity(input.len() * 2);
    for byte in input {
        output.push(DIGITS[usize::from(byte >> 4)] as char);
        output.push(DIGITS[usize::from(byte & 0x0f)] as char);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_names_are_path_safe() {
        assert_eq!(hex_encode("a/b".as_bytes()), "612f62");
        assert_eq!(hex_encode(&[0x00, 0xff]), "00ff");
    }

    #[test]
    fn timestamps_survive_encoding() {
        let now = SystemTime::now();
        let (secs, nanos) = encode_system_time(now).expect("after epoch");
        assert_eq!(decode_system_time(secs, nanos).expect("valid"), now);
        assert!(decode_system_time(1, 1_000_000_000).is_err());
    }
}
