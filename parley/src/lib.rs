//! Unified facade over the parley workspace crates.
//!
//! This crate is meant to be the single dependency for most applications.
//! It re-exports the core parley crates and adds runtime wiring plus a few
//! helpers and macros for building requests.
//!
//! ```rust
//! use parley::{ChatResult, collect_answer, contents};
//!
//! let question = contents![text => "What's the weather in Paris?"];
//! assert_eq!(question.len(), 1);
//!
//! let events = vec![ChatResult::answer("22C "), ChatResult::answer("and sunny")];
//! assert_eq!(collect_answer(&events), "22C and sunny");
//! ```

mod macros;

pub mod prelude;
pub mod runtime;
pub mod util;

pub use pchat;
pub use pcommon;
pub use pmemory;
pub use pobserve;
pub use pprovider;
pub use ptooling;

pub use pchat::{
    ChatError, ChatErrorKind, ChatLogEntry, ChatPhase, ChatPolicy, ChatRequest, ChatResultStream,
    ChatRuntimeHooks, ChatService, ChatServiceBuilder, ContextStore, ControlCommand, GateDecision,
    GateRejection, InMemoryContextStore, InMemoryLogStore, InlineMediaPreprocessor, LogStore,
    MediaPreprocessor, NoopChatRuntimeHooks, RoundSummary, SessionGuard, SessionLockRegistry,
};
pub use pcommon::{BoxFuture, ConversationKey, MetadataMap, SessionId, TraceId};
pub use pmemory::{
    FilesystemMemoryBackend, InMemoryMemoryBackend, LogRecord, MemoryBackend,
    MemoryBackendConfig, MemoryError, MemoryErrorKind, MemoryStore, SqliteMemoryBackend,
    create_default_memory_backend, create_memory_backend, create_memory_store,
};
pub use pobserve::{
    MetricsObservabilityHooks, SafeChatHooks, SafeToolHooks, TracingObservabilityHooks,
};
pub use pprovider::{
    AdapterRegistry, ChatAdapter, ChatContext, ChatContexts, ChatInput, ChatResult, ContentItem,
    ContentKind, FunctionCall, LineStream, LogReceipt, MediaKind, MediaResult, MediaSource,
    ModelBinding, ModelCapabilities, ProviderError, ProviderErrorKind, ProviderFuture,
    ResultKind, ResultStream, StreamDialect, ToolDefinition, VecLineStream, VecResultStream,
    normalize_lines,
};
#[cfg(feature = "http")]
pub use pprovider::{normalize_response, response_lines};
pub use ptooling::{
    DefaultToolExecutor, FunctionTool, NoopToolRuntimeHooks, StopSignal, Tool, ToolError,
    ToolErrorKind, ToolEvent, ToolEventStream, ToolExecutionContext, ToolExecutor, ToolFuture,
    ToolOutput, ToolRegistry, ToolRuntimeHooks, ToolSelector, TriggerWordToolSelector,
    optional_string, parse_json_object, parse_json_value, required_f64, required_string,
};

pub use runtime::{
    RuntimeBundle, RuntimeOptions, build_runtime, build_runtime_with, build_runtime_with_memory,
    build_runtime_with_tooling, chat_service, chat_service_with_memory, in_memory_backend,
};
pub use util::{
    ask, collect_answer, conversation, ephemeral_ask, parse_stream_dialect, text_question,
};
