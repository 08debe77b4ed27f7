//! Common imports for most parley applications.

pub use crate::{
    ask, build_runtime, build_runtime_with, build_runtime_with_memory, build_runtime_with_tooling,
    chat_service, chat_service_with_memory, collect_answer, conversation, ephemeral_ask,
    in_memory_backend, parse_stream_dialect, text_question,
};
pub use crate::{chat_request, content, contents};
pub use crate::{
    AdapterRegistry, BoxFuture, ChatAdapter, ChatContexts, ChatError, ChatErrorKind, ChatInput,
    ChatPhase, ChatPolicy, ChatRequest, ChatResult, ChatResultStream, ChatService,
    ChatServiceBuilder, ContentItem, ContentKind, ContextStore, ConversationKey,
    DefaultToolExecutor, FunctionCall, LogStore, MemoryBackend, MemoryBackendConfig, MemoryStore,
    ModelCapabilities, ProviderFuture, ResultStream, RuntimeBundle, RuntimeOptions, SessionId,
    SessionLockRegistry, StreamDialect, Tool, ToolDefinition, ToolError, ToolExecutionContext,
    ToolOutput, ToolRegistry,
};
