//! Conversational orchestration over registered model adapters.
//!
//! A [`ChatService`] admits a request through the per-conversation gate,
//! loads and extends the stored context, streams one or more model rounds
//! and resolves the tool calls those rounds issue.

mod error;
mod gate;
mod hooks;
mod media;
mod policy;
mod service;
mod store;
mod types;

pub mod prelude {
    pub use crate::{
        ChatError, ChatErrorKind, ChatLogEntry, ChatPhase, ChatPolicy, ChatRequest,
        ChatResultStream, ChatRuntimeHooks, ChatService, ChatServiceBuilder, ContextStore,
        InMemoryContextStore, InMemoryLogStore, LogStore, NoopChatRuntimeHooks,
        SessionLockRegistry,
    };
    pub use pcommon::{ConversationKey, MetadataMap, SessionId};
    pub use pprovider::{ChatContexts, ChatResult, ContentItem, ContentKind, FunctionCall};
    pub use ptooling::{DefaultToolExecutor, ToolExecutor, ToolRegistry};
}

pub use error::{ChatError, ChatErrorKind};
pub use gate::{ControlCommand, GateDecision, GateRejection, SessionGuard, SessionLockRegistry};
pub use hooks::{ChatPhase, ChatRuntimeHooks, NoopChatRuntimeHooks, RoundSummary};
pub use media::{InlineMediaPreprocessor, MediaPreprocessor};
pub use policy::ChatPolicy;
pub use service::{ChatService, ChatServiceBuilder};
pub use store::{
    ChatFuture, ChatLogEntry, ContextStore, InMemoryContextStore, InMemoryLogStore, LogStore,
};
pub use types::{ChatRequest, ChatResultStream};
pub use pcommon::{ConversationKey, MetadataMap, SessionId};
pub use pprovider::{ChatContext, ChatContexts, ChatResult, ContentItem, ContentKind, FunctionCall};
