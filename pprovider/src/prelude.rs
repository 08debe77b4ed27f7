//! Common `pprovider` imports for downstream crates.

pub use crate::{
    AdapterRegistry, ChatAdapter, ChatContext, ChatContexts, ChatInput, ChatResult, ContentItem,
    ContentKind, FunctionCall, ModelCapabilities, ProviderError, ProviderErrorKind,
    ProviderFuture, ResultKind, ResultStream, StreamDialect, ToolDefinition, VecResultStream,
    normalize_lines,
};
pub use pcommon::{BoxFuture, ConversationKey, MetadataMap};
