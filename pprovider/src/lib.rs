//! Provider-side contracts for the parley workspace: the canonical result
//! vocabulary, the conversation context model, the vendor adapter trait and
//! stream normalization from vendor line protocols.

mod adapter;
mod context;
mod error;
#[cfg(feature = "http")]
mod http;
mod normalizer;
mod registry;
mod result;
mod stream;

pub mod prelude;

pub use adapter::{ChatAdapter, ChatInput, ModelCapabilities, ProviderFuture, ToolDefinition};
pub use context::{ChatContext, ChatContexts, ContentItem, ContentKind};
pub use error::{ProviderError, ProviderErrorKind};
#[cfg(feature = "http")]
pub use http::{normalize_response, response_lines};
pub use normalizer::{
    CompletionsNormalizer, LineNormalizer, ResponsesNormalizer, StreamDialect, ThinkTagSplitter,
    ToolCallAssembler, normalize_lines,
};
pub use registry::{AdapterRegistry, ModelBinding};
pub use result::{
    ChatResult, FunctionCall, LogReceipt, MediaKind, MediaResult, MediaSource, ResultKind,
};
pub use stream::{LineStream, ResultStream, VecLineStream, VecResultStream};
