//! Vendor adapter contract and per-model capability flags.
//!
//! ```rust
//! use pprovider::ModelCapabilities;
//!
//! let caps = ModelCapabilities::text_only().with_image().with_functions();
//! assert!(caps.image);
//! assert!(caps.functions);
//! assert!(!caps.audio);
//! ```

use pcommon::{BoxFuture, ConversationKey, MetadataMap};

use crate::{ChatContexts, ChatResult, ResultStream};

pub type ProviderFuture<'a, T> = BoxFuture<'a, T>;

/// What a model can accept, plus whether its requests run long enough that a
/// concurrent request should be turned into a control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModelCapabilities {
    pub image: bool,
    pub audio: bool,
    pub file: bool,
    pub functions: bool,
    pub long_processing: bool,
}

impl ModelCapabilities {
    pub fn text_only() -> Self {
        Self::default()
    }

    pub fn with_image(mut self) -> Self {
        self.image = true;
        self
    }

    pub fn with_audio(mut self) -> Self {
        self.audio = true;
        self
    }

    pub fn with_file(mut self) -> Self {
        self.file = true;
        self
    }

    pub fn with_functions(mut self) -> Self {
        self.functions = true;
        self
    }

    pub fn with_long_processing(mut self) -> Self {
        self.long_processing = true;
        self
    }
}

/// Tool description offered to a model. `trigger_words` drive automatic
/// selection when the caller names no tools.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: String,
    pub trigger_words: Vec<String>,
    /// Instruction attached to results of this tool for the next model round.
    pub prompt: Option<String>,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: input_schema.into(),
            trigger_words: Vec::new(),
            prompt: None,
        }
    }

    pub fn with_trigger_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trigger_words = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }
}

/// Fully prepared input handed to an adapter for one model round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatInput {
    pub key: ConversationKey,
    pub chat_model: String,
    pub contexts: ChatContexts,
    /// Names of the tools offered to the model this round.
    pub functions: Vec<String>,
    /// Definitions resolved for `functions`.
    pub tools: Vec<ToolDefinition>,
    pub recursion_level: u32,
    pub user_id: Option<String>,
    pub metadata: MetadataMap,
}

impl ChatInput {
    pub fn new(key: ConversationKey, chat_model: impl Into<String>, contexts: ChatContexts) -> Self {
        Self {
            key,
            chat_model: chat_model.into(),
            contexts,
            functions: Vec::new(),
            tools: Vec::new(),
            recursion_level: 0,
            user_id: None,
            metadata: MetadataMap::new(),
        }
    }
}

/// One vendor integration. Implementations build the vendor request from a
/// [`ChatInput`] and must only emit canonical [`ChatResult`] values; vendor
/// failures are reported as `ChatResult::Error` items, not as stream errors.
pub trait ChatAdapter: Send + Sync {
    fn stream_chat<'a>(&'a self, input: &'a ChatInput) -> ResultStream<'a>;

    fn query_chat<'a>(&'a self, input: &'a ChatInput) -> ProviderFuture<'a, ChatResult>;

    /// Vendor-specific adjustment applied before the context is loaded.
    fn prepare_input(&self, _input: &mut ChatInput) {}
}
