//! Chat request and result stream types.
//!
//! ```rust
//! use pchat::ChatRequest;
//! use pcommon::ConversationKey;
//! use pprovider::ContentItem;
//!
//! let request = ChatRequest::new(ConversationKey::new("user-1", "chat"), "gpt-4o-mini")
//!     .with_question(ContentItem::text("What's the weather in Paris?"))
//!     .with_functions(["get_weather"])
//!     .ephemeral();
//!
//! assert_eq!(request.first_text(), "What's the weather in Paris?");
//! assert!(request.ignore_persistence);
//! assert_eq!(request.recursion_level, 0);
//! ```

use std::pin::Pin;

use futures_core::Stream;
use pcommon::{ConversationKey, MetadataMap};
use pprovider::{ChatContexts, ChatResult, ContentItem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub key: ConversationKey,
    pub chat_model: String,
    pub question_contents: Vec<ContentItem>,
    /// Used verbatim instead of loading the stored conversation.
    pub existing_context: Option<ChatContexts>,
    /// Tools offered to the model. Empty means automatic selection.
    pub with_functions: Vec<String>,
    pub recursion_level: u32,
    /// Neither load nor save the conversation.
    pub ignore_persistence: bool,
    pub ignore_logging: bool,
    pub user_id: Option<String>,
    /// Front end the request came from, recorded in the audit log.
    pub chat_from: Option<String>,
    pub metadata: MetadataMap,
}

impl ChatRequest {
    pub fn new(key: ConversationKey, chat_model: impl Into<String>) -> Self {
        Self {
            key,
            chat_model: chat_model.into(),
            question_contents: Vec::new(),
            existing_context: None,
            with_functions: Vec::new(),
            recursion_level: 0,
            ignore_persistence: false,
            ignore_logging: false,
            user_id: None,
            chat_from: None,
            metadata: MetadataMap::new(),
        }
    }

    pub fn with_question(mut self, item: ContentItem) -> Self {
        self.question_contents.push(item);
        self
    }

    pub fn with_questions(mut self, items: impl IntoIterator<Item = ContentItem>) -> Self {
        self.question_contents.extend(items);
        self
    }

    pub fn with_existing_context(mut self, contexts: ChatContexts) -> Self {
        self.existing_context = Some(contexts);
        self
    }

    pub fn with_functions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_functions = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_recursion_level(mut self, recursion_level: u32) -> Self {
        self.recursion_level = recursion_level;
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.ignore_persistence = true;
        self
    }

    pub fn without_logging(mut self) -> Self {
        self.ignore_logging = true;
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_chat_from(mut self, chat_from: impl Into<String>) -> Self {
        self.chat_from = Some(chat_from.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Content of the first text item, or an empty string.
    pub fn first_text(&self) -> &str {
        self.question_contents
            .iter()
            .find(|item| item.is_text())
            .map(|item| item.content.as_str())
            .unwrap_or_default()
    }
}

pub type ChatResultStream<'a> = Pin<Box<dyn Stream<Item = ChatResult> + Send + 'a>>;
