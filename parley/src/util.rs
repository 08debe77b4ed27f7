//! Small convenience constructors for common types.

use crate::{ChatRequest, ChatResult, ContentItem, ConversationKey, StreamDialect};

/// Context prefix used when the caller does not partition conversations.
pub const DEFAULT_PREFIX: &str = "chat";

pub fn conversation(user_id: impl Into<String>, prefix: impl Into<String>) -> ConversationKey {
    ConversationKey::new(user_id, prefix)
}

pub fn text_question(text: impl Into<String>) -> Vec<ContentItem> {
    vec![ContentItem::text(text)]
}

pub fn ask(key: ConversationKey, model: impl Into<String>, text: impl Into<String>) -> ChatRequest {
    ChatRequest::new(key, model).with_question(ContentItem::text(text))
}

/// A one-off request that neither loads nor saves the stored conversation.
pub fn ephemeral_ask(
    key: ConversationKey,
    model: impl Into<String>,
    text: impl Into<String>,
) -> ChatRequest {
    ask(key, model, text).ephemeral()
}

/// Joins the streamed `Answer` fragments, ignoring every other event.
pub fn collect_answer(events: &[ChatResult]) -> String {
    events
        .iter()
        .filter_map(|event| match event {
            ChatResult::Answer(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

pub fn parse_stream_dialect(value: &str) -> Option<StreamDialect> {
    match value.trim().to_ascii_lowercase().as_str() {
        "chat" | "completions" | "chat-completions" | "chat_completions" => {
            Some(StreamDialect::ChatCompletions)
        }
        "responses" | "response" => Some(StreamDialect::Responses),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::{ChatResult, FunctionCall, StreamDialect};

    use super::{ask, collect_answer, conversation, ephemeral_ask, parse_stream_dialect};

    #[test]
    fn parse_stream_dialect_supports_aliases() {
        assert_eq!(
            parse_stream_dialect("Chat-Completions"),
            Some(StreamDialect::ChatCompletions)
        );
        assert_eq!(parse_stream_dialect(" responses "), Some(StreamDialect::Responses));
        assert_eq!(parse_stream_dialect("websocket"), None);
    }

    #[test]
    fn request_helpers_apply_expected_defaults() {
        let key = conversation("user-1", "chat");
        let persisted = ask(key.clone(), "gpt-4o-mini", "hello");
        let ephemeral = ephemeral_ask(key, "gpt-4o-mini", "hello");

        assert!(!persisted.ignore_persistence);
        assert!(ephemeral.ignore_persistence);
        assert_eq!(ephemeral.first_text(), "hello");
    }

    #[test]
    fn collect_answer_skips_non_answer_events() {
        let events = vec![
            ChatResult::reasoning("thinking"),
            ChatResult::answer("It's "),
            ChatResult::FunctionStarted(FunctionCall::new("call_1", "get_weather", "{}")),
            ChatResult::answer("sunny."),
            ChatResult::AnswerFinished,
        ];
        assert_eq!(collect_answer(&events), "It's sunny.");
    }
}
