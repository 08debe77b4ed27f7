//! Canonical result vocabulary shared by adapters, the tool executor and the
//! orchestrator.
//!
//! Every vendor protocol is reduced to [`ChatResult`] values. The enum is
//! closed: consumers match it exhaustively, and [`ResultKind`] gives a
//! payload-free discriminant for logging and metrics labels.
//!
//! ```rust
//! use pprovider::{ChatResult, FunctionCall, ResultKind};
//!
//! let call = FunctionCall::new("call_1", "get_weather", r#"{"city":"Paris"}"#);
//! assert!(call.is_pending());
//!
//! let batch = ChatResult::FunctionCalls(vec![call]);
//! assert_eq!(batch.kind(), ResultKind::FunctionCalls);
//! assert!(batch.to_string().contains("get_weather"));
//!
//! assert_eq!(ChatResult::answer("hi").to_string(), "hi");
//! ```

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// One model-issued tool invocation and, once resolved, its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub id: String,
    /// Secondary id used by vendors that address a call both by item and by call id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub arguments: String,
    #[serde(default)]
    pub result: Option<Box<ChatResult>>,
    #[serde(default)]
    pub need_recall: bool,
    /// Follow-up instruction a tool attaches to its result for the next model round.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl FunctionCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            item_id: None,
            name: name.into(),
            arguments: arguments.into(),
            result: None,
            need_recall: false,
            prompt: None,
        }
    }

    pub fn with_item_id(mut self, item_id: impl Into<String>) -> Self {
        self.item_id = Some(item_id.into());
        self
    }

    pub fn with_result(mut self, result: ChatResult) -> Self {
        self.result = Some(Box::new(result));
        self
    }

    pub fn with_recall(mut self, need_recall: bool) -> Self {
        self.need_recall = need_recall;
        self
    }

    pub fn is_pending(&self) -> bool {
        self.result.is_none()
    }

    pub fn set_result(&mut self, result: ChatResult) {
        self.result = Some(Box::new(result));
    }

    pub fn result(&self) -> Option<&ChatResult> {
        self.result.as_deref()
    }

    /// True when `other` invokes the same function with the same raw arguments.
    pub fn same_invocation(&self, other: &FunctionCall) -> bool {
        self.name == other.name && self.arguments == other.arguments
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Audio,
    Video,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaSource {
    Url(String),
    Bytes(Vec<u8>),
}

/// Generated or retrieved media passed through to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaResult {
    pub kind: MediaKind,
    pub source: MediaSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl MediaResult {
    pub fn url(kind: MediaKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            source: MediaSource::Url(url.into()),
            mime_type: None,
            file_name: None,
        }
    }

    pub fn bytes(kind: MediaKind, bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            kind,
            source: MediaSource::Bytes(bytes),
            mime_type: Some(mime_type.into()),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}

/// Identifies a persisted audit log entry for caller correlation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogReceipt {
    pub id: i64,
    pub session_id: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ChatResult {
    Answer(String),
    Reasoning(String),
    Error(String),
    Waiting(String),
    FunctionCalls(Vec<FunctionCall>),
    MultiMediaResult(Vec<ChatResult>),
    AnswerStarted,
    AnswerFinished,
    AnswerSummation(String),
    Translation(String),
    LogSaved(LogReceipt),
    Media(MediaResult),
    FunctionStarted(FunctionCall),
    FrontendFunction(FunctionCall),
    FrontendFunctions(Vec<FunctionCall>),
    FunctionResult(String),
    FollowUp(Vec<String>),
    ThoughtSignature(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    Answer,
    Reasoning,
    Error,
    Waiting,
    FunctionCalls,
    MultiMediaResult,
    AnswerStarted,
    AnswerFinished,
    AnswerSummation,
    Translation,
    LogSaved,
    Media,
    FunctionStarted,
    FrontendFunction,
    FrontendFunctions,
    FunctionResult,
    FollowUp,
    ThoughtSignature,
}

impl ResultKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Answer => "answer",
            Self::Reasoning => "reasoning",
            Self::Error => "error",
            Self::Waiting => "waiting",
            Self::FunctionCalls => "function_calls",
            Self::MultiMediaResult => "multi_media_result",
            Self::AnswerStarted => "answer_started",
            Self::AnswerFinished => "answer_finished",
            Self::AnswerSummation => "answer_summation",
            Self::Translation => "translation",
            Self::LogSaved => "log_saved",
            Self::Media => "media",
            Self::FunctionStarted => "function_started",
            Self::FrontendFunction => "frontend_function",
            Self::FrontendFunctions => "frontend_functions",
            Self::FunctionResult => "function_result",
            Self::FollowUp => "follow_up",
            Self::ThoughtSignature => "thought_signature",
        }
    }
}

impl Display for ResultKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ChatResult {
    pub fn answer(text: impl Into<String>) -> Self {
        Self::Answer(text.into())
    }

    pub fn reasoning(text: impl Into<String>) -> Self {
        Self::Reasoning(text.into())
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::Error(text.into())
    }

    pub fn waiting(text: impl Into<String>) -> Self {
        Self::Waiting(text.into())
    }

    pub fn kind(&self) -> ResultKind {
        match self {
            Self::Answer(_) => ResultKind::Answer,
            Self::Reasoning(_) => ResultKind::Reasoning,
            Self::Error(_) => ResultKind::Error,
            Self::Waiting(_) => ResultKind::Waiting,
            Self::FunctionCalls(_) => ResultKind::FunctionCalls,
            Self::MultiMediaResult(_) => ResultKind::MultiMediaResult,
            Self::AnswerStarted => ResultKind::AnswerStarted,
            Self::AnswerFinished => ResultKind::AnswerFinished,
            Self::AnswerSummation(_) => ResultKind::AnswerSummation,
            Self::Translation(_) => ResultKind::Translation,
            Self::LogSaved(_) => ResultKind::LogSaved,
            Self::Media(_) => ResultKind::Media,
            Self::FunctionStarted(_) => ResultKind::FunctionStarted,
            Self::FrontendFunction(_) => ResultKind::FrontendFunction,
            Self::FrontendFunctions(_) => ResultKind::FrontendFunctions,
            Self::FunctionResult(_) => ResultKind::FunctionResult,
            Self::FollowUp(_) => ResultKind::FollowUp,
            Self::ThoughtSignature(_) => ResultKind::ThoughtSignature,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Plain text payload for the text-bearing kinds.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Answer(text)
            | Self::Reasoning(text)
            | Self::Error(text)
            | Self::Waiting(text)
            | Self::AnswerSummation(text)
            | Self::Translation(text)
            | Self::FunctionResult(text)
            | Self::ThoughtSignature(text) => Some(text),
            _ => None,
        }
    }
}

impl Display for ChatResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(text) = self.as_text() {
            return f.write_str(text);
        }

        match self {
            Self::AnswerStarted | Self::AnswerFinished => Ok(()),
            Self::LogSaved(receipt) => f.write_str(&receipt.content),
            Self::FollowUp(items) => f.write_str(&items.join("\n")),
            Self::Media(MediaResult {
                source: MediaSource::Url(url),
                ..
            }) => f.write_str(url),
            Self::FunctionCalls(calls) | Self::FrontendFunctions(calls) => {
                f.write_str(&serde_json::to_string(calls).map_err(|_| std::fmt::Error)?)
            }
            Self::FunctionStarted(call) | Self::FrontendFunction(call) => {
                f.write_str(&serde_json::to_string(call).map_err(|_| std::fmt::Error)?)
            }
            Self::MultiMediaResult(items) => {
                f.write_str(&serde_json::to_string(items).map_err(|_| std::fmt::Error)?)
            }
            other => f.write_str(&serde_json::to_string(other).map_err(|_| std::fmt::Error)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_call_serializes_result_and_recall_flag() {
        let call = FunctionCall::new("call_1", "get_weather", "{\"city\":\"Paris\"}")
            .with_result(ChatResult::answer("22C sunny"))
            .with_recall(true);

        let json = serde_json::to_string(&call).expect("call should serialize");
        let parsed: FunctionCall = serde_json::from_str(&json).expect("call should parse");

        assert_eq!(parsed, call);
        assert!(!parsed.is_pending());
        assert!(!json.contains("prompt"));
    }

    #[test]
    fn pending_call_parses_without_optional_fields() {
        let parsed: FunctionCall =
            serde_json::from_str(r#"{"id":"c1","name":"lookup","arguments":"{}"}"#)
                .expect("minimal call should parse");

        assert!(parsed.is_pending());
        assert!(!parsed.need_recall);
        assert_eq!(parsed.item_id, None);
    }

    #[test]
    fn display_renders_text_kinds_verbatim() {
        assert_eq!(ChatResult::reasoning("thinking").to_string(), "thinking");
        assert_eq!(ChatResult::error("boom").to_string(), "boom");
        assert_eq!(ChatResult::AnswerFinished.to_string(), "");
    }

    #[test]
    fn same_invocation_compares_name_and_arguments() {
        let first = FunctionCall::new("a", "f", "{\"x\":1}");
        let second = FunctionCall::new("b", "f", "{\"x\":1}");
        let third = FunctionCall::new("c", "f", "{\"x\":2}");

        assert!(first.same_invocation(&second));
        assert!(!first.same_invocation(&third));
    }

    #[test]
    fn result_kind_labels_are_snake_case() {
        assert_eq!(ResultKind::FunctionCalls.as_str(), "function_calls");
        assert_eq!(ChatResult::AnswerFinished.kind().to_string(), "answer_finished");
    }
}
