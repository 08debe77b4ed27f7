//! Conversation context model and its mutation rules.
//!
//! A [`ChatContexts`] is the whole persisted history of one conversation: a
//! system prompt plus an append-only list of turns. Each [`ChatContext`] turn
//! holds question items (`qc`) and answer items (`ac`). Questions only extend
//! a turn whose answer side is still empty; once the model has answered, new
//! input opens a new turn.
//!
//! ```rust
//! use pprovider::{ChatContexts, ContentItem};
//!
//! let mut contexts = ChatContexts::new();
//! contexts.add_questions(vec![ContentItem::text("hello")]);
//! contexts.add_questions(vec![ContentItem::text("are you there?")]);
//! assert_eq!(contexts.contexts.len(), 1);
//!
//! contexts.add_answer(ContentItem::text("yes"));
//! contexts.add_questions(vec![ContentItem::text("great")]);
//! assert_eq!(contexts.contexts.len(), 2);
//! ```

use pcommon::SessionId;
use serde::{Deserialize, Serialize};

use crate::{ChatResult, FunctionCall};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Text,
    PromptTemplate,
    ImageBase64,
    ImageUrl,
    MultiResult,
    FunctionCall,
    VirtualContexts,
    System,
    Reasoning,
    FileBytes,
    FileUrl,
    AudioBase64,
    AudioUrl,
    VideoBase64,
    VideoUrl,
    CacheId,
}

impl ContentKind {
    pub fn is_image(self) -> bool {
        matches!(self, Self::ImageBase64 | Self::ImageUrl)
    }

    pub fn is_audio(self) -> bool {
        matches!(self, Self::AudioBase64 | Self::AudioUrl)
    }

    pub fn is_file(self) -> bool {
        matches!(self, Self::FileBytes | Self::FileUrl)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub kind: ContentKind,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl ContentItem {
    pub fn new(kind: ContentKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            bytes: None,
            mime_type: None,
            file_name: None,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(ContentKind::Text, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ContentKind::System, content)
    }

    pub fn reasoning(content: impl Into<String>) -> Self {
        Self::new(ContentKind::Reasoning, content)
    }

    pub fn prompt_template(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(ContentKind::PromptTemplate, content).with_file_name(name)
    }

    pub fn virtual_contexts(transcript: impl Into<String>) -> Self {
        Self::new(ContentKind::VirtualContexts, transcript)
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        Self::new(ContentKind::ImageUrl, url)
    }

    pub fn image_base64(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self::new(ContentKind::ImageBase64, data).with_mime_type(mime_type)
    }

    pub fn audio_base64(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self::new(ContentKind::AudioBase64, data).with_mime_type(mime_type)
    }

    pub fn file_url(url: impl Into<String>) -> Self {
        Self::new(ContentKind::FileUrl, url)
    }

    pub fn file_bytes(
        bytes: Vec<u8>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            kind: ContentKind::FileBytes,
            content: String::new(),
            bytes: Some(bytes),
            mime_type: Some(mime_type.into()),
            file_name: Some(file_name.into()),
        }
    }

    /// Serializes a tool-call batch into an answer item.
    pub fn function_calls(calls: &[FunctionCall]) -> Result<Self, serde_json::Error> {
        Ok(Self::new(ContentKind::FunctionCall, serde_json::to_string(calls)?))
    }

    pub fn multi_result(items: &[ChatResult]) -> Result<Self, serde_json::Error> {
        Ok(Self::new(ContentKind::MultiResult, serde_json::to_string(items)?))
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn is_text(&self) -> bool {
        self.kind == ContentKind::Text
    }

    pub fn mime_starts_with(&self, prefix: &str) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|mime| mime.starts_with(prefix))
    }

    /// Decodes a `FunctionCall` item back into its batch.
    pub fn parse_function_calls(&self) -> Option<Vec<FunctionCall>> {
        if self.kind != ContentKind::FunctionCall {
            return None;
        }

        match serde_json::from_str::<Vec<FunctionCall>>(&self.content) {
            Ok(calls) => Some(calls),
            Err(error) => {
                tracing::debug!(error = %error, "skipping malformed function call item");
                None
            }
        }
    }
}

/// One question and answer unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatContext {
    #[serde(default)]
    pub qc: Vec<ContentItem>,
    #[serde(default)]
    pub ac: Vec<ContentItem>,
}

impl ChatContext {
    pub fn new(qc: Vec<ContentItem>) -> Self {
        Self { qc, ac: Vec::new() }
    }

    pub fn is_open(&self) -> bool {
        self.ac.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatContexts {
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub contexts: Vec<ChatContext>,
    pub session_id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_content_id: Option<String>,
}

impl Default for ChatContexts {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatContexts {
    pub fn new() -> Self {
        Self {
            system_prompt: String::new(),
            contexts: Vec::new(),
            session_id: SessionId::generate(),
            cached_content_id: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<SessionId>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn last(&self) -> Option<&ChatContext> {
        self.contexts.last()
    }

    /// Merges new question items into the conversation.
    ///
    /// `System` items extend the system prompt, `PromptTemplate` items are
    /// only accepted into an empty conversation, `VirtualContexts` items are
    /// expanded into synthetic turns and a `FunctionCall` item assigns its
    /// result to the matching pending call. Everything else becomes question
    /// content of the open turn, or of a new turn when the last one already
    /// has an answer.
    pub fn add_questions(&mut self, items: Vec<ContentItem>) {
        let was_empty = self.is_empty();
        let mut question = Vec::new();

        for item in items {
            match item.kind {
                ContentKind::System => self.append_system_prompt(&item.content),
                ContentKind::PromptTemplate => {
                    if was_empty {
                        question.push(item);
                    }
                }
                ContentKind::VirtualContexts => {
                    self.contexts.extend(parse_virtual_contexts(&item.content));
                }
                ContentKind::FunctionCall => self.apply_function_result(&item),
                _ => question.push(item),
            }
        }

        if question.is_empty() {
            return;
        }

        match self.contexts.last_mut() {
            Some(turn) if turn.is_open() => turn.qc.extend(question),
            _ => self.contexts.push(ChatContext::new(question)),
        }
    }

    /// Appends an answer item to the last turn.
    pub fn add_answer(&mut self, item: ContentItem) {
        match self.contexts.last_mut() {
            Some(turn) => turn.ac.push(item),
            None => self.contexts.push(ChatContext {
                qc: Vec::new(),
                ac: vec![item],
            }),
        }
    }

    /// Returns the tool-call batch ending the conversation if it still has
    /// unresolved calls.
    pub fn pending_function_calls(&self) -> Option<Vec<FunctionCall>> {
        let item = self.last()?.ac.last()?;
        let calls = item.parse_function_calls()?;
        calls.iter().any(FunctionCall::is_pending).then_some(calls)
    }

    /// Rewrites the most recent tool-call batch of the last turn. Returns
    /// `false` when the last turn has no such item.
    pub fn replace_function_calls(&mut self, calls: &[FunctionCall]) -> Result<bool, serde_json::Error> {
        let Some(turn) = self.contexts.last_mut() else {
            return Ok(false);
        };
        let Some(item) = turn
            .ac
            .iter_mut()
            .rev()
            .find(|item| item.kind == ContentKind::FunctionCall)
        else {
            return Ok(false);
        };

        item.content = serde_json::to_string(calls)?;
        Ok(true)
    }

    pub fn has_image(&self) -> bool {
        self.any_question(|kind| kind.is_image())
    }

    pub fn has_audio(&self) -> bool {
        self.any_question(|kind| kind.is_audio())
    }

    pub fn has_file(&self) -> bool {
        self.any_question(|kind| kind.is_file())
    }

    /// System prompt followed by every text question, newline separated.
    pub fn question_corpus(&self) -> String {
        let mut corpus = self.system_prompt.clone();
        for item in self
            .contexts
            .iter()
            .flat_map(|turn| turn.qc.iter())
            .filter(|item| item.is_text())
        {
            if !corpus.is_empty() {
                corpus.push('\n');
            }
            corpus.push_str(&item.content);
        }
        corpus
    }

    fn any_question(&self, predicate: impl Fn(ContentKind) -> bool) -> bool {
        self.contexts
            .iter()
            .flat_map(|turn| turn.qc.iter())
            .any(|item| predicate(item.kind))
    }

    fn append_system_prompt(&mut self, addition: &str) {
        let addition = addition.trim();
        if addition.is_empty() || self.system_prompt.contains(addition) {
            return;
        }

        if !self.system_prompt.is_empty() {
            self.system_prompt.push('\n');
        }
        self.system_prompt.push_str(addition);
    }

    fn apply_function_result(&mut self, item: &ContentItem) {
        let resolved = match serde_json::from_str::<FunctionCall>(&item.content) {
            Ok(call) => call,
            Err(error) => {
                tracing::debug!(error = %error, "ignoring malformed function result item");
                return;
            }
        };
        let Some(result) = resolved.result.clone() else {
            return;
        };
        let Some(mut calls) = self.pending_function_calls() else {
            return;
        };

        let Some(target) = calls
            .iter_mut()
            .find(|call| call.id == resolved.id && call.is_pending())
        else {
            return;
        };
        target.result = Some(result);
        target.need_recall = resolved.need_recall;

        if let Err(error) = self.replace_function_calls(&calls) {
            tracing::debug!(error = %error, "failed to store function result");
        }
    }
}

/// Expands a `Q: ... / A: ...` transcript into synthetic turns. Lines that
/// start neither marker continue the previous entry.
fn parse_virtual_contexts(transcript: &str) -> Vec<ChatContext> {
    let mut turns = Vec::new();
    let mut question: Option<String> = None;
    let mut answer: Option<String> = None;

    let mut flush = |question: &mut Option<String>, answer: &mut Option<String>| {
        if let Some(q) = question.take() {
            let mut turn = ChatContext::new(vec![ContentItem::text(q.trim())]);
            if let Some(a) = answer.take() {
                turn.ac.push(ContentItem::text(a.trim()));
            }
            turns.push(turn);
        }
        *answer = None;
    };

    for line in transcript.lines() {
        if let Some(rest) = strip_marker(line, 'Q') {
            flush(&mut question, &mut answer);
            question = Some(rest.to_string());
        } else if let Some(rest) = strip_marker(line, 'A') {
            if question.is_some() {
                answer = Some(rest.to_string());
            }
        } else if let Some(current) = answer.as_mut().or(question.as_mut()) {
            current.push('\n');
            current.push_str(line);
        }
    }
    flush(&mut question, &mut answer);

    turns
}

fn strip_marker(line: &str, marker: char) -> Option<&str> {
    let rest = line.trim_start().strip_prefix(marker)?;
    rest.strip_prefix(':')
        .or_else(|| rest.strip_prefix('：'))
        .map(str::trim_start)
}
