//! Tool execution context and tool outcomes.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use pcommon::{ConversationKey, MetadataMap, SessionId, TraceId};
use pprovider::ContentItem;

/// Read-only view of a conversation's stop flag.
pub trait StopSignal: Send + Sync {
    fn is_stop_requested(&self) -> bool;
}

/// Everything a tool may know about the request it runs in.
#[derive(Clone)]
pub struct ToolExecutionContext {
    pub session_id: SessionId,
    pub trace_id: Option<TraceId>,
    pub key: Option<ConversationKey>,
    pub user_id: Option<String>,
    pub metadata: MetadataMap,
    /// User input addressed to a tool that is waiting for more input. Present
    /// only while the first unresolved call of a pending batch runs.
    pub continuation: Option<Vec<ContentItem>>,
    /// Id of the call being executed, set by the executor.
    pub tool_call_id: Option<String>,
    stop_signal: Option<Arc<dyn StopSignal>>,
}

impl ToolExecutionContext {
    pub fn new(session_id: impl Into<SessionId>) -> Self {
        Self {
            session_id: session_id.into(),
            trace_id: None,
            key: None,
            user_id: None,
            metadata: MetadataMap::new(),
            continuation: None,
            tool_call_id: None,
            stop_signal: None,
        }
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<TraceId>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_key(mut self, key: ConversationKey) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_continuation(mut self, items: Vec<ContentItem>) -> Self {
        self.continuation = Some(items);
        self
    }

    pub fn with_stop_signal(mut self, stop_signal: Arc<dyn StopSignal>) -> Self {
        self.stop_signal = Some(stop_signal);
        self
    }

    pub fn is_continuation(&self) -> bool {
        self.continuation.is_some()
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_signal
            .as_ref()
            .is_some_and(|signal| signal.is_stop_requested())
    }
}

impl Debug for ToolExecutionContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolExecutionContext")
            .field("session_id", &self.session_id)
            .field("trace_id", &self.trace_id)
            .field("key", &self.key)
            .field("user_id", &self.user_id)
            .field("metadata", &self.metadata)
            .field("continuation", &self.continuation)
            .field("tool_call_id", &self.tool_call_id)
            .field("has_stop_signal", &self.stop_signal.is_some())
            .finish()
    }
}

/// What a successful tool run means for the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutput {
    /// Result text is fed back to the model in another round.
    Recall(String),
    /// Text goes straight to the caller as an answer; the model is not asked again.
    Direct(String),
    /// The call is executed by the caller's front end.
    Frontend,
    /// Work finished with nothing to report.
    Done,
    /// The tool needs more user input; the call stays unresolved and later
    /// calls in the same batch are not run.
    Pending,
}

impl ToolOutput {
    pub fn recall(text: impl Into<String>) -> Self {
        Self::Recall(text.into())
    }

    pub fn direct(text: impl Into<String>) -> Self {
        Self::Direct(text.into())
    }
}

impl From<String> for ToolOutput {
    fn from(value: String) -> Self {
        Self::Recall(value)
    }
}
