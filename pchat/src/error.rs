//! Chat-layer errors and classification.
//!
//! ```rust
//! use pchat::{ChatError, ChatErrorKind, ChatPhase};
//!
//! let error = ChatError::store("disk full").in_phase(ChatPhase::Persist);
//! assert_eq!(error.kind, ChatErrorKind::Store);
//! assert_eq!(error.to_string(), "Store [persist]: disk full");
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

use pprovider::{ChatResult, ProviderError};
use ptooling::ToolError;

use crate::ChatPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    InvalidRequest,
    Provider,
    Store,
    Tooling,
    Capability,
    RecursionLimit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
    pub phase: Option<ChatPhase>,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            phase: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidRequest, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Provider, message)
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Store, message)
    }

    pub fn tooling(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Tooling, message)
    }

    pub fn capability(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Capability, message)
    }

    pub fn recursion_limit(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::RecursionLimit, message)
    }

    pub fn in_phase(mut self, phase: ChatPhase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// The caller-facing event for this error.
    pub fn to_result(&self) -> ChatResult {
        ChatResult::error(self.message.clone())
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.phase {
            Some(phase) => write!(f, "{:?} [{}]: {}", self.kind, phase, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ChatError {}

impl From<ProviderError> for ChatError {
    fn from(value: ProviderError) -> Self {
        ChatError::provider(value.message)
    }
}

impl From<ToolError> for ChatError {
    fn from(value: ToolError) -> Self {
        ChatError::tooling(value.to_string())
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(value: serde_json::Error) -> Self {
        ChatError::store(format!("context serialization failed: {value}"))
    }
}
