//! Runtime hooks for observing orchestration phases.
//!
//! ```rust
//! use pchat::{ChatRuntimeHooks, NoopChatRuntimeHooks};
//!
//! fn accepts_hooks(_hooks: &dyn ChatRuntimeHooks) {}
//!
//! let hooks = NoopChatRuntimeHooks;
//! accepts_hooks(&hooks);
//! ```

use std::fmt::{Display, Formatter};
use std::time::Duration;

use pcommon::ConversationKey;

use crate::{ChatError, GateRejection};

/// Orchestration phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatPhase {
    PreProcess,
    Dispatch,
    Persist,
    ToolCallLoop,
}

impl ChatPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreProcess => "preprocess",
            Self::Dispatch => "dispatch",
            Self::Persist => "persist",
            Self::ToolCallLoop => "tool_call_loop",
        }
    }
}

impl Display for ChatPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one model round produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoundSummary {
    pub recursion_level: u32,
    pub answer_chars: usize,
    pub reasoning_chars: usize,
    pub function_calls: usize,
    pub recalled: bool,
}

pub trait ChatRuntimeHooks: Send + Sync {
    fn on_phase_start(&self, _phase: ChatPhase, _key: &ConversationKey, _recursion_level: u32) {}

    fn on_phase_success(
        &self,
        _phase: ChatPhase,
        _key: &ConversationKey,
        _recursion_level: u32,
        _elapsed: Duration,
    ) {
    }

    fn on_phase_failure(
        &self,
        _phase: ChatPhase,
        _key: &ConversationKey,
        _recursion_level: u32,
        _error: &ChatError,
        _elapsed: Duration,
    ) {
    }

    fn on_gate_rejected(&self, _key: &ConversationKey, _rejection: GateRejection) {}

    fn on_round_complete(&self, _key: &ConversationKey, _summary: &RoundSummary) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopChatRuntimeHooks;

impl ChatRuntimeHooks for NoopChatRuntimeHooks {}
