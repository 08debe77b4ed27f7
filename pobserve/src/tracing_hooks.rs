//! Tracing-based observability hooks for chat phases and tool execution.
//!
//! ```rust
//! use pchat::ChatRuntimeHooks;
//! use pobserve::TracingObservabilityHooks;
//!
//! fn accepts_chat_hooks(_hooks: &dyn ChatRuntimeHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_chat_hooks(&hooks);
//! ```

use std::time::Duration;

use pchat::{ChatError, ChatPhase, ChatRuntimeHooks, GateRejection, RoundSummary};
use pcommon::ConversationKey;
use pprovider::FunctionCall;
use ptooling::{ToolError, ToolExecutionContext, ToolOutput, ToolRuntimeHooks};

use crate::{output_label, rejection_label};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl ChatRuntimeHooks for TracingObservabilityHooks {
    fn on_phase_start(&self, phase: ChatPhase, key: &ConversationKey, recursion_level: u32) {
        tracing::debug!(
            phase = "chat",
            event = "phase_start",
            chat_phase = phase.as_str(),
            key = %key,
            recursion_level
        );
    }

    fn on_phase_success(
        &self,
        phase: ChatPhase,
        key: &ConversationKey,
        recursion_level: u32,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "chat",
            event = "phase_success",
            chat_phase = phase.as_str(),
            key = %key,
            recursion_level,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_phase_failure(
        &self,
        phase: ChatPhase,
        key: &ConversationKey,
        recursion_level: u32,
        error: &ChatError,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "chat",
            event = "phase_failure",
            chat_phase = phase.as_str(),
            key = %key,
            recursion_level,
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            error = %error
        );
    }

    fn on_gate_rejected(&self, key: &ConversationKey, rejection: GateRejection) {
        tracing::warn!(
            phase = "chat",
            event = "gate_rejected",
            key = %key,
            rejection = rejection_label(rejection)
        );
    }

    fn on_round_complete(&self, key: &ConversationKey, summary: &RoundSummary) {
        tracing::info!(
            phase = "chat",
            event = "round_complete",
            key = %key,
            recursion_level = summary.recursion_level,
            answer_chars = summary.answer_chars,
            reasoning_chars = summary.reasoning_chars,
            function_calls = summary.function_calls,
            recalled = summary.recalled
        );
    }
}

impl ToolRuntimeHooks for TracingObservabilityHooks {
    fn on_execution_start(&self, call: &FunctionCall, context: &ToolExecutionContext) {
        tracing::info!(
            phase = "tool",
            event = "execution_start",
            tool_name = call.name.as_str(),
            tool_call_id = call.id.as_str(),
            session_id = %context.session_id,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str()),
            continuation = context.is_continuation()
        );
    }

    fn on_execution_success(
        &self,
        call: &FunctionCall,
        context: &ToolExecutionContext,
        output: &ToolOutput,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "tool",
            event = "execution_success",
            tool_name = call.name.as_str(),
            tool_call_id = call.id.as_str(),
            session_id = %context.session_id,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str()),
            output = output_label(output),
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_execution_failure(
        &self,
        call: &FunctionCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "tool",
            event = "execution_failure",
            tool_name = call.name.as_str(),
            tool_call_id = call.id.as_str(),
            session_id = %context.session_id,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str()),
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            error = %error
        );
    }

    fn on_duplicate_call(&self, call: &FunctionCall, context: &ToolExecutionContext) {
        tracing::debug!(
            phase = "tool",
            event = "duplicate_call",
            tool_name = call.name.as_str(),
            tool_call_id = call.id.as_str(),
            session_id = %context.session_id
        );
    }
}
