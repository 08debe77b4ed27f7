//! Metrics-based observability hooks for chat phases and tool execution.
//!
//! ```rust
//! use pobserve::MetricsObservabilityHooks;
//! use ptooling::ToolRuntimeHooks;
//!
//! fn accepts_tool_hooks(_hooks: &dyn ToolRuntimeHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_tool_hooks(&hooks);
//! ```

use std::time::Duration;

use pchat::{ChatError, ChatPhase, ChatRuntimeHooks, GateRejection, RoundSummary};
use pcommon::ConversationKey;
use pprovider::FunctionCall;
use ptooling::{ToolError, ToolExecutionContext, ToolOutput, ToolRuntimeHooks};

use crate::{output_label, rejection_label};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl ChatRuntimeHooks for MetricsObservabilityHooks {
    fn on_phase_start(&self, phase: ChatPhase, _key: &ConversationKey, _recursion_level: u32) {
        metrics::counter!(
            "parley_chat_phase_start_total",
            "phase" => phase.as_str()
        )
        .increment(1);
    }

    fn on_phase_success(
        &self,
        phase: ChatPhase,
        _key: &ConversationKey,
        _recursion_level: u32,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "parley_chat_phase_success_total",
            "phase" => phase.as_str()
        )
        .increment(1);
        metrics::histogram!(
            "parley_chat_phase_duration_seconds",
            "phase" => phase.as_str(),
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_phase_failure(
        &self,
        phase: ChatPhase,
        _key: &ConversationKey,
        _recursion_level: u32,
        error: &ChatError,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "parley_chat_phase_failure_total",
            "phase" => phase.as_str(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "parley_chat_phase_duration_seconds",
            "phase" => phase.as_str(),
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_gate_rejected(&self, _key: &ConversationKey, rejection: GateRejection) {
        metrics::counter!(
            "parley_chat_gate_rejected_total",
            "rejection" => rejection_label(rejection)
        )
        .increment(1);
    }

    fn on_round_complete(&self, _key: &ConversationKey, summary: &RoundSummary) {
        metrics::counter!("parley_chat_rounds_total").increment(1);
        if summary.recalled {
            metrics::counter!("parley_chat_recalls_total").increment(1);
        }
        metrics::histogram!("parley_chat_round_function_calls").record(summary.function_calls as f64);
        metrics::histogram!("parley_chat_round_answer_chars").record(summary.answer_chars as f64);
    }
}

impl ToolRuntimeHooks for MetricsObservabilityHooks {
    fn on_execution_start(&self, call: &FunctionCall, _context: &ToolExecutionContext) {
        metrics::counter!(
            "parley_tool_execution_start_total",
            "tool_name" => call.name.clone()
        )
        .increment(1);
    }

    fn on_execution_success(
        &self,
        call: &FunctionCall,
        _context: &ToolExecutionContext,
        output: &ToolOutput,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "parley_tool_execution_success_total",
            "tool_name" => call.name.clone(),
            "output" => output_label(output)
        )
        .increment(1);
        metrics::histogram!(
            "parley_tool_execution_duration_seconds",
            "tool_name" => call.name.clone(),
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_execution_failure(
        &self,
        call: &FunctionCall,
        _context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "parley_tool_execution_failure_total",
            "tool_name" => call.name.clone(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "parley_tool_execution_duration_seconds",
            "tool_name" => call.name.clone(),
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_duplicate_call(&self, call: &FunctionCall, _context: &ToolExecutionContext) {
        metrics::counter!(
            "parley_tool_duplicate_call_total",
            "tool_name" => call.name.clone()
        )
        .increment(1);
    }
}
