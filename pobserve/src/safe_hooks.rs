use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use pchat::{ChatError, ChatPhase, ChatRuntimeHooks, GateRejection, RoundSummary};
use pcommon::ConversationKey;
use pprovider::FunctionCall;
use ptooling::{ToolError, ToolExecutionContext, ToolOutput, ToolRuntimeHooks};

/// Keeps a panicking chat hook from unwinding through the orchestrator.
pub struct SafeChatHooks<H> {
    inner: H,
}

impl<H> SafeChatHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ChatRuntimeHooks for SafeChatHooks<H>
where
    H: ChatRuntimeHooks,
{
    fn on_phase_start(&self, phase: ChatPhase, key: &ConversationKey, recursion_level: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_phase_start(phase, key, recursion_level)
        }));
    }

    fn on_phase_success(
        &self,
        phase: ChatPhase,
        key: &ConversationKey,
        recursion_level: u32,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_phase_success(phase, key, recursion_level, elapsed)
        }));
    }

    fn on_phase_failure(
        &self,
        phase: ChatPhase,
        key: &ConversationKey,
        recursion_level: u32,
        error: &ChatError,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_phase_failure(phase, key, recursion_level, error, elapsed)
        }));
    }

    fn on_gate_rejected(&self, key: &ConversationKey, rejection: GateRejection) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_gate_rejected(key, rejection)
        }));
    }

    fn on_round_complete(&self, key: &ConversationKey, summary: &RoundSummary) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_round_complete(key, summary)
        }));
    }
}

pub struct SafeToolHooks<H> {
    inner: H,
}

impl<H> SafeToolHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ToolRuntimeHooks for SafeToolHooks<H>
where
    H: ToolRuntimeHooks,
{
    fn on_execution_start(&self, call: &FunctionCall, context: &ToolExecutionContext) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_execution_start(call, context)
        }));
    }

    fn on_execution_success(
        &self,
        call: &FunctionCall,
        context: &ToolExecutionContext,
        output: &ToolOutput,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_execution_success(call, context, output, elapsed)
        }));
    }

    fn on_execution_failure(
        &self,
        call: &FunctionCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_execution_failure(call, context, error, elapsed)
        }));
    }

    fn on_duplicate_call(&self, call: &FunctionCall, context: &ToolExecutionContext) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_duplicate_call(call, context)
        }));
    }
}
