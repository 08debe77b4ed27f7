//! Runtime hooks for tool execution lifecycle events.
//!
//! ```rust
//! use ptooling::{NoopToolRuntimeHooks, ToolRuntimeHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn ToolRuntimeHooks) {}
//!
//! let hooks = NoopToolRuntimeHooks;
//! assert_hooks_trait(&hooks);
//! ```

use std::time::Duration;

use pprovider::FunctionCall;

use crate::{ToolError, ToolExecutionContext, ToolOutput};

pub trait ToolRuntimeHooks: Send + Sync {
    fn on_execution_start(&self, _call: &FunctionCall, _context: &ToolExecutionContext) {}

    fn on_execution_success(
        &self,
        _call: &FunctionCall,
        _context: &ToolExecutionContext,
        _output: &ToolOutput,
        _elapsed: Duration,
    ) {
    }

    fn on_execution_failure(
        &self,
        _call: &FunctionCall,
        _context: &ToolExecutionContext,
        _error: &ToolError,
        _elapsed: Duration,
    ) {
    }

    /// A call in the batch was answered from an identical earlier call.
    fn on_duplicate_call(&self, _call: &FunctionCall, _context: &ToolExecutionContext) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopToolRuntimeHooks;

impl ToolRuntimeHooks for NoopToolRuntimeHooks {}
