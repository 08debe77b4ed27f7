//! Capability layer for registering tools and resolving model-issued tool calls.

mod args;
mod error;
mod executor;
mod hooks;
mod registry;
mod selector;
mod tool;
mod types;

pub mod prelude {
    pub use crate::{
        DefaultToolExecutor, FunctionTool, NoopToolRuntimeHooks, StopSignal, Tool, ToolError,
        ToolErrorKind, ToolEvent, ToolEventStream, ToolExecutionContext, ToolExecutor, ToolFuture,
        ToolOutput, ToolRegistry, ToolRuntimeHooks, ToolSelector, TriggerWordToolSelector,
    };
}

pub use args::{optional_string, parse_json_object, parse_json_value, required_f64, required_string};
pub use error::{FAILED_RESULT_PREFIX, ToolError, ToolErrorKind};
pub use executor::{DONE_RESULT, DefaultToolExecutor, ToolEvent, ToolEventStream, ToolExecutor};
pub use hooks::{NoopToolRuntimeHooks, ToolRuntimeHooks};
pub use registry::ToolRegistry;
pub use selector::{ToolSelector, TriggerWordToolSelector};
pub use tool::{FunctionTool, Tool, ToolFuture};
pub use types::{StopSignal, ToolExecutionContext, ToolOutput};
