//! Production-friendly observability hooks for chat phases and tool execution.
//!
//! ```rust
//! use pobserve::{MetricsObservabilityHooks, SafeChatHooks, TracingObservabilityHooks};
//!
//! let _chat_hooks = SafeChatHooks::new(TracingObservabilityHooks);
//! let _metrics = MetricsObservabilityHooks;
//! ```

mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use metrics_hooks::MetricsObservabilityHooks;
pub use safe_hooks::{SafeChatHooks, SafeToolHooks};
pub use tracing_hooks::TracingObservabilityHooks;

pub mod prelude {
    pub use crate::{
        MetricsObservabilityHooks, SafeChatHooks, SafeToolHooks, TracingObservabilityHooks,
    };
}

pub(crate) fn output_label(output: &ptooling::ToolOutput) -> &'static str {
    match output {
        ptooling::ToolOutput::Recall(_) => "recall",
        ptooling::ToolOutput::Direct(_) => "direct",
        ptooling::ToolOutput::Frontend => "frontend",
        ptooling::ToolOutput::Done => "done",
        ptooling::ToolOutput::Pending => "pending",
    }
}

pub(crate) fn rejection_label(rejection: pchat::GateRejection) -> &'static str {
    match rejection {
        pchat::GateRejection::StopRequested => "stop_requested",
        pchat::GateRejection::Cleared => "cleared",
        pchat::GateRejection::Busy => "busy",
    }
}
