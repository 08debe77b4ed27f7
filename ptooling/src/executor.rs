//! Tool executor contract and the registry-backed default executor.
//!
//! An executor receives a model-issued batch, streams caller-facing events
//! while it works, and finishes with the enriched batch.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use futures_util::StreamExt;
//! use pprovider::{ChatResult, FunctionCall, ToolDefinition};
//! use ptooling::{DefaultToolExecutor, ToolEvent, ToolExecutionContext, ToolExecutor, ToolRegistry};
//!
//! # block_on_ready(async {
//! let mut registry = ToolRegistry::new();
//! registry.register_sync_fn(
//!     ToolDefinition::new("echo", "Echoes input", r#"{"type":"object"}"#),
//!     |args, _ctx| Ok(args),
//! );
//! let executor = DefaultToolExecutor::new(Arc::new(registry));
//!
//! let events: Vec<ToolEvent> = executor
//!     .resolve(
//!         vec![FunctionCall::new("call_1", "echo", r#"{"x":1}"#)],
//!         ToolExecutionContext::new("session-1"),
//!     )
//!     .collect()
//!     .await;
//!
//! let Some(ToolEvent::Resolved(calls)) = events.last() else {
//!     panic!("executor always ends with the resolved batch");
//! };
//! assert_eq!(calls[0].result(), Some(&ChatResult::answer(r#"{"x":1}"#)));
//! assert!(calls[0].need_recall);
//! # });
//! # fn block_on_ready<F: std::future::Future>(future: F) -> F::Output {
//! #     futures_util::FutureExt::now_or_never(future).expect("in-memory tools are ready")
//! # }
//! ```

use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_stream::stream;
use futures_core::Stream;
use futures_timer::Delay;
use futures_util::future::{Either, select};
use pprovider::{ChatResult, FunctionCall, ToolDefinition};

use crate::{
    NoopToolRuntimeHooks, Tool, ToolError, ToolExecutionContext, ToolOutput, ToolRegistry,
    ToolRuntimeHooks,
};

/// Result text recorded on calls that completed without anything for the model.
pub const DONE_RESULT: &str = "DONE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolEvent {
    /// Forward to the caller as-is.
    Emit(ChatResult),
    /// The enriched batch. Always the last event.
    Resolved(Vec<FunctionCall>),
}

pub type ToolEventStream<'a> = Pin<Box<dyn Stream<Item = ToolEvent> + Send + 'a>>;

pub trait ToolExecutor: Send + Sync {
    fn resolve<'a>(
        &'a self,
        calls: Vec<FunctionCall>,
        context: ToolExecutionContext,
    ) -> ToolEventStream<'a>;

    /// Definitions for the named tools, used to describe them to the model.
    fn definitions(&self, _names: &[String]) -> Vec<ToolDefinition> {
        Vec::new()
    }

    /// Every tool this executor can run.
    fn catalog(&self) -> Vec<ToolDefinition> {
        Vec::new()
    }
}

#[derive(Clone)]
pub struct DefaultToolExecutor {
    registry: Arc<ToolRegistry>,
    hooks: Arc<dyn ToolRuntimeHooks>,
    timeout: Option<Duration>,
}

impl Default for DefaultToolExecutor {
    fn default() -> Self {
        Self::new(Arc::new(ToolRegistry::new()))
    }
}

impl DefaultToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            hooks: Arc::new(NoopToolRuntimeHooks),
            timeout: None,
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ToolRuntimeHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Fails any single tool invocation that runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn registry(&self) -> Arc<ToolRegistry> {
        Arc::clone(&self.registry)
    }

    async fn invoke(
        &self,
        tool: &dyn Tool,
        call: &FunctionCall,
        context: &ToolExecutionContext,
    ) -> Result<ToolOutput, ToolError> {
        let invocation = tool.invoke(&call.arguments, context);
        let Some(timeout) = self.timeout else {
            return invocation.await;
        };

        match select(invocation, Delay::new(timeout)).await {
            Either::Left((result, _)) => result,
            Either::Right(((), _)) => Err(ToolError::timeout(format!(
                "no result after {}ms",
                timeout.as_millis()
            ))),
        }
    }
}

impl ToolExecutor for DefaultToolExecutor {
    fn resolve<'a>(
        &'a self,
        calls: Vec<FunctionCall>,
        context: ToolExecutionContext,
    ) -> ToolEventStream<'a> {
        let mut calls = calls;
        let mut context = context;
        let mut continuation = context.continuation.take();

        Box::pin(stream! {
            for index in 0..calls.len() {
                if context.stop_requested() {
                    break;
                }
                if !calls[index].is_pending() {
                    continue;
                }

                let earlier = calls[..index]
                    .iter()
                    .find(|earlier| !earlier.is_pending() && earlier.same_invocation(&calls[index]))
                    .cloned();
                if let Some(earlier) = earlier {
                    let call = &mut calls[index];
                    call.result = earlier.result;
                    call.need_recall = earlier.need_recall;
                    call.prompt = earlier.prompt;
                    self.hooks.on_duplicate_call(call, &context);
                    continue;
                }

                let call = calls[index].clone();
                let mut call_context = context.clone();
                call_context.tool_call_id = Some(call.id.clone());
                call_context.continuation = continuation.take();

                let Some(tool) = self.registry.get(&call.name) else {
                    let error = ToolError::not_found(format!("function '{}' not found", call.name))
                        .with_tool_call_id(call.id.clone());
                    self.hooks
                        .on_execution_failure(&call, &call_context, &error, Duration::ZERO);
                    let text = error.to_result_text();
                    calls[index].set_result(ChatResult::error(text.clone()));
                    calls[index].need_recall = true;
                    yield ToolEvent::Emit(ChatResult::error(text));
                    continue;
                };

                yield ToolEvent::Emit(ChatResult::FunctionStarted(call.clone()));
                self.hooks.on_execution_start(&call, &call_context);
                let started = Instant::now();
                let outcome = self.invoke(tool.as_ref(), &call, &call_context).await;
                let elapsed = started.elapsed();

                let output = match outcome {
                    Ok(output) => output,
                    Err(error) => {
                        let error = if error.tool_name.is_none() {
                            error.with_tool_name(call.name.clone())
                        } else {
                            error
                        };
                        self.hooks
                            .on_execution_failure(&call, &call_context, &error, elapsed);
                        let text = error.to_result_text();
                        calls[index].set_result(ChatResult::error(text.clone()));
                        calls[index].need_recall = true;
                        yield ToolEvent::Emit(ChatResult::error(text));
                        continue;
                    }
                };

                self.hooks
                    .on_execution_success(&call, &call_context, &output, elapsed);
                match output {
                    ToolOutput::Recall(text) => {
                        let slot = &mut calls[index];
                        slot.set_result(ChatResult::Answer(text));
                        slot.need_recall = true;
                        slot.prompt = tool.definition().prompt;
                    }
                    ToolOutput::Direct(text) => {
                        calls[index].set_result(ChatResult::answer(DONE_RESULT));
                        yield ToolEvent::Emit(ChatResult::Answer(text));
                    }
                    ToolOutput::Frontend => {
                        calls[index].set_result(ChatResult::answer(DONE_RESULT));
                        yield ToolEvent::Emit(ChatResult::FrontendFunction(call));
                    }
                    ToolOutput::Done => {
                        calls[index].set_result(ChatResult::answer(DONE_RESULT));
                    }
                    ToolOutput::Pending => break,
                }
            }

            yield ToolEvent::Resolved(calls);
        })
    }

    fn definitions(&self, names: &[String]) -> Vec<ToolDefinition> {
        self.registry.definitions_for(names)
    }

    fn catalog(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use futures_util::StreamExt;
    use pprovider::ContentItem;

    use super::*;
    use crate::StopSignal;

    fn definition(name: &str) -> ToolDefinition {
        ToolDefinition::new(name, format!("{name} tool"), r#"{"type":"object"}"#)
    }

    async fn run(
        executor: &DefaultToolExecutor,
        calls: Vec<FunctionCall>,
        context: ToolExecutionContext,
    ) -> (Vec<ChatResult>, Vec<FunctionCall>) {
        let mut emitted = Vec::new();
        let mut resolved = Vec::new();
        let mut events = executor.resolve(calls, context);
        while let Some(event) = events.next().await {
            match event {
                ToolEvent::Emit(result) => emitted.push(result),
                ToolEvent::Resolved(calls) => resolved = calls,
            }
        }
        (emitted, resolved)
    }

    #[tokio::test]
    async fn recall_output_sets_result_prompt_and_need_recall() {
        let mut registry = ToolRegistry::new();
        registry.register_sync_fn(
            definition("get_weather").with_prompt("Answer in one sentence."),
            |_args, _ctx| Ok("sunny, 21C".to_string()),
        );
        let executor = DefaultToolExecutor::new(Arc::new(registry));

        let (emitted, resolved) = run(
            &executor,
            vec![FunctionCall::new("A", "get_weather", r#"{"city":"Paris"}"#)],
            ToolExecutionContext::new("session-1"),
        )
        .await;

        assert!(matches!(&emitted[..], [ChatResult::FunctionStarted(call)] if call.id == "A"));
        assert_eq!(resolved[0].result(), Some(&ChatResult::answer("sunny, 21C")));
        assert!(resolved[0].need_recall);
        assert_eq!(resolved[0].prompt.as_deref(), Some("Answer in one sentence."));
    }

    #[tokio::test]
    async fn resolved_calls_are_skipped_and_duplicates_reuse_results() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let mut registry = ToolRegistry::new();
        registry.register_sync_fn(definition("lookup"), move |args, _ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(format!("found {args}"))
        });
        let executor = DefaultToolExecutor::new(Arc::new(registry));

        let calls = vec![
            FunctionCall::new("A", "lookup", "1").with_result(ChatResult::answer("cached")),
            FunctionCall::new("B", "lookup", "2"),
            FunctionCall::new("C", "lookup", "2"),
        ];
        let (_, resolved) = run(&executor, calls, ToolExecutionContext::new("s")).await;

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(resolved[0].result(), Some(&ChatResult::answer("cached")));
        assert_eq!(resolved[1].result(), Some(&ChatResult::answer("found 2")));
        assert_eq!(resolved[2].result(), resolved[1].result());
        assert!(resolved[2].need_recall);
    }

    #[tokio::test]
    async fn missing_and_failing_tools_record_failure_text() {
        let mut registry = ToolRegistry::new();
        registry.register_sync_fn(definition("broken"), |_args, _ctx| {
            Err(ToolError::execution("tool exploded"))
        });
        let executor = DefaultToolExecutor::new(Arc::new(registry));

        let (emitted, resolved) = run(
            &executor,
            vec![
                FunctionCall::new("A", "missing", "{}"),
                FunctionCall::new("B", "broken", "{}"),
            ],
            ToolExecutionContext::new("s"),
        )
        .await;

        assert_eq!(
            resolved[0].result(),
            Some(&ChatResult::error("[FUNC FAILED] function 'missing' not found"))
        );
        assert_eq!(
            resolved[1].result(),
            Some(&ChatResult::error("[FUNC FAILED] broken: tool exploded"))
        );
        assert!(resolved.iter().all(|call| call.need_recall));
        assert!(emitted.contains(&ChatResult::error("[FUNC FAILED] broken: tool exploded")));
    }

    #[tokio::test]
    async fn direct_and_frontend_outputs_are_forwarded_without_recall() {
        let mut registry = ToolRegistry::new();
        registry.register_output_fn(definition("draw"), |_args, _ctx| async {
            Ok(ToolOutput::direct("here is your picture"))
        });
        registry.register_frontend(definition("open_map"));
        let executor = DefaultToolExecutor::new(Arc::new(registry));

        let (emitted, resolved) = run(
            &executor,
            vec![
                FunctionCall::new("A", "draw", "{}"),
                FunctionCall::new("B", "open_map", "{}"),
            ],
            ToolExecutionContext::new("s"),
        )
        .await;

        assert!(emitted.contains(&ChatResult::answer("here is your picture")));
        assert!(emitted
            .iter()
            .any(|event| matches!(event, ChatResult::FrontendFunction(call) if call.id == "B")));
        assert!(resolved.iter().all(|call| !call.need_recall));
        assert!(resolved
            .iter()
            .all(|call| call.result() == Some(&ChatResult::answer(DONE_RESULT))));
    }

    #[tokio::test]
    async fn pending_tool_halts_batch_and_receives_continuation_once() {
        let seen: Arc<Mutex<Vec<Option<Vec<ContentItem>>>>> = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let mut registry = ToolRegistry::new();
        registry.register_output_fn(definition("confirm"), move |_args, ctx| {
            let recorder = Arc::clone(&recorder);
            async move {
                let answered = ctx.continuation.is_some();
                recorder
                    .lock()
                    .expect("recorder lock")
                    .push(ctx.continuation);
                Ok(if answered {
                    ToolOutput::recall("confirmed")
                } else {
                    ToolOutput::Pending
                })
            }
        });
        let executor = DefaultToolExecutor::new(Arc::new(registry));

        let (_, first) = run(
            &executor,
            vec![
                FunctionCall::new("A", "confirm", "1"),
                FunctionCall::new("B", "confirm", "2"),
            ],
            ToolExecutionContext::new("s"),
        )
        .await;
        assert!(first.iter().all(FunctionCall::is_pending));

        let (_, second) = run(
            &executor,
            first,
            ToolExecutionContext::new("s").with_continuation(vec![ContentItem::text("yes")]),
        )
        .await;
        assert_eq!(second[0].result(), Some(&ChatResult::answer("confirmed")));
        assert!(second[1].is_pending());

        let seen = seen.lock().expect("recorder lock");
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[1], Some(vec![ContentItem::text("yes")]));
        assert_eq!(seen[2], None);
    }

    struct Stopped(AtomicBool);

    impl StopSignal for Stopped {
        fn is_stop_requested(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn stop_signal_prevents_further_calls() {
        let mut registry = ToolRegistry::new();
        registry.register_sync_fn(definition("lookup"), |_args, _ctx| Ok("x".to_string()));
        let executor = DefaultToolExecutor::new(Arc::new(registry));
        let context = ToolExecutionContext::new("s")
            .with_stop_signal(Arc::new(Stopped(AtomicBool::new(true))));

        let (emitted, resolved) = run(
            &executor,
            vec![FunctionCall::new("A", "lookup", "{}")],
            context,
        )
        .await;

        assert!(emitted.is_empty());
        assert!(resolved[0].is_pending());
    }

    #[tokio::test]
    async fn slow_tools_time_out() {
        let mut registry = ToolRegistry::new();
        registry.register_fn(definition("slow"), |_args, _ctx| async {
            Delay::new(Duration::from_secs(5)).await;
            Ok("late".to_string())
        });
        let executor =
            DefaultToolExecutor::new(Arc::new(registry)).with_timeout(Duration::from_millis(10));

        let (_, resolved) = run(
            &executor,
            vec![FunctionCall::new("A", "slow", "{}")],
            ToolExecutionContext::new("s"),
        )
        .await;

        let Some(ChatResult::Error(text)) = resolved[0].result() else {
            panic!("expected a timeout failure, got {:?}", resolved[0].result);
        };
        assert!(text.starts_with("[FUNC FAILED] slow"));
    }
}
