//! Runtime wiring helpers that assemble a chat service from its parts.

use std::sync::Arc;

use crate::{
    AdapterRegistry, ChatError, ChatPolicy, ChatRuntimeHooks, ChatService, DefaultToolExecutor,
    InMemoryMemoryBackend, MemoryBackend, MemoryBackendConfig, MemoryStore, SafeChatHooks,
    SafeToolHooks, SessionLockRegistry, ToolRegistry, ToolRuntimeHooks,
    TracingObservabilityHooks, create_memory_backend,
};

#[derive(Clone)]
pub struct RuntimeBundle {
    pub memory: Arc<dyn MemoryBackend>,
    pub chat: ChatService,
    pub tools: Arc<ToolRegistry>,
}

/// Optional parts of a runtime. Anything left unset falls back to the
/// in-memory default.
#[derive(Default)]
pub struct RuntimeOptions {
    pub memory: Option<Arc<dyn MemoryBackend>>,
    pub tools: Option<ToolRegistry>,
    pub policy: Option<ChatPolicy>,
    pub lock_registry: Option<Arc<SessionLockRegistry>>,
    /// Installs panic-safe tracing hooks on chat phases and tool execution.
    pub traced: bool,
}

impl RuntimeOptions {
    pub fn with_memory(mut self, memory: Arc<dyn MemoryBackend>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_policy(mut self, policy: ChatPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_lock_registry(mut self, lock_registry: Arc<SessionLockRegistry>) -> Self {
        self.lock_registry = Some(lock_registry);
        self
    }

    pub fn traced(mut self) -> Self {
        self.traced = true;
        self
    }
}

pub fn in_memory_backend() -> Arc<dyn MemoryBackend> {
    Arc::new(InMemoryMemoryBackend::new())
}

pub fn chat_service(adapters: AdapterRegistry) -> Result<ChatService, ChatError> {
    ChatService::builder(adapters).build()
}

pub fn chat_service_with_memory(
    adapters: AdapterRegistry,
    memory: Arc<dyn MemoryBackend>,
) -> Result<ChatService, ChatError> {
    let store = Arc::new(MemoryStore::new(memory));
    ChatService::builder(adapters)
        .context_store(store.clone())
        .log_store(store)
        .build()
}

pub fn build_runtime(adapters: AdapterRegistry) -> Result<RuntimeBundle, ChatError> {
    build_runtime_with(adapters, RuntimeOptions::default())
}

pub fn build_runtime_with_memory(
    adapters: AdapterRegistry,
    config: MemoryBackendConfig,
) -> Result<RuntimeBundle, ChatError> {
    let memory = create_memory_backend(config)?;
    build_runtime_with(adapters, RuntimeOptions::default().with_memory(memory))
}

pub fn build_runtime_with_tooling(
    adapters: AdapterRegistry,
    tools: ToolRegistry,
) -> Result<RuntimeBundle, ChatError> {
    build_runtime_with(adapters, RuntimeOptions::default().with_tools(tools))
}

pub fn build_runtime_with(
    adapters: AdapterRegistry,
    options: RuntimeOptions,
) -> Result<RuntimeBundle, ChatError> {
    let memory = options.memory.unwrap_or_else(in_memory_backend);
    let tools = Arc::new(options.tools.unwrap_or_default());
    let store = Arc::new(MemoryStore::new(Arc::clone(&memory)));

    let mut chat_builder = ChatService::builder(adapters)
        .context_store(store.clone())
        .log_store(store);

    if !tools.is_empty() {
        let mut executor = DefaultToolExecutor::new(Arc::clone(&tools));
        if options.traced {
            let hooks: Arc<dyn ToolRuntimeHooks> =
                Arc::new(SafeToolHooks::new(TracingObservabilityHooks));
            executor = executor.with_hooks(hooks);
        }
        chat_builder = chat_builder.tool_executor(Arc::new(executor));
    }

    if options.traced {
        let hooks: Arc<dyn ChatRuntimeHooks> =
            Arc::new(SafeChatHooks::new(TracingObservabilityHooks));
        chat_builder = chat_builder.hooks(hooks);
    }
    if let Some(policy) = options.policy {
        chat_builder = chat_builder.policy(policy);
    }
    if let Some(lock_registry) = options.lock_registry {
        chat_builder = chat_builder.lock_registry(lock_registry);
    }

    Ok(RuntimeBundle {
        memory,
        chat: chat_builder.build()?,
        tools,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use futures_util::StreamExt;

    use crate::{
        AdapterRegistry, ChatAdapter, ChatInput, ChatPolicy, ChatRequest, ChatResult,
        ConversationKey, ContentItem, FunctionCall, MemoryBackendConfig, ModelCapabilities,
        ProviderFuture, ResultStream, SessionLockRegistry, ToolDefinition, ToolRegistry,
        VecResultStream,
    };

    use super::{RuntimeOptions, build_runtime, build_runtime_with, build_runtime_with_memory};

    /// Answers with a weather lookup first, then with whatever the tool said.
    #[derive(Default)]
    struct FakeAdapter {
        inputs: Mutex<Vec<ChatInput>>,
    }

    impl FakeAdapter {
        fn round(&self, input: &ChatInput) -> Vec<ChatResult> {
            self.inputs.lock().expect("inputs lock").push(input.clone());
            if input.recursion_level == 0 && !input.functions.is_empty() {
                vec![ChatResult::FunctionCalls(vec![FunctionCall::new(
                    "call_1",
                    "get_weather",
                    r#"{"city":"Paris"}"#,
                )])]
            } else {
                vec![ChatResult::answer("done")]
            }
        }
    }

    impl ChatAdapter for FakeAdapter {
        fn stream_chat<'a>(&'a self, input: &'a ChatInput) -> ResultStream<'a> {
            Box::pin(VecResultStream::new(self.round(input)))
        }

        fn query_chat<'a>(&'a self, input: &'a ChatInput) -> ProviderFuture<'a, ChatResult> {
            let round = self.round(input);
            Box::pin(async move {
                round
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| ChatResult::error("no answer"))
            })
        }
    }

    fn adapters(adapter: Arc<FakeAdapter>) -> AdapterRegistry {
        let mut adapters = AdapterRegistry::new();
        adapters.register_shared(
            "gpt-4o-mini",
            ModelCapabilities::text_only().with_functions(),
            adapter,
        );
        adapters
    }

    fn weather_tools() -> ToolRegistry {
        let mut tools = ToolRegistry::new();
        tools.register_sync_fn(
            ToolDefinition::new(
                "get_weather",
                "Current weather for a city",
                r#"{"type":"object","properties":{"city":{"type":"string"}}}"#,
            )
            .with_trigger_words(["weather"]),
            |_args, _ctx| Ok("22C sunny".to_string()),
        );
        tools
    }

    fn request(text: &str) -> ChatRequest {
        ChatRequest::new(ConversationKey::new("user-1", "chat"), "gpt-4o-mini")
            .with_question(ContentItem::text(text))
    }

    #[tokio::test]
    async fn build_runtime_wires_chat_to_memory_backend() {
        let adapter = Arc::new(FakeAdapter::default());
        let runtime = build_runtime(adapters(adapter)).expect("runtime should build");

        let result = runtime.chat.query(request("hello")).await;
        assert_eq!(result, ChatResult::answer("done"));

        let key = ConversationKey::new("user-1", "chat");
        let contexts = runtime
            .memory
            .load_context(&key)
            .await
            .expect("context should load")
            .expect("context should exist");
        let logs = runtime
            .memory
            .load_logs(&contexts.session_id)
            .await
            .expect("logs should load");
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].entry.result, "done");
    }

    #[tokio::test]
    async fn traced_runtime_runs_selected_tools() {
        let adapter = Arc::new(FakeAdapter::default());
        let runtime = build_runtime_with(
            adapters(Arc::clone(&adapter)),
            RuntimeOptions::default().with_tools(weather_tools()).traced(),
        )
        .expect("runtime should build");

        let events: Vec<ChatResult> = runtime
            .chat
            .process_chat(request("What's the weather in Paris?"))
            .collect()
            .await;

        assert!(events.contains(&ChatResult::answer("done")));
        assert!(
            events
                .iter()
                .any(|event| matches!(event, ChatResult::FunctionStarted(call) if call.name == "get_weather"))
        );

        let inputs = adapter.inputs.lock().expect("inputs lock").clone();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].functions, vec!["get_weather".to_string()]);
        assert_eq!(runtime.tools.len(), 1);
    }

    #[test]
    fn build_runtime_with_forwards_policy_and_gate() {
        let gate = Arc::new(SessionLockRegistry::new());
        let runtime = build_runtime_with(
            adapters(Arc::new(FakeAdapter::default())),
            RuntimeOptions::default()
                .with_policy(ChatPolicy::default().with_max_recursion_depth(2))
                .with_lock_registry(Arc::clone(&gate)),
        )
        .expect("runtime should build");

        assert_eq!(runtime.chat.policy().max_recursion_depth, 2);
        assert!(Arc::ptr_eq(&runtime.chat.lock_registry(), &gate));
    }

    #[test]
    fn invalid_policy_is_rejected() {
        let result = build_runtime_with(
            AdapterRegistry::new(),
            RuntimeOptions::default().with_policy(ChatPolicy::default().with_skip_keyword("")),
        );
        assert!(result.is_err());
    }

    #[test]
    fn build_runtime_with_memory_accepts_backend_config() {
        let runtime = build_runtime_with_memory(AdapterRegistry::new(), MemoryBackendConfig::InMemory)
            .expect("runtime should build");
        assert!(runtime.tools.is_empty());
    }
}
