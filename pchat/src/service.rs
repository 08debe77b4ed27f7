//! Chat orchestration over registered vendor adapters.
//!
//! [`ChatService::process_chat`] runs one request as a queue of phases:
//! `PreProcess`, `Dispatch`, `Persist`, `ToolCallLoop`. A tool batch that
//! needs the model to see its results pushes another round of the same four
//! phases at the next recursion level, up to
//! [`ChatPolicy::max_recursion_depth`]. Everything is reported in-band as
//! [`ChatResult`] events; the stream never fails.
//!
//! ```rust
//! use futures_util::StreamExt;
//! use pchat::{ChatRequest, ChatService};
//! use pcommon::ConversationKey;
//! use pprovider::{
//!     AdapterRegistry, ChatAdapter, ChatInput, ChatResult, ContentItem, ModelCapabilities,
//!     ProviderFuture, ResultStream, VecResultStream,
//! };
//!
//! struct Greeter;
//!
//! impl ChatAdapter for Greeter {
//!     fn stream_chat<'a>(&'a self, _input: &'a ChatInput) -> ResultStream<'a> {
//!         Box::pin(VecResultStream::new(vec![ChatResult::answer("hello")]))
//!     }
//!
//!     fn query_chat<'a>(&'a self, _input: &'a ChatInput) -> ProviderFuture<'a, ChatResult> {
//!         Box::pin(async { ChatResult::answer("hello") })
//!     }
//! }
//!
//! # block_on_ready(async {
//! let mut adapters = AdapterRegistry::new();
//! adapters.register("greeter", ModelCapabilities::text_only(), Greeter);
//! let service = ChatService::builder(adapters).build().expect("default policy is valid");
//!
//! let request = ChatRequest::new(ConversationKey::new("user-1", "chat"), "greeter")
//!     .with_question(ContentItem::text("hi"));
//! let events: Vec<ChatResult> = service.process_chat(request).collect().await;
//!
//! assert_eq!(events[0], ChatResult::answer("hello"));
//! assert_eq!(events[1], ChatResult::AnswerFinished);
//! assert!(matches!(events[2], ChatResult::LogSaved(_)));
//! # });
//! # fn block_on_ready<F: std::future::Future>(future: F) -> F::Output {
//! #     futures_util::FutureExt::now_or_never(future).expect("in-memory stores are ready")
//! # }
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use async_stream::stream;
use futures_core::Stream;
use futures_util::StreamExt;
use pprovider::{
    AdapterRegistry, ChatAdapter, ChatContext, ChatContexts, ChatInput, ChatResult, ContentItem,
    ContentKind, FunctionCall, LogReceipt, ModelCapabilities,
};
use ptooling::{ToolEvent, ToolExecutionContext, ToolExecutor, ToolSelector, TriggerWordToolSelector};

use crate::{
    ChatError, ChatLogEntry, ChatPhase, ChatPolicy, ChatRequest, ChatResultStream,
    ChatRuntimeHooks, ContextStore, GateDecision, InMemoryContextStore, InMemoryLogStore,
    InlineMediaPreprocessor, LogStore, MediaPreprocessor, NoopChatRuntimeHooks, RoundSummary,
    SessionGuard, SessionLockRegistry,
};

const ROUND_PHASES: [ChatPhase; 4] = [
    ChatPhase::PreProcess,
    ChatPhase::Dispatch,
    ChatPhase::Persist,
    ChatPhase::ToolCallLoop,
];

/// Question summary used in audit logs for non-text content.
const FILE_PLACEHOLDER: &str = "[file content not stored];";

type PreProcessStream<'a> = Pin<Box<dyn Stream<Item = Result<ChatResult, ChatError>> + Send + 'a>>;

#[derive(Clone)]
pub struct ChatService {
    adapters: AdapterRegistry,
    context_store: Arc<dyn ContextStore>,
    log_store: Arc<dyn LogStore>,
    tool_executor: Option<Arc<dyn ToolExecutor>>,
    tool_selector: Arc<dyn ToolSelector>,
    media: Arc<dyn MediaPreprocessor>,
    gate: Arc<SessionLockRegistry>,
    hooks: Arc<dyn ChatRuntimeHooks>,
    policy: ChatPolicy,
}

pub struct ChatServiceBuilder {
    adapters: AdapterRegistry,
    context_store: Arc<dyn ContextStore>,
    log_store: Arc<dyn LogStore>,
    tool_executor: Option<Arc<dyn ToolExecutor>>,
    tool_selector: Arc<dyn ToolSelector>,
    media: Arc<dyn MediaPreprocessor>,
    gate: Arc<SessionLockRegistry>,
    hooks: Arc<dyn ChatRuntimeHooks>,
    policy: ChatPolicy,
}

impl ChatServiceBuilder {
    pub fn new(adapters: AdapterRegistry) -> Self {
        Self {
            adapters,
            context_store: Arc::new(InMemoryContextStore::new()),
            log_store: Arc::new(InMemoryLogStore::new()),
            tool_executor: None,
            tool_selector: Arc::new(TriggerWordToolSelector),
            media: Arc::new(InlineMediaPreprocessor),
            gate: Arc::new(SessionLockRegistry::new()),
            hooks: Arc::new(NoopChatRuntimeHooks),
            policy: ChatPolicy::default(),
        }
    }

    pub fn context_store(mut self, context_store: Arc<dyn ContextStore>) -> Self {
        self.context_store = context_store;
        self
    }

    pub fn log_store(mut self, log_store: Arc<dyn LogStore>) -> Self {
        self.log_store = log_store;
        self
    }

    pub fn tool_executor(mut self, tool_executor: Arc<dyn ToolExecutor>) -> Self {
        self.tool_executor = Some(tool_executor);
        self
    }

    pub fn tool_selector(mut self, tool_selector: Arc<dyn ToolSelector>) -> Self {
        self.tool_selector = tool_selector;
        self
    }

    pub fn media_preprocessor(mut self, media: Arc<dyn MediaPreprocessor>) -> Self {
        self.media = media;
        self
    }

    /// Shares one gate between services that serve the same conversations.
    pub fn lock_registry(mut self, gate: Arc<SessionLockRegistry>) -> Self {
        self.gate = gate;
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn ChatRuntimeHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn policy(mut self, policy: ChatPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> Result<ChatService, ChatError> {
        self.policy.validate()?;

        Ok(ChatService {
            adapters: self.adapters,
            context_store: self.context_store,
            log_store: self.log_store,
            tool_executor: self.tool_executor,
            tool_selector: self.tool_selector,
            media: self.media,
            gate: self.gate,
            hooks: self.hooks,
            policy: self.policy,
        })
    }
}

/// Request-scoped state shared by every round of one request.
struct RunState {
    request: ChatRequest,
    adapter: Arc<dyn ChatAdapter>,
    capabilities: ModelCapabilities,
    input: ChatInput,
    first_text: String,
    questions: Vec<ContentItem>,
    context_ready: bool,
    _guard: Option<SessionGuard>,
}

/// Buffers of one model round.
#[derive(Debug, Default)]
struct Round {
    answer: String,
    reasoning: String,
    log_text: String,
    calls: Option<Vec<FunctionCall>>,
    multimedia: Option<Vec<ChatResult>>,
}

impl Round {
    /// Buffers what must be persisted and returns what goes to the caller now.
    fn absorb(&mut self, event: ChatResult) -> Option<ChatResult> {
        match event {
            ChatResult::Answer(text) => {
                self.log_text.push_str(&text);
                self.answer.push_str(&text);
                Some(ChatResult::Answer(text))
            }
            ChatResult::Reasoning(text) => {
                self.log_text.push_str(&text);
                self.reasoning.push_str(&text);
                Some(ChatResult::Reasoning(text))
            }
            ChatResult::FunctionCalls(calls) => {
                if let Ok(serialized) = serde_json::to_string(&calls) {
                    self.log_text.push_str(&serialized);
                }
                self.calls = Some(calls);
                None
            }
            ChatResult::MultiMediaResult(items) => {
                self.multimedia = Some(items);
                None
            }
            other => Some(other),
        }
    }

    fn summary(&self, recursion_level: u32, recalled: bool) -> RoundSummary {
        RoundSummary {
            recursion_level,
            answer_chars: self.answer.chars().count(),
            reasoning_chars: self.reasoning.chars().count(),
            function_calls: self.calls.as_ref().map_or(0, Vec::len),
            recalled,
        }
    }
}

impl ChatService {
    pub fn builder(adapters: AdapterRegistry) -> ChatServiceBuilder {
        ChatServiceBuilder::new(adapters)
    }

    pub fn lock_registry(&self) -> Arc<SessionLockRegistry> {
        Arc::clone(&self.gate)
    }

    pub fn policy(&self) -> &ChatPolicy {
        &self.policy
    }

    /// Streams one request through every round it needs.
    pub fn process_chat<'a>(&'a self, request: ChatRequest) -> ChatResultStream<'a> {
        Box::pin(stream! {
            let mut run = match self.begin(request, true) {
                Ok(run) => run,
                Err(rejection) => {
                    yield rejection;
                    return;
                }
            };
            let mut round = Round::default();
            let mut phases: VecDeque<ChatPhase> = ROUND_PHASES.into_iter().collect();

            while let Some(phase) = phases.pop_front() {
                let key = run.request.key.clone();
                let level = run.input.recursion_level;
                let started = Instant::now();
                let mut failure: Option<ChatError> = None;
                let mut terminal = false;
                self.hooks.on_phase_start(phase, &key, level);

                match phase {
                    ChatPhase::PreProcess => {
                        let mut events = self.preprocess(&mut run);
                        while let Some(event) = events.next().await {
                            match event {
                                Ok(event) => {
                                    if let ChatResult::Error(message) = &event {
                                        failure = Some(ChatError::tooling(message.clone()));
                                    }
                                    yield event;
                                }
                                Err(error) => {
                                    yield error.to_result();
                                    failure = Some(error);
                                }
                            }
                            if failure.is_some() {
                                terminal = true;
                                break;
                            }
                        }
                    }
                    ChatPhase::Dispatch => {
                        let mut events = run.adapter.stream_chat(&run.input);
                        while let Some(event) = events.next().await {
                            if let Some(event) = round.absorb(event) {
                                yield event;
                            }
                        }
                    }
                    ChatPhase::Persist => {
                        if let Err(error) = self.persist_round(&mut run, &round).await {
                            tracing::error!(key = %key, error = %error, "failed to persist chat round");
                            yield error.to_result();
                            failure = Some(error);
                            terminal = true;
                        } else {
                            yield ChatResult::AnswerFinished;
                            match self.write_log(&run, &round.log_text, ContentKind::Text).await {
                                Ok(Some(id)) => {
                                    yield ChatResult::LogSaved(LogReceipt {
                                        id,
                                        session_id: run.input.contexts.session_id.to_string(),
                                        content: round.log_text.clone(),
                                    });
                                }
                                Ok(None) => {}
                                Err(error) => {
                                    tracing::warn!(key = %key, error = %error, "failed to write chat log");
                                    yield error.to_result();
                                    failure = Some(error);
                                }
                            }
                        }
                    }
                    ChatPhase::ToolCallLoop => {
                        let mut recalled = false;
                        let call_count = round.calls.as_ref().map_or(0, Vec::len);

                        if let Some(calls) = round.calls.take()
                            && !self.gate.check_stop(&key)
                            && let Some(executor) = &self.tool_executor
                        {
                            let mut resolved = calls.clone();
                            let mut events = executor.resolve(calls, self.tool_context(&run));
                            while let Some(event) = events.next().await {
                                match event {
                                    ToolEvent::Emit(event) => {
                                        yield event;
                                    }
                                    ToolEvent::Resolved(calls) => resolved = calls,
                                }
                            }
                            drop(events);

                            if let Err(error) = self.replace_and_save(&mut run, &resolved).await {
                                yield error.to_result();
                                failure = Some(error);
                            } else if !run.request.ignore_persistence
                                && resolved.iter().any(|call| call.need_recall)
                            {
                                if level >= self.policy.max_recursion_depth {
                                    let error = ChatError::recursion_limit(
                                        self.policy.recursion_limit_message.clone(),
                                    );
                                    tracing::warn!(key = %key, level, "tool-call recursion limit reached");
                                    yield error.to_result();
                                    failure = Some(error);
                                } else {
                                    recalled = true;
                                    self.log_recall(&run, &resolved).await;
                                    run.input.recursion_level = level + 1;
                                    phases.extend(ROUND_PHASES);
                                }
                            }
                        }

                        let mut summary = round.summary(level, recalled);
                        summary.function_calls = call_count;
                        self.hooks.on_round_complete(&key, &summary);
                        round = Round::default();
                    }
                }

                let elapsed = started.elapsed();
                match failure {
                    Some(error) => {
                        let error = error.in_phase(phase);
                        self.hooks.on_phase_failure(phase, &key, level, &error, elapsed);
                    }
                    None => self.hooks.on_phase_success(phase, &key, level, elapsed),
                }
                if terminal {
                    break;
                }
            }
        })
    }

    /// Non-streaming variant. Returns the first preprocessing error, the
    /// frontend call(s) or direct tool answer of a final tool round, or the
    /// model's own result.
    pub async fn query(&self, request: ChatRequest) -> ChatResult {
        let mut run = match self.begin(request, false) {
            Ok(run) => run,
            Err(rejection) => return rejection,
        };

        loop {
            let key = run.request.key.clone();
            let level = run.input.recursion_level;

            {
                let mut events = self.preprocess(&mut run);
                while let Some(event) = events.next().await {
                    match event {
                        Ok(ChatResult::Error(message)) => return ChatResult::Error(message),
                        Ok(_) => {}
                        Err(error) => return error.to_result(),
                    }
                }
            }

            let started = Instant::now();
            self.hooks.on_phase_start(ChatPhase::Dispatch, &key, level);
            let result = run.adapter.query_chat(&run.input).await;
            self.hooks
                .on_phase_success(ChatPhase::Dispatch, &key, level, started.elapsed());

            let mut round = Round::default();
            round.absorb(result.clone());
            if let Err(error) = self.persist_round(&mut run, &round).await {
                return error.to_result();
            }
            let result_kind = match &result {
                ChatResult::FunctionCalls(_) => ContentKind::FunctionCall,
                ChatResult::MultiMediaResult(_) => ContentKind::MultiResult,
                _ => ContentKind::Text,
            };
            if let Err(error) = self.write_log(&run, &result.to_string(), result_kind).await {
                tracing::warn!(key = %key, error = %error, "failed to write chat log");
            }

            let calls = match result {
                ChatResult::FunctionCalls(calls) => calls,
                other => {
                    self.hooks.on_round_complete(&key, &round.summary(level, false));
                    return other;
                }
            };
            let Some(executor) = &self.tool_executor else {
                return ChatResult::FunctionCalls(calls);
            };
            if self.gate.check_stop(&key) {
                return ChatResult::FunctionCalls(calls);
            }

            let mut outcome = ChatResult::FunctionCalls(calls.clone());
            let mut frontends = Vec::new();
            let mut direct = String::new();
            let mut resolved = calls.clone();
            {
                let mut events = executor.resolve(calls, self.tool_context(&run));
                while let Some(event) = events.next().await {
                    match event {
                        ToolEvent::Emit(ChatResult::FrontendFunction(call)) => frontends.push(call),
                        ToolEvent::Emit(ChatResult::Answer(text)) => direct.push_str(&text),
                        ToolEvent::Emit(error @ ChatResult::Error(_)) => outcome = error,
                        ToolEvent::Emit(_) => {}
                        ToolEvent::Resolved(calls) => resolved = calls,
                    }
                }
            }

            if let Err(error) = self.replace_and_save(&mut run, &resolved).await {
                return error.to_result();
            }

            let recall = !run.request.ignore_persistence && resolved.iter().any(|call| call.need_recall);
            self.hooks.on_round_complete(&key, &round.summary(level, recall));
            if recall {
                if level >= self.policy.max_recursion_depth {
                    tracing::warn!(key = %key, level, "tool-call recursion limit reached");
                    return ChatResult::error(self.policy.recursion_limit_message.clone());
                }
                self.log_recall(&run, &resolved).await;
                run.input.recursion_level = level + 1;
                continue;
            }

            return match frontends.len() {
                0 if direct.is_empty() => outcome,
                0 => ChatResult::Answer(direct),
                1 => ChatResult::FrontendFunction(frontends.remove(0)),
                _ => ChatResult::FrontendFunctions(frontends),
            };
        }
    }

    /// Resolves the model and passes the gate. Streaming requests take the
    /// running flag; queries only check it.
    fn begin(&self, mut request: ChatRequest, acquire: bool) -> Result<RunState, ChatResult> {
        let binding = self
            .adapters
            .resolve(&request.chat_model)
            .map_err(ChatResult::from)?;
        let first_text = request.first_text().to_string();
        let command = self.policy.control_command(&first_text);
        let long_processing = binding.capabilities.long_processing;

        let decision = if acquire {
            self.gate
                .try_acquire(&request.key, request.recursion_level, long_processing, command)
        } else {
            match self
                .gate
                .check(&request.key, request.recursion_level, long_processing, command)
            {
                Ok(()) => GateDecision::Bypass,
                Err(rejection) => GateDecision::Rejected(rejection),
            }
        };
        let guard = match decision {
            GateDecision::Admitted(guard) => Some(guard),
            GateDecision::Bypass => None,
            GateDecision::Rejected(rejection) => {
                self.hooks.on_gate_rejected(&request.key, rejection);
                return Err(ChatResult::error(self.policy.rejection_message(rejection)));
            }
        };

        let mut input = ChatInput::new(
            request.key.clone(),
            request.chat_model.clone(),
            ChatContexts::new(),
        );
        input.functions = request.with_functions.clone();
        input.recursion_level = request.recursion_level;
        input.user_id = request.user_id.clone();
        input.metadata = request.metadata.clone();
        let questions = std::mem::take(&mut request.question_contents);

        Ok(RunState {
            request,
            adapter: binding.adapter,
            capabilities: binding.capabilities,
            input,
            first_text,
            questions,
            context_ready: false,
            _guard: guard,
        })
    }

    /// Prepares the model input for the next round. `Err` items and `Error`
    /// events both end the request.
    fn preprocess<'a>(&'a self, run: &'a mut RunState) -> PreProcessStream<'a> {
        Box::pin(stream! {
            run.adapter.prepare_input(&mut run.input);

            if !run.context_ready {
                run.context_ready = true;
                let mut from_store = false;
                let contexts = if let Some(existing) = run.request.existing_context.take() {
                    existing
                } else if run.request.ignore_persistence {
                    ChatContexts::new()
                } else {
                    match self.context_store.load(&run.request.key).await {
                        Ok(stored) => {
                            from_store = true;
                            stored.unwrap_or_default()
                        }
                        Err(error) => {
                            yield Err(error.in_phase(ChatPhase::PreProcess));
                            return;
                        }
                    }
                };
                run.input.contexts = contexts;
                if run.input.contexts.system_prompt.is_empty()
                    && let Some(prompt) = &self.policy.default_system_prompt
                {
                    run.input.contexts.system_prompt = prompt.clone();
                }

                let skip = self.policy.is_skip(&run.first_text);
                let resolvable = skip || self.tool_executor.is_some();
                if from_store
                    && resolvable
                    && let Some(mut calls) = run.input.contexts.pending_function_calls()
                {
                    if skip {
                        for call in calls.iter_mut().filter(|call| call.is_pending()) {
                            call.set_result(ChatResult::error(self.policy.skip_result_message.clone()));
                        }
                    } else if let Some(executor) = &self.tool_executor {
                        let continuation = std::mem::take(&mut run.questions);
                        let context = self.tool_context(run).with_continuation(continuation);
                        let mut events = executor.resolve(calls.clone(), context);
                        while let Some(event) = events.next().await {
                            match event {
                                ToolEvent::Emit(event) => {
                                    yield Ok(event);
                                }
                                ToolEvent::Resolved(resolved) => calls = resolved,
                            }
                        }
                    }

                    if let Err(error) = self.replace_and_save(run, &calls).await {
                        yield Err(error);
                        return;
                    }
                    run.questions.clear();
                }
            }

            if let Err(error) = self.media.normalize(&mut run.questions, run.capabilities).await {
                yield Err(error.in_phase(ChatPhase::PreProcess));
                return;
            }
            run.input.contexts.add_questions(std::mem::take(&mut run.questions));

            if let Some(executor) = &self.tool_executor {
                if run.capabilities.functions && run.input.functions.is_empty() {
                    run.input.functions = self
                        .tool_selector
                        .select(&run.input.contexts, &executor.catalog());
                }
                run.input.tools = executor.definitions(&run.input.functions);
            }

            if let Some(error) = self.capability_violation(&run.input.contexts, run.capabilities) {
                yield Err(error);
            }
        })
    }

    fn capability_violation(
        &self,
        contexts: &ChatContexts,
        capabilities: ModelCapabilities,
    ) -> Option<ChatError> {
        let message = if !capabilities.image && contexts.has_image() {
            &self.policy.image_unsupported_message
        } else if !capabilities.audio && contexts.has_audio() {
            &self.policy.audio_unsupported_message
        } else if !capabilities.file && contexts.has_file() {
            &self.policy.file_unsupported_message
        } else {
            return None;
        };
        Some(ChatError::capability(message.clone()).in_phase(ChatPhase::PreProcess))
    }

    fn tool_context(&self, run: &RunState) -> ToolExecutionContext {
        let mut context = ToolExecutionContext::new(run.input.contexts.session_id.clone())
            .with_key(run.request.key.clone())
            .with_stop_signal(self.gate.stop_signal(&run.request.key));
        context.user_id = run.request.user_id.clone();
        context.metadata = run.request.metadata.clone();
        context
    }

    /// Appends the round's output to the last turn and saves if anything changed.
    async fn persist_round(&self, run: &mut RunState, round: &Round) -> Result<(), ChatError> {
        let contexts = &mut run.input.contexts;
        let mut appended = false;

        if let Some(items) = &round.multimedia {
            contexts.add_answer(ContentItem::multi_result(items)?);
            appended = true;
        } else {
            if !round.reasoning.is_empty() {
                contexts.add_answer(ContentItem::reasoning(round.reasoning.clone()));
                appended = true;
            }
            if !round.answer.is_empty() {
                contexts.add_answer(ContentItem::text(round.answer.clone()));
                appended = true;
            }
        }
        if let Some(calls) = &round.calls {
            contexts.add_answer(ContentItem::function_calls(calls)?);
            appended = true;
        }

        if appended {
            self.save(run)
                .await
                .map_err(|error| error.in_phase(ChatPhase::Persist))?;
        }
        Ok(())
    }

    async fn replace_and_save(
        &self,
        run: &mut RunState,
        calls: &[FunctionCall],
    ) -> Result<(), ChatError> {
        run.input.contexts.replace_function_calls(calls)?;
        self.save(run)
            .await
            .map_err(|error| error.in_phase(ChatPhase::ToolCallLoop))
    }

    async fn save(&self, run: &RunState) -> Result<(), ChatError> {
        if run.request.ignore_persistence {
            return Ok(());
        }
        self.context_store
            .save(&run.request.key, &run.input.contexts)
            .await
    }

    async fn log_recall(&self, run: &RunState, calls: &[FunctionCall]) {
        let serialized = match serde_json::to_string(calls) {
            Ok(serialized) => serialized,
            Err(error) => {
                tracing::warn!(error = %error, "failed to serialize tool calls for the chat log");
                return;
            }
        };
        if let Err(error) = self
            .write_log(run, &serialized, ContentKind::FunctionCall)
            .await
        {
            tracing::warn!(key = %run.request.key, error = %error, "failed to write chat log");
        }
    }

    /// Writes one audit entry. Returns `None` when there is nothing to log.
    async fn write_log(
        &self,
        run: &RunState,
        text: &str,
        result_kind: ContentKind,
    ) -> Result<Option<i64>, ChatError> {
        let contexts = &run.input.contexts;
        if run.request.ignore_logging || text.is_empty() || contexts.is_empty() {
            return Ok(None);
        }

        let (question, question_kind) = question_summary(contexts.last());
        let entry = ChatLogEntry {
            user_id: run.request.user_id.clone(),
            chat_from: run.request.chat_from.clone(),
            chat_model: run.request.chat_model.clone(),
            question,
            result: text.to_string(),
            question_kind,
            result_kind,
            external_user_id: run.request.key.user_id().to_string(),
            session_id: contexts.session_id.clone(),
            is_first: contexts.contexts.len() == 1 && run.input.recursion_level == 0,
        };

        self.log_store.append(entry).await.map(Some)
    }
}

fn question_summary(turn: Option<&ChatContext>) -> (String, ContentKind) {
    let mut question = String::new();
    let mut kind = ContentKind::Text;

    for item in turn.into_iter().flat_map(|turn| turn.qc.iter()) {
        match item.kind {
            ContentKind::PromptTemplate => {
                question.push_str(item.file_name.as_deref().unwrap_or_default());
                kind = ContentKind::PromptTemplate;
            }
            ContentKind::Text => question.push_str(&item.content),
            other => {
                question.push_str(FILE_PLACEHOLDER);
                kind = other;
            }
        }
    }

    (question, kind)
}
