use std::sync::Mutex;

use futures_util::StreamExt;
use pcommon::ConversationKey;
use pprovider::{
    AdapterRegistry, ChatAdapter, ChatContexts, ChatInput, ChatResult, ModelCapabilities,
    ProviderFuture, ResultStream, StreamDialect, VecLineStream, normalize_lines,
};

/// Replays a canned vendor response through the normalizer and records the
/// inputs it was asked to serve.
struct CannedLineAdapter {
    status: u16,
    lines: Vec<&'static str>,
    dialect: StreamDialect,
    seen_models: Mutex<Vec<String>>,
}

impl CannedLineAdapter {
    fn new(status: u16, dialect: StreamDialect, lines: Vec<&'static str>) -> Self {
        Self {
            status,
            lines,
            dialect,
            seen_models: Mutex::new(Vec::new()),
        }
    }

    fn replay<'a>(&'a self, input: &ChatInput) -> ResultStream<'a> {
        self.seen_models
            .lock()
            .expect("models lock")
            .push(input.chat_model.clone());
        normalize_lines(
            self.status,
            Box::pin(VecLineStream::new(self.lines.clone())),
            self.dialect,
        )
    }
}

impl ChatAdapter for CannedLineAdapter {
    fn stream_chat<'a>(&'a self, input: &'a ChatInput) -> ResultStream<'a> {
        self.replay(input)
    }

    fn query_chat<'a>(&'a self, input: &'a ChatInput) -> ProviderFuture<'a, ChatResult> {
        let mut events = self.replay(input);
        Box::pin(async move {
            let mut answer = String::new();
            while let Some(event) = events.next().await {
                match event {
                    ChatResult::Answer(text) => answer.push_str(&text),
                    ChatResult::Reasoning(_) => {}
                    other => return other,
                }
            }
            ChatResult::Answer(answer)
        })
    }
}

fn input(model: &str) -> ChatInput {
    ChatInput::new(
        ConversationKey::new("user-1", "chat"),
        model,
        ChatContexts::new(),
    )
}

#[tokio::test]
async fn completions_stream_splits_reasoning_and_batches_tool_calls() {
    let adapter = CannedLineAdapter::new(
        200,
        StreamDialect::ChatCompletions,
        vec![
            r#"data: {"choices":[{"delta":{"content":"<think>need weather"}}]}"#,
            ": keep-alive",
            r#"data: {"choices":[{"delta":{"content":"</think>Checking."}}]}"#,
            "data: {not json",
            r#"data: {"choices":[{"delta":{"tool_calls":[{"id":"call_1","function":{"name":"get_weather","arguments":"{\"city\":"}}]}}]}"#,
            r#"data: {"choices":[{"delta":{"tool_calls":[{"function":{"arguments":"\"Paris\"}"}}]}}]}"#,
            "data: [DONE]",
            r#"data: {"choices":[{"delta":{"content":"after terminator"}}]}"#,
        ],
    );
    let request = input("gpt-4o-mini");

    let events: Vec<ChatResult> = adapter.stream_chat(&request).collect().await;

    assert_eq!(events.len(), 3);
    assert_eq!(events[0], ChatResult::reasoning("need weather"));
    assert_eq!(events[1], ChatResult::answer("Checking."));
    let ChatResult::FunctionCalls(calls) = &events[2] else {
        panic!("expected a function call batch, got {events:?}");
    };
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].id, "call_1");
    assert_eq!(calls[0].name, "get_weather");
    assert_eq!(calls[0].arguments, r#"{"city":"Paris"}"#);
    assert!(calls[0].is_pending());
}

#[tokio::test]
async fn registry_routes_models_to_their_adapter() {
    let mut registry = AdapterRegistry::new();
    registry.register(
        "gpt-4o-mini",
        ModelCapabilities::text_only().with_functions(),
        CannedLineAdapter::new(
            200,
            StreamDialect::Responses,
            vec![
                "event: response.output_text.delta",
                r#"data: {"delta":"Bonjour"}"#,
                "",
                "event: response.output_text.delta",
                r#"data: {"delta":" Paris"}"#,
                "",
            ],
        ),
    );

    let binding = registry
        .resolve("gpt-4o-mini")
        .expect("model should be registered");
    assert!(binding.capabilities.functions);
    assert!(!binding.capabilities.image);

    let answer = binding.adapter.query_chat(&input("gpt-4o-mini")).await;
    assert_eq!(answer, ChatResult::answer("Bonjour Paris"));
    assert!(registry.resolve("claude-3-haiku").is_err());
}

#[tokio::test]
async fn vendor_rejection_surfaces_status_and_body() {
    let adapter = CannedLineAdapter::new(
        429,
        StreamDialect::ChatCompletions,
        vec![r#"{"error":"rate limited"}"#],
    );

    let answer = adapter.query_chat(&input("gpt-4o-mini")).await;

    assert_eq!(answer, ChatResult::error(r#"429 : {"error":"rate limited"}"#));
    assert_eq!(
        adapter.seen_models.lock().expect("models lock").as_slice(),
        &["gpt-4o-mini".to_string()]
    );
}
