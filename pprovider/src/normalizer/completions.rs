//! Chat-completions style `data:` frames.

use serde::Deserialize;

use crate::{ChatResult, FunctionCall};

use super::{LineNormalizer, ThinkTagSplitter, ToolCallAssembler};

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
struct ToolCallDelta {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<FunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct FunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

/// Normalizer for `choices[0].delta` payloads.
#[derive(Debug, Default)]
pub struct CompletionsNormalizer {
    splitter: ThinkTagSplitter,
    tool_calls: ToolCallAssembler,
    done: bool,
}

impl CompletionsNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply(&mut self, delta: ChunkDelta, events: &mut Vec<ChatResult>) {
        for reasoning in [delta.reasoning_content, delta.reasoning].into_iter().flatten() {
            if !reasoning.is_empty() {
                events.push(ChatResult::Reasoning(reasoning));
            }
        }

        if let Some(content) = delta.content {
            events.extend(self.splitter.push(&content));
        }

        for call in delta.tool_calls.into_iter().flatten() {
            let (name, arguments) = match call.function {
                Some(function) => (function.name, function.arguments),
                None => (None, None),
            };
            self.tool_calls
                .push(call.id.as_deref(), name.as_deref(), arguments.as_deref());
        }
    }
}

impl LineNormalizer for CompletionsNormalizer {
    fn push_line(&mut self, line: &str) -> Vec<ChatResult> {
        let mut events = Vec::new();
        let line = line.strip_prefix("data:").unwrap_or(line).trim_start();

        if line.trim().is_empty() || line.starts_with(':') {
            return events;
        }

        if line.trim_end() == "[DONE]" {
            self.done = true;
            return events;
        }

        let chunk = match serde_json::from_str::<CompletionChunk>(line) {
            Ok(chunk) => chunk,
            Err(error) => {
                tracing::debug!(error = %error, line, "skipping malformed stream line");
                return events;
            }
        };

        if let Some(delta) = chunk.choices.into_iter().next().and_then(|choice| choice.delta) {
            self.apply(delta, &mut events);
        }

        events
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn finish(&mut self) -> Vec<ChatResult> {
        let calls: Vec<FunctionCall> = std::mem::take(&mut self.tool_calls).finish();
        if calls.is_empty() {
            Vec::new()
        } else {
            vec![ChatResult::FunctionCalls(calls)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(lines: &[&str]) -> Vec<ChatResult> {
        let mut normalizer = CompletionsNormalizer::new();
        let mut events = Vec::new();
        for line in lines {
            events.extend(normalizer.push_line(line));
            if normalizer.is_done() {
                break;
            }
        }
        events.extend(normalizer.finish());
        events
    }

    #[test]
    fn content_deltas_become_answers() {
        let events = run(&[
            r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#,
            "",
            r#"data: {"choices":[{"delta":{"content":"lo"}}]}"#,
            "data: [DONE]",
            r#"data: {"choices":[{"delta":{"content":"ignored"}}]}"#,
        ]);

        assert_eq!(events, vec![ChatResult::answer("Hel"), ChatResult::answer("lo")]);
    }

    #[test]
    fn comments_and_malformed_lines_are_skipped() {
        let events = run(&[
            ": keep-alive",
            "data: {not json",
            r#"data: {"choices":[{"delta":{"content":"ok"}}]}"#,
        ]);

        assert_eq!(events, vec![ChatResult::answer("ok")]);
    }

    #[test]
    fn dedicated_reasoning_fields_bypass_tag_detection() {
        let events = run(&[
            r#"data: {"choices":[{"delta":{"reasoning_content":"<think>step"}}]}"#,
            r#"data: {"choices":[{"delta":{"reasoning":"more"}}]}"#,
            r#"data: {"choices":[{"delta":{"content":"answer"}}]}"#,
        ]);

        assert_eq!(
            events,
            vec![
                ChatResult::reasoning("<think>step"),
                ChatResult::reasoning("more"),
                ChatResult::answer("answer"),
            ]
        );
    }

    #[test]
    fn tool_call_fragments_are_emitted_as_one_batch_at_end() {
        let events = run(&[
            r#"data: {"choices":[{"delta":{"tool_calls":[{"id":"A","function":{"name":"f","arguments":"{\"x\":"}}]}}]}"#,
            r#"data: {"choices":[{"delta":{"tool_calls":[{"function":{"arguments":"1}"}}]}}]}"#,
            r#"data: {"choices":[{"delta":{"tool_calls":[{"id":"B","function":{"name":"g","arguments":"{}"}}]}}]}"#,
            "data: [DONE]",
        ]);

        assert_eq!(events.len(), 1);
        let ChatResult::FunctionCalls(calls) = &events[0] else {
            panic!("expected a function call batch, got {events:?}");
        };
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "A");
        assert_eq!(calls[0].name, "f");
        assert_eq!(calls[0].arguments, "{\"x\":1}");
        assert_eq!(calls[1].id, "B");
    }

    #[test]
    fn bare_json_lines_without_prefix_are_accepted() {
        let events = run(&[r#"{"choices":[{"delta":{"content":"raw"}}]}"#]);
        assert_eq!(events, vec![ChatResult::answer("raw")]);
    }
}
