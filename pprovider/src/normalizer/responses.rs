//! Responses-API style `event:` / `data:` blocks.
//!
//! Function calls in this dialect carry two ids: the output item id used by
//! argument events and the call id the model expects back with the result.

use serde_json::Value;

use crate::{ChatResult, FunctionCall};

use super::LineNormalizer;

#[derive(Debug, Default)]
pub struct ResponsesNormalizer {
    event: Option<String>,
    data: String,
    calls: Vec<(FunctionCall, bool)>,
    done: bool,
}

impl ResponsesNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn dispatch(&mut self) -> Vec<ChatResult> {
        let data = std::mem::take(&mut self.data);
        let event = self.event.take();
        let mut events = Vec::new();

        if data.trim().is_empty() {
            return events;
        }
        if data.trim() == "[DONE]" {
            self.done = true;
            return events;
        }

        let payload = match serde_json::from_str::<Value>(&data) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::debug!(error = %error, "skipping malformed responses event");
                return events;
            }
        };

        let kind = event
            .or_else(|| payload.get("type").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_default();

        match kind.as_str() {
            "response.output_text.delta" => {
                if let Some(delta) = str_field(&payload, "delta").filter(|delta| !delta.is_empty()) {
                    events.push(ChatResult::answer(delta));
                }
            }
            "response.reasoning_summary_text.delta" | "response.reasoning_text.delta" => {
                if let Some(delta) = str_field(&payload, "delta").filter(|delta| !delta.is_empty()) {
                    events.push(ChatResult::reasoning(delta));
                }
            }
            "response.output_item.added" => self.register_item(&payload),
            "response.function_call_arguments.delta" => {
                if let (Some(item_id), Some(delta)) =
                    (str_field(&payload, "item_id"), str_field(&payload, "delta"))
                    && let Some((call, _)) = self.call_mut(item_id)
                {
                    call.arguments.push_str(delta);
                }
            }
            "response.function_call_arguments.done" => {
                if let Some(item_id) = str_field(&payload, "item_id") {
                    let arguments = str_field(&payload, "arguments").map(str::to_string);
                    if let Some((call, done)) = self.call_mut(item_id) {
                        if let Some(arguments) = arguments {
                            call.arguments = arguments;
                        }
                        *done = true;
                    }
                }
            }
            "error" => {
                let message = str_field(&payload, "message")
                    .or_else(|| payload.get("error").and_then(|error| str_field(error, "message")))
                    .unwrap_or("unknown vendor error");
                events.push(ChatResult::error(message));
            }
            "response.completed" | "response.failed" => {
                if kind == "response.failed" {
                    let message = payload
                        .pointer("/response/error/message")
                        .and_then(Value::as_str)
                        .unwrap_or("response failed");
                    events.push(ChatResult::error(message));
                }
                self.done = true;
            }
            _ => {}
        }

        events
    }

    fn register_item(&mut self, payload: &Value) {
        let Some(item) = payload.get("item") else {
            return;
        };
        if str_field(item, "type") != Some("function_call") {
            return;
        }

        let item_id = str_field(item, "id").unwrap_or_default();
        let call_id = str_field(item, "call_id").unwrap_or(item_id);
        let name = str_field(item, "name").unwrap_or_default();
        let arguments = str_field(item, "arguments").unwrap_or_default();

        self.calls.push((
            FunctionCall::new(call_id, name, arguments).with_item_id(item_id),
            false,
        ));
    }

    fn call_mut(&mut self, item_id: &str) -> Option<(&mut FunctionCall, &mut bool)> {
        self.calls
            .iter_mut()
            .find(|(call, _)| call.item_id.as_deref() == Some(item_id))
            .map(|(call, done)| (call, done))
    }
}

fn str_field<'v>(value: &'v Value, key: &str) -> Option<&'v str> {
    value.get(key).and_then(Value::as_str)
}

impl LineNormalizer for ResponsesNormalizer {
    fn push_line(&mut self, line: &str) -> Vec<ChatResult> {
        if line.trim().is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return Vec::new();
        }

        if let Some(event) = line.strip_prefix("event:") {
            let mut events = Vec::new();
            if !self.data.is_empty() {
                events = self.dispatch();
            }
            self.event = Some(event.trim().to_string());
            return events;
        }

        if let Some(data) = line.strip_prefix("data:") {
            if !self.data.is_empty() {
                self.data.push('\n');
            }
            self.data.push_str(data.trim_start());
        }

        Vec::new()
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn finish(&mut self) -> Vec<ChatResult> {
        let mut events = if self.data.is_empty() {
            Vec::new()
        } else {
            self.dispatch()
        };

        let calls: Vec<FunctionCall> = std::mem::take(&mut self.calls)
            .into_iter()
            .filter_map(|(call, done)| done.then_some(call))
            .collect();
        if !calls.is_empty() {
            events.push(ChatResult::FunctionCalls(calls));
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(lines: &[&str]) -> Vec<ChatResult> {
        let mut normalizer = ResponsesNormalizer::new();
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
    fn text_deltas_and_function_calls_use_both_ids() {
        let events = run(&[
            "event: response.output_text.delta",
            r#"data: {"delta":"Checking"}"#,
            "",
            "event: response.output_item.added",
            r#"data: {"item":{"type":"function_call","id":"fc_1","call_id":"call_9","name":"get_weather"}}"#,
            "",
            "event: response.function_call_arguments.delta",
            r#"data: {"item_id":"fc_1","delta":"{\"city\":"}"#,
            "",
            "event: response.function_call_arguments.done",
            r#"data: {"item_id":"fc_1","arguments":"{\"city\":\"Paris\"}"}"#,
            "",
            "event: response.completed",
            r#"data: {"response":{}}"#,
            "",
        ]);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], ChatResult::answer("Checking"));
        let ChatResult::FunctionCalls(calls) = &events[1] else {
            panic!("expected a function call batch, got {events:?}");
        };
        assert_eq!(calls[0].id, "call_9");
        assert_eq!(calls[0].item_id.as_deref(), Some("fc_1"));
        assert_eq!(calls[0].arguments, "{\"city\":\"Paris\"}");
    }

    #[test]
    fn error_event_surfaces_message() {
        let events = run(&[
            "event: error",
            r#"data: {"message":"quota exceeded"}"#,
            "",
        ]);

        assert_eq!(events, vec![ChatResult::error("quota exceeded")]);
    }

    #[test]
    fn typed_data_without_event_line_is_dispatched() {
        let events = run(&[
            r#"data: {"type":"response.output_text.delta","delta":"hi"}"#,
            "",
        ]);

        assert_eq!(events, vec![ChatResult::answer("hi")]);
    }

    #[test]
    fn unfinished_calls_are_not_emitted() {
        let events = run(&[
            "event: response.output_item.added",
            r#"data: {"item":{"type":"function_call","id":"fc_1","call_id":"c1","name":"f"}}"#,
            "",
        ]);

        assert!(events.is_empty());
    }
}
