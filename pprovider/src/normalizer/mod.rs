//! Vendor stream normalization into canonical [`ChatResult`] events.
//!
//! A [`LineNormalizer`] is a synchronous state machine fed one response line
//! at a time; [`normalize_lines`] drives one over an async [`LineStream`].
//! Events leave in receipt order except for tool calls, which are emitted as
//! a single batch when the stream ends.
//!
//! ```rust
//! use futures_util::StreamExt;
//! use pprovider::{ChatResult, StreamDialect, VecLineStream, normalize_lines};
//!
//! # block_on_ready(async {
//! let lines = VecLineStream::new([
//!     r#"data: {"choices":[{"delta":{"content":"<think>ab"}}]}"#,
//!     r#"data: {"choices":[{"delta":{"content":"cd</think>ef"}}]}"#,
//!     "data: [DONE]",
//! ]);
//!
//! let events: Vec<ChatResult> =
//!     normalize_lines(200, Box::pin(lines), StreamDialect::ChatCompletions)
//!         .collect()
//!         .await;
//!
//! assert_eq!(
//!     events,
//!     vec![
//!         ChatResult::reasoning("ab"),
//!         ChatResult::reasoning("cd"),
//!         ChatResult::answer("ef"),
//!     ]
//! );
//! # });
//! # fn block_on_ready<F: std::future::Future>(future: F) -> F::Output {
//! #     futures_util::FutureExt::now_or_never(future).expect("in-memory stream is ready")
//! # }
//! ```

mod completions;
mod responses;
mod think;
mod tool_calls;

use async_stream::stream;
use futures_util::StreamExt;

use crate::{ChatResult, LineStream, ResultStream};

pub use completions::CompletionsNormalizer;
pub use responses::ResponsesNormalizer;
pub use think::ThinkTagSplitter;
pub use tool_calls::ToolCallAssembler;

/// Line-at-a-time protocol state machine.
pub trait LineNormalizer: Send {
    /// Consumes one line and returns the events it completes.
    fn push_line(&mut self, line: &str) -> Vec<ChatResult>;

    /// True once the vendor terminator has been seen.
    fn is_done(&self) -> bool;

    /// Flushes buffered state at end of stream.
    fn finish(&mut self) -> Vec<ChatResult>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamDialect {
    #[default]
    ChatCompletions,
    Responses,
}

impl StreamDialect {
    pub fn normalizer(self) -> Box<dyn LineNormalizer> {
        match self {
            Self::ChatCompletions => Box::new(CompletionsNormalizer::new()),
            Self::Responses => Box::new(ResponsesNormalizer::new()),
        }
    }
}

/// Converts a vendor line stream into canonical events.
///
/// A non-200 `status` short-circuits: the whole body is read and a single
/// `Error("<status> : <body>")` is emitted. A read failure mid-stream emits
/// one `Error` and ends the stream without flushing partial tool calls.
pub fn normalize_lines<'a>(
    status: u16,
    lines: LineStream<'a>,
    dialect: StreamDialect,
) -> ResultStream<'a> {
    let mut lines = lines;
    let mut normalizer = dialect.normalizer();

    Box::pin(stream! {
        if status != 200 {
            let mut body = Vec::new();
            while let Some(line) = lines.next().await {
                match line {
                    Ok(line) => body.push(line),
                    Err(error) => {
                        tracing::debug!(error = %error, "stopped reading error body");
                        break;
                    }
                }
            }
            yield ChatResult::error(format!("{status} : {}", body.join("\n")));
            return;
        }

        while let Some(line) = lines.next().await {
            let line = match line {
                Ok(line) => line,
                Err(error) => {
                    yield ChatResult::from(error);
                    return;
                }
            };

            for event in normalizer.push_line(&line) {
                yield event;
            }

            if normalizer.is_done() {
                break;
            }
        }

        for event in normalizer.finish() {
            yield event;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ProviderError, VecLineStream};

    async fn collect(status: u16, lines: VecLineStream, dialect: StreamDialect) -> Vec<ChatResult> {
        normalize_lines(status, Box::pin(lines), dialect)
            .collect()
            .await
    }

    #[tokio::test]
    async fn non_success_status_yields_single_error_with_body() {
        let lines = VecLineStream::new([r#"{"error":{"message":"bad key"}}"#, "trailer"]);
        let events = collect(401, lines, StreamDialect::ChatCompletions).await;

        assert_eq!(
            events,
            vec![ChatResult::error(
                "401 : {\"error\":{\"message\":\"bad key\"}}\ntrailer"
            )]
        );
    }

    #[tokio::test]
    async fn read_failure_ends_stream_with_error() {
        let lines = VecLineStream::new([r#"data: {"choices":[{"delta":{"content":"par"}}]}"#])
            .with_failure(ProviderError::transport("connection reset"));
        let events = collect(200, lines, StreamDialect::ChatCompletions).await;

        assert_eq!(
            events,
            vec![ChatResult::answer("par"), ChatResult::error("connection reset")]
        );
    }

    #[tokio::test]
    async fn tool_calls_flush_when_stream_ends_without_terminator() {
        let lines = VecLineStream::new([
            r#"data: {"choices":[{"delta":{"content":"calling"}}]}"#,
            r#"data: {"choices":[{"delta":{"tool_calls":[{"id":"A","function":{"name":"f","arguments":"{}"}}]}}]}"#,
        ]);
        let events = collect(200, lines, StreamDialect::ChatCompletions).await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], ChatResult::answer("calling"));
        assert!(matches!(&events[1], ChatResult::FunctionCalls(calls) if calls.len() == 1));
    }

    #[tokio::test]
    async fn responses_dialect_is_selected_by_caller() {
        let lines = VecLineStream::new([
            "event: response.output_text.delta",
            r#"data: {"delta":"hello"}"#,
            "",
        ]);
        let events = collect(200, lines, StreamDialect::Responses).await;

        assert_eq!(events, vec![ChatResult::answer("hello")]);
    }
}
