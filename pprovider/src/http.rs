//! reqwest glue turning a streaming HTTP response into normalized events.

use async_stream::try_stream;
use futures_util::StreamExt;
use reqwest::Response;

use crate::{LineStream, ProviderError, ResultStream, StreamDialect, normalize_lines};

/// Splits a response body into lines, buffering bytes so multi-byte
/// characters split across chunks survive.
pub fn response_lines<'a>(response: Response) -> LineStream<'a> {
    Box::pin(try_stream! {
        let mut chunks = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|err| {
                if err.is_timeout() {
                    ProviderError::timeout(err.to_string())
                } else {
                    ProviderError::transport(err.to_string())
                }
            })?;
            buffer.extend_from_slice(&chunk);

            while let Some(newline_index) = buffer.iter().position(|byte| *byte == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline_index).collect();
                yield decode_line(&line);
            }
        }

        if !buffer.is_empty() {
            yield decode_line(&buffer);
        }
    })
}

/// Normalizes a vendor streaming response, including non-success statuses.
pub fn normalize_response<'a>(response: Response, dialect: StreamDialect) -> ResultStream<'a> {
    let status = response.status().as_u16();
    normalize_lines(status, response_lines(response), dialect)
}

// Invalid UTF-8 is replaced rather than failing the stream; the normalizer
// then skips the line as malformed if it no longer parses.
fn decode_line(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    if let std::borrow::Cow::Owned(_) = &text {
        tracing::debug!(len = bytes.len(), "replaced invalid utf-8 in streamed line");
    }
    text.trim_end_matches(['\r', '\n']).to_string()
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;

    use super::decode_line;
    use crate::{ChatResult, StreamDialect, VecLineStream, normalize_lines};

    #[test]
    fn decode_line_strips_crlf_terminators() {
        assert_eq!(decode_line(b"data: x\r\n"), "data: x");
        assert_eq!(decode_line(&[0xff, b'\n']), "\u{fffd}");
    }

    #[tokio::test]
    async fn invalid_utf8_line_does_not_end_the_stream() {
        let lines = vec![
            decode_line(br#"data: {"choices":[{"delta":{"content":"Bon"}}]}"#),
            decode_line(&[b'd', b'a', b't', b'a', b':', b' ', 0xff, 0xfe, b'\n']),
            decode_line(b"data: {\"choices\":[{\"delta\":{\"content\":\"jour\"}}]}\n"),
            decode_line(b"data: [DONE]\n"),
        ];

        let events: Vec<ChatResult> = normalize_lines(
            200,
            Box::pin(VecLineStream::new(lines)),
            StreamDialect::ChatCompletions,
        )
        .collect()
        .await;

        assert_eq!(
            events,
            vec![ChatResult::answer("Bon"), ChatResult::answer("jour")]
        );
    }
}
