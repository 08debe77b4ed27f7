//! Result and line stream contracts plus in-memory stream utilities.
//!
//! ```rust
//! use pprovider::{ChatResult, ResultStream, VecResultStream};
//!
//! let stream = VecResultStream::new(vec![ChatResult::answer("hello")]);
//! let _boxed: ResultStream<'static> = Box::pin(stream);
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::{ChatResult, ProviderError};

/// Ordered canonical events produced by one adapter call or one orchestrated
/// request.
///
/// Failures travel in-band as [`ChatResult::Error`]; once the stream yields
/// `None` it must not yield additional items.
pub type ResultStream<'a> = Pin<Box<dyn Stream<Item = ChatResult> + Send + 'a>>;

/// Raw response lines read from a vendor connection, terminators stripped.
pub type LineStream<'a> = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send + 'a>>;

#[derive(Debug)]
pub struct VecResultStream {
    events: VecDeque<ChatResult>,
}

impl VecResultStream {
    pub fn new(events: Vec<ChatResult>) -> Self {
        Self {
            events: events.into(),
        }
    }
}

impl Stream for VecResultStream {
    type Item = ChatResult;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<ChatResult>> {
        Poll::Ready(self.events.pop_front())
    }
}

#[derive(Debug)]
pub struct VecLineStream {
    lines: VecDeque<Result<String, ProviderError>>,
}

impl VecLineStream {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(|line| Ok(line.into())).collect(),
        }
    }

    /// Appends a read failure after the buffered lines.
    pub fn with_failure(mut self, error: ProviderError) -> Self {
        self.lines.push_back(Err(error));
        self
    }
}

impl Stream for VecLineStream {
    type Item = Result<String, ProviderError>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<String, ProviderError>>> {
        Poll::Ready(self.lines.pop_front())
    }
}
