//! Inline `<think>` tag splitting for vendors without a reasoning channel.

use crate::ChatResult;

const OPEN_TAG: &str = "<think>";
const CLOSE_TAG: &str = "</think>";

/// Splits answer fragments into reasoning and answer events.
///
/// Reasoning mode starts when a fragment opens a tag without closing it and
/// ends at the fragment holding the closing tag. Once answer text has been
/// emitted, tags are treated as plain answer text.
///
/// ```rust
/// use pprovider::{ChatResult, ThinkTagSplitter};
///
/// let mut splitter = ThinkTagSplitter::new();
/// let mut events = splitter.push("<think>ab");
/// events.extend(splitter.push("cd</think>ef"));
///
/// assert_eq!(
///     events,
///     vec![
///         ChatResult::reasoning("ab"),
///         ChatResult::reasoning("cd"),
///         ChatResult::answer("ef"),
///     ]
/// );
/// ```
#[derive(Debug, Default, Clone)]
pub struct ThinkTagSplitter {
    reasoning: bool,
    answering: bool,
}

impl ThinkTagSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_reasoning(&self) -> bool {
        self.reasoning
    }

    pub fn push(&mut self, fragment: &str) -> Vec<ChatResult> {
        let mut events = Vec::new();
        if fragment.is_empty() {
            return events;
        }

        if self.reasoning {
            match fragment.split_once(CLOSE_TAG) {
                Some((thought, answer)) => self.close(thought, answer, &mut events),
                None => events.push(ChatResult::reasoning(fragment)),
            }
            return events;
        }

        if !self.answering
            && let Some((before, after)) = fragment.split_once(OPEN_TAG)
        {
            if !before.trim().is_empty() {
                events.push(ChatResult::answer(before));
            }
            self.reasoning = true;
            match after.split_once(CLOSE_TAG) {
                Some((thought, answer)) => self.close(thought, answer, &mut events),
                None if !after.is_empty() => events.push(ChatResult::reasoning(after)),
                None => {}
            }
            return events;
        }

        self.answering = true;
        events.push(ChatResult::answer(fragment));
        events
    }

    fn close(&mut self, thought: &str, answer: &str, events: &mut Vec<ChatResult>) {
        self.reasoning = false;
        if !thought.is_empty() {
            events.push(ChatResult::reasoning(thought));
        }

        let answer = answer.trim();
        if !answer.is_empty() {
            self.answering = true;
            events.push(ChatResult::answer(answer));
        }
    }
}
