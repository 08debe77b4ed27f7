//! Reassembly of tool calls streamed as id, name and argument fragments.

use crate::FunctionCall;

/// Buffers one call at a time. A fragment carrying a new, different id
/// completes the buffered call; fragments without an id extend it.
/// Arguments that arrive before any id are held back and prepended to the
/// next call.
///
/// ```rust
/// use pprovider::ToolCallAssembler;
///
/// let mut assembler = ToolCallAssembler::new();
/// assembler.push(Some("A"), Some("f"), Some("{\"x\":"));
/// assembler.push(None, None, Some("1}"));
/// assembler.push(Some("B"), Some("g"), Some("{}"));
///
/// let calls = assembler.finish();
/// assert_eq!(calls.len(), 2);
/// assert_eq!(calls[0].id, "A");
/// assert_eq!(calls[0].arguments, "{\"x\":1}");
/// assert_eq!(calls[1].name, "g");
/// ```
#[derive(Debug, Default)]
pub struct ToolCallAssembler {
    current: Option<FunctionCall>,
    completed: Vec<FunctionCall>,
    prefix: String,
}

impl ToolCallAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: Option<&str>, name: Option<&str>, arguments: Option<&str>) {
        let id = id.filter(|value| !value.is_empty());

        if let Some(id) = id {
            let starts_new = self
                .current
                .as_ref()
                .is_none_or(|current| current.id != id);
            if starts_new {
                self.flush();
                let prefix = std::mem::take(&mut self.prefix);
                self.current = Some(FunctionCall::new(id, "", prefix));
            }
        }

        let Some(current) = self.current.as_mut() else {
            if let Some(arguments) = arguments {
                self.prefix.push_str(arguments);
            }
            return;
        };

        if let Some(name) = name.filter(|value| !value.is_empty()) {
            current.name = name.to_string();
        }

        if let Some(arguments) = arguments {
            current.arguments.push_str(arguments);
        }
    }

    /// Adds an already complete call after flushing the buffered one.
    pub fn push_complete(&mut self, call: FunctionCall) {
        self.flush();
        self.completed.push(call);
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.completed.is_empty()
    }

    pub fn finish(mut self) -> Vec<FunctionCall> {
        self.flush();
        self.completed
    }

    // A prefix with no call to attach to is dropped.
    fn flush(&mut self) {
        if let Some(call) = self.current.take() {
            self.completed.push(call);
        }
    }
}
