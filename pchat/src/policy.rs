//! Orchestration policy: recursion bound and the control vocabulary.
//!
//! ```rust
//! use pchat::{ChatPolicy, ControlCommand};
//!
//! let policy = ChatPolicy::default().with_max_recursion_depth(3);
//! assert!(policy.validate().is_ok());
//! assert_eq!(policy.control_command("停止"), Some(ControlCommand::Stop));
//! assert!(policy.is_skip("跳过"));
//! ```

use crate::{ChatError, ControlCommand, GateRejection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPolicy {
    /// Upper bound on automatic tool-call rounds after the user's request.
    pub max_recursion_depth: u32,
    pub stop_keywords: Vec<String>,
    pub clear_keyword: String,
    /// Input that abandons a tool waiting for more user input.
    pub skip_keyword: String,
    pub busy_message: String,
    pub stop_ack_message: String,
    pub clear_ack_message: String,
    pub skip_result_message: String,
    pub recursion_limit_message: String,
    pub image_unsupported_message: String,
    pub audio_unsupported_message: String,
    pub file_unsupported_message: String,
    /// System prompt given to conversations that start without one.
    pub default_system_prompt: Option<String>,
}

impl Default for ChatPolicy {
    fn default() -> Self {
        Self {
            max_recursion_depth: 8,
            stop_keywords: vec!["stop".to_string(), "停止".to_string()],
            clear_keyword: "CLEAR".to_string(),
            skip_keyword: "跳过".to_string(),
            busy_message: "The previous conversation is still running. Start a new one after it finishes."
                .to_string(),
            stop_ack_message: "The run will stop after its current step finishes.".to_string(),
            clear_ack_message: "The running flag was cleared. You can start a new conversation now."
                .to_string(),
            skip_result_message: "Error: the function could not complete and was skipped."
                .to_string(),
            recursion_limit_message: "Stopped automatic tool calls after reaching the round limit."
                .to_string(),
            image_unsupported_message: "The selected model does not support images.".to_string(),
            audio_unsupported_message: "The selected model does not support audio.".to_string(),
            file_unsupported_message: "The selected model does not support files.".to_string(),
            default_system_prompt: None,
        }
    }
}

impl ChatPolicy {
    pub fn with_max_recursion_depth(mut self, max_recursion_depth: u32) -> Self {
        self.max_recursion_depth = max_recursion_depth;
        self
    }

    pub fn with_skip_keyword(mut self, skip_keyword: impl Into<String>) -> Self {
        self.skip_keyword = skip_keyword.into();
        self
    }

    pub fn with_busy_message(mut self, busy_message: impl Into<String>) -> Self {
        self.busy_message = busy_message.into();
        self
    }

    pub fn with_default_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.default_system_prompt = Some(system_prompt.into());
        self
    }

    pub fn validate(&self) -> Result<(), ChatError> {
        if self.max_recursion_depth == 0 {
            return Err(ChatError::invalid_request(
                "max_recursion_depth must be at least 1",
            ));
        }
        if self.skip_keyword.trim().is_empty() || self.clear_keyword.trim().is_empty() {
            return Err(ChatError::invalid_request(
                "skip and clear keywords must not be blank",
            ));
        }
        if self.stop_keywords.iter().any(|word| word.trim().is_empty()) {
            return Err(ChatError::invalid_request("stop keywords must not be blank"));
        }
        Ok(())
    }

    /// Matches the literal first text of a request against the control words.
    pub fn control_command(&self, first_text: &str) -> Option<ControlCommand> {
        if self.stop_keywords.iter().any(|word| word == first_text) {
            Some(ControlCommand::Stop)
        } else if self.clear_keyword == first_text {
            Some(ControlCommand::Clear)
        } else {
            None
        }
    }

    pub fn is_skip(&self, first_text: &str) -> bool {
        self.skip_keyword == first_text
    }

    pub fn rejection_message(&self, rejection: GateRejection) -> &str {
        match rejection {
            GateRejection::StopRequested => &self.stop_ack_message,
            GateRejection::Cleared => &self.clear_ack_message,
            GateRejection::Busy => &self.busy_message,
        }
    }
}
