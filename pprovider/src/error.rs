//! Shared provider error kinds and error value helpers.
//!
//! ```rust
//! use pprovider::{ChatResult, ProviderError};
//!
//! let missing = ProviderError::not_found("model 'x' is not registered");
//! assert!(!missing.retryable);
//!
//! let failed = ProviderError::from_status(502, "bad gateway");
//! assert!(failed.retryable);
//! assert_eq!(ChatResult::from(failed), ChatResult::Error("502 : bad gateway".into()));
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::ChatResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    InvalidRequest,
    NotFound,
    RateLimited,
    Timeout,
    Transport,
    Unavailable,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidRequest, message, false)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::NotFound, message, false)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::RateLimited, message, true)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message, true)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transport, message, true)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unavailable, message, true)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Other, message, false)
    }

    /// Classifies a non-success vendor response. The message keeps the
    /// `"<status> : <body>"` shape callers see in `Error` events.
    pub fn from_status(status: u16, body: impl AsRef<str>) -> Self {
        let message = format!("{status} : {}", body.as_ref());
        match status {
            400 | 404 | 422 => Self::invalid_request(message),
            408 | 504 => Self::timeout(message),
            429 => Self::rate_limited(message),
            502 | 503 => Self::unavailable(message),
            _ => Self::transport(message),
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ProviderError {}

impl From<ProviderError> for ChatResult {
    fn from(value: ProviderError) -> Self {
        ChatResult::Error(value.message)
    }
}
