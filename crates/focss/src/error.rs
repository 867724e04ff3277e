//! Error types for the rule engine.

use focss_core::DomError;

use crate::rules::RuleHandle;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the rule engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The engine was destroyed; no further calls are accepted.
    #[error("Rule engine has been destroyed")]
    Destroyed,

    /// The handle does not name a registered rule.
    #[error("Unknown rule handle: {0:?}")]
    UnknownRule(RuleHandle),

    /// Selector parsing error.
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    /// Invalid engine configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Document access failed.
    #[error("Document error: {0}")]
    Dom(#[from] DomError),
}

impl Error {
    /// Create a selector error.
    pub fn invalid_selector(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
