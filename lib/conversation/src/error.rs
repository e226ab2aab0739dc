//! Error types for the conversation crate.

use std::fmt;

/// Errors from conversation context operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    /// A request was prepared with nothing traced.
    NothingPending,
    /// The trace buffer could not be encoded.
    EncodeFailed { reason: String },
}

impl fmt::Display for ConversationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NothingPending => write!(f, "no traced messages to send"),
            Self::EncodeFailed { reason } => {
                write!(f, "failed to encode traced messages: {reason}")
            }
        }
    }
}

impl std::error::Error for ConversationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_error_display() {
        let err = ConversationError::EncodeFailed {
            reason: "bad utf-8".to_string(),
        };
        assert!(err.to_string().contains("bad utf-8"));
    }
}
